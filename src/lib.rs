pub mod config;
pub mod duration;
pub mod query;
pub mod store;
pub mod timer;
