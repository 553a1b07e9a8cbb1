use std::collections::BTreeMap;

use crate::config::{AlertMode, Config, Effect, Mode, SizeStep, Switch, Theme, Weight};
use crate::query;

/// Partial config used for direct edits. Fields left `None` keep the current
/// snapshot's value; the merge is shallow.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub mode: Option<Mode>,
    pub d: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub tz: Option<String>,
    pub title: Option<String>,
    pub title_font: Option<String>,
    pub title_size: Option<SizeStep>,
    pub title_color: Option<String>,
    pub title_weight: Option<Weight>,
    pub ui: Option<Switch>,
    pub theme: Option<Theme>,
    pub font: Option<String>,
    pub fs: Option<SizeStep>,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub accent: Option<String>,
    pub digit_weight: Option<Weight>,
    pub bar: Option<Switch>,
    pub fx: Option<Effect>,
    pub ring: Option<Switch>,
    pub alert: Option<AlertMode>,
    pub repeat: Option<String>,
    pub repevery: Option<String>,
    pub overrun: Option<Switch>,
    pub fullscreen: Option<Switch>,
}

/// Owned holder of the current config snapshot. Every mutation builds a new
/// snapshot and replaces the old one wholesale, so readers never observe a
/// half-applied update. Instances are independent; there is no process-wide
/// singleton.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    config: Config,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shallow-merges the patch into the current snapshot.
    pub fn patch(&mut self, patch: ConfigPatch) {
        let mut next = self.config.clone();
        if let Some(mode) = patch.mode {
            next.mode = mode;
        }
        merge(&mut next.d, patch.d);
        merge(&mut next.date, patch.date);
        merge(&mut next.time, patch.time);
        merge(&mut next.tz, patch.tz);
        merge(&mut next.title, patch.title);
        merge(&mut next.title_font, patch.title_font);
        merge(&mut next.title_size, patch.title_size);
        merge(&mut next.title_color, patch.title_color);
        merge(&mut next.title_weight, patch.title_weight);
        merge(&mut next.ui, patch.ui);
        merge(&mut next.theme, patch.theme);
        merge(&mut next.font, patch.font);
        merge(&mut next.fs, patch.fs);
        merge(&mut next.fg, patch.fg);
        merge(&mut next.bg, patch.bg);
        merge(&mut next.accent, patch.accent);
        merge(&mut next.digit_weight, patch.digit_weight);
        merge(&mut next.bar, patch.bar);
        merge(&mut next.fx, patch.fx);
        merge(&mut next.ring, patch.ring);
        merge(&mut next.alert, patch.alert);
        merge(&mut next.repeat, patch.repeat);
        merge(&mut next.repevery, patch.repevery);
        merge(&mut next.overrun, patch.overrun);
        merge(&mut next.fullscreen, patch.fullscreen);
        self.config = next;
    }

    /// Runs the query codec's parse-with-fallback pass against the current
    /// snapshot and replaces it with the result.
    pub fn hydrate_from_query(&mut self, q: &BTreeMap<String, String>) {
        self.config = query::apply(&self.config, q);
    }

    /// Replaces the snapshot with the canonical default.
    pub fn reset(&mut self) {
        self.config = Config::default();
    }
}

fn merge<T>(slot: &mut Option<T>, patch: Option<T>) {
    if patch.is_some() {
        *slot = patch;
    }
}
