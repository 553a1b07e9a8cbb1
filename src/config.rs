use serde::Serialize;

/// A query-representable enum field. `from_query` accepts only the field's
/// allowed value set; anything else is rejected so the codec can fall back to
/// the previous value instead of propagating free text into `Config`.
pub trait QueryEnum: Sized + Copy {
    fn from_query(raw: &str) -> Option<Self>;
    fn as_query(&self) -> &'static str;
}

macro_rules! query_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl QueryEnum for $name {
            fn from_query(raw: &str) -> Option<Self> {
                match raw {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_query(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Mode {
    #[serde(rename = "duration")]
    Duration,
    #[serde(rename = "until")]
    Until,
}

impl Mode {
    /// Fail-safe, total parse: anything other than the literal `until` is
    /// duration mode. Unlike the other enum fields there is no
    /// previous-value fallback here.
    pub fn from_query_or_default(raw: &str) -> Self {
        if raw == "until" { Mode::Until } else { Mode::Duration }
    }

    pub fn as_query(&self) -> &'static str {
        match self {
            Mode::Duration => "duration",
            Mode::Until => "until",
        }
    }
}

query_enum!(SizeStep {
    S => "s",
    M => "m",
    L => "l",
    Xl => "xl",
});

query_enum!(Weight {
    Normal => "normal",
    Medium => "medium",
    Semibold => "semibold",
    Bold => "bold",
    Extrabold => "extrabold",
});

query_enum!(Theme {
    Dark => "dark",
    Light => "light",
});

query_enum!(Switch {
    Off => "0",
    On => "1",
});

impl Switch {
    pub fn is_on(&self) -> bool {
        matches!(self, Switch::On)
    }
}

query_enum!(AlertMode {
    None => "none",
    Sound => "sound",
    Flash => "flash",
    Both => "both",
});

query_enum!(Effect {
    None => "none",
    PulseSec => "pulse-sec",
    PulseMin => "pulse-min",
    FlipSec => "flip-sec",
    Neon => "neon",
    ShakeTenS => "shake-10s",
    PopSec => "pop-sec",
});

/// Single source of truth for a timer session. Conceptually an immutable
/// snapshot: mutation happens only by replacing the whole value through the
/// `ConfigStore` entry points.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub mode: Mode,

    // duration mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    // until mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_size: Option<SizeStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_weight: Option<Weight>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<Switch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs: Option<SizeStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digit_weight: Option<Weight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar: Option<Switch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<Effect>,

    // reserved fields, carried through serialization but not interpreted by
    // the projection engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring: Option<Switch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repevery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrun: Option<Switch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<Switch>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Duration,
            d: None,
            date: None,
            time: None,
            tz: None,
            title: None,
            title_font: None,
            title_size: None,
            title_color: None,
            title_weight: None,
            ui: Some(Switch::On),
            theme: Some(Theme::Dark),
            font: Some("Inter".to_string()),
            fs: Some(SizeStep::M),
            fg: Some("#FFFFFF".to_string()),
            bg: Some("#000000".to_string()),
            accent: Some("#22D3EE".to_string()),
            digit_weight: None,
            bar: Some(Switch::On),
            fx: Some(Effect::None),
            ring: None,
            alert: None,
            repeat: None,
            repevery: None,
            overrun: None,
            fullscreen: None,
        }
    }
}
