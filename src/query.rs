use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{AlertMode, Config, Effect, Mode, QueryEnum, SizeStep, Switch, Theme};

/// Strict shape of the combined until-mode target: `YYYY-MM-DDTHH:MM[:SS]`
/// with an optional trailing `Z`. Anything looser is rejected wholesale.
static TO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}(?::\d{2})?)Z?$").expect("valid to regex")
});

/// Serializes a config to its ordered wire pairs. Only fields relevant to
/// the active mode are emitted; in until mode `date`+`time` collapse into
/// the single combined `to` key. Absent fields are omitted entirely.
pub fn serialize(config: &Config) -> Vec<(&'static str, String)> {
    let mut pairs: Vec<(&'static str, String)> = Vec::new();
    let mut add = |key: &'static str, value: Option<String>| {
        if let Some(value) = value {
            pairs.push((key, value));
        }
    };

    add("mode", Some(config.mode.as_query().to_string()));
    match config.mode {
        Mode::Duration => add("d", config.d.clone()),
        Mode::Until => {
            add("to", combined_target(config));
            add("tz", config.tz.clone());
        }
    }
    add("title", config.title.clone());
    add("tfont", config.title_font.clone());
    add("tfs", config.title_size.map(|v| v.as_query().to_string()));
    add("tfg", config.title_color.clone());
    add("ui", config.ui.map(|v| v.as_query().to_string()));
    add("theme", config.theme.map(|v| v.as_query().to_string()));
    add("font", config.font.clone());
    add("fs", config.fs.map(|v| v.as_query().to_string()));
    add("fg", config.fg.clone());
    add("bg", config.bg.clone());
    add("accent", config.accent.clone());
    add("bar", config.bar.map(|v| v.as_query().to_string()));
    add("ring", config.ring.map(|v| v.as_query().to_string()));
    add("alert", config.alert.map(|v| v.as_query().to_string()));
    add("repeat", config.repeat.clone());
    add("repevery", config.repevery.clone());
    add("overrun", config.overrun.map(|v| v.as_query().to_string()));
    add("fullscreen", config.fullscreen.map(|v| v.as_query().to_string()));
    add("fx", config.fx.map(|v| v.as_query().to_string()));
    pairs
}

/// Percent-encoded query string form of `serialize`.
pub fn encode(config: &Config) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in serialize(config) {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

/// Decodes a raw query string into the flat map consumed by `apply`. A
/// repeated key keeps its last value, matching `URLSearchParams.set`.
pub fn decode(raw: &str) -> BTreeMap<String, String> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    form_urlencoded::parse(raw.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Hydrates a config from untrusted flat-map input. Each recognized key
/// overrides the previous snapshot only when its value is valid for the
/// field; invalid enum values and missing keys fall back to `prev`. The one
/// exception is `mode`, which is fail-safe rather than fallback.
pub fn apply(prev: &Config, q: &BTreeMap<String, String>) -> Config {
    let mut next = prev.clone();

    next.mode = q
        .get("mode")
        .map(|raw| Mode::from_query_or_default(raw))
        .unwrap_or(Mode::Duration);

    match next.mode {
        Mode::Duration => {
            next.d = non_empty(q.get("d")).or_else(|| prev.d.clone());
        }
        Mode::Until => {
            let (to_date, to_time) = split_combined_target(q.get("to").map(String::as_str));
            next.date = q
                .get("date")
                .cloned()
                .or(to_date)
                .or_else(|| prev.date.clone());
            next.time = q
                .get("time")
                .cloned()
                .or(to_time)
                .or_else(|| prev.time.clone());
            next.tz = non_empty(q.get("tz")).or_else(|| prev.tz.clone());
        }
    }

    next.title = q.get("title").cloned().or_else(|| prev.title.clone());
    next.title_font = q.get("tfont").cloned().or_else(|| prev.title_font.clone());
    next.title_size = pick::<SizeStep>(q.get("tfs"), prev.title_size);
    next.title_color = q.get("tfg").cloned().or_else(|| prev.title_color.clone());
    next.ui = pick::<Switch>(q.get("ui"), prev.ui);
    next.theme = pick::<Theme>(q.get("theme"), prev.theme);
    next.font = q.get("font").cloned().or_else(|| prev.font.clone());
    next.fs = pick::<SizeStep>(q.get("fs"), prev.fs);
    next.fg = q.get("fg").cloned().or_else(|| prev.fg.clone());
    next.bg = q.get("bg").cloned().or_else(|| prev.bg.clone());
    next.accent = q.get("accent").cloned().or_else(|| prev.accent.clone());
    next.bar = pick::<Switch>(q.get("bar"), prev.bar);
    next.ring = pick::<Switch>(q.get("ring"), prev.ring);
    next.alert = pick::<AlertMode>(q.get("alert"), prev.alert);
    next.repeat = q.get("repeat").cloned().or_else(|| prev.repeat.clone());
    next.repevery = q.get("repevery").cloned().or_else(|| prev.repevery.clone());
    next.overrun = pick::<Switch>(q.get("overrun"), prev.overrun);
    next.fullscreen = pick::<Switch>(q.get("fullscreen"), prev.fullscreen);
    next.fx = pick::<Effect>(q.get("fx"), prev.fx);
    next
}

/// Parse-with-fallback combinator for enum-valued fields: a value outside
/// the field's allowed set is treated as absent.
fn pick<E: QueryEnum>(raw: Option<&String>, prev: Option<E>) -> Option<E> {
    raw.and_then(|raw| E::from_query(raw)).or(prev)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn combined_target(config: &Config) -> Option<String> {
    match (&config.date, &config.time) {
        (Some(date), Some(time)) => Some(format!("{date}T{time}")),
        _ => None,
    }
}

/// Splits a combined target into its `date` and `time` halves, or `None`
/// when the value does not match the strict shape.
pub fn parse_combined_target(to: &str) -> Option<(String, String)> {
    let caps = TO_RE.captures(to)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

fn split_combined_target(to: Option<&str>) -> (Option<String>, Option<String>) {
    match to.and_then(parse_combined_target) {
        Some((date, time)) => (Some(date), Some(time)),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Weight;

    fn flat(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn duration_mode_round_trips_through_codec() {
        let mut config = Config::default();
        config.d = Some("1h30m".to_string());
        config.title = Some("Break".to_string());

        let encoded = encode(&config);
        let parsed = apply(&Config::default(), &decode(&encoded));
        assert_eq!(parsed.mode, Mode::Duration);
        assert_eq!(parsed.d.as_deref(), Some("1h30m"));
        assert_eq!(parsed.title.as_deref(), Some("Break"));
    }

    #[test]
    fn until_mode_joins_and_splits_combined_target() {
        let mut config = Config::default();
        config.mode = Mode::Until;
        config.date = Some("2025-01-02".to_string());
        config.time = Some("03:04:05".to_string());
        config.tz = Some("Europe/Berlin".to_string());

        let pairs = serialize(&config);
        assert!(pairs.contains(&("to", "2025-01-02T03:04:05".to_string())));
        assert!(pairs.contains(&("tz", "Europe/Berlin".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "d" || *k == "date" || *k == "time"));

        let parsed = apply(&Config::default(), &decode(&encode(&config)));
        assert_eq!(parsed.mode, Mode::Until);
        assert_eq!(parsed.date.as_deref(), Some("2025-01-02"));
        assert_eq!(parsed.time.as_deref(), Some("03:04:05"));
        assert_eq!(parsed.tz.as_deref(), Some("Europe/Berlin"));
    }

    #[test]
    fn combined_target_accepts_minutes_only_and_zulu() {
        let q = flat(&[("mode", "until"), ("to", "2030-01-01T09:30Z")]);
        let parsed = apply(&Config::default(), &q);
        assert_eq!(parsed.date.as_deref(), Some("2030-01-01"));
        assert_eq!(parsed.time.as_deref(), Some("09:30"));
    }

    #[test]
    fn malformed_combined_target_falls_back_to_previous() {
        let mut prev = Config::default();
        prev.mode = Mode::Until;
        prev.date = Some("2024-12-31".to_string());
        prev.time = Some("23:59:59".to_string());

        for bad in [
            "2025-1-2T3:4",
            "2025-01-02 03:04:05",
            "2025-01-02T03:04:05Zjunk",
            "not-a-timestamp",
        ] {
            let parsed = apply(&prev, &flat(&[("mode", "until"), ("to", bad)]));
            assert_eq!(parsed.date.as_deref(), Some("2024-12-31"), "to={bad}");
            assert_eq!(parsed.time.as_deref(), Some("23:59:59"), "to={bad}");
        }
    }

    #[test]
    fn explicit_date_time_keys_take_precedence_over_to() {
        let q = flat(&[
            ("mode", "until"),
            ("to", "2030-01-01T09:30:00"),
            ("date", "2031-06-15"),
            ("time", "12:00:00"),
        ]);
        let parsed = apply(&Config::default(), &q);
        assert_eq!(parsed.date.as_deref(), Some("2031-06-15"));
        assert_eq!(parsed.time.as_deref(), Some("12:00:00"));
    }

    #[test]
    fn invalid_enum_value_keeps_previous_value() {
        let mut prev = Config::default();
        prev.fs = Some(SizeStep::L);
        let parsed = apply(&prev, &flat(&[("fs", "huge")]));
        assert_eq!(parsed.fs, Some(SizeStep::L));

        let parsed = apply(&prev, &flat(&[("fs", "xl")]));
        assert_eq!(parsed.fs, Some(SizeStep::Xl));
    }

    #[test]
    fn unknown_mode_is_duration_not_fallback() {
        let mut prev = Config::default();
        prev.mode = Mode::Until;
        let parsed = apply(&prev, &flat(&[("mode", "sometime")]));
        assert_eq!(parsed.mode, Mode::Duration);
    }

    #[test]
    fn absent_mode_key_defaults_to_duration() {
        let mut prev = Config::default();
        prev.mode = Mode::Until;
        let parsed = apply(&prev, &flat(&[("title", "hi")]));
        assert_eq!(parsed.mode, Mode::Duration);
    }

    #[test]
    fn weight_fields_are_not_carried_on_the_wire() {
        let mut config = Config::default();
        config.digit_weight = Some(Weight::Bold);
        config.title_weight = Some(Weight::Semibold);
        let pairs = serialize(&config);
        assert!(!pairs.iter().any(|(k, _)| *k == "dw" || *k == "tw"));
    }

    #[test]
    fn absent_fields_are_omitted_not_stringified() {
        let config = Config {
            title: None,
            ..Config::default()
        };
        let encoded = encode(&config);
        assert!(!encoded.contains("title"));
        assert!(!encoded.contains("undefined"));
        assert!(!encoded.contains("null"));
    }

    #[test]
    fn encode_percent_escapes_reserved_characters() {
        let mut config = Config::default();
        config.title = Some("tea & toast".to_string());
        let encoded = encode(&config);
        assert!(encoded.contains("title=tea+%26+toast"));

        let decoded = decode(&encoded);
        assert_eq!(decoded.get("title").map(String::as_str), Some("tea & toast"));
    }

    #[test]
    fn decode_keeps_last_value_for_repeated_keys() {
        let decoded = decode("d=5m&d=10m");
        assert_eq!(decoded.get("d").map(String::as_str), Some("10m"));
    }

    #[test]
    fn autostart_is_not_part_of_config() {
        let q = flat(&[("autostart", "1"), ("d", "5m")]);
        let parsed = apply(&Config::default(), &q);
        let pairs = serialize(&parsed);
        assert!(!pairs.iter().any(|(k, _)| *k == "autostart"));
    }
}
