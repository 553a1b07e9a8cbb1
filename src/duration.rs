use once_cell::sync::Lazy;
use regex::Regex;

static UNIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[hms]").expect("valid unit regex"));

/// Parses human-entered duration text into milliseconds. Total: unparseable
/// input yields 0, which callers treat as an already-elapsed timer rather
/// than an error.
///
/// Two syntaxes are accepted: colon-separated clock form (`MM:SS` or
/// `HH:MM:SS`) and letter-suffixed free text (`1h30m`, `90m`). Repeated unit
/// suffixes accumulate, so `1h1h` is two hours.
pub fn parse_duration_ms(text: &str) -> u64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    if text.contains(':') {
        return parse_clock_form(text);
    }

    let mut hours: u64 = 0;
    let mut minutes: u64 = 0;
    let mut seconds: u64 = 0;
    for token in UNIT_RE.find_iter(text) {
        let token = token.as_str();
        let (digits, unit) = token.split_at(token.len() - 1);
        let Ok(value) = digits.parse::<u64>() else {
            continue;
        };
        match unit {
            "h" => hours = hours.saturating_add(value),
            "m" => minutes = minutes.saturating_add(value),
            _ => seconds = seconds.saturating_add(value),
        }
    }
    to_ms(hours, minutes, seconds)
}

fn parse_clock_form(text: &str) -> u64 {
    let mut parts = Vec::new();
    for part in text.split(':') {
        match part.trim().parse::<u64>() {
            Ok(value) => parts.push(value),
            Err(_) => return 0,
        }
    }
    match parts.as_slice() {
        [minutes, seconds] => to_ms(0, *minutes, *seconds),
        [hours, minutes, seconds] => to_ms(*hours, *minutes, *seconds),
        _ => 0,
    }
}

// Saturating throughout: absurdly large numerals clamp to u64::MAX rather
// than aborting, keeping the parser total.
fn to_ms(hours: u64, minutes: u64, seconds: u64) -> u64 {
    hours
        .saturating_mul(60)
        .saturating_add(minutes)
        .saturating_mul(60)
        .saturating_add(seconds)
        .saturating_mul(1_000)
}

/// Canonical letter-suffixed form of a millisecond count, e.g. `1h30m`,
/// `45s`, `0s`. Sub-second remainders are dropped. Round-trips through
/// `parse_duration_ms` without loss of whole seconds.
pub fn format_duration_ms(ms: u64) -> String {
    let total_seconds = ms / 1_000;
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if total_seconds == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_is_zero() {
        assert_eq!(parse_duration_ms(""), 0);
        assert_eq!(parse_duration_ms("   "), 0);
    }

    #[test]
    fn colon_form_two_parts_is_minutes_seconds() {
        assert_eq!(parse_duration_ms("05:30"), (5 * 60 + 30) * 1_000);
        assert_eq!(parse_duration_ms("90:00"), 90 * 60 * 1_000);
    }

    #[test]
    fn colon_form_three_parts_is_hours_minutes_seconds() {
        assert_eq!(parse_duration_ms("01:30:00"), 90 * 60 * 1_000);
        assert_eq!(parse_duration_ms("2:00:05"), (2 * 3_600 + 5) * 1_000);
    }

    #[test]
    fn malformed_colon_form_is_zero() {
        assert_eq!(parse_duration_ms("1:xx"), 0);
        assert_eq!(parse_duration_ms("1:2:3:4"), 0);
        assert_eq!(parse_duration_ms(":30"), 0);
    }

    #[test]
    fn letter_form_parses_each_unit() {
        assert_eq!(parse_duration_ms("1h30m"), 90 * 60 * 1_000);
        assert_eq!(parse_duration_ms("90m"), 90 * 60 * 1_000);
        assert_eq!(parse_duration_ms("45s"), 45_000);
        assert_eq!(parse_duration_ms("1h2m3s"), (3_600 + 120 + 3) * 1_000);
    }

    #[test]
    fn repeated_unit_suffixes_accumulate() {
        assert_eq!(parse_duration_ms("1h1h"), 2 * 3_600 * 1_000);
        assert_eq!(parse_duration_ms("30m30m"), parse_duration_ms("60m"));
    }

    #[test]
    fn unmatched_characters_are_ignored() {
        assert_eq!(parse_duration_ms("about 5m or so"), 5 * 60 * 1_000);
        assert_eq!(parse_duration_ms("soon"), 0);
    }

    #[test]
    fn oversized_numerals_saturate_instead_of_overflowing() {
        assert_eq!(parse_duration_ms("9999999999999999h"), u64::MAX);
        assert_eq!(parse_duration_ms("18446744073709551615:00"), u64::MAX);
        assert_eq!(parse_duration_ms("99999999999999999999:00:00"), 0);
        assert_eq!(
            parse_duration_ms("18446744073709551615s18446744073709551615s"),
            u64::MAX
        );
    }

    #[test]
    fn canonical_format_round_trips() {
        for input in ["1h30m", "90m", "01:30:00", "45s", "1h1h", "2:15"] {
            let ms = parse_duration_ms(input);
            assert_eq!(parse_duration_ms(&format_duration_ms(ms)), ms, "input {input}");
        }
        assert_eq!(format_duration_ms(0), "0s");
        assert_eq!(format_duration_ms(90 * 60 * 1_000), "1h30m");
    }
}
