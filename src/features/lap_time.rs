//! Lap time text <-> milliseconds

use std::sync::OnceLock;

use regex::Regex;

use crate::{Result, SportsError};

fn lap_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+):(\d{1,2})(?:\.(\d+))?\s*$").expect("lap time pattern is valid")
    })
}

/// Parse "M:SS.mmm" (or "MM:SS.mmm") into milliseconds.
///
/// Whole milliseconds are exact; digits past the third are kept as a
/// fractional millisecond. A zero lap time is rejected since ratios are
/// taken against the fastest lap.
pub fn parse_lap_time(text: &str) -> Result<f64> {
    let invalid = || SportsError::Parse(format!("invalid lap time {:?}", text));
    let caps = lap_time_pattern().captures(text).ok_or_else(invalid)?;

    let minutes: u64 = caps[1].parse().map_err(|_| invalid())?;
    let seconds: u64 = caps[2].parse().map_err(|_| invalid())?;
    if seconds >= 60 {
        return Err(SportsError::Parse(format!(
            "seconds out of range in lap time {:?}",
            text
        )));
    }

    let fraction_ms = match caps.get(3) {
        Some(digits) => {
            let digits = digits.as_str();
            let value: u64 = digits.parse().map_err(|_| invalid())?;
            if digits.len() <= 3 {
                (value * 10u64.pow(3 - digits.len() as u32)) as f64
            } else {
                value as f64 / 10f64.powi(digits.len() as i32 - 3)
            }
        }
        None => 0.0,
    };

    let whole_ms = minutes
        .checked_mul(60_000)
        .and_then(|ms| ms.checked_add(seconds * 1000))
        .ok_or_else(|| SportsError::Parse(format!("lap time {:?} is out of range", text)))?;

    let total = whole_ms as f64 + fraction_ms;
    if total <= 0.0 {
        return Err(SportsError::Parse(format!("lap time {:?} is not positive", text)));
    }
    Ok(total)
}

/// Format milliseconds as "MM:SS.mmm", rounded to the millisecond
pub fn format_lap_time(ms: f64) -> String {
    let total = ms.max(0.0).round() as u64;
    let minutes = total / 60_000;
    let seconds = (total % 60_000) / 1000;
    let millis = total % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_lap_time() {
        assert_eq!(parse_lap_time("01:23.456").unwrap(), 83_456.0);
        assert_eq!(parse_lap_time("1:32.608").unwrap(), 92_608.0);
        assert_eq!(parse_lap_time("0:59.9").unwrap(), 59_900.0);
        assert_eq!(parse_lap_time("2:05").unwrap(), 125_000.0);
    }

    #[test]
    fn test_malformed_lap_time_is_parse_error() {
        for text in [
            "abc",
            "",
            "83.456",
            "1:",
            ":23.456",
            "1:2x.000",
            "-1:23.456",
            "1:60.000",
            "0:00.000",
            "00:00",
            "999999999999999:00.000",
            "99999999999999999999999:00.000",
        ] {
            let err = parse_lap_time(text).unwrap_err();
            assert!(matches!(err, SportsError::Parse(_)), "{:?} gave {:?}", text, err);
        }
    }

    #[test]
    fn test_format_lap_time() {
        assert_eq!(format_lap_time(83_456.0), "01:23.456");
        assert_eq!(format_lap_time(92_608.4), "01:32.608");
        assert_eq!(format_lap_time(5_000.0), "00:05.000");
        assert_eq!(format_lap_time(3_600_000.0), "60:00.000");
    }

    proptest! {
        #[test]
        fn prop_whole_millis_roundtrip(ms in 1u64..10_000_000) {
            let text = format_lap_time(ms as f64);
            prop_assert_eq!(parse_lap_time(&text).unwrap(), ms as f64);
        }

        #[test]
        fn prop_fractional_millis_within_tolerance(ms in 1.0f64..10_000_000.0) {
            let reparsed = parse_lap_time(&format_lap_time(ms)).unwrap();
            prop_assert!((reparsed - ms).abs() <= 0.5 + 1e-6);
        }
    }
}
