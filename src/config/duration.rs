//! Interval parsing.
//!
//! Intervals are written the way Go writes durations: a sequence of decimal
//! numbers with unit suffixes, e.g. `1h`, `90s`, `1h30m`, `1.5h`, `500ms`.

use regex::Regex;
use std::time::Duration;

/// Error returned for an interval that cannot be used.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}: expected e.g. \"1h\", \"30m\" or \"1h30m\"")]
    Invalid(String),

    #[error("duration {0:?} must be greater than zero")]
    NotPositive(String),
}

/// Parse a Go-style duration string.
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Each
/// number may carry a fraction. Zero is rejected since it cannot drive a
/// timer.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let re = Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)")
        .map_err(|_| DurationError::Invalid(s.to_string()))?;

    let mut nanos = 0f64;
    let mut end = 0;
    for caps in re.captures_iter(s) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() != end {
            return Err(DurationError::Invalid(s.to_string()));
        }
        end = whole.end();

        let value: f64 = caps[1]
            .parse()
            .map_err(|_| DurationError::Invalid(s.to_string()))?;
        nanos += value * unit_nanos(&caps[2]);
    }

    if end != s.len() {
        return Err(DurationError::Invalid(s.to_string()));
    }
    if nanos < 1.0 {
        return Err(DurationError::NotPositive(s.to_string()));
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

fn unit_nanos(unit: &str) -> f64 {
    match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        _ => 3600e9,
    }
}
