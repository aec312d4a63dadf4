//! Interval spec parsing
//!
//! The watcher's polling interval is a small string language:
//!
//! - `"60"`: fixed period in seconds
//! - `"5m"` / `"5min"`: fixed period in minutes
//! - `"random:60-300"`: random period between the bounds; the dashboard uses the midpoint
//! - `"random:300"`: same as `"random:60-300"`
//!
//! Parsing never fails from the caller's point of view: anything malformed
//! maps to [`DEFAULT_INTERVAL_MS`].

use std::time::Duration;

/// Period used whenever an interval spec cannot be interpreted
pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// Lower bound assumed for `random:<max>` specs
const RANDOM_DEFAULT_MIN_SECONDS: i64 = 60;

const RANDOM_PREFIX: &str = "random:";

/// Parse an interval spec into milliseconds, falling back to the default on failure
pub fn parse_interval_ms(spec: &str) -> u64 {
    match try_parse_interval_ms(spec) {
        Some(ms) => ms,
        None => {
            tracing::warn!(
                "Failed to parse interval '{}', using {}s default",
                spec,
                DEFAULT_INTERVAL_MS / 1000
            );
            DEFAULT_INTERVAL_MS
        }
    }
}

/// Refresh period for a spec; never zero
pub fn refresh_period(spec: &str) -> Duration {
    match parse_interval_ms(spec) {
        0 => {
            tracing::warn!(
                "Interval '{}' resolves to zero, using {}s default",
                spec,
                DEFAULT_INTERVAL_MS / 1000
            );
            Duration::from_millis(DEFAULT_INTERVAL_MS)
        }
        ms => Duration::from_millis(ms),
    }
}

fn try_parse_interval_ms(spec: &str) -> Option<u64> {
    let s = spec.trim().to_lowercase();

    let seconds = if let Some(range) = s.strip_prefix(RANDOM_PREFIX) {
        let (min, max) = if range.contains('-') {
            let mut bounds = range.split('-');
            let min = leading_int(bounds.next()?)?;
            let max = leading_int(bounds.next()?)?;
            (min, max)
        } else {
            (RANDOM_DEFAULT_MIN_SECONDS, leading_int(range)?)
        };
        min.checked_add(max)?.div_euclid(2)
    } else if let Some(minutes) = strip_minutes(&s) {
        leading_int(minutes)?.checked_mul(60)?
    } else {
        leading_int(&s)?
    };

    let ms = seconds.checked_mul(1000)?;
    u64::try_from(ms).ok()
}

/// Strip a trailing `min` or `m` unit
fn strip_minutes(s: &str) -> Option<&str> {
    s.strip_suffix("min").or_else(|| s.strip_suffix('m'))
}

/// Parse the integer at the start of `s`, ignoring trailing text.
///
/// Leading whitespace and a single sign are accepted; returns `None` when no
/// digits follow.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}
