use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

/// Unit to nanoseconds multiplier (order matters: "ms" before "m" and "s")
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "1s", "500ms", "1.5m" or "1h30m"
///
/// A value is one or more `<number><unit>` segments which are summed.
/// A bare "0" is accepted.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        bail!("Invalid duration: empty value");
    }

    let mut rest = s;
    let mut nanos = 0.0;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(split);
        if number.is_empty() {
            bail!("Invalid duration: {}", s);
        }
        let val: f64 = number
            .parse()
            .with_context(|| format!("Invalid duration: {}", s))?;

        let (multiplier, after) = UNITS
            .iter()
            .find_map(|(suffix, multiplier)| tail.strip_prefix(suffix).map(|after| (*multiplier, after)))
            .ok_or_else(|| {
                anyhow!("Unknown duration format: {} (expected a unit such as ms, s, m or h)", s)
            })?;

        nanos += val * multiplier;
        rest = after;
    }

    if !nanos.is_finite() {
        bail!("Invalid duration: {}", s);
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Format a duration for display
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        "0s".to_string()
    } else if nanos < 1_000_000 {
        format!("{}µs", d.as_micros())
    } else if nanos < 1_000_000_000 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}s", d.as_secs_f64())
    }
}
