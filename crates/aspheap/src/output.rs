//! Report formatting.

use std::time::Duration;

/// Format a workload duration with a unit suited to its magnitude.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    match micros {
        0..=999 => format!("{micros}µs"),
        1_000..=999_999 => format!("{}.{:02}ms", micros / 1_000, (micros % 1_000) / 10),
        1_000_000..=59_999_999 => format!("{}.{:03}s", d.as_secs(), d.subsec_millis()),
        _ => format!("{}m{:02}s", d.as_secs() / 60, d.as_secs() % 60),
    }
}

/// Format a counter with comma thousand separators.
#[must_use]
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    out.push_str(&digits[..head]);
    for (i, group) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            out.push(',');
        }
        out.extend(group.iter().map(|&b| char::from(b)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_a_unit() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "0µs");
        assert_eq!(format_duration(Duration::from_micros(750)), "750µs");
        assert_eq!(format_duration(Duration::from_micros(42_370)), "42.37ms");
        assert_eq!(format_duration(Duration::from_millis(1_250)), "1.250s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
    }

    #[test]
    fn counters_get_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(123_456), "123,456");
        assert_eq!(format_number(1_000_000), "1,000,000");
    }
}
