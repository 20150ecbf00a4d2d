const UNITS: [&str; 3] = ["b", "Kb", "Mb"];

/// Format a byte count with a unit, e.g. `1132` → `"1.11 Kb"`.
///
/// Scaling stops at Mb, so one GiB reads `"1024 Mb"`. Absent and zero
/// values both give a bare `"0"`.
pub fn format_bandwidth(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        None | Some(0) => return "0".to_string(),
        Some(b) => b,
    };

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while unit < UNITS.len() - 1 && value >= 1024.0 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{value:.2}");
    let number = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_missing() {
        assert_eq!(format_bandwidth(None), "0");
        assert_eq!(format_bandwidth(Some(0)), "0");
    }

    #[test]
    fn test_units() {
        assert_eq!(format_bandwidth(Some(1)), "1 b");
        assert_eq!(format_bandwidth(Some(1023)), "1023 b");
        assert_eq!(format_bandwidth(Some(1024)), "1 Kb");
        assert_eq!(format_bandwidth(Some(1132)), "1.11 Kb");
        assert_eq!(format_bandwidth(Some(2048 + 512)), "2.5 Kb");
        assert_eq!(format_bandwidth(Some(1024 * 1024)), "1 Mb");
        assert_eq!(format_bandwidth(Some(1024 * 1024 + 512 * 1024)), "1.5 Mb");
    }

    #[test]
    fn test_no_scaling_past_megabytes() {
        assert_eq!(format_bandwidth(Some(1024 * 1024 * 1024)), "1024 Mb");
        assert_eq!(format_bandwidth(Some(10 * 1024 * 1024 * 1024)), "10240 Mb");
    }

    #[test]
    fn test_trailing_zero_stripping_keeps_integer_zeros() {
        assert_eq!(format_bandwidth(Some(10)), "10 b");
        assert_eq!(format_bandwidth(Some(100 * 1024)), "100 Kb");
        assert_eq!(format_bandwidth(Some(1024 + 102)), "1.1 Kb");
    }
}
