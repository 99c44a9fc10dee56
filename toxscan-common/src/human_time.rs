//! Human-readable time and size formatting
//!
//! Shared by the result report (sentence timestamps, total duration) and the
//! recorder (elapsed time while capturing).

/// Format media time as `MM:SS`.
///
/// Fractional seconds are truncated, negative and non-finite values clamp to
/// zero. Minutes are zero-padded to two digits but never wrap, so one hour
/// and five seconds renders as `60:05`.
///
/// # Examples
///
/// ```
/// use toxscan_common::human_time::format_timestamp;
///
/// assert_eq!(format_timestamp(0.0), "00:00");
/// assert_eq!(format_timestamp(75.9), "01:15");
/// assert_eq!(format_timestamp(3605.0), "60:05");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Format elapsed recording time as `M:SS`.
///
/// ```
/// use toxscan_common::human_time::format_elapsed;
///
/// assert_eq!(format_elapsed(7), "0:07");
/// assert_eq!(format_elapsed(125), "2:05");
/// ```
pub fn format_elapsed(elapsed_seconds: u64) -> String {
    format!("{}:{:02}", elapsed_seconds / 60, elapsed_seconds % 60)
}

/// Format a byte count in mebibytes with two decimals (`"1.91 MB"`).
pub fn format_size_mb(size_bytes: u64) -> String {
    format!("{:.2} MB", size_bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_truncates_fraction() {
        assert_eq!(format_timestamp(0.99), "00:00");
        assert_eq!(format_timestamp(59.999), "00:59");
        assert_eq!(format_timestamp(60.0), "01:00");
    }

    #[test]
    fn test_timestamp_clamps_invalid_input() {
        assert_eq!(format_timestamp(-3.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
        assert_eq!(format_timestamp(f64::INFINITY), "00:00");
    }

    #[test]
    fn test_size_label() {
        assert_eq!(format_size_mb(0), "0.00 MB");
        assert_eq!(format_size_mb(2_000_000), "1.91 MB");
        assert_eq!(format_size_mb(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_elapsed_over_an_hour() {
        assert_eq!(format_elapsed(3600), "60:00");
    }
}
