// src/utils/time.rs

/// Countdown display, `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Elapsed-time display, `Xm Ys`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_pads_seconds() {
        assert_eq!(format_clock(300), "5:00");
        assert_eq!(format_clock(247), "4:07");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(3725), "62m 5s");
    }
}
