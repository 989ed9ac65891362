/// Render seconds as zero-padded `MM:SS`.
///
/// Minutes are not rolled over into hours, so `3600` renders as `60:00`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3599), "59:59");
    }

    #[test]
    fn no_hour_rollover() {
        assert_eq!(format_time(3600), "60:00");
        assert_eq!(format_time(6000), "100:00");
    }
}
