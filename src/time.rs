//! Buenos Aires timezone helpers.
//!
//! The application stores and displays every instant in Argentina time.
//! Argentina has not observed DST since 2009, so the zone is a fixed UTC-3
//! offset; the named zone is still what gets pinned on each database session
//! so server-side date arithmetic stays host-independent.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// Named timezone pinned on every database session.
pub const ARGENTINA_TIMEZONE: &str = "America/Argentina/Buenos_Aires";

/// Fixed UTC-3 offset for Buenos Aires.
pub fn argentina_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("valid -03:00 offset")
}

/// Format an instant in Argentina time as `YYYY-MM-DD HH:MM:SS`.
pub fn to_argentina_time<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&argentina_offset())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Current date/time in Argentina, `YYYY-MM-DD HH:MM:SS`.
pub fn now_in_argentina() -> String {
    to_argentina_time(&Utc::now())
}

/// Format an instant for display in the frontend, `DD/MM/YYYY HH:MM:SS`.
pub fn format_for_display<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&argentina_offset())
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}

/// SQL expression for the current timestamp in Argentina time.
pub fn current_timestamp_sql() -> String {
    format!("NOW() AT TIME ZONE '{}'", ARGENTINA_TIMEZONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_instant_formats() {
        // 2024-03-15 18:30:00 UTC is 15:30 in Buenos Aires.
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();
        assert_eq!(to_argentina_time(&instant), "2024-03-15 15:30:00");
        assert_eq!(format_for_display(&instant), "15/03/2024 15:30:00");
    }

    #[test]
    fn test_midnight_rollover() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(to_argentina_time(&instant), "2023-12-31 22:00:00");
    }

    #[test]
    fn test_same_instant_formats_identically() {
        // Two statements built against the same instant must render the same
        // text regardless of the host timezone (the offset is fixed, not
        // taken from the environment).
        let instant = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(to_argentina_time(&instant), to_argentina_time(&instant));
    }

    #[test]
    fn test_current_timestamp_sql_names_the_zone() {
        assert_eq!(
            current_timestamp_sql(),
            "NOW() AT TIME ZONE 'America/Argentina/Buenos_Aires'"
        );
    }
}
