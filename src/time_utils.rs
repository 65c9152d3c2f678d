use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Local wall-clock time, truncated to whole seconds so a timestamp
/// survives a trip through the log file unchanged.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Name of the log file holding every sample taken on `date`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}.csv", date.format(DATE_FORMAT))
}

pub fn format_hm(hours: u64, minutes: u64) -> String {
    format!("{:02}:{:02}", hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trips() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 59)
            .unwrap();
        let s = format_timestamp(&ts);
        assert_eq!(s, "2024-03-09 07:05:59");
        assert_eq!(parse_timestamp(&s), Some(ts));
    }

    #[test]
    fn now_has_no_subsecond_part() {
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn log_file_is_named_by_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(log_file_name(date), "2024-12-01.csv");
    }

    #[test]
    fn hm_is_zero_padded() {
        assert_eq!(format_hm(5, 0), "05:00");
        assert_eq!(format_hm(0, 42), "00:42");
        assert_eq!(format_hm(123, 7), "123:07");
    }
}
