use chrono::{DateTime, Timelike};
use chrono_tz::Tz;

/// `14:05` in 24-hour mode, `2:05 pm` otherwise. Midnight is `12:xx am`.
pub fn format_time(now: &DateTime<Tz>, use_24_hour: bool) -> String {
    if use_24_hour {
        format!("{:02}:{:02}", now.hour(), now.minute())
    } else {
        let (is_pm, hour) = now.hour12();
        let suffix = if is_pm { "pm" } else { "am" };
        format!("{}:{:02} {}", hour, now.minute(), suffix)
    }
}

/// Abbreviated weekday, month, day and year, upper-cased: `SAT, OCT 17 2026`.
pub fn format_date(now: &DateTime<Tz>) -> String {
    now.format("%a, %b %d %Y").to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap()
    }

    #[test]
    fn test_24_hour_pads_both_fields() {
        assert_eq!(format_time(&at(Tz::UTC, 2026, 10, 17, 14, 5), true), "14:05");
        assert_eq!(format_time(&at(Tz::UTC, 2026, 10, 17, 0, 7), true), "00:07");
    }

    #[test]
    fn test_12_hour_with_suffix() {
        assert_eq!(format_time(&at(Tz::UTC, 2026, 10, 17, 14, 5), false), "2:05 pm");
        assert_eq!(format_time(&at(Tz::UTC, 2026, 10, 17, 9, 30), false), "9:30 am");
    }

    #[test]
    fn test_12_hour_midnight_and_noon() {
        assert_eq!(format_time(&at(Tz::UTC, 2026, 10, 17, 0, 7), false), "12:07 am");
        assert_eq!(format_time(&at(Tz::UTC, 2026, 10, 17, 12, 0), false), "12:00 pm");
    }

    #[test]
    fn test_date_is_upper_cased() {
        assert_eq!(format_date(&at(Tz::UTC, 2026, 10, 17, 14, 5)), "SAT, OCT 17 2026");
        assert_eq!(format_date(&at(Tz::UTC, 2026, 1, 5, 0, 7)), "MON, JAN 05 2026");
    }

    #[test]
    fn test_date_follows_time_zone() {
        let utc = at(Tz::UTC, 2026, 10, 17, 2, 0);
        let la = utc.with_timezone(&chrono_tz::America::Los_Angeles);
        assert_eq!(format_date(&la), "FRI, OCT 16 2026");
    }
}
