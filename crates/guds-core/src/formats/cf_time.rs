//! CF time decoding (`<unit> since <reference>`)
//!
//! Non-Gregorian calendars are counted in their own month lengths and the
//! resulting year, month and day are returned as-is. A date that only
//! exists in the model calendar (30 February in `360_day`) is an error.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

use crate::error::{GudsError, Result};

const MS_PER_DAY: i64 = 86_400_000;

const NOLEAP_MONTHS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const ALL_LEAP_MONTHS: [i64; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAY_360_MONTHS: [i64; 12] = [30; 12];

/// Calendars a time axis may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    Gregorian,
    NoLeap,
    AllLeap,
    Day360,
    Julian,
}

impl Calendar {
    /// Calendar named by a `calendar` attribute; absent means Gregorian
    pub fn parse(name: Option<&str>) -> Result<Self> {
        let Some(name) = name else {
            return Ok(Calendar::Gregorian);
        };
        match name.trim().to_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Gregorian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            "julian" => Ok(Calendar::Julian),
            _ => Err(invalid(format!("unsupported calendar '{}'", name))),
        }
    }

    fn fixed_months(self) -> Option<&'static [i64; 12]> {
        match self {
            Calendar::NoLeap => Some(&NOLEAP_MONTHS),
            Calendar::AllLeap => Some(&ALL_LEAP_MONTHS),
            Calendar::Day360 => Some(&DAY_360_MONTHS),
            Calendar::Gregorian | Calendar::Julian => None,
        }
    }

    /// Days since the calendar's own epoch
    fn day_number(self, year: i64, month: i64, day: i64) -> i64 {
        match self.fixed_months() {
            Some(months) => {
                let year_len: i64 = months.iter().sum();
                let before: i64 = months[..(month - 1) as usize].iter().sum();
                year * year_len + before + day - 1
            }
            None => {
                // Julian day number
                let a = (14 - month) / 12;
                let y = year + 4800 - a;
                let m = month + 12 * a - 3;
                day + (153 * m + 2) / 5 + 365 * y + y / 4 - 32083
            }
        }
    }

    fn from_day_number(self, number: i64) -> (i64, i64, i64) {
        match self.fixed_months() {
            Some(months) => {
                let year_len: i64 = months.iter().sum();
                let year = number.div_euclid(year_len);
                let mut rest = number.rem_euclid(year_len);
                let mut month = 1;
                for length in months {
                    if rest < *length {
                        break;
                    }
                    rest -= length;
                    month += 1;
                }
                (year, month, rest + 1)
            }
            None => {
                let c = number + 32082;
                let d = (4 * c + 3) / 1461;
                let e = c - 1461 * d / 4;
                let m = (5 * e + 2) / 153;
                let day = e - (153 * m + 2) / 5 + 1;
                let month = m + 3 - 12 * (m / 10);
                (d - 4800 + m / 10, month, day)
            }
        }
    }

    /// Move `base` by `offset_ms` counting this calendar's days
    fn shift(self, base: NaiveDateTime, offset_ms: i64) -> Option<(i64, i64, i64, i64)> {
        let day = self.day_number(base.year() as i64, base.month() as i64, base.day() as i64);
        let time = base.time();
        let time_ms =
            time.num_seconds_from_midnight() as i64 * 1000 + (time.nanosecond() / 1_000_000) as i64;
        let total = day.checked_mul(MS_PER_DAY)?.checked_add(time_ms)?.checked_add(offset_ms)?;
        let (year, month, day) = self.from_day_number(total.div_euclid(MS_PER_DAY));
        Some((year, month, day, total.rem_euclid(MS_PER_DAY)))
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Calendar::Gregorian => "standard",
            Calendar::NoLeap => "noleap",
            Calendar::AllLeap => "all_leap",
            Calendar::Day360 => "360_day",
            Calendar::Julian => "julian",
        };
        f.write_str(name)
    }
}

const REFERENCE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn unit_seconds(unit: &str) -> Option<f64> {
    match unit.to_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => Some(1.0),
        "minutes" | "minute" | "mins" | "min" => Some(60.0),
        "hours" | "hour" | "hrs" | "hr" | "h" => Some(3600.0),
        "days" | "day" | "d" => Some(86400.0),
        _ => None,
    }
}

fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let mut text = reference.trim();
    for suffix in ["UTC", "Z", "+00:00", "+0000", "+00", "-00:00"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped.trim_end();
            break;
        }
    }

    for format in REFERENCE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn invalid(message: String) -> GudsError {
    GudsError::FormatError {
        format: "NetCDF".to_string(),
        message,
    }
}

/// Decode one time value through its `units` and `calendar` attributes
pub fn decode_time(value: f64, units: &str, calendar: Option<&str>) -> Result<NaiveDateTime> {
    let calendar = Calendar::parse(calendar)?;

    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| invalid(format!("time units '{}' are not '<unit> since <date>'", units)))?;

    let seconds = unit_seconds(unit.trim())
        .ok_or_else(|| invalid(format!("unknown time unit '{}'", unit.trim())))?;
    let base = parse_reference(reference)
        .ok_or_else(|| invalid(format!("unparseable reference date '{}'", reference.trim())))?;

    if !value.is_finite() {
        return Err(invalid(format!("time value {} is not finite", value)));
    }
    let offset_ms = (value * seconds * 1000.0).round() as i64;
    let overflow = || invalid(format!("time value {} {} overflows", value, units));

    if calendar == Calendar::Gregorian {
        return base
            .checked_add_signed(Duration::milliseconds(offset_ms))
            .ok_or_else(overflow);
    }

    let (year, month, day, ms) = calendar.shift(base, offset_ms).ok_or_else(overflow)?;
    let date = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month as u32, day as u32))
        .ok_or_else(|| {
            invalid(format!(
                "{:04}-{:02}-{:02} in the {} calendar has no Gregorian date",
                year, month, day, calendar
            ))
        })?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        (ms / 1000) as u32,
        ((ms % 1000) * 1_000_000) as u32,
    )
    .ok_or_else(overflow)?;
    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_hours_since() {
        let dt = decode_time(23.0, "hours since 2019-04-18 00:00:00", Some("standard")).unwrap();
        assert_eq!(dt.date(), date(2019, 4, 18));
        assert_eq!(dt.format("%H").to_string(), "23");
    }

    #[test]
    fn test_days_since_with_zone() {
        let dt = decode_time(1.5, "days since 1900-01-01T00:00:00Z", None).unwrap();
        assert_eq!(dt.date(), date(1900, 1, 2));
    }

    #[test]
    fn test_minutes_since_date_only() {
        let dt = decode_time(1440.0, "minutes since 2020-02-28", Some("gregorian")).unwrap();
        assert_eq!(dt.date(), date(2020, 2, 29));
    }

    #[test]
    fn test_rejects_bad_units() {
        assert!(decode_time(1.0, "hours", None).is_err());
        assert!(decode_time(1.0, "fortnights since 2019-01-01", None).is_err());
        assert!(decode_time(1.0, "days since yesterday", None).is_err());
        assert!(decode_time(f64::NAN, "days since 2019-01-01", None).is_err());
    }

    #[test]
    fn test_noleap_skips_february_29() {
        let dt = decode_time(108.0, "days since 2019-01-01", Some("noleap")).unwrap();
        assert_eq!(dt.date(), date(2019, 4, 19));

        let dt = decode_time(59.0, "days since 2020-01-01", Some("365_day")).unwrap();
        assert_eq!(dt.date(), date(2020, 3, 1));

        let dt = decode_time(365.0 * 24.0 + 6.0, "hours since 2019-12-31", Some("noleap")).unwrap();
        assert_eq!(dt, date(2020, 12, 31).and_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn test_all_leap_has_february_29() {
        let dt = decode_time(60.0, "days since 2019-01-01", Some("all_leap")).unwrap();
        assert_eq!(dt.date(), date(2019, 3, 1));
        assert!(decode_time(59.0, "days since 2019-01-01", Some("366_day")).is_err());
    }

    #[test]
    fn test_360_day_months() {
        let dt = decode_time(45.0, "days since 2019-01-01", Some("360_day")).unwrap();
        assert_eq!(dt.date(), date(2019, 2, 16));

        let dt = decode_time(-1.0, "days since 2019-01-01", Some("360_day")).unwrap();
        assert_eq!(dt.date(), date(2018, 12, 30));

        let err = decode_time(59.0, "days since 2019-01-01", Some("360_day")).unwrap_err();
        assert!(err.to_string().contains("2019-02-30"));
    }

    #[test]
    fn test_julian_century_leap_years() {
        let dt = decode_time(108.0, "days since 2019-01-01", Some("julian")).unwrap();
        assert_eq!(dt.date(), date(2019, 4, 19));

        // 1900 is a leap year in the julian calendar only
        assert!(decode_time(1.0, "days since 1900-02-28", Some("julian")).is_err());
        let dt = decode_time(2.0, "days since 1900-02-28", Some("julian")).unwrap();
        assert_eq!(dt.date(), date(1900, 3, 1));
    }

    #[test]
    fn test_rejects_unknown_calendar() {
        assert!(decode_time(1.0, "days since 2019-01-01", Some("lunar")).is_err());
        assert_eq!(Calendar::parse(Some(" Gregorian ")).unwrap(), Calendar::Gregorian);
        assert_eq!(Calendar::parse(None).unwrap(), Calendar::Gregorian);
    }
}
