use crate::error::DateAlgorithmError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// US federal holidays observed by the district, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FederalHoliday {
    NewYearsDay,
    MartinLutherKingJrDay,
    PresidentsDay,
    MemorialDay,
    IndependenceDay,
    LaborDay,
    ColumbusDay,
    VeteransDay,
    ThanksgivingDay,
    ChristmasDay,
}

impl FederalHoliday {
    pub const ALL: [FederalHoliday; 10] = [
        FederalHoliday::NewYearsDay,
        FederalHoliday::MartinLutherKingJrDay,
        FederalHoliday::PresidentsDay,
        FederalHoliday::MemorialDay,
        FederalHoliday::IndependenceDay,
        FederalHoliday::LaborDay,
        FederalHoliday::ColumbusDay,
        FederalHoliday::VeteransDay,
        FederalHoliday::ThanksgivingDay,
        FederalHoliday::ChristmasDay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FederalHoliday::NewYearsDay => "New Year's Day",
            FederalHoliday::MartinLutherKingJrDay => "Martin Luther King Jr. Day",
            FederalHoliday::PresidentsDay => "Presidents Day",
            FederalHoliday::MemorialDay => "Memorial Day",
            FederalHoliday::IndependenceDay => "Independence Day",
            FederalHoliday::LaborDay => "Labor Day",
            FederalHoliday::ColumbusDay => "Columbus Day",
            FederalHoliday::VeteransDay => "Veterans Day",
            FederalHoliday::ThanksgivingDay => "Thanksgiving Day",
            FederalHoliday::ChristmasDay => "Christmas Day",
        }
    }

    /// Actual (not observed) date of the holiday in `year`.
    pub fn date_in(self, year: i32) -> Result<NaiveDate, DateAlgorithmError> {
        match self {
            FederalHoliday::NewYearsDay => ymd(year, 1, 1),
            // 3rd Monday in January
            FederalHoliday::MartinLutherKingJrDay => nth_weekday(year, 1, Weekday::Mon, 3),
            // 3rd Monday in February
            FederalHoliday::PresidentsDay => nth_weekday(year, 2, Weekday::Mon, 3),
            // Last Monday in May
            FederalHoliday::MemorialDay => nth_weekday(year, 5, Weekday::Mon, -1),
            FederalHoliday::IndependenceDay => ymd(year, 7, 4),
            // 1st Monday in September
            FederalHoliday::LaborDay => nth_weekday(year, 9, Weekday::Mon, 1),
            // 2nd Monday in October
            FederalHoliday::ColumbusDay => nth_weekday(year, 10, Weekday::Mon, 2),
            FederalHoliday::VeteransDay => ymd(year, 11, 11),
            // 4th Thursday in November
            FederalHoliday::ThanksgivingDay => nth_weekday(year, 11, Weekday::Thu, 4),
            FederalHoliday::ChristmasDay => ymd(year, 12, 25),
        }
    }
}

impl fmt::Display for FederalHoliday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateAlgorithmError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(DateAlgorithmError::InvalidDate { year, month, day })
}

/// Easter Sunday for `year` using the Anonymous Gregorian algorithm.
pub fn easter_sunday(year: i32) -> Result<NaiveDate, DateAlgorithmError> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

/// The `n`-th occurrence of `weekday` in `month`.
///
/// Positive `n` counts from the first of the month, negative `n` counts back
/// from the last day (`-1` is the last occurrence). `n == 0` and occurrences
/// past the end of the month are rejected.
pub fn nth_weekday(
    year: i32,
    month: u32,
    weekday: Weekday,
    n: i32,
) -> Result<NaiveDate, DateAlgorithmError> {
    let out_of_range = DateAlgorithmError::OutOfRange {
        year,
        month,
        weekday,
        n,
    };
    // No month holds more than five of one weekday.
    if n == 0 || n.unsigned_abs() > 5 {
        return Err(out_of_range);
    }
    let first = ymd(year, month, 1)?;
    let last = last_day_of_month(year, month)?;
    let target = weekday.num_days_from_monday() as i32;

    let day = if n > 0 {
        let skip = (target - first.weekday().num_days_from_monday() as i32).rem_euclid(7);
        1 + skip + 7 * (n - 1)
    } else {
        let back = (last.weekday().num_days_from_monday() as i32 - target).rem_euclid(7);
        last.day() as i32 - back - 7 * (-n - 1)
    };

    if day < 1 || day > last.day() as i32 {
        return Err(out_of_range);
    }
    ymd(year, month, day as u32)
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate, DateAlgorithmError> {
    let next_first = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    Ok(next_first - Duration::days(1))
}

/// Every federal holiday of `year` keyed by holiday, in calendar order.
pub fn federal_holidays(
    year: i32,
    include_columbus: bool,
) -> Result<BTreeMap<FederalHoliday, NaiveDate>, DateAlgorithmError> {
    let mut holidays = BTreeMap::new();
    for holiday in FederalHoliday::ALL {
        if holiday == FederalHoliday::ColumbusDay && !include_columbus {
            continue;
        }
        holidays.insert(holiday, holiday.date_in(year)?);
    }
    Ok(holidays)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First `weekday` falling on or after `date`.
pub fn weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let skip = (weekday.num_days_from_monday() as i64
        - date.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    date + Duration::days(skip)
}

/// Last `weekday` falling on or before `date`.
pub fn weekday_on_or_before(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let back = (date.weekday().num_days_from_monday() as i64
        - weekday.num_days_from_monday() as i64)
        .rem_euclid(7);
    date - Duration::days(back)
}

/// Moves a Saturday or Sunday forward to the following Monday.
pub fn roll_to_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Moves a Saturday or Sunday back to the preceding Friday.
pub fn roll_back_to_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}

/// Every date in `[start, end]`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Every Monday..Friday in `[start, end]`.
pub fn weekdays_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    days_inclusive(start, end).filter(|d| !is_weekend(*d))
}

pub fn count_days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_matches_known_dates() {
        assert_eq!(easter_sunday(2016).unwrap(), date(2016, 3, 27));
        assert_eq!(easter_sunday(2019).unwrap(), date(2019, 4, 21));
        assert_eq!(easter_sunday(2024).unwrap(), date(2024, 3, 31));
        assert_eq!(easter_sunday(2025).unwrap(), date(2025, 4, 20));
        assert_eq!(easter_sunday(2026).unwrap(), date(2026, 4, 5));
    }

    #[test]
    fn nth_weekday_counts_from_both_ends() {
        assert_eq!(
            nth_weekday(2024, 11, Weekday::Thu, 4).unwrap(),
            date(2024, 11, 28)
        );
        assert_eq!(
            nth_weekday(2025, 5, Weekday::Mon, -1).unwrap(),
            date(2025, 5, 26)
        );
        assert_eq!(
            nth_weekday(2024, 10, Weekday::Wed, 3).unwrap(),
            date(2024, 10, 16)
        );
    }

    #[test]
    fn nth_weekday_rejects_missing_occurrences() {
        // February 2021 has exactly four Mondays.
        assert!(nth_weekday(2021, 2, Weekday::Mon, 4).is_ok());
        let err = nth_weekday(2021, 2, Weekday::Mon, 5).unwrap_err();
        assert!(matches!(err, DateAlgorithmError::OutOfRange { n: 5, .. }));
        assert!(nth_weekday(2021, 2, Weekday::Mon, 0).is_err());
        assert!(nth_weekday(2021, 2, Weekday::Mon, -5).is_err());
    }

    #[test]
    fn nth_weekday_rejects_extreme_occurrence_numbers() {
        for n in [6, -6, i32::MAX, i32::MIN, i32::MIN + 1] {
            let err = nth_weekday(2024, 3, Weekday::Fri, n).unwrap_err();
            assert_eq!(
                err,
                DateAlgorithmError::OutOfRange {
                    year: 2024,
                    month: 3,
                    weekday: Weekday::Fri,
                    n,
                }
            );
        }
    }

    #[test]
    fn federal_holidays_respect_columbus_toggle() {
        let with = federal_holidays(2025, true).unwrap();
        let without = federal_holidays(2025, false).unwrap();
        assert_eq!(with.len(), 10);
        assert_eq!(without.len(), 9);
        assert_eq!(with[&FederalHoliday::ColumbusDay], date(2025, 10, 13));
        assert_eq!(with[&FederalHoliday::LaborDay], date(2025, 9, 1));
        assert!(!without.contains_key(&FederalHoliday::ColumbusDay));
    }

    #[test]
    fn weekday_helpers_move_in_the_right_direction() {
        // 2024-08-25 is a Sunday
        let sunday = date(2024, 8, 25);
        assert_eq!(weekday_on_or_after(sunday, Weekday::Mon), date(2024, 8, 26));
        assert_eq!(weekday_on_or_before(sunday, Weekday::Fri), date(2024, 8, 23));
        assert_eq!(roll_to_weekday(sunday), date(2024, 8, 26));
        assert_eq!(weekdays_inclusive(date(2024, 8, 19), sunday).count(), 5);
        assert_eq!(count_days_inclusive(date(2016, 8, 1), date(2026, 6, 30)), 3621);
    }
}
