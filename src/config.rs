use crate::error::{CalendarError, CalendarResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive `[min, max]` bound for a random draw count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub min: u32,
    pub max: u32,
}

impl DayRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn validate(&self, what: &str) -> CalendarResult<()> {
        if self.min > self.max {
            return Err(CalendarError::configuration(format!(
                "{what}: min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThanksgivingStyle {
    /// Wednesday through Friday around Thanksgiving Day.
    WedFri,
    /// Thanksgiving Day through the following Monday.
    ThuMon,
}

/// Where the five weekdays of spring break sit relative to Easter Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpringBreakAnchor {
    WeekBefore,
    WeekAfter,
    /// Break starts on the first weekday on or after Easter + `days`.
    Offset { days: i64 },
}

impl SpringBreakAnchor {
    pub fn offset_days(self) -> i64 {
        match self {
            SpringBreakAnchor::WeekBefore => -6,
            SpringBreakAnchor::WeekAfter => 1,
            SpringBreakAnchor::Offset { days } => days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakConfig {
    /// Fall break length in weekdays, starting on the 2nd Monday of October.
    pub fall_break_days: u32,
    pub thanksgiving: ThanksgivingStyle,
    /// Per school-year id override of the Thanksgiving style.
    pub thanksgiving_overrides: BTreeMap<u32, ThanksgivingStyle>,
    pub spring_break: SpringBreakAnchor,
    /// Close the Monday after Easter when spring break does not already
    /// cover it.
    pub easter_monday: bool,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            fall_break_days: 2,
            thanksgiving: ThanksgivingStyle::ThuMon,
            thanksgiving_overrides: BTreeMap::new(),
            spring_break: SpringBreakAnchor::WeekBefore,
            easter_monday: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub days: DayRange,
    /// Calendar months in which weather closures can land.
    pub months: Vec<u32>,
    /// Subtracted from the drawn count in the two school years after the
    /// COVID closure year.
    pub covid_reduction: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            days: DayRange::new(2, 5),
            months: vec![12, 1, 2, 3],
            covid_reduction: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CovidConfig {
    pub enabled: bool,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub closure_start: NaiveDate,
    pub remote_days: DayRange,
    pub hybrid_days: DayRange,
    pub quarantine_days: DayRange,
    /// Calendar months in which remote, hybrid and quarantine days land.
    pub months: Vec<u32>,
}

impl Default for CovidConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_start: date_or_epoch(2019, 3, 13),
            window_end: date_or_epoch(2022, 6, 30),
            closure_start: date_or_epoch(2020, 3, 13),
            remote_days: DayRange::new(10, 15),
            hybrid_days: DayRange::new(15, 20),
            quarantine_days: DayRange::new(3, 7),
            months: vec![9, 10, 11],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherDaysConfig {
    pub work_days: DayRange,
    pub pd_days: DayRange,
}

impl Default for TeacherDaysConfig {
    fn default() -> Self {
        Self {
            work_days: DayRange::new(5, 10),
            pd_days: DayRange::new(3, 5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Month/day of the spring SAT school day, rolled forward off weekends.
    pub sat_month: u32,
    pub sat_day: u32,
    /// Number of weekdays at the start of May reserved for AP exams.
    pub ap_weekdays: u32,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            sat_month: 3,
            sat_day: 10,
            ap_weekdays: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub enabled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Instructional-day bounds per school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    pub warn_min: u32,
    pub warn_max: u32,
    pub error_min: u32,
    pub error_max: u32,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            warn_min: 175,
            warn_max: 185,
            error_min: 150,
            error_max: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    /// Calendar year in which school year 1 starts.
    pub first_academic_year: i32,
    pub school_year_count: u32,
    /// Master seed; provider streams are derived from it.
    pub seed: u64,
    /// Explicit seed per provider name, replacing the derived sub-seed.
    pub seed_overrides: BTreeMap<String, u64>,
    /// Per school-year id replacement of the computed first day.
    pub start_overrides: BTreeMap<u32, NaiveDate>,
    pub include_columbus_day: bool,
    pub instructional_floor: u32,
    /// Weekdays held back for random closures when sizing a year. Defaults to
    /// the largest weather + teacher work + PD draw.
    pub reserved_closure_days: Option<u32>,
    pub end_cap_month: u32,
    pub end_cap_day: u32,
    pub breaks: BreakConfig,
    pub weather: WeatherConfig,
    pub covid: CovidConfig,
    pub teacher_days: TeacherDaysConfig,
    pub testing: TestingConfig,
    pub events: EventsConfig,
    pub validation: ValidationThresholds,
    /// Fixed created_at/updated_at stamp. Midnight of each date when unset.
    pub generated_at: Option<NaiveDateTime>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            range_start: date_or_epoch(2016, 8, 1),
            range_end: date_or_epoch(2026, 6, 30),
            first_academic_year: 2016,
            school_year_count: 10,
            seed: 42,
            seed_overrides: BTreeMap::new(),
            start_overrides: BTreeMap::new(),
            include_columbus_day: true,
            instructional_floor: 175,
            reserved_closure_days: None,
            end_cap_month: 6,
            end_cap_day: 30,
            breaks: BreakConfig::default(),
            weather: WeatherConfig::default(),
            covid: CovidConfig::default(),
            teacher_days: TeacherDaysConfig::default(),
            testing: TestingConfig::default(),
            events: EventsConfig::default(),
            validation: ValidationThresholds::default(),
            generated_at: None,
        }
    }
}

impl CalendarConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn reserved_closure_days(&self) -> u32 {
        self.reserved_closure_days.unwrap_or(
            self.weather.days.max + self.teacher_days.work_days.max + self.teacher_days.pd_days.max,
        )
    }

    /// Rejects self-contradictory settings before anything is generated.
    pub fn validate(&self) -> CalendarResult<()> {
        if self.range_start > self.range_end {
            return Err(CalendarError::configuration(format!(
                "range start {} is after range end {}",
                self.range_start, self.range_end
            )));
        }
        if self.school_year_count == 0 {
            return Err(CalendarError::configuration(
                "school_year_count must be at least 1",
            ));
        }
        if !(1..=2).contains(&self.breaks.fall_break_days) {
            return Err(CalendarError::configuration(format!(
                "fall_break_days must be 1 or 2 (got {})",
                self.breaks.fall_break_days
            )));
        }
        if self.weather.months.iter().any(|m| !(1..=12).contains(m)) {
            return Err(CalendarError::configuration(
                "weather months must be between 1 and 12",
            ));
        }
        if self.covid.months.iter().any(|m| !(1..=12).contains(m)) {
            return Err(CalendarError::configuration(
                "covid months must be between 1 and 12",
            ));
        }
        self.weather.days.validate("weather.days")?;
        self.covid.remote_days.validate("covid.remote_days")?;
        self.covid.hybrid_days.validate("covid.hybrid_days")?;
        self.covid.quarantine_days.validate("covid.quarantine_days")?;
        self.teacher_days.work_days.validate("teacher_days.work_days")?;
        self.teacher_days.pd_days.validate("teacher_days.pd_days")?;
        if self.covid.window_start > self.covid.window_end {
            return Err(CalendarError::configuration(
                "covid window start is after window end",
            ));
        }
        if !(self.covid.window_start..=self.covid.window_end).contains(&self.covid.closure_start) {
            return Err(CalendarError::configuration(
                "covid closure start must fall inside the covid window",
            ));
        }
        if !(1..=15).contains(&self.testing.ap_weekdays) {
            return Err(CalendarError::configuration(
                "testing.ap_weekdays must be between 1 and 15",
            ));
        }
        if NaiveDate::from_ymd_opt(2001, self.testing.sat_month, self.testing.sat_day).is_none() {
            return Err(CalendarError::configuration(format!(
                "invalid SAT school day {}-{}",
                self.testing.sat_month, self.testing.sat_day
            )));
        }
        if !(6..=7).contains(&self.end_cap_month)
            || NaiveDate::from_ymd_opt(2001, self.end_cap_month, self.end_cap_day).is_none()
        {
            return Err(CalendarError::configuration(format!(
                "school-year end cap {}-{} must be a June or July date",
                self.end_cap_month, self.end_cap_day
            )));
        }
        let t = &self.validation;
        if !(t.error_min <= t.warn_min && t.warn_min <= t.warn_max && t.warn_max <= t.error_max) {
            return Err(CalendarError::configuration(
                "validation thresholds must satisfy error_min <= warn_min <= warn_max <= error_max",
            ));
        }
        Ok(())
    }
}

fn date_or_epoch(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
