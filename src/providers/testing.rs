use super::RuleProvider;
use crate::calendar::{nth_weekday, roll_to_weekday, weekdays_inclusive, ymd};
use crate::config::TestingConfig;
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::{SchoolYear, SchoolYearRegistry};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;

pub const PSAT_LABEL: &str = "PSAT Day";
pub const SAT_LABEL: &str = "SAT School Day";
pub const AP_LABEL: &str = "AP Exam Week";
pub const GRADUATION_LABEL: &str = "Graduation Ceremony";

/// Fixed testing dates of `year` that land on open weekdays, in date order.
///
/// Random providers keep clear of these dates.
pub fn fixed_testing_dates(
    registry: &SchoolYearRegistry,
    year: &SchoolYear,
    testing: &TestingConfig,
) -> CalendarResult<Vec<(NaiveDate, &'static str)>> {
    let academic_year = year.academic_year();
    let mut dates = Vec::new();

    dates.push((nth_weekday(academic_year, 10, Weekday::Wed, 3)?, PSAT_LABEL));

    let sat = roll_to_weekday(ymd(academic_year + 1, testing.sat_month, testing.sat_day)?);
    dates.push((sat, SAT_LABEL));

    let may_first = ymd(academic_year + 1, 5, 1)?;
    let ap_days = weekdays_inclusive(may_first, year.end)
        .filter(|date| registry.is_open_weekday(year, *date))
        .take(testing.ap_weekdays as usize);
    dates.extend(ap_days.map(|date| (date, AP_LABEL)));

    let graduation = year
        .weekdays()
        .filter(|date| date.weekday() == Weekday::Fri && registry.is_open_weekday(year, *date))
        .last();
    if let Some(date) = graduation {
        dates.push((date, GRADUATION_LABEL));
    }

    dates.retain(|(date, _)| registry.is_open_weekday(year, *date));
    dates.sort_by_key(|(date, _)| *date);
    dates.dedup_by_key(|(date, _)| *date);
    Ok(dates)
}

/// PSAT, SAT school day, AP weeks and graduation for every school year.
#[derive(Debug, Clone)]
pub struct TestingProvider {
    testing: TestingConfig,
}

impl TestingProvider {
    pub fn new(testing: TestingConfig) -> Self {
        Self { testing }
    }
}

impl RuleProvider for TestingProvider {
    fn name(&self) -> &'static str {
        "testing"
    }

    fn tier(&self) -> u8 {
        DayType::Testing.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        _rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let mut out = Vec::new();
        for year in registry.years() {
            for (date, label) in fixed_testing_dates(registry, year, &self.testing)? {
                out.push(DayTypeCandidate::new(date, DayType::Testing, label));
            }
        }
        Ok(out)
    }
}
