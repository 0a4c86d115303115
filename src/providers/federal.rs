use super::RuleProvider;
use crate::calendar::federal_holidays;
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::SchoolYearRegistry;
use rand::rngs::StdRng;

/// Proposes every federal holiday in the calendar years the range touches,
/// weekend or not. Observed-date shifting is not applied.
#[derive(Debug, Clone)]
pub struct FederalHolidayProvider {
    include_columbus: bool,
}

impl FederalHolidayProvider {
    pub fn new(include_columbus: bool) -> Self {
        Self { include_columbus }
    }
}

impl RuleProvider for FederalHolidayProvider {
    fn name(&self) -> &'static str {
        "federal_holidays"
    }

    fn tier(&self) -> u8 {
        DayType::Holiday.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        _rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let mut out = Vec::new();
        for year in registry.calendar_years() {
            for (holiday, date) in federal_holidays(year, self.include_columbus)? {
                if date < registry.range_start() || date > registry.range_end() {
                    continue;
                }
                out.push(DayTypeCandidate::new(date, DayType::Holiday, holiday.name()));
            }
        }
        Ok(out)
    }
}
