use super::RuleProvider;
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::SchoolYearRegistry;
use rand::rngs::StdRng;

/// Every day of every break window in the registry, weekends included.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakProvider;

impl RuleProvider for BreakProvider {
    fn name(&self) -> &'static str {
        "breaks"
    }

    fn tier(&self) -> u8 {
        DayType::Break.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        _rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        Ok(registry
            .years()
            .iter()
            .flat_map(|year| year.breaks.iter())
            .flat_map(|window| {
                window
                    .days()
                    .map(move |date| DayTypeCandidate::new(date, DayType::Break, window.name()))
            })
            .collect())
    }
}
