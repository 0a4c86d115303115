use super::RuleProvider;
use crate::calendar::{weekday_on_or_after, ymd};
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::SchoolYearRegistry;
use chrono::{Duration, Weekday};
use rand::rngs::StdRng;

pub const HOMECOMING_LABEL: &str = "Homecoming";
pub const SPIRIT_WEEK_LABEL: &str = "Spirit Week";
pub const FIELD_DAY_LABEL: &str = "Field Day";

/// Homecoming, the spirit week leading up to it, and spring field day.
#[derive(Debug, Clone)]
pub struct SpecialEventProvider {
    enabled: bool,
}

impl SpecialEventProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl RuleProvider for SpecialEventProvider {
    fn name(&self) -> &'static str {
        "events"
    }

    fn tier(&self) -> u8 {
        DayType::Event.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        _rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for year in registry.years() {
            let academic_year = year.academic_year();
            let homecoming = weekday_on_or_after(ymd(academic_year, 10, 20)?, Weekday::Fri);
            out.push(DayTypeCandidate::new(homecoming, DayType::Event, HOMECOMING_LABEL));
            for back in (1..=4).rev() {
                out.push(DayTypeCandidate::new(
                    homecoming - Duration::days(back),
                    DayType::Event,
                    SPIRIT_WEEK_LABEL,
                ));
            }

            let field_day = weekday_on_or_after(ymd(academic_year + 1, 5, 20)?, Weekday::Fri);
            if year.contains(field_day) {
                out.push(DayTypeCandidate::new(field_day, DayType::Event, FIELD_DAY_LABEL));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalendarConfig;
    use crate::registry::build_registry;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn homecoming_week_and_field_day() {
        let registry = build_registry(&CalendarConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let out = SpecialEventProvider::new(true)
            .candidates(&registry, &mut rng)
            .unwrap();
        let year_9: Vec<_> = out
            .iter()
            .filter(|c| registry.get(9).unwrap().contains(c.date))
            .collect();
        // 2024-10-20 is a Sunday, so homecoming is Friday 2024-10-25.
        assert_eq!(year_9[0].date, date(2024, 10, 25));
        assert_eq!(year_9[0].label, HOMECOMING_LABEL);
        assert_eq!(year_9[1].date, date(2024, 10, 21));
        assert_eq!(year_9[4].date, date(2024, 10, 24));
        assert_eq!(year_9[5].date, date(2025, 5, 23));
        assert_eq!(year_9[5].label, FIELD_DAY_LABEL);
    }

    #[test]
    fn disabled_events_emit_nothing() {
        let registry = build_registry(&CalendarConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let out = SpecialEventProvider::new(false)
            .candidates(&registry, &mut rng)
            .unwrap();
        assert!(out.is_empty());
    }
}
