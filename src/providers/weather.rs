use super::covid::{CovidPhase, covid_phase};
use super::{RuleProvider, draw_dates, potential_instructional_days};
use crate::config::{CalendarConfig, CovidConfig, TestingConfig, WeatherConfig};
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::SchoolYearRegistry;
use chrono::Datelike;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const WEATHER_LABELS: [&str; 4] = ["Snow Day", "Ice Day", "Severe Storm Day", "Extreme Cold Day"];

/// Largest number of weather days a year in `phase` can receive.
pub(crate) fn weather_ceiling(weather: &WeatherConfig, phase: Option<CovidPhase>) -> u32 {
    match phase {
        Some(CovidPhase::Hybrid | CovidPhase::Quarantine) => {
            weather.days.max.saturating_sub(weather.covid_reduction)
        }
        _ => weather.days.max,
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    weather: WeatherConfig,
    covid: CovidConfig,
    testing: TestingConfig,
}

impl WeatherProvider {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            weather: config.weather.clone(),
            covid: config.covid.clone(),
            testing: config.testing.clone(),
        }
    }
}

impl RuleProvider for WeatherProvider {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn tier(&self) -> u8 {
        DayType::Weather.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let mut out = Vec::new();
        for year in registry.years() {
            let phase = covid_phase(&self.covid, year);
            let mut count = rng.gen_range(self.weather.days.min..=self.weather.days.max);
            if matches!(phase, Some(CovidPhase::Hybrid | CovidPhase::Quarantine)) {
                count = count.saturating_sub(self.weather.covid_reduction);
            }

            let pool: Vec<_> = potential_instructional_days(registry, year, &self.testing)?
                .into_iter()
                .filter(|date| self.weather.months.contains(&date.month()))
                .filter(|date| {
                    phase != Some(CovidPhase::Closure) || *date < self.covid.closure_start
                })
                .collect();

            for date in draw_dates(&pool, count, rng) {
                let label = WEATHER_LABELS.choose(rng).copied().unwrap_or(WEATHER_LABELS[0]);
                out.push(DayTypeCandidate::new(date, DayType::Weather, label));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::build_registry;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn run(config: &CalendarConfig, seed: u64) -> (SchoolYearRegistry, Vec<DayTypeCandidate>) {
        let registry = build_registry(config).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let out = WeatherProvider::new(config)
            .candidates(&registry, &mut rng)
            .unwrap();
        (registry, out)
    }

    #[test]
    fn draws_land_on_open_winter_weekdays() {
        let config = CalendarConfig::default();
        let (registry, out) = run(&config, 5);
        for candidate in &out {
            let year = registry.year_for(candidate.date).unwrap();
            assert!(registry.is_open_weekday(year, candidate.date));
            assert!([12, 1, 2, 3].contains(&candidate.date.month()));
            assert!(WEATHER_LABELS.contains(&candidate.label.as_str()));
        }
        for year in registry.years() {
            let n = out.iter().filter(|c| year.contains(c.date)).count() as u32;
            let ceiling = weather_ceiling(&config.weather, covid_phase(&config.covid, year));
            assert!(n <= ceiling, "year {} drew {n}", year.id);
        }
    }

    #[test]
    fn closure_year_has_no_weather_after_march_13() {
        let config = CalendarConfig::default();
        let closure = NaiveDate::from_ymd_opt(2020, 3, 13).unwrap();
        for seed in 0..16 {
            let (registry, out) = run(&config, seed);
            let year = registry.get(4).unwrap();
            assert!(
                out.iter()
                    .filter(|c| year.contains(c.date))
                    .all(|c| c.date < closure)
            );
        }
    }

    #[test]
    fn ceiling_drops_in_the_years_after_the_closure() {
        let weather = WeatherConfig::default();
        assert_eq!(weather_ceiling(&weather, None), 5);
        assert_eq!(weather_ceiling(&weather, Some(CovidPhase::Closure)), 5);
        assert_eq!(weather_ceiling(&weather, Some(CovidPhase::Hybrid)), 4);
        assert_eq!(weather_ceiling(&weather, Some(CovidPhase::Quarantine)), 4);
    }
}
