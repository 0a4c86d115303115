use super::covid::{CovidPhase, covid_phase};
use super::weather::weather_ceiling;
use super::{RuleProvider, draw_dates, potential_instructional_days};
use crate::config::{CalendarConfig, CovidConfig, TeacherDaysConfig, TestingConfig, WeatherConfig};
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::{SchoolYear, SchoolYearRegistry};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use tracing::debug;

pub const WORK_DAY_LABEL: &str = "Teacher Work Day";
pub const PD_DAY_LABEL: &str = "Professional Development Day";

/// Most work days `year` can take while the largest weather and PD draws
/// still leave the instructional floor intact.
pub(crate) fn work_day_ceiling(
    teacher_days: &TeacherDaysConfig,
    weather: &WeatherConfig,
    phase: Option<CovidPhase>,
    year: &SchoolYear,
    floor: u32,
) -> u32 {
    let room = year
        .instructional_slots
        .saturating_sub(floor)
        .saturating_sub(weather_ceiling(weather, phase))
        .saturating_sub(teacher_days.pd_days.max);
    teacher_days.work_days.max.min(room)
}

/// Teacher work days and professional development days, disjoint within a
/// year. They stay out of the weather months, and out of the COVID months in
/// the hybrid and quarantine years, so no other closure lands on them.
#[derive(Debug, Clone)]
pub struct TeacherDaysProvider {
    teacher_days: TeacherDaysConfig,
    weather: WeatherConfig,
    covid: CovidConfig,
    testing: TestingConfig,
    floor: u32,
}

impl TeacherDaysProvider {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            teacher_days: config.teacher_days.clone(),
            weather: config.weather.clone(),
            covid: config.covid.clone(),
            testing: config.testing.clone(),
            floor: config.instructional_floor,
        }
    }

    fn pool(
        &self,
        registry: &SchoolYearRegistry,
        year: &SchoolYear,
        phase: Option<CovidPhase>,
    ) -> CalendarResult<Vec<NaiveDate>> {
        let covid_months = matches!(phase, Some(CovidPhase::Hybrid | CovidPhase::Quarantine));
        Ok(potential_instructional_days(registry, year, &self.testing)?
            .into_iter()
            .filter(|date| !self.weather.months.contains(&date.month()))
            .filter(|date| !(covid_months && self.covid.months.contains(&date.month())))
            .collect())
    }
}

impl RuleProvider for TeacherDaysProvider {
    fn name(&self) -> &'static str {
        "teacher_days"
    }

    fn tier(&self) -> u8 {
        DayType::TeacherWorkDay.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let work = self.teacher_days.work_days;
        let pd = self.teacher_days.pd_days;
        let mut out = Vec::new();
        for year in registry.years() {
            let phase = covid_phase(&self.covid, year);
            let pool = self.pool(registry, year, phase)?;

            let ceiling =
                work_day_ceiling(&self.teacher_days, &self.weather, phase, year, self.floor);
            let drawn = rng.gen_range(work.min..=work.max);
            if drawn > ceiling {
                debug!(
                    school_year = year.id,
                    drawn,
                    kept = ceiling,
                    "capping teacher work days"
                );
            }
            let work_days = draw_dates(&pool, drawn.min(ceiling), rng);
            let taken: BTreeSet<NaiveDate> = work_days.iter().copied().collect();
            let rest: Vec<NaiveDate> = pool.into_iter().filter(|d| !taken.contains(d)).collect();
            let pd_days = draw_dates(&rest, rng.gen_range(pd.min..=pd.max), rng);

            out.extend(
                work_days
                    .into_iter()
                    .map(|date| DayTypeCandidate::new(date, DayType::TeacherWorkDay, WORK_DAY_LABEL)),
            );
            out.extend(
                pd_days
                    .into_iter()
                    .map(|date| DayTypeCandidate::new(date, DayType::PdDay, PD_DAY_LABEL)),
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::build_registry;
    use rand::SeedableRng;

    #[test]
    fn counts_stay_in_range_and_never_overlap() {
        let config = CalendarConfig::default();
        let registry = build_registry(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let out = TeacherDaysProvider::new(&config)
            .candidates(&registry, &mut rng)
            .unwrap();
        for year in registry.years() {
            let in_year: Vec<_> = out.iter().filter(|c| year.contains(c.date)).collect();
            let work = in_year
                .iter()
                .filter(|c| c.day_type == DayType::TeacherWorkDay)
                .count();
            let pd = in_year.iter().filter(|c| c.day_type == DayType::PdDay).count();
            assert!((5..=10).contains(&work));
            assert!((3..=5).contains(&pd));
            let unique: BTreeSet<_> = in_year.iter().map(|c| c.date).collect();
            assert_eq!(unique.len(), in_year.len());
            assert!(in_year.iter().all(|c| registry.is_open_weekday(year, c.date)));
        }
    }

    #[test]
    fn staff_days_avoid_weather_and_covid_months() {
        let config = CalendarConfig::default();
        let registry = build_registry(&config).unwrap();
        for seed in 0..6 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = TeacherDaysProvider::new(&config)
                .candidates(&registry, &mut rng)
                .unwrap();
            for candidate in &out {
                let month = candidate.date.month();
                assert!(!config.weather.months.contains(&month), "{}", candidate.date);
                let year = registry.year_for(candidate.date).unwrap();
                if matches!(
                    covid_phase(&config.covid, year),
                    Some(CovidPhase::Hybrid | CovidPhase::Quarantine)
                ) {
                    assert!(!config.covid.months.contains(&month), "{}", candidate.date);
                }
            }
        }
    }

    #[test]
    fn short_year_caps_its_work_days() {
        let config = CalendarConfig::default();
        let registry = build_registry(&config).unwrap();
        // 2020-21 stops at 193 slots: 193 - 175 - 4 weather - 5 PD leaves 9.
        let year = registry.get(5).unwrap();
        let phase = covid_phase(&config.covid, year);
        let ceiling = work_day_ceiling(&config.teacher_days, &config.weather, phase, year, 175);
        assert_eq!(ceiling, 9);
        for seed in 0..12 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = TeacherDaysProvider::new(&config)
                .candidates(&registry, &mut rng)
                .unwrap();
            let work = out
                .iter()
                .filter(|c| year.contains(c.date) && c.day_type == DayType::TeacherWorkDay)
                .count() as u32;
            assert!(work <= 9);
        }

        let uncapped = registry.get(2).unwrap();
        assert_eq!(
            work_day_ceiling(&config.teacher_days, &config.weather, None, uncapped, 175),
            10
        );
    }
}
