use super::teacher_days::work_day_ceiling;
use super::weather::weather_ceiling;
use super::{RuleProvider, draw_dates, potential_instructional_days};
use crate::calendar::weekdays_inclusive;
use crate::config::{CalendarConfig, CovidConfig, TeacherDaysConfig, TestingConfig, WeatherConfig};
use crate::day_type::{DayType, DayTypeCandidate};
use crate::error::CalendarResult;
use crate::registry::{SchoolYear, SchoolYearRegistry};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use tracing::debug;

pub const CLOSURE_LABEL: &str = "COVID-19 Closure";
pub const REMOTE_LABEL: &str = "Remote Learning Day";
pub const HYBRID_LABEL: &str = "Hybrid Learning Day";
pub const QUARANTINE_LABEL: &str = "COVID-19 Quarantine Day";

/// Position of a school year relative to the year the closure began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovidPhase {
    Closure,
    Hybrid,
    Quarantine,
}

pub fn covid_phase(config: &CovidConfig, year: &SchoolYear) -> Option<CovidPhase> {
    if !config.enabled || year.end < config.window_start || year.start > config.window_end {
        return None;
    }
    let closure = config.closure_start;
    let closure_academic_year = if closure.month() >= 8 {
        closure.year()
    } else {
        closure.year() - 1
    };
    match year.academic_year() - closure_academic_year {
        0 => Some(CovidPhase::Closure),
        1 => Some(CovidPhase::Hybrid),
        2 => Some(CovidPhase::Quarantine),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CovidProvider {
    covid: CovidConfig,
    weather: WeatherConfig,
    teacher_days: TeacherDaysConfig,
    testing: TestingConfig,
    floor: u32,
}

impl CovidProvider {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            covid: config.covid.clone(),
            weather: config.weather.clone(),
            teacher_days: config.teacher_days.clone(),
            testing: config.testing.clone(),
            floor: config.instructional_floor,
        }
    }

    fn closure(&self, year: &SchoolYear) -> Vec<DayTypeCandidate> {
        let start = self.covid.closure_start.max(year.start);
        weekdays_inclusive(start, year.end)
            .map(|date| DayTypeCandidate::new(date, DayType::EmergencyClosure, CLOSURE_LABEL))
            .collect()
    }

    /// Open days in the configured COVID months.
    fn pool(
        &self,
        registry: &SchoolYearRegistry,
        year: &SchoolYear,
    ) -> CalendarResult<Vec<NaiveDate>> {
        Ok(potential_instructional_days(registry, year, &self.testing)?
            .into_iter()
            .filter(|date| self.covid.months.contains(&date.month()))
            .collect())
    }

    fn hybrid(
        &self,
        registry: &SchoolYearRegistry,
        year: &SchoolYear,
        rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let pool = self.pool(registry, year)?;
        let remote_count = rng.gen_range(self.covid.remote_days.min..=self.covid.remote_days.max);
        let remote = draw_dates(&pool, remote_count, rng);

        let taken: BTreeSet<NaiveDate> = remote.iter().copied().collect();
        let rest: Vec<NaiveDate> = pool.into_iter().filter(|d| !taken.contains(d)).collect();
        let hybrid_count = rng.gen_range(self.covid.hybrid_days.min..=self.covid.hybrid_days.max);
        let hybrid = draw_dates(&rest, hybrid_count, rng);

        Ok(remote
            .into_iter()
            .map(|date| DayTypeCandidate::new(date, DayType::Remote, REMOTE_LABEL))
            .chain(
                hybrid
                    .into_iter()
                    .map(|date| DayTypeCandidate::new(date, DayType::Remote, HYBRID_LABEL)),
            )
            .collect())
    }

    /// Quarantine days, keeping only as many as the year can lose while the
    /// other random closures still fit above the floor.
    fn quarantine(
        &self,
        registry: &SchoolYearRegistry,
        year: &SchoolYear,
        rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let pool = self.pool(registry, year)?;
        let count = rng.gen_range(
            self.covid.quarantine_days.min..=self.covid.quarantine_days.max,
        );
        let mut drawn = draw_dates(&pool, count, rng);

        let phase = Some(CovidPhase::Quarantine);
        let other_closures = weather_ceiling(&self.weather, phase)
            + work_day_ceiling(&self.teacher_days, &self.weather, phase, year, self.floor)
            + self.teacher_days.pd_days.max;
        let headroom = year
            .instructional_slots
            .saturating_sub(self.floor)
            .saturating_sub(other_closures) as usize;
        if drawn.len() > headroom {
            debug!(
                school_year = year.id,
                drawn = drawn.len(),
                kept = headroom,
                "dropping quarantine days to hold the instructional floor"
            );
            drawn.truncate(headroom);
        }

        Ok(drawn
            .into_iter()
            .map(|date| DayTypeCandidate::new(date, DayType::Quarantine, QUARANTINE_LABEL))
            .collect())
    }
}

impl RuleProvider for CovidProvider {
    fn name(&self) -> &'static str {
        "covid"
    }

    fn tier(&self) -> u8 {
        DayType::EmergencyClosure.tier()
    }

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>> {
        let mut out = Vec::new();
        for year in registry.years() {
            match covid_phase(&self.covid, year) {
                Some(CovidPhase::Closure) => out.extend(self.closure(year)),
                Some(CovidPhase::Hybrid) => out.extend(self.hybrid(registry, year, rng)?),
                Some(CovidPhase::Quarantine) => out.extend(self.quarantine(registry, year, rng)?),
                None => {}
            }
        }
        Ok(out)
    }
}
