//! Rule providers: one per day-type family.
//!
//! Every provider reads only the [`SchoolYearRegistry`] and its own random
//! stream, so the set can be evaluated in any order (or in parallel) without
//! changing the output. The registration order fixed in
//! [`ProviderSet::standard`] is what the resolver uses to break ties.

use crate::config::{CalendarConfig, TestingConfig};
use crate::day_type::DayTypeCandidate;
use crate::error::{CalendarError, CalendarResult};
use crate::registry::{SchoolYear, SchoolYearRegistry};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

pub mod breaks;
pub mod covid;
pub mod events;
pub mod federal;
pub mod teacher_days;
pub mod testing;
pub mod weather;

pub use breaks::BreakProvider;
pub use covid::{CovidPhase, CovidProvider, covid_phase};
pub use events::SpecialEventProvider;
pub use federal::FederalHolidayProvider;
pub use teacher_days::TeacherDaysProvider;
pub use testing::{TestingProvider, fixed_testing_dates};
pub use weather::WeatherProvider;

pub trait RuleProvider: Send + Sync {
    /// Stable name, also the key for seed overrides.
    fn name(&self) -> &'static str;

    /// Tier of the candidates this provider proposes. [`ProviderSet::run`]
    /// rejects any candidate outside it.
    fn tier(&self) -> u8;

    fn candidates(
        &self,
        registry: &SchoolYearRegistry,
        rng: &mut StdRng,
    ) -> CalendarResult<Vec<DayTypeCandidate>>;
}

/// Candidates of one provider tagged with its registration position.
#[derive(Debug, Clone)]
pub struct ProviderOutput {
    pub provider: &'static str,
    pub position: usize,
    pub seed: u64,
    pub candidates: Vec<DayTypeCandidate>,
}

pub struct ProviderSet {
    providers: Vec<Box<dyn RuleProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Federal holidays, breaks, weather, COVID, teacher days, testing,
    /// events, in that order.
    pub fn standard(config: &CalendarConfig) -> Self {
        let mut set = Self::new();
        set.register(FederalHolidayProvider::new(config.include_columbus_day));
        set.register(BreakProvider);
        set.register(WeatherProvider::new(config));
        set.register(CovidProvider::new(config));
        set.register(TeacherDaysProvider::new(config));
        set.register(TestingProvider::new(config.testing.clone()));
        set.register(SpecialEventProvider::new(config.events.enabled));
        set
    }

    pub fn register<P: RuleProvider + 'static>(&mut self, provider: P) {
        self.providers.push(Box::new(provider));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Runs every provider on its own seeded stream. Output keeps the
    /// registration order regardless of which provider finished first.
    pub fn run(
        &self,
        registry: &SchoolYearRegistry,
        config: &CalendarConfig,
    ) -> CalendarResult<Vec<ProviderOutput>> {
        self.providers
            .par_iter()
            .enumerate()
            .map(|(position, provider)| {
                let seed = seed_for(config, provider.name());
                let mut rng = StdRng::seed_from_u64(seed);
                let candidates = provider.candidates(registry, &mut rng)?;
                if let Some(stray) = candidates.iter().find(|c| c.tier != provider.tier()) {
                    return Err(CalendarError::configuration(format!(
                        "provider {} declares tier {} but proposed {} ({}, tier {}) on {}",
                        provider.name(),
                        provider.tier(),
                        stray.day_type,
                        stray.label,
                        stray.tier,
                        stray.date
                    )));
                }
                debug!(
                    provider = provider.name(),
                    tier = provider.tier(),
                    seed,
                    count = candidates.len(),
                    "provider produced candidates"
                );
                Ok(ProviderOutput {
                    provider: provider.name(),
                    position,
                    seed,
                    candidates,
                })
            })
            .collect()
    }
}

impl Default for ProviderSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Sub-seed for `provider`: FNV-1a of the name mixed into the master seed,
/// finished with SplitMix64.
pub fn derive_seed(master: u64, provider: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in provider.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let mut z = (master ^ hash).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

pub fn seed_for(config: &CalendarConfig, provider: &str) -> u64 {
    config
        .seed_overrides
        .get(provider)
        .copied()
        .unwrap_or_else(|| derive_seed(config.seed, provider))
}

/// Open weekdays of `year` that random placements may claim: no holiday, no
/// break day and no fixed testing date.
pub(crate) fn potential_instructional_days(
    registry: &SchoolYearRegistry,
    year: &SchoolYear,
    testing: &TestingConfig,
) -> CalendarResult<Vec<NaiveDate>> {
    let protected: BTreeSet<NaiveDate> = fixed_testing_dates(registry, year, testing)?
        .into_iter()
        .map(|(date, _)| date)
        .collect();
    Ok(registry
        .open_weekdays(year)
        .into_iter()
        .filter(|date| !protected.contains(date))
        .collect())
}

/// Up to `count` distinct dates from `pool`, in draw order.
pub(crate) fn draw_dates(pool: &[NaiveDate], count: u32, rng: &mut StdRng) -> Vec<NaiveDate> {
    let count = (count as usize).min(pool.len());
    pool.choose_multiple(rng, count).copied().collect()
}
