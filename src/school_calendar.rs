use crate::config::CalendarConfig;
use crate::emitter::{CalendarRecord, emit_records};
use crate::error::{CalendarError, CalendarResult};
use crate::providers::ProviderSet;
use crate::registry::{SchoolYear, SchoolYearRegistry, build_registry};
use crate::summary::CalendarSummary;
use crate::validator::{ValidationReport, validate_calendar};
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use tracing::{info, warn};

/// A generated, validated calendar table and the registry it was built from.
#[derive(Debug, Clone)]
pub struct SchoolCalendar {
    config: CalendarConfig,
    registry: SchoolYearRegistry,
    records: Vec<CalendarRecord>,
    report: ValidationReport,
}

impl SchoolCalendar {
    /// Builds the registry, runs every provider, resolves each date and
    /// validates the result.
    pub fn generate(config: CalendarConfig) -> CalendarResult<Self> {
        let registry = build_registry(&config)?;
        let outputs = ProviderSet::standard(&config).run(&registry, &config)?;
        let records = emit_records(&registry, &outputs, config.generated_at);
        let report = validate_calendar(&records, &registry, &config)?;
        for violation in report.warnings() {
            warn!(school_year = ?violation.school_year_id, "{}", violation.message);
        }
        info!(seed = config.seed, records = records.len(), "calendar generated");
        Ok(Self {
            config,
            registry,
            records,
            report,
        })
    }

    /// Re-attaches stored records to the registry derived from `config`. The
    /// records must still pass validation.
    pub fn from_records(config: CalendarConfig, mut records: Vec<CalendarRecord>) -> CalendarResult<Self> {
        let registry = build_registry(&config)?;
        records.sort_by_key(|record| record.calendar_date);
        let report = validate_calendar(&records, &registry, &config)?;
        Ok(Self {
            config,
            registry,
            records,
            report,
        })
    }

    /// Same config with a new master seed.
    pub fn regenerate(&self, seed: u64) -> CalendarResult<Self> {
        Self::generate(self.config.clone().with_seed(seed))
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchoolYearRegistry {
        &self.registry
    }

    pub fn records(&self) -> &[CalendarRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CalendarRecord> {
        self.records
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn record(&self, date: NaiveDate) -> Option<&CalendarRecord> {
        self.records
            .binary_search_by_key(&date, |record| record.calendar_date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Records in `[start, end]`.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> CalendarResult<&[CalendarRecord]> {
        if start > end {
            return Err(CalendarError::configuration(format!(
                "range start {start} is after range end {end}"
            )));
        }
        let lo = self.records.partition_point(|record| record.calendar_date < start);
        let hi = self.records.partition_point(|record| record.calendar_date <= end);
        Ok(&self.records[lo..hi])
    }

    pub fn school_year(&self, id: u32) -> Option<&SchoolYear> {
        self.registry.get(id)
    }

    pub fn instructional_days(&self, school_year_id: u32) -> u32 {
        self.records
            .iter()
            .filter(|record| record.school_year_id == Some(school_year_id) && record.is_school_day)
            .count() as u32
    }

    pub fn dataframe(&self) -> PolarsResult<DataFrame> {
        records_dataframe(&self.records)
    }

    pub fn summary(&self) -> PolarsResult<CalendarSummary> {
        CalendarSummary::from_calendar(self)
    }
}

/// Days since 1970-01-01, the physical value of a polars `Date`.
fn date_to_i32(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

/// The record table as a polars frame, one column per output field.
pub fn records_dataframe(records: &[CalendarRecord]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(11);

    let dates: Vec<i32> = records.iter().map(|r| date_to_i32(r.calendar_date)).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("calendar_date"), dates)
            .cast(&DataType::Date)?
            .into_column(),
    );

    let years: Vec<Option<i32>> = records
        .iter()
        .map(|r| r.school_year_id.map(|id| id as i32))
        .collect();
    columns.push(Series::new(PlSmallStr::from_static("school_year_id"), years).into_column());

    let school_days: Vec<bool> = records.iter().map(|r| r.is_school_day).collect();
    columns.push(Series::new(PlSmallStr::from_static("is_school_day"), school_days).into_column());

    let holidays: Vec<bool> = records.iter().map(|r| r.is_holiday).collect();
    columns.push(Series::new(PlSmallStr::from_static("is_holiday"), holidays).into_column());

    let holiday_names: Vec<Option<&str>> =
        records.iter().map(|r| r.holiday_name.as_deref()).collect();
    columns.push(Series::new(PlSmallStr::from_static("holiday_name"), holiday_names).into_column());

    let comments: Vec<Option<&str>> = records.iter().map(|r| r.comment.as_deref()).collect();
    columns.push(Series::new(PlSmallStr::from_static("comment"), comments).into_column());

    let day_types: Vec<&str> = records.iter().map(|r| r.day_type.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("day_type"), day_types).into_column());

    let labels: Vec<Option<&str>> = records.iter().map(|r| r.label.as_deref()).collect();
    columns.push(Series::new(PlSmallStr::from_static("label"), labels).into_column());

    let source_years: Vec<&str> = records.iter().map(|r| r.data_source_year.as_str()).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("data_source_year"), source_years).into_column(),
    );

    let created: Vec<String> = records
        .iter()
        .map(|r| r.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();
    columns.push(Series::new(PlSmallStr::from_static("created_at"), created).into_column());

    let updated: Vec<String> = records
        .iter()
        .map(|r| r.updated_at.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();
    columns.push(Series::new(PlSmallStr::from_static("updated_at"), updated).into_column());

    DataFrame::new(columns)
}
