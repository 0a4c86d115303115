use crate::calendar::{count_days_inclusive, is_weekend};
use crate::config::CalendarConfig;
use crate::day_type::DayType;
use crate::emitter::CalendarRecord;
use crate::error::{CalendarError, CalendarResult};
use crate::registry::SchoolYearRegistry;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    WeekendSchoolDay,
    HolidayFlagMissing,
    OrphanedHolidayFlag,
    InstructionalDaysOutOfRange,
    BelowInstructionalFloor,
    AboveTargetRange,
    DuplicateDate,
    RecordCount,
    DateSequence,
    SchoolYearStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,
    pub kind: ViolationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_year_id: Option<u32>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        };
        write!(f, "[{severity}] {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    /// Instructional day count per school year id.
    pub instructional_days: BTreeMap<u32, u32>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|violation| violation.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|violation| violation.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn push(
        &mut self,
        severity: Severity,
        kind: ViolationKind,
        message: String,
        date: Option<NaiveDate>,
        school_year_id: Option<u32>,
    ) {
        self.violations.push(Violation {
            severity,
            kind,
            message,
            date,
            school_year_id,
        });
    }
}

/// Checks the finished table against the calendar invariants.
///
/// Returns `Err(CalendarError::Validation)` when any ERROR is found; warnings
/// alone come back in the `Ok` report.
pub fn validate_calendar(
    records: &[CalendarRecord],
    registry: &SchoolYearRegistry,
    config: &CalendarConfig,
) -> CalendarResult<ValidationReport> {
    let mut report = ValidationReport::default();

    check_coverage(records, registry, &mut report);
    for record in records {
        check_record(record, registry, &mut report);
    }
    check_instructional_counts(records, registry, config, &mut report);

    for violation in &report.violations {
        match violation.severity {
            Severity::Error => warn!(kind = ?violation.kind, "{}", violation.message),
            Severity::Warning => info!(kind = ?violation.kind, "{}", violation.message),
        }
    }

    if report.has_errors() {
        Err(CalendarError::Validation(report))
    } else {
        Ok(report)
    }
}

fn check_coverage(records: &[CalendarRecord], registry: &SchoolYearRegistry, report: &mut ValidationReport) {
    let expected = count_days_inclusive(registry.range_start(), registry.range_end());
    if records.len() as i64 != expected {
        report.push(
            Severity::Error,
            ViolationKind::RecordCount,
            format!("expected {expected} records, found {}", records.len()),
            None,
            None,
        );
    }
    if let Some(first) = records.first() {
        if first.calendar_date != registry.range_start() {
            report.push(
                Severity::Error,
                ViolationKind::DateSequence,
                format!("first record is {}, range starts {}", first.calendar_date, registry.range_start()),
                Some(first.calendar_date),
                None,
            );
        }
    }
    for pair in records.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.calendar_date == previous.calendar_date {
            report.push(
                Severity::Error,
                ViolationKind::DuplicateDate,
                format!("{} appears more than once", current.calendar_date),
                Some(current.calendar_date),
                current.school_year_id,
            );
        } else if current.calendar_date != previous.calendar_date + Duration::days(1) {
            report.push(
                Severity::Error,
                ViolationKind::DateSequence,
                format!(
                    "{} follows {} (gap or out of order)",
                    current.calendar_date, previous.calendar_date
                ),
                Some(current.calendar_date),
                current.school_year_id,
            );
        }
    }
}

fn check_record(record: &CalendarRecord, registry: &SchoolYearRegistry, report: &mut ValidationReport) {
    let date = record.calendar_date;
    if is_weekend(date) && record.is_school_day {
        report.push(
            Severity::Error,
            ViolationKind::WeekendSchoolDay,
            format!("{date} is a weekend but marked as a school day"),
            Some(date),
            record.school_year_id,
        );
    }
    if record.day_type == DayType::Holiday && !record.is_holiday {
        report.push(
            Severity::Error,
            ViolationKind::HolidayFlagMissing,
            format!("{date} is a HOLIDAY without is_holiday"),
            Some(date),
            record.school_year_id,
        );
    }
    if record.day_type != DayType::Holiday && record.is_holiday {
        report.push(
            Severity::Error,
            ViolationKind::OrphanedHolidayFlag,
            format!("{date} has is_holiday on a {} record", record.day_type),
            Some(date),
            record.school_year_id,
        );
    }
    let expected_year = registry.year_for(date).map(|year| year.id);
    if record.school_year_id != expected_year {
        report.push(
            Severity::Error,
            ViolationKind::SchoolYearStamp,
            format!(
                "{date} stamped with school year {:?}, expected {:?}",
                record.school_year_id, expected_year
            ),
            Some(date),
            record.school_year_id,
        );
    }
}

fn check_instructional_counts(
    records: &[CalendarRecord],
    registry: &SchoolYearRegistry,
    config: &CalendarConfig,
    report: &mut ValidationReport,
) {
    let thresholds = config.validation;
    for year in registry.years() {
        let in_year = records
            .iter()
            .filter(|record| record.school_year_id == Some(year.id));
        let mut count = 0u32;
        let mut emergency = false;
        for record in in_year {
            count += u32::from(record.is_school_day);
            emergency |= record.day_type == DayType::EmergencyClosure;
        }
        report.instructional_days.insert(year.id, count);

        let escalate = |severity: Severity| {
            if emergency {
                Severity::Warning
            } else {
                severity
            }
        };
        let label = year.label();

        if count < thresholds.error_min || count > thresholds.error_max {
            report.push(
                escalate(Severity::Error),
                ViolationKind::InstructionalDaysOutOfRange,
                format!(
                    "{label}: {count} instructional days outside [{}, {}]",
                    thresholds.error_min, thresholds.error_max
                ),
                None,
                Some(year.id),
            );
        } else if count < config.instructional_floor.max(thresholds.warn_min) {
            report.push(
                escalate(Severity::Error),
                ViolationKind::BelowInstructionalFloor,
                format!(
                    "{label}: {count} instructional days below the floor of {}",
                    config.instructional_floor
                ),
                None,
                Some(year.id),
            );
        } else if count > thresholds.warn_max {
            report.push(
                Severity::Warning,
                ViolationKind::AboveTargetRange,
                format!(
                    "{label}: {count} instructional days above {}",
                    thresholds.warn_max
                ),
                None,
                Some(year.id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::emit_records;
    use crate::providers::{BreakProvider, FederalHolidayProvider, ProviderSet};
    use crate::registry::build_registry;

    /// Holidays and breaks only, no random closures.
    fn school_days_only(config: &CalendarConfig) -> (SchoolYearRegistry, Vec<CalendarRecord>) {
        let registry = build_registry(config).unwrap();
        let mut providers = ProviderSet::new();
        providers.register(FederalHolidayProvider::new(config.include_columbus_day));
        providers.register(BreakProvider);
        let outputs = providers.run(&registry, config).unwrap();
        let records = emit_records(&registry, &outputs, config.generated_at);
        (registry, records)
    }

    #[test]
    fn untouched_years_only_warn_about_surplus_days() {
        let config = CalendarConfig::default();
        let (registry, records) = school_days_only(&config);
        let report = validate_calendar(&records, &registry, &config).unwrap();
        assert!(report.warnings().all(|v| v.kind == ViolationKind::AboveTargetRange));
        assert_eq!(report.instructional_days.len(), 10);
    }

    #[test]
    fn weekend_school_day_is_an_error() {
        let config = CalendarConfig::default();
        let (registry, mut records) = school_days_only(&config);
        // 2016-08-06 is a Saturday.
        let idx = records
            .iter()
            .position(|r| r.calendar_date == NaiveDate::from_ymd_opt(2016, 8, 6).unwrap())
            .unwrap();
        records[idx].is_school_day = true;
        let err = validate_calendar(&records, &registry, &config).unwrap_err();
        let CalendarError::Validation(report) = err else {
            panic!("expected a validation error");
        };
        assert!(report.errors().any(|v| v.kind == ViolationKind::WeekendSchoolDay));
    }

    #[test]
    fn gaps_duplicates_and_flags_are_reported() {
        let config = CalendarConfig::default();
        let (registry, mut records) = school_days_only(&config);
        let duplicate = records[10].clone();
        records.insert(11, duplicate);
        records.remove(40);
        records[100].is_holiday = true;

        let Err(CalendarError::Validation(report)) = validate_calendar(&records, &registry, &config)
        else {
            panic!("expected a validation error");
        };
        let kinds: Vec<_> = report.errors().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::DuplicateDate));
        assert!(kinds.contains(&ViolationKind::DateSequence));
        assert!(kinds.contains(&ViolationKind::OrphanedHolidayFlag));
    }

    #[test]
    fn wrong_school_year_stamp_is_an_error() {
        let config = CalendarConfig::default();
        let (registry, mut records) = school_days_only(&config);
        records[0].school_year_id = Some(1);
        let Err(CalendarError::Validation(report)) = validate_calendar(&records, &registry, &config)
        else {
            panic!("expected a validation error");
        };
        assert!(report.errors().any(|v| v.kind == ViolationKind::SchoolYearStamp));
    }

    #[test]
    fn thin_year_without_emergency_is_fatal() {
        let config = CalendarConfig::default();
        let (registry, mut records) = school_days_only(&config);
        let mut removed = 0;
        for record in records.iter_mut() {
            if record.school_year_id == Some(3) && record.is_school_day && removed < 40 {
                record.is_school_day = false;
                record.day_type = DayType::Weather;
                removed += 1;
            }
        }
        let Err(CalendarError::Validation(report)) = validate_calendar(&records, &registry, &config)
        else {
            panic!("expected a validation error");
        };
        assert!(report.errors().any(|v| {
            v.kind == ViolationKind::BelowInstructionalFloor && v.school_year_id == Some(3)
        }));
    }

    #[test]
    fn emergency_year_downgrades_count_findings() {
        let config = CalendarConfig::default();
        let (registry, mut records) = school_days_only(&config);
        let mut removed = 0;
        for record in records.iter_mut() {
            if record.school_year_id == Some(4) && record.is_school_day && removed < 30 {
                record.is_school_day = false;
                record.day_type = DayType::EmergencyClosure;
                removed += 1;
            }
        }
        let report = validate_calendar(&records, &registry, &config).unwrap();
        assert!(report.warnings().any(|v| {
            v.kind == ViolationKind::BelowInstructionalFloor && v.school_year_id == Some(4)
        }));
    }
}
