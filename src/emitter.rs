use crate::calendar::days_inclusive;
use crate::day_type::{DayType, DayTypeCandidate};
use crate::providers::ProviderOutput;
use crate::registry::SchoolYearRegistry;
use crate::resolver::resolve;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One row of the calendar table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub calendar_date: NaiveDate,
    pub school_year_id: Option<u32>,
    pub is_school_day: bool,
    pub is_holiday: bool,
    pub holiday_name: Option<String>,
    pub comment: Option<String>,
    pub day_type: DayType,
    pub label: Option<String>,
    pub data_source_year: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Academic year label (August to July) that `date` belongs to.
pub fn academic_year_label(date: NaiveDate) -> String {
    let start = if date.month() >= 8 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{}", start, start + 1)
}

/// Resolves every date of the registry range into exactly one record.
pub fn emit_records(
    registry: &SchoolYearRegistry,
    outputs: &[ProviderOutput],
    generated_at: Option<NaiveDateTime>,
) -> Vec<CalendarRecord> {
    let mut ordered: Vec<&ProviderOutput> = outputs.iter().collect();
    ordered.sort_by_key(|output| output.position);

    let mut by_date: BTreeMap<NaiveDate, Vec<DayTypeCandidate>> = BTreeMap::new();
    for output in ordered {
        for candidate in &output.candidates {
            by_date
                .entry(candidate.date)
                .or_default()
                .push(candidate.clone());
        }
    }

    let records: Vec<CalendarRecord> = days_inclusive(registry.range_start(), registry.range_end())
        .map(|date| {
            let school_year = registry.year_for(date);
            let candidates = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let resolution = resolve(date, school_year.is_some(), candidates);
            let stamp = generated_at.unwrap_or_else(|| date.and_time(NaiveTime::MIN));
            CalendarRecord {
                calendar_date: date,
                school_year_id: school_year.map(|year| year.id),
                is_school_day: resolution.is_school_day,
                is_holiday: resolution.is_holiday,
                holiday_name: resolution.holiday_name,
                comment: resolution.comment,
                day_type: resolution.day_type,
                label: Some(resolution.label),
                data_source_year: academic_year_label(date),
                created_at: stamp,
                updated_at: stamp,
            }
        })
        .collect();

    info!(
        records = records.len(),
        school_days = records.iter().filter(|r| r.is_school_day).count(),
        "resolved calendar"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn academic_label_switches_in_august() {
        let july = NaiveDate::from_ymd_opt(2019, 7, 31).unwrap();
        let august = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();
        assert_eq!(academic_year_label(july), "2018-2019");
        assert_eq!(academic_year_label(august), "2019-2020");
    }
}
