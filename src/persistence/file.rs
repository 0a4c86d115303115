use super::{PersistenceError, PersistenceResult};
use crate::{CalendarConfig, CalendarRecord, DayType, SchoolCalendar};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize, Deserialize)]
struct CalendarSnapshot {
    config: CalendarConfig,
    records: Vec<CalendarRecord>,
}

pub fn save_calendar_to_json<P: AsRef<Path>>(
    calendar: &SchoolCalendar,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = CalendarSnapshot {
        config: calendar.config().clone(),
        records: calendar.records().to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_calendar_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<SchoolCalendar> {
    let file = File::open(path)?;
    let snapshot: CalendarSnapshot = serde_json::from_reader(file)?;
    Ok(SchoolCalendar::from_records(snapshot.config, snapshot.records)?)
}

pub fn save_config<P: AsRef<Path>>(config: &CalendarConfig, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

/// Reads a config file; missing keys fall back to the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> PersistenceResult<CalendarConfig> {
    let file = File::open(path)?;
    let config: CalendarConfig = serde_json::from_reader(file)?;
    config.validate()?;
    Ok(config)
}

#[derive(Default, Serialize, Deserialize)]
struct CalendarCsvRow {
    calendar_date: String,
    school_year_id: String,
    is_school_day: String,
    is_holiday: String,
    holiday_name: String,
    comment: String,
    day_type: String,
    label: String,
    data_source_year: String,
    created_at: String,
    updated_at: String,
}

impl From<&CalendarRecord> for CalendarCsvRow {
    fn from(record: &CalendarRecord) -> Self {
        Self {
            calendar_date: record.calendar_date.format("%Y-%m-%d").to_string(),
            school_year_id: record
                .school_year_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            is_school_day: record.is_school_day.to_string(),
            is_holiday: record.is_holiday.to_string(),
            holiday_name: record.holiday_name.clone().unwrap_or_default(),
            comment: record.comment.clone().unwrap_or_default(),
            day_type: record.day_type.as_str().to_string(),
            label: record.label.clone().unwrap_or_default(),
            data_source_year: record.data_source_year.clone(),
            created_at: record.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: record.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl TryFrom<CalendarCsvRow> for CalendarRecord {
    type Error = PersistenceError;

    fn try_from(row: CalendarCsvRow) -> Result<Self, Self::Error> {
        let calendar_date = parse_date(&row.calendar_date)?;
        let school_year_id = match row.school_year_id.trim() {
            "" => None,
            value => Some(value.parse::<u32>().map_err(|err| {
                PersistenceError::InvalidData(format!(
                    "{calendar_date}: invalid school_year_id '{value}': {err}"
                ))
            })?),
        };
        let day_type = row
            .day_type
            .parse::<DayType>()
            .map_err(|err| PersistenceError::InvalidData(format!("{calendar_date}: {err}")))?;
        Ok(CalendarRecord {
            calendar_date,
            school_year_id,
            is_school_day: parse_bool(&row.is_school_day)?,
            is_holiday: parse_bool(&row.is_holiday)?,
            holiday_name: non_empty(row.holiday_name),
            comment: non_empty(row.comment),
            day_type,
            label: non_empty(row.label),
            data_source_year: row.data_source_year,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

pub fn write_records_csv<W: Write>(records: &[CalendarRecord], writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(CalendarCsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_records_csv<R: Read>(reader: R) -> PersistenceResult<Vec<CalendarRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in reader.deserialize::<CalendarCsvRow>() {
        records.push(CalendarRecord::try_from(row?)?);
    }
    Ok(records)
}

pub fn save_records_to_csv<P: AsRef<Path>>(
    records: &[CalendarRecord],
    path: P,
) -> PersistenceResult<()> {
    write_records_csv(records, File::create(path)?)
}

pub fn load_records_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<CalendarRecord>> {
    read_records_csv(File::open(path)?)
}

pub fn save_calendar_to_csv<P: AsRef<Path>>(
    calendar: &SchoolCalendar,
    path: P,
) -> PersistenceResult<()> {
    save_records_to_csv(calendar.records(), path)
}

/// CSV carries no config, so the caller supplies the one the table was
/// generated with.
pub fn load_calendar_from_csv<P: AsRef<Path>>(
    path: P,
    config: CalendarConfig,
) -> PersistenceResult<SchoolCalendar> {
    let records = load_records_from_csv(path)?;
    Ok(SchoolCalendar::from_records(config, records)?)
}

fn parse_date(value: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| PersistenceError::InvalidData(format!("invalid date '{value}': {err}")))
}

fn parse_timestamp(value: &str) -> PersistenceResult<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|err| PersistenceError::InvalidData(format!("invalid timestamp '{value}': {err}")))
}

fn parse_bool(value: &str) -> PersistenceResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_row_parses_blank_optionals_as_none() {
        let row = CalendarCsvRow {
            calendar_date: "2019-07-04".into(),
            school_year_id: "".into(),
            is_school_day: "false".into(),
            is_holiday: "true".into(),
            holiday_name: "Independence Day".into(),
            comment: "".into(),
            day_type: "HOLIDAY".into(),
            label: "Independence Day".into(),
            data_source_year: "2018-2019".into(),
            created_at: "2019-07-04 00:00:00".into(),
            updated_at: "2019-07-04T00:00:00".into(),
        };
        let record = CalendarRecord::try_from(row).unwrap();
        assert_eq!(record.school_year_id, None);
        assert_eq!(record.comment, None);
        assert!(record.is_holiday);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn unknown_day_type_is_invalid_data() {
        let row = CalendarCsvRow {
            calendar_date: "2019-07-05".into(),
            is_school_day: "false".into(),
            is_holiday: "false".into(),
            day_type: "FIELD_TRIP".into(),
            created_at: "2019-07-05 00:00:00".into(),
            updated_at: "2019-07-05 00:00:00".into(),
            ..CalendarCsvRow::default()
        };
        assert!(matches!(
            CalendarRecord::try_from(row),
            Err(PersistenceError::InvalidData(_))
        ));
    }
}
