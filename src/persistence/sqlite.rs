use super::{CalendarStore, PersistenceError, PersistenceResult};
use crate::{CalendarConfig, CalendarRecord, DayType, SchoolCalendar};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteCalendarStore {
    connection: Mutex<Connection>,
}

impl SqliteCalendarStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS calendar_config (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                config_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS calendar_records (
                calendar_date TEXT PRIMARY KEY,
                school_year_id INTEGER,
                is_school_day INTEGER NOT NULL,
                is_holiday INTEGER NOT NULL,
                holiday_name TEXT,
                comment TEXT,
                day_type TEXT NOT NULL,
                label TEXT,
                data_source_year TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_config(tx: &rusqlite::Transaction, config: &CalendarConfig) -> PersistenceResult<()> {
        let json = serde_json::to_string(config)?;
        tx.execute("DELETE FROM calendar_config", [])?;
        tx.execute(
            "INSERT INTO calendar_config (id, config_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_records(tx: &rusqlite::Transaction, records: &[CalendarRecord]) -> PersistenceResult<()> {
        tx.execute("DELETE FROM calendar_records", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO calendar_records (
                calendar_date, school_year_id, is_school_day, is_holiday, holiday_name,
                comment, day_type, label, data_source_year, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for record in records {
            stmt.execute(params![
                record.calendar_date.format("%Y-%m-%d").to_string(),
                record.school_year_id,
                record.is_school_day,
                record.is_holiday,
                record.holiday_name,
                record.comment,
                record.day_type.as_str(),
                record.label,
                record.data_source_year,
                record.created_at.format(TIMESTAMP_FORMAT).to_string(),
                record.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            ])?;
        }
        Ok(())
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
        Ok(RawRecord {
            calendar_date: row.get(0)?,
            school_year_id: row.get(1)?,
            is_school_day: row.get(2)?,
            is_holiday: row.get(3)?,
            holiday_name: row.get(4)?,
            comment: row.get(5)?,
            day_type: row.get(6)?,
            label: row.get(7)?,
            data_source_year: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

/// Column values as SQLite hands them back, before parsing.
struct RawRecord {
    calendar_date: String,
    school_year_id: Option<u32>,
    is_school_day: bool,
    is_holiday: bool,
    holiday_name: Option<String>,
    comment: Option<String>,
    day_type: String,
    label: Option<String>,
    data_source_year: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RawRecord> for CalendarRecord {
    type Error = PersistenceError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let invalid = |what: &str, value: &str| {
            PersistenceError::InvalidData(format!("invalid {what} '{value}' in calendar_records"))
        };
        let calendar_date = NaiveDate::parse_from_str(&raw.calendar_date, "%Y-%m-%d")
            .map_err(|_| invalid("date", &raw.calendar_date))?;
        let day_type = raw
            .day_type
            .parse::<DayType>()
            .map_err(|_| invalid("day_type", &raw.day_type))?;
        let created_at = NaiveDateTime::parse_from_str(&raw.created_at, TIMESTAMP_FORMAT)
            .map_err(|_| invalid("created_at", &raw.created_at))?;
        let updated_at = NaiveDateTime::parse_from_str(&raw.updated_at, TIMESTAMP_FORMAT)
            .map_err(|_| invalid("updated_at", &raw.updated_at))?;
        Ok(CalendarRecord {
            calendar_date,
            school_year_id: raw.school_year_id,
            is_school_day: raw.is_school_day,
            is_holiday: raw.is_holiday,
            holiday_name: raw.holiday_name,
            comment: raw.comment,
            day_type,
            label: raw.label,
            data_source_year: raw.data_source_year,
            created_at,
            updated_at,
        })
    }
}

impl CalendarStore for SqliteCalendarStore {
    fn save_calendar(&self, calendar: &SchoolCalendar) -> PersistenceResult<()> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        Self::save_config(&tx, calendar.config())?;
        Self::save_records(&tx, calendar.records())?;
        tx.commit()?;
        Ok(())
    }

    fn load_calendar(&self) -> PersistenceResult<Option<SchoolCalendar>> {
        let conn = self.connection.lock();

        let mut stmt = conn.prepare("SELECT config_json FROM calendar_config WHERE id = 1")?;
        let config_json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        let Some(config_json) = config_json else {
            return Ok(None);
        };
        let config: CalendarConfig = serde_json::from_str(&config_json)?;

        let mut stmt = conn.prepare(
            "SELECT calendar_date, school_year_id, is_school_day, is_holiday, holiday_name,
                    comment, day_type, label, data_source_year, created_at, updated_at
             FROM calendar_records ORDER BY calendar_date ASC",
        )?;
        let rows = stmt.query_map([], Self::record_from_row)?;

        let mut records = Vec::new();
        for raw in rows {
            records.push(CalendarRecord::try_from(raw?)?);
        }

        Ok(Some(SchoolCalendar::from_records(config, records)?))
    }
}
