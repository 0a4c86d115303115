use crate::SchoolCalendar;
use crate::error::CalendarError;
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait CalendarStore {
    fn save_calendar(&self, calendar: &SchoolCalendar) -> PersistenceResult<()>;
    fn load_calendar(&self) -> PersistenceResult<Option<SchoolCalendar>>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_calendar_from_csv, load_calendar_from_json, load_config, load_records_from_csv,
    read_records_csv, save_calendar_to_csv, save_calendar_to_json, save_config,
    save_records_to_csv, write_records_csv,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCalendarStore;
