use crate::validator::ValidationReport;
use chrono::Weekday;
use thiserror::Error;

/// Failures of the pure date arithmetic. Any of these means the caller asked
/// for a date that cannot exist, which is a logic defect rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateAlgorithmError {
    #[error("occurrence {n} of {weekday} does not exist in {year}-{month:02}")]
    OutOfRange {
        year: i32,
        month: u32,
        weekday: Weekday,
        n: i32,
    },
    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("date algorithm error: {0}")]
    DateAlgorithm(#[from] DateAlgorithmError),
    #[error("calendar failed validation with {} error(s)", .0.errors().count())]
    Validation(ValidationReport),
}

impl CalendarError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CalendarError::Configuration(message.into())
    }
}

pub type CalendarResult<T> = Result<T, CalendarError>;
