pub mod calendar;
pub mod config;
pub mod day_type;
pub mod emitter;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
#[cfg(any(feature = "cli", feature = "http_api"))]
pub mod logging;
pub mod persistence;
pub mod providers;
pub mod registry;
pub mod resolver;
pub mod school_calendar;
pub mod summary;
pub mod validator;

pub use calendar::FederalHoliday;
pub use config::CalendarConfig;
pub use day_type::{DayType, DayTypeCandidate};
pub use emitter::CalendarRecord;
pub use error::{CalendarError, CalendarResult, DateAlgorithmError};
pub use persistence::{
    CalendarStore, PersistenceError, PersistenceResult, load_calendar_from_csv,
    load_calendar_from_json, load_config, load_records_from_csv, save_calendar_to_csv,
    save_calendar_to_json, save_config, save_records_to_csv,
};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteCalendarStore;
pub use registry::{SchoolYear, SchoolYearRegistry, build_registry};
pub use school_calendar::SchoolCalendar;
pub use summary::{CalendarSummary, YearStatus};
pub use validator::{Severity, ValidationReport, Violation, ViolationKind};
