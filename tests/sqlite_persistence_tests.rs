#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use school_calendar::{CalendarConfig, CalendarStore, DayType, SchoolCalendar, SqliteCalendarStore};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn sqlite_store_round_trip_calendar() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteCalendarStore::new(file.path()).unwrap();

    let calendar = SchoolCalendar::generate(CalendarConfig::default().with_seed(11)).unwrap();
    store.save_calendar(&calendar).expect("save calendar");

    let loaded = SqliteCalendarStore::new(file.path())
        .unwrap()
        .load_calendar()
        .unwrap()
        .expect("calendar stored");

    assert_eq!(loaded.config(), calendar.config());
    assert_eq!(loaded.records(), calendar.records());

    let memorial_day = loaded.record(d(2025, 5, 26)).unwrap();
    assert_eq!(memorial_day.day_type, DayType::Holiday);
    assert_eq!(memorial_day.holiday_name.as_deref(), Some("Memorial Day"));
    assert_eq!(loaded.record(d(2016, 8, 1)).unwrap().school_year_id, None);
}

#[test]
fn empty_store_has_no_calendar() {
    let store = SqliteCalendarStore::in_memory().unwrap();
    assert!(store.load_calendar().unwrap().is_none());
}

#[test]
fn saving_again_replaces_the_previous_calendar() {
    let store = SqliteCalendarStore::in_memory().unwrap();
    let first = SchoolCalendar::generate(CalendarConfig::default()).unwrap();
    let second = first.regenerate(8).unwrap();

    store.save_calendar(&first).unwrap();
    store.save_calendar(&second).unwrap();

    let loaded = store.load_calendar().unwrap().unwrap();
    assert_eq!(loaded.config().seed, 8);
    assert_eq!(loaded.records(), second.records());
}
