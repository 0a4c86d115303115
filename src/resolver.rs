//! Per-date reduction of provider candidates to a single day type.

use crate::calendar::is_weekend;
use crate::day_type::{DayType, DayTypeCandidate};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const REGULAR_LABEL: &str = "School Day";
pub const SUMMER_LABEL: &str = "Summer Break";

/// Winning classification of one date, before record stamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub date: NaiveDate,
    pub day_type: DayType,
    pub label: String,
    pub is_school_day: bool,
    pub is_holiday: bool,
    pub holiday_name: Option<String>,
    pub comment: Option<String>,
}

/// Resolves `date` from `candidates`, which must already be in provider
/// registration order (and emission order within each provider).
///
/// The lowest tier wins; ties go to the earliest candidate. Tiers 4 to 7 only
/// count on potential instructional days: weekdays inside a school year with
/// no weekend, holiday or break candidate.
pub fn resolve(date: NaiveDate, in_school_year: bool, candidates: &[DayTypeCandidate]) -> Resolution {
    let weekend = is_weekend(date).then(|| weekend_candidate(date));
    let blocked = weekend.is_some()
        || !in_school_year
        || candidates.iter().any(|c| c.tier <= DayType::Break.tier());

    let winner = weekend
        .iter()
        .chain(
            candidates
                .iter()
                .filter(|c| !(blocked && c.day_type.requires_instructional_day())),
        )
        .min_by_key(|c| c.tier)
        .cloned()
        .unwrap_or_else(|| default_candidate(date, in_school_year));

    let mut comments: Vec<String> = Vec::new();
    match winner.day_type {
        DayType::Weekend => {
            if let Some(holiday) = candidates.iter().find(|c| c.day_type == DayType::Holiday) {
                comments.push(format!("{} falls on a weekend", holiday.label));
            }
        }
        DayType::Holiday => {
            if let Some(window) = candidates.iter().find(|c| c.day_type == DayType::Break) {
                comments.push(format!("During {}", window.label));
            }
        }
        _ => {}
    }
    if let Some(note) = &winner.note {
        comments.push(note.clone());
    }

    Resolution {
        date,
        holiday_name: winner.is_holiday.then(|| winner.label.clone()),
        comment: (!comments.is_empty()).then(|| comments.join("; ")),
        day_type: winner.day_type,
        label: winner.label,
        is_school_day: winner.is_school_day,
        is_holiday: winner.is_holiday,
    }
}

fn weekend_candidate(date: NaiveDate) -> DayTypeCandidate {
    let label = if date.weekday() == Weekday::Sat {
        "Saturday"
    } else {
        "Sunday"
    };
    DayTypeCandidate::new(date, DayType::Weekend, label)
}

fn default_candidate(date: NaiveDate, in_school_year: bool) -> DayTypeCandidate {
    if in_school_year {
        DayTypeCandidate::new(date, DayType::Regular, REGULAR_LABEL)
    } else {
        DayTypeCandidate::new(date, DayType::Summer, SUMMER_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holiday_beats_weather() {
        // Monday 2024-01-15, MLK Day
        let day = date(2024, 1, 15);
        let candidates = vec![
            DayTypeCandidate::new(day, DayType::Holiday, "Martin Luther King Jr. Day"),
            DayTypeCandidate::new(day, DayType::Weather, "Snow Day"),
        ];
        let resolved = resolve(day, true, &candidates);
        assert_eq!(resolved.day_type, DayType::Holiday);
        assert!(resolved.is_holiday);
        assert!(!resolved.is_school_day);
        assert_eq!(resolved.holiday_name.as_deref(), Some("Martin Luther King Jr. Day"));
    }

    #[test]
    fn weekend_holiday_keeps_the_name_in_the_comment() {
        // Saturday 2021-12-25
        let day = date(2021, 12, 25);
        let candidates = vec![
            DayTypeCandidate::new(day, DayType::Holiday, "Christmas Day"),
            DayTypeCandidate::new(day, DayType::Break, "Winter Break"),
        ];
        let resolved = resolve(day, true, &candidates);
        assert_eq!(resolved.day_type, DayType::Weekend);
        assert_eq!(resolved.label, "Saturday");
        assert!(!resolved.is_holiday);
        assert_eq!(resolved.holiday_name, None);
        assert_eq!(
            resolved.comment.as_deref(),
            Some("Christmas Day falls on a weekend")
        );
    }

    #[test]
    fn break_and_holiday_merge_keeps_both() {
        // Thursday 2023-11-23
        let day = date(2023, 11, 23);
        let candidates = vec![
            DayTypeCandidate::new(day, DayType::Holiday, "Thanksgiving Day"),
            DayTypeCandidate::new(day, DayType::Break, "Thanksgiving Break"),
        ];
        let resolved = resolve(day, true, &candidates);
        assert_eq!(resolved.day_type, DayType::Holiday);
        assert_eq!(resolved.label, "Thanksgiving Day");
        assert_eq!(resolved.comment.as_deref(), Some("During Thanksgiving Break"));
    }

    #[test]
    fn same_tier_goes_to_the_first_registered() {
        let day = date(2022, 2, 2);
        let candidates = vec![
            DayTypeCandidate::new(day, DayType::Weather, "Ice Day"),
            DayTypeCandidate::new(day, DayType::Quarantine, "COVID-19 Quarantine Day"),
        ];
        assert_eq!(resolve(day, true, &candidates).day_type, DayType::Weather);

        let reversed: Vec<_> = candidates.into_iter().rev().collect();
        assert_eq!(resolve(day, true, &reversed).day_type, DayType::Quarantine);
    }

    #[test]
    fn weather_beats_teacher_day() {
        let day = date(2022, 2, 2);
        let candidates = vec![
            DayTypeCandidate::new(day, DayType::TeacherWorkDay, "Teacher Work Day"),
            DayTypeCandidate::new(day, DayType::Weather, "Snow Day"),
        ];
        assert_eq!(resolve(day, true, &candidates).day_type, DayType::Weather);
    }

    #[test]
    fn instructional_tiers_are_ignored_outside_school_years() {
        // Wednesday 2019-07-10
        let day = date(2019, 7, 10);
        let candidates = vec![DayTypeCandidate::new(day, DayType::Testing, "PSAT Day")];
        let resolved = resolve(day, false, &candidates);
        assert_eq!(resolved.day_type, DayType::Summer);
        assert_eq!(resolved.label, SUMMER_LABEL);
        assert!(!resolved.is_school_day);
    }

    #[test]
    fn holiday_outside_school_year_stays_a_holiday() {
        // Thursday 2019-07-04
        let day = date(2019, 7, 4);
        let candidates = vec![DayTypeCandidate::new(day, DayType::Holiday, "Independence Day")];
        let resolved = resolve(day, false, &candidates);
        assert_eq!(resolved.day_type, DayType::Holiday);
        assert!(resolved.is_holiday);
    }

    #[test]
    fn plain_weekday_is_a_regular_school_day() {
        let day = date(2023, 9, 12);
        let resolved = resolve(day, true, &[]);
        assert_eq!(resolved.day_type, DayType::Regular);
        assert_eq!(resolved.label, REGULAR_LABEL);
        assert!(resolved.is_school_day);
        assert_eq!(resolved.comment, None);
    }

    #[test]
    fn weekday_break_blocks_testing() {
        let day = date(2024, 3, 27);
        let candidates = vec![
            DayTypeCandidate::new(day, DayType::Break, "Spring Break"),
            DayTypeCandidate::new(day, DayType::Event, "Field Day"),
        ];
        let resolved = resolve(day, true, &candidates);
        assert_eq!(resolved.day_type, DayType::Break);
        assert!(!resolved.is_school_day);
    }
}
