use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Final classification of a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayType {
    Regular,
    Weekend,
    Holiday,
    Break,
    Weather,
    EmergencyClosure,
    Remote,
    Quarantine,
    TeacherWorkDay,
    PdDay,
    Testing,
    Event,
    Summer,
}

impl DayType {
    pub const ALL: [DayType; 13] = [
        DayType::Regular,
        DayType::Weekend,
        DayType::Holiday,
        DayType::Break,
        DayType::Weather,
        DayType::EmergencyClosure,
        DayType::Remote,
        DayType::Quarantine,
        DayType::TeacherWorkDay,
        DayType::PdDay,
        DayType::Testing,
        DayType::Event,
        DayType::Summer,
    ];

    /// Precedence rank; the lowest tier present on a date wins.
    pub fn tier(self) -> u8 {
        match self {
            DayType::Weekend => 1,
            DayType::Holiday => 2,
            DayType::Break => 3,
            DayType::EmergencyClosure
            | DayType::Weather
            | DayType::Quarantine
            | DayType::Remote => 4,
            DayType::TeacherWorkDay | DayType::PdDay => 5,
            DayType::Testing => 6,
            DayType::Event => 7,
            DayType::Regular => 8,
            DayType::Summer => 9,
        }
    }

    /// Tiers 4..=7 may only claim potential instructional days.
    pub fn requires_instructional_day(self) -> bool {
        (4..=7).contains(&self.tier())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Regular => "REGULAR",
            DayType::Weekend => "WEEKEND",
            DayType::Holiday => "HOLIDAY",
            DayType::Break => "BREAK",
            DayType::Weather => "WEATHER",
            DayType::EmergencyClosure => "EMERGENCY_CLOSURE",
            DayType::Remote => "REMOTE",
            DayType::Quarantine => "QUARANTINE",
            DayType::TeacherWorkDay => "TEACHER_WORK_DAY",
            DayType::PdDay => "PD_DAY",
            DayType::Testing => "TESTING",
            DayType::Event => "EVENT",
            DayType::Summer => "SUMMER",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayType::ALL
            .into_iter()
            .find(|day_type| day_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown day type '{s}'"))
    }
}

/// A provider's proposal for one date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTypeCandidate {
    pub date: NaiveDate,
    pub label: String,
    pub day_type: DayType,
    pub tier: u8,
    pub is_school_day: bool,
    pub is_holiday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DayTypeCandidate {
    /// Candidate carrying the category's default tier and flags.
    pub fn new(date: NaiveDate, day_type: DayType, label: impl Into<String>) -> Self {
        Self {
            date,
            label: label.into(),
            day_type,
            tier: day_type.tier(),
            is_school_day: matches!(
                day_type,
                DayType::Regular
                    | DayType::Remote
                    | DayType::Testing
                    | DayType::Event
            ),
            is_holiday: day_type == DayType::Holiday,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_precedence_order() {
        assert!(DayType::Weekend.tier() < DayType::Holiday.tier());
        assert!(DayType::Holiday.tier() < DayType::Break.tier());
        assert!(DayType::Break.tier() < DayType::Weather.tier());
        assert_eq!(DayType::Weather.tier(), DayType::Quarantine.tier());
        assert!(DayType::Weather.tier() < DayType::TeacherWorkDay.tier());
        assert_eq!(DayType::TeacherWorkDay.tier(), DayType::PdDay.tier());
        assert!(DayType::PdDay.tier() < DayType::Testing.tier());
        assert!(DayType::Testing.tier() < DayType::Event.tier());
        assert!(DayType::Event.tier() < DayType::Regular.tier());
        assert!(DayType::Regular.tier() < DayType::Summer.tier());
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for day_type in DayType::ALL {
            assert_eq!(day_type.as_str().parse::<DayType>().unwrap(), day_type);
        }
        assert_eq!("pd_day".parse::<DayType>().unwrap(), DayType::PdDay);
        assert!("LUNCH".parse::<DayType>().is_err());
        assert_eq!(
            serde_json::to_string(&DayType::TeacherWorkDay).unwrap(),
            "\"TEACHER_WORK_DAY\""
        );
    }

    #[test]
    fn candidate_defaults_match_category() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let testing = DayTypeCandidate::new(date, DayType::Testing, "AP Exam Week");
        assert!(testing.is_school_day);
        assert_eq!(testing.tier, 6);
        let weather = DayTypeCandidate::new(date, DayType::Weather, "Snow Day");
        assert!(!weather.is_school_day);
        assert!(!weather.is_holiday);
        let holiday = DayTypeCandidate::new(date, DayType::Holiday, "Memorial Day");
        assert!(holiday.is_holiday);
    }
}
