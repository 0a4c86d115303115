use crate::calendar::{
    self, FederalHoliday, days_inclusive, easter_sunday, nth_weekday, roll_back_to_weekday,
    roll_to_weekday, weekday_on_or_after, weekdays_inclusive, ymd,
};
use crate::config::{CalendarConfig, ThanksgivingStyle};
use crate::error::{CalendarError, CalendarResult};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

const TERM_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    Fall,
    Thanksgiving,
    Winter,
    Spring,
    EasterMonday,
}

impl BreakKind {
    pub fn name(self) -> &'static str {
        match self {
            BreakKind::Fall => "Fall Break",
            BreakKind::Thanksgiving => "Thanksgiving Break",
            BreakKind::Winter => "Winter Break",
            BreakKind::Spring => "Spring Break",
            BreakKind::EasterMonday => "Easter Monday",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub kind: BreakKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BreakWindow {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        days_inclusive(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolYear {
    pub id: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub terms: Vec<Term>,
    pub breaks: Vec<BreakWindow>,
    /// Weekdays in the window left after federal holidays and breaks.
    pub instructional_slots: u32,
}

impl SchoolYear {
    /// Calendar year of the August start.
    pub fn academic_year(&self) -> i32 {
        self.start.year()
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start.year(), self.start.year() + 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn break_on(&self, date: NaiveDate) -> Option<&BreakWindow> {
        self.breaks.iter().find(|window| window.contains(date))
    }

    pub fn break_of(&self, kind: BreakKind) -> Option<&BreakWindow> {
        self.breaks.iter().find(|window| window.kind == kind)
    }

    pub fn term_on(&self, date: NaiveDate) -> Option<&Term> {
        self.terms
            .iter()
            .find(|term| term.start <= date && date <= term.end)
    }

    pub fn weekdays(&self) -> impl Iterator<Item = NaiveDate> {
        weekdays_inclusive(self.start, self.end)
    }
}

/// The ordered set of school years plus the federal holiday table every
/// provider reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolYearRegistry {
    years: Vec<SchoolYear>,
    range_start: NaiveDate,
    range_end: NaiveDate,
    holidays: BTreeMap<NaiveDate, FederalHoliday>,
}

impl SchoolYearRegistry {
    pub fn years(&self) -> &[SchoolYear] {
        &self.years
    }

    pub fn get(&self, id: u32) -> Option<&SchoolYear> {
        self.years.iter().find(|year| year.id == id)
    }

    pub fn year_for(&self, date: NaiveDate) -> Option<&SchoolYear> {
        let idx = self.years.partition_point(|year| year.end < date);
        self.years.get(idx).filter(|year| year.contains(date))
    }

    pub fn range_start(&self) -> NaiveDate {
        self.range_start
    }

    pub fn range_end(&self) -> NaiveDate {
        self.range_end
    }

    /// Calendar years touched by the output range.
    pub fn calendar_years(&self) -> std::ops::RangeInclusive<i32> {
        self.range_start.year()..=self.range_end.year()
    }

    pub fn holidays(&self) -> &BTreeMap<NaiveDate, FederalHoliday> {
        &self.holidays
    }

    pub fn holiday_on(&self, date: NaiveDate) -> Option<FederalHoliday> {
        self.holidays.get(&date).copied()
    }

    /// Weekday inside a school year that is neither a federal holiday nor a
    /// break day.
    pub fn is_open_weekday(&self, year: &SchoolYear, date: NaiveDate) -> bool {
        year.contains(date)
            && !calendar::is_weekend(date)
            && !self.holidays.contains_key(&date)
            && year.break_on(date).is_none()
    }

    /// Open weekdays of `year` in date order.
    pub fn open_weekdays(&self, year: &SchoolYear) -> Vec<NaiveDate> {
        year.weekdays()
            .filter(|date| self.is_open_weekday(year, *date))
            .collect()
    }
}

/// Derives every school year window, its breaks and terms from `config`.
pub fn build_registry(config: &CalendarConfig) -> CalendarResult<SchoolYearRegistry> {
    config.validate()?;

    let last_academic_year = config.first_academic_year + config.school_year_count as i32;
    let first_holiday_year = config.range_start.year().min(config.first_academic_year);
    let last_holiday_year = config.range_end.year().max(last_academic_year);
    let mut holidays = BTreeMap::new();
    for year in first_holiday_year..=last_holiday_year {
        for (holiday, date) in calendar::federal_holidays(year, config.include_columbus_day)? {
            holidays.insert(date, holiday);
        }
    }

    let mut years: Vec<SchoolYear> = Vec::with_capacity(config.school_year_count as usize);
    for offset in 0..config.school_year_count {
        let id = offset + 1;
        let academic_year = config.first_academic_year + offset as i32;
        let year = build_school_year(config, id, academic_year, &holidays)?;
        if let Some(previous) = years.last() {
            if year.start <= previous.end {
                return Err(CalendarError::configuration(format!(
                    "school year {} ({} to {}) overlaps school year {} ({} to {})",
                    year.id, year.start, year.end, previous.id, previous.start, previous.end
                )));
            }
        }
        info!(
            school_year = year.id,
            start = %year.start,
            end = %year.end,
            slots = year.instructional_slots,
            "registered school year"
        );
        years.push(year);
    }

    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        if first.start < config.range_start || last.end > config.range_end {
            return Err(CalendarError::configuration(format!(
                "output range {} to {} does not cover school years {} to {} ({} to {})",
                config.range_start, config.range_end, first.id, last.id, first.start, last.end
            )));
        }
    }

    Ok(SchoolYearRegistry {
        years,
        range_start: config.range_start,
        range_end: config.range_end,
        holidays,
    })
}

fn build_school_year(
    config: &CalendarConfig,
    id: u32,
    academic_year: i32,
    holidays: &BTreeMap<NaiveDate, FederalHoliday>,
) -> CalendarResult<SchoolYear> {
    let start = school_year_start(config, id, academic_year)?;
    let breaks = break_windows(config, id, academic_year)?;

    let cap = roll_back_to_weekday(ymd(
        academic_year + 1,
        config.end_cap_month,
        config.end_cap_day,
    )?);
    let target = config.instructional_floor + config.reserved_closure_days();

    // Grow one weekday at a time so an uncapped year holds exactly `target`.
    let mut end = weekday_on_or_after(ymd(academic_year + 1, 6, 1)?, Weekday::Fri).min(cap);
    let mut slots = instructional_slots(start, end, &breaks, holidays);
    while slots < target && end < cap {
        end = roll_to_weekday(end + Duration::days(1)).min(cap);
        slots = instructional_slots(start, end, &breaks, holidays);
    }
    debug!(school_year = id, end = %end, slots, target, "sized school year end");
    if slots < target {
        warn!(
            school_year = id,
            slots,
            target,
            "school year end capped before reaching the instructional target"
        );
    }

    for window in &breaks {
        if window.start < start || window.end > end {
            return Err(CalendarError::configuration(format!(
                "{} ({} to {}) crosses the boundary of school year {id} ({start} to {end})",
                window.name(),
                window.start,
                window.end
            )));
        }
    }

    Ok(SchoolYear {
        id,
        start,
        end,
        terms: split_terms(id, start, end)?,
        breaks,
        instructional_slots: slots,
    })
}

fn school_year_start(config: &CalendarConfig, id: u32, academic_year: i32) -> CalendarResult<NaiveDate> {
    let floor = ymd(academic_year, 8, 20)?;
    let start = match config.start_overrides.get(&id) {
        Some(date) => *date,
        None => weekday_on_or_after(ymd(academic_year, 8, 25)?, Weekday::Mon),
    };
    if start < floor || start.year() != academic_year || calendar::is_weekend(start) {
        return Err(CalendarError::configuration(format!(
            "school year {id} start {start} must be a weekday on or after {floor}"
        )));
    }
    Ok(start)
}

fn break_windows(config: &CalendarConfig, id: u32, academic_year: i32) -> CalendarResult<Vec<BreakWindow>> {
    let breaks = &config.breaks;

    let fall_start = nth_weekday(academic_year, 10, Weekday::Mon, 2)?;
    let fall = BreakWindow {
        kind: BreakKind::Fall,
        start: fall_start,
        end: fall_start + Duration::days(breaks.fall_break_days as i64 - 1),
    };

    let thanksgiving_day = nth_weekday(academic_year, 11, Weekday::Thu, 4)?;
    let style = breaks
        .thanksgiving_overrides
        .get(&id)
        .copied()
        .unwrap_or(breaks.thanksgiving);
    let (tg_start, tg_end) = match style {
        ThanksgivingStyle::WedFri => (
            thanksgiving_day - Duration::days(1),
            thanksgiving_day + Duration::days(1),
        ),
        ThanksgivingStyle::ThuMon => (thanksgiving_day, thanksgiving_day + Duration::days(4)),
    };

    let winter = BreakWindow {
        kind: BreakKind::Winter,
        start: ymd(academic_year, 12, 22)?,
        end: ymd(academic_year + 1, 1, 2)?,
    };

    let easter = easter_sunday(academic_year + 1)?;
    let spring_start = roll_to_weekday(easter + Duration::days(breaks.spring_break.offset_days()));
    let spring_end = weekdays_inclusive(spring_start, spring_start + Duration::days(13))
        .nth(4)
        .unwrap_or(spring_start);

    let spring = BreakWindow {
        kind: BreakKind::Spring,
        start: spring_start,
        end: spring_end,
    };
    let easter_monday = easter + Duration::days(1);
    let closes_easter_monday = breaks.easter_monday && !spring.contains(easter_monday);

    let mut windows = vec![
        fall,
        BreakWindow {
            kind: BreakKind::Thanksgiving,
            start: tg_start,
            end: tg_end,
        },
        winter,
        spring,
    ];
    if closes_easter_monday {
        windows.push(BreakWindow {
            kind: BreakKind::EasterMonday,
            start: easter_monday,
            end: easter_monday,
        });
    }
    Ok(windows)
}

/// Weekdays in `[start, end]` minus weekday holidays and break days.
pub fn instructional_slots(
    start: NaiveDate,
    end: NaiveDate,
    breaks: &[BreakWindow],
    holidays: &BTreeMap<NaiveDate, FederalHoliday>,
) -> u32 {
    let closed: BTreeSet<NaiveDate> = breaks
        .iter()
        .flat_map(|window| window.days())
        .chain(holidays.range(start..=end).map(|(date, _)| *date))
        .collect();
    weekdays_inclusive(start, end)
        .filter(|date| !closed.contains(date))
        .count() as u32
}

/// Splits the window into four terms holding equal weekday counts; the
/// remainder goes to the earliest terms.
fn split_terms(id: u32, start: NaiveDate, end: NaiveDate) -> CalendarResult<Vec<Term>> {
    let weekdays: Vec<NaiveDate> = weekdays_inclusive(start, end).collect();
    if weekdays.len() < TERM_COUNT {
        return Err(CalendarError::configuration(format!(
            "school year {id} has only {} weekdays",
            weekdays.len()
        )));
    }
    let base = weekdays.len() / TERM_COUNT;
    let remainder = weekdays.len() % TERM_COUNT;

    let mut terms = Vec::with_capacity(TERM_COUNT);
    let mut offset = 0;
    for idx in 0..TERM_COUNT {
        let size = base + usize::from(idx < remainder);
        let term_start = if idx == 0 { start } else { weekdays[offset] };
        let term_end = if idx == TERM_COUNT - 1 {
            end
        } else {
            weekdays[offset + size - 1]
        };
        terms.push(Term {
            label: format!("Q{}", idx + 1),
            start: term_start,
            end: term_end,
        });
        offset += size;
    }
    Ok(terms)
}
