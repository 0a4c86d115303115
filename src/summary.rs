use crate::school_calendar::SchoolCalendar;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const TOP_LABELS: usize = 15;

const COVID_TYPES: [&str; 3] = ["EMERGENCY_CLOSURE", "REMOTE", "QUARANTINE"];
const TEACHER_TYPES: [&str; 2] = ["TEACHER_WORK_DAY", "PD_DAY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearStatus {
    Ok,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub school_year_id: u32,
    pub label: String,
    pub instructional_days: u32,
    pub weather_days: u32,
    pub covid_days: u32,
    pub teacher_days: u32,
    pub testing_days: u32,
    pub event_days: u32,
    pub status: YearStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub total_records: u32,
    pub school_days: u32,
    pub holidays: u32,
    pub weekends: u32,
    /// Days per day type, ordered by day type name.
    pub day_types: Vec<(String, u32)>,
    pub years: Vec<YearSummary>,
    pub average_instructional_days: f64,
    /// Most frequent labels, most frequent first.
    pub top_labels: Vec<(String, u32)>,
}

fn day_type_in(types: &[&str]) -> Expr {
    types
        .iter()
        .map(|day_type| col("day_type").eq(lit(*day_type)))
        .reduce(|acc, expr| acc.or(expr))
        .unwrap_or_else(|| lit(false))
}

fn count_as_u32(value: Option<i64>) -> u32 {
    value.unwrap_or(0).max(0) as u32
}

/// (key, days) pairs of a `group_by(key).agg(count)` frame.
fn keyed_counts(df: &DataFrame, key: &str) -> PolarsResult<Vec<(String, u32)>> {
    let grouped = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col("calendar_date").count().cast(DataType::Int64).alias("days")])
        .collect()?;
    let keys = grouped.column(key)?.str()?;
    let days = grouped.column("days")?.i64()?;
    let mut out = Vec::with_capacity(grouped.height());
    for idx in 0..grouped.height() {
        if let Some(name) = keys.get(idx) {
            out.push((name.to_string(), count_as_u32(days.get(idx))));
        }
    }
    Ok(out)
}

impl CalendarSummary {
    pub fn from_calendar(calendar: &SchoolCalendar) -> PolarsResult<Self> {
        let df = calendar.dataframe()?;

        let totals = df
            .clone()
            .lazy()
            .select([
                col("calendar_date").count().cast(DataType::Int64).alias("records"),
                col("is_school_day").cast(DataType::Int64).sum().alias("school_days"),
                col("is_holiday").cast(DataType::Int64).sum().alias("holidays"),
                day_type_in(&["WEEKEND"]).cast(DataType::Int64).sum().alias("weekends"),
            ])
            .collect()?;
        let total = |name: &str| -> PolarsResult<u32> {
            Ok(count_as_u32(totals.column(name)?.i64()?.get(0)))
        };

        let mut day_types = keyed_counts(&df, "day_type")?;
        day_types.sort();

        let mut top_labels = keyed_counts(&df, "label")?;
        top_labels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_labels.truncate(TOP_LABELS);

        let per_year = df
            .clone()
            .lazy()
            .filter(col("school_year_id").is_not_null())
            .group_by([col("school_year_id")])
            .agg([
                col("is_school_day").cast(DataType::Int64).sum().alias("instructional_days"),
                day_type_in(&["WEATHER"]).cast(DataType::Int64).sum().alias("weather_days"),
                day_type_in(&COVID_TYPES).cast(DataType::Int64).sum().alias("covid_days"),
                day_type_in(&TEACHER_TYPES).cast(DataType::Int64).sum().alias("teacher_days"),
                day_type_in(&["TESTING"]).cast(DataType::Int64).sum().alias("testing_days"),
                day_type_in(&["EVENT"]).cast(DataType::Int64).sum().alias("event_days"),
            ])
            .collect()?;

        let ids = per_year.column("school_year_id")?.i32()?;
        let instructional = per_year.column("instructional_days")?.i64()?;
        let weather = per_year.column("weather_days")?.i64()?;
        let covid = per_year.column("covid_days")?.i64()?;
        let teacher = per_year.column("teacher_days")?.i64()?;
        let testing = per_year.column("testing_days")?.i64()?;
        let events = per_year.column("event_days")?.i64()?;

        let thresholds = calendar.config().validation;
        let mut years = Vec::with_capacity(per_year.height());
        for idx in 0..per_year.height() {
            let Some(id) = ids.get(idx) else { continue };
            let id = id as u32;
            let instructional_days = count_as_u32(instructional.get(idx));
            let status = if (thresholds.warn_min..=thresholds.warn_max).contains(&instructional_days) {
                YearStatus::Ok
            } else {
                YearStatus::Warn
            };
            years.push(YearSummary {
                school_year_id: id,
                label: calendar
                    .school_year(id)
                    .map(|year| year.label())
                    .unwrap_or_default(),
                instructional_days,
                weather_days: count_as_u32(weather.get(idx)),
                covid_days: count_as_u32(covid.get(idx)),
                teacher_days: count_as_u32(teacher.get(idx)),
                testing_days: count_as_u32(testing.get(idx)),
                event_days: count_as_u32(events.get(idx)),
                status,
            });
        }
        years.sort_by_key(|year| year.school_year_id);

        let average_instructional_days = if years.is_empty() {
            0.0
        } else {
            years.iter().map(|y| f64::from(y.instructional_days)).sum::<f64>() / years.len() as f64
        };

        Ok(Self {
            total_records: total("records")?,
            school_days: total("school_days")?,
            holidays: total("holidays")?,
            weekends: total("weekends")?,
            day_types,
            years,
            average_instructional_days,
            top_labels,
        })
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("records={}", self.total_records));
        parts.push(format!("school_days={}", self.school_days));
        parts.push(format!("holidays={}", self.holidays));
        parts.push(format!("weekends={}", self.weekends));
        parts.push(format!("years={}", self.years.len()));
        parts.push(format!("avg={:.1}", self.average_instructional_days));
        let warned = self
            .years
            .iter()
            .filter(|year| year.status == YearStatus::Warn)
            .count();
        if warned > 0 {
            parts.push(format!("warn_years={warned}"));
        }
        parts.join(", ")
    }

    /// Multi-line statistics block: totals, per-year counts, label ranking.
    pub fn to_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total records: {}", self.total_records);
        let _ = writeln!(out, "School days: {}", self.school_days);
        let _ = writeln!(out, "Holidays: {}", self.holidays);
        let _ = writeln!(out, "Weekends: {}", self.weekends);
        let _ = writeln!(out);
        let _ = writeln!(out, "Instructional days per school year:");
        for year in &self.years {
            let status = match year.status {
                YearStatus::Ok => "[OK]",
                YearStatus::Warn => "[WARN]",
            };
            let _ = writeln!(
                out,
                "  {} (id {}): {} days {status} weather={} covid={} teacher={}",
                year.label,
                year.school_year_id,
                year.instructional_days,
                year.weather_days,
                year.covid_days,
                year.teacher_days
            );
        }
        let _ = writeln!(
            out,
            "Average instructional days: {:.1}",
            self.average_instructional_days
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Day types:");
        for (day_type, days) in &self.day_types {
            let _ = writeln!(out, "  {day_type}: {days}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Top labels:");
        for (label, days) in &self.top_labels {
            let _ = writeln!(out, "  {label}: {days}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalendarConfig;

    #[test]
    fn summary_matches_the_records() {
        let calendar = SchoolCalendar::generate(CalendarConfig::default()).unwrap();
        let summary = calendar.summary().unwrap();

        assert_eq!(summary.total_records as usize, calendar.records().len());
        let school_days = calendar.records().iter().filter(|r| r.is_school_day).count();
        assert_eq!(summary.school_days as usize, school_days);
        assert_eq!(summary.years.len(), 10);
        for year in &summary.years {
            assert_eq!(
                year.instructional_days,
                calendar.instructional_days(year.school_year_id)
            );
        }
        let day_type_total: u32 = summary.day_types.iter().map(|(_, days)| days).sum();
        assert_eq!(day_type_total, summary.total_records);
        assert!(summary.top_labels.len() <= TOP_LABELS);
        assert!(summary.top_labels.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn closure_year_counts_covid_days() {
        let calendar = SchoolCalendar::generate(CalendarConfig::default()).unwrap();
        let summary = calendar.summary().unwrap();
        let closure_year = summary
            .years
            .iter()
            .find(|year| year.label == "2019-2020")
            .unwrap();
        assert!(closure_year.covid_days > 40);
        assert!(summary.to_cli_summary().starts_with("records=3621"));
        assert!(summary.to_report().contains("2019-2020 (id 4)"));
    }
}
