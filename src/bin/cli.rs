use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use school_calendar::school_calendar::records_dataframe;
use school_calendar::{
    CalendarConfig, CalendarError, CalendarRecord, SchoolCalendar, load_calendar_from_csv,
    load_calendar_from_json, load_config, logging, save_calendar_to_csv, save_calendar_to_json,
    save_config,
};
#[cfg(feature = "sqlite")]
use school_calendar::{CalendarStore, SqliteCalendarStore};
use std::io::{self, Write};

const TABLE_COLUMNS: [&str; 7] = [
    "calendar_date",
    "school_year_id",
    "day_type",
    "label",
    "is_school_day",
    "is_holiday",
    "comment",
];

fn cell_text(av: &AnyValue<'_>) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |row: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in row.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_records(records: &[CalendarRecord]) -> String {
    match records_dataframe(records).and_then(|df| df.select(TABLE_COLUMNS)) {
        Ok(df) => render_df_as_text_table(&df),
        Err(e) => format!("Error building table: {e}"),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  summary                            One-line calendar summary\n  stats                              Full statistics report\n  show <YYYY-MM-DD>                  Show the record for one date\n  range <start> <end>                Show records between two dates\n  years                              List school years\n  year <id>                          Show terms and breaks of a school year\n  validate                           Show validation findings\n  generate [seed]                    Regenerate (optionally with a new seed)\n  config show                        Print the active configuration as JSON\n  config load <json_path>            Load a configuration and regenerate\n  config save <json_path>            Save the active configuration\n  save <json|csv|sqlite> <path>      Persist the calendar\n  load <json|csv|sqlite> <path>      Load a calendar (csv uses the active config)\n  quit|exit                          Exit"
    );
}

fn print_years(calendar: &SchoolCalendar) {
    println!(
        "{:<4} {:<10} {:<11} {:<11} {:>6} {:>14}",
        "id", "year", "start", "end", "slots", "instructional"
    );
    for year in calendar.registry().years() {
        println!(
            "{:<4} {:<10} {:<11} {:<11} {:>6} {:>14}",
            year.id,
            year.label(),
            year.start,
            year.end,
            year.instructional_slots,
            calendar.instructional_days(year.id)
        );
    }
}

fn print_year(calendar: &SchoolCalendar, id: u32) {
    let Some(year) = calendar.school_year(id) else {
        println!("School year {id} not found.");
        return;
    };
    println!(
        "School year {} ({}): {} to {}",
        year.id,
        year.label(),
        year.start,
        year.end
    );
    println!("Instructional days: {}", calendar.instructional_days(id));
    println!("Terms:");
    for term in &year.terms {
        println!("  {:<3} {} to {}", term.label, term.start, term.end);
    }
    println!("Breaks:");
    for window in &year.breaks {
        println!("  {:<19} {} to {}", window.name(), window.start, window.end);
    }
}

fn print_validation(calendar: &SchoolCalendar) {
    let report = calendar.report();
    if report.is_clean() {
        println!("No validation findings.");
        return;
    }
    for violation in &report.violations {
        println!("{violation}");
    }
}

fn print_generation_error(err: &CalendarError) {
    println!("Generation failed: {err}");
    if let CalendarError::Validation(report) = err {
        for violation in report.errors() {
            println!("  {violation}");
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn replace_calendar(
    calendar: &mut SchoolCalendar,
    next: Result<SchoolCalendar, CalendarError>,
    what: &str,
) {
    match next {
        Ok(next) => {
            *calendar = next;
            match calendar.summary() {
                Ok(summary) => println!("{what} ({}).", summary.to_cli_summary()),
                Err(e) => println!("{what} (summary unavailable: {e})."),
            }
        }
        Err(e) => print_generation_error(&e),
    }
}

fn main() {
    logging::init();

    let config = match std::env::var("SCHOOL_CALENDAR_CONFIG") {
        Ok(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading {path}: {e}");
                std::process::exit(1);
            }
        },
        Err(_) => CalendarConfig::default(),
    };
    let mut calendar = match SchoolCalendar::generate(config) {
        Ok(calendar) => calendar,
        Err(e) => {
            print_generation_error(&e);
            std::process::exit(1);
        }
    };

    println!("School Calendar (CLI) - type 'help' for commands\n");
    match calendar.summary() {
        Ok(summary) => println!("Generated calendar ({}).", summary.to_cli_summary()),
        Err(e) => println!("Summary error: {e}"),
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "summary" => match calendar.summary() {
                Ok(summary) => println!("{}", summary.to_cli_summary()),
                Err(e) => println!("Summary error: {e}"),
            },
            "stats" => match calendar.summary() {
                Ok(summary) => print!("{}", summary.to_report()),
                Err(e) => println!("Summary error: {e}"),
            },
            "show" => match parts.next().map(parse_date) {
                Some(Some(date)) => match calendar.record(date) {
                    Some(record) => print!("{}", render_records(std::slice::from_ref(record))),
                    None => println!("{date} is outside the calendar range."),
                },
                Some(None) => println!("Invalid date (YYYY-MM-DD)"),
                None => println!("Usage: show <YYYY-MM-DD>"),
            },
            "range" => {
                let start = parts.next().and_then(parse_date);
                let end = parts.next().and_then(parse_date);
                match (start, end) {
                    (Some(start), Some(end)) => match calendar.range(start, end) {
                        Ok(records) => print!("{}", render_records(records)),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: range <YYYY-MM-DD> <YYYY-MM-DD>"),
                }
            }
            "years" => print_years(&calendar),
            "year" => match parts.next().map(str::parse::<u32>) {
                Some(Ok(id)) => print_year(&calendar, id),
                Some(Err(_)) => println!("Invalid id"),
                None => println!("Usage: year <id>"),
            },
            "validate" => print_validation(&calendar),
            "generate" => {
                let seed = match parts.next().map(str::parse::<u64>) {
                    Some(Ok(seed)) => seed,
                    Some(Err(_)) => {
                        println!("Invalid seed");
                        continue;
                    }
                    None => calendar.config().seed,
                };
                let next = calendar.regenerate(seed);
                replace_calendar(&mut calendar, next, &format!("Regenerated with seed {seed}"));
            }
            "config" => match parts.next() {
                Some("show") | None => match serde_json::to_string_pretty(calendar.config()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("Error serializing config: {e}"),
                },
                Some("load") => match parts.next() {
                    Some(path) => match load_config(path) {
                        Ok(config) => {
                            let next = SchoolCalendar::generate(config);
                            replace_calendar(
                                &mut calendar,
                                next,
                                &format!("Configuration loaded from {path}"),
                            );
                        }
                        Err(e) => println!("Error loading {path}: {e}"),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match save_config(calendar.config(), path) {
                        Ok(_) => println!("Configuration saved to {path}."),
                        Err(e) => println!("Error writing {path}: {e}"),
                    },
                    None => println!("Usage: config save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown config command '{other}'.");
                    println!("Usage: config show|load <json_path>|save <json_path>");
                }
            },
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => match save_calendar_to_json(&calendar, path) {
                        Ok(_) => println!("Calendar saved to {path}."),
                        Err(e) => println!("Error saving calendar: {e}"),
                    },
                    (Some("csv"), Some(path)) => match save_calendar_to_csv(&calendar, path) {
                        Ok(_) => println!("Calendar saved to {path}."),
                        Err(e) => println!("Error saving calendar: {e}"),
                    },
                    #[cfg(feature = "sqlite")]
                    (Some("sqlite"), Some(path)) => {
                        match SqliteCalendarStore::new(path)
                            .and_then(|store| store.save_calendar(&calendar))
                        {
                            Ok(_) => println!("Calendar saved to {path}."),
                            Err(e) => println!("Error saving calendar: {e}"),
                        }
                    }
                    _ => println!("Usage: save <json|csv|sqlite> <path>"),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let loaded = match (fmt, path) {
                    (Some("json"), Some(path)) => load_calendar_from_json(path).map(Some),
                    (Some("csv"), Some(path)) => {
                        load_calendar_from_csv(path, calendar.config().clone()).map(Some)
                    }
                    #[cfg(feature = "sqlite")]
                    (Some("sqlite"), Some(path)) => {
                        SqliteCalendarStore::new(path).and_then(|store| store.load_calendar())
                    }
                    _ => {
                        println!("Usage: load <json|csv|sqlite> <path>");
                        continue;
                    }
                };
                match (loaded, path) {
                    (Ok(Some(next)), Some(path)) => {
                        calendar = next;
                        println!("Calendar loaded from {path}.");
                    }
                    (Ok(_), _) => println!("No calendar stored there."),
                    (Err(e), _) => println!("Error loading calendar: {e}"),
                }
            }
            other => {
                println!("Unknown command '{other}'. Type 'help' for commands.");
            }
        }
    }
}
