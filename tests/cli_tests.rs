#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("SCHOOL_CALENDAR_CONFIG")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_prints_summary_on_startup() {
    run_cli("quit\n")
        .success()
        .stdout(str_contains("Generated calendar (records=3621"));
}

#[test]
fn cli_show_renders_a_single_date() {
    run_cli("show 2024-11-28\nquit\n")
        .success()
        .stdout(str_contains("Thanksgiving Day"))
        .stdout(str_contains("During Thanksgiving Break"));
}

#[test]
fn cli_rejects_bad_dates() {
    run_cli("show 2024-13-01\nrange 2024-01-01\nquit\n")
        .success()
        .stdout(str_contains("Invalid date (YYYY-MM-DD)"))
        .stdout(str_contains("Usage: range <YYYY-MM-DD> <YYYY-MM-DD>"));
}

#[test]
fn cli_lists_school_years() {
    run_cli("years\nyear 9\nquit\n")
        .success()
        .stdout(str_contains("2016-2017"))
        .stdout(str_contains("2025-2026"))
        .stdout(str_contains("School year 9 (2024-2025)"))
        .stdout(str_contains("Spring Break"));
}

#[test]
fn cli_generate_with_seed() {
    run_cli("generate 7\nsummary\nquit\n")
        .success()
        .stdout(str_contains("Regenerated with seed 7"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!("save json {path}\ngenerate 3\nload json {path}\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains(format!("Calendar saved to {path}.")))
        .stdout(str_contains(format!("Calendar loaded from {path}.")));
}

#[test]
fn cli_save_and_load_csv_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!("save csv {path}\nload csv {path}\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains(format!("Calendar loaded from {path}.")));
}

#[test]
fn cli_unknown_command_hint() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command 'frobnicate'"));
}
