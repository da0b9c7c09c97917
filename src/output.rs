use std::io::{self, Write};

use crossterm::style::Stylize;
use serde::Serialize;

use crate::dispatch::{BatchResult, TaskReport};
use crate::domain::format_coord;
use crate::fetch::FetchOutcome;
use crate::progress::ProgressSink;
use crate::query::Table;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Serialize)]
struct BatchReport<'a> {
    tool: String,
    finished_at: String,
    downloaded: usize,
    skipped: usize,
    failed: usize,
    reports: &'a [TaskReport],
}

impl<'a> BatchReport<'a> {
    fn new(result: &'a BatchResult) -> Self {
        Self {
            tool: format!("skycat/{}", env!("CARGO_PKG_VERSION")),
            finished_at: chrono::Utc::now().to_rfc3339(),
            downloaded: result.downloaded(),
            skipped: result.skipped(),
            failed: result.failed(),
            reports: &result.reports,
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_batch(result: &BatchResult) -> io::Result<()> {
        Self::print_json(&BatchReport::new(result))
    }

    pub fn print_table(table: &Table) -> io::Result<()> {
        Self::print_json(table)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Verbose mode: one colored line per finished task.
pub struct StatusLines;

impl ProgressSink for StatusLines {
    fn task_finished(&self, report: &TaskReport) {
        let mut stdout = io::stdout().lock();
        // A closed pipe must not take the batch down with it.
        let _ = writeln!(stdout, "{}", status_line(report));
        if let FetchOutcome::Failed { error } = &report.outcome {
            let _ = writeln!(stdout, "{error}");
        }
    }
}

pub fn status_line(report: &TaskReport) -> String {
    let position = format!(
        "Catalog at [ {} {} ]",
        format_coord(report.ra),
        format_coord(report.dec)
    );
    match report.outcome {
        FetchOutcome::Skipped => format!("{position} already exists.").yellow().to_string(),
        FetchOutcome::Downloaded { .. } => {
            format!("{position} has been downloaded.").green().to_string()
        }
        FetchOutcome::Failed { .. } => format!("{position} failed to download. :(")
            .red()
            .to_string(),
    }
}

pub fn print_summary(result: &BatchResult) {
    println!("{}", "Finished!".cyan());
    println!(
        "{}",
        format!("downloaded: {}", result.downloaded()).green()
    );
    println!("{}", format!("skipped: {}", result.skipped()).yellow());
    let failed = format!("failed: {}", result.failed());
    if result.failed() > 0 {
        println!("{}", failed.red());
    } else {
        println!("{failed}");
    }
}
