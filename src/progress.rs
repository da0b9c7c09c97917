//! Batch progress reporting.
//!
//! The reporter is picked once before dispatch. Workers only ever talk to a
//! [`ProgressSink`], so the choice never changes what gets downloaded.

use std::io::{self, Stderr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossterm::tty::IsTty;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Style};
use ratatui::widgets::Gauge;
use ratatui::{Terminal, TerminalOptions, Viewport};

use crate::dispatch::TaskReport;
use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    Gauge,
    Silent,
    Custom,
}

pub trait ProgressSink: Send + Sync {
    fn start(&self, _total: usize) {}
    fn task_finished(&self, report: &TaskReport);
    fn finish(&self) {}

    fn kind(&self) -> ReporterKind {
        ReporterKind::Custom
    }
}

/// Used when no progress display is available or wanted.
pub struct SilentReporter;

impl ProgressSink for SilentReporter {
    fn task_finished(&self, _report: &TaskReport) {}

    fn kind(&self) -> ReporterKind {
        ReporterKind::Silent
    }
}

/// Single-line gauge drawn below the cursor on stderr.
pub struct GaugeReporter {
    terminal: Mutex<Terminal<CrosstermBackend<Stderr>>>,
    total: AtomicUsize,
    done: AtomicUsize,
    failed: AtomicUsize,
    started: Instant,
}

impl GaugeReporter {
    pub fn new() -> Result<Self, CatalogError> {
        let stderr = io::stderr();
        if !stderr.is_tty() {
            return Err(CatalogError::Progress("stderr is not a terminal".to_string()));
        }
        let backend = CrosstermBackend::new(stderr);
        let terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(1),
            },
        )
        .map_err(|err| CatalogError::Progress(err.to_string()))?;
        Ok(Self {
            terminal: Mutex::new(terminal),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            started: Instant::now(),
        })
    }

    fn draw(&self) {
        let total = self.total.load(Ordering::Relaxed);
        let done = self.done.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let label = format!(
            "{done}/{total} catalogs  {failed} failed  {:.1}s",
            self.started.elapsed().as_secs_f64()
        );
        let ratio = gauge_ratio(done, total);
        if let Ok(mut terminal) = self.terminal.lock() {
            let drawn = terminal.draw(|frame| {
                let gauge = Gauge::default()
                    .gauge_style(Style::default().fg(Color::Cyan))
                    .ratio(ratio)
                    .label(label);
                frame.render_widget(gauge, frame.area());
            });
            if let Err(err) = drawn {
                tracing::debug!(error = %err, "progress redraw failed");
            }
        }
    }
}

impl ProgressSink for GaugeReporter {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.draw();
    }

    fn task_finished(&self, report: &TaskReport) {
        if report.outcome.is_failed() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.done.fetch_add(1, Ordering::Relaxed);
        self.draw();
    }

    fn finish(&self) {
        self.draw();
        if let Ok(mut terminal) = self.terminal.lock() {
            let _ = terminal.show_cursor();
        }
        eprintln!();
    }

    fn kind(&self) -> ReporterKind {
        ReporterKind::Gauge
    }
}

/// Gauge if the terminal supports it, otherwise silence.
pub fn select_reporter(enhanced: bool) -> Box<dyn ProgressSink> {
    select_reporter_with(enhanced, io::stderr().is_tty())
}

/// Same as [`select_reporter`] with the terminal check supplied by the caller.
pub fn select_reporter_with(enhanced: bool, terminal: bool) -> Box<dyn ProgressSink> {
    if !enhanced || !terminal {
        return Box::new(SilentReporter);
    }
    match GaugeReporter::new() {
        Ok(gauge) => Box::new(gauge),
        Err(err) => {
            tracing::debug!(error = %err, "falling back to silent progress");
            Box::new(SilentReporter)
        }
    }
}

fn gauge_ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (done as f64 / total as f64).clamp(0.0, 1.0)
}
