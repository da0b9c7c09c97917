//! Fan-out of fetch tasks over a fixed-size worker pool.
//!
//! Every submitted task produces exactly one [`TaskReport`]; a failing or
//! panicking task never cancels its siblings and the batch has no early exit.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use camino::Utf8PathBuf;
use rayon::prelude::*;
use serde::Serialize;

use crate::client::CatalogClient;
use crate::config::RowLimit;
use crate::domain::CoordinateRecord;
use crate::error::CatalogError;
use crate::fetch::{FetchOutcome, FetchTask, Fetcher};
use crate::progress::ProgressSink;
use crate::store::OutputLayout;

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub index: usize,
    pub ra: f64,
    pub dec: f64,
    pub path: Utf8PathBuf,
    pub outcome: FetchOutcome,
}

/// Outcomes of one batch, ordered by the index of the originating record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub reports: Vec<TaskReport>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, FetchOutcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FetchOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(FetchOutcome::is_failed)
    }

    pub fn outcome_for(&self, index: usize) -> Option<&FetchOutcome> {
        self.reports
            .iter()
            .find(|report| report.index == index)
            .map(|report| &report.outcome)
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| pred(&report.outcome))
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Result<Self, CatalogError> {
        if workers == 0 {
            return Err(CatalogError::InvalidWorkerCount(workers));
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// One task per record, truncated to `limit`. Fails if two records would
    /// write the same file.
    pub fn build_tasks(
        records: &[CoordinateRecord],
        layout: &OutputLayout,
        overwrite: bool,
        limit: RowLimit,
    ) -> Result<Vec<FetchTask>, CatalogError> {
        let count = limit.apply(records.len());
        let tasks: Vec<FetchTask> = records[..count]
            .iter()
            .enumerate()
            .map(|(index, record)| FetchTask::from_record(index, record, layout, overwrite))
            .collect();

        if let Some(path) = OutputLayout::find_collision(tasks.iter().map(|task| &task.output_path))
        {
            return Err(CatalogError::PathCollision(path.to_path_buf()));
        }
        Ok(tasks)
    }

    pub fn run<C: CatalogClient>(
        &self,
        tasks: Vec<FetchTask>,
        fetcher: &Fetcher<C>,
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult, CatalogError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("skycat-worker-{idx}"))
            .build()
            .map_err(|err| CatalogError::WorkerPool(err.to_string()))?;

        tracing::info!(tasks = tasks.len(), workers = self.workers, "dispatching batch");
        let total = tasks.len();
        notify("start", || sink.start(total));

        let mut reports: Vec<TaskReport> = pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| {
                    let outcome = run_isolated(fetcher, &task);
                    let report = TaskReport {
                        index: task.index,
                        ra: task.ra,
                        dec: task.dec,
                        path: task.output_path,
                        outcome,
                    };
                    notify("task_finished", || sink.task_finished(&report));
                    report
                })
                .collect()
        });
        reports.sort_by_key(|report| report.index);

        notify("finish", || sink.finish());
        let result = BatchResult { reports };
        tracing::info!(
            downloaded = result.downloaded(),
            skipped = result.skipped(),
            failed = result.failed(),
            "batch finished"
        );
        Ok(result)
    }
}

fn run_isolated<C: CatalogClient>(fetcher: &Fetcher<C>, task: &FetchTask) -> FetchOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| fetcher.run(task))).unwrap_or_else(|payload| {
        let error = format!("worker panicked: {}", panic_message(payload.as_ref()));
        tracing::warn!(ra = task.ra, dec = task.dec, %error, "catalog task aborted");
        FetchOutcome::Failed { error }
    })
}

/// Progress output is best effort: a sink that panics (a closed stdout, a
/// broken terminal) loses its display but never the batch.
fn notify(event: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        tracing::warn!(
            event,
            error = %panic_message(payload.as_ref()),
            "progress sink panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
