use camino::Utf8PathBuf;
use serde::Serialize;

use crate::client::CatalogClient;
use crate::domain::{BoundingBox, CoordinateRecord};
use crate::error::CatalogError;
use crate::store::{self, ExistenceGuard, GuardDecision, OutputLayout};

/// One unit of work: a cutout footprint and the file it should end up in.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTask {
    /// Position of the originating record in the input list.
    pub index: usize,
    pub ra: f64,
    pub dec: f64,
    pub bbox: BoundingBox,
    pub output_path: Utf8PathBuf,
    pub overwrite: bool,
}

impl FetchTask {
    pub fn from_record(
        index: usize,
        record: &CoordinateRecord,
        layout: &OutputLayout,
        overwrite: bool,
    ) -> Self {
        Self {
            index,
            ra: record.ra,
            dec: record.dec,
            bbox: record.bounding_box(),
            output_path: layout.path_for(record),
            overwrite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Skipped,
    Downloaded { bytes: u64 },
    Failed { error: String },
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

pub struct Fetcher<C: CatalogClient> {
    client: C,
}

impl<C: CatalogClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Never returns an error: network and disk failures end up in
    /// [`FetchOutcome::Failed`].
    pub fn run(&self, task: &FetchTask) -> FetchOutcome {
        if ExistenceGuard::check(&task.output_path, task.overwrite) == GuardDecision::Skip {
            tracing::debug!(path = %task.output_path, "catalog already exists");
            return FetchOutcome::Skipped;
        }

        match self.download(task) {
            Ok(bytes) => {
                tracing::debug!(path = %task.output_path, bytes, "catalog downloaded");
                FetchOutcome::Downloaded { bytes }
            }
            Err(err) => {
                tracing::warn!(ra = task.ra, dec = task.dec, error = %err, "catalog failed to download");
                FetchOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    fn download(&self, task: &FetchTask) -> Result<u64, CatalogError> {
        let staged = store::staging_file(&task.output_path)?;
        let bytes = self.client.download_catalog(&task.bbox, staged.path())?;
        store::commit(staged, &task.output_path)?;
        Ok(bytes)
    }
}
