use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;

use crate::domain::{CoordinateRecord, format_coord};
use crate::error::CatalogError;

/// Where catalogs land on disk. Constructing one checks the folder once for
/// the whole batch.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    folder: Utf8PathBuf,
}

impl OutputLayout {
    pub fn new(folder: impl Into<Utf8PathBuf>) -> Result<Self, CatalogError> {
        let folder = folder.into();
        if !folder.as_std_path().is_dir() {
            return Err(CatalogError::MissingFolder(folder));
        }
        Ok(Self { folder })
    }

    pub fn folder(&self) -> &Utf8Path {
        &self.folder
    }

    pub fn path_for(&self, record: &CoordinateRecord) -> Utf8PathBuf {
        self.folder.join(file_name(record.ra, record.dec, record.label()))
    }

    /// Returns the first path produced by more than one record.
    pub fn find_collision<'a, I>(paths: I) -> Option<&'a Utf8Path>
    where
        I: IntoIterator<Item = &'a Utf8PathBuf>,
    {
        let mut seen = HashSet::new();
        paths
            .into_iter()
            .find(|path| !seen.insert(path.as_path()))
            .map(|path| path.as_path())
    }
}

/// `{ra}_{dec}.fits` unless the record carries its own label.
pub fn file_name(ra: f64, dec: f64, name: &str) -> String {
    if name.is_empty() {
        format!("{}_{}.fits", format_coord(ra), format_coord(dec))
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Skip,
    Proceed,
}

pub struct ExistenceGuard;

impl ExistenceGuard {
    /// Not atomic with the write that follows; two workers aimed at the same
    /// path can both see `Proceed`.
    pub fn check(path: &Utf8Path, overwrite: bool) -> GuardDecision {
        if !overwrite && path.as_std_path().is_file() {
            GuardDecision::Skip
        } else {
            GuardDecision::Proceed
        }
    }
}

/// Temp file next to `dest`, so the final rename stays on one filesystem.
/// Dropping it without [`commit`] removes it.
pub fn staging_file(dest: &Utf8Path) -> Result<NamedTempFile, CatalogError> {
    let parent = dest
        .parent()
        .ok_or_else(|| CatalogError::Filesystem("invalid destination path".to_string()))?;
    tempfile::Builder::new()
        .prefix(".skycat-")
        .suffix(".part")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| CatalogError::Filesystem(format!("stage {dest}: {err}")))
}

pub fn commit(staged: NamedTempFile, dest: &Utf8Path) -> Result<(), CatalogError> {
    staged
        .persist(dest.as_std_path())
        .map_err(|err| CatalogError::Filesystem(format!("persist {dest}: {}", err.error)))?;
    Ok(())
}
