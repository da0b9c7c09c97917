use std::fs;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const DEFAULT_WORKERS: usize = 25;
pub const DEFAULT_INPUT: &str = "cutout_list.txt";
pub const DEFAULT_FOLDER: &str = "/catalogs";
pub const DEFAULT_ENDPOINT: &str = "https://www.legacysurvey.org/viewer/ls-dr9";
pub const CONFIG_FILE: &str = "skycat.json";

/// On-disk options file. Every field is optional; missing fields fall back
/// to the built-in defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub header: Option<bool>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line; they win over the options file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub input: Option<String>,
    pub header: Option<bool>,
    pub folder: Option<String>,
    pub overwrite: Option<bool>,
    pub verbose: Option<bool>,
    pub limit: Option<i64>,
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RowLimit {
    #[default]
    All,
    First(usize),
}

impl RowLimit {
    /// Zero and negative values (the legacy `-10` sentinel included) mean all rows.
    pub fn from_signed(value: i64) -> Self {
        if value <= 0 {
            RowLimit::All
        } else {
            RowLimit::First(value as usize)
        }
    }

    pub fn apply(self, len: usize) -> usize {
        match self {
            RowLimit::All => len,
            RowLimit::First(limit) => limit.min(len),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub workers: usize,
    pub input: Utf8PathBuf,
    pub header: bool,
    pub folder: Utf8PathBuf,
    pub overwrite: bool,
    pub verbose: bool,
    pub limit: RowLimit,
    pub endpoint: String,
    /// `None` keeps whatever deadline the HTTP transport applies by default.
    pub request_timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            input: Utf8PathBuf::from(DEFAULT_INPUT),
            header: false,
            folder: Utf8PathBuf::from(DEFAULT_FOLDER),
            overwrite: false,
            verbose: false,
            limit: RowLimit::All,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
        }
    }
}

impl FetchConfig {
    /// Default tracing filter: `info` in verbose mode, `warn` otherwise.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "info" } else { "warn" }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.workers == 0 {
            return Err(CatalogError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads the options file. An explicit path must exist; the default
    /// `skycat.json` is optional.
    pub fn resolve(path: Option<&str>) -> Result<Config, CatalogError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.as_std_path().exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| CatalogError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<FetchConfig, CatalogError> {
        let defaults = FetchConfig::default();

        let limit = overrides
            .limit
            .or(config.limit)
            .map(RowLimit::from_signed)
            .unwrap_or(defaults.limit);

        let resolved = FetchConfig {
            workers: overrides
                .workers
                .or(config.workers)
                .unwrap_or(defaults.workers),
            input: overrides
                .input
                .or(config.input)
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.input),
            header: overrides.header.or(config.header).unwrap_or(defaults.header),
            folder: overrides
                .folder
                .or(config.folder)
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.folder),
            overwrite: overrides
                .overwrite
                .or(config.overwrite)
                .unwrap_or(defaults.overwrite),
            verbose: overrides
                .verbose
                .or(config.verbose)
                .unwrap_or(defaults.verbose),
            limit,
            endpoint: overrides
                .endpoint
                .or(config.endpoint)
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.endpoint),
            request_timeout: overrides
                .request_timeout_secs
                .or(config.request_timeout_secs)
                .map(Duration::from_secs),
        };

        resolved.validate()?;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.workers, 25);
        assert_eq!(resolved.folder, Utf8PathBuf::from("/catalogs"));
        assert_eq!(resolved.limit, RowLimit::All);
        assert!(!resolved.overwrite);
        assert!(resolved.request_timeout.is_none());
    }

    #[test]
    fn legacy_sentinel_means_all_rows() {
        assert_eq!(RowLimit::from_signed(-10), RowLimit::All);
        assert_eq!(RowLimit::from_signed(0), RowLimit::All);
        assert_eq!(RowLimit::from_signed(3), RowLimit::First(3));
    }
}
