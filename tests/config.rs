use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use sky_catalog_fetch::config::{Config, ConfigLoader, ConfigOverrides, RowLimit};
use sky_catalog_fetch::error::CatalogError;

#[test]
fn file_values_apply_and_cli_wins() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("skycat.json");
    std::fs::write(
        &path,
        r#"{ "workers": 8, "folder": "out", "limit": 5, "overwrite": true, "request_timeout_secs": 20 }"#,
    )
    .unwrap();

    let config = ConfigLoader::resolve(path.to_str()).unwrap();
    let overrides = ConfigOverrides {
        workers: Some(3),
        ..Default::default()
    };
    let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();

    assert_eq!(resolved.workers, 3);
    assert_eq!(resolved.folder, Utf8PathBuf::from("out"));
    assert_eq!(resolved.limit, RowLimit::First(5));
    assert!(resolved.overwrite);
    assert_eq!(resolved.request_timeout, Some(Duration::from_secs(20)));
}

#[test]
fn explicit_missing_file_is_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/skycat.json")).unwrap_err();
    assert_matches!(err, CatalogError::ConfigRead(_));
}

#[test]
fn malformed_file_is_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("skycat.json");
    std::fs::write(&path, "{ workers: ").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, CatalogError::ConfigParse(_));
}

#[test]
fn zero_workers_rejected() {
    let overrides = ConfigOverrides {
        workers: Some(0),
        ..Default::default()
    };
    let err = ConfigLoader::resolve_config(Config::default(), overrides).unwrap_err();
    assert_matches!(err, CatalogError::InvalidWorkerCount(0));
}

#[test]
fn row_limit_bounds() {
    assert_eq!(RowLimit::All.apply(7), 7);
    assert_eq!(RowLimit::First(3).apply(7), 3);
    assert_eq!(RowLimit::First(30).apply(7), 7);
}

#[test]
fn verbose_from_file_raises_log_level() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("skycat.json");
    std::fs::write(&path, r#"{ "verbose": true }"#).unwrap();

    let config = ConfigLoader::resolve(path.to_str()).unwrap();
    let resolved = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap();

    assert!(resolved.verbose);
    assert_eq!(resolved.log_level(), "info");

    let quiet = ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
    assert_eq!(quiet.log_level(), "warn");
}
