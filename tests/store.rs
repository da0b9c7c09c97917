use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use sky_catalog_fetch::domain::CoordinateRecord;
use sky_catalog_fetch::error::CatalogError;
use sky_catalog_fetch::store::{ExistenceGuard, GuardDecision, OutputLayout, commit, staging_file};

fn temp_folder() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let folder = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, folder)
}

#[test]
fn missing_folder_fails_fast() {
    let (_temp, folder) = temp_folder();
    let err = OutputLayout::new(folder.join("catalogs")).unwrap_err();
    assert_matches!(err, CatalogError::MissingFolder(_));
    assert!(err.is_configuration());
}

#[test]
fn file_is_not_a_folder() {
    let (_temp, folder) = temp_folder();
    let file = folder.join("plain.txt");
    std::fs::write(file.as_std_path(), b"x").unwrap();
    assert_matches!(
        OutputLayout::new(file),
        Err(CatalogError::MissingFolder(_))
    );
}

#[test]
fn default_and_named_paths() {
    let (_temp, folder) = temp_folder();
    let layout = OutputLayout::new(folder.clone()).unwrap();

    let unnamed = CoordinateRecord::new(150.0, 2.0).with_size(0.03);
    assert_eq!(layout.path_for(&unnamed), folder.join("150.0_2.0.fits"));

    let negative = CoordinateRecord::new(10.0, -5.0);
    assert_eq!(layout.path_for(&negative), folder.join("10.0_-5.0.fits"));

    let named = CoordinateRecord::new(10.0, -5.0).with_name("ngc1300.fits");
    assert_eq!(layout.path_for(&named), folder.join("ngc1300.fits"));
}

#[test]
fn guard_respects_overwrite() {
    let (_temp, folder) = temp_folder();
    let path = folder.join("150.0_2.0.fits");
    assert_eq!(ExistenceGuard::check(&path, false), GuardDecision::Proceed);

    std::fs::write(path.as_std_path(), b"catalog").unwrap();
    assert_eq!(ExistenceGuard::check(&path, false), GuardDecision::Skip);
    assert_eq!(ExistenceGuard::check(&path, true), GuardDecision::Proceed);
}

#[test]
fn guard_ignores_directories() {
    let (_temp, folder) = temp_folder();
    let path = folder.join("odd.fits");
    std::fs::create_dir(path.as_std_path()).unwrap();
    assert_eq!(ExistenceGuard::check(&path, false), GuardDecision::Proceed);
}

#[test]
fn staged_file_only_appears_on_commit() {
    let (_temp, folder) = temp_folder();
    let dest = folder.join("target.fits");

    let abandoned = staging_file(&dest).unwrap();
    std::fs::write(abandoned.path(), b"partial").unwrap();
    drop(abandoned);
    assert!(!dest.as_std_path().exists());

    let staged = staging_file(&dest).unwrap();
    std::fs::write(staged.path(), b"complete").unwrap();
    commit(staged, &dest).unwrap();
    assert_eq!(std::fs::read(dest.as_std_path()).unwrap(), b"complete");
    assert_eq!(std::fs::read_dir(folder.as_std_path()).unwrap().count(), 1);
}
