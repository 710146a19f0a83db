use std::fs;

use date_sort::{index_folder, Catalog, FileInspector, IndexError, IndexOptions, MediaType};
use tempfile::tempdir;

#[test]
fn test_walk_then_catalog_tracks_duplicates() -> anyhow::Result<()> {
    let source = tempdir()?;
    let dest = tempdir()?;
    fs::create_dir_all(source.path().join("phone/burst"))?;
    fs::write(source.path().join("phone/IMG_20190830_214259.jpg"), b"sunset")?;
    fs::write(source.path().join("phone/burst/IMG_20190830_214259_1.jpg"), b"sunset")?;
    fs::write(source.path().join("2021-10-12 12.30.45_party.mp4"), b"party")?;
    fs::write(source.path().join("notes.txt"), b"todo")?;
    fs::write(source.path().join("20211312_123045.jpg"), b"broken name")?;

    let options = IndexOptions {
        sort_by_name: true,
        ..IndexOptions::default()
    };
    let report = index_folder(source.path(), &options, &FileInspector::default())?;
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, IndexError::Validation { .. }));

    let notes = report.records.iter().find(|r| r.filename == "notes.txt").unwrap();
    assert_eq!(notes.media_type, MediaType::Unknown);
    assert_eq!(notes.filename_timestamp, None);

    let db = dest.path().join("sorted.db");
    let mut catalog = Catalog::open(&db)?;
    catalog.initialize()?;
    for record in &report.records {
        catalog.insert(record)?;
    }

    let sunset = report
        .records
        .iter()
        .find(|r| r.filename == "IMG_20190830_214259.jpg")
        .unwrap();
    let burst = report
        .records
        .iter()
        .find(|r| r.filename == "IMG_20190830_214259_1.jpg")
        .unwrap();
    assert_eq!(sunset.content_fingerprint, burst.content_fingerprint);
    assert_eq!(sunset.filename_timestamp, burst.filename_timestamp);

    // byte-order sort puts "IMG_..." ahead of the "burst" directory
    let first = catalog.first_entry(&sunset.content_fingerprint)?.unwrap();
    let dupes = catalog.duplicates_of(&sunset.content_fingerprint)?.unwrap();
    assert_eq!(dupes.len(), 1);
    assert_ne!(first.path, dupes[0].path);
    assert_eq!(first.filename, "IMG_20190830_214259.jpg");
    assert_eq!(dupes[0].filename, "IMG_20190830_214259_1.jpg");

    let party = report.records.iter().find(|r| r.media_type == MediaType::Video).unwrap();
    assert_eq!(catalog.duplicates_of(&party.content_fingerprint)?, None);

    let stats = catalog.stats()?;
    assert_eq!((stats.files, stats.duplicates), (4, 1));
    catalog.close()?;

    // a second run over the same tree appends, it does not deduplicate by path
    let mut catalog_again = Catalog::open(&db)?;
    catalog_again.initialize()?;
    for record in &report.records {
        catalog_again.insert(record)?;
    }
    let stats = catalog_again.stats()?;
    assert_eq!((stats.files, stats.duplicates), (8, 5));
    Ok(())
}

#[test]
fn test_missing_root_is_configuration_error() {
    let err = index_folder(
        std::path::Path::new("/no/such/source"),
        &IndexOptions::default(),
        &FileInspector::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IndexError::Configuration(_)));
}
