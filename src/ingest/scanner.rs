use std::fs;
use std::path::{Path, PathBuf};

use crossbeam::channel::Sender;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{IndexError, Result};
use crate::ingest::inspector::{FileInspector, FileRecord};
use crate::utils::config::IndexOptions;

/// A file that could not be turned into a record.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: IndexError,
}

#[derive(Debug, Default)]
pub struct WalkReport {
    pub records: Vec<FileRecord>,
    pub failures: Vec<FileFailure>,
}

/// Fails before any file is touched when `root` is not an existing, readable
/// directory. Returns the canonical root.
pub fn validate_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(IndexError::Configuration(format!(
            "The folder '{}' does not exist or is not a directory.",
            root.display()
        )));
    }
    let canonical = fs::canonicalize(root).map_err(|e| {
        IndexError::Configuration(format!("Cannot resolve folder '{}': {}", root.display(), e))
    })?;
    fs::read_dir(&canonical).map_err(|e| {
        IndexError::Configuration(format!("Cannot read folder '{}': {}", canonical.display(), e))
    })?;
    Ok(canonical)
}

/// Walks `root` and sends every regular file path, or the walk error for an
/// entry that could not be read. Stops early if the receiver is gone.
pub fn scan_directory(
    root: &Path,
    options: &IndexOptions,
    tx: Sender<std::result::Result<PathBuf, FileFailure>>,
) -> Result<()> {
    for item in walk(root, options) {
        if tx.send(item).is_err() {
            break;
        }
    }
    Ok(())
}

/// Sequential walk: inspect each regular file in turn.
pub fn index_folder(
    root: &Path,
    options: &IndexOptions,
    inspector: &FileInspector,
) -> Result<WalkReport> {
    let root = validate_root(root)?;
    info!("Indexing {:?}", root);

    let report = inspect_all(walk(&root, options), inspector);
    info!(
        "Indexed {} files, {} failures",
        report.records.len(),
        report.failures.len()
    );
    Ok(report)
}

fn inspect_all<I>(items: I, inspector: &FileInspector) -> WalkReport
where
    I: IntoIterator<Item = std::result::Result<PathBuf, FileFailure>>,
{
    let mut report = WalkReport::default();
    for item in items {
        let outcome = item.and_then(|path| {
            inspector
                .inspect(&path)
                .map_err(|error| FileFailure { path, error })
        });
        match outcome {
            Ok(record) => report.records.push(record),
            Err(failure) => {
                warn!("Skipping {:?}: {}", failure.path, failure.error);
                report.failures.push(failure);
            }
        }
    }
    report
}

fn walk<'a>(
    root: &'a Path,
    options: &IndexOptions,
) -> impl Iterator<Item = std::result::Result<PathBuf, FileFailure>> + 'a {
    let mut walker = WalkDir::new(root).follow_links(false);
    if options.sort_by_name {
        walker = walker.sort_by_file_name();
    }
    let skip_hidden = options.skip_hidden;

    walker
        .into_iter()
        .filter_entry(move |e| !(skip_hidden && e.depth() > 0 && is_hidden(e)))
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                let error = IndexError::io(&path, err.into());
                Some(Err(FileFailure { path, error }))
            }
        })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use tempfile::tempdir;

    fn tree() -> anyhow::Result<tempfile::TempDir> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("2021/trip"))?;
        fs::create_dir_all(dir.path().join(".cache"))?;
        fs::write(dir.path().join("b.jpg"), b"b")?;
        fs::write(dir.path().join("2021/a.mp4"), b"a")?;
        fs::write(dir.path().join("2021/trip/IMG_20210704_101010.jpg"), b"c")?;
        fs::write(dir.path().join(".cache/thumb.png"), b"d")?;
        Ok(dir)
    }

    #[test]
    fn test_validate_root_rejects_missing_and_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x")?;

        assert!(matches!(
            validate_root(&dir.path().join("nope")),
            Err(IndexError::Configuration(_))
        ));
        assert!(matches!(validate_root(&file), Err(IndexError::Configuration(_))));
        assert!(validate_root(dir.path())?.is_absolute());
        Ok(())
    }

    #[test]
    fn test_index_folder_finds_nested_files() -> anyhow::Result<()> {
        let dir = tree()?;
        let report = index_folder(dir.path(), &IndexOptions::default(), &FileInspector::default())?;
        assert_eq!(report.records.len(), 4);
        assert!(report.failures.is_empty());
        Ok(())
    }

    #[test]
    fn test_skip_hidden_and_sorted_order() -> anyhow::Result<()> {
        let dir = tree()?;
        let options = IndexOptions {
            skip_hidden: true,
            sort_by_name: true,
            ..IndexOptions::default()
        };
        let report = index_folder(dir.path(), &options, &FileInspector::default())?;
        let names: Vec<_> = report.records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["a.mp4", "IMG_20210704_101010.jpg", "b.jpg"]);
        Ok(())
    }

    #[test]
    fn test_failures_do_not_stop_the_walk() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("good_one.jpg"), b"1")?;
        fs::write(dir.path().join("good_two.mov"), b"2")?;
        fs::write(dir.path().join("20211399_000000.jpg"), b"3")?;

        let report = index_folder(dir.path(), &IndexOptions::default(), &FileInspector::default())?;
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, IndexError::Validation { .. }));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_isolated() -> anyhow::Result<()> {
        use std::fs::File;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        fs::write(dir.path().join("one.jpg"), b"1")?;
        fs::write(dir.path().join("two.jpg"), b"2")?;
        let locked = dir.path().join("locked.jpg");
        fs::write(&locked, b"3")?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        // privileged users can still read it; the removal test covers them
        if File::open(&locked).is_ok() {
            eprintln!("skipping permission check: {:?} is readable by this user", locked);
            return Ok(());
        }

        let report = index_folder(dir.path(), &IndexOptions::default(), &FileInspector::default())?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, IndexError::Io { .. }));
        Ok(())
    }

    #[test]
    fn test_file_removed_after_walk_is_isolated() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("one.jpg"), b"1")?;
        fs::write(dir.path().join("two.jpg"), b"2")?;
        let removed = dir.path().join("gone.jpg");
        fs::write(&removed, b"3")?;

        let options = IndexOptions::default();
        let walked: Vec<_> = walk(dir.path(), &options).collect();
        assert_eq!(walked.len(), 3);
        fs::remove_file(&removed)?;

        let report = inspect_all(walked, &FileInspector::default());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, removed);
        assert!(matches!(report.failures[0].error, IndexError::Io { .. }));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_is_configuration_error() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let root = dir.path().join("src");
        fs::create_dir(&root)?;
        fs::write(root.join("a.jpg"), b"a")?;
        fs::set_permissions(&root, fs::Permissions::from_mode(0o000))?;

        let readable = fs::read_dir(&root).is_ok();
        let validated = validate_root(&root);
        let indexed = index_folder(&root, &IndexOptions::default(), &FileInspector::default());
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755))?;

        if readable {
            eprintln!("skipping permission check: {:?} is readable by this user", root);
            return Ok(());
        }
        assert!(matches!(validated, Err(IndexError::Configuration(_))));
        assert!(matches!(indexed, Err(IndexError::Configuration(_))));
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_isolated() -> anyhow::Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir()?;
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xff.jpg")), b"same")?;
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xfe.jpg")), b"same")?;
        fs::write(dir.path().join("fine.jpg"), b"fine")?;

        let report = index_folder(dir.path(), &IndexOptions::default(), &FileInspector::default())?;
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].filename, "fine.jpg");
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, IndexError::Io { .. })));
        Ok(())
    }

    #[test]
    fn test_scan_directory_sends_paths() -> anyhow::Result<()> {
        let dir = tree()?;
        let (tx, rx) = unbounded();
        scan_directory(dir.path(), &IndexOptions::default(), tx)?;
        let paths: Vec<PathBuf> = rx.iter().filter_map(|item| item.ok()).collect();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.is_file()));
        Ok(())
    }
}
