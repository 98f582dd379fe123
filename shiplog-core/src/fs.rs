//! Filesystem abstractions used by generation and link checking.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::warn;

use crate::error::Result;

/// Abstraction over filesystem access for testability.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// List all files reachable from the root path.
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>>;
    /// Read a file into a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Read a file's raw bytes.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;
    /// Replace the contents of a file, creating parent directories as needed.
    fn write_string(&self, path: &Path, contents: &str) -> Result<()>;
    /// Check whether a path exists. Errors when existence cannot be determined.
    fn exists(&self, path: &Path) -> Result<bool>;
    /// Size and modification time of a file.
    fn stamp(&self, path: &Path) -> Result<FileStamp>;
}

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    /// Length in bytes.
    pub len: u64,
    /// Last modification, when the platform reports one.
    pub modified: Option<SystemTime>,
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone)]
pub struct StdFileSystem {
    pruned_dirs: Vec<String>,
}

impl StdFileSystem {
    /// Create a new standard filesystem adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter whose directory walks skip directories with these names.
    pub fn pruning<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pruned_dirs: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Walk from `root`, skipping subdirectories that cannot be listed.
    fn walk<R>(&self, root: &Path, mut read_dir: R) -> Result<Vec<PathBuf>>
    where
        R: FnMut(&Path) -> io::Result<Vec<(PathBuf, EntryKind)>>,
    {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = match read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if dir.as_path() != root => {
                    warn!("skipping unreadable directory {}: {err}", dir.display());
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            for (path, kind) in entries {
                match kind {
                    EntryKind::Dir if !self.is_pruned(&path) => pending.push(path),
                    EntryKind::File => files.push(path),
                    _ => {}
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn is_pruned(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.pruned_dirs.iter().any(|pruned| pruned == name))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Other,
}

fn read_entries(dir: &Path) -> io::Result<Vec<(PathBuf, EntryKind)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping entry in {}: {err}", dir.display());
                continue;
            }
        };
        let kind = match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => EntryKind::Dir,
            Ok(file_type) if file_type.is_file() => EntryKind::File,
            Ok(_) => EntryKind::Other,
            Err(err) => {
                warn!("skipping {}: {err}", entry.path().display());
                continue;
            }
        };
        entries.push((entry.path(), kind));
    }
    Ok(entries)
}

impl FileSystem for StdFileSystem {
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        self.walk(root, read_entries)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(path.try_exists()?)
    }

    fn stamp(&self, path: &Path) -> Result<FileStamp> {
        let metadata = std::fs::metadata(path)?;
        Ok(FileStamp {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryKind, StdFileSystem};
    use crate::fs::FileSystem;
    use std::io;
    use std::path::{Path, PathBuf};

    #[test]
    fn std_filesystem_lists_and_reads_files() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("create temp dir");
        let file_path = root.join("hello.md");
        std::fs::write(&file_path, "hello shiplog").expect("write test file");

        let fs = StdFileSystem::new();
        let files = fs.list_files(&root).expect("list files");
        assert_eq!(files, vec![file_path.clone()]);

        let contents = fs.read_to_string(&file_path).expect("read file");
        assert_eq!(contents, "hello shiplog");

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[test]
    fn pruned_directories_are_not_walked() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(root.join("node_modules/pkg")).expect("create pruned dir");
        std::fs::create_dir_all(root.join("docs")).expect("create docs dir");
        std::fs::write(root.join("node_modules/pkg/README.md"), "skip").expect("write");
        std::fs::write(root.join("docs/guide.md"), "keep").expect("write");

        let fs = StdFileSystem::pruning(["node_modules"]);
        let files = fs.list_files(&root).expect("list files");

        assert_eq!(files, vec![root.join("docs/guide.md")]);

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[test]
    fn write_string_creates_parents_and_replaces_contents() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let page = root.join("story/index.html");

        let fs = StdFileSystem::new();
        fs.write_string(&page, "first").expect("first write");
        fs.write_string(&page, "second").expect("second write");

        assert_eq!(std::fs::read_to_string(&page).expect("read"), "second");
        assert!(fs.exists(&page).expect("exists"));
        assert!(!fs.exists(&root.join("missing.html")).expect("exists"));

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[test]
    fn unreadable_subdirectory_is_skipped() {
        let fs = StdFileSystem::new();
        let files = fs
            .walk(Path::new("/docs"), |dir| {
                if dir == Path::new("/docs") {
                    Ok(vec![
                        (PathBuf::from("/docs/locked"), EntryKind::Dir),
                        (PathBuf::from("/docs/open"), EntryKind::Dir),
                        (PathBuf::from("/docs/README.md"), EntryKind::File),
                    ])
                } else if dir == Path::new("/docs/open") {
                    Ok(vec![(PathBuf::from("/docs/open/guide.md"), EntryKind::File)])
                } else {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
            })
            .expect("walk");

        assert_eq!(
            files,
            vec![
                PathBuf::from("/docs/README.md"),
                PathBuf::from("/docs/open/guide.md")
            ]
        );
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let fs = StdFileSystem::new();
        let result = fs.walk(Path::new("/docs"), |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn stamp_reports_file_length() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("create root");
        let path = root.join("SHIPLOG.md");
        std::fs::write(&path, "## Core\n").expect("write");

        let stamp = StdFileSystem::new().stamp(&path).expect("stamp");

        assert_eq!(stamp.len, 8);
        assert!(StdFileSystem::new().stamp(&root.join("absent.md")).is_err());

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn read_bytes_returns_raw_contents() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("create temp dir");
        let path = root.join("latin1.md");
        std::fs::write(&path, b"caf\xe9").expect("write");

        let fs = StdFileSystem::new();
        assert_eq!(fs.read_bytes(&path).expect("bytes"), b"caf\xe9".to_vec());
        assert!(fs.read_to_string(&path).is_err());

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    fn unique_dir_name() -> PathBuf {
        static COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        PathBuf::from(format!("shiplog_core_fs_test_{nanos}_{counter}"))
    }
}
