//! Input/output locations, catalog loading and logger setup.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use shiplog_core::{SiteCatalog, StdFileSystem};

use crate::CliResult;

/// Changelog location below `HOME`.
pub(crate) const DEFAULT_SHIPLOG: &str = ".mirrordna/SHIPLOG.md";
/// Site checkout below `HOME`.
pub(crate) const DEFAULT_SITE_DIR: &str = "repos/MirrorDNA-Docs";
/// Change feed below `HOME`.
pub(crate) const DEFAULT_FEED: &str = ".mirrordna/bus/changelog.jsonl";

/// Use `explicit` when given, otherwise `relative` below `HOME`.
pub(crate) fn home_path(explicit: Option<PathBuf>, relative: &str) -> CliResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home).join(relative));
        }
    }
    Err(format!("unable to resolve ~/{relative}: HOME is not set").into())
}

/// Load the catalog at `path`, or the built-in one.
pub(crate) fn load_catalog(path: Option<&Path>) -> CliResult<SiteCatalog> {
    match path {
        Some(path) => {
            let catalog = SiteCatalog::load(&StdFileSystem::new(), path)?;
            log::info!(
                "loaded catalog {} ({} categories)",
                path.display(),
                catalog.categories.len()
            );
            Ok(catalog)
        }
        None => Ok(SiteCatalog::default()),
    }
}

/// Current moment, moved onto `today` when a date override is given.
pub(crate) fn run_moment(today: Option<NaiveDate>) -> DateTime<FixedOffset> {
    let now = Local::now().fixed_offset();
    match today {
        Some(date) => date
            .and_time(now.time())
            .and_local_timezone(*now.offset())
            .single()
            .unwrap_or(now),
        None => now,
    }
}

/// Initialise `env_logger`, appending to `log_file` when given.
pub(crate) fn init_logging(log_file: Option<&Path>) -> CliResult<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock")
    }

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let prev = std::env::var(key).ok();
            match value {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(prev) = self.prev.take() {
                unsafe { std::env::set_var(self.key, prev) };
            } else {
                unsafe { std::env::remove_var(self.key) };
            }
        }
    }

    #[test]
    fn home_path_prefers_explicit_path() {
        let path = home_path(Some(PathBuf::from("/tmp/SHIPLOG.md")), DEFAULT_SHIPLOG).expect("path");
        assert_eq!(path, PathBuf::from("/tmp/SHIPLOG.md"));
    }

    #[test]
    fn home_path_uses_home() {
        let _lock = env_lock();
        let _guard = EnvGuard::set("HOME", Some("/tmp/home"));
        let path = home_path(None, DEFAULT_FEED).expect("path");
        assert_eq!(path, PathBuf::from("/tmp/home/.mirrordna/bus/changelog.jsonl"));
    }

    #[test]
    fn home_path_requires_home() {
        let _lock = env_lock();
        let _guard = EnvGuard::set("HOME", None);
        let err = home_path(None, DEFAULT_SITE_DIR).expect_err("missing home");
        assert!(err.to_string().contains("HOME is not set"));
    }

    #[test]
    fn missing_catalog_path_uses_builtin_catalog() {
        let catalog = load_catalog(None).expect("catalog");
        assert_eq!(catalog, SiteCatalog::default());
    }

    #[test]
    fn missing_catalog_file_is_an_error() {
        let err = load_catalog(Some(Path::new("/definitely/not/here/catalog.json")))
            .expect_err("missing catalog");
        assert!(err.to_string().contains("input not found"));
    }

    #[test]
    fn run_moment_honours_date_override() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 24).expect("date");
        assert_eq!(run_moment(Some(date)).date_naive(), date);
    }
}
