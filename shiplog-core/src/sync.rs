//! Regenerate the site and publish it when the output changed.
//!
//! A sync run checks the changelog exists, regenerates every page, asks the
//! version-control backend whether anything changed, and if so commits,
//! pushes and appends a record to the change feed. There is no retry and no
//! rollback: a failed commit or push leaves the generated files in place.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use log::{debug, info, warn};
use serde::Serialize;

use crate::catalog::SiteCatalog;
use crate::error::{Result, ShipLogError};
use crate::feed::{ChangeFeedRecord, append_record};
use crate::fs::FileSystem;
use crate::site::{GenerationReport, generate_site};

/// Default change-feed source identifier.
pub const DEFAULT_SOURCE_ID: &str = "doc_sync_agent";

/// Version-control operations needed to publish the site.
#[cfg_attr(test, mockall::automock)]
pub trait Vcs {
    /// Summary of uncommitted changes; empty when the tree is clean.
    fn pending_changes(&self) -> Result<String>;
    /// Stage every change, including new files.
    fn stage_all(&self) -> Result<()>;
    /// Commit staged changes.
    fn commit(&self, message: &str) -> Result<()>;
    /// Push the current branch.
    fn push(&self) -> Result<()>;
}

/// [`Vcs`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitVcs {
    repo: PathBuf,
}

impl GitVcs {
    /// Run git inside `repo`.
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    fn run(&self, args: &[&str]) -> Result<GitOutput> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            .output()?;
        Ok(GitOutput::capture(output))
    }

    fn run_checked(&self, args: &[&str]) -> Result<GitOutput> {
        let output = self.run(args)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(ShipLogError::Other(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                output.status,
                output.merged_output()
            )))
        }
    }
}

impl Vcs for GitVcs {
    fn pending_changes(&self) -> Result<String> {
        Ok(self.run_checked(&["status", "--porcelain"])?.stdout.trim().to_string())
    }

    fn stage_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"]).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "-m", message]).map(|_| ())
    }

    fn push(&self) -> Result<()> {
        self.run_checked(&["push"]).map(|_| ())
    }
}

#[derive(Debug, Clone)]
struct GitOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl GitOutput {
    fn capture(output: Output) -> Self {
        Self {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    fn merged_output(&self) -> String {
        let mut merged = String::new();
        if !self.stdout.trim().is_empty() {
            merged.push_str(self.stdout.trim());
        }
        if !self.stderr.trim().is_empty() {
            if !merged.is_empty() {
                merged.push('\n');
            }
            merged.push_str(self.stderr.trim());
        }
        merged
    }
}

/// Inputs for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Changelog to read.
    pub source: PathBuf,
    /// Site root inside the repository being published.
    pub site_root: PathBuf,
    /// Catalog used for rendering.
    pub catalog: SiteCatalog,
    /// Moment of the run; its date stamps footers and the commit message.
    pub now: DateTime<FixedOffset>,
    /// Change feed to append to after publishing.
    pub feed: Option<PathBuf>,
    /// Source identifier written to the change feed.
    pub source_id: String,
    /// Push after committing.
    pub push: bool,
}

/// Result of a sync run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Generated output matched the committed state; nothing was published.
    Unchanged {
        /// Generation summary.
        generation: GenerationReport,
    },
    /// Changes were committed (and pushed, if requested).
    Published {
        /// Generation summary.
        generation: GenerationReport,
        /// Commit message used.
        message: String,
        /// Change summary reported before committing.
        changes: String,
        /// Whether the commit was pushed.
        pushed: bool,
    },
}

/// Commit message for a sync on the given date.
pub fn commit_message(now: &DateTime<FixedOffset>) -> String {
    format!(
        "doc-sync: auto-update from SHIPLOG ({})",
        now.date_naive().format("%Y-%m-%d")
    )
}

/// Regenerate the site and publish it if anything changed.
pub fn run_sync<F: FileSystem, V: Vcs>(fs: &F, vcs: &V, options: &SyncOptions) -> Result<SyncOutcome> {
    info!("doc sync starting");
    if !fs.exists(&options.source)? {
        return Err(ShipLogError::MissingInput(options.source.clone()));
    }
    log_source_stamp(fs, &options.source);

    let generation = generate_site(
        fs,
        &options.source,
        &options.site_root,
        &options.catalog,
        options.now.date_naive(),
    )
    .map_err(|err| ShipLogError::Generation(err.to_string()))?;
    info!(
        "generated {} pages: {} ships across {} sections",
        generation.pages.len(),
        generation.ships,
        generation.sections
    );

    let changes = vcs.pending_changes()?;
    if changes.is_empty() {
        info!("no changes detected, docs are current");
        return Ok(SyncOutcome::Unchanged { generation });
    }
    info!("changes detected:\n{changes}");

    let message = commit_message(&options.now);
    vcs.stage_all()
        .map_err(|err| ShipLogError::Publish(format!("stage: {err}")))?;
    vcs.commit(&message)
        .map_err(|err| ShipLogError::Publish(format!("commit: {err}")))?;
    if options.push {
        vcs.push()
            .map_err(|err| ShipLogError::Publish(format!("push: {err}")))?;
        info!("deployed: {message}");
    } else {
        info!("committed without pushing: {message}");
    }

    if let Some(feed) = &options.feed {
        let record = ChangeFeedRecord::docs_updated(
            options.now.to_rfc3339_opts(SecondsFormat::Secs, false),
            &options.source_id,
            &message,
        );
        if let Err(err) = append_record(feed, &record) {
            warn!("change feed write failed: {err}");
        }
    }

    info!("doc sync complete");
    Ok(SyncOutcome::Published {
        generation,
        message,
        changes,
        pushed: options.push,
    })
}

fn log_source_stamp<F: FileSystem>(fs: &F, source: &Path) {
    let stamp = match fs.stamp(source) {
        Ok(stamp) => stamp,
        Err(err) => {
            debug!("no stamp for {}: {err}", source.display());
            return;
        }
    };
    match stamp.modified {
        Some(modified) => info!(
            "source: {} bytes, modified {}",
            stamp.len,
            DateTime::<Local>::from(modified).to_rfc3339_opts(SecondsFormat::Secs, false)
        ),
        None => info!("source: {} bytes", stamp.len),
    }
}
