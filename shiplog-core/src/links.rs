//! Relative link checking for markdown trees.

use std::fmt::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fs::FileSystem;

/// Directory names never scanned for markdown files.
pub const EXCLUDED_DIRS: [&str; 5] = [".git", "node_modules", "build", "dist", ".docusaurus"];

/// URL prefixes treated as external and not checked.
pub const EXTERNAL_PREFIXES: [&str; 4] = ["http://", "https://", "mailto:", "tel:"];

const RULE_WIDTH: usize = 110;

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("markdown link pattern compiles")
});

static HTML_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]+href=["']([^"']+)["'][^>]*>"#).expect("html link pattern compiles")
});

/// Syntax a link was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Inline markdown link, `[text](url)`.
    Markdown,
    /// HTML anchor element with an `href`.
    Html,
}

/// A link found in a markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link text; empty for HTML anchors.
    pub text: String,
    /// Raw link target.
    pub url: String,
    /// Link syntax.
    pub kind: LinkKind,
    /// 1-based line where the link starts.
    pub line: usize,
}

/// Outcome of checking one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Target exists.
    Ok,
    /// Target does not exist.
    Broken,
    /// Target existence could not be determined.
    Error,
    /// External URL, not checked.
    External,
    /// Same-page anchor, not checked.
    Anchor,
}

impl LinkStatus {
    /// Returns true for statuses that fail a check run.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Broken | Self::Error)
    }
}

/// Status plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheck {
    /// Link status.
    pub status: LinkStatus,
    /// Explanation shown in reports.
    pub message: String,
}

impl LinkCheck {
    fn new(status: LinkStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// A link and its check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedLink {
    /// The link.
    pub link: Link,
    /// Its check result.
    pub check: LinkCheck,
}

/// Checked links of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLinks {
    /// File path relative to the scan root.
    pub file: PathBuf,
    /// Links in the order they were extracted.
    pub links: Vec<CheckedLink>,
}

impl FileLinks {
    /// Links whose status fails the run.
    pub fn failures(&self) -> impl Iterator<Item = &CheckedLink> {
        self.links.iter().filter(|checked| checked.check.status.is_failure())
    }
}

/// Number of links per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Valid relative links.
    pub ok: usize,
    /// Missing targets.
    pub broken: usize,
    /// Unresolvable targets.
    pub error: usize,
    /// External links.
    pub external: usize,
    /// Same-page anchors.
    pub anchor: usize,
}

impl StatusCounts {
    fn record(&mut self, status: LinkStatus) {
        match status {
            LinkStatus::Ok => self.ok += 1,
            LinkStatus::Broken => self.broken += 1,
            LinkStatus::Error => self.error += 1,
            LinkStatus::External => self.external += 1,
            LinkStatus::Anchor => self.anchor += 1,
        }
    }

    /// Broken plus error links.
    pub fn failures(&self) -> usize {
        self.broken + self.error
    }
}

/// Result of scanning a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    /// Scan root.
    pub root: PathBuf,
    /// Per-file results, sorted by path.
    pub files: Vec<FileLinks>,
    /// Totals by status.
    pub counts: StatusCounts,
}

impl LinkReport {
    /// Build a report and tally its statuses.
    pub fn new(root: PathBuf, files: Vec<FileLinks>) -> Self {
        let mut counts = StatusCounts::default();
        for checked in files.iter().flat_map(|file| file.links.iter()) {
            counts.record(checked.check.status);
        }
        Self {
            root,
            files,
            counts,
        }
    }

    /// Number of markdown files scanned.
    pub fn files_scanned(&self) -> usize {
        self.files.len()
    }

    /// Number of links extracted.
    pub fn links_found(&self) -> usize {
        self.files.iter().map(|file| file.links.len()).sum()
    }

    /// Returns true if any link is broken or errored.
    pub fn has_failures(&self) -> bool {
        self.counts.failures() > 0
    }
}

/// Returns true for `.md` files with no excluded directory below `root`.
pub fn is_checked_markdown(path: &Path, root: &Path) -> bool {
    let is_markdown = path.extension().and_then(|ext| ext.to_str()) == Some("md");
    let relative = path.strip_prefix(root).unwrap_or(path);
    is_markdown
        && !relative.components().any(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .map(|name| EXCLUDED_DIRS.contains(&name))
                .unwrap_or(false),
            _ => false,
        })
}

/// Extract markdown links first, then HTML anchors, each in source order.
pub fn extract_links(content: &str) -> Vec<Link> {
    let mut links = Vec::new();
    for captures in MARKDOWN_LINK.captures_iter(content) {
        let (Some(whole), Some(text), Some(url)) = (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        links.push(Link {
            text: text.as_str().to_string(),
            url: url.as_str().to_string(),
            kind: LinkKind::Markdown,
            line: line_of(content, whole.start()),
        });
    }
    for captures in HTML_LINK.captures_iter(content) {
        let (Some(whole), Some(url)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        links.push(Link {
            text: String::new(),
            url: url.as_str().to_string(),
            kind: LinkKind::Html,
            line: line_of(content, whole.start()),
        });
    }
    links
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Check a link found in `file`; root-relative targets resolve against `root`.
pub fn check_link<F: FileSystem>(fs: &F, url: &str, file: &Path, root: &Path) -> LinkCheck {
    if EXTERNAL_PREFIXES.iter().any(|prefix| url.starts_with(prefix)) {
        return LinkCheck::new(LinkStatus::External, "External link (not checked)");
    }
    if url.starts_with('#') {
        return LinkCheck::new(LinkStatus::Anchor, "Internal anchor (not checked)");
    }

    let target = resolve_target(url, file, root);
    match fs.exists(&target) {
        Ok(true) => LinkCheck::new(LinkStatus::Ok, "Link OK"),
        Ok(false) => LinkCheck::new(
            LinkStatus::Broken,
            format!("File not found: {}", target.display()),
        ),
        Err(err) => LinkCheck::new(LinkStatus::Error, format!("Cannot resolve path: {err}")),
    }
}

/// Resolve a relative link target to a normalised path, dropping any anchor.
pub fn resolve_target(url: &str, file: &Path, root: &Path) -> PathBuf {
    let path = url.split('#').next().unwrap_or_default();
    let joined = match path.strip_prefix('/') {
        Some(rooted) => root.join(rooted.trim_start_matches('/')),
        None => file.parent().unwrap_or(root).join(path),
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Scan every markdown file below `root` and check its links.
pub fn scan_links<F: FileSystem>(fs: &F, root: &Path) -> Result<LinkReport> {
    let mut files: Vec<PathBuf> = fs
        .list_files(root)?
        .into_iter()
        .filter(|path| is_checked_markdown(path, root))
        .collect();
    files.sort();
    debug!("checking {} markdown files under {}", files.len(), root.display());

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let content = match fs.read_bytes(&file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                warn!("skipping unreadable {}: {err}", file.display());
                String::new()
            }
        };
        let links = extract_links(&content)
            .into_iter()
            .map(|link| {
                let check = check_link(fs, &link.url, &file, root);
                CheckedLink { link, check }
            })
            .collect();
        results.push(FileLinks {
            file: file.strip_prefix(root).unwrap_or(&file).to_path_buf(),
            links,
        });
    }

    Ok(LinkReport::new(root.to_path_buf(), results))
}

/// Render the plain-text report followed by the breakdown table.
pub fn render_link_report(report: &LinkReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut output = String::new();
    let _ = writeln!(output, "\n{rule}");
    let _ = writeln!(output, "{}MARKDOWN LINK CHECK REPORT", " ".repeat(35));
    let _ = writeln!(output, "{rule}\n");
    let _ = writeln!(output, "Scanned {} markdown files", report.files_scanned());
    let _ = writeln!(output, "Found {} links", report.links_found());
    let _ = writeln!(output, "Broken links: {}", report.counts.broken);
    let _ = writeln!(output, "Error links: {}\n", report.counts.error);

    if report.has_failures() {
        let _ = writeln!(output, "{rule}");
        let _ = writeln!(output, "\n❌ Issues Found:\n");
        for file in report.files.iter().filter(|file| file.failures().next().is_some()) {
            let _ = writeln!(output, "\nFile: {}", file.file.display());
            let _ = writeln!(output, "{}", "-".repeat(RULE_WIDTH));
            for checked in file.failures() {
                let marker = match checked.check.status {
                    LinkStatus::Broken => "❌",
                    _ => "⚠️",
                };
                let _ = writeln!(
                    output,
                    "  {marker} [{}]({}) (line {})",
                    checked.link.text, checked.link.url, checked.link.line
                );
                let _ = writeln!(output, "     {}", checked.check.message);
            }
        }
        let _ = writeln!(output, "\n{rule}\n");
    } else {
        let _ = writeln!(output, "✅ All relative links are valid!\n");
        let _ = writeln!(output, "{rule}\n");
    }

    let counts = &report.counts;
    let _ = writeln!(output, "LINK BREAKDOWN");
    let _ = writeln!(output, "{rule}");
    let _ = writeln!(output, "  ✅ Valid relative links:  {}", counts.ok);
    let _ = writeln!(output, "  ❌ Broken links:          {}", counts.broken);
    let _ = writeln!(output, "  ⚠️  Error links:           {}", counts.error);
    let _ = writeln!(output, "  🌐 External links:        {} (not checked)", counts.external);
    let _ = writeln!(output, "  🔗 Anchor links:          {} (not checked)", counts.anchor);
    let _ = writeln!(output, "{rule}");
    output
}

/// Render the report as Markdown.
pub fn render_link_markdown(report: &LinkReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Markdown Link Check\n");
    let _ = writeln!(output, "- Root: `{}`", report.root.display());
    let _ = writeln!(output, "- Files scanned: {}", report.files_scanned());
    let _ = writeln!(output, "- Links found: {}\n", report.links_found());

    let _ = writeln!(output, "| Status | Count |");
    let _ = writeln!(output, "| --- | --- |");
    let counts = &report.counts;
    for (label, count) in [
        ("ok", counts.ok),
        ("broken", counts.broken),
        ("error", counts.error),
        ("external", counts.external),
        ("anchor", counts.anchor),
    ] {
        let _ = writeln!(output, "| {label} | {count} |");
    }
    let _ = writeln!(output);

    if !report.has_failures() {
        let _ = writeln!(output, "All relative links are valid.");
        return output;
    }
    let _ = writeln!(output, "## Issues\n");
    for file in report.files.iter().filter(|file| file.failures().next().is_some()) {
        let _ = writeln!(output, "### {}\n", file.file.display());
        for checked in file.failures() {
            let _ = writeln!(
                output,
                "- line {}: `{}` ({}): {}",
                checked.link.line,
                checked.link.url,
                status_label(checked.check.status),
                checked.check.message
            );
        }
        let _ = writeln!(output);
    }
    output
}

fn status_label(status: LinkStatus) -> &'static str {
    match status {
        LinkStatus::Ok => "ok",
        LinkStatus::Broken => "broken",
        LinkStatus::Error => "error",
        LinkStatus::External => "external",
        LinkStatus::Anchor => "anchor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShipLogError;
    use crate::fs::{MockFileSystem, StdFileSystem};

    #[test]
    fn extracts_markdown_then_html_links_with_lines() {
        let content = "intro\n<A class=\"x\" HREF='page.md'>page</A>\nsee [guide](./guide.md#setup)\n";
        let links = extract_links(content);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind, LinkKind::Markdown);
        assert_eq!(links[0].text, "guide");
        assert_eq!(links[0].url, "./guide.md#setup");
        assert_eq!(links[0].line, 3);
        assert_eq!(links[1].kind, LinkKind::Html);
        assert_eq!(links[1].url, "page.md");
        assert_eq!(links[1].line, 2);
        assert!(links[1].text.is_empty());
    }

    #[test]
    fn external_and_anchor_links_are_not_checked() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().never();
        let file = Path::new("/docs/readme.md");
        let root = Path::new("/docs");

        for url in ["https://example.com", "http://x", "mailto:a@b.c", "tel:123"] {
            assert_eq!(check_link(&fs, url, file, root).status, LinkStatus::External);
        }
        assert_eq!(check_link(&fs, "#section", file, root).status, LinkStatus::Anchor);
    }

    #[test]
    fn relative_targets_resolve_against_the_file_directory() {
        let target = resolve_target("../shared/./b.md#top", Path::new("/repo/docs/a/readme.md"), Path::new("/repo"));
        assert_eq!(target, PathBuf::from("/repo/docs/shared/b.md"));
    }

    #[test]
    fn rooted_targets_resolve_against_the_scan_root() {
        let target = resolve_target("/guide/intro.md", Path::new("/repo/docs/a.md"), Path::new("/repo"));
        assert_eq!(target, PathBuf::from("/repo/guide/intro.md"));
    }

    #[test]
    fn existence_failure_is_an_error_not_broken() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists()
            .returning(|_| Err(ShipLogError::Other("permission denied".to_string())));

        let check = check_link(&fs, "secret.md", Path::new("/repo/a.md"), Path::new("/repo"));

        assert_eq!(check.status, LinkStatus::Error);
        assert!(check.message.contains("permission denied"));
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let root = Path::new("/repo");
        assert!(is_checked_markdown(Path::new("/repo/docs/a.md"), root));
        assert!(!is_checked_markdown(Path::new("/repo/node_modules/x/a.md"), root));
        assert!(!is_checked_markdown(Path::new("/repo/website/build/a.md"), root));
        assert!(!is_checked_markdown(Path::new("/repo/docs/a.mdx"), root));
    }

    #[test]
    fn missing_relative_target_is_broken_and_fails_the_run() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("create root");
        std::fs::write(root.join("README.md"), "[text](./missing.md)\n").expect("write");

        let report = scan_links(&StdFileSystem::new(), &root).expect("report");

        assert_eq!(report.files_scanned(), 1);
        assert_eq!(report.counts.broken, 1);
        assert!(report.has_failures());
        let rendered = render_link_report(&report);
        assert!(rendered.contains("Broken links: 1"));
        assert!(rendered.contains("File: README.md"));
        assert!(rendered.contains("[text](./missing.md)"));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn external_and_anchor_links_do_not_fail_the_run() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(root.join("docs")).expect("create root");
        std::fs::create_dir_all(root.join("node_modules")).expect("create excluded");
        std::fs::write(
            root.join("docs/index.md"),
            "[site](https://example.com)\n[jump](#section)\n[self](index.md)\n[top](/docs/index.md)\n",
        )
        .expect("write");
        std::fs::write(root.join("node_modules/bad.md"), "[x](nope.md)").expect("write");

        let report = scan_links(&StdFileSystem::new(), &root).expect("report");

        assert_eq!(report.files_scanned(), 1);
        assert_eq!(report.links_found(), 4);
        assert_eq!(
            report.counts,
            StatusCounts {
                ok: 2,
                broken: 0,
                error: 0,
                external: 1,
                anchor: 1,
            }
        );
        assert!(!report.has_failures());
        assert!(render_link_report(&report).contains("All relative links are valid!"));
        assert!(render_link_markdown(&report).contains("| external | 1 |"));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn non_utf8_files_are_still_checked() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("create root");
        std::fs::write(root.join("README.md"), b"caf\xe9 menu\n[text](./missing.md)\n")
            .expect("write");

        let report = scan_links(&StdFileSystem::new(), &root).expect("report");

        assert_eq!(report.links_found(), 1);
        assert_eq!(report.counts.broken, 1);
        assert_eq!(report.files[0].links[0].link.line, 2);
        assert!(report.has_failures());

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn unreadable_file_is_scanned_as_empty() {
        let mut fs = MockFileSystem::new();
        fs.expect_list_files().returning(|_| {
            Ok(vec![
                PathBuf::from("/docs/a.md"),
                PathBuf::from("/docs/b.md"),
            ])
        });
        fs.expect_read_bytes()
            .withf(|path| path == Path::new("/docs/a.md"))
            .returning(|_| Err(ShipLogError::Other("permission denied".to_string())));
        fs.expect_read_bytes()
            .withf(|path| path == Path::new("/docs/b.md"))
            .returning(|_| Ok(b"[x](c.md)".to_vec()));
        fs.expect_exists().returning(|_| Ok(false));

        let report = scan_links(&fs, Path::new("/docs")).expect("report");

        assert_eq!(report.files_scanned(), 2);
        assert!(report.files[0].links.is_empty());
        assert_eq!(report.counts.broken, 1);
    }

    fn unique_dir_name() -> PathBuf {
        static COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        PathBuf::from(format!("shiplog_links_test_{nanos}_{counter}"))
    }
}
