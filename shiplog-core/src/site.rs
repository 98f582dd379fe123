//! Site generation: read the changelog, render every page, write it out.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::catalog::SiteCatalog;
use crate::domain::{LogDocument, ShipDate};
use crate::error::{Result, ShipLogError};
use crate::fs::FileSystem;
use crate::parser::parse_log;
use crate::render::{Page, PageKind, RenderContext, render_site};
use crate::views::{aggregate_categories, build_date_index, latest_ship_date, security_view, ship_count};

/// One page written during generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenPage {
    /// Page path relative to the site root.
    pub path: String,
    /// Size of the written body in bytes.
    pub bytes: usize,
}

/// Summary of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    /// Changelog that was read.
    pub source: PathBuf,
    /// Site root that was written.
    pub site_root: PathBuf,
    /// Number of sections parsed.
    pub sections: usize,
    /// Number of items parsed.
    pub ships: usize,
    /// Number of distinct ship dates.
    pub active_days: usize,
    /// Latest ship date, or `unknown`.
    pub latest: ShipDate,
    /// Number of non-empty capability categories.
    pub categories: usize,
    /// Number of shield items on the security page.
    pub shield_items: usize,
    /// Pages written, in render order.
    pub pages: Vec<WrittenPage>,
}

impl GenerationReport {
    fn summarize(
        source: &Path,
        site_root: &Path,
        document: &LogDocument,
        catalog: &SiteCatalog,
    ) -> Self {
        let dates = build_date_index(document);
        Self {
            source: source.to_path_buf(),
            site_root: site_root.to_path_buf(),
            sections: document.len(),
            ships: ship_count(document),
            active_days: dates.len(),
            latest: latest_ship_date(&dates)
                .map(ShipDate::Known)
                .unwrap_or_default(),
            categories: aggregate_categories(document, &catalog.categories).len(),
            shield_items: security_view(document, &catalog.security).shield.len(),
            pages: Vec::new(),
        }
    }
}

/// Read the changelog at `source` and regenerate the site under `site_root`.
pub fn generate_site<F: FileSystem>(
    fs: &F,
    source: &Path,
    site_root: &Path,
    catalog: &SiteCatalog,
    today: NaiveDate,
) -> Result<GenerationReport> {
    if !fs.exists(source)? {
        return Err(ShipLogError::MissingInput(source.to_path_buf()));
    }
    let text = fs.read_to_string(source)?;
    let document = parse_log(&text);
    info!(
        "parsed {} sections, {} capabilities from {}",
        document.len(),
        ship_count(&document),
        source.display()
    );

    let pages = render_site(&document, catalog, &RenderContext::new(today));
    let mut report = GenerationReport::summarize(source, site_root, &document, catalog);
    report.pages = write_site(fs, site_root, &pages)?;
    Ok(report)
}

/// Write rendered pages under `site_root`, replacing existing files.
pub fn write_site<F: FileSystem>(
    fs: &F,
    site_root: &Path,
    pages: &[Page],
) -> Result<Vec<WrittenPage>> {
    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        let path = page_path(site_root, page.kind);
        fs.write_string(&path, &page.body)?;
        info!("wrote {}", path.display());
        written.push(WrittenPage {
            path: page.kind.relative_path().to_string(),
            bytes: page.body.len(),
        });
    }
    Ok(written)
}

/// Absolute path of a page under the site root.
pub fn page_path(site_root: &Path, kind: PageKind) -> PathBuf {
    site_root.join(kind.relative_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MockFileSystem, StdFileSystem};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).expect("date")
    }

    #[test]
    fn missing_source_fails_before_writing() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(false));
        fs.expect_write_string().never();

        let result = generate_site(
            &fs,
            Path::new("/nowhere/SHIPLOG.md"),
            Path::new("/site"),
            &SiteCatalog::default(),
            today(),
        );

        assert!(matches!(result, Err(ShipLogError::MissingInput(_))));
    }

    #[test]
    fn generation_writes_every_page() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("/logs/SHIPLOG.md"))
            .returning(|_| {
                Ok("## Kavach\n- **Shield** — blocks scams `SHIPPED 2025-06-01`\n".to_string())
            });
        for kind in PageKind::ALL {
            fs.expect_write_string()
                .withf(move |path, _| path == Path::new("/site").join(kind.relative_path()))
                .times(1)
                .returning(|_, _| Ok(()));
        }

        let report = generate_site(
            &fs,
            Path::new("/logs/SHIPLOG.md"),
            Path::new("/site"),
            &SiteCatalog::default(),
            today(),
        )
        .expect("report");

        assert_eq!(report.sections, 1);
        assert_eq!(report.ships, 1);
        assert_eq!(report.active_days, 1);
        assert_eq!(report.latest.to_string(), "2025-06-01");
        assert_eq!(report.categories, 1);
        assert_eq!(report.shield_items, 1);
        assert_eq!(report.pages.len(), 4);
    }

    #[test]
    fn generation_replaces_existing_pages_on_disk() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let source = root.join("SHIPLOG.md");
        let site = root.join("site");
        std::fs::create_dir_all(site.join("story")).expect("create site");
        std::fs::write(site.join("story/index.html"), "stale").expect("stale page");
        std::fs::write(&source, "## Dashboard\n- **Grid** — panels `SHIPPED 2025-01-02`\n")
            .expect("write source");

        let fs = StdFileSystem::new();
        let report =
            generate_site(&fs, &source, &site, &SiteCatalog::default(), today()).expect("report");

        let story = std::fs::read_to_string(site.join("story/index.html")).expect("story");
        assert!(story.contains("Grid"));
        assert!(!story.contains("stale"));
        assert!(site.join("capabilities/index.html").is_file());
        assert_eq!(report.latest.to_string(), "2025-01-02");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn report_serializes_latest_as_unknown_without_dates() {
        let doc = parse_log("## Dashboard\n- **Grid** — panels\n");
        let report = GenerationReport::summarize(
            Path::new("SHIPLOG.md"),
            Path::new("site"),
            &doc,
            &SiteCatalog::default(),
        );
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["latest"], "unknown");
        assert_eq!(json["activeDays"], 0);
    }

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        PathBuf::from(format!("shiplog_site_test_{nanos}"))
    }
}
