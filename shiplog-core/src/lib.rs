#![deny(missing_docs)]
//! ShipLog core library.
//!
//! Parses a SHIPLOG changelog, derives page views from it, renders and writes
//! the documentation site, publishes it through version control, and provides
//! the link checker and ecosystem printer used alongside the site.

pub mod catalog;
pub mod domain;
pub mod ecosystem;
pub mod error;
pub mod feed;
pub mod fs;
pub mod links;
pub mod parser;
pub mod render;
pub mod report;
pub mod site;
pub mod sync;
pub mod views;

pub use catalog::{CategorySpec, NavEntry, SecuritySpec, SiteCatalog};
pub use domain::{Item, LogDocument, Section, ShipDate};
pub use ecosystem::{
    EcosystemMap, EcosystemSummary, Repository, Role, Visibility, render_ecosystem,
    render_ecosystem_markdown,
};
pub use error::{Result, ShipLogError};
pub use feed::{ChangeFeedRecord, append_record};
pub use fs::{FileStamp, FileSystem, StdFileSystem};
pub use links::{
    EXCLUDED_DIRS, LinkReport, LinkStatus, render_link_markdown, render_link_report, scan_links,
};
pub use parser::parse_log;
pub use render::{Page, PageKind, RenderContext, render_site};
pub use report::{
    render_generation_markdown, render_generation_text, render_json, render_sync_markdown,
    render_sync_text,
};
pub use site::{GenerationReport, generate_site};
pub use sync::{DEFAULT_SOURCE_ID, GitVcs, SyncOptions, SyncOutcome, Vcs, run_sync};
