#![deny(missing_docs)]
//! ShipLog command-line interface.
//!
//! Generates and publishes the documentation site from a SHIPLOG changelog,
//! checks markdown links, and prints the repository ecosystem map.

mod config;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{DEFAULT_FEED, DEFAULT_SHIPLOG, DEFAULT_SITE_DIR};
use serde::Serialize;
use shiplog_core::ecosystem::{EcosystemSummary, Repository};
use shiplog_core::{
    DEFAULT_SOURCE_ID, EXCLUDED_DIRS, EcosystemMap, GenerationReport, GitVcs, LinkReport,
    StdFileSystem, SyncOptions, SyncOutcome, generate_site, render_ecosystem,
    render_ecosystem_markdown, render_generation_markdown, render_generation_text, render_json,
    render_link_markdown, render_link_report, render_sync_markdown, render_sync_text, scan_links,
};
use std::path::PathBuf;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "shiplog", version, about = "ShipLog documentation toolchain")]
struct Cli {
    /// Append log output to this file instead of stderr.
    #[arg(long, global = true, env = "SHIPLOG_LOG_FILE")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct SiteArgs {
    /// Changelog to read (default: ~/.mirrordna/SHIPLOG.md).
    #[arg(long, env = "SHIPLOG_PATH")]
    shiplog: Option<PathBuf>,
    /// Site root to write pages into (default: ~/repos/MirrorDNA-Docs).
    #[arg(long, env = "SHIPLOG_SITE_DIR")]
    site_dir: Option<PathBuf>,
    /// Catalog JSON with categories, security sections and navigation.
    #[arg(long, env = "SHIPLOG_CATALOG")]
    catalog: Option<PathBuf>,
    /// Date stamped into footers (YYYY-MM-DD, default: today).
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the site pages from the changelog.
    Generate {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Regenerate the site, then commit and push it if anything changed.
    Sync {
        #[command(flatten)]
        site: SiteArgs,
        /// Change feed to append to after publishing.
        #[arg(long, env = "SHIPLOG_FEED_PATH")]
        feed: Option<PathBuf>,
        /// Do not write a change-feed record.
        #[arg(long)]
        no_feed: bool,
        /// Source identifier recorded in the change feed.
        #[arg(long, default_value = DEFAULT_SOURCE_ID)]
        source_id: String,
        /// Commit without pushing.
        #[arg(long)]
        no_push: bool,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Check relative links in every markdown file below a directory.
    CheckLinks {
        /// Directory to scan.
        #[arg(long, env = "SHIPLOG_DOCS_ROOT", default_value = ".")]
        root: PathBuf,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Print the repository ecosystem map grouped by role.
    Ecosystem {
        /// Ecosystem map JSON.
        #[arg(long, env = "SHIPLOG_ECOSYSTEM_MAP", default_value = "ecosystem_map.json")]
        map: PathBuf,
        /// Banner title.
        #[arg(long, default_value = "MIRRORDNA ECOSYSTEM MAP")]
        title: String,
        #[command(flatten)]
        report: OutputArgs,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    config::init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Generate { site, report } => run_generate(site, report).await?,
        Commands::Sync {
            site,
            feed,
            no_feed,
            source_id,
            no_push,
            report,
        } => {
            let feed = if no_feed {
                None
            } else {
                Some(config::home_path(feed, DEFAULT_FEED)?)
            };
            run_sync(site, feed, source_id, !no_push, report).await?
        }
        Commands::CheckLinks { root, report } => run_check_links(root, report).await?,
        Commands::Ecosystem { map, title, report } => run_ecosystem(map, title, report).await?,
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

struct ResolvedSite {
    shiplog: PathBuf,
    site_dir: PathBuf,
    catalog: shiplog_core::SiteCatalog,
}

fn resolve_site(site: SiteArgs) -> CliResult<ResolvedSite> {
    Ok(ResolvedSite {
        shiplog: config::home_path(site.shiplog, DEFAULT_SHIPLOG)?,
        site_dir: config::home_path(site.site_dir, DEFAULT_SITE_DIR)?,
        catalog: config::load_catalog(site.catalog.as_deref())?,
    })
}

async fn run_generate(site: SiteArgs, report: OutputArgs) -> CliResult<()> {
    let today = config::run_moment(site.today).date_naive();
    let resolved = resolve_site(site)?;
    let generation = generate_site(
        &StdFileSystem::new(),
        &resolved.shiplog,
        &resolved.site_dir,
        &resolved.catalog,
        today,
    )?;
    emit_output(&report, render_generation(&generation, report.format)?).await
}

async fn run_sync(
    site: SiteArgs,
    feed: Option<PathBuf>,
    source_id: String,
    push: bool,
    report: OutputArgs,
) -> CliResult<()> {
    let now = config::run_moment(site.today);
    let resolved = resolve_site(site)?;
    let vcs = GitVcs::new(&resolved.site_dir);
    let options = SyncOptions {
        source: resolved.shiplog,
        site_root: resolved.site_dir,
        catalog: resolved.catalog,
        now,
        feed,
        source_id,
        push,
    };
    let outcome = shiplog_core::run_sync(&StdFileSystem::new(), &vcs, &options)?;
    emit_output(&report, render_outcome(&outcome, report.format)?).await
}

async fn run_check_links(root: PathBuf, report: OutputArgs) -> CliResult<()> {
    log::info!("checking markdown links in {}", root.display());
    let fs = StdFileSystem::pruning(EXCLUDED_DIRS);
    let links = scan_links(&fs, &root)?;
    log::info!("found {} markdown files to check", links.files_scanned());
    emit_output(&report, render_links(&links, report.format)?).await?;

    if links.has_failures() {
        return Err(format!(
            "{} broken and {} unresolvable links",
            links.counts.broken, links.counts.error
        )
        .into());
    }
    Ok(())
}

async fn run_ecosystem(map: PathBuf, title: String, report: OutputArgs) -> CliResult<()> {
    let ecosystem = EcosystemMap::load(&StdFileSystem::new(), &map)?;
    emit_output(&report, render_map(&ecosystem, &title, report.format)?).await
}

#[derive(Serialize)]
struct EcosystemPayload<'a> {
    title: &'a str,
    repositories: &'a [Repository],
    summary: EcosystemSummary,
}

fn render_generation(report: &GenerationReport, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Text => render_generation_text(report),
        OutputFormat::Json => format!("{}\n", render_json(report)?),
        OutputFormat::Markdown => render_generation_markdown(report),
    })
}

fn render_outcome(outcome: &SyncOutcome, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Text => render_sync_text(outcome),
        OutputFormat::Json => format!("{}\n", render_json(outcome)?),
        OutputFormat::Markdown => render_sync_markdown(outcome),
    })
}

fn render_links(report: &LinkReport, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Text => render_link_report(report),
        OutputFormat::Json => format!("{}\n", render_json(report)?),
        OutputFormat::Markdown => render_link_markdown(report),
    })
}

fn render_map(map: &EcosystemMap, title: &str, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Text => render_ecosystem(map, title),
        OutputFormat::Json => {
            let payload = EcosystemPayload {
                title,
                repositories: &map.repositories,
                summary: map.summary(),
            };
            format!("{}\n", render_json(&payload)?)
        }
        OutputFormat::Markdown => render_ecosystem_markdown(map, title),
    })
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}
