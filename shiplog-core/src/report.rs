//! Report formatting for generation and sync runs.

use std::fmt::Write;

use serde::Serialize;

use crate::site::GenerationReport;
use crate::sync::SyncOutcome;

/// Render a report payload as pretty JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Render a generation summary as plain text.
pub fn render_generation_text(report: &GenerationReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Source: {}", report.source.display());
    let _ = writeln!(output, "Site: {}", report.site_root.display());
    let _ = writeln!(
        output,
        "Parsed: {} sections, {} ships, {} active days",
        report.sections, report.ships, report.active_days
    );
    let _ = writeln!(output, "Latest ship: {}", report.latest);
    let _ = writeln!(
        output,
        "Categories: {}, shield items: {}",
        report.categories, report.shield_items
    );
    for page in &report.pages {
        let _ = writeln!(output, "  wrote {} ({} bytes)", page.path, page.bytes);
    }
    output
}

/// Render a generation summary as Markdown.
pub fn render_generation_markdown(report: &GenerationReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Site Generation Report\n");
    append_generation_markdown(&mut output, report);
    output
}

/// Render a sync outcome as plain text.
pub fn render_sync_text(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Unchanged { generation } => {
            let mut output = render_generation_text(generation);
            let _ = writeln!(output, "No changes detected; docs are current.");
            output
        }
        SyncOutcome::Published {
            generation,
            message,
            changes,
            pushed,
        } => {
            let mut output = render_generation_text(generation);
            let _ = writeln!(output, "Changes:");
            for line in changes.lines() {
                let _ = writeln!(output, "  {line}");
            }
            let verb = if *pushed { "Deployed" } else { "Committed" };
            let _ = writeln!(output, "{verb}: {message}");
            output
        }
    }
}

/// Render a sync outcome as Markdown.
pub fn render_sync_markdown(outcome: &SyncOutcome) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Doc Sync Report\n");
    match outcome {
        SyncOutcome::Unchanged { generation } => {
            append_generation_markdown(&mut output, generation);
            let _ = writeln!(output, "No changes detected.");
        }
        SyncOutcome::Published {
            generation,
            message,
            changes,
            pushed,
        } => {
            append_generation_markdown(&mut output, generation);
            let _ = writeln!(output, "## Changes\n");
            let _ = writeln!(output, "```\n{changes}\n```\n");
            let _ = writeln!(output, "- Commit: `{message}`");
            let _ = writeln!(output, "- Pushed: {}", if *pushed { "yes" } else { "no" });
        }
    }
    output
}

fn append_generation_markdown(output: &mut String, report: &GenerationReport) {
    let _ = writeln!(output, "- Source: `{}`", report.source.display());
    let _ = writeln!(output, "- Site: `{}`", report.site_root.display());
    let _ = writeln!(output, "- Sections: {}", report.sections);
    let _ = writeln!(output, "- Ships: {}", report.ships);
    let _ = writeln!(output, "- Active days: {}", report.active_days);
    let _ = writeln!(output, "- Latest ship: {}", report.latest);
    let _ = writeln!(output);
    if report.pages.is_empty() {
        let _ = writeln!(output, "No pages written.\n");
        return;
    }
    let _ = writeln!(output, "| Page | Bytes |");
    let _ = writeln!(output, "| --- | --- |");
    for page in &report.pages {
        let _ = writeln!(output, "| `{}` | {} |", page.path, page.bytes);
    }
    let _ = writeln!(output);
}
