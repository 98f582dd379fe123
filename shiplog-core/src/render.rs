//! HTML page rendering for the documentation site.
//!
//! Rendering is pure: the parsed document, the catalog and an explicit
//! "today" go in, page bodies come out. Identical inputs render identical
//! bytes.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::catalog::SiteCatalog;
use crate::domain::{Item, LogDocument};
use crate::views::{
    CategoryView, DateIndex, aggregate_categories, build_date_index, latest_ship_date,
    security_view, ship_count,
};

/// Maximum cards rendered per capability category.
pub const CATEGORY_CARD_LIMIT: usize = 12;
/// Maximum entries rendered per timeline date bucket.
pub const TIMELINE_DAY_LIMIT: usize = 8;
/// Timeline descriptions are cut to this many characters.
pub const TIMELINE_DESCRIPTION_CHARS: usize = 100;

/// Inputs to rendering that do not come from the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    /// The date stamped into footers and used when no item is dated.
    pub today: NaiveDate,
}

impl RenderContext {
    /// Create a context for the given date.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

/// The logical pages of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Landing page with headline statistics.
    Landing,
    /// Capabilities grouped by category.
    Capabilities,
    /// Chronological ship timeline.
    Timeline,
    /// Security breakdown.
    Security,
}

impl PageKind {
    /// All pages in render order.
    pub const ALL: [PageKind; 4] = [
        PageKind::Landing,
        PageKind::Capabilities,
        PageKind::Timeline,
        PageKind::Security,
    ];

    /// Output path relative to the site root.
    pub fn relative_path(self) -> &'static str {
        match self {
            Self::Landing => "index.html",
            Self::Capabilities => "capabilities/index.html",
            Self::Timeline => "story/index.html",
            Self::Security => "security/index.html",
        }
    }

    /// Navigation slug marked active on this page.
    pub fn nav_slug(self) -> Option<&'static str> {
        match self {
            Self::Landing => None,
            Self::Capabilities => Some("capabilities"),
            Self::Timeline => Some("story"),
            Self::Security => Some("security"),
        }
    }
}

/// A fully rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Which page this is.
    pub kind: PageKind,
    /// Complete HTML body.
    pub body: String,
}

/// Render every page of the site.
pub fn render_site(
    document: &LogDocument,
    catalog: &SiteCatalog,
    context: &RenderContext,
) -> Vec<Page> {
    PageKind::ALL
        .into_iter()
        .map(|kind| Page {
            kind,
            body: render_page(kind, document, catalog, context),
        })
        .collect()
}

/// Render a single page.
pub fn render_page(
    kind: PageKind,
    document: &LogDocument,
    catalog: &SiteCatalog,
    context: &RenderContext,
) -> String {
    match kind {
        PageKind::Landing => render_landing(document, catalog, context),
        PageKind::Capabilities => render_capabilities(document, catalog, context),
        PageKind::Timeline => render_timeline(document, catalog, context),
        PageKind::Security => render_security(document, catalog, context),
    }
}

fn render_landing(document: &LogDocument, catalog: &SiteCatalog, context: &RenderContext) -> String {
    let total = ship_count(document);
    let dates = build_date_index(document);
    let latest = latest_ship_date(&dates).unwrap_or(context.today);
    let views = aggregate_categories(document, &catalog.categories);
    let site = encode_text(&catalog.site_name);

    let mut output = String::new();
    output.push_str(&head(
        &format!("{} — Shipped Capabilities", catalog.site_name),
        &format!(
            "{total} shipped capabilities across {} systems.",
            document.len()
        ),
    ));
    output.push_str(&nav(catalog, PageKind::Landing.nav_slug()));
    let _ = writeln!(output, "    <main>");
    let _ = writeln!(output, "        <div class=\"container\">");
    let _ = writeln!(output, "            <div class=\"hero\">");
    let _ = writeln!(output, "                <h1>⟡ {site}</h1>");
    let _ = writeln!(
        output,
        "                <p class=\"lead\">{total} shipped capabilities across {} systems. Every entry is running, not planned.</p>",
        document.len()
    );
    let _ = writeln!(output, "            </div>");
    output.push_str(&stat_row(&[
        (total.to_string(), "Shipped"),
        (document.len().to_string(), "Systems"),
        (dates.len().to_string(), "Active Days"),
        (views.len().to_string(), "Layers"),
    ]));
    if !views.is_empty() {
        let _ = writeln!(output, "            <h2>Layers</h2>");
        let _ = writeln!(output, "            <div class=\"capability-grid\">");
        for view in &views {
            let _ = writeln!(
                output,
                "                <a href=\"capabilities/#{}\" style=\"text-decoration: none;\">",
                encode_double_quoted_attribute(&view.spec.anchor())
            );
            output.push_str(&card(
                &view.spec.icon,
                &view.spec.label,
                &format!("{} shipped capabilities", view.count()),
            ));
            let _ = writeln!(output, "                </a>");
        }
        let _ = writeln!(output, "            </div>");
    }
    let _ = writeln!(
        output,
        "            <p style=\"text-align: center; color: var(--text-muted); margin-top: 3rem; font-size: 0.85rem;\">Last updated: {} · Auto-generated from {}</p>",
        iso(latest),
        encode_text(&catalog.source_label)
    );
    let _ = writeln!(output, "        </div>");
    output.push_str(&footer(catalog, context));
    output
}

fn render_capabilities(
    document: &LogDocument,
    catalog: &SiteCatalog,
    context: &RenderContext,
) -> String {
    let total = ship_count(document);
    let views = aggregate_categories(document, &catalog.categories);

    let mut output = String::new();
    output.push_str(&head(
        &format!("System Capabilities — What {} Can Do", catalog.site_name),
        &format!(
            "{total} shipped capabilities across {} layers.",
            views.len()
        ),
    ));
    output.push_str(&nav(catalog, PageKind::Capabilities.nav_slug()));
    let _ = writeln!(output, "    <main>");
    let _ = writeln!(output, "        <div class=\"container\">");
    let _ = writeln!(output, "            <p class=\"subtitle\">System Capabilities</p>");
    let _ = writeln!(
        output,
        "            <h1>What {} Can Do</h1>",
        encode_text(&catalog.site_name)
    );
    let _ = writeln!(
        output,
        "            <p class=\"lead\"><strong>{total} shipped capabilities</strong> across {} layers.</p>",
        views.len()
    );
    output.push_str(&stat_row(&[
        (total.to_string(), "Shipped"),
        (views.len().to_string(), "Layers"),
        (document.len().to_string(), "Systems"),
    ]));
    for view in &views {
        output.push_str(&category_block(view));
    }
    let _ = writeln!(output, "        </div>");
    output.push_str(&footer(catalog, context));
    output
}

fn category_block(view: &CategoryView<'_>) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "            <h2 id=\"{}\">{} {}</h2>",
        encode_double_quoted_attribute(&view.spec.anchor()),
        encode_text(&view.spec.icon),
        encode_text(&view.spec.label)
    );
    let _ = writeln!(output, "            <p>{}</p>", encode_text(&view.spec.description));
    let _ = writeln!(
        output,
        "            <p style=\"color: var(--text-muted); font-size: 0.85rem;\">{} shipped capabilities</p>",
        view.count()
    );
    let _ = writeln!(output, "            <div class=\"capability-grid\">");
    for item in view.items.iter().take(CATEGORY_CARD_LIMIT) {
        output.push_str(&item_card(item, "⟡"));
    }
    let _ = writeln!(output, "            </div>");
    if let Some(more) = overflow(view.count(), CATEGORY_CARD_LIMIT) {
        let _ = writeln!(
            output,
            "            <p style=\"color: var(--text-muted);\">...and {more} more</p>"
        );
    }
    output
}

fn render_timeline(document: &LogDocument, catalog: &SiteCatalog, context: &RenderContext) -> String {
    let total = ship_count(document);
    let dates = build_date_index(document);
    let latest = latest_ship_date(&dates).unwrap_or(context.today);

    let mut output = String::new();
    output.push_str(&head(
        &format!("Story — How {} Got Here", catalog.site_name),
        "Timeline of shipped work, newest first.",
    ));
    output.push_str(&nav(catalog, PageKind::Timeline.nav_slug()));
    let _ = writeln!(output, "    <main>");
    let _ = writeln!(output, "        <div class=\"container\">");
    let _ = writeln!(output, "            <p class=\"subtitle\">Origin &amp; Timeline</p>");
    let _ = writeln!(
        output,
        "            <h1>How {} Got Here</h1>",
        encode_text(&catalog.site_name)
    );
    let _ = writeln!(
        output,
        "            <p class=\"lead\" style=\"color: var(--text-muted); font-size: 1rem;\">{total} capabilities shipped. {} active development days tracked. Latest ship: {}.</p>",
        dates.len(),
        iso(latest)
    );
    let _ = writeln!(output, "            <h2>Ship Timeline</h2>");
    let _ = writeln!(output, "            <div class=\"timeline\">");
    output.push_str(&timeline_entries(&dates));
    let _ = writeln!(output, "            </div>");
    let _ = writeln!(output, "        </div>");
    output.push_str(&footer(catalog, context));
    output
}

fn timeline_entries(dates: &DateIndex<'_>) -> String {
    let mut output = String::new();
    for (date, entries) in dates.iter().rev() {
        let _ = writeln!(output, "                <div class=\"timeline-item\">");
        let _ = writeln!(
            output,
            "                    <div class=\"timeline-date\">{}</div>",
            iso(*date)
        );
        let _ = writeln!(output, "                    <div class=\"timeline-content\">");
        let _ = writeln!(
            output,
            "                        <p style=\"color: var(--text-muted); font-size: 0.85rem;\">{} ships</p>",
            entries.len()
        );
        let _ = writeln!(output, "                        <ul style=\"list-style: none; padding: 0;\">");
        for entry in entries.iter().take(TIMELINE_DAY_LIMIT) {
            let _ = writeln!(
                output,
                "                            <li><strong>{}</strong> ({}) — {}</li>",
                encode_text(&entry.item.name),
                encode_text(entry.section),
                encode_text(&truncate_chars(
                    &entry.item.description,
                    TIMELINE_DESCRIPTION_CHARS
                ))
            );
        }
        if let Some(more) = overflow(entries.len(), TIMELINE_DAY_LIMIT) {
            let _ = writeln!(
                output,
                "                            <li style=\"color: var(--text-muted);\">...and {more} more</li>"
            );
        }
        let _ = writeln!(output, "                        </ul>");
        let _ = writeln!(output, "                    </div>");
        let _ = writeln!(output, "                </div>");
    }
    output
}

fn render_security(document: &LogDocument, catalog: &SiteCatalog, context: &RenderContext) -> String {
    let view = security_view(document, &catalog.security);

    let mut output = String::new();
    output.push_str(&head(
        &format!("Security Architecture — {}", catalog.site_name),
        "Defense-in-depth security, shield capabilities and infrastructure hardening.",
    ));
    output.push_str(&nav(catalog, PageKind::Security.nav_slug()));
    let _ = writeln!(output, "    <main>");
    let _ = writeln!(output, "        <div class=\"container\">");
    let _ = writeln!(output, "            <p class=\"subtitle\">Security Architecture</p>");
    let _ = writeln!(output, "            <h1>Defense in Depth</h1>");
    output.push_str(&stat_row(&[
        (view.shield.len().to_string(), "Shield Capabilities"),
        (view.infrastructure.len().to_string(), "Infrastructure Controls"),
    ]));
    let _ = writeln!(output, "            <h2 id=\"shield\">⛨ Shield</h2>");
    let _ = writeln!(
        output,
        "            <p>{} shipped capabilities.</p>",
        view.shield.len()
    );
    let _ = writeln!(output, "            <div class=\"capability-grid\">");
    for item in &view.shield {
        output.push_str(&item_card(item, "⛨"));
    }
    let _ = writeln!(output, "            </div>");
    let _ = writeln!(
        output,
        "            <h2 id=\"infrastructure-security\">🔐 Infrastructure Security</h2>"
    );
    let _ = writeln!(
        output,
        "            <p>System-level security hardening, monitoring, and self-healing.</p>"
    );
    let _ = writeln!(output, "            <div class=\"capability-grid\">");
    for item in &view.infrastructure {
        output.push_str(&item_card(item, "🔒"));
    }
    let _ = writeln!(output, "            </div>");
    let _ = writeln!(output, "        </div>");
    output.push_str(&footer(catalog, context));
    output
}

fn head(title: &str, description: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{}</title>
    <meta name=\"description\" content=\"{}\">
    <link rel=\"stylesheet\" href=\"styles.css\">
    <link rel=\"icon\" type=\"image/svg+xml\" href=\"favicon.svg\">
</head>

<body>
",
        encode_text(title),
        encode_double_quoted_attribute(description)
    )
}

fn nav(catalog: &SiteCatalog, active: Option<&str>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "    <nav class=\"nav\">");
    let _ = writeln!(output, "        <div class=\"nav-inner\">");
    let _ = writeln!(
        output,
        "            <a href=\"./\" class=\"nav-logo\"><span class=\"nav-logo-glyph\">⟡</span><span class=\"nav-logo-text\">{}</span></a>",
        encode_text(&catalog.site_name)
    );
    let _ = writeln!(output, "            <ul class=\"nav-links\">");
    for entry in &catalog.navigation {
        let class = if Some(entry.slug.as_str()) == active {
            " class=\"active\""
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "                <li><a href=\"{}/\"{class}>{}</a></li>",
            encode_double_quoted_attribute(&entry.slug),
            encode_text(&entry.label)
        );
    }
    let _ = writeln!(output, "            </ul>");
    let _ = writeln!(output, "        </div>");
    let _ = writeln!(output, "    </nav>");
    output
}

fn footer(catalog: &SiteCatalog, context: &RenderContext) -> String {
    format!(
        "    <footer class=\"footer\">
        <div class=\"container\">
            <p>⟡ {site}</p>
            <p style=\"margin-top: 0.5rem; color: var(--text-muted); font-size: 0.8rem;\">
                {site} · {year} · Auto-generated from {source} on {date}
            </p>
        </div>
    </footer>
    </main>
</body>
</html>
",
        site = encode_text(&catalog.site_name),
        year = context.today.year(),
        source = encode_text(&catalog.source_label),
        date = iso(context.today)
    )
}

fn stat_row(stats: &[(String, &str)]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "            <div class=\"stat-row\">");
    for (value, label) in stats {
        let _ = writeln!(
            output,
            "                <div class=\"stat\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>",
            encode_text(value),
            encode_text(label)
        );
    }
    let _ = writeln!(output, "            </div>");
    output
}

fn item_card(item: &Item, icon: &str) -> String {
    card(icon, &item.name, &item.description)
}

fn card(icon: &str, title: &str, body: &str) -> String {
    format!(
        "                <div class=\"capability-card\">
                    <div class=\"capability-header\">
                        <span class=\"capability-icon\">{}</span>
                        <h4>{}</h4>
                    </div>
                    <p>{}</p>
                </div>
",
        encode_text(icon),
        encode_text(title),
        encode_text(body)
    )
}

fn overflow(total: usize, limit: usize) -> Option<usize> {
    (total > limit).then(|| total - limit)
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
