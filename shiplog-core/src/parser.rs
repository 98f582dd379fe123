//! Changelog parsing.
//!
//! The changelog is line oriented. Four line shapes carry meaning:
//!
//! - `## Name` opens a section,
//! - ``> Module: `label` `` labels the open section,
//! - ``- **Name** (note) — description `SHIPPED 2025-01-02` `` records an item,
//! - `- Location:`, `- Spec:` and `- SHIPPED:` annotate the last item.
//!
//! Everything else is inert. Parsing never fails: malformed item lines and
//! sections without items are dropped.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::domain::{Item, LogDocument, Section, ShipDate};

const SECTION_MARKER: &str = "## ";
const MODULE_MARKER: &str = "> Module:";
const ITEM_MARKER: &str = "- **";
const SHIPPED_METADATA: &str = "- SHIPPED:";
const METADATA_MARKERS: [&str; 3] = ["- Location:", "- Spec:", SHIPPED_METADATA];

static ITEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^- \*\*(.+?)\*\*\s*(?:\([^)]*\))?\s*[—–:]\s*(.+?)(?:\s*`SHIPPED (\d{4}-\d{2}-\d{2})`)?$",
    )
    .expect("item pattern compiles")
});

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date pattern compiles"));

/// Parse changelog text into a [`LogDocument`].
pub fn parse_log(text: &str) -> LogDocument {
    let mut parser = Parser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Parse a single item line, if it matches the item pattern.
pub fn parse_item_line(line: &str) -> Option<Item> {
    let captures = ITEM_LINE.captures(line)?;
    let name = captures.get(1)?.as_str();
    let description = captures
        .get(2)?
        .as_str()
        .trim()
        .trim_end_matches('`')
        .trim();
    let date = captures
        .get(3)
        .map(|token| ShipDate::parse(token.as_str()))
        .unwrap_or_default();
    Some(Item::new(name, description, date))
}

fn parse_module_label(rest: &str) -> String {
    match rest.split_once('`') {
        Some((_, quoted)) => quoted.split('`').next().unwrap_or_default().to_string(),
        None => rest.trim().to_string(),
    }
}

/// The section currently being filled, with a cursor on its last appended item.
#[derive(Debug)]
struct OpenSection {
    section: Section,
    last_item: Option<usize>,
}

impl OpenSection {
    fn new(name: &str) -> Self {
        Self {
            section: Section::new(name),
            last_item: None,
        }
    }

    fn push(&mut self, item: Item) {
        self.section.items.push(item);
        self.last_item = Some(self.section.items.len() - 1);
    }

    fn last_item_mut(&mut self) -> Option<&mut Item> {
        let index = self.last_item?;
        self.section.items.get_mut(index)
    }
}

#[derive(Debug, Default)]
struct Parser {
    document: LogDocument,
    open: Option<OpenSection>,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if let Some(name) = line.strip_prefix(SECTION_MARKER) {
            self.flush();
            self.open = Some(OpenSection::new(name.trim()));
        } else if let Some(rest) = line.strip_prefix(MODULE_MARKER) {
            if let Some(open) = self.open.as_mut() {
                open.section.module = Some(parse_module_label(rest));
            }
        } else if line.starts_with(ITEM_MARKER) {
            match parse_item_line(line) {
                Some(item) => {
                    if let Some(open) = self.open.as_mut() {
                        open.push(item);
                    }
                }
                None => debug!("dropping malformed item line: {line}"),
            }
        } else if METADATA_MARKERS.iter().any(|marker| line.starts_with(marker)) {
            if line.starts_with(SHIPPED_METADATA) {
                self.backfill_date(line);
            }
        }
    }

    fn backfill_date(&mut self, line: &str) {
        let Some(item) = self.open.as_mut().and_then(OpenSection::last_item_mut) else {
            return;
        };
        if let Some(token) = DATE_TOKEN.find(line) {
            item.backfill_date(ShipDate::parse(token.as_str()));
        }
    }

    fn flush(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        if open.section.name.is_empty() || open.section.items.is_empty() {
            debug!("dropping empty section {:?}", open.section.name);
            return;
        }
        self.document.insert(open.section);
    }

    fn finish(mut self) -> LogDocument {
        self.flush();
        self.document
    }
}
