//! Domain entities for shiplog.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ship date of an item: a calendar date or the "unknown" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ShipDate {
    /// A real calendar date.
    Known(NaiveDate),
    /// No date was recorded, or the recorded token was not a valid date.
    #[default]
    Unknown,
}

impl ShipDate {
    /// Parse a `YYYY-MM-DD` token, falling back to [`ShipDate::Unknown`].
    pub fn parse(token: &str) -> Self {
        NaiveDate::parse_from_str(token.trim(), "%Y-%m-%d")
            .map(Self::Known)
            .unwrap_or(Self::Unknown)
    }

    /// Returns the calendar date, if known.
    pub fn known(&self) -> Option<NaiveDate> {
        match self {
            Self::Known(date) => Some(*date),
            Self::Unknown => None,
        }
    }

    /// Returns true if no date is recorded.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ShipDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for ShipDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShipDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One shipped unit of work recorded in the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Bolded item name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Ship date, or unknown.
    pub date: ShipDate,
}

impl Item {
    /// Create an item.
    pub fn new(name: impl Into<String>, description: impl Into<String>, date: ShipDate) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            date,
        }
    }

    /// Assign `date` only when no date is recorded yet. Returns true if assigned.
    pub fn backfill_date(&mut self, date: ShipDate) -> bool {
        if !self.date.is_unknown() || date.is_unknown() {
            return false;
        }
        self.date = date;
        true
    }
}

/// A named group of items introduced by a `## ` heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text.
    pub name: String,
    /// Optional module label from a `> Module:` line.
    pub module: Option<String>,
    /// Items in document order.
    pub items: Vec<Item>,
}

impl Section {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            items: Vec::new(),
        }
    }
}

/// A parsed changelog: sections with unique names, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDocument {
    sections: Vec<Section>,
}

impl LogDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a section. A section with the same name is replaced in place.
    pub fn insert(&mut self, section: Section) {
        match self.sections.iter_mut().find(|existing| existing.name == section.name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Sections in document order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
