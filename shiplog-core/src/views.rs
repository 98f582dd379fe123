//! Page-level aggregates derived from a parsed changelog.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::{CategorySpec, SecuritySpec};
use crate::domain::{Item, LogDocument};

/// An item annotated with the section it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatedItem<'a> {
    /// Originating section name.
    pub section: &'a str,
    /// The item itself.
    pub item: &'a Item,
}

/// Items with a known date, bucketed by date in ascending order.
pub type DateIndex<'a> = BTreeMap<NaiveDate, Vec<DatedItem<'a>>>;

/// Items gathered for one display category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView<'a> {
    /// The category definition that produced this view.
    pub spec: &'a CategorySpec,
    /// Matched items, in alias order then source order.
    pub items: Vec<&'a Item>,
}

impl CategoryView<'_> {
    /// Number of matched items.
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// Items shown on the security page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityView<'a> {
    /// Every item from the shield sections.
    pub shield: Vec<&'a Item>,
    /// Keyword-matched items from the infrastructure sections.
    pub infrastructure: Vec<&'a Item>,
}

/// Total number of items across all sections.
pub fn ship_count(document: &LogDocument) -> usize {
    document
        .sections()
        .iter()
        .map(|section| section.items.len())
        .sum()
}

/// Bucket every dated item by its ship date.
pub fn build_date_index(document: &LogDocument) -> DateIndex<'_> {
    let mut index = DateIndex::new();
    for section in document.sections() {
        for item in &section.items {
            if let Some(date) = item.date.known() {
                index.entry(date).or_default().push(DatedItem {
                    section: &section.name,
                    item,
                });
            }
        }
    }
    index
}

/// Most recent ship date, if any item is dated.
pub fn latest_ship_date(index: &DateIndex<'_>) -> Option<NaiveDate> {
    index.keys().next_back().copied()
}

/// Earliest ship date, if any item is dated.
pub fn earliest_ship_date(index: &DateIndex<'_>) -> Option<NaiveDate> {
    index.keys().next().copied()
}

/// Collect items from the sections listed in `aliases`, in alias order.
pub fn collect_sections<'a>(document: &'a LogDocument, aliases: &[String]) -> Vec<&'a Item> {
    aliases
        .iter()
        .filter_map(|alias| document.section(alias))
        .flat_map(|section| section.items.iter())
        .collect()
}

/// Build one view per category; categories without items are omitted.
pub fn aggregate_categories<'a>(
    document: &'a LogDocument,
    categories: &'a [CategorySpec],
) -> Vec<CategoryView<'a>> {
    categories
        .iter()
        .map(|spec| CategoryView {
            spec,
            items: collect_sections(document, &spec.sections),
        })
        .filter(|view| !view.items.is_empty())
        .collect()
}

/// Returns true if `name` contains any keyword, ignoring case.
pub fn matches_keywords(name: &str, keywords: &[String]) -> bool {
    let name = name.to_lowercase();
    keywords
        .iter()
        .any(|keyword| name.contains(&keyword.to_lowercase()))
}

/// Build the security page view.
pub fn security_view<'a>(document: &'a LogDocument, spec: &SecuritySpec) -> SecurityView<'a> {
    let shield = collect_sections(document, &spec.shield_sections);
    let infrastructure = collect_sections(document, &spec.infrastructure_sections)
        .into_iter()
        .filter(|item| matches_keywords(&item.name, &spec.keywords))
        .collect();
    SecurityView {
        shield,
        infrastructure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SiteCatalog;
    use crate::parser::parse_log;

    const SAMPLE: &str = "\
## Kavach
- **QR Scanner** — scans codes `SHIPPED 2025-02-01`
- **SMS Auto-Scan** — reads inbox `SHIPPED 2025-02-03`

## Infrastructure
- **DNS Monitor** — watches domains `SHIPPED 2025-02-01`
- **Phone Sync** — syncs phones
- **Self-Heal Daemon** — restarts services
- SHIPPED: 2025-02-02

## Dashboard
- **Grid View** — draws panels `SHIPPED 2025-01-15`

## Misc
- **Loose End** — not in any category
";

    #[test]
    fn ship_count_sums_sections() {
        let doc = parse_log(SAMPLE);
        let per_section: usize = doc.sections().iter().map(|s| s.items.len()).sum();
        assert_eq!(ship_count(&doc), per_section);
        assert_eq!(ship_count(&doc), 7);
    }

    #[test]
    fn date_index_excludes_unknown_and_sorts_ascending() {
        let doc = parse_log(SAMPLE);
        let index = build_date_index(&doc);

        let dates: Vec<String> = index.keys().map(|d| d.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2025-01-15", "2025-02-01", "2025-02-02", "2025-02-03"]
        );
        let dated: usize = index.values().map(Vec::len).sum();
        assert_eq!(dated, 5);
        assert!(
            index
                .values()
                .flatten()
                .all(|entry| entry.item.name != "Phone Sync" && entry.item.name != "Loose End")
        );
    }

    #[test]
    fn date_bucket_follows_section_order() {
        let doc = parse_log(SAMPLE);
        let index = build_date_index(&doc);
        let bucket = &index[&NaiveDate::from_ymd_opt(2025, 2, 1).expect("date")];

        let names: Vec<(&str, &str)> = bucket
            .iter()
            .map(|entry| (entry.section, entry.item.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("Kavach", "QR Scanner"), ("Infrastructure", "DNS Monitor")]
        );
    }

    #[test]
    fn latest_and_earliest_dates() {
        let doc = parse_log(SAMPLE);
        let index = build_date_index(&doc);
        assert_eq!(
            latest_ship_date(&index).map(|d| d.to_string()).as_deref(),
            Some("2025-02-03")
        );
        assert_eq!(
            earliest_ship_date(&index).map(|d| d.to_string()).as_deref(),
            Some("2025-01-15")
        );
        assert_eq!(latest_ship_date(&DateIndex::new()), None);
    }

    #[test]
    fn categories_concatenate_aliases_and_skip_empty() {
        let doc = parse_log(SAMPLE);
        let catalog = SiteCatalog::default();
        let views = aggregate_categories(&doc, &catalog.categories);

        let labels: Vec<&str> = views.iter().map(|v| v.spec.label.as_str()).collect();
        assert_eq!(labels, vec!["Security & Safety", "Infrastructure & Automation"]);

        let infra = &views[1];
        let names: Vec<&str> = infra.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Grid View", "DNS Monitor", "Phone Sync", "Self-Heal Daemon"]
        );
        assert_eq!(infra.count(), 4);
    }

    #[test]
    fn category_aggregation_is_idempotent() {
        let doc = parse_log(SAMPLE);
        let catalog = SiteCatalog::default();
        assert_eq!(
            aggregate_categories(&doc, &catalog.categories),
            aggregate_categories(&doc, &catalog.categories)
        );
    }

    #[test]
    fn security_view_filters_infrastructure_by_keyword() {
        let doc = parse_log(SAMPLE);
        let view = security_view(&doc, &SecuritySpec::default());

        let shield: Vec<&str> = view.shield.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(shield, vec!["QR Scanner", "SMS Auto-Scan"]);
        let infra: Vec<&str> = view.infrastructure.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(infra, vec!["DNS Monitor", "Self-Heal Daemon"]);
    }

    #[test]
    fn keyword_match_ignores_case() {
        let keywords = vec!["Audit".to_string()];
        assert!(matches_keywords("nightly AUDIT log", &keywords));
        assert!(!matches_keywords("backup", &keywords));
    }
}
