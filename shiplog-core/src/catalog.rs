//! Site catalog: the category alias table and page configuration.
//!
//! Section names in the changelog drift over time, so each display category
//! lists every historical section name that feeds it. The catalog is plain
//! data and can be supplied as JSON; [`SiteCatalog::default`] carries the
//! built-in table.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShipLogError};
use crate::fs::FileSystem;

/// A display category and the section aliases that feed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Stable category label.
    pub label: String,
    /// Glyph shown next to the label.
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Short blurb rendered under the heading.
    #[serde(default)]
    pub description: String,
    /// Section names that feed this category, in display order.
    pub sections: Vec<String>,
}

impl CategorySpec {
    /// Create a category from a label, icon, blurb and section aliases.
    pub fn new(label: &str, icon: &str, description: &str, sections: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
            sections: sections.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// HTML anchor id derived from the label.
    pub fn anchor(&self) -> String {
        self.label
            .to_lowercase()
            .replace(' ', "-")
            .replace('&', "and")
    }
}

/// Section families used by the security page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySpec {
    /// Sections listed in full as the security shield.
    pub shield_sections: Vec<String>,
    /// Sections whose items are filtered by keyword.
    pub infrastructure_sections: Vec<String>,
    /// Case-insensitive name keywords that mark an item as security relevant.
    pub keywords: Vec<String>,
}

impl Default for SecuritySpec {
    fn default() -> Self {
        Self {
            shield_sections: strings(&["Kavach", "Kavach / Chetana", "Kavach/Chetana"]),
            infrastructure_sections: strings(&["Infrastructure", "MirrorDNA Infrastructure"]),
            keywords: strings(&["security", "audit", "snapshot", "dns", "heal"]),
        }
    }
}

/// A navigation bar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    /// Directory slug under the site root; also the active-page key.
    pub slug: String,
    /// Link text.
    pub label: String,
}

impl NavEntry {
    fn new(slug: &str, label: &str) -> Self {
        Self {
            slug: slug.to_string(),
            label: label.to_string(),
        }
    }
}

/// Everything the renderer needs besides the parsed changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteCatalog {
    /// Site name used in titles, the logo and the footer.
    pub site_name: String,
    /// Name of the changelog shown in "auto-generated from" notes.
    #[serde(default = "default_source_label")]
    pub source_label: String,
    /// Capability categories in display order.
    pub categories: Vec<CategorySpec>,
    /// Security page configuration.
    #[serde(default)]
    pub security: SecuritySpec,
    /// Navigation bar entries.
    #[serde(default = "default_navigation")]
    pub navigation: Vec<NavEntry>,
}

impl Default for SiteCatalog {
    fn default() -> Self {
        Self {
            site_name: "MirrorDNA".to_string(),
            source_label: default_source_label(),
            categories: default_categories(),
            security: SecuritySpec::default(),
            navigation: default_navigation(),
        }
    }
}

impl SiteCatalog {
    /// Parse and validate a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file, failing with `MissingInput` when it does not exist.
    pub fn load<F: FileSystem>(fs: &F, path: &Path) -> Result<Self> {
        if !fs.exists(path)? {
            return Err(ShipLogError::MissingInput(path.to_path_buf()));
        }
        Self::from_json(&fs.read_to_string(path)?)
    }

    /// Check structural invariants of the catalog.
    pub fn validate(&self) -> Result<()> {
        if self.site_name.trim().is_empty() {
            return Err(ShipLogError::Config("site name is empty".to_string()));
        }
        let mut labels = BTreeSet::new();
        for category in &self.categories {
            if category.label.trim().is_empty() {
                return Err(ShipLogError::Config("category label is empty".to_string()));
            }
            if !labels.insert(category.label.as_str()) {
                return Err(ShipLogError::Config(format!(
                    "duplicate category: {}",
                    category.label
                )));
            }
            if category.sections.is_empty() {
                return Err(ShipLogError::Config(format!(
                    "category {} has no sections",
                    category.label
                )));
            }
        }
        if self
            .security
            .keywords
            .iter()
            .any(|keyword| keyword.trim().is_empty())
        {
            return Err(ShipLogError::Config("empty security keyword".to_string()));
        }
        Ok(())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn default_icon() -> String {
    "⟡".to_string()
}

fn default_source_label() -> String {
    "SHIPLOG".to_string()
}

fn default_navigation() -> Vec<NavEntry> {
    vec![
        NavEntry::new("story", "Story"),
        NavEntry::new("principles", "Principles"),
        NavEntry::new("architecture", "Architecture"),
        NavEntry::new("security", "Security"),
        NavEntry::new("capabilities", "Capabilities"),
        NavEntry::new("activemirror", "Active Mirror"),
        NavEntry::new("research", "Research"),
        NavEntry::new("ecosystem", "Ecosystem"),
    ]
}

fn default_categories() -> Vec<CategorySpec> {
    vec![
        CategorySpec::new(
            "Security & Safety",
            "🛡️",
            "Defense-in-depth architecture. Scam shield. Deepfake detection. Fail-closed by default.",
            &["Kavach", "Kavach / Chetana", "Kavach/Chetana"],
        ),
        CategorySpec::new(
            "Intelligence & Inference",
            "◈",
            "Multi-model orchestration with sovereign routing. Swarm intelligence. Research monitoring.",
            &[
                "MirrorSwarm Orchestration Engine",
                "MirrorSwarm Terminal Spawner",
                "Intelligence",
            ],
        ),
        CategorySpec::new(
            "Memory & Identity",
            "⧉",
            "Persistent state across sessions. Memory lifecycle. Vault integrity. Continuity bus.",
            &["Continuity System (this file)", "Vault Organization"],
        ),
        CategorySpec::new(
            "Consumer Products",
            "⟡",
            "User-facing products built on sovereign infrastructure.",
            &["ActiveMirror Site", "Active Mirror Site", "ActiveMirrorOS"],
        ),
        CategorySpec::new(
            "Infrastructure & Automation",
            "⚙",
            "Self-healing infrastructure. Managed services. Domain monitoring. Auto-backup.",
            &[
                "Factory Trigger",
                "Cognitive Dashboard",
                "Dashboard",
                "INFRASTRUCTURE",
                "Infrastructure",
                "MirrorDNA Infrastructure",
                "Swarm Automation",
            ],
        ),
        CategorySpec::new(
            "Publishing & Distribution",
            "📡",
            "Multi-platform publishing. Auto-synthesized beacon. Distribution channels.",
            &[
                "MirrorPublish",
                "MirrorPublish Content",
                "Beacon Auto-Publish",
                "Publications",
                "MirrorRadar",
            ],
        ),
        CategorySpec::new(
            "Sovereign Factory",
            "🏭",
            "Multi-agent manufacturing pipeline. Voice-triggered. Grid visualization.",
            &["Sovereign Factory", "Swarm Choreography Pattern"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::path::PathBuf;

    #[test]
    fn default_catalog_is_valid() {
        let catalog = SiteCatalog::default();
        catalog.validate().expect("valid");
        assert_eq!(catalog.categories.len(), 7);
    }

    #[test]
    fn anchor_is_slugified() {
        let category = CategorySpec::new("Security & Safety", "x", "", &["Kavach"]);
        assert_eq!(category.anchor(), "security-and-safety");
    }

    #[test]
    fn default_navigation_lists_every_site_section() {
        let slugs: Vec<String> = SiteCatalog::default()
            .navigation
            .into_iter()
            .map(|entry| entry.slug)
            .collect();
        assert_eq!(
            slugs,
            vec![
                "story",
                "principles",
                "architecture",
                "security",
                "capabilities",
                "activemirror",
                "research",
                "ecosystem"
            ]
        );
    }

    #[test]
    fn from_json_applies_defaults() {
        let catalog = SiteCatalog::from_json(
            r#"{"siteName": "Demo", "categories": [{"label": "Widgets", "sections": ["Widgets", "Gadgets"]}]}"#,
        )
        .expect("catalog");

        assert_eq!(catalog.site_name, "Demo");
        assert_eq!(catalog.source_label, "SHIPLOG");
        assert_eq!(catalog.categories[0].icon, "⟡");
        assert_eq!(catalog.security, SecuritySpec::default());
        assert!(!catalog.navigation.is_empty());
    }

    #[test]
    fn validate_rejects_duplicate_and_empty_categories() {
        let duplicate = r#"{"siteName": "Demo", "categories": [
            {"label": "A", "sections": ["x"]},
            {"label": "A", "sections": ["y"]}
        ]}"#;
        assert!(matches!(
            SiteCatalog::from_json(duplicate),
            Err(ShipLogError::Config(_))
        ));

        let empty = r#"{"siteName": "Demo", "categories": [{"label": "A", "sections": []}]}"#;
        assert!(matches!(
            SiteCatalog::from_json(empty),
            Err(ShipLogError::Config(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(false));

        let result = SiteCatalog::load(&fs, &PathBuf::from("/etc/catalog.json"));

        assert!(matches!(result, Err(ShipLogError::MissingInput(_))));
    }

    #[test]
    fn load_reads_catalog_file() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_read_to_string().returning(|_| {
            Ok(r#"{"siteName": "Demo", "categories": [{"label": "A", "sections": ["x"]}]}"#
                .to_string())
        });

        let catalog = SiteCatalog::load(&fs, &PathBuf::from("catalog.json")).expect("catalog");

        assert_eq!(catalog.categories[0].sections, vec!["x".to_string()]);
    }
}
