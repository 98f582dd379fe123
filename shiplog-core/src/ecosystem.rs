//! Repository catalog grouped by role.

use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShipLogError};
use crate::fs::FileSystem;

const RULE_WIDTH: usize = 110;
const NAME_WIDTH: usize = 35;
const VISIBILITY_WIDTH: usize = 12;
const DESCRIPTION_WIDTH: usize = 60;

/// Whether a repository is publicly visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Publicly visible.
    Public,
    /// Private.
    Private,
}

impl Visibility {
    fn label(self) -> &'static str {
        match self {
            Self::Public => "🌐 public",
            Self::Private => "🔒 private",
        }
    }
}

/// Role a repository plays in the ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Specifications.
    Spec,
    /// Documentation.
    Docs,
    /// Shipping products.
    Product,
    /// Client SDKs.
    Sdk,
    /// Examples and experiments.
    Playground,
    /// Research and development.
    #[serde(rename = "r&d")]
    Research,
    /// Any role not listed above.
    #[serde(other)]
    Other,
}

impl Role {
    /// Display order of the listed roles.
    pub const ORDERED: [Role; 6] = [
        Role::Spec,
        Role::Docs,
        Role::Product,
        Role::Sdk,
        Role::Playground,
        Role::Research,
    ];

    /// Heading used above the role's table.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Spec => "📋 Specification",
            Self::Docs => "📚 Documentation",
            Self::Product => "🚀 Products",
            Self::Sdk => "🔧 SDKs",
            Self::Playground => "🎮 Playground",
            Self::Research => "🔬 R&D",
            Self::Other => "Other",
        }
    }

    /// Name used in the summary counts.
    pub fn summary_name(self) -> &'static str {
        match self {
            Self::Spec => "Specifications",
            Self::Docs => "Documentation",
            Self::Product => "Products",
            Self::Sdk => "SDKs",
            Self::Playground => "Playground/Examples",
            Self::Research => "Research & Development",
            Self::Other => "Other",
        }
    }
}

/// One repository entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name.
    pub name: String,
    /// Visibility.
    pub visibility: Visibility,
    /// Ecosystem role.
    pub role: Role,
    /// One-line description.
    #[serde(default)]
    pub description: String,
}

/// The full repository catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemMap {
    /// Every repository, in file order.
    pub repositories: Vec<Repository>,
}

impl EcosystemMap {
    /// Parse a catalog from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a catalog file.
    pub fn load<F: FileSystem>(fs: &F, path: &Path) -> Result<Self> {
        if !fs.exists(path)? {
            return Err(ShipLogError::MissingInput(path.to_path_buf()));
        }
        Self::from_json(&fs.read_to_string(path)?)
    }

    /// Listed roles with their repositories sorted by name; empty roles are omitted.
    pub fn grouped(&self) -> Vec<(Role, Vec<&Repository>)> {
        Role::ORDERED
            .iter()
            .filter_map(|role| {
                let mut repos: Vec<&Repository> = self
                    .repositories
                    .iter()
                    .filter(|repo| repo.role == *role)
                    .collect();
                if repos.is_empty() {
                    return None;
                }
                repos.sort_by(|a, b| a.name.cmp(&b.name));
                Some((*role, repos))
            })
            .collect()
    }

    /// Visibility and role totals.
    pub fn summary(&self) -> EcosystemSummary {
        let count = |visibility| {
            self.repositories
                .iter()
                .filter(|repo| repo.visibility == visibility)
                .count()
        };
        EcosystemSummary {
            total: self.repositories.len(),
            public: count(Visibility::Public),
            private: count(Visibility::Private),
            roles: self
                .grouped()
                .into_iter()
                .map(|(role, repos)| RoleCount {
                    role,
                    name: role.summary_name().to_string(),
                    count: repos.len(),
                })
                .collect(),
        }
    }
}

/// Count of repositories in one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    /// Role.
    pub role: Role,
    /// Display name.
    pub name: String,
    /// Number of repositories.
    pub count: usize,
}

/// Totals across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EcosystemSummary {
    /// All repositories, including unlisted roles.
    pub total: usize,
    /// Public repositories.
    pub public: usize,
    /// Private repositories.
    pub private: usize,
    /// Per-role counts in display order.
    pub roles: Vec<RoleCount>,
}

/// Shorten a description to the table column width.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_WIDTH {
        let mut short: String = description.chars().take(DESCRIPTION_WIDTH - 3).collect();
        short.push_str("...");
        short
    } else {
        description.to_string()
    }
}

/// Render role tables followed by the summary.
pub fn render_ecosystem(map: &EcosystemMap, title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut output = String::new();
    let _ = writeln!(output, "\n{rule}");
    let _ = writeln!(output, "{}{}", " ".repeat(35), title);
    let _ = writeln!(output, "{rule}\n");

    for (role, repos) in map.grouped() {
        let _ = writeln!(output, "\n{}", role.heading());
        let _ = writeln!(output, "{}", "━".repeat(RULE_WIDTH));
        let _ = writeln!(
            output,
            "{:<NAME_WIDTH$} {:<VISIBILITY_WIDTH$} {:<DESCRIPTION_WIDTH$}",
            "Repository", "Visibility", "Description"
        );
        let _ = writeln!(output, "{rule}");
        for repo in repos {
            let _ = writeln!(
                output,
                "{:<NAME_WIDTH$} {:<VISIBILITY_WIDTH$} {:<DESCRIPTION_WIDTH$}",
                repo.name,
                repo.visibility.label(),
                truncate_description(&repo.description)
            );
        }
    }
    let _ = writeln!(output, "\n{rule}\n");

    let summary = map.summary();
    let _ = writeln!(output, "SUMMARY");
    let _ = writeln!(output, "{rule}");
    let _ = writeln!(output, "\nTotal repositories: {}", summary.total);
    let _ = writeln!(output, "  🌐 Public:  {}", summary.public);
    let _ = writeln!(output, "  🔒 Private: {}", summary.private);
    let _ = writeln!(output, "\nBy role:");
    for role in &summary.roles {
        let _ = writeln!(output, "  {:<25}: {}", role.name, role.count);
    }
    let _ = writeln!(output, "\n{rule}");
    output
}

/// Render the catalog as Markdown tables.
pub fn render_ecosystem_markdown(map: &EcosystemMap, title: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {title}\n");
    for (role, repos) in map.grouped() {
        let _ = writeln!(output, "## {}\n", role.heading());
        let _ = writeln!(output, "| Repository | Visibility | Description |");
        let _ = writeln!(output, "| --- | --- | --- |");
        for repo in repos {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                repo.name,
                repo.visibility.label(),
                repo.description.replace('|', "\\|")
            );
        }
        let _ = writeln!(output);
    }

    let summary = map.summary();
    let _ = writeln!(output, "## Summary\n");
    let _ = writeln!(
        output,
        "{} repositories: {} public, {} private.\n",
        summary.total, summary.public, summary.private
    );
    for role in &summary.roles {
        let _ = writeln!(output, "- {}: {}", role.name, role.count);
    }
    output
}
