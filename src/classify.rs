//! Maps a command result to the card it is displayed as.

use serde::Serialize;

use crate::models::kluctl::{CommandResultSummary, DeploymentSpec};

/// Commands the console knows how to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Delete,
    Deploy,
    Diff,
    PokeImages,
    Prune,
    /// Anything else reported by the backend, kept verbatim.
    Unrecognized(String),
}

impl Command {
    pub fn parse(s: &str) -> Self {
        match s {
            "delete" => Command::Delete,
            "deploy" => Command::Deploy,
            "diff" => Command::Diff,
            "poke-images" => Command::PokeImages,
            "prune" => Command::Prune,
            other => Command::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Delete,
    Deploy,
    DryRunDeploy,
    ManualDeployPending,
    Diff,
    PokeImages,
    Prune,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Delete => "delete",
            Category::Deploy => "deploy",
            Category::DryRunDeploy => "dry-run-deploy",
            Category::ManualDeployPending => "manual-deploy-pending",
            Category::Diff => "diff",
            Category::PokeImages => "poke-images",
            Category::Prune => "prune",
        }
    }

    /// Icon drawn on the card.
    pub fn icon(self) -> &'static str {
        match self {
            Category::Delete | Category::Prune => "prune",
            Category::Deploy | Category::DryRunDeploy | Category::PokeImages => "deploy",
            Category::ManualDeployPending => "live-help",
            Category::Diff => "diff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: Category,
    pub highlighted: bool,
    pub header_label: String,
}

impl ClassificationResult {
    fn plain(category: Category, header_label: &str) -> Self {
        Self {
            category,
            highlighted: false,
            header_label: header_label.to_string(),
        }
    }
}

pub fn classify(rs: &CommandResultSummary, owner: Option<&DeploymentSpec>) -> ClassificationResult {
    let command = Command::parse(&rs.command_info.command);
    match command {
        Command::Delete => ClassificationResult::plain(Category::Delete, "delete"),
        Command::Deploy if !rs.command_info.dry_run => {
            ClassificationResult::plain(Category::Deploy, "deploy")
        }
        Command::Deploy if owner.is_some_and(DeploymentSpec::is_manual_live) => {
            ClassificationResult {
                category: Category::ManualDeployPending,
                highlighted: true,
                header_label: "manual deploy".to_string(),
            }
        }
        Command::Deploy => ClassificationResult::plain(Category::DryRunDeploy, "dry-run deploy"),
        Command::Diff => ClassificationResult::plain(Category::Diff, "diff"),
        Command::PokeImages => ClassificationResult::plain(Category::PokeImages, "poke-images"),
        Command::Prune => ClassificationResult::plain(Category::Prune, "prune"),
        Command::Unrecognized(raw) => ClassificationResult {
            category: Category::Diff,
            highlighted: false,
            header_label: raw,
        },
    }
}
