use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// Mirrors of the summaries served by the kluctl webui backend.

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectKey {
    #[serde(default)]
    pub git_repo_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetKey {
    #[serde(default)]
    pub target_name: String,
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discriminator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(default)]
    pub project: ProjectKey,
    #[serde(default)]
    pub targets: Vec<TargetSummary>,
}

// --- Target ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetSummary {
    #[serde(default)]
    pub target: TargetKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kd_info: Option<KluctlDeploymentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kd: Option<KluctlDeploymentWithClusterId>,
    /// Most recent first.
    #[serde(default)]
    pub command_results: Vec<CommandResultSummary>,
}

impl TargetSummary {
    pub fn deployment_spec(&self) -> Option<&DeploymentSpec> {
        self.kd.as_ref().map(|kd| &kd.deployment.spec)
    }

    pub fn current_result(&self) -> Option<&CommandResultSummary> {
        self.command_results.first()
    }
}

/// Identity of a KluctlDeployment object, used to address approval requests.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KluctlDeploymentInfo {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KluctlDeploymentWithClusterId {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub deployment: KluctlDeployment,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct KluctlDeployment {
    #[serde(default)]
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_objects_hash: Option<String>,
}

impl DeploymentSpec {
    /// A manual deployment that is actually applied once approved.
    pub fn is_manual_live(&self) -> bool {
        self.manual && !self.dry_run
    }
}

// --- Command results ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandInfo {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub dry_run: bool,
    /// Absent when the backend sends no time or one that is not RFC 3339.
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

fn lenient_time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.to_utc())))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandResultSummary {
    pub id: String,
    #[serde(default)]
    pub command_info: CommandInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_objects_hash: Option<String>,
    #[serde(default)]
    pub new_objects: u32,
    #[serde(default)]
    pub changed_objects: u32,
    #[serde(default)]
    pub orphan_objects: u32,
    #[serde(default)]
    pub deleted_objects: u32,
    #[serde(default)]
    pub total_changes: u32,
    #[serde(default)]
    pub errors: u32,
    #[serde(default)]
    pub warnings: u32,
}

impl CommandResultSummary {
    pub fn rendered_hash(&self) -> Option<&str> {
        self.rendered_objects_hash
            .as_deref()
            .filter(|h| !h.is_empty())
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes > 0
            || self.new_objects > 0
            || self.changed_objects > 0
            || self.deleted_objects > 0
            || self.orphan_objects > 0
    }
}
