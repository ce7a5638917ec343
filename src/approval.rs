//! Manual-deployment approval.
//!
//! A manual KluctlDeployment only applies the objects whose hash matches
//! `spec.manualObjectsHash`. Approving the most recent dry-run copies its
//! rendered-objects hash there; cancelling clears it. This module only
//! decides what should happen. The write goes through an [`ApprovalApi`]
//! and the new state shows up with the next backend refresh.

use serde::{Deserialize, Serialize};

use crate::models::kluctl::{CommandResultSummary, KluctlDeploymentInfo, TargetSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalAction {
    Approve,
    Cancel,
}

impl ApprovalAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approve",
            ApprovalAction::Cancel => "cancel",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            ApprovalAction::Approve => "Click here to trigger this manual deployment.",
            ApprovalAction::Cancel => {
                "Click here to cancel this deployment. This will only have an effect if the deployment has not started reconciliation yet!"
            }
        }
    }
}

/// Request to overwrite a deployment's manual approval hash. An empty
/// `objects_hash` clears the approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualObjectsHashRequest {
    pub cluster: KluctlDeploymentInfo,
    pub objects_hash: String,
}

/// Receives approval writes. Calls are fire-and-forget.
pub trait ApprovalApi: Send + Sync {
    fn set_manual_objects_hash(&self, request: ManualObjectsHashRequest);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalEligibility {
    pub approved: bool,
    pub action: ApprovalAction,
    rendered_objects_hash: String,
    deployment: Option<KluctlDeploymentInfo>,
}

impl ApprovalEligibility {
    /// The request that performing [`Self::action`] sends, if the target
    /// carries a deployment reference.
    pub fn request(&self) -> Option<ManualObjectsHashRequest> {
        let cluster = self.deployment.clone()?;
        let objects_hash = match self.action {
            ApprovalAction::Approve => {
                if self.rendered_objects_hash.is_empty() {
                    return None;
                }
                self.rendered_objects_hash.clone()
            }
            ApprovalAction::Cancel => String::new(),
        };
        Some(ManualObjectsHashRequest {
            cluster,
            objects_hash,
        })
    }

    /// Sends the request for [`Self::action`] exactly once. Returns what was
    /// sent, or `None` when there was nothing to address.
    pub fn invoke(&self, api: &dyn ApprovalApi) -> Option<ManualObjectsHashRequest> {
        let Some(request) = self.request() else {
            tracing::debug!("approval has no deployment reference, skipping");
            return None;
        };
        tracing::info!(
            cluster = %request.cluster.cluster_id,
            name = %request.cluster.name,
            namespace = %request.cluster.namespace,
            action = self.action.as_str(),
            "setting manual objects hash"
        );
        api.set_manual_objects_hash(request.clone());
        Some(request)
    }
}

/// Returns `None` when no approval control applies to `rs`.
pub fn compute_approval(
    actor_is_admin: bool,
    rs: &CommandResultSummary,
    target: &TargetSummary,
) -> Option<ApprovalEligibility> {
    if !actor_is_admin {
        return None;
    }
    let spec = target.deployment_spec()?;
    if !spec.is_manual_live() {
        return None;
    }
    if target.current_result()?.id != rs.id {
        return None;
    }
    if !rs.command_info.dry_run {
        return None;
    }
    let hash = rs.rendered_hash()?;

    let approved = spec.manual_objects_hash.as_deref() == Some(hash);
    Some(ApprovalEligibility {
        approved,
        action: if approved {
            ApprovalAction::Cancel
        } else {
            ApprovalAction::Approve
        },
        rendered_objects_hash: hash.to_string(),
        deployment: target.kd_info.clone(),
    })
}
