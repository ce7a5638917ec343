use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::approval::{compute_approval, ApprovalAction};
use crate::classify::{classify, Category};
use crate::filter::{FilterState, RowFacts};
use crate::helpers::{since, status_line};
use crate::models::kluctl::{CommandResultSummary, ProjectSummary, TargetSummary};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalView {
    pub approved: bool,
    pub action: ApprovalAction,
    #[serde(skip)]
    pub tooltip: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResultView {
    pub id: String,
    pub command: String,
    pub target_name: String,
    pub cluster_id: String,
    pub category: Category,
    pub icon: String,
    pub header_label: String,
    pub highlighted: bool,
    pub start_time: String,
    pub since: String,
    pub status_line: String,
    pub current: bool,
    pub approval: Option<ApprovalView>,
}

#[derive(Debug, Clone, Default)]
pub struct TargetView {
    pub name: String,
    pub cluster_id: String,
    pub discriminator: String,
    pub project: String,
    pub deployment: String,
    pub results: Vec<CommandResultView>,
}

pub fn build_result_view(
    target: &TargetSummary,
    rs: &CommandResultSummary,
    is_admin: bool,
    now: DateTime<Utc>,
) -> CommandResultView {
    let class = classify(rs, target.deployment_spec());
    let approval = compute_approval(is_admin, rs, target).map(|e| ApprovalView {
        approved: e.approved,
        action: e.action,
        tooltip: e.action.tooltip().to_string(),
    });

    CommandResultView {
        id: rs.id.clone(),
        command: rs.command_info.command.clone(),
        target_name: target.target.target_name.clone(),
        cluster_id: target.target.cluster_id.clone(),
        category: class.category,
        icon: class.category.icon().to_string(),
        header_label: class.header_label,
        highlighted: class.highlighted,
        start_time: rs
            .command_info
            .start_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        since: since(rs.command_info.start_time, now),
        status_line: status_line(rs),
        current: target.current_result().is_some_and(|c| c.id == rs.id),
        approval,
    }
}

/// Targets with their visible command results. A target is listed when one
/// of its results or the target itself passes the filters.
pub fn build_target_views(
    projects: &[ProjectSummary],
    filters: &FilterState,
    is_admin: bool,
    now: DateTime<Utc>,
) -> Vec<TargetView> {
    let mut views = Vec::new();

    for project in projects {
        for target in &project.targets {
            let results: Vec<CommandResultView> = target
                .command_results
                .iter()
                .filter(|rs| RowFacts::from_result(project, target, rs).is_visible(filters))
                .map(|rs| build_result_view(target, rs, is_admin, now))
                .collect();

            if results.is_empty() && !RowFacts::from_target(project, target).is_visible(filters) {
                continue;
            }

            let mut project_name = project.project.git_repo_key.clone();
            if !project.project.sub_dir.is_empty() {
                project_name = format!("{}/{}", project_name, project.project.sub_dir);
            }

            views.push(TargetView {
                name: target.target.target_name.clone(),
                cluster_id: target.target.cluster_id.clone(),
                discriminator: target.target.discriminator.clone(),
                project: project_name,
                deployment: target
                    .kd_info
                    .as_ref()
                    .map(|kd| format!("{}/{}", kd.namespace, kd.name))
                    .unwrap_or_default(),
                results,
            });
        }
    }

    views
}
