use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::approval::ApprovalAction;
use crate::filter::FilterQuery;
use crate::models::views::{build_target_views, CommandResultView};
use crate::AppState;

use super::{actor_is_admin, dispatch_approval};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub healthy: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub revision: u64,
    pub targets: usize,
}

pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.store.status();
    let projects = state.store.snapshot().await;
    Json(StatusResponse {
        healthy: status.healthy,
        last_refresh: status.last_refresh,
        last_error: status.last_error,
        revision: state.store.revision(),
        targets: projects.iter().map(|p| p.targets.len()).sum(),
    })
}

pub async fn handle_list_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<CommandResultView>> {
    let filters = query.state();
    let is_admin = actor_is_admin(&state, &headers);
    let projects = state.store.snapshot().await;
    let rows = build_target_views(&projects, &filters, is_admin, Utc::now())
        .into_iter()
        .flat_map(|t| t.results)
        .collect();
    Json(rows)
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
    pub action: ApprovalAction,
}

pub async fn handle_approval(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ApprovalBody>,
) -> Response {
    let is_admin = actor_is_admin(&state, &headers);
    match dispatch_approval(&state, is_admin, &id, body.action).await {
        Ok(Some(request)) => (StatusCode::ACCEPTED, Json(request)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn handle_healthz() -> &'static str {
    "ok\n"
}
