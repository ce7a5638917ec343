pub mod api;
pub mod sse;
pub mod ui;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::approval::{compute_approval, ApprovalAction, ManualObjectsHashRequest};
use crate::clients::store::find_result;
use crate::error::ConsoleError;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // JSON API
        .route("/api/status", get(api::handle_status))
        .route("/api/results", get(api::handle_list_results))
        .route("/api/results/{id}/approval", post(api::handle_approval))
        // Health
        .route("/healthz", get(api::handle_healthz))
        // Dashboard UI
        .route("/ui/", get(ui::handle_targets))
        .route("/ui/results/{id}", get(ui::handle_result_detail))
        .route("/ui/results/{id}/approval", post(ui::handle_approval_form))
        .route("/ui/events", get(sse::handle_events))
        // Static files
        .nest_service("/ui/static", ServeDir::new("static"))
        // Root redirect
        .route(
            "/",
            get(|| async {
                axum::response::Redirect::to("/ui/")
            }),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Whether the user named in the configured header is admin-equivalent.
pub fn actor_is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    let user = headers
        .get(state.config.auth.user_header.as_str())
        .and_then(|v| v.to_str().ok());
    state.config.is_admin(user)
}

/// Recomputes eligibility against the latest snapshot and sends the
/// approval write. `Ok(None)` means there was no deployment to address.
pub async fn dispatch_approval(
    state: &AppState,
    is_admin: bool,
    id: &str,
    requested: ApprovalAction,
) -> Result<Option<ManualObjectsHashRequest>, ConsoleError> {
    let projects = state.store.snapshot().await;
    let loc = find_result(&projects, id)
        .ok_or_else(|| ConsoleError::NotFound(format!("command result {:?}", id)))?;

    let eligibility = compute_approval(is_admin, loc.result, loc.target).ok_or_else(|| {
        ConsoleError::Forbidden(format!("command result {:?} cannot be approved", id))
    })?;

    if eligibility.action != requested {
        return Err(ConsoleError::Conflict(format!(
            "command result {:?} expects {}, got {}",
            id,
            eligibility.action.as_str(),
            requested.as_str()
        )));
    }

    Ok(eligibility.invoke(state.approvals.as_ref()))
}
