use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use tokio::sync::watch;

use crate::approval::ApprovalAction;
use crate::clients::store::find_result;
use crate::filter::{FilterController, FilterQuery, FilterState, FilterSwitch};
use crate::models::views::{build_result_view, build_target_views, CommandResultView, TargetView};
use crate::AppState;

use super::{actor_is_admin, dispatch_approval};

// --- Template Structs ---

#[derive(Debug, Clone)]
struct Breadcrumb {
    label: String,
    url: String,
}

#[derive(Debug, Clone)]
struct FilterButtonView {
    key: &'static str,
    tooltip: &'static str,
    active: bool,
    href: String,
}

fn render_template(tmpl: &impl Template) -> Response {
    match tmpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Dashboard URL carrying `state`, plus an optional pending switch toggle.
fn filter_url(state: &FilterState, toggle: Option<FilterSwitch>) -> String {
    let Ok(mut url) = Url::parse("http://console/ui/") else {
        return "/ui/".to_string();
    };
    {
        let mut q = url.query_pairs_mut();
        for switch in FilterSwitch::ALL {
            if switch.is_active(state) {
                q.append_pair(switch.query_key(), "true");
            }
        }
        if !state.filter_str.is_empty() {
            q.append_pair("filterStr", &state.filter_str);
        }
        if let Some(switch) = toggle {
            q.append_pair("toggle", switch.query_key());
        }
    }
    match url.query() {
        Some(q) if !q.is_empty() => format!("/ui/?{}", q),
        _ => "/ui/".to_string(),
    }
}

// --- Targets ---

#[derive(Template)]
#[template(path = "targets.html")]
struct TargetsTemplate {
    title: String,
    breadcrumbs: Vec<Breadcrumb>,
    filters: FilterState,
    buttons: Vec<FilterButtonView>,
    targets: Vec<TargetView>,
    result_count: usize,
    canonical_url: String,
}

pub async fn handle_targets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FilterQuery>,
) -> Response {
    let mut controller = FilterController::new(query.state());

    // The address bar is rewritten to the edited state so reloads do not
    // replay the toggle.
    let (canonical_tx, canonical) = watch::channel(String::new());
    controller.subscribe(move |s| {
        canonical_tx.send_replace(filter_url(s, None));
    });

    if let Some(switch) = query.toggle() {
        let update = switch.toggle(controller.state());
        controller.set_filter(update);
    }
    let filters = controller.into_state();
    let canonical_url = canonical.borrow().clone();

    let is_admin = actor_is_admin(&state, &headers);
    let projects = state.store.snapshot().await;
    let targets = build_target_views(&projects, &filters, is_admin, Utc::now());

    let buttons = FilterSwitch::ALL
        .into_iter()
        .map(|switch| FilterButtonView {
            key: switch.query_key(),
            tooltip: switch.tooltip(),
            active: switch.is_active(&filters),
            href: filter_url(&filters, Some(switch)),
        })
        .collect();

    let tmpl = TargetsTemplate {
        title: "Targets".to_string(),
        breadcrumbs: vec![Breadcrumb {
            label: "Targets".to_string(),
            url: "/ui/".to_string(),
        }],
        result_count: targets.iter().map(|t| t.results.len()).sum(),
        filters,
        buttons,
        targets,
        canonical_url,
    };

    render_template(&tmpl)
}

// --- Result Detail ---

#[derive(Template)]
#[template(path = "result_detail.html")]
struct ResultDetailTemplate {
    title: String,
    breadcrumbs: Vec<Breadcrumb>,
    card: CommandResultView,
    project: String,
    command_info_yaml: String,
}

pub async fn handle_result_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let projects = state.store.snapshot().await;
    let Some(loc) = find_result(&projects, &id) else {
        return (StatusCode::NOT_FOUND, "Command result not found").into_response();
    };

    let is_admin = actor_is_admin(&state, &headers);
    let card = build_result_view(loc.target, loc.result, is_admin, Utc::now());
    let command_info_yaml = serde_yaml::to_string(&loc.result.command_info).unwrap_or_else(|e| {
        tracing::warn!("rendering command info of {}: {}", id, e);
        String::new()
    });

    let tmpl = ResultDetailTemplate {
        title: format!("{}: {}", card.header_label, card.target_name),
        breadcrumbs: vec![
            Breadcrumb {
                label: "Targets".to_string(),
                url: "/ui/".to_string(),
            },
            Breadcrumb {
                label: id.clone(),
                url: String::new(),
            },
        ],
        project: loc.project.project.git_repo_key.clone(),
        card,
        command_info_yaml,
    };

    render_template(&tmpl)
}

// --- Approval ---

#[derive(Debug, Deserialize)]
pub struct ApprovalForm {
    pub action: ApprovalAction,
}

pub async fn handle_approval_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ApprovalForm>,
) -> Response {
    let is_admin = actor_is_admin(&state, &headers);
    match dispatch_approval(&state, is_admin, &id, form.action).await {
        Ok(_) => Redirect::to("/ui/").into_response(),
        Err(e) => e.into_response(),
    }
}
