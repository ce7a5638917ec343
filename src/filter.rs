//! Row filtering for the command-result list.
//!
//! [`FilterState`] is the active filter configuration. Rows are kept when
//! they pass both [`passes_switches`] and [`passes_text`]; with nothing
//! active every row is visible. [`FilterController`] owns the state for a
//! view and pushes each new state to a single listener.

use serde::{Deserialize, Serialize};

use crate::models::kluctl::{CommandResultSummary, ProjectSummary, TargetSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Only rows that are changed or have errors/warnings.
    #[serde(default)]
    pub only_important: bool,
    #[serde(default)]
    pub only_changed: bool,
    #[serde(default)]
    pub only_with_errors_or_warnings: bool,
    /// Case-insensitive substring over the row's text fields. Empty disables it.
    #[serde(default)]
    pub filter_str: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        !self.only_important
            && !self.only_changed
            && !self.only_with_errors_or_warnings
            && self.filter_str.is_empty()
    }

    /// Field-level merge: fields present in `update` replace the current ones.
    pub fn merged(&self, update: &FilterUpdate) -> FilterState {
        FilterState {
            only_important: update.only_important.unwrap_or(self.only_important),
            only_changed: update.only_changed.unwrap_or(self.only_changed),
            only_with_errors_or_warnings: update
                .only_with_errors_or_warnings
                .unwrap_or(self.only_with_errors_or_warnings),
            filter_str: update
                .filter_str
                .clone()
                .unwrap_or_else(|| self.filter_str.clone()),
        }
    }
}

/// A partial edit of [`FilterState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUpdate {
    pub only_important: Option<bool>,
    pub only_changed: Option<bool>,
    pub only_with_errors_or_warnings: Option<bool>,
    pub filter_str: Option<String>,
}

/// Filter settings as they arrive in a query string.
///
/// Values are kept as raw strings so that `?onlyChanged=`, `=on` or a stale
/// `toggle` never fail the request. Only `true`, `on` and `1` switch a flag on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    #[serde(default)]
    pub only_important: Option<String>,
    #[serde(default)]
    pub only_changed: Option<String>,
    #[serde(default)]
    pub only_with_errors_or_warnings: Option<String>,
    #[serde(default)]
    pub filter_str: Option<String>,
    #[serde(default)]
    pub toggle: Option<String>,
}

impl FilterQuery {
    pub fn state(&self) -> FilterState {
        FilterState {
            only_important: query_flag(self.only_important.as_deref()),
            only_changed: query_flag(self.only_changed.as_deref()),
            only_with_errors_or_warnings: query_flag(self.only_with_errors_or_warnings.as_deref()),
            filter_str: self.filter_str.clone().unwrap_or_default(),
        }
    }

    /// The requested switch toggle; unknown names are ignored.
    pub fn toggle(&self) -> Option<FilterSwitch> {
        self.toggle.as_deref().and_then(FilterSwitch::from_query_key)
    }
}

fn query_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("on")
    })
}

/// One of the boolean switches in the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSwitch {
    OnlyImportant,
    OnlyChanged,
    OnlyWithErrorsOrWarnings,
}

impl FilterSwitch {
    pub const ALL: [FilterSwitch; 3] = [
        FilterSwitch::OnlyImportant,
        FilterSwitch::OnlyChanged,
        FilterSwitch::OnlyWithErrorsOrWarnings,
    ];

    pub fn is_active(self, state: &FilterState) -> bool {
        match self {
            FilterSwitch::OnlyImportant => state.only_important,
            FilterSwitch::OnlyChanged => state.only_changed,
            FilterSwitch::OnlyWithErrorsOrWarnings => state.only_with_errors_or_warnings,
        }
    }

    /// The update that flips this switch relative to `state`.
    pub fn toggle(self, state: &FilterState) -> FilterUpdate {
        let active = Some(!self.is_active(state));
        match self {
            FilterSwitch::OnlyImportant => FilterUpdate {
                only_important: active,
                ..Default::default()
            },
            FilterSwitch::OnlyChanged => FilterUpdate {
                only_changed: active,
                ..Default::default()
            },
            FilterSwitch::OnlyWithErrorsOrWarnings => FilterUpdate {
                only_with_errors_or_warnings: active,
                ..Default::default()
            },
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            FilterSwitch::OnlyImportant => "Only important (changed or with errors/warnings)",
            FilterSwitch::OnlyChanged => "Only with changed",
            FilterSwitch::OnlyWithErrorsOrWarnings => "Only with errors or warnings",
        }
    }

    pub fn from_query_key(key: &str) -> Option<FilterSwitch> {
        FilterSwitch::ALL.into_iter().find(|s| s.query_key() == key)
    }

    pub fn query_key(self) -> &'static str {
        match self {
            FilterSwitch::OnlyImportant => "onlyImportant",
            FilterSwitch::OnlyChanged => "onlyChanged",
            FilterSwitch::OnlyWithErrorsOrWarnings => "onlyWithErrorsOrWarnings",
        }
    }
}

// --- Predicates ---

pub fn passes_switches(
    has_changes: bool,
    has_errors: bool,
    has_warnings: bool,
    filters: &FilterState,
) -> bool {
    let important = has_errors || has_warnings;
    // Every active switch must accept the row.
    let rejected = (filters.only_important && !has_changes && !important)
        || (filters.only_changed && !has_changes)
        || (filters.only_with_errors_or_warnings && !important);
    !rejected
}

pub fn passes_text<S: AsRef<str>>(texts: Option<&[Option<S>]>, filters: &FilterState) -> bool {
    let texts = match texts {
        Some(t) if !t.is_empty() => t,
        _ => return true,
    };
    if filters.filter_str.is_empty() {
        return true;
    }

    let needle = filters.filter_str.to_lowercase();
    texts
        .iter()
        .flatten()
        .any(|t| {
            let t: &str = t.as_ref();
            t.to_lowercase().contains(&needle)
        })
}

// --- Row facts ---

/// Per-row attributes the predicates look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFacts {
    pub has_changes: bool,
    pub has_errors: bool,
    pub has_warnings: bool,
    pub searchable_text: Vec<Option<String>>,
}

impl RowFacts {
    pub fn from_result(
        project: &ProjectSummary,
        target: &TargetSummary,
        rs: &CommandResultSummary,
    ) -> Self {
        let mut searchable_text = vec![
            Some(rs.command_info.command.clone()),
            Some(rs.id.clone()),
            rs.command_info.initiator.clone(),
        ];
        searchable_text.extend(target_text(project, target));

        Self {
            has_changes: rs.has_changes(),
            has_errors: rs.errors > 0,
            has_warnings: rs.warnings > 0,
            searchable_text,
        }
    }

    /// Facts of a target follow its most recent command result.
    pub fn from_target(project: &ProjectSummary, target: &TargetSummary) -> Self {
        match target.current_result() {
            Some(rs) => Self::from_result(project, target, rs),
            None => Self {
                searchable_text: target_text(project, target),
                ..Default::default()
            },
        }
    }

    pub fn is_visible(&self, filters: &FilterState) -> bool {
        passes_switches(self.has_changes, self.has_errors, self.has_warnings, filters)
            && passes_text(Some(self.searchable_text.as_slice()), filters)
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn target_text(project: &ProjectSummary, target: &TargetSummary) -> Vec<Option<String>> {
    let kd = target.kd_info.as_ref();
    vec![
        non_empty(&target.target.target_name),
        non_empty(&target.target.cluster_id),
        non_empty(&target.target.discriminator),
        non_empty(&project.project.git_repo_key),
        non_empty(&project.project.sub_dir),
        kd.and_then(|k| non_empty(&k.name)),
        kd.and_then(|k| non_empty(&k.namespace)),
    ]
}

// --- Controller ---

type Listener = Box<dyn FnMut(&FilterState) + Send>;

/// Owns the current [`FilterState`] of one view.
///
/// Every edit replaces the state and synchronously notifies the listener;
/// there is no debouncing.
#[derive(Default)]
pub struct FilterController {
    state: FilterState,
    listener: Option<Listener>,
}

impl FilterController {
    pub fn new(state: FilterState) -> Self {
        Self {
            state,
            listener: None,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Registers the listener, replacing any previous one.
    pub fn subscribe(&mut self, listener: impl FnMut(&FilterState) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn set_filter(&mut self, update: FilterUpdate) {
        self.state = self.state.merged(&update);
        tracing::debug!(filters = ?self.state, "filter changed");
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.state);
        }
    }

    pub fn into_state(self) -> FilterState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kluctl::{CommandInfo, KluctlDeploymentInfo, ProjectKey, TargetKey};
    use std::sync::{Arc, Mutex};

    fn all_fact_combinations() -> Vec<(bool, bool, bool)> {
        let mut v = Vec::new();
        for c in [false, true] {
            for e in [false, true] {
                for w in [false, true] {
                    v.push((c, e, w));
                }
            }
        }
        v
    }

    fn texts(v: &[&str]) -> Vec<Option<String>> {
        v.iter().map(|t| Some(t.to_string())).collect()
    }

    fn filters(f: impl FnOnce(&mut FilterState)) -> FilterState {
        let mut s = FilterState::default();
        f(&mut s);
        s
    }

    #[test]
    fn default_filters_show_everything() {
        let none = FilterState::default();
        assert!(none.is_empty());
        for (c, e, w) in all_fact_combinations() {
            assert!(passes_switches(c, e, w, &none));
        }
        assert!(passes_text(Some(texts(&["anything"]).as_slice()), &none));
        assert!(passes_text::<String>(None, &none));
    }

    #[test]
    fn only_important_accepts_changes_or_problems() {
        let f = filters(|s| s.only_important = true);
        for (c, e, w) in all_fact_combinations() {
            assert_eq!(passes_switches(c, e, w, &f), c || e || w, "{c} {e} {w}");
        }
    }

    #[test]
    fn only_changed_requires_changes() {
        let f = filters(|s| s.only_changed = true);
        for (c, e, w) in all_fact_combinations() {
            assert_eq!(passes_switches(c, e, w, &f), c);
        }
    }

    #[test]
    fn only_errors_or_warnings_requires_problems() {
        let f = filters(|s| s.only_with_errors_or_warnings = true);
        for (c, e, w) in all_fact_combinations() {
            assert_eq!(passes_switches(c, e, w, &f), e || w);
        }
    }

    #[test]
    fn active_switches_combine_with_and() {
        let f = filters(|s| {
            s.only_changed = true;
            s.only_with_errors_or_warnings = true;
        });
        assert!(!passes_switches(true, false, false, &f));
        assert!(!passes_switches(false, true, false, &f));
        assert!(passes_switches(true, false, true, &f));
    }

    #[test]
    fn text_filter_is_case_insensitive_substring() {
        let prod = filters(|s| s.filter_str = "prod".to_string());
        let upper = filters(|s| s.filter_str = "PROD".to_string());
        let xyz = filters(|s| s.filter_str = "xyz".to_string());
        let a = filters(|s| s.filter_str = "a".to_string());
        let row = texts(&["Deploy-Prod"]);

        assert!(passes_text(Some(row.as_slice()), &prod));
        assert!(passes_text(Some(row.as_slice()), &upper));
        assert!(!passes_text(Some(row.as_slice()), &xyz));
        assert!(passes_text::<String>(Some(&[]), &a));
        assert!(passes_text::<String>(None, &a));
    }

    #[test]
    fn text_filter_skips_missing_fields() {
        let f = filters(|s| s.filter_str = "dev".to_string());
        let partial = vec![None, Some("dev-cluster".to_string())];
        let missing: Vec<Option<String>> = vec![None, None];
        assert!(passes_text(Some(partial.as_slice()), &f));
        assert!(!passes_text(Some(missing.as_slice()), &f));
    }

    fn sample() -> (ProjectSummary, TargetSummary) {
        let rs = CommandResultSummary {
            id: "r1".to_string(),
            command_info: CommandInfo {
                command: "deploy".to_string(),
                initiator: Some("GitOps".to_string()),
                ..Default::default()
            },
            warnings: 1,
            ..Default::default()
        };
        let target = TargetSummary {
            target: TargetKey {
                target_name: "prod".to_string(),
                cluster_id: "cluster-a".to_string(),
                discriminator: String::new(),
            },
            kd_info: Some(KluctlDeploymentInfo {
                cluster_id: "cluster-a".to_string(),
                name: "podinfo".to_string(),
                namespace: "flux-system".to_string(),
            }),
            command_results: vec![rs],
            ..Default::default()
        };
        let project = ProjectSummary {
            project: ProjectKey {
                git_repo_key: "github.com/org/infra".to_string(),
                sub_dir: String::new(),
            },
            targets: Vec::new(),
        };
        (project, target)
    }

    #[test]
    fn row_facts_from_result() {
        let (project, target) = sample();
        let facts = RowFacts::from_result(&project, &target, &target.command_results[0]);
        assert!(!facts.has_changes);
        assert!(!facts.has_errors);
        assert!(facts.has_warnings);

        assert!(facts.is_visible(&filters(|s| s.only_important = true)));
        assert!(!facts.is_visible(&filters(|s| s.only_changed = true)));
        assert!(facts.is_visible(&filters(|s| s.filter_str = "PODINFO".to_string())));
        assert!(facts.is_visible(&filters(|s| s.filter_str = "gitops".to_string())));
        assert!(!facts.is_visible(&filters(|s| s.filter_str = "staging".to_string())));
    }

    #[test]
    fn row_facts_for_target_without_results() {
        let (project, mut target) = sample();
        target.command_results.clear();
        let facts = RowFacts::from_target(&project, &target);
        assert!(!facts.has_changes && !facts.has_errors && !facts.has_warnings);
        assert!(facts.is_visible(&FilterState::default()));
        assert!(!facts.is_visible(&filters(|s| s.only_important = true)));
        assert!(facts.is_visible(&filters(|s| s.filter_str = "infra".to_string())));
    }

    #[test]
    fn toggle_flips_only_its_switch() {
        let state = filters(|s| s.only_changed = true);
        let update = FilterSwitch::OnlyChanged.toggle(&state);
        assert_eq!(update.only_changed, Some(false));
        assert_eq!(update.only_important, None);

        let merged = state.merged(&FilterSwitch::OnlyImportant.toggle(&state));
        assert!(merged.only_important);
        assert!(merged.only_changed);
    }

    #[test]
    fn controller_merges_and_notifies_every_edit() {
        let seen: Arc<Mutex<Vec<FilterState>>> = Arc::default();
        let mut ctl = FilterController::default();
        let sink = seen.clone();
        ctl.subscribe(move |s| sink.lock().unwrap().push(s.clone()));

        ctl.set_filter(FilterUpdate {
            only_changed: Some(true),
            ..Default::default()
        });
        for text in ["p", "pr", "pro"] {
            ctl.set_filter(FilterUpdate {
                filter_str: Some(text.to_string()),
                ..Default::default()
            });
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].only_changed);
        assert_eq!(seen[0].filter_str, "");
        assert_eq!(seen[3].filter_str, "pro");
        assert!(seen[3].only_changed);
        assert_eq!(ctl.state(), &seen[3]);
    }

    #[test]
    fn subscribe_replaces_previous_listener() {
        let first: Arc<Mutex<usize>> = Arc::default();
        let second: Arc<Mutex<usize>> = Arc::default();
        let mut ctl = FilterController::new(FilterState::default());

        let f = first.clone();
        ctl.subscribe(move |_| *f.lock().unwrap() += 1);
        let s = second.clone();
        ctl.subscribe(move |_| *s.lock().unwrap() += 1);

        ctl.set_filter(FilterUpdate::default());
        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn query_flags_decode_leniently() {
        let q = FilterQuery {
            only_important: Some(String::new()),
            only_changed: Some("on".to_string()),
            only_with_errors_or_warnings: Some("1".to_string()),
            filter_str: None,
            toggle: Some("bogus".to_string()),
        };
        let s = q.state();
        assert!(!s.only_important);
        assert!(s.only_changed);
        assert!(s.only_with_errors_or_warnings);
        assert_eq!(s.filter_str, "");
        assert_eq!(q.toggle(), None);

        for off in ["", "false", "0", "off", "yes please"] {
            assert!(!query_flag(Some(off)), "{off:?}");
        }
        for on in ["true", "TRUE", "on", "1"] {
            assert!(query_flag(Some(on)), "{on:?}");
        }
        assert!(!query_flag(None));
    }

    #[test]
    fn query_toggle_names_a_switch() {
        let q = FilterQuery {
            toggle: Some("onlyWithErrorsOrWarnings".to_string()),
            ..Default::default()
        };
        assert_eq!(q.toggle(), Some(FilterSwitch::OnlyWithErrorsOrWarnings));
        for switch in FilterSwitch::ALL {
            assert_eq!(FilterSwitch::from_query_key(switch.query_key()), Some(switch));
        }
    }

    #[test]
    fn filter_state_from_query_json() {
        let s: FilterState =
            serde_json::from_str(r#"{"onlyImportant": true, "filterStr": "x"}"#).unwrap();
        assert!(s.only_important);
        assert!(!s.only_changed);
        assert_eq!(s.filter_str, "x");
    }
}
