use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, RwLock};
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

use crate::error::ConsoleError;
use crate::models::kluctl::{CommandResultSummary, ProjectSummary, TargetSummary};

use super::BackendClient;

/// Latest snapshot of the backend's project summaries.
///
/// Snapshots are replaced wholesale on refresh and never patched locally.
pub struct SummaryStore {
    projects: RwLock<Arc<Vec<ProjectSummary>>>,
    status: Mutex<RefreshStatus>,
    revision: watch::Sender<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshStatus {
    pub healthy: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for SummaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            projects: RwLock::new(Arc::new(Vec::new())),
            status: Mutex::new(RefreshStatus::default()),
            revision,
        }
    }

    pub async fn snapshot(&self) -> Arc<Vec<ProjectSummary>> {
        self.projects.read().await.clone()
    }

    /// Stores a fresh snapshot. The revision only moves, and subscribers are
    /// only woken, when the summaries differ from the current ones.
    pub async fn replace(&self, projects: Vec<ProjectSummary>) -> bool {
        let changed = {
            let mut current = self.projects.write().await;
            let changed = current.as_slice() != projects.as_slice();
            if changed {
                *current = Arc::new(projects);
            }
            changed
        };
        {
            let mut status = self.status.lock().unwrap();
            status.healthy = true;
            status.last_refresh = Some(Utc::now());
            status.last_error = None;
        }
        if changed {
            self.revision.send_modify(|r| *r += 1);
        }
        changed
    }

    pub fn status(&self) -> RefreshStatus {
        self.status.lock().unwrap().clone()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receives the revision after every refresh that changed the summaries.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn refresh(&self, client: &BackendClient) -> Result<(), ConsoleError> {
        match client.list_projects().await {
            Ok(projects) => {
                let targets: usize = projects.iter().map(|p| p.targets.len()).sum();
                if self.replace(projects).await {
                    info!(targets, revision = self.revision(), "refreshed summaries");
                } else {
                    debug!(targets, "summaries unchanged");
                }
                Ok(())
            }
            Err(e) => {
                let mut status = self.status.lock().unwrap();
                status.healthy = false;
                status.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn run_refresher(
        self: Arc<Self>,
        client: BackendClient,
        every: Duration,
        mut shutdown: watch::Receiver<()>,
    ) {
        if let Err(e) = self.refresh(&client).await {
            warn!("initial refresh from {} failed: {}", client.base_url, e);
        }

        let mut interval = time::interval(every);
        interval.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.refresh(&client).await {
                        warn!("refresh from {} failed: {}", client.base_url, e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("refresher shutting down");
                    return;
                }
            }
        }
    }
}

/// A command result together with the target and project that own it.
pub struct ResultLocation<'a> {
    pub project: &'a ProjectSummary,
    pub target: &'a TargetSummary,
    pub result: &'a CommandResultSummary,
}

pub fn find_result<'a>(projects: &'a [ProjectSummary], id: &str) -> Option<ResultLocation<'a>> {
    projects.iter().find_map(|project| {
        project.targets.iter().find_map(|target| {
            target
                .command_results
                .iter()
                .find(|rs| rs.id == id)
                .map(|result| ResultLocation {
                    project,
                    target,
                    result,
                })
        })
    })
}
