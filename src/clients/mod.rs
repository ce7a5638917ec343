pub mod store;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

use crate::approval::{ApprovalApi, ManualObjectsHashRequest};
use crate::error::ConsoleError;
use crate::models::kluctl::ProjectSummary;

/// HTTP client for the kluctl webui backend.
#[derive(Clone)]
pub struct BackendClient {
    pub base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ConsoleError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    pub async fn ping(&self) -> Result<(), ConsoleError> {
        let resp = self
            .http
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ConsoleError::BackendStatus {
                method: "GET",
                path: "/healthz".to_string(),
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ConsoleError> {
        self.get_json("/api/listProjects").await
    }

    pub async fn set_manual_objects_hash(
        &self,
        request: &ManualObjectsHashRequest,
    ) -> Result<(), ConsoleError> {
        let path = "/api/setManualObjectsHash";
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        if resp.status().as_u16() >= 400 {
            return Err(ConsoleError::BackendStatus {
                method: "POST",
                path: path.to_string(),
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .send()
            .await?;

        if resp.status().as_u16() >= 400 {
            return Err(ConsoleError::BackendStatus {
                method: "GET",
                path: path.to_string(),
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl ApprovalApi for BackendClient {
    fn set_manual_objects_hash(&self, request: ManualObjectsHashRequest) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.set_manual_objects_hash(&request).await {
                warn!(
                    "setting manual objects hash on {}/{} failed: {}",
                    request.cluster.namespace, request.cluster.name, e
                );
            }
        });
    }
}
