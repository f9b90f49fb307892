//! Clusters management API client
//!
//! Read-only lookups used by scenarios to check what Terraform created.
//! Every call returns an [`ApiResponse`] whatever the HTTP status, so a
//! scenario can assert on `404` as easily as on `200`; only transport
//! failures and malformed success bodies are errors.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tf_harness::HarnessConfig;
use tracing::debug;

use crate::cloud_providers::CloudProvider;
use crate::constants::CLUSTERS_MGMT_PREFIX;
use crate::error::E2eError;
use crate::Result;

/// Status and decoded body of one API call.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    /// Decoded body, present for 2xx responses.
    pub body: Option<T>,
    /// Raw body text for non-2xx responses.
    pub error_body: String,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }
}

/// Paged list envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page<T> {
    pub page: u32,
    pub size: u32,
    pub total: u32,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterApi {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub state: String,
    pub api: ClusterApi,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProvider {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtpasswdUserRecord {
    pub id: String,
    pub username: String,
}

/// Client for the clusters management API.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    base_url: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl ManagementClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("rhcs-e2e/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| E2eError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
            http_client,
        })
    }

    /// Client for the configured gateway and token.
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        Self::new(&config.gateway_url, config.token.as_deref())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /clusters/{id}`
    pub async fn retrieve_cluster(&self, cluster_id: &str) -> Result<ApiResponse<Cluster>> {
        self.get(&format!("/clusters/{}", cluster_id), &[]).await
    }

    /// `GET /clusters/{id}/identity_providers/{idp_id}`
    pub async fn retrieve_cluster_idp(
        &self,
        cluster_id: &str,
        idp_id: &str,
    ) -> Result<ApiResponse<IdentityProvider>> {
        self.get(
            &format!("/clusters/{}/identity_providers/{}", cluster_id, idp_id),
            &[],
        )
        .await
    }

    /// `GET /clusters/{id}/identity_providers/{idp_id}/htpasswd_users`
    pub async fn list_htpasswd_users(
        &self,
        cluster_id: &str,
        idp_id: &str,
    ) -> Result<ApiResponse<Page<HtpasswdUserRecord>>> {
        self.get(
            &format!(
                "/clusters/{}/identity_providers/{}/htpasswd_users",
                cluster_id, idp_id
            ),
            &[],
        )
        .await
    }

    /// `GET /cloud_providers`, optionally filtered and ordered.
    pub async fn list_cloud_providers(
        &self,
        search: Option<&str>,
        order: Option<&str>,
    ) -> Result<ApiResponse<Page<CloudProvider>>> {
        let mut query = Vec::new();
        if let Some(search) = search {
            query.push(("search", search));
        }
        if let Some(order) = order {
            query.push(("order", order));
        }
        self.get("/cloud_providers", &query).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<T>> {
        let path = format!("{}{}", CLUSTERS_MGMT_PREFIX, path);
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http_client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| E2eError::Transport {
            path: path.clone(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| E2eError::Transport {
            path: path.clone(),
            source,
        })?;
        debug!(%path, status = status.as_u16(), "management API response");

        if !status.is_success() {
            return Ok(ApiResponse {
                status,
                body: None,
                error_body: text,
            });
        }

        let body = serde_json::from_str(&text).map_err(|e| E2eError::Decode {
            path,
            reason: e.to_string(),
        })?;
        Ok(ApiResponse {
            status,
            body: Some(body),
            error_body: String::new(),
        })
    }
}
