//! Backend client: the single point of entry for calls to the external HR backend.
//!
//! Every call returns an explicit `Result`. Whether a failure is papered over
//! with fallback data is decided by the route handlers, and the response says
//! which one the caller got.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod fallback;
pub mod handlers;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("BACKEND_URL is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Backend returned invalid JSON: {0}")]
    Parse(String),
}

impl BackendError {
    /// The backend understood the request and refused it.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BackendError::Status { status, .. } if (400..500).contains(status))
    }
}

/// Paging and filter parameters forwarded to the backend as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(10).clamp(1, 100)
    }

    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page().to_string()),
            ("pageSize", self.page_size().to_string()),
        ];
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("status", status.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Fallback,
}

/// Response envelope telling callers whether they got live or fallback data.
#[derive(Debug, Clone, Serialize)]
pub struct Sourced<T> {
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub data: T,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            source: DataSource::Live,
            fallback_reason: None,
            data,
        }
    }

    pub fn fallback(data: T, reason: String) -> Self {
        Self {
            source: DataSource::Fallback,
            fallback_reason: Some(reason),
            data,
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Option<String>,
}

impl BackendClient {
    pub fn new(
        base_url: Option<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn url(&self, path: &str) -> Result<String, BackendError> {
        let base = self.base_url.as_deref().ok_or(BackendError::NotConfigured)?;
        Ok(format!("{base}/{}", path.trim_start_matches('/')))
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: body,
            });
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn get_json(&self, path: &str, query: &ListQuery) -> Result<Value, BackendError> {
        let url = self.url(path)?;
        debug!("GET {url}");
        let response = self.client.get(&url).query(&query.to_pairs()).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let url = self.url(path)?;
        debug!("POST {url}");
        let response = self.client.post(&url).json(body).send().await?;
        Self::read_json(response).await
    }

    /// GET {BACKEND_URL}/job-approvals
    pub async fn job_approvals(&self, query: &ListQuery) -> Result<Value, BackendError> {
        self.get_json("job-approvals", query).await
    }

    /// POST {BACKEND_URL}/job-approvals
    pub async fn submit_job_approval(&self, body: &Value) -> Result<Value, BackendError> {
        self.post_json("job-approvals", body).await
    }

    /// GET {BACKEND_URL}/employees
    pub async fn employees(&self, query: &ListQuery) -> Result<Value, BackendError> {
        let value = self.get_json("employees", query).await?;
        if value.get("employees").map_or(true, |e| !e.is_array()) {
            return Err(BackendError::Parse(
                "expected an 'employees' array".to_string(),
            ));
        }
        Ok(value)
    }
}
