use std::fmt::Debug;
use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::routes::error_chain_fmt;

/// Client for the analysis backend, which does the actual work behind the
/// upload and chat pages. We only speak its HTTP contract.
///
/// Establishing a HTTP connection is expensive, so a single `Client` (which
/// pools connections internally) is built once and shared via `web::Data`.
pub struct BackendClient {
    http_client: Client,
    base_url: String,
}

/// First rows of an uploaded table, as described by the backend. When the
/// backend rejects the data, `status` is `"error"` and `issues` says why; the
/// preview is still included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub preview: Vec<Map<String, Value>>,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl UploadReport {
    pub fn has_issues(&self) -> bool { self.status.as_deref() == Some("error") }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    username: &'a str,
    question: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    /// Paths relative to the backend's base URL; see `BackendClient::chart_url`
    #[serde(default)]
    pub charts: Vec<String>,
}

#[derive(thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed")]
    Request(#[from] reqwest::Error),
    #[error("Backend responded with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

impl Debug for BackendError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl BackendClient {
    pub fn new(
        base_url: String,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            // only fails if the TLS backend cannot be initialised
            .expect("Failed to build HTTP client");
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST {base}/api/upload/` as `multipart/form-data`, with fields `file`
    /// and `username`.
    #[tracing::instrument(name = "Forwarding upload to backend", skip(self, contents))]
    pub async fn upload_csv(
        &self,
        username: &str,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<UploadReport, BackendError> {
        let file = multipart::Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str("text/csv")?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("username", username.to_string());

        let resp = self
            .http_client
            .post(format!("{}/api/upload/", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// `POST {base}/api/chat/` with `{username, question}`.
    #[tracing::instrument(name = "Forwarding question to backend", skip(self, question))]
    pub async fn send_chat(
        &self,
        username: &str,
        question: &str,
    ) -> Result<ChatReply, BackendError> {
        let resp = self
            .http_client
            .post(format!("{}/api/chat/", self.base_url))
            .json(&ChatRequest { username, question })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Ask the backend to drop the charts it generated for this session. The
    /// caller is expected to not wait on this (see `routes::cleanup`).
    #[tracing::instrument(name = "Requesting chart cleanup", skip(self))]
    pub async fn cleanup_charts(&self) -> Result<(), BackendError> {
        let resp = self
            .http_client
            .post(format!("{}/api/cleanup/reload", self.base_url))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Charts are rendered by embedding them as documents, so the page needs
    /// an absolute URL rather than the backend-relative path.
    pub fn chart_url(
        &self,
        path: &str,
    ) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `error_for_status` would discard the body, which is usually where the
    /// backend explains itself
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(%status, %body, "backend rejected request");
        Err(BackendError::Rejected { status, body })
    }
}
