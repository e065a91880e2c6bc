use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use tracing::Instrument;

use super::error_chain_fmt;
use crate::backend_client::BackendClient;
use crate::backend_client::BackendError;
use crate::backend_client::ChatReply;

/// Used when the client doesn't say who it is; the backend keys uploads by
/// username
const DEFAULT_USERNAME: &str = "guest";

#[derive(thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Debug for ProxyError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            // the backend's own complaints about the request (no upload yet,
            // not a csv, ...) are passed through; anything else is our
            // upstream failing
            Self::Backend(BackendError::Rejected { status, .. }) if status.is_client_error() => {
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::BadRequest(m) => m.clone(),
            Self::Backend(BackendError::Rejected { body, .. }) => backend_detail(body),
            Self::Backend(BackendError::Request(_)) => "Analysis backend is unavailable".to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// The backend reports errors as `{"detail": ...}`; fall back to the raw body
fn backend_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(o)) => match o.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ if body.trim().is_empty() => "Analysis backend failed".to_string(),
        _ => body.to_string(),
    }
}

fn username_or_default(username: Option<String>) -> String {
    username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
}

#[derive(Deserialize, Debug)]
pub struct UploadParams {
    username: Option<String>,
    filename: String,
}

/// `POST /api/upload?filename=<name>.csv&username=<user>`
///
/// The body is the raw file. Only `.csv` files are accepted; the upload
/// itself is forwarded to the backend, whose report (preview/columns, and
/// any issues found) is returned as-is.
///
/// ```sh
///     curl --data-binary @data.csv 'http://127.0.0.1:3000/api/upload?filename=data.csv'
/// ```
#[tracing::instrument(name = "Uploading table", skip(body, backend), fields(size = body.len()))]
pub async fn upload(
    params: web::Query<UploadParams>,
    body: web::Bytes,
    backend: web::Data<BackendClient>,
) -> Result<HttpResponse, ProxyError> {
    let UploadParams { username, filename } = params.into_inner();
    let filename = filename.trim().to_string();
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(ProxyError::BadRequest(
            "Only CSV files are allowed.".to_string(),
        ));
    }
    if body.is_empty() {
        return Err(ProxyError::BadRequest("Uploaded file is empty.".to_string()));
    }

    let report = backend
        .upload_csv(&username_or_default(username), &filename, body.to_vec())
        .await?;
    if report.has_issues() {
        tracing::info!(issues = ?report.issues, "backend flagged uploaded data");
    }
    Ok(HttpResponse::Ok().json(report))
}

#[derive(Deserialize, Debug)]
pub struct ChatQuestion {
    username: Option<String>,
    question: String,
}

/// `POST /api/chat`, JSON `{"username": ..., "question": ...}`
///
/// Chart paths in the reply are made absolute, so the page can embed them
/// directly.
#[tracing::instrument(name = "Asking backend", skip(body, backend))]
pub async fn chat(
    body: web::Json<ChatQuestion>,
    backend: web::Data<BackendClient>,
) -> Result<HttpResponse, ProxyError> {
    let ChatQuestion { username, question } = body.into_inner();
    let question = question.trim();
    if question.is_empty() {
        return Err(ProxyError::BadRequest("Question cannot be empty.".to_string()));
    }

    let reply = backend
        .send_chat(&username_or_default(username), question)
        .await?;
    let reply = ChatReply {
        charts: reply.charts.iter().map(|c| backend.chart_url(c)).collect(),
        ..reply
    };
    Ok(HttpResponse::Ok().json(reply))
}

/// `POST /api/cleanup`
///
/// Sent by the page once, on teardown. The notification is fired off in the
/// background and the response does not wait for it; failures are only
/// logged.
pub async fn cleanup(backend: web::Data<BackendClient>) -> HttpResponse {
    let span = tracing::info_span!("Background chart cleanup");
    actix_web::rt::spawn(
        async move {
            if let Err(e) = backend.cleanup_charts().await {
                tracing::warn!(error.cause_chain = ?e, "chart cleanup failed");
            }
        }
        .instrument(span),
    );
    HttpResponse::Accepted().finish()
}
