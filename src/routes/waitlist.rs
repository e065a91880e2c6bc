use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde_json::json;

use crate::store::RecordStore;
use crate::waitlist::submit;
use crate::waitlist::SubmitError;
use crate::waitlist::WaitlistForm;

impl ResponseError for SubmitError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // the page shows `error` verbatim, so it must never contain internals
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.user_message(),
        }))
    }
}

/// `POST /waitlist`
///
/// # Request example
///
/// ```sh
///     curl --data 'name=Ada&email=ada%40example.com&source=social' http://127.0.0.1:3000/waitlist
/// ```
///
/// Responds with `{"success": true, "message": ...}` (200), or
/// `{"success": false, "error": ...}` with 400 (validation), 409 (already on
/// the waitlist) or 500 (log could not be read/written).
#[tracing::instrument(
    name = "Adding entry to waitlist",
    skip(form, store),
    fields(
        entrant_name = ?form.name,
        referral_source = ?form.source,
    )
)]
pub async fn join_waitlist(
    form: web::Form<WaitlistForm>,
    store: web::Data<dyn RecordStore>,
) -> Result<HttpResponse, SubmitError> {
    match submit(store.get_ref(), form.into_inner()).await {
        Ok(entry) => {
            tracing::info!(timestamp = %entry.timestamp, "entry added to waitlist");
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": "Successfully joined the waitlist!",
            })))
        }
        Err(e) => {
            match &e {
                SubmitError::Storage(_) => tracing::error!(error.cause_chain = ?e, "waitlist log failure"),
                _ => tracing::info!(error.message = %e, "waitlist entry rejected"),
            }
            Err(e)
        }
    }
}
