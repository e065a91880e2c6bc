use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness only; does not touch the waitlist log or the backend.
///
/// Note: viewing the (empty) response requires `curl -v`
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
