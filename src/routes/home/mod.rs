use actix_web::http::header::ContentType;
use actix_web::HttpResponse;

/// `GET /`
///
/// The waitlist sign-up page. Static; the form posts to `/waitlist` and
/// renders whatever message comes back.
pub async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        // path relative to this file (checked at compile time!)
        .body(include_str!("./home.html"))
}
