use crate::{
    AppState,
    handlers::{public, session},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Everything here is reachable anonymously. List and detail handlers only
/// ever see published/approved rows; the repository filters are the contract,
/// not an optimization. `/admin/login` also lives here because it must be
/// reachable before a session exists.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health_check))
        // Session endpoints.
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        .route("/admin/login", post(session::admin_login))
        // Published content.
        .route("/api/events", get(public::list_events))
        .route("/api/events/{id}", get(public::event_detail))
        .route("/api/news", get(public::list_news))
        .route("/api/news/{id}", get(public::news_detail))
        .route("/api/students", get(public::list_students))
        .route("/api/stats", get(public::site_stats))
        .route("/api/about", get(public::about_page))
        // Public intake.
        .route("/api/join", post(public::join))
        .route("/api/contact", post(public::contact))
        .route("/api/subscribe", post(public::subscribe))
}
