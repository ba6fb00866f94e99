use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Admin Router Module
///
/// Nested under `/admin` and wrapped, as a whole, in the route-layer
/// middleware that resolves `AdminUser`. No handler here performs its own
/// session check beyond taking the extractor where it needs the admin's
/// identity for attribution.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // Dashboard & statistics.
        .route("/", get(admin::dashboard))
        .route("/statistics", get(admin::statistics))
        // Events.
        .route("/events", get(admin::list_events).post(admin::create_event))
        .route(
            "/events/{id}",
            get(admin::get_event)
                .put(admin::update_event)
                .delete(admin::delete_event),
        )
        // News (multipart create/update).
        .route("/news", get(admin::list_news).post(admin::create_news))
        .route(
            "/news/{id}",
            get(admin::get_news)
                .put(admin::update_news)
                .delete(admin::delete_news),
        )
        // Students. Static segments are registered alongside `{id}`; the
        // router prefers the exact match.
        .route("/students", get(admin::roster))
        .route("/students/info", get(admin::students_info))
        .route("/students/export", get(admin::export_students))
        .route(
            "/students/{id}",
            get(admin::get_student)
                .put(admin::update_student)
                .delete(admin::delete_student),
        )
        .route("/students/{id}/approve", post(admin::approve_student))
        .route("/students/{id}/reject", post(admin::reject_student))
        .route("/students/{id}/group", post(admin::assign_group))
        .route("/applications", get(admin::applications))
        // About-page content.
        .route(
            "/timeline",
            get(admin::list_timeline).post(admin::create_timeline),
        )
        .route(
            "/timeline/{id}",
            get(admin::get_timeline)
                .put(admin::update_timeline)
                .delete(admin::delete_timeline),
        )
        .route("/team", get(admin::list_team).post(admin::create_team))
        .route(
            "/team/{id}",
            get(admin::get_team)
                .put(admin::update_team)
                .delete(admin::delete_team),
        )
        .route(
            "/partners",
            get(admin::list_partners).post(admin::create_partner),
        )
        .route(
            "/partners/{id}",
            get(admin::get_partner)
                .put(admin::update_partner)
                .delete(admin::delete_partner),
        )
        // Contact singleton & message inbox.
        .route(
            "/contact",
            get(admin::get_contact_info).put(admin::put_contact_info),
        )
        .route("/messages", get(admin::list_messages))
        .route("/messages/{id}/read", post(admin::mark_message_read))
        .route("/messages/{id}", delete(admin::delete_message))
}
