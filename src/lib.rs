use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Routing segregation (Public, Admin).
pub mod routes;
use auth::AdminUser;
use routes::{admin, public};

// --- Public Re-exports ---

// Core state types for the main entry point and the integration tests.
pub use config::{AppConfig, Env, StorageBackend};
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use storage::{LocalDiskStore, MockObjectStore, ObjectStore, S3ObjectStore, StorageState};

/// Multipart bodies (News uploads) are capped here; everything else is far
/// smaller.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the whole API surface. Every
/// handler decorated with `#[utoipa::path]` and every schema used in a body is
/// listed here; the JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::public::health_check,
        handlers::public::list_events,
        handlers::public::event_detail,
        handlers::public::list_news,
        handlers::public::news_detail,
        handlers::public::list_students,
        handlers::public::site_stats,
        handlers::public::about_page,
        handlers::public::join,
        handlers::public::contact,
        handlers::public::subscribe,
        handlers::session::login,
        handlers::session::admin_login,
        handlers::session::logout,
        handlers::admin::dashboard,
        handlers::admin::statistics,
        handlers::admin::list_events,
        handlers::admin::get_event,
        handlers::admin::create_event,
        handlers::admin::update_event,
        handlers::admin::delete_event,
        handlers::admin::list_news,
        handlers::admin::get_news,
        handlers::admin::create_news,
        handlers::admin::update_news,
        handlers::admin::delete_news,
        handlers::admin::roster,
        handlers::admin::students_info,
        handlers::admin::applications,
        handlers::admin::get_student,
        handlers::admin::update_student,
        handlers::admin::assign_group,
        handlers::admin::approve_student,
        handlers::admin::reject_student,
        handlers::admin::delete_student,
        handlers::admin::export_students,
        handlers::admin::list_timeline,
        handlers::admin::get_timeline,
        handlers::admin::create_timeline,
        handlers::admin::update_timeline,
        handlers::admin::delete_timeline,
        handlers::admin::list_team,
        handlers::admin::get_team,
        handlers::admin::create_team,
        handlers::admin::update_team,
        handlers::admin::delete_team,
        handlers::admin::list_partners,
        handlers::admin::get_partner,
        handlers::admin::create_partner,
        handlers::admin::update_partner,
        handlers::admin::delete_partner,
        handlers::admin::get_contact_info,
        handlers::admin::put_contact_info,
        handlers::admin::list_messages,
        handlers::admin::mark_message_read,
        handlers::admin::delete_message,
    ),
    components(
        schemas(
            models::Event, models::News, models::Student, models::Timeline, models::Team,
            models::Partner, models::ContactInfo, models::ContactMessage,
            models::LoginRequest, models::AdminLoginRequest, models::JoinRequest,
            models::ContactRequest, models::SubscribeRequest, models::EventPayload,
            models::TimelinePayload, models::TeamPayload, models::PartnerPayload,
            models::ContactInfoPayload, models::UpdateStudentRequest, models::AssignGroupRequest,
            models::ApiMessage, models::Pagination, models::EventList, models::NewsList,
            models::StudentList, models::RosterPage, models::LoginResponse, models::AboutPage,
            models::DashboardStats, models::SiteStats, models::SiteStatsResponse,
            models::MonthlyBucket, models::CategoryCount, models::GradeCount,
            models::StatisticsReport,
            models::Page<models::Event>, models::Page<models::News>,
            models::Page<models::Student>, models::Page<models::Timeline>,
            models::Page<models::Team>, models::Page<models::Partner>,
            models::Page<models::ContactMessage>,
        )
    ),
    tags(
        (name = "society-portal", description = "Student Society Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access.
    pub repo: RepositoryState,
    /// Storage Layer: abstracts the upload store (disk / S3 / mock).
    pub storage: StorageState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors pull individual services out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// admin_middleware
///
/// Route-layer gate for the `/admin` subtree. Extracting `AdminUser` performs
/// the whole check (token, role, live account); a failed extraction rejects
/// with 401 before any handler runs. Handlers that need the admin's identity
/// take the extractor again, which re-reads the already-parsed request parts.
async fn admin_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let uploads_dir = state.config.uploads_dir.clone();

    let base_router = Router::new()
        // Documentation: auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes, including the login endpoints.
        .merge(public::public_routes())
        // Console routes: every route in the subtree sits behind the admin
        // gate. `/admin/login` is registered in the public router and wins the
        // static-route match, so it stays reachable without a session.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        // Uploaded images are served straight from the uploads directory.
        .nest_service("/static/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    // Observability and correlation layers, applied outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: includes the generated `x-request-id` so
/// every log line of a request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
