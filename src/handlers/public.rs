use crate::{
    AppState,
    auth::hash_password,
    error::ApiError,
    models::{
        AboutPage, ApiMessage, ContactRequest, Event, EventList, JoinRequest, News, NewsList,
        NewStudent, Pagination, SiteStatsResponse, StudentList, SubscribeRequest,
    },
    repository::{StudentFilter, clamp_paging},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

const EVENTS_PER_PAGE: i64 = 10;
const NEWS_PER_PAGE: i64 = 10;
const STUDENTS_PER_PAGE: i64 = 12;

/// Characters of article content shown in list previews.
const PREVIEW_CHARS: usize = 200;

// --- Query Structs ---

/// ListQuery
///
/// Query parameters shared by the public event and news listings.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Optional exact-match category filter.
    pub category: Option<String>,
}

/// PageQuery
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Truncates article content on a character boundary for list responses, so
/// multi-byte text never gets split mid-character.
fn content_preview(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

// --- Handlers ---

/// health_check
///
/// [Public Route] Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// list_events
///
/// [Public Route] Paginated published events, newest event date first.
/// Unpublished rows never appear here regardless of query parameters.
#[utoipa::path(
    get,
    path = "/api/events",
    params(ListQuery),
    responses((status = 200, description = "Published events", body = EventList))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<EventList> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, EVENTS_PER_PAGE);
    let (events, total) = state
        .repo
        .list_events(query.category, true, page, per_page)
        .await;
    Json(EventList {
        success: true,
        events,
        pagination: Pagination::compute(page, per_page, total),
    })
}

/// event_detail
///
/// [Public Route] A single published event. An unpublished id is
/// indistinguishable from a missing one (404).
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 404, description = "Not found or unpublished")
    )
)]
pub async fn event_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Event>, ApiError> {
    let event = state.repo.get_event(id, true).await.ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

/// list_news
///
/// [Public Route] Paginated published articles, newest first, with the content
/// field truncated to a preview.
#[utoipa::path(
    get,
    path = "/api/news",
    params(ListQuery),
    responses((status = 200, description = "Published news", body = NewsList))
)]
pub async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<NewsList> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, NEWS_PER_PAGE);
    let (mut news, total) = state
        .repo
        .list_news(query.category, true, page, per_page)
        .await;
    for article in &mut news {
        article.content = content_preview(&article.content);
    }
    Json(NewsList {
        success: true,
        news,
        pagination: Pagination::compute(page, per_page, total),
    })
}

/// news_detail
///
/// [Public Route] A single published article with its full content.
#[utoipa::path(
    get,
    path = "/api/news/{id}",
    responses(
        (status = 200, description = "Article", body = News),
        (status = 404, description = "Not found or unpublished")
    )
)]
pub async fn news_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<News>, ApiError> {
    let article = state.repo.get_news(id, true).await.ok_or(ApiError::NotFound)?;
    Ok(Json(article))
}

/// list_students
///
/// [Public Route] The approved-member roster. Pending applicants are never
/// listed here.
#[utoipa::path(
    get,
    path = "/api/students",
    params(PageQuery),
    responses((status = 200, description = "Approved members", body = StudentList))
)]
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<StudentList> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, STUDENTS_PER_PAGE);
    let filter = StudentFilter {
        approved: Some(true),
        ..Default::default()
    };
    let (students, total) = state.repo.list_students(filter, page, per_page).await;
    Json(StudentList {
        success: true,
        students,
        pagination: Pagination::compute(page, per_page, total),
    })
}

/// site_stats
///
/// [Public Route] Aggregate counters for the landing page. Counts only
/// published/approved rows.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, description = "Public counters", body = SiteStatsResponse))
)]
pub async fn site_stats(State(state): State<AppState>) -> Json<SiteStatsResponse> {
    let stats = state.repo.site_stats().await;
    Json(SiteStatsResponse {
        success: true,
        stats,
    })
}

/// about_page
///
/// [Public Route] The published timeline, team and partner lists in display
/// order, bundled for the "about us" page.
#[utoipa::path(
    get,
    path = "/api/about",
    responses((status = 200, description = "About page content", body = AboutPage))
)]
pub async fn about_page(State(state): State<AppState>) -> Json<AboutPage> {
    let (timeline, team, partners) = tokio::join!(
        state.repo.published_timeline(),
        state.repo.published_team(),
        state.repo.published_partners()
    );
    Json(AboutPage {
        success: true,
        timeline,
        team,
        partners,
    })
}

/// join
///
/// [Public Route] Membership application. Creates a pending (unapproved)
/// student row; the password is hashed before it reaches the repository and
/// the email must not already be registered (case-insensitive).
#[utoipa::path(
    post,
    path = "/api/join",
    request_body = JoinRequest,
    responses(
        (status = 201, description = "Application received", body = ApiMessage),
        (status = 400, description = "Missing field", body = ApiMessage),
        (status = 409, description = "Email already registered", body = ApiMessage)
    )
)]
pub async fn join(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<(StatusCode, Json<ApiMessage>), ApiError> {
    for (value, field) in [
        (&payload.name, "name"),
        (&payload.university, "university"),
        (&payload.major, "major"),
        (&payload.email, "email"),
        (&payload.password, "password"),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::missing_field(field));
        }
    }

    if state.repo.get_student_by_email(&payload.email).await.is_some() {
        return Err(ApiError::Duplicate("email already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        tracing::error!("password hashing failed: {e}");
        ApiError::Internal
    })?;

    let email = payload.email.clone();
    let new_student = NewStudent {
        name: payload.name,
        university: payload.university,
        major: payload.major,
        email: payload.email,
        phone: payload.phone,
        bio: payload.bio,
        password_hash,
    };

    if state.repo.create_student(new_student).await.is_none() {
        // A racing duplicate registration trips the unique index and lands
        // here; any other failed insert is a genuine server error.
        if state.repo.get_student_by_email(&email).await.is_some() {
            return Err(ApiError::Duplicate("email already registered".to_string()));
        }
        return Err(ApiError::Internal);
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiMessage {
            success: true,
            message: "application received, pending approval".to_string(),
        }),
    ))
}

/// contact
///
/// [Public Route] Contact form intake. All four fields are required; the
/// response names the first missing one. No partial row is ever written.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored", body = ApiMessage),
        (status = 400, description = "Missing field", body = ApiMessage)
    )
)]
pub async fn contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ApiMessage>), ApiError> {
    let mut values = Vec::with_capacity(4);
    for (value, field) in [
        (&payload.name, "name"),
        (&payload.email, "email"),
        (&payload.subject, "subject"),
        (&payload.message, "message"),
    ] {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => values.push(v.to_string()),
            _ => return Err(ApiError::missing_field(field)),
        }
    }
    let [name, email, subject, message] = <[String; 4]>::try_from(values)
        .map_err(|_| ApiError::Internal)?;

    state
        .repo
        .create_message(name, email, subject, message)
        .await
        .ok_or(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiMessage {
            success: true,
            message: "message received".to_string(),
        }),
    ))
}

/// subscribe
///
/// [Public Route] Newsletter subscription acknowledgement. The address is
/// validated but not persisted anywhere.
#[utoipa::path(
    post,
    path = "/api/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Acknowledged", body = ApiMessage),
        (status = 400, description = "Missing email", body = ApiMessage)
    )
)]
pub async fn subscribe(
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    match payload.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() && email.contains('@') => Ok(Json(ApiMessage {
            success: true,
            message: "subscribed".to_string(),
        })),
        _ => Err(ApiError::missing_field("email")),
    }
}
