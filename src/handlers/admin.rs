use crate::{
    AppState,
    auth::AdminUser,
    error::ApiError,
    export::{export_filename, students_to_csv},
    models::{
        ApiMessage, AssignGroupRequest, ContactInfo, ContactInfoPayload, ContactMessage,
        DashboardStats, Event, EventPayload, News, NewsFields, Page, Pagination, Partner,
        PartnerPayload, RosterPage, StatisticsReport, Student, Team, TeamPayload, Timeline,
        TimelinePayload, UpdateStudentRequest,
    },
    repository::{StudentFilter, clamp_paging},
    storage::{StorageState, allowed_image, key_from_url, unique_key},
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

const ADMIN_LIST_PER_PAGE: i64 = 10;
const ROSTER_PER_PAGE: i64 = 15;
const PARTNERS_PER_PAGE: i64 = 12;

// --- Query Structs ---

/// AdminPageQuery
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AdminPageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// AdminListQuery
///
/// Paging plus the optional category filter for the event/news console lists.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AdminListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
}

/// RosterQuery
///
/// Filters for the member roster: substring search over the text columns plus
/// exact grade/group matches.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RosterQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub grade: Option<String>,
    pub group: Option<String>,
}

// --- Dashboard & Statistics ---

/// dashboard
///
/// [Admin Route] Landing-page counters.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Dashboard counters", body = DashboardStats))
)]
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.repo.dashboard_stats().await)
}

/// statistics
///
/// [Admin Route] The full aggregation report, computed per request.
#[utoipa::path(
    get,
    path = "/admin/statistics",
    responses((status = 200, description = "Statistics report", body = StatisticsReport))
)]
pub async fn statistics(State(state): State<AppState>) -> Json<StatisticsReport> {
    Json(state.repo.statistics_report().await)
}

// --- Events ---

/// list_events
///
/// [Admin Route] All events regardless of publish state, newest record first.
#[utoipa::path(
    get,
    path = "/admin/events",
    params(AdminListQuery),
    responses((status = 200, description = "Events", body = Page<Event>))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Json<Page<Event>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ADMIN_LIST_PER_PAGE);
    let (events, total) = state
        .repo
        .list_events(query.category, false, page, per_page)
        .await;
    Json(Page::new(events, Pagination::compute(page, per_page, total)))
}

/// get_event
#[utoipa::path(
    get,
    path = "/admin/events/{id}",
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Event>, ApiError> {
    let event = state.repo.get_event(id, false).await.ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

/// create_event
///
/// [Admin Route] Creates an event attributed to the requesting admin.
#[utoipa::path(
    post,
    path = "/admin/events",
    request_body = EventPayload,
    responses((status = 201, description = "Created", body = Event))
)]
pub async fn create_event(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    let event = state
        .repo
        .create_event(payload, admin.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// update_event
#[utoipa::path(
    put,
    path = "/admin/events/{id}",
    request_body = EventPayload,
    responses(
        (status = 200, description = "Updated", body = Event),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<Event>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    let event = state
        .repo
        .update_event(id, payload)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

/// delete_event
#[utoipa::path(
    delete,
    path = "/admin/events/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_event(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    if state.repo.delete_event(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- News (multipart: text fields + optional image upload) ---

fn parse_bool_field(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

/// Collects the News form out of a multipart body: the text fields plus the
/// optional image part (filename, bytes).
async fn parse_news_form(
    mut multipart: Multipart,
) -> Result<(NewsFields, Option<(String, Vec<u8>)>), ApiError> {
    let mut fields = NewsFields::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart form".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => fields.title = read_text(field).await?,
            "content" => fields.content = read_text(field).await?,
            "author" => fields.author = read_text(field).await?,
            "category" => fields.category = read_text(field).await?,
            "is_published" => fields.is_published = parse_bool_field(&read_text(field).await?),
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::Validation("unreadable image part".to_string()))?
                    .to_vec();
                if !filename.is_empty() && !data.is_empty() {
                    image = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    if fields.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    if fields.content.trim().is_empty() {
        return Err(ApiError::missing_field("content"));
    }

    Ok((fields, image))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::Validation("unreadable form field".to_string()))
}

/// Stores an uploaded News image. Any problem (disallowed extension, storage
/// failure) is logged and swallowed: the caller proceeds without an image so
/// the article text is never lost to a bad upload.
async fn store_news_image(
    storage: &StorageState,
    filename: &str,
    data: Vec<u8>,
) -> Option<String> {
    if !allowed_image(filename) {
        tracing::warn!("skipping news image with disallowed extension: {filename}");
        return None;
    }
    let key = unique_key("news", filename);
    match storage.put(&key, data).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("news image upload failed, keeping article without it: {e}");
            None
        }
    }
}

/// list_news
///
/// [Admin Route] All articles with full content, newest record first.
#[utoipa::path(
    get,
    path = "/admin/news",
    params(AdminListQuery),
    responses((status = 200, description = "News", body = Page<News>))
)]
pub async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Json<Page<News>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ADMIN_LIST_PER_PAGE);
    let (news, total) = state
        .repo
        .list_news(query.category, false, page, per_page)
        .await;
    Json(Page::new(news, Pagination::compute(page, per_page, total)))
}

/// get_news
#[utoipa::path(
    get,
    path = "/admin/news/{id}",
    responses(
        (status = 200, description = "Article", body = News),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<News>, ApiError> {
    let article = state.repo.get_news(id, false).await.ok_or(ApiError::NotFound)?;
    Ok(Json(article))
}

/// create_news
///
/// [Admin Route] Multipart create. The image part is optional; when it is
/// missing, has a disallowed extension or fails to store, the article is
/// created with a null `image_url`.
#[utoipa::path(
    post,
    path = "/admin/news",
    responses((status = 201, description = "Created", body = News))
)]
pub async fn create_news(
    admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<News>), ApiError> {
    let (mut fields, image) = parse_news_form(multipart).await?;
    if fields.author.trim().is_empty() {
        fields.author = admin.username.clone();
    }

    let image_url = match image {
        Some((filename, data)) => store_news_image(&state.storage, &filename, data).await,
        None => None,
    };

    let article = state
        .repo
        .create_news(fields, image_url, admin.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// update_news
///
/// [Admin Route] Multipart update. A successfully stored replacement image
/// removes the old object; a failed upload leaves the stored image untouched.
#[utoipa::path(
    put,
    path = "/admin/news/{id}",
    responses(
        (status = 200, description = "Updated", body = News),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<News>, ApiError> {
    let existing = state.repo.get_news(id, false).await.ok_or(ApiError::NotFound)?;
    let (fields, image) = parse_news_form(multipart).await?;

    let mut replacement_url = None;
    if let Some((filename, data)) = image {
        if let Some(url) = store_news_image(&state.storage, &filename, data).await {
            // Only remove the old object once the new one is safely stored.
            if let Some(old_key) = existing.image_url.as_deref().and_then(key_from_url) {
                if let Err(e) = state.storage.delete(old_key).await {
                    tracing::warn!("failed to remove replaced news image {old_key}: {e}");
                }
            }
            replacement_url = Some(url);
        }
    }

    let article = state
        .repo
        .update_news(id, fields, replacement_url)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(article))
}

/// delete_news
///
/// [Admin Route] Deletes the row, then removes the stored image best-effort.
#[utoipa::path(
    delete,
    path = "/admin/news/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let existing = state.repo.get_news(id, false).await.ok_or(ApiError::NotFound)?;
    if !state.repo.delete_news(id).await {
        return Err(ApiError::NotFound);
    }
    if let Some(key) = existing.image_url.as_deref().and_then(key_from_url) {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!("failed to remove image of deleted article {id}: {e}");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- Students ---

/// roster
///
/// [Admin Route] The approved-member roster with search and filter dropdown
/// data.
#[utoipa::path(
    get,
    path = "/admin/students",
    params(RosterQuery),
    responses((status = 200, description = "Roster", body = RosterPage))
)]
pub async fn roster(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Json<RosterPage> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ROSTER_PER_PAGE);
    let filter = StudentFilter {
        approved: Some(true),
        search: query.search,
        grade: query.grade,
        group: query.group,
    };
    let (students, total) = state.repo.list_students(filter, page, per_page).await;
    let (grades, groups) = tokio::join!(state.repo.distinct_grades(), state.repo.distinct_groups());
    Json(RosterPage {
        success: true,
        students,
        pagination: Pagination::compute(page, per_page, total),
        grades,
        groups,
    })
}

/// students_info
///
/// [Admin Route] Every student regardless of approval state, with the same
/// search plus a grade filter. Backs the console's combined member view.
#[utoipa::path(
    get,
    path = "/admin/students/info",
    params(RosterQuery),
    responses((status = 200, description = "All students", body = Page<Student>))
)]
pub async fn students_info(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Json<Page<Student>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ROSTER_PER_PAGE);
    let filter = StudentFilter {
        approved: None,
        search: query.search,
        grade: query.grade,
        group: None,
    };
    let (students, total) = state.repo.list_students(filter, page, per_page).await;
    Json(Page::new(
        students,
        Pagination::compute(page, per_page, total),
    ))
}

/// applications
///
/// [Admin Route] Pending membership applications, oldest information intact.
#[utoipa::path(
    get,
    path = "/admin/applications",
    params(AdminPageQuery),
    responses((status = 200, description = "Pending applications", body = Page<Student>))
)]
pub async fn applications(
    State(state): State<AppState>,
    Query(query): Query<AdminPageQuery>,
) -> Json<Page<Student>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ADMIN_LIST_PER_PAGE);
    let filter = StudentFilter {
        approved: Some(false),
        ..Default::default()
    };
    let (students, total) = state.repo.list_students(filter, page, per_page).await;
    Json(Page::new(
        students,
        Pagination::compute(page, per_page, total),
    ))
}

/// get_student
#[utoipa::path(
    get,
    path = "/admin/students/{id}",
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Student>, ApiError> {
    let student = state.repo.get_student(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(student))
}

/// update_student
///
/// [Admin Route] Partial update: only the provided fields are written.
#[utoipa::path(
    put,
    path = "/admin/students/{id}",
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Updated", body = Student),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<Json<Student>, ApiError> {
    let student = state
        .repo
        .update_student(id, payload)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(student))
}

/// assign_group
#[utoipa::path(
    post,
    path = "/admin/students/{id}/group",
    request_body = AssignGroupRequest,
    responses(
        (status = 200, description = "Group assigned", body = Student),
        (status = 404, description = "Not found")
    )
)]
pub async fn assign_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AssignGroupRequest>,
) -> Result<Json<Student>, ApiError> {
    if payload.group.trim().is_empty() {
        return Err(ApiError::missing_field("group"));
    }
    let student = state
        .repo
        .set_student_group(id, payload.group.trim())
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(student))
}

/// approve_student
///
/// [Admin Route] Approves an application, recording who approved it and when.
#[utoipa::path(
    post,
    path = "/admin/students/{id}/approve",
    responses(
        (status = 200, description = "Approved", body = Student),
        (status = 404, description = "Not found")
    )
)]
pub async fn approve_student(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Student>, ApiError> {
    let student = state
        .repo
        .approve_student(id, admin.id)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(student))
}

/// reject_student
///
/// [Admin Route] Rejects (or un-approves) a student, clearing the approval
/// bookkeeping.
#[utoipa::path(
    post,
    path = "/admin/students/{id}/reject",
    responses(
        (status = 200, description = "Rejected", body = Student),
        (status = 404, description = "Not found")
    )
)]
pub async fn reject_student(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Student>, ApiError> {
    let student = state
        .repo
        .reject_student(id)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(student))
}

/// delete_student
#[utoipa::path(
    delete,
    path = "/admin/students/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    if state.repo.delete_student(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// export_students
///
/// [Admin Route] CSV snapshot of every student. The filename carries the
/// generation timestamp; the RFC 5987 `filename*` form keeps it intact for
/// clients that handle extended parameters.
#[utoipa::path(
    get,
    path = "/admin/students/export",
    responses((status = 200, description = "CSV download", content_type = "text/csv"))
)]
pub async fn export_students(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let students = state.repo.all_students().await;
    let bytes = students_to_csv(&students).map_err(|e| {
        tracing::error!("roster export failed: {e}");
        ApiError::Internal
    })?;
    let filename = export_filename(Utc::now());
    let disposition = format!(
        "attachment; filename=\"{filename}\"; filename*=UTF-8''{filename}"
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

// --- Timeline ---

/// list_timeline
#[utoipa::path(
    get,
    path = "/admin/timeline",
    params(AdminPageQuery),
    responses((status = 200, description = "Timeline entries", body = Page<Timeline>))
)]
pub async fn list_timeline(
    State(state): State<AppState>,
    Query(query): Query<AdminPageQuery>,
) -> Json<Page<Timeline>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ADMIN_LIST_PER_PAGE);
    let (items, total) = state.repo.list_timeline(page, per_page).await;
    Json(Page::new(items, Pagination::compute(page, per_page, total)))
}

/// get_timeline
#[utoipa::path(
    get,
    path = "/admin/timeline/{id}",
    responses(
        (status = 200, description = "Timeline entry", body = Timeline),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Timeline>, ApiError> {
    let entry = state.repo.get_timeline(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(entry))
}

/// create_timeline
#[utoipa::path(
    post,
    path = "/admin/timeline",
    request_body = TimelinePayload,
    responses((status = 201, description = "Created", body = Timeline))
)]
pub async fn create_timeline(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<TimelinePayload>,
) -> Result<(StatusCode, Json<Timeline>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    let entry = state
        .repo
        .create_timeline(payload, admin.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// update_timeline
#[utoipa::path(
    put,
    path = "/admin/timeline/{id}",
    request_body = TimelinePayload,
    responses(
        (status = 200, description = "Updated", body = Timeline),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_timeline(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TimelinePayload>,
) -> Result<Json<Timeline>, ApiError> {
    let entry = state
        .repo
        .update_timeline(id, payload)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(entry))
}

/// delete_timeline
#[utoipa::path(
    delete,
    path = "/admin/timeline/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_timeline(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    if state.repo.delete_timeline(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Team ---

/// list_team
#[utoipa::path(
    get,
    path = "/admin/team",
    params(AdminPageQuery),
    responses((status = 200, description = "Team members", body = Page<Team>))
)]
pub async fn list_team(
    State(state): State<AppState>,
    Query(query): Query<AdminPageQuery>,
) -> Json<Page<Team>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ADMIN_LIST_PER_PAGE);
    let (items, total) = state.repo.list_team(page, per_page).await;
    Json(Page::new(items, Pagination::compute(page, per_page, total)))
}

/// get_team
#[utoipa::path(
    get,
    path = "/admin/team/{id}",
    responses(
        (status = 200, description = "Team member", body = Team),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Team>, ApiError> {
    let member = state.repo.get_team(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(member))
}

/// create_team
#[utoipa::path(
    post,
    path = "/admin/team",
    request_body = TeamPayload,
    responses((status = 201, description = "Created", body = Team))
)]
pub async fn create_team(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<TeamPayload>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    let member = state
        .repo
        .create_team(payload, admin.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// update_team
#[utoipa::path(
    put,
    path = "/admin/team/{id}",
    request_body = TeamPayload,
    responses(
        (status = 200, description = "Updated", body = Team),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_team(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TeamPayload>,
) -> Result<Json<Team>, ApiError> {
    let member = state
        .repo
        .update_team(id, payload)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(member))
}

/// delete_team
#[utoipa::path(
    delete,
    path = "/admin/team/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_team(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    if state.repo.delete_team(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Partners ---

/// list_partners
#[utoipa::path(
    get,
    path = "/admin/partners",
    params(AdminPageQuery),
    responses((status = 200, description = "Partners", body = Page<Partner>))
)]
pub async fn list_partners(
    State(state): State<AppState>,
    Query(query): Query<AdminPageQuery>,
) -> Json<Page<Partner>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, PARTNERS_PER_PAGE);
    let (items, total) = state.repo.list_partners(page, per_page).await;
    Json(Page::new(items, Pagination::compute(page, per_page, total)))
}

/// get_partner
#[utoipa::path(
    get,
    path = "/admin/partners/{id}",
    responses(
        (status = 200, description = "Partner", body = Partner),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Partner>, ApiError> {
    let partner = state.repo.get_partner(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(partner))
}

/// create_partner
#[utoipa::path(
    post,
    path = "/admin/partners",
    request_body = PartnerPayload,
    responses((status = 201, description = "Created", body = Partner))
)]
pub async fn create_partner(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<PartnerPayload>,
) -> Result<(StatusCode, Json<Partner>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    let partner = state
        .repo
        .create_partner(payload, admin.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(partner)))
}

/// update_partner
#[utoipa::path(
    put,
    path = "/admin/partners/{id}",
    request_body = PartnerPayload,
    responses(
        (status = 200, description = "Updated", body = Partner),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<PartnerPayload>,
) -> Result<Json<Partner>, ApiError> {
    let partner = state
        .repo
        .update_partner(id, payload)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(partner))
}

/// delete_partner
#[utoipa::path(
    delete,
    path = "/admin/partners/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_partner(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    if state.repo.delete_partner(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Contact info & messages ---

/// get_contact_info
///
/// [Admin Route] The contact-details singleton, or 404 before first save.
#[utoipa::path(
    get,
    path = "/admin/contact",
    responses(
        (status = 200, description = "Contact info", body = ContactInfo),
        (status = 404, description = "Not configured yet")
    )
)]
pub async fn get_contact_info(
    State(state): State<AppState>,
) -> Result<Json<ContactInfo>, ApiError> {
    let info = state.repo.get_contact_info().await.ok_or(ApiError::NotFound)?;
    Ok(Json(info))
}

/// put_contact_info
///
/// [Admin Route] Upserts the singleton row, so first save and later edits go
/// through the same path.
#[utoipa::path(
    put,
    path = "/admin/contact",
    request_body = ContactInfoPayload,
    responses((status = 200, description = "Saved", body = ContactInfo))
)]
pub async fn put_contact_info(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<ContactInfoPayload>,
) -> Result<Json<ContactInfo>, ApiError> {
    for (value, field) in [
        (&payload.email, "email"),
        (&payload.phone, "phone"),
        (&payload.address, "address"),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::missing_field(field));
        }
    }
    let info = state
        .repo
        .upsert_contact_info(payload, admin.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok(Json(info))
}

/// list_messages
///
/// [Admin Route] Contact-form inbox, newest first.
#[utoipa::path(
    get,
    path = "/admin/messages",
    params(AdminPageQuery),
    responses((status = 200, description = "Messages", body = Page<ContactMessage>))
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<AdminPageQuery>,
) -> Json<Page<ContactMessage>> {
    let (page, per_page) = clamp_paging(query.page, query.per_page, ADMIN_LIST_PER_PAGE);
    let (items, total) = state.repo.list_messages(page, per_page).await;
    Json(Page::new(items, Pagination::compute(page, per_page, total)))
}

/// mark_message_read
///
/// [Admin Route] Marks a message handled, recording who replied and when.
#[utoipa::path(
    post,
    path = "/admin/messages/{id}/read",
    responses(
        (status = 200, description = "Marked read", body = ApiMessage),
        (status = 404, description = "Not found")
    )
)]
pub async fn mark_message_read(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiMessage>, ApiError> {
    if !state.repo.mark_message_read(id, admin.id).await {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiMessage {
        success: true,
        message: "message marked as read".to_string(),
    }))
}

/// delete_message
#[utoipa::path(
    delete,
    path = "/admin/messages/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_message(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    if state.repo.delete_message(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
