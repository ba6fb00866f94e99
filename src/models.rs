use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Admin
///
/// A console operator from the `admins` table. Any active admin has full CRUD
/// over every entity; there are no finer-grained permissions.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Never serialized: the hash stays server-side.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Event
///
/// A society event from the `events` table. `is_published` gates visibility on
/// every public read path.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    #[ts(type = "string")]
    pub event_date: DateTime<Utc>,
    pub image_url: Option<String>,
    pub category: String,
    pub is_published: bool,
    // FK to admins.id (creator).
    pub created_by: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// News
///
/// A news article from the `news` table. The cover image (if any) lives in the
/// object store and is referenced here by its public URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct News {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: String,
    #[ts(type = "string")]
    pub publish_date: DateTime<Utc>,
    pub image_url: Option<String>,
    pub category: String,
    pub is_published: bool,
    pub created_by: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Student
///
/// A member (or pending applicant) from the `students` table. Approval is a
/// plain boolean applied uniformly: `is_approved = false` means pending, and
/// only approved students can authenticate or appear on public rosters.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub university: String,
    pub major: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: Option<String>,
    #[ts(type = "string")]
    pub join_date: DateTime<Utc>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub grade: Option<String>,
    /// Maps SQL column "group_name" to the JSON key "group" the frontend expects
    /// ("group" is reserved in SQL, so the column carries the longer name).
    #[serde(rename = "group")]
    pub group_name: Option<String>,
    pub is_approved: bool,
    pub approved_by: Option<i32>,
    #[ts(type = "string | null")]
    pub approved_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Timeline
///
/// A milestone on the "about us" timeline. Display order is manual: ascending
/// `order_index`, with newer rows first among ties.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Timeline {
    pub id: i32,
    /// Free-text date label, e.g. "March 2022".
    pub date_label: String,
    pub title: String,
    pub description: String,
    pub marker_color: String,
    pub order_index: i32,
    pub is_published: bool,
    pub created_by: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Team
///
/// A committee member card. Same manual ordering rule as Timeline.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub position: String,
    pub description: String,
    pub avatar_color: String,
    pub order_index: i32,
    pub is_published: bool,
    pub created_by: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Partner
///
/// A partner organization card. Same manual ordering rule as Timeline.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Partner {
    pub id: i32,
    pub name: String,
    pub icon_class: String,
    pub icon_color: String,
    pub website_url: Option<String>,
    pub description: Option<String>,
    pub order_index: i32,
    pub is_published: bool,
    pub created_by: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ContactInfo
///
/// The single row of publicly displayed contact details. The table pins
/// `id = 1` and all writes go through an upsert, so concurrent first-time
/// edits cannot create duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContactInfo {
    pub id: i32,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<i32>,
}

/// ContactMessage
///
/// A message submitted through the public contact form. Created by the public,
/// mutated only by admins (mark-read / delete).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContactMessage {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub replied_at: Option<DateTime<Utc>>,
    pub replied_by: Option<i32>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input for the unified public login (POST /api/login): checked against
/// admins by email first, then students.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// AdminLoginRequest
///
/// Input for the admin console login (POST /admin/login), matched on username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// JoinRequest
///
/// Input payload for the public membership application (POST /api/join).
/// The password is hashed before it ever reaches the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct JoinRequest {
    pub name: String,
    pub university: String,
    pub major: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

/// ContactRequest
///
/// Input for the public contact form. Fields are optional at the serde level so
/// the handler can report exactly which one is missing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// SubscribeRequest
///
/// Input for the newsletter subscription acknowledgement (POST /api/subscribe).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

/// EventPayload
///
/// Create/update payload for events. Events reference images by URL directly;
/// only News carries a server-side upload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    #[ts(type = "string")]
    pub event_date: DateTime<Utc>,
    pub category: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// NewsFields
///
/// The text portion of a News create/update, assembled from the multipart form
/// before any image handling happens. Upload failures must not corrupt these.
#[derive(Debug, Clone, Default)]
pub struct NewsFields {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub is_published: bool,
}

/// TimelinePayload
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TimelinePayload {
    pub date_label: String,
    pub title: String,
    pub description: String,
    #[serde(default = "default_color")]
    pub marker_color: String,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub is_published: bool,
}

/// TeamPayload
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TeamPayload {
    pub name: String,
    pub position: String,
    pub description: String,
    #[serde(default = "default_color")]
    pub avatar_color: String,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub is_published: bool,
}

/// PartnerPayload
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PartnerPayload {
    pub name: String,
    pub icon_class: String,
    #[serde(default = "default_color")]
    pub icon_color: String,
    pub website_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub is_published: bool,
}

fn default_color() -> String {
    "primary".to_string()
}

/// ContactInfoPayload
///
/// Upsert payload for the contact-info singleton.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactInfoPayload {
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// UpdateStudentRequest
///
/// Partial update payload for a student record. Uses `Option<T>` for every
/// field so only provided fields are written (COALESCE at the repository).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStudentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// AssignGroupRequest
///
/// Moves a student into a named group (POST /admin/students/{id}/group).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssignGroupRequest {
    pub group: String,
}

/// NewStudent
///
/// Internal insert record for student self-registration; the password is
/// already hashed by the time this is constructed.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub university: String,
    pub major: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub password_hash: String,
}

// --- Response Envelopes ---

/// ApiMessage
///
/// The `{success, message}` envelope every POST endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

/// Pagination
///
/// The pagination block attached to every list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Pagination {
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
    pub total: i64,
}

impl Pagination {
    /// pages = ceil(total / per_page); an empty result set still reports page 1 of 0.
    pub fn compute(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            pages,
            per_page,
            total,
        }
    }
}

/// Page
///
/// Generic paginated list envelope used by the admin console endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Page<T: TS> {
    pub success: bool,
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T: TS> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            items,
            pagination,
        }
    }
}

/// EventList / NewsList / StudentList
///
/// Public list envelopes keep their entity-named keys for API compatibility.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EventList {
    pub success: bool,
    pub events: Vec<Event>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewsList {
    pub success: bool,
    pub news: Vec<News>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StudentList {
    pub success: bool,
    pub students: Vec<Student>,
    pub pagination: Pagination,
}

/// RosterPage
///
/// Admin roster listing: the page of students plus the distinct grade/group
/// values used to populate the filter dropdowns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RosterPage {
    pub success: bool,
    pub students: Vec<Student>,
    pub pagination: Pagination,
    pub grades: Vec<String>,
    pub groups: Vec<String>,
}

/// LoginResponse
///
/// Successful logins return the signed session token along with the role tag
/// and display name held in it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
}

/// AboutPage
///
/// Everything the public "about us" page needs: the published timeline, team
/// and partner lists in display order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AboutPage {
    pub success: bool,
    pub timeline: Vec<Timeline>,
    pub team: Vec<Team>,
    pub partners: Vec<Partner>,
}

// --- Dashboard & Statistics Schemas (Output) ---

/// DashboardStats
///
/// Counters for the admin landing page (GET /admin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_events: i64,
    pub total_news: i64,
    pub total_students: i64,
    /// Students with `is_approved = false`.
    pub pending_students: i64,
}

/// SiteStats
///
/// Public counters (GET /api/stats). Only published/approved rows count here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SiteStats {
    pub total_students: i64,
    pub total_events: i64,
    pub total_news: i64,
    /// Distinct universities among approved students.
    pub universities: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SiteStatsResponse {
    pub success: bool,
    pub stats: SiteStats,
}

/// MonthlyBucket
///
/// One month of the trailing-12-month creation counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MonthlyBucket {
    /// "YYYY-MM".
    pub month: String,
    pub events: i64,
    pub news: i64,
    pub students: i64,
}

/// CategoryCount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// GradeCount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct GradeCount {
    pub grade: Option<String>,
    pub count: i64,
}

/// StatisticsReport
///
/// The full per-request aggregation behind GET /admin/statistics. Nothing is
/// precomputed or cached.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StatisticsReport {
    pub total_events: i64,
    pub published_events: i64,
    pub total_news: i64,
    pub published_news: i64,
    pub total_students: i64,
    pub approved_students: i64,
    pub pending_students: i64,
    pub monthly: Vec<MonthlyBucket>,
    pub event_categories: Vec<CategoryCount>,
    pub news_categories: Vec<CategoryCount>,
    pub student_grades: Vec<GradeCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::compute(2, 10, 31);
        assert_eq!(p.pages, 4);
        assert_eq!(p.total, 31);
        assert_eq!(p.per_page, 10);
    }

    #[test]
    fn pagination_exact_multiple() {
        assert_eq!(Pagination::compute(1, 10, 30).pages, 3);
        assert_eq!(Pagination::compute(1, 10, 0).pages, 0);
    }

    #[test]
    fn student_group_serializes_as_group() {
        let s = Student {
            group_name: Some("alpha".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains(r#""group":"alpha""#));
        assert!(!json.contains("group_name"));
        // The hash never leaves the server.
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn update_student_request_omits_none_fields() {
        let req = UpdateStudentRequest {
            name: Some("New Name".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""name":"New Name""#));
        assert!(!json.contains("university"));
    }
}
