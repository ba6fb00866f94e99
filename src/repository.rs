use crate::models::{
    Admin, CategoryCount, ContactInfo, ContactInfoPayload, ContactMessage, DashboardStats, Event,
    EventPayload, GradeCount, MonthlyBucket, News, NewsFields, NewStudent, Partner, PartnerPayload,
    SiteStats, StatisticsReport, Student, Team, TeamPayload, Timeline, TimelinePayload,
    UpdateStudentRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;

/// StudentFilter
///
/// The roster filter set: equality on the categorical fields, substring match
/// across the text fields, and an approval-state restriction.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub approved: Option<bool>,
    pub search: Option<String>,
    pub grade: Option<String>,
    pub group: Option<String>,
}

/// clamp_paging
///
/// Normalizes client-supplied pagination: page is at least 1, per_page is
/// clamped to 1..=100 around the endpoint's default.
pub fn clamp_paging(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
    (page, per_page)
}

/// month_key
///
/// The "YYYY-MM" bucket label used by the statistics report.
pub fn month_key(dt: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", dt.year(), dt.month())
}

/// last_twelve_months
///
/// The trailing twelve month labels ending at `now`, oldest first.
pub fn last_twelve_months(now: DateTime<Utc>) -> Vec<String> {
    let mut months = Vec::with_capacity(12);
    let mut year = now.year();
    let mut month = now.month() as i32;
    for _ in 0..12 {
        months.push(format!("{year:04}-{month:02}"));
        month -= 1;
        if month == 0 {
            month = 12;
            year -= 1;
        }
    }
    months.reverse();
    months
}

/// Repository Trait
///
/// The abstract contract for all persistence operations, letting handlers talk
/// to the data layer without knowing the implementation (Postgres in
/// production, an in-memory double in tests).
///
/// Every operation is a single-statement read or write; failures are logged at
/// this layer and degrade to empty/None/false results rather than panicking.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Admin / Auth ---
    async fn get_admin(&self, id: i32) -> Option<Admin>;
    async fn get_admin_by_username(&self, username: &str) -> Option<Admin>;
    async fn get_admin_by_email(&self, email: &str) -> Option<Admin>;
    /// Records a successful admin login.
    async fn touch_admin_login(&self, id: i32);

    // --- Events ---
    /// Paginated listing. `published_only` must be true on every public path.
    async fn list_events(
        &self,
        category: Option<String>,
        published_only: bool,
        page: i64,
        per_page: i64,
    ) -> (Vec<Event>, i64);
    async fn get_event(&self, id: i32, published_only: bool) -> Option<Event>;
    async fn create_event(&self, payload: EventPayload, admin_id: i32) -> Option<Event>;
    async fn update_event(&self, id: i32, payload: EventPayload) -> Option<Event>;
    async fn delete_event(&self, id: i32) -> bool;

    // --- News ---
    async fn list_news(
        &self,
        category: Option<String>,
        published_only: bool,
        page: i64,
        per_page: i64,
    ) -> (Vec<News>, i64);
    async fn get_news(&self, id: i32, published_only: bool) -> Option<News>;
    async fn create_news(
        &self,
        fields: NewsFields,
        image_url: Option<String>,
        admin_id: i32,
    ) -> Option<News>;
    /// `image_url = None` keeps the stored image untouched (COALESCE), which is
    /// how a failed upload leaves the prior image in place.
    async fn update_news(&self, id: i32, fields: NewsFields, image_url: Option<String>)
    -> Option<News>;
    async fn delete_news(&self, id: i32) -> bool;

    // --- Timeline ---
    async fn list_timeline(&self, page: i64, per_page: i64) -> (Vec<Timeline>, i64);
    async fn published_timeline(&self) -> Vec<Timeline>;
    async fn get_timeline(&self, id: i32) -> Option<Timeline>;
    async fn create_timeline(&self, payload: TimelinePayload, admin_id: i32) -> Option<Timeline>;
    async fn update_timeline(&self, id: i32, payload: TimelinePayload) -> Option<Timeline>;
    async fn delete_timeline(&self, id: i32) -> bool;

    // --- Team ---
    async fn list_team(&self, page: i64, per_page: i64) -> (Vec<Team>, i64);
    async fn published_team(&self) -> Vec<Team>;
    async fn get_team(&self, id: i32) -> Option<Team>;
    async fn create_team(&self, payload: TeamPayload, admin_id: i32) -> Option<Team>;
    async fn update_team(&self, id: i32, payload: TeamPayload) -> Option<Team>;
    async fn delete_team(&self, id: i32) -> bool;

    // --- Partners ---
    async fn list_partners(&self, page: i64, per_page: i64) -> (Vec<Partner>, i64);
    async fn published_partners(&self) -> Vec<Partner>;
    async fn get_partner(&self, id: i32) -> Option<Partner>;
    async fn create_partner(&self, payload: PartnerPayload, admin_id: i32) -> Option<Partner>;
    async fn update_partner(&self, id: i32, payload: PartnerPayload) -> Option<Partner>;
    async fn delete_partner(&self, id: i32) -> bool;

    // --- Students ---
    async fn get_student(&self, id: i32) -> Option<Student>;
    /// Case-insensitive email lookup: the duplicate-registration check.
    async fn get_student_by_email(&self, email: &str) -> Option<Student>;
    async fn create_student(&self, new: NewStudent) -> Option<Student>;
    async fn list_students(
        &self,
        filter: StudentFilter,
        page: i64,
        per_page: i64,
    ) -> (Vec<Student>, i64);
    async fn update_student(&self, id: i32, req: UpdateStudentRequest) -> Option<Student>;
    async fn set_student_group(&self, id: i32, group: &str) -> Option<Student>;
    async fn approve_student(&self, id: i32, admin_id: i32) -> Option<Student>;
    async fn reject_student(&self, id: i32) -> Option<Student>;
    async fn delete_student(&self, id: i32) -> bool;
    /// Full snapshot for the export, regardless of approval state.
    async fn all_students(&self) -> Vec<Student>;
    async fn distinct_grades(&self) -> Vec<String>;
    async fn distinct_groups(&self) -> Vec<String>;

    // --- Contact info (single row) ---
    async fn get_contact_info(&self) -> Option<ContactInfo>;
    async fn upsert_contact_info(
        &self,
        payload: ContactInfoPayload,
        admin_id: i32,
    ) -> Option<ContactInfo>;

    // --- Contact messages ---
    async fn create_message(
        &self,
        name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Option<ContactMessage>;
    async fn list_messages(&self, page: i64, per_page: i64) -> (Vec<ContactMessage>, i64);
    async fn mark_message_read(&self, id: i32, admin_id: i32) -> bool;
    async fn delete_message(&self, id: i32) -> bool;

    // --- Aggregations ---
    async fn dashboard_stats(&self) -> DashboardStats;
    async fn site_stats(&self) -> SiteStats;
    async fn statistics_report(&self) -> StatisticsReport;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// Explicit column lists keep RETURNING clauses and row mapping in lockstep
// with the model structs.
const ADMIN_COLS: &str = "id, username, email, password_hash, is_active, created_at, last_login";
const EVENT_COLS: &str =
    "id, title, description, location, event_date, image_url, category, is_published, created_by, created_at";
const NEWS_COLS: &str =
    "id, title, content, author, publish_date, image_url, category, is_published, created_by, created_at";
const STUDENT_COLS: &str = "id, name, university, major, email, phone, password_hash, join_date, avatar_url, bio, grade, group_name, is_approved, approved_by, approved_at, created_at";
const TIMELINE_COLS: &str = "id, date_label, title, description, marker_color, order_index, is_published, created_by, created_at, updated_at";
const TEAM_COLS: &str = "id, name, position, description, avatar_color, order_index, is_published, created_by, created_at, updated_at";
const PARTNER_COLS: &str = "id, name, icon_class, icon_color, website_url, description, order_index, is_published, created_by, created_at, updated_at";
const CONTACT_INFO_COLS: &str = "id, email, phone, address, created_at, updated_at, updated_by";
const MESSAGE_COLS: &str =
    "id, name, email, subject, message, is_read, created_at, replied_at, replied_by";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional<T>(&self, sql: String, context: &str, binds: Binds) -> Option<T>
    where
        T: Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        let mut query = sqlx::query_as::<_, T>(&sql);
        for bind in binds.0 {
            query = bind.apply(query);
        }
        query.fetch_optional(&self.pool).await.unwrap_or_else(|e| {
            tracing::error!("{context} error: {e:?}");
            None
        })
    }

    async fn count(&self, mut builder: QueryBuilder<'_, Postgres>, context: &str) -> i64 {
        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("{context} count error: {e:?}");
                0
            })
    }

    async fn scalar(&self, sql: &str, context: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("{context} error: {e:?}");
                0
            })
    }

    /// Trailing-12-month creation counts for one table, keyed by "YYYY-MM".
    async fn monthly_counts(&self, table: &str) -> HashMap<String, i64> {
        let sql = format!(
            "SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month, COUNT(*) \
             FROM {table} \
             WHERE created_at >= date_trunc('month', NOW()) - INTERVAL '11 months' \
             GROUP BY 1"
        );
        match sqlx::query_as::<_, (String, i64)>(&sql)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows.into_iter().collect(),
            Err(e) => {
                tracing::error!("monthly_counts({table}) error: {e:?}");
                HashMap::new()
            }
        }
    }
}

// Small helper so fetch_optional can take a heterogeneous bind list.
enum Bind {
    Int(i32),
    Str(String),
    OptStr(Option<String>),
    Bool(bool),
    Date(DateTime<Utc>),
    OptInt(Option<i32>),
}

struct Binds(Vec<Bind>);

impl Bind {
    fn apply<'q, T>(
        self,
        query: sqlx::query::QueryAs<'q, Postgres, T, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, T, sqlx::postgres::PgArguments> {
        match self {
            Bind::Int(v) => query.bind(v),
            Bind::Str(v) => query.bind(v),
            Bind::OptStr(v) => query.bind(v),
            Bind::Bool(v) => query.bind(v),
            Bind::Date(v) => query.bind(v),
            Bind::OptInt(v) => query.bind(v),
        }
    }
}

fn push_event_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    category: &Option<String>,
    published_only: bool,
) {
    if published_only {
        builder.push(" AND is_published = true");
    }
    if let Some(cat) = category {
        builder.push(" AND category = ");
        builder.push_bind(cat.clone());
    }
}

fn push_student_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter) {
    if let Some(approved) = filter.approved {
        builder.push(" AND is_approved = ");
        builder.push_bind(approved);
    }
    if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR university ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR major ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(grade) = filter.grade.as_ref().filter(|s| !s.is_empty()) {
        builder.push(" AND grade = ");
        builder.push_bind(grade.clone());
    }
    if let Some(group) = filter.group.as_ref().filter(|s| !s.is_empty()) {
        builder.push(" AND group_name = ");
        builder.push_bind(group.clone());
    }
}

fn push_paging(builder: &mut QueryBuilder<'_, Postgres>, page: i64, per_page: i64) {
    builder.push(" LIMIT ");
    builder.push_bind(per_page);
    builder.push(" OFFSET ");
    builder.push_bind((page - 1) * per_page);
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Admin / Auth ---

    async fn get_admin(&self, id: i32) -> Option<Admin> {
        self.fetch_optional(
            format!("SELECT {ADMIN_COLS} FROM admins WHERE id = $1"),
            "get_admin",
            Binds(vec![Bind::Int(id)]),
        )
        .await
    }

    async fn get_admin_by_username(&self, username: &str) -> Option<Admin> {
        self.fetch_optional(
            format!("SELECT {ADMIN_COLS} FROM admins WHERE username = $1"),
            "get_admin_by_username",
            Binds(vec![Bind::Str(username.to_string())]),
        )
        .await
    }

    async fn get_admin_by_email(&self, email: &str) -> Option<Admin> {
        self.fetch_optional(
            format!("SELECT {ADMIN_COLS} FROM admins WHERE email = $1"),
            "get_admin_by_email",
            Binds(vec![Bind::Str(email.to_string())]),
        )
        .await
    }

    async fn touch_admin_login(&self, id: i32) {
        if let Err(e) = sqlx::query("UPDATE admins SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            tracing::error!("touch_admin_login error: {e:?}");
        }
    }

    // --- Events ---

    async fn list_events(
        &self,
        category: Option<String>,
        published_only: bool,
        page: i64,
        per_page: i64,
    ) -> (Vec<Event>, i64) {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM events WHERE 1=1");
        push_event_filters(&mut count_builder, &category, published_only);
        let total = self.count(count_builder, "list_events").await;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLS} FROM events WHERE 1=1"));
        push_event_filters(&mut builder, &category, published_only);
        // Public pages sort by the event date; the console shows newest records first.
        if published_only {
            builder.push(" ORDER BY event_date DESC");
        } else {
            builder.push(" ORDER BY created_at DESC");
        }
        push_paging(&mut builder, page, per_page);

        let rows = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_events error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn get_event(&self, id: i32, published_only: bool) -> Option<Event> {
        let mut sql = format!("SELECT {EVENT_COLS} FROM events WHERE id = $1");
        if published_only {
            sql.push_str(" AND is_published = true");
        }
        self.fetch_optional(sql, "get_event", Binds(vec![Bind::Int(id)]))
            .await
    }

    async fn create_event(&self, payload: EventPayload, admin_id: i32) -> Option<Event> {
        self.fetch_optional(
            format!(
                "INSERT INTO events (title, description, location, event_date, image_url, category, is_published, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {EVENT_COLS}"
            ),
            "create_event",
            Binds(vec![
                Bind::Str(payload.title),
                Bind::Str(payload.description),
                Bind::Str(payload.location),
                Bind::Date(payload.event_date),
                Bind::OptStr(payload.image_url),
                Bind::Str(payload.category),
                Bind::Bool(payload.is_published),
                Bind::Int(admin_id),
            ]),
        )
        .await
    }

    async fn update_event(&self, id: i32, payload: EventPayload) -> Option<Event> {
        self.fetch_optional(
            format!(
                "UPDATE events SET title = $2, description = $3, location = $4, event_date = $5, \
                 image_url = $6, category = $7, is_published = $8 \
                 WHERE id = $1 RETURNING {EVENT_COLS}"
            ),
            "update_event",
            Binds(vec![
                Bind::Int(id),
                Bind::Str(payload.title),
                Bind::Str(payload.description),
                Bind::Str(payload.location),
                Bind::Date(payload.event_date),
                Bind::OptStr(payload.image_url),
                Bind::Str(payload.category),
                Bind::Bool(payload.is_published),
            ]),
        )
        .await
    }

    async fn delete_event(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_event error: {e:?}");
                false
            }
        }
    }

    // --- News ---

    async fn list_news(
        &self,
        category: Option<String>,
        published_only: bool,
        page: i64,
        per_page: i64,
    ) -> (Vec<News>, i64) {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM news WHERE 1=1");
        push_event_filters(&mut count_builder, &category, published_only);
        let total = self.count(count_builder, "list_news").await;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {NEWS_COLS} FROM news WHERE 1=1"));
        push_event_filters(&mut builder, &category, published_only);
        if published_only {
            builder.push(" ORDER BY publish_date DESC");
        } else {
            builder.push(" ORDER BY created_at DESC");
        }
        push_paging(&mut builder, page, per_page);

        let rows = builder
            .build_query_as::<News>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_news error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn get_news(&self, id: i32, published_only: bool) -> Option<News> {
        let mut sql = format!("SELECT {NEWS_COLS} FROM news WHERE id = $1");
        if published_only {
            sql.push_str(" AND is_published = true");
        }
        self.fetch_optional(sql, "get_news", Binds(vec![Bind::Int(id)]))
            .await
    }

    async fn create_news(
        &self,
        fields: NewsFields,
        image_url: Option<String>,
        admin_id: i32,
    ) -> Option<News> {
        self.fetch_optional(
            format!(
                "INSERT INTO news (title, content, author, category, image_url, is_published, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {NEWS_COLS}"
            ),
            "create_news",
            Binds(vec![
                Bind::Str(fields.title),
                Bind::Str(fields.content),
                Bind::Str(fields.author),
                Bind::Str(fields.category),
                Bind::OptStr(image_url),
                Bind::Bool(fields.is_published),
                Bind::Int(admin_id),
            ]),
        )
        .await
    }

    async fn update_news(
        &self,
        id: i32,
        fields: NewsFields,
        image_url: Option<String>,
    ) -> Option<News> {
        // COALESCE keeps the stored image when no replacement was uploaded.
        self.fetch_optional(
            format!(
                "UPDATE news SET title = $2, content = $3, author = $4, category = $5, \
                 is_published = $6, image_url = COALESCE($7, image_url) \
                 WHERE id = $1 RETURNING {NEWS_COLS}"
            ),
            "update_news",
            Binds(vec![
                Bind::Int(id),
                Bind::Str(fields.title),
                Bind::Str(fields.content),
                Bind::Str(fields.author),
                Bind::Str(fields.category),
                Bind::Bool(fields.is_published),
                Bind::OptStr(image_url),
            ]),
        )
        .await
    }

    async fn delete_news(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_news error: {e:?}");
                false
            }
        }
    }

    // --- Timeline ---

    async fn list_timeline(&self, page: i64, per_page: i64) -> (Vec<Timeline>, i64) {
        let total = self.scalar("SELECT COUNT(*) FROM timeline", "list_timeline").await;
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {TIMELINE_COLS} FROM timeline ORDER BY order_index ASC, created_at DESC"
        ));
        push_paging(&mut builder, page, per_page);
        let rows = builder
            .build_query_as::<Timeline>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_timeline error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn published_timeline(&self) -> Vec<Timeline> {
        sqlx::query_as::<_, Timeline>(&format!(
            "SELECT {TIMELINE_COLS} FROM timeline WHERE is_published = true \
             ORDER BY order_index ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("published_timeline error: {e:?}");
            vec![]
        })
    }

    async fn get_timeline(&self, id: i32) -> Option<Timeline> {
        self.fetch_optional(
            format!("SELECT {TIMELINE_COLS} FROM timeline WHERE id = $1"),
            "get_timeline",
            Binds(vec![Bind::Int(id)]),
        )
        .await
    }

    async fn create_timeline(&self, payload: TimelinePayload, admin_id: i32) -> Option<Timeline> {
        self.fetch_optional(
            format!(
                "INSERT INTO timeline (date_label, title, description, marker_color, order_index, is_published, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TIMELINE_COLS}"
            ),
            "create_timeline",
            Binds(vec![
                Bind::Str(payload.date_label),
                Bind::Str(payload.title),
                Bind::Str(payload.description),
                Bind::Str(payload.marker_color),
                Bind::Int(payload.order_index),
                Bind::Bool(payload.is_published),
                Bind::Int(admin_id),
            ]),
        )
        .await
    }

    async fn update_timeline(&self, id: i32, payload: TimelinePayload) -> Option<Timeline> {
        self.fetch_optional(
            format!(
                "UPDATE timeline SET date_label = $2, title = $3, description = $4, \
                 marker_color = $5, order_index = $6, is_published = $7, updated_at = NOW() \
                 WHERE id = $1 RETURNING {TIMELINE_COLS}"
            ),
            "update_timeline",
            Binds(vec![
                Bind::Int(id),
                Bind::Str(payload.date_label),
                Bind::Str(payload.title),
                Bind::Str(payload.description),
                Bind::Str(payload.marker_color),
                Bind::Int(payload.order_index),
                Bind::Bool(payload.is_published),
            ]),
        )
        .await
    }

    async fn delete_timeline(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM timeline WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_timeline error: {e:?}");
                false
            }
        }
    }

    // --- Team ---

    async fn list_team(&self, page: i64, per_page: i64) -> (Vec<Team>, i64) {
        let total = self.scalar("SELECT COUNT(*) FROM team", "list_team").await;
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {TEAM_COLS} FROM team ORDER BY order_index ASC, created_at DESC"
        ));
        push_paging(&mut builder, page, per_page);
        let rows = builder
            .build_query_as::<Team>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_team error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn published_team(&self) -> Vec<Team> {
        sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLS} FROM team WHERE is_published = true \
             ORDER BY order_index ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("published_team error: {e:?}");
            vec![]
        })
    }

    async fn get_team(&self, id: i32) -> Option<Team> {
        self.fetch_optional(
            format!("SELECT {TEAM_COLS} FROM team WHERE id = $1"),
            "get_team",
            Binds(vec![Bind::Int(id)]),
        )
        .await
    }

    async fn create_team(&self, payload: TeamPayload, admin_id: i32) -> Option<Team> {
        self.fetch_optional(
            format!(
                "INSERT INTO team (name, position, description, avatar_color, order_index, is_published, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TEAM_COLS}"
            ),
            "create_team",
            Binds(vec![
                Bind::Str(payload.name),
                Bind::Str(payload.position),
                Bind::Str(payload.description),
                Bind::Str(payload.avatar_color),
                Bind::Int(payload.order_index),
                Bind::Bool(payload.is_published),
                Bind::Int(admin_id),
            ]),
        )
        .await
    }

    async fn update_team(&self, id: i32, payload: TeamPayload) -> Option<Team> {
        self.fetch_optional(
            format!(
                "UPDATE team SET name = $2, position = $3, description = $4, avatar_color = $5, \
                 order_index = $6, is_published = $7, updated_at = NOW() \
                 WHERE id = $1 RETURNING {TEAM_COLS}"
            ),
            "update_team",
            Binds(vec![
                Bind::Int(id),
                Bind::Str(payload.name),
                Bind::Str(payload.position),
                Bind::Str(payload.description),
                Bind::Str(payload.avatar_color),
                Bind::Int(payload.order_index),
                Bind::Bool(payload.is_published),
            ]),
        )
        .await
    }

    async fn delete_team(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM team WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_team error: {e:?}");
                false
            }
        }
    }

    // --- Partners ---

    async fn list_partners(&self, page: i64, per_page: i64) -> (Vec<Partner>, i64) {
        let total = self
            .scalar("SELECT COUNT(*) FROM partners", "list_partners")
            .await;
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {PARTNER_COLS} FROM partners ORDER BY order_index ASC, created_at DESC"
        ));
        push_paging(&mut builder, page, per_page);
        let rows = builder
            .build_query_as::<Partner>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_partners error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn published_partners(&self) -> Vec<Partner> {
        sqlx::query_as::<_, Partner>(&format!(
            "SELECT {PARTNER_COLS} FROM partners WHERE is_published = true \
             ORDER BY order_index ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("published_partners error: {e:?}");
            vec![]
        })
    }

    async fn get_partner(&self, id: i32) -> Option<Partner> {
        self.fetch_optional(
            format!("SELECT {PARTNER_COLS} FROM partners WHERE id = $1"),
            "get_partner",
            Binds(vec![Bind::Int(id)]),
        )
        .await
    }

    async fn create_partner(&self, payload: PartnerPayload, admin_id: i32) -> Option<Partner> {
        self.fetch_optional(
            format!(
                "INSERT INTO partners (name, icon_class, icon_color, website_url, description, order_index, is_published, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PARTNER_COLS}"
            ),
            "create_partner",
            Binds(vec![
                Bind::Str(payload.name),
                Bind::Str(payload.icon_class),
                Bind::Str(payload.icon_color),
                Bind::OptStr(payload.website_url),
                Bind::OptStr(payload.description),
                Bind::Int(payload.order_index),
                Bind::Bool(payload.is_published),
                Bind::Int(admin_id),
            ]),
        )
        .await
    }

    async fn update_partner(&self, id: i32, payload: PartnerPayload) -> Option<Partner> {
        self.fetch_optional(
            format!(
                "UPDATE partners SET name = $2, icon_class = $3, icon_color = $4, website_url = $5, \
                 description = $6, order_index = $7, is_published = $8, updated_at = NOW() \
                 WHERE id = $1 RETURNING {PARTNER_COLS}"
            ),
            "update_partner",
            Binds(vec![
                Bind::Int(id),
                Bind::Str(payload.name),
                Bind::Str(payload.icon_class),
                Bind::Str(payload.icon_color),
                Bind::OptStr(payload.website_url),
                Bind::OptStr(payload.description),
                Bind::Int(payload.order_index),
                Bind::Bool(payload.is_published),
            ]),
        )
        .await
    }

    async fn delete_partner(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM partners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_partner error: {e:?}");
                false
            }
        }
    }

    // --- Students ---

    async fn get_student(&self, id: i32) -> Option<Student> {
        self.fetch_optional(
            format!("SELECT {STUDENT_COLS} FROM students WHERE id = $1"),
            "get_student",
            Binds(vec![Bind::Int(id)]),
        )
        .await
    }

    async fn get_student_by_email(&self, email: &str) -> Option<Student> {
        self.fetch_optional(
            format!("SELECT {STUDENT_COLS} FROM students WHERE LOWER(email) = LOWER($1)"),
            "get_student_by_email",
            Binds(vec![Bind::Str(email.to_string())]),
        )
        .await
    }

    async fn create_student(&self, new: NewStudent) -> Option<Student> {
        // The unique index on LOWER(email) is the backstop for the handler's
        // duplicate check; a violation lands here and returns None.
        self.fetch_optional(
            format!(
                "INSERT INTO students (name, university, major, email, phone, bio, password_hash) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {STUDENT_COLS}"
            ),
            "create_student",
            Binds(vec![
                Bind::Str(new.name),
                Bind::Str(new.university),
                Bind::Str(new.major),
                Bind::Str(new.email),
                Bind::OptStr(new.phone),
                Bind::OptStr(new.bio),
                Bind::Str(new.password_hash),
            ]),
        )
        .await
    }

    async fn list_students(
        &self,
        filter: StudentFilter,
        page: i64,
        per_page: i64,
    ) -> (Vec<Student>, i64) {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM students WHERE 1=1");
        push_student_filters(&mut count_builder, &filter);
        let total = self.count(count_builder, "list_students").await;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {STUDENT_COLS} FROM students WHERE 1=1"));
        push_student_filters(&mut builder, &filter);
        builder.push(" ORDER BY created_at DESC");
        push_paging(&mut builder, page, per_page);

        let rows = builder
            .build_query_as::<Student>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_students error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn update_student(&self, id: i32, req: UpdateStudentRequest) -> Option<Student> {
        self.fetch_optional(
            format!(
                "UPDATE students SET \
                 name = COALESCE($2, name), \
                 university = COALESCE($3, university), \
                 major = COALESCE($4, major), \
                 grade = COALESCE($5, grade), \
                 email = COALESCE($6, email), \
                 phone = COALESCE($7, phone), \
                 bio = COALESCE($8, bio) \
                 WHERE id = $1 RETURNING {STUDENT_COLS}"
            ),
            "update_student",
            Binds(vec![
                Bind::Int(id),
                Bind::OptStr(req.name),
                Bind::OptStr(req.university),
                Bind::OptStr(req.major),
                Bind::OptStr(req.grade),
                Bind::OptStr(req.email),
                Bind::OptStr(req.phone),
                Bind::OptStr(req.bio),
            ]),
        )
        .await
    }

    async fn set_student_group(&self, id: i32, group: &str) -> Option<Student> {
        self.fetch_optional(
            format!("UPDATE students SET group_name = $2 WHERE id = $1 RETURNING {STUDENT_COLS}"),
            "set_student_group",
            Binds(vec![Bind::Int(id), Bind::Str(group.to_string())]),
        )
        .await
    }

    async fn approve_student(&self, id: i32, admin_id: i32) -> Option<Student> {
        self.fetch_optional(
            format!(
                "UPDATE students SET is_approved = true, approved_by = $2, approved_at = NOW() \
                 WHERE id = $1 RETURNING {STUDENT_COLS}"
            ),
            "approve_student",
            Binds(vec![Bind::Int(id), Bind::Int(admin_id)]),
        )
        .await
    }

    async fn reject_student(&self, id: i32) -> Option<Student> {
        // Reject clears the approver bookkeeping entirely, so it is safe to
        // apply after an approve with no dangling reference.
        self.fetch_optional(
            format!(
                "UPDATE students SET is_approved = false, approved_by = NULL, approved_at = NULL \
                 WHERE id = $1 RETURNING {STUDENT_COLS}"
            ),
            "reject_student",
            Binds(vec![Bind::Int(id)]),
        )
        .await
    }

    async fn delete_student(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_student error: {e:?}");
                false
            }
        }
    }

    async fn all_students(&self) -> Vec<Student> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLS} FROM students ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("all_students error: {e:?}");
            vec![]
        })
    }

    async fn distinct_grades(&self) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT grade FROM students WHERE grade IS NOT NULL ORDER BY grade",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("distinct_grades error: {e:?}");
            vec![]
        })
    }

    async fn distinct_groups(&self) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT group_name FROM students WHERE group_name IS NOT NULL ORDER BY group_name",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("distinct_groups error: {e:?}");
            vec![]
        })
    }

    // --- Contact info ---

    async fn get_contact_info(&self) -> Option<ContactInfo> {
        self.fetch_optional(
            format!("SELECT {CONTACT_INFO_COLS} FROM contact_info WHERE id = 1"),
            "get_contact_info",
            Binds(vec![]),
        )
        .await
    }

    async fn upsert_contact_info(
        &self,
        payload: ContactInfoPayload,
        admin_id: i32,
    ) -> Option<ContactInfo> {
        self.fetch_optional(
            format!(
                "INSERT INTO contact_info (id, email, phone, address, updated_by) \
                 VALUES (1, $1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, phone = EXCLUDED.phone, \
                 address = EXCLUDED.address, updated_by = EXCLUDED.updated_by, updated_at = NOW() \
                 RETURNING {CONTACT_INFO_COLS}"
            ),
            "upsert_contact_info",
            Binds(vec![
                Bind::Str(payload.email),
                Bind::Str(payload.phone),
                Bind::Str(payload.address),
                Bind::OptInt(Some(admin_id)),
            ]),
        )
        .await
    }

    // --- Contact messages ---

    async fn create_message(
        &self,
        name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Option<ContactMessage> {
        self.fetch_optional(
            format!(
                "INSERT INTO contact_messages (name, email, subject, message) \
                 VALUES ($1, $2, $3, $4) RETURNING {MESSAGE_COLS}"
            ),
            "create_message",
            Binds(vec![
                Bind::Str(name),
                Bind::Str(email),
                Bind::Str(subject),
                Bind::Str(message),
            ]),
        )
        .await
    }

    async fn list_messages(&self, page: i64, per_page: i64) -> (Vec<ContactMessage>, i64) {
        let total = self
            .scalar("SELECT COUNT(*) FROM contact_messages", "list_messages")
            .await;
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {MESSAGE_COLS} FROM contact_messages ORDER BY created_at DESC"
        ));
        push_paging(&mut builder, page, per_page);
        let rows = builder
            .build_query_as::<ContactMessage>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_messages error: {e:?}");
                vec![]
            });
        (rows, total)
    }

    async fn mark_message_read(&self, id: i32, admin_id: i32) -> bool {
        match sqlx::query(
            "UPDATE contact_messages SET is_read = true, replied_by = $2, replied_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(admin_id)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("mark_message_read error: {e:?}");
                false
            }
        }
    }

    async fn delete_message(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_message error: {e:?}");
                false
            }
        }
    }

    // --- Aggregations ---

    async fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats {
            total_events: self.scalar("SELECT COUNT(*) FROM events", "stats").await,
            total_news: self.scalar("SELECT COUNT(*) FROM news", "stats").await,
            total_students: self.scalar("SELECT COUNT(*) FROM students", "stats").await,
            pending_students: self
                .scalar(
                    "SELECT COUNT(*) FROM students WHERE is_approved = false",
                    "stats",
                )
                .await,
        }
    }

    async fn site_stats(&self) -> SiteStats {
        SiteStats {
            total_students: self
                .scalar(
                    "SELECT COUNT(*) FROM students WHERE is_approved = true",
                    "site_stats",
                )
                .await,
            total_events: self
                .scalar(
                    "SELECT COUNT(*) FROM events WHERE is_published = true",
                    "site_stats",
                )
                .await,
            total_news: self
                .scalar(
                    "SELECT COUNT(*) FROM news WHERE is_published = true",
                    "site_stats",
                )
                .await,
            universities: self
                .scalar(
                    "SELECT COUNT(DISTINCT university) FROM students WHERE is_approved = true",
                    "site_stats",
                )
                .await,
        }
    }

    async fn statistics_report(&self) -> StatisticsReport {
        let event_months = self.monthly_counts("events").await;
        let news_months = self.monthly_counts("news").await;
        let student_months = self.monthly_counts("students").await;

        let monthly = last_twelve_months(Utc::now())
            .into_iter()
            .map(|month| MonthlyBucket {
                events: *event_months.get(&month).unwrap_or(&0),
                news: *news_months.get(&month).unwrap_or(&0),
                students: *student_months.get(&month).unwrap_or(&0),
                month,
            })
            .collect();

        let event_categories = sqlx::query_as::<_, (String, i64)>(
            "SELECT category, COUNT(*) FROM events GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("event categories error: {e:?}");
            vec![]
        })
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

        let news_categories = sqlx::query_as::<_, (String, i64)>(
            "SELECT category, COUNT(*) FROM news GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("news categories error: {e:?}");
            vec![]
        })
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

        let student_grades = sqlx::query_as::<_, (Option<String>, i64)>(
            "SELECT grade, COUNT(*) FROM students GROUP BY grade ORDER BY grade",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("student grades error: {e:?}");
            vec![]
        })
        .into_iter()
        .map(|(grade, count)| GradeCount { grade, count })
        .collect();

        StatisticsReport {
            total_events: self.scalar("SELECT COUNT(*) FROM events", "statistics").await,
            published_events: self
                .scalar(
                    "SELECT COUNT(*) FROM events WHERE is_published = true",
                    "statistics",
                )
                .await,
            total_news: self.scalar("SELECT COUNT(*) FROM news", "statistics").await,
            published_news: self
                .scalar(
                    "SELECT COUNT(*) FROM news WHERE is_published = true",
                    "statistics",
                )
                .await,
            total_students: self
                .scalar("SELECT COUNT(*) FROM students", "statistics")
                .await,
            approved_students: self
                .scalar(
                    "SELECT COUNT(*) FROM students WHERE is_approved = true",
                    "statistics",
                )
                .await,
            pending_students: self
                .scalar(
                    "SELECT COUNT(*) FROM students WHERE is_approved = false",
                    "statistics",
                )
                .await,
            monthly,
            event_categories,
            news_categories,
            student_grades,
        }
    }
}
