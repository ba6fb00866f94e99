#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use society_portal::{
    AppConfig, AppState, MockObjectStore, StorageState, create_router,
    auth::hash_password,
    models::{
        Admin, CategoryCount, ContactInfo, ContactInfoPayload, ContactMessage, DashboardStats,
        Event, EventPayload, GradeCount, MonthlyBucket, News, NewsFields, NewStudent, Partner,
        PartnerPayload, SiteStats, StatisticsReport, Student, Team, TeamPayload, Timeline,
        TimelinePayload, UpdateStudentRequest,
    },
    repository::{Repository, RepositoryState, StudentFilter, last_twelve_months, month_key},
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// --- In-memory repository double ---

#[derive(Default)]
struct Inner {
    admins: Vec<Admin>,
    events: Vec<Event>,
    news: Vec<News>,
    students: Vec<Student>,
    timeline: Vec<Timeline>,
    team: Vec<Team>,
    partners: Vec<Partner>,
    contact_info: Option<ContactInfo>,
    messages: Vec<ContactMessage>,
    next_id: i32,
    student_inserts_fail: bool,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// MockRepo
///
/// A faithful in-memory stand-in for the Postgres repository: same filtering,
/// ordering and pagination semantics, so routed handler tests exercise real
/// behavior without a database.
#[derive(Clone, Default)]
pub struct MockRepo {
    inner: Arc<Mutex<Inner>>,
}

fn paginate<T: Clone>(rows: Vec<T>, page: i64, per_page: i64) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let start = ((page - 1) * per_page).max(0) as usize;
    let page_rows = rows.into_iter().skip(start).take(per_page as usize).collect();
    (page_rows, total)
}

impl MockRepo {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding helpers ---

    pub fn seed_admin(&self, username: &str, email: &str, password: &str) -> Admin {
        let mut inner = self.inner.lock().unwrap();
        let admin = Admin {
            id: inner.next_id(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        };
        inner.admins.push(admin.clone());
        admin
    }

    /// Makes every subsequent student insert fail, simulating a database
    /// error during registration.
    pub fn fail_student_inserts(&self) {
        self.inner.lock().unwrap().student_inserts_fail = true;
    }

    pub fn deactivate_admin(&self, id: i32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == id) {
            admin.is_active = false;
        }
    }

    pub fn seed_event(&self, title: &str, category: &str, published: bool) -> Event {
        self.seed_event_at(title, category, published, Utc::now())
    }

    pub fn seed_event_at(
        &self,
        title: &str,
        category: &str,
        published: bool,
        created_at: DateTime<Utc>,
    ) -> Event {
        let mut inner = self.inner.lock().unwrap();
        let event = Event {
            id: inner.next_id(),
            title: title.to_string(),
            description: "seeded".to_string(),
            location: "campus".to_string(),
            event_date: created_at + Duration::days(7),
            category: category.to_string(),
            is_published: published,
            created_at,
            ..Default::default()
        };
        inner.events.push(event.clone());
        event
    }

    pub fn seed_news(&self, title: &str, content: &str, published: bool) -> News {
        let mut inner = self.inner.lock().unwrap();
        let article = News {
            id: inner.next_id(),
            title: title.to_string(),
            content: content.to_string(),
            author: "staff".to_string(),
            publish_date: Utc::now(),
            category: "general".to_string(),
            is_published: published,
            created_at: Utc::now(),
            ..Default::default()
        };
        inner.news.push(article.clone());
        article
    }

    pub fn seed_student(&self, name: &str, email: &str, approved: bool) -> Student {
        self.seed_student_full(name, email, approved, None, None, "password")
    }

    pub fn seed_student_full(
        &self,
        name: &str,
        email: &str,
        approved: bool,
        grade: Option<&str>,
        group: Option<&str>,
        password: &str,
    ) -> Student {
        let mut inner = self.inner.lock().unwrap();
        let student = Student {
            id: inner.next_id(),
            name: name.to_string(),
            university: "State University".to_string(),
            major: "Computer Science".to_string(),
            email: email.to_string(),
            password_hash: Some(hash_password(password).unwrap()),
            join_date: Utc::now(),
            grade: grade.map(str::to_string),
            group_name: group.map(str::to_string),
            is_approved: approved,
            created_at: Utc::now(),
            ..Default::default()
        };
        inner.students.push(student.clone());
        student
    }

    pub fn seed_timeline(&self, title: &str, order_index: i32, published: bool) -> Timeline {
        let mut inner = self.inner.lock().unwrap();
        let entry = Timeline {
            id: inner.next_id(),
            date_label: "March 2022".to_string(),
            title: title.to_string(),
            description: "seeded".to_string(),
            marker_color: "primary".to_string(),
            order_index,
            is_published: published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        inner.timeline.push(entry.clone());
        entry
    }

    pub fn seed_team(&self, name: &str, order_index: i32, published: bool) -> Team {
        let mut inner = self.inner.lock().unwrap();
        let member = Team {
            id: inner.next_id(),
            name: name.to_string(),
            position: "member".to_string(),
            description: "seeded".to_string(),
            avatar_color: "primary".to_string(),
            order_index,
            is_published: published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        inner.team.push(member.clone());
        member
    }

    pub fn seed_partner(&self, name: &str, order_index: i32, published: bool) -> Partner {
        let mut inner = self.inner.lock().unwrap();
        let partner = Partner {
            id: inner.next_id(),
            name: name.to_string(),
            icon_class: "fa-building".to_string(),
            icon_color: "primary".to_string(),
            order_index,
            is_published: published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        inner.partners.push(partner.clone());
        partner
    }

    // --- Inspection helpers ---

    pub fn student_by_id(&self, id: i32) -> Option<Student> {
        self.inner
            .lock()
            .unwrap()
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    pub fn news_by_id(&self, id: i32) -> Option<News> {
        self.inner
            .lock()
            .unwrap()
            .news
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    pub fn admin_by_id(&self, id: i32) -> Option<Admin> {
        self.inner
            .lock()
            .unwrap()
            .admins
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }
}

fn student_matches(student: &Student, filter: &StudentFilter) -> bool {
    if let Some(approved) = filter.approved {
        if student.is_approved != approved {
            return false;
        }
    }
    if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        let haystacks = [
            &student.name,
            &student.university,
            &student.major,
            &student.email,
        ];
        if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
            return false;
        }
    }
    if let Some(grade) = filter.grade.as_ref().filter(|s| !s.is_empty()) {
        if student.grade.as_deref() != Some(grade.as_str()) {
            return false;
        }
    }
    if let Some(group) = filter.group.as_ref().filter(|s| !s.is_empty()) {
        if student.group_name.as_deref() != Some(group.as_str()) {
            return false;
        }
    }
    true
}

fn category_counts(categories: impl Iterator<Item = String>) -> Vec<CategoryCount> {
    let mut counts = std::collections::BTreeMap::new();
    for category in categories {
        *counts.entry(category).or_insert(0i64) += 1;
    }
    counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect()
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_admin(&self, id: i32) -> Option<Admin> {
        self.admin_by_id(id)
    }

    async fn get_admin_by_username(&self, username: &str) -> Option<Admin> {
        self.inner
            .lock()
            .unwrap()
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }

    async fn get_admin_by_email(&self, email: &str) -> Option<Admin> {
        self.inner
            .lock()
            .unwrap()
            .admins
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }

    async fn touch_admin_login(&self, id: i32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == id) {
            admin.last_login = Some(Utc::now());
        }
    }

    async fn list_events(
        &self,
        category: Option<String>,
        published_only: bool,
        page: i64,
        per_page: i64,
    ) -> (Vec<Event>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| !published_only || e.is_published)
            .filter(|e| category.as_deref().is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        if published_only {
            rows.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        } else {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        paginate(rows, page, per_page)
    }

    async fn get_event(&self, id: i32, published_only: bool) -> Option<Event> {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id == id && (!published_only || e.is_published))
            .cloned()
    }

    async fn create_event(&self, payload: EventPayload, admin_id: i32) -> Option<Event> {
        let mut inner = self.inner.lock().unwrap();
        let event = Event {
            id: inner.next_id(),
            title: payload.title,
            description: payload.description,
            location: payload.location,
            event_date: payload.event_date,
            image_url: payload.image_url,
            category: payload.category,
            is_published: payload.is_published,
            created_by: Some(admin_id),
            created_at: Utc::now(),
        };
        inner.events.push(event.clone());
        Some(event)
    }

    async fn update_event(&self, id: i32, payload: EventPayload) -> Option<Event> {
        let mut inner = self.inner.lock().unwrap();
        let event = inner.events.iter_mut().find(|e| e.id == id)?;
        event.title = payload.title;
        event.description = payload.description;
        event.location = payload.location;
        event.event_date = payload.event_date;
        event.image_url = payload.image_url;
        event.category = payload.category;
        event.is_published = payload.is_published;
        Some(event.clone())
    }

    async fn delete_event(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        inner.events.len() < before
    }

    async fn list_news(
        &self,
        category: Option<String>,
        published_only: bool,
        page: i64,
        per_page: i64,
    ) -> (Vec<News>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<News> = inner
            .news
            .iter()
            .filter(|n| !published_only || n.is_published)
            .filter(|n| category.as_deref().is_none_or(|c| n.category == c))
            .cloned()
            .collect();
        if published_only {
            rows.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
        } else {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        paginate(rows, page, per_page)
    }

    async fn get_news(&self, id: i32, published_only: bool) -> Option<News> {
        self.inner
            .lock()
            .unwrap()
            .news
            .iter()
            .find(|n| n.id == id && (!published_only || n.is_published))
            .cloned()
    }

    async fn create_news(
        &self,
        fields: NewsFields,
        image_url: Option<String>,
        admin_id: i32,
    ) -> Option<News> {
        let mut inner = self.inner.lock().unwrap();
        let article = News {
            id: inner.next_id(),
            title: fields.title,
            content: fields.content,
            author: fields.author,
            publish_date: Utc::now(),
            image_url,
            category: fields.category,
            is_published: fields.is_published,
            created_by: Some(admin_id),
            created_at: Utc::now(),
        };
        inner.news.push(article.clone());
        Some(article)
    }

    async fn update_news(
        &self,
        id: i32,
        fields: NewsFields,
        image_url: Option<String>,
    ) -> Option<News> {
        let mut inner = self.inner.lock().unwrap();
        let article = inner.news.iter_mut().find(|n| n.id == id)?;
        article.title = fields.title;
        article.content = fields.content;
        article.author = fields.author;
        article.category = fields.category;
        article.is_published = fields.is_published;
        if let Some(url) = image_url {
            article.image_url = Some(url);
        }
        Some(article.clone())
    }

    async fn delete_news(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.news.len();
        inner.news.retain(|n| n.id != id);
        inner.news.len() < before
    }

    async fn list_timeline(&self, page: i64, per_page: i64) -> (Vec<Timeline>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.timeline.clone();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        paginate(rows, page, per_page)
    }

    async fn published_timeline(&self) -> Vec<Timeline> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Timeline> = inner
            .timeline
            .iter()
            .filter(|t| t.is_published)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        rows
    }

    async fn get_timeline(&self, id: i32) -> Option<Timeline> {
        self.inner
            .lock()
            .unwrap()
            .timeline
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    async fn create_timeline(&self, payload: TimelinePayload, admin_id: i32) -> Option<Timeline> {
        let mut inner = self.inner.lock().unwrap();
        let entry = Timeline {
            id: inner.next_id(),
            date_label: payload.date_label,
            title: payload.title,
            description: payload.description,
            marker_color: payload.marker_color,
            order_index: payload.order_index,
            is_published: payload.is_published,
            created_by: Some(admin_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        inner.timeline.push(entry.clone());
        Some(entry)
    }

    async fn update_timeline(&self, id: i32, payload: TimelinePayload) -> Option<Timeline> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.timeline.iter_mut().find(|t| t.id == id)?;
        entry.date_label = payload.date_label;
        entry.title = payload.title;
        entry.description = payload.description;
        entry.marker_color = payload.marker_color;
        entry.order_index = payload.order_index;
        entry.is_published = payload.is_published;
        entry.updated_at = Utc::now();
        Some(entry.clone())
    }

    async fn delete_timeline(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.timeline.len();
        inner.timeline.retain(|t| t.id != id);
        inner.timeline.len() < before
    }

    async fn list_team(&self, page: i64, per_page: i64) -> (Vec<Team>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.team.clone();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        paginate(rows, page, per_page)
    }

    async fn published_team(&self) -> Vec<Team> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Team> = inner.team.iter().filter(|t| t.is_published).cloned().collect();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        rows
    }

    async fn get_team(&self, id: i32) -> Option<Team> {
        self.inner
            .lock()
            .unwrap()
            .team
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    async fn create_team(&self, payload: TeamPayload, admin_id: i32) -> Option<Team> {
        let mut inner = self.inner.lock().unwrap();
        let member = Team {
            id: inner.next_id(),
            name: payload.name,
            position: payload.position,
            description: payload.description,
            avatar_color: payload.avatar_color,
            order_index: payload.order_index,
            is_published: payload.is_published,
            created_by: Some(admin_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        inner.team.push(member.clone());
        Some(member)
    }

    async fn update_team(&self, id: i32, payload: TeamPayload) -> Option<Team> {
        let mut inner = self.inner.lock().unwrap();
        let member = inner.team.iter_mut().find(|t| t.id == id)?;
        member.name = payload.name;
        member.position = payload.position;
        member.description = payload.description;
        member.avatar_color = payload.avatar_color;
        member.order_index = payload.order_index;
        member.is_published = payload.is_published;
        member.updated_at = Utc::now();
        Some(member.clone())
    }

    async fn delete_team(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.team.len();
        inner.team.retain(|t| t.id != id);
        inner.team.len() < before
    }

    async fn list_partners(&self, page: i64, per_page: i64) -> (Vec<Partner>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.partners.clone();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        paginate(rows, page, per_page)
    }

    async fn published_partners(&self) -> Vec<Partner> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Partner> = inner
            .partners
            .iter()
            .filter(|p| p.is_published)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        rows
    }

    async fn get_partner(&self, id: i32) -> Option<Partner> {
        self.inner
            .lock()
            .unwrap()
            .partners
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn create_partner(&self, payload: PartnerPayload, admin_id: i32) -> Option<Partner> {
        let mut inner = self.inner.lock().unwrap();
        let partner = Partner {
            id: inner.next_id(),
            name: payload.name,
            icon_class: payload.icon_class,
            icon_color: payload.icon_color,
            website_url: payload.website_url,
            description: payload.description,
            order_index: payload.order_index,
            is_published: payload.is_published,
            created_by: Some(admin_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        inner.partners.push(partner.clone());
        Some(partner)
    }

    async fn update_partner(&self, id: i32, payload: PartnerPayload) -> Option<Partner> {
        let mut inner = self.inner.lock().unwrap();
        let partner = inner.partners.iter_mut().find(|p| p.id == id)?;
        partner.name = payload.name;
        partner.icon_class = payload.icon_class;
        partner.icon_color = payload.icon_color;
        partner.website_url = payload.website_url;
        partner.description = payload.description;
        partner.order_index = payload.order_index;
        partner.is_published = payload.is_published;
        partner.updated_at = Utc::now();
        Some(partner.clone())
    }

    async fn delete_partner(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.partners.len();
        inner.partners.retain(|p| p.id != id);
        inner.partners.len() < before
    }

    async fn get_student(&self, id: i32) -> Option<Student> {
        self.student_by_id(id)
    }

    async fn get_student_by_email(&self, email: &str) -> Option<Student> {
        let email = email.to_lowercase();
        self.inner
            .lock()
            .unwrap()
            .students
            .iter()
            .find(|s| s.email.to_lowercase() == email)
            .cloned()
    }

    async fn create_student(&self, new: NewStudent) -> Option<Student> {
        let mut inner = self.inner.lock().unwrap();
        if inner.student_inserts_fail {
            return None;
        }
        let email = new.email.to_lowercase();
        if inner.students.iter().any(|s| s.email.to_lowercase() == email) {
            return None;
        }
        let student = Student {
            id: inner.next_id(),
            name: new.name,
            university: new.university,
            major: new.major,
            email: new.email,
            phone: new.phone,
            bio: new.bio,
            password_hash: Some(new.password_hash),
            join_date: Utc::now(),
            is_approved: false,
            created_at: Utc::now(),
            ..Default::default()
        };
        inner.students.push(student.clone());
        Some(student)
    }

    async fn list_students(
        &self,
        filter: StudentFilter,
        page: i64,
        per_page: i64,
    ) -> (Vec<Student>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Student> = inner
            .students
            .iter()
            .filter(|s| student_matches(s, &filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        paginate(rows, page, per_page)
    }

    async fn update_student(&self, id: i32, req: UpdateStudentRequest) -> Option<Student> {
        let mut inner = self.inner.lock().unwrap();
        let student = inner.students.iter_mut().find(|s| s.id == id)?;
        if let Some(name) = req.name {
            student.name = name;
        }
        if let Some(university) = req.university {
            student.university = university;
        }
        if let Some(major) = req.major {
            student.major = major;
        }
        if let Some(grade) = req.grade {
            student.grade = Some(grade);
        }
        if let Some(email) = req.email {
            student.email = email;
        }
        if let Some(phone) = req.phone {
            student.phone = Some(phone);
        }
        if let Some(bio) = req.bio {
            student.bio = Some(bio);
        }
        Some(student.clone())
    }

    async fn set_student_group(&self, id: i32, group: &str) -> Option<Student> {
        let mut inner = self.inner.lock().unwrap();
        let student = inner.students.iter_mut().find(|s| s.id == id)?;
        student.group_name = Some(group.to_string());
        Some(student.clone())
    }

    async fn approve_student(&self, id: i32, admin_id: i32) -> Option<Student> {
        let mut inner = self.inner.lock().unwrap();
        let student = inner.students.iter_mut().find(|s| s.id == id)?;
        student.is_approved = true;
        student.approved_by = Some(admin_id);
        student.approved_at = Some(Utc::now());
        Some(student.clone())
    }

    async fn reject_student(&self, id: i32) -> Option<Student> {
        let mut inner = self.inner.lock().unwrap();
        let student = inner.students.iter_mut().find(|s| s.id == id)?;
        student.is_approved = false;
        student.approved_by = None;
        student.approved_at = None;
        Some(student.clone())
    }

    async fn delete_student(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.students.len();
        inner.students.retain(|s| s.id != id);
        inner.students.len() < before
    }

    async fn all_students(&self) -> Vec<Student> {
        let mut rows = self.inner.lock().unwrap().students.clone();
        rows.sort_by_key(|s| s.id);
        rows
    }

    async fn distinct_grades(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .students
            .iter()
            .filter_map(|s| s.grade.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    async fn distinct_groups(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .students
            .iter()
            .filter_map(|s| s.group_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    async fn get_contact_info(&self) -> Option<ContactInfo> {
        self.inner.lock().unwrap().contact_info.clone()
    }

    async fn upsert_contact_info(
        &self,
        payload: ContactInfoPayload,
        admin_id: i32,
    ) -> Option<ContactInfo> {
        let mut inner = self.inner.lock().unwrap();
        let info = match inner.contact_info.take() {
            Some(mut existing) => {
                existing.email = payload.email;
                existing.phone = payload.phone;
                existing.address = payload.address;
                existing.updated_by = Some(admin_id);
                existing.updated_at = Utc::now();
                existing
            }
            None => ContactInfo {
                id: 1,
                email: payload.email,
                phone: payload.phone,
                address: payload.address,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                updated_by: Some(admin_id),
            },
        };
        inner.contact_info = Some(info.clone());
        Some(info)
    }

    async fn create_message(
        &self,
        name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Option<ContactMessage> {
        let mut inner = self.inner.lock().unwrap();
        let msg = ContactMessage {
            id: inner.next_id(),
            name,
            email,
            subject,
            message,
            is_read: false,
            created_at: Utc::now(),
            replied_at: None,
            replied_by: None,
        };
        inner.messages.push(msg.clone());
        Some(msg)
    }

    async fn list_messages(&self, page: i64, per_page: i64) -> (Vec<ContactMessage>, i64) {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.messages.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        paginate(rows, page, per_page)
    }

    async fn mark_message_read(&self, id: i32, admin_id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.is_read = true;
                msg.replied_by = Some(admin_id);
                msg.replied_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    async fn delete_message(&self, id: i32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.messages.len();
        inner.messages.retain(|m| m.id != id);
        inner.messages.len() < before
    }

    async fn dashboard_stats(&self) -> DashboardStats {
        let inner = self.inner.lock().unwrap();
        DashboardStats {
            total_events: inner.events.len() as i64,
            total_news: inner.news.len() as i64,
            total_students: inner.students.len() as i64,
            pending_students: inner.students.iter().filter(|s| !s.is_approved).count() as i64,
        }
    }

    async fn site_stats(&self) -> SiteStats {
        let inner = self.inner.lock().unwrap();
        let universities: BTreeSet<&str> = inner
            .students
            .iter()
            .filter(|s| s.is_approved)
            .map(|s| s.university.as_str())
            .collect();
        SiteStats {
            total_students: inner.students.iter().filter(|s| s.is_approved).count() as i64,
            total_events: inner.events.iter().filter(|e| e.is_published).count() as i64,
            total_news: inner.news.iter().filter(|n| n.is_published).count() as i64,
            universities: universities.len() as i64,
        }
    }

    async fn statistics_report(&self) -> StatisticsReport {
        let inner = self.inner.lock().unwrap();
        let months = last_twelve_months(Utc::now());
        let monthly = months
            .into_iter()
            .map(|month| MonthlyBucket {
                events: inner
                    .events
                    .iter()
                    .filter(|e| month_key(e.created_at) == month)
                    .count() as i64,
                news: inner
                    .news
                    .iter()
                    .filter(|n| month_key(n.created_at) == month)
                    .count() as i64,
                students: inner
                    .students
                    .iter()
                    .filter(|s| month_key(s.created_at) == month)
                    .count() as i64,
                month,
            })
            .collect();

        let mut grade_counts = std::collections::BTreeMap::new();
        for student in &inner.students {
            *grade_counts.entry(student.grade.clone()).or_insert(0i64) += 1;
        }

        StatisticsReport {
            total_events: inner.events.len() as i64,
            published_events: inner.events.iter().filter(|e| e.is_published).count() as i64,
            total_news: inner.news.len() as i64,
            published_news: inner.news.iter().filter(|n| n.is_published).count() as i64,
            total_students: inner.students.len() as i64,
            approved_students: inner.students.iter().filter(|s| s.is_approved).count() as i64,
            pending_students: inner.students.iter().filter(|s| !s.is_approved).count() as i64,
            monthly,
            event_categories: category_counts(inner.events.iter().map(|e| e.category.clone())),
            news_categories: category_counts(inner.news.iter().map(|n| n.category.clone())),
            student_grades: grade_counts
                .into_iter()
                .map(|(grade, count)| GradeCount { grade, count })
                .collect(),
        }
    }
}

// --- App harness ---

pub struct TestApp {
    pub address: String,
    pub repo: MockRepo,
    pub storage: MockObjectStore,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Spins up the full router on an ephemeral port with the in-memory repository
/// and mock object store. `AppConfig::default()` keeps the environment Local,
/// so tests authenticate admin requests with the `x-admin-id` header.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_storage(MockObjectStore::new()).await
}

pub async fn spawn_app_with_storage(storage: MockObjectStore) -> TestApp {
    let repo = MockRepo::new();
    let state = AppState {
        repo: Arc::new(repo.clone()) as RepositoryState,
        storage: Arc::new(storage.clone()) as StorageState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{port}");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        storage,
        client: reqwest::Client::new(),
    }
}
