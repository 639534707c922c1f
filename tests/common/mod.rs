#![allow(dead_code)]

use accommodation_portal::{
    AppConfig, AppState, Role, create_router,
    models::{
        Accommodation, Activity, Admin, Credentials, Documentation, Meeting,
        NewAccommodationRequest, NewActivityRequest, NewAdminRequest, NewMeetingRequest,
        NewStudentRequest, Person, Student, UpdateAccommodationRequest, UpdateStudentRequest,
    },
    repository::{RepoResult, Repository},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use sqlx::error::{DatabaseError, ErrorKind};
use std::{
    borrow::Cow,
    fmt,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

// --- Fake database error ---

/// Stands in for a Postgres constraint violation so handlers can be tested
/// against the same `sqlx::Error` shape the real driver produces.
#[derive(Debug)]
pub struct FakeDbError(pub ErrorKind);

impl fmt::Display for FakeDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fake database error: {:?}", self.0)
    }
}

impl std::error::Error for FakeDbError {}

impl DatabaseError for FakeDbError {
    fn message(&self) -> &str {
        "fake database error"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        None
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
            ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
            _ => ErrorKind::Other,
        }
    }
}

pub fn unique_violation() -> sqlx::Error {
    sqlx::Error::Database(Box::new(FakeDbError(ErrorKind::UniqueViolation)))
}

pub fn foreign_key_violation() -> sqlx::Error {
    sqlx::Error::Database(Box::new(FakeDbError(ErrorKind::ForeignKeyViolation)))
}

// --- Mock repository ---

/// What a failing mock should return from every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    UniqueViolation,
    ForeignKeyViolation,
    Unavailable,
}

/// MockRepo
///
/// Canned data plus a call log. Tests assert on the log to prove a rejected
/// request never reached the persistence layer.
#[derive(Default)]
pub struct MockRepo {
    pub students: Vec<Student>,
    pub admins: Vec<Admin>,
    pub credentials: Option<Credentials>,
    pub activities: Vec<Activity>,
    pub documentation: Vec<Documentation>,
    pub accommodations: Vec<Accommodation>,
    pub meetings: Vec<Meeting>,
    // Pinning reports "already pinned" when true.
    pub already_pinned: bool,
    pub failure: Option<Failure>,
    pub calls: Mutex<Vec<String>>,
}

impl MockRepo {
    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            students,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) -> RepoResult<()> {
        self.calls.lock().unwrap().push(call.into());
        match self.failure {
            None => Ok(()),
            Some(Failure::UniqueViolation) => Err(unique_violation()),
            Some(Failure::ForeignKeyViolation) => Err(foreign_key_violation()),
            Some(Failure::Unavailable) => Err(sqlx::Error::PoolTimedOut),
        }
    }
}

pub fn student(id: i64) -> Student {
    Student {
        id,
        email: format!("student{id}@example.edu"),
        first_name: "Sam".to_string(),
        last_name: format!("Student{id}"),
        student_number: format!("S{id:05}"),
        ..Student::default()
    }
}

pub fn admin(id: i64) -> Admin {
    Admin {
        id,
        email: format!("admin{id}@example.edu"),
        first_name: "Ada".to_string(),
        last_name: format!("Admin{id}"),
        title: Some("Coordinator".to_string()),
        ..Admin::default()
    }
}

pub fn activity(id: i64) -> Activity {
    Activity {
        id,
        name: format!("Activity {id}"),
        description: "Orientation".to_string(),
        created_by: Some(7),
        ..Activity::default()
    }
}

pub fn meeting(id: i64, student_id: i64) -> Meeting {
    Meeting {
        id,
        student_id,
        admin_id: 7,
        scheduled_at: chrono::Utc::now() + chrono::Duration::days(3),
        notes: "Exam arrangements".to_string(),
        ..Meeting::default()
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn find_credentials(&self, email: &str) -> RepoResult<Option<Credentials>> {
        self.record(format!("find_credentials:{email}"))?;
        Ok(self.credentials.clone())
    }

    async fn get_person(&self, id: i64) -> RepoResult<Option<Person>> {
        self.record(format!("get_person:{id}"))?;
        let person = self.students.iter().find(|s| s.id == id).map(|s| Person {
            id: s.id,
            email: s.email.clone(),
            first_name: s.first_name.clone(),
            last_name: s.last_name.clone(),
            created_at: s.created_at,
        });
        Ok(person)
    }

    async fn create_student(&self, req: &NewStudentRequest, password_hash: &str) -> RepoResult<Student> {
        self.record("create_student")?;
        assert_ne!(req.password, password_hash, "raw password reached the repository");
        let mut created = self.students.first().cloned().unwrap_or_else(|| student(1));
        created.email = req.email.clone();
        created.student_number = req.student_number.clone();
        Ok(created)
    }

    async fn list_students(&self) -> RepoResult<Vec<Student>> {
        self.record("list_students")?;
        Ok(self.students.clone())
    }

    async fn get_student(&self, id: i64) -> RepoResult<Option<Student>> {
        self.record(format!("get_student:{id}"))?;
        Ok(self.students.iter().find(|s| s.id == id).cloned())
    }

    async fn update_student(&self, id: i64, req: &UpdateStudentRequest) -> RepoResult<Option<Student>> {
        self.record(format!("update_student:{id}"))?;
        Ok(self.students.iter().find(|s| s.id == id).cloned().map(|mut s| {
            if let Some(major) = &req.major {
                s.major = Some(major.clone());
            }
            s
        }))
    }

    async fn delete_student(&self, id: i64) -> RepoResult<bool> {
        self.record(format!("delete_student:{id}"))?;
        Ok(self.students.iter().any(|s| s.id == id))
    }

    async fn create_admin(&self, req: &NewAdminRequest, _password_hash: &str) -> RepoResult<Admin> {
        self.record("create_admin")?;
        let mut created = admin(100);
        created.email = req.email.clone();
        Ok(created)
    }

    async fn list_admins(&self) -> RepoResult<Vec<Admin>> {
        self.record("list_admins")?;
        Ok(self.admins.clone())
    }

    async fn get_admin(&self, id: i64) -> RepoResult<Option<Admin>> {
        self.record(format!("get_admin:{id}"))?;
        Ok(self.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn delete_admin(&self, id: i64) -> RepoResult<bool> {
        self.record(format!("delete_admin:{id}"))?;
        Ok(self.admins.iter().any(|a| a.id == id))
    }

    async fn list_accommodations(&self, student_id: i64) -> RepoResult<Vec<Accommodation>> {
        self.record(format!("list_accommodations:{student_id}"))?;
        Ok(self
            .accommodations
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn create_accommodation(&self, student_id: i64, req: &NewAccommodationRequest) -> RepoResult<Accommodation> {
        self.record(format!("create_accommodation:{student_id}"))?;
        Ok(Accommodation {
            id: 1,
            student_id,
            disability: req.disability.clone(),
            description: req.description.clone(),
            approved: false,
            ..Accommodation::default()
        })
    }

    async fn update_accommodation(&self, id: i64, req: &UpdateAccommodationRequest) -> RepoResult<Option<Accommodation>> {
        self.record(format!("update_accommodation:{id}"))?;
        Ok(self.accommodations.iter().find(|a| a.id == id).cloned().map(|mut a| {
            if let Some(approved) = req.approved {
                a.approved = approved;
            }
            a
        }))
    }

    async fn delete_accommodation(&self, id: i64) -> RepoResult<bool> {
        self.record(format!("delete_accommodation:{id}"))?;
        Ok(self.accommodations.iter().any(|a| a.id == id))
    }

    async fn list_meetings(&self, student_id: i64) -> RepoResult<Vec<Meeting>> {
        self.record(format!("list_meetings:{student_id}"))?;
        Ok(self
            .meetings
            .iter()
            .filter(|m| m.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn create_meeting(&self, student_id: i64, req: &NewMeetingRequest) -> RepoResult<Meeting> {
        self.record(format!("create_meeting:{student_id}:{}", req.admin_id))?;
        Ok(Meeting {
            id: 1,
            student_id,
            admin_id: req.admin_id,
            scheduled_at: req.scheduled_at,
            notes: req.notes.clone().unwrap_or_default(),
            ..Meeting::default()
        })
    }

    async fn delete_meeting(&self, id: i64) -> RepoResult<bool> {
        self.record(format!("delete_meeting:{id}"))?;
        Ok(self.meetings.iter().any(|m| m.id == id))
    }

    async fn list_activities(&self) -> RepoResult<Vec<Activity>> {
        self.record("list_activities")?;
        Ok(self.activities.clone())
    }

    async fn get_activity(&self, id: i64) -> RepoResult<Option<Activity>> {
        self.record(format!("get_activity:{id}"))?;
        Ok(self.activities.iter().find(|a| a.id == id).cloned())
    }

    async fn list_documentation(&self, activity_id: i64, viewer: Option<i64>) -> RepoResult<Vec<Documentation>> {
        self.record(format!("list_documentation:{activity_id}:{viewer:?}"))?;
        Ok(self
            .documentation
            .iter()
            .filter(|d| d.activity_id == activity_id)
            .filter(|d| viewer.is_none() || d.student_id.is_none() || d.student_id == viewer)
            .cloned()
            .collect())
    }

    async fn create_activity(&self, req: &NewActivityRequest, created_by: i64) -> RepoResult<Activity> {
        self.record(format!("create_activity:{created_by}"))?;
        Ok(Activity {
            id: 1,
            name: req.name.clone(),
            description: req.description.clone(),
            created_by: Some(created_by),
            ..Activity::default()
        })
    }

    async fn delete_activity(&self, id: i64) -> RepoResult<bool> {
        self.record(format!("delete_activity:{id}"))?;
        Ok(self.activities.iter().any(|a| a.id == id))
    }

    async fn list_pins(&self, student_id: i64) -> RepoResult<Vec<Activity>> {
        self.record(format!("list_pins:{student_id}"))?;
        Ok(self.activities.clone())
    }

    async fn pin_activity(&self, student_id: i64, activity_id: i64) -> RepoResult<bool> {
        self.record(format!("pin_activity:{student_id}:{activity_id}"))?;
        Ok(!self.already_pinned)
    }

    async fn unpin_activity(&self, student_id: i64, activity_id: i64) -> RepoResult<bool> {
        self.record(format!("unpin_activity:{student_id}:{activity_id}"))?;
        Ok(self.activities.iter().any(|a| a.id == activity_id))
    }
}

// --- State & router helpers ---

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn test_state(repo: Arc<MockRepo>) -> AppState {
    AppState::new(repo, test_config())
}

pub fn test_router(repo: Arc<MockRepo>) -> Router {
    create_router(test_state(repo))
}

pub fn token_for(id: i64, role: Role) -> String {
    test_state(Arc::new(MockRepo::default()))
        .tokens
        .issue(id, role)
        .unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn error_message(&self) -> String {
        self.json()["error"]
            .as_str()
            .expect("response has no error field")
            .to_string()
    }
}

/// Sends one request through the router in-process.
pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Builds a request carrying `token` as a bearer credential, when given.
pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
