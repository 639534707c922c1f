use crate::models::{
    Accommodation, Activity, Admin, Credentials, Documentation, Meeting, NewAccommodationRequest,
    NewActivityRequest, NewAdminRequest, NewMeetingRequest, NewStudentRequest, Person, Student,
    UpdateAccommodationRequest, UpdateStudentRequest,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The persistence contract the handlers depend on. Authorization is decided
/// before any of these methods run; the repository only enforces what the
/// schema itself encodes (foreign keys, uniqueness, cascades).
///
/// Methods that create a person take the password hash separately so a raw
/// password never crosses this boundary.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- People & Login ---
    async fn find_credentials(&self, email: &str) -> RepoResult<Option<Credentials>>;
    async fn get_person(&self, id: i64) -> RepoResult<Option<Person>>;

    // --- Students ---
    // Inserts `person` then `student` in one transaction.
    async fn create_student(&self, req: &NewStudentRequest, password_hash: &str) -> RepoResult<Student>;
    async fn list_students(&self) -> RepoResult<Vec<Student>>;
    async fn get_student(&self, id: i64) -> RepoResult<Option<Student>>;
    async fn update_student(&self, id: i64, req: &UpdateStudentRequest) -> RepoResult<Option<Student>>;
    // Deletes the person row; the schema cascades to everything the student owns.
    async fn delete_student(&self, id: i64) -> RepoResult<bool>;

    // --- Admins ---
    // Inserts `person` then `admin` in one transaction.
    async fn create_admin(&self, req: &NewAdminRequest, password_hash: &str) -> RepoResult<Admin>;
    async fn list_admins(&self) -> RepoResult<Vec<Admin>>;
    async fn get_admin(&self, id: i64) -> RepoResult<Option<Admin>>;
    async fn delete_admin(&self, id: i64) -> RepoResult<bool>;

    // --- Accommodations ---
    async fn list_accommodations(&self, student_id: i64) -> RepoResult<Vec<Accommodation>>;
    async fn create_accommodation(&self, student_id: i64, req: &NewAccommodationRequest) -> RepoResult<Accommodation>;
    async fn update_accommodation(&self, id: i64, req: &UpdateAccommodationRequest) -> RepoResult<Option<Accommodation>>;
    async fn delete_accommodation(&self, id: i64) -> RepoResult<bool>;

    // --- Meetings ---
    async fn list_meetings(&self, student_id: i64) -> RepoResult<Vec<Meeting>>;
    async fn create_meeting(&self, student_id: i64, req: &NewMeetingRequest) -> RepoResult<Meeting>;
    async fn delete_meeting(&self, id: i64) -> RepoResult<bool>;

    // --- Activities ---
    async fn list_activities(&self) -> RepoResult<Vec<Activity>>;
    async fn get_activity(&self, id: i64) -> RepoResult<Option<Activity>>;
    // `viewer = Some(student)` limits personal documentation to that student's own.
    async fn list_documentation(&self, activity_id: i64, viewer: Option<i64>) -> RepoResult<Vec<Documentation>>;
    // Inserts `activity`, `documentation` and optionally `personal_documentation` in one transaction.
    async fn create_activity(&self, req: &NewActivityRequest, created_by: i64) -> RepoResult<Activity>;
    async fn delete_activity(&self, id: i64) -> RepoResult<bool>;

    // --- Pins ---
    async fn list_pins(&self, student_id: i64) -> RepoResult<Vec<Activity>>;
    // Returns false when the activity was already pinned.
    async fn pin_activity(&self, student_id: i64, activity_id: i64) -> RepoResult<bool>;
    async fn unpin_activity(&self, student_id: i64, activity_id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const STUDENT_COLUMNS: &str = r#"
    p.id, p.email, p.first_name, p.last_name,
    s.student_number, s.major, s.graduation_year, p.created_at
"#;

const ADMIN_COLUMNS: &str = "p.id, p.email, p.first_name, p.last_name, a.title, p.created_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// find_credentials
    ///
    /// A person that is both admin and student logs in as admin.
    async fn find_credentials(&self, email: &str) -> RepoResult<Option<Credentials>> {
        sqlx::query_as::<_, Credentials>(
            r#"
            SELECT p.id, p.password_hash,
                   CASE WHEN a.person_id IS NOT NULL THEN 'admin' ELSE 'student' END AS role
            FROM person p
            LEFT JOIN admin a ON a.person_id = p.id
            WHERE p.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_person(&self, id: i64) -> RepoResult<Option<Person>> {
        sqlx::query_as::<_, Person>(
            "SELECT id, email, first_name, last_name, created_at FROM person WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_student(&self, req: &NewStudentRequest, password_hash: &str) -> RepoResult<Student> {
        let mut tx = self.pool.begin().await?;

        let person_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO person (email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&req.email)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO student (person_id, student_number, major, graduation_year) VALUES ($1, $2, $3, $4)",
        )
        .bind(person_id)
        .bind(&req.student_number)
        .bind(&req.major)
        .bind(req.graduation_year)
        .execute(&mut *tx)
        .await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM person p JOIN student s ON s.person_id = p.id WHERE p.id = $1"
        ))
        .bind(person_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(student = person_id, "student created");
        Ok(student)
    }

    async fn list_students(&self) -> RepoResult<Vec<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM person p JOIN student s ON s.person_id = p.id ORDER BY p.last_name, p.first_name"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_student(&self, id: i64) -> RepoResult<Option<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM person p JOIN student s ON s.person_id = p.id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// update_student
    ///
    /// Uses `COALESCE` so only the fields present in `req` change. Both tables
    /// are updated in one transaction.
    async fn update_student(&self, id: i64, req: &UpdateStudentRequest) -> RepoResult<Option<Student>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE student
            SET major = COALESCE($2, major),
                graduation_year = COALESCE($3, graduation_year)
            WHERE person_id = $1
            "#,
        )
        .bind(id)
        .bind(&req.major)
        .bind(req.graduation_year)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE person
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .execute(&mut *tx)
        .await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM person p JOIN student s ON s.person_id = p.id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(student)
    }

    /// delete_student
    ///
    /// Personal documents are removed first; the cascade from `person` would
    /// only drop their ownership link and leave them visible as shared ones.
    async fn delete_student(&self, id: i64) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM documentation
            WHERE id IN (SELECT documentation_id FROM personal_documentation WHERE student_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "DELETE FROM person WHERE id = $1 AND EXISTS (SELECT 1 FROM student WHERE person_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_admin(&self, req: &NewAdminRequest, password_hash: &str) -> RepoResult<Admin> {
        let mut tx = self.pool.begin().await?;

        let person_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO person (email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&req.email)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO admin (person_id, title) VALUES ($1, $2)")
            .bind(person_id)
            .bind(&req.title)
            .execute(&mut *tx)
            .await?;

        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM person p JOIN admin a ON a.person_id = p.id WHERE p.id = $1"
        ))
        .bind(person_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(admin = person_id, "admin created");
        Ok(admin)
    }

    async fn list_admins(&self) -> RepoResult<Vec<Admin>> {
        sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM person p JOIN admin a ON a.person_id = p.id ORDER BY p.last_name, p.first_name"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_admin(&self, id: i64) -> RepoResult<Option<Admin>> {
        sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM person p JOIN admin a ON a.person_id = p.id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_admin(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "DELETE FROM person WHERE id = $1 AND EXISTS (SELECT 1 FROM admin WHERE person_id = $1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_accommodations(&self, student_id: i64) -> RepoResult<Vec<Accommodation>> {
        sqlx::query_as::<_, Accommodation>(
            r#"
            SELECT id, student_id, disability, description, approved, created_at
            FROM accommodation
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_accommodation(&self, student_id: i64, req: &NewAccommodationRequest) -> RepoResult<Accommodation> {
        sqlx::query_as::<_, Accommodation>(
            r#"
            INSERT INTO accommodation (student_id, disability, description)
            VALUES ($1, $2, $3)
            RETURNING id, student_id, disability, description, approved, created_at
            "#,
        )
        .bind(student_id)
        .bind(&req.disability)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_accommodation(&self, id: i64, req: &UpdateAccommodationRequest) -> RepoResult<Option<Accommodation>> {
        sqlx::query_as::<_, Accommodation>(
            r#"
            UPDATE accommodation
            SET description = COALESCE($2, description),
                approved = COALESCE($3, approved)
            WHERE id = $1
            RETURNING id, student_id, disability, description, approved, created_at
            "#,
        )
        .bind(id)
        .bind(&req.description)
        .bind(req.approved)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_accommodation(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM accommodation WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_meetings(&self, student_id: i64) -> RepoResult<Vec<Meeting>> {
        sqlx::query_as::<_, Meeting>(
            r#"
            SELECT id, student_id, admin_id, scheduled_at, notes, created_at
            FROM meeting
            WHERE student_id = $1
            ORDER BY scheduled_at
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_meeting(&self, student_id: i64, req: &NewMeetingRequest) -> RepoResult<Meeting> {
        sqlx::query_as::<_, Meeting>(
            r#"
            INSERT INTO meeting (student_id, admin_id, scheduled_at, notes)
            VALUES ($1, $2, $3, COALESCE($4, ''))
            RETURNING id, student_id, admin_id, scheduled_at, notes, created_at
            "#,
        )
        .bind(student_id)
        .bind(req.admin_id)
        .bind(req.scheduled_at)
        .bind(&req.notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_meeting(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM meeting WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_activities(&self) -> RepoResult<Vec<Activity>> {
        sqlx::query_as::<_, Activity>(
            "SELECT id, name, description, created_by, created_at FROM activity ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_activity(&self, id: i64) -> RepoResult<Option<Activity>> {
        sqlx::query_as::<_, Activity>(
            "SELECT id, name, description, created_by, created_at FROM activity WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_documentation(&self, activity_id: i64, viewer: Option<i64>) -> RepoResult<Vec<Documentation>> {
        // A NULL viewer sees everything; otherwise shared docs plus the viewer's own.
        sqlx::query_as::<_, Documentation>(
            r#"
            SELECT d.id, d.activity_id, d.title, d.body, pd.student_id, d.created_at
            FROM documentation d
            LEFT JOIN personal_documentation pd ON pd.documentation_id = d.id
            WHERE d.activity_id = $1
              AND ($2::BIGINT IS NULL OR pd.student_id IS NULL OR pd.student_id = $2)
            ORDER BY d.created_at
            "#,
        )
        .bind(activity_id)
        .bind(viewer)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_activity(&self, req: &NewActivityRequest, created_by: i64) -> RepoResult<Activity> {
        let mut tx = self.pool.begin().await?;

        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activity (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_by, created_at
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let documentation_id: i64 = sqlx::query_scalar(
            "INSERT INTO documentation (activity_id, title, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(activity.id)
        .bind(&req.documentation_title)
        .bind(&req.documentation_body)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(student_id) = req.student_id {
            sqlx::query(
                "INSERT INTO personal_documentation (documentation_id, student_id) VALUES ($1, $2)",
            )
            .bind(documentation_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(activity = activity.id, documentation = documentation_id, "activity created");
        Ok(activity)
    }

    async fn delete_activity(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM activity WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_pins(&self, student_id: i64) -> RepoResult<Vec<Activity>> {
        sqlx::query_as::<_, Activity>(
            r#"
            SELECT a.id, a.name, a.description, a.created_by, a.created_at
            FROM pin
            JOIN activity a ON a.id = pin.activity_id
            WHERE pin.student_id = $1
            ORDER BY pin.created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    /// pin_activity
    ///
    /// `ON CONFLICT DO NOTHING` keeps pinning idempotent at the database level;
    /// zero affected rows means the pin already existed.
    async fn pin_activity(&self, student_id: i64, activity_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "INSERT INTO pin (student_id, activity_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(student_id)
        .bind(activity_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unpin_activity(&self, student_id: i64, activity_id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM pin WHERE student_id = $1 AND activity_id = $2")
            .bind(student_id)
            .bind(activity_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
