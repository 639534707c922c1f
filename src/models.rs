use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    auth::Role,
    error::{ApiError, ApiResult},
};

// --- Core Application Schemas (Mapped to Database) ---

/// Person
///
/// Base identity row shared by students and admins (`person` table). The
/// password hash lives in the same table but is never loaded into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Person {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Credentials
///
/// Internal login lookup: the stored hash and the role derived from which
/// table the person belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: i64,
    pub password_hash: String,
    pub role: String,
}

/// Student
///
/// A `person` joined with its `student` row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Student {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_number: String,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Admin
///
/// A `person` joined with its `admin` row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Accommodation
///
/// An accommodation a student requested for a disability. Starts unapproved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Accommodation {
    pub id: i64,
    pub student_id: i64,
    pub disability: String,
    pub description: String,
    pub approved: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Meeting
///
/// A point-of-contact meeting between a student and an admin.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Meeting {
    pub id: i64,
    pub student_id: i64,
    pub admin_id: i64,
    #[ts(type = "string")]
    pub scheduled_at: DateTime<Utc>,
    pub notes: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub description: String,
    // Admin who created it; NULL once that admin is deleted.
    pub created_by: Option<i64>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Documentation
///
/// A document attached to an activity. When `student_id` is set it is
/// personal documentation, visible only to that student and to admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Documentation {
    pub id: i64,
    pub activity_id: i64,
    pub title: String,
    pub body: String,
    pub student_id: Option<i64>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ActivityDetail {
    pub activity: Activity,
    pub documentation: Vec<Documentation>,
}

// --- Request Payloads (Input Schemas) ---

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_identity(email: &str, password: &str, first_name: &str, last_name: &str) -> ApiResult<()> {
    if !email.contains('@') {
        return Err(ApiError::bad_request("email must be a valid address"));
    }
    if password.chars().count() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }
    require_non_empty("first_name", first_name)?;
    require_non_empty("last_name", last_name)
}

/// NewStudentRequest
///
/// Payload for `POST /signup` and `POST /students`. The password is hashed
/// before it reaches the repository and is never echoed back.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewStudentRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub student_number: String,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
}

impl NewStudentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        validate_identity(&self.email, &self.password, &self.first_name, &self.last_name)?;
        require_non_empty("student_number", &self.student_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewAdminRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
}

impl NewAdminRequest {
    pub fn validate(&self) -> ApiResult<()> {
        validate_identity(&self.email, &self.password, &self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateStudentRequest
///
/// Partial update for `PUT /student/{id}`; absent fields keep their value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStudentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
}

impl UpdateStudentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(first_name) = &self.first_name {
            require_non_empty("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            require_non_empty("last_name", last_name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewAccommodationRequest {
    pub disability: String,
    pub description: String,
}

impl NewAccommodationRequest {
    pub fn validate(&self) -> ApiResult<()> {
        require_non_empty("disability", &self.disability)?;
        require_non_empty("description", &self.description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateAccommodationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

/// NewMeetingRequest
///
/// Books a meeting for the student in the path with the admin `admin_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewMeetingRequest {
    pub admin_id: i64,
    #[ts(type = "string")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewMeetingRequest {
    /// Meetings can only be booked ahead of `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> ApiResult<()> {
        if self.scheduled_at <= now {
            return Err(ApiError::bad_request("scheduled_at must be in the future"));
        }
        Ok(())
    }
}

/// NewActivityRequest
///
/// Creates an activity together with its first document. Supplying
/// `student_id` makes that document personal documentation for the student.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewActivityRequest {
    pub name: String,
    pub description: String,
    pub documentation_title: String,
    pub documentation_body: String,
    pub student_id: Option<i64>,
}

impl NewActivityRequest {
    pub fn validate(&self) -> ApiResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("documentation_title", &self.documentation_title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PinRequest {
    pub activity_id: i64,
}

// --- Output Schemas ---

/// TokenResponse
///
/// Returned by signup and login. `expires_in` is the token lifetime in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub id: i64,
    pub role: Role,
}
