use crate::{
    AppState,
    auth::{self, Principal, Role},
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    models::{
        Accommodation, Activity, ActivityDetail, Admin, LoginRequest, Meeting,
        NewAccommodationRequest, NewActivityRequest, NewAdminRequest, NewMeetingRequest,
        NewStudentRequest, Person, PinRequest, Student, TokenResponse, UpdateAccommodationRequest,
        UpdateStudentRequest,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

fn token_response(state: &AppState, id: i64, role: Role) -> ApiResult<TokenResponse> {
    Ok(TokenResponse {
        token: state.tokens.issue(id, role)?,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
        id,
        role,
    })
}

fn deleted(found: bool, what: &str) -> ApiResult<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("{what} not found")))
    }
}

// --- Public ---

/// signup
///
/// [Public Route] Student self-registration. Creates the person and student
/// rows together and returns a token for the new account.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = NewStudentRequest,
    responses(
        (status = 201, description = "Registered", body = TokenResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or student number taken")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewStudentRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    payload.validate()?;
    let password_hash = auth::hash_password(&payload.password)?;
    let student = state.repo.create_student(&payload, &password_hash).await?;

    let response = token_response(&state, student.id, Role::Student)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// login
///
/// [Public Route] Exchanges email and password for a token. Unknown email and
/// wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let credentials = state.repo.find_credentials(&payload.email).await?;

    let credentials = match credentials {
        Some(c) if auth::verify_password(&payload.password, &c.password_hash) => c,
        _ => {
            tracing::info!("login rejected");
            return Err(ApiError::unauthorized("invalid email or password"));
        }
    };

    let role: Role = credentials.role.parse()?;
    Ok(Json(token_response(&state, credentials.id, role)?))
}

// --- Self ---

#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Caller's person record", body = Person))
)]
pub async fn get_me(principal: Principal, State(state): State<AppState>) -> ApiResult<Json<Person>> {
    state
        .repo
        .get_person(principal.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("person not found"))
}

// --- Students ---

#[utoipa::path(
    get,
    path = "/students",
    responses((status = 200, description = "All students", body = [Student]))
)]
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(state.repo.list_students().await?))
}

/// create_student
///
/// [Admin Route] Registers a student on their behalf.
#[utoipa::path(
    post,
    path = "/students",
    request_body = NewStudentRequest,
    responses((status = 201, description = "Created", body = Student))
)]
pub async fn create_student(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewStudentRequest>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    payload.validate()?;
    let password_hash = auth::hash_password(&payload.password)?;
    let student = state.repo.create_student(&payload, &password_hash).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/student/{id}",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Found", body = Student),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Student>> {
    state
        .repo
        .get_student(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("student not found"))
}

#[utoipa::path(
    put,
    path = "/student/{id}",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses((status = 200, description = "Updated", body = Student))
)]
pub async fn update_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateStudentRequest>,
) -> ApiResult<Json<Student>> {
    payload.validate()?;
    state
        .repo
        .update_student(id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("student not found"))
}

/// delete_student
///
/// [Admin Route] Removes the student and, through the schema's cascades,
/// their accommodations, pins and personal documentation.
#[utoipa::path(
    delete,
    path = "/student/{id}",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.repo.delete_student(id).await?, "student")
}

// --- Accommodations ---

#[utoipa::path(
    get,
    path = "/student/{id}/accommodations",
    params(("id" = i64, Path, description = "Student ID")),
    responses((status = 200, description = "Accommodations", body = [Accommodation]))
)]
pub async fn list_accommodations(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Accommodation>>> {
    Ok(Json(state.repo.list_accommodations(student_id).await?))
}

#[utoipa::path(
    post,
    path = "/student/{id}/accommodations",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = NewAccommodationRequest,
    responses((status = 201, description = "Requested", body = Accommodation))
)]
pub async fn create_accommodation(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewAccommodationRequest>,
) -> ApiResult<(StatusCode, Json<Accommodation>)> {
    payload.validate()?;
    let accommodation = state.repo.create_accommodation(student_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(accommodation)))
}

/// update_accommodation
///
/// [Admin Route] Approves or revises an accommodation request.
#[utoipa::path(
    put,
    path = "/accommodations/{accommodation_id}",
    params(("accommodation_id" = i64, Path, description = "Accommodation ID")),
    request_body = UpdateAccommodationRequest,
    responses((status = 200, description = "Updated", body = Accommodation))
)]
pub async fn update_accommodation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateAccommodationRequest>,
) -> ApiResult<Json<Accommodation>> {
    state
        .repo
        .update_accommodation(id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("accommodation not found"))
}

#[utoipa::path(
    delete,
    path = "/accommodations/{accommodation_id}",
    params(("accommodation_id" = i64, Path, description = "Accommodation ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_accommodation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.repo.delete_accommodation(id).await?, "accommodation")
}

// --- Meetings ---

#[utoipa::path(
    get,
    path = "/student/{id}/meetings",
    params(("id" = i64, Path, description = "Student ID")),
    responses((status = 200, description = "Meetings, earliest first", body = [Meeting]))
)]
pub async fn list_meetings(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Meeting>>> {
    Ok(Json(state.repo.list_meetings(student_id).await?))
}

/// create_meeting
///
/// Books a point-of-contact meeting. An unknown student or admin surfaces as
/// 404 via the foreign keys.
#[utoipa::path(
    post,
    path = "/student/{id}/meetings",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = NewMeetingRequest,
    responses(
        (status = 201, description = "Booked", body = Meeting),
        (status = 400, description = "Not in the future"),
        (status = 404, description = "Unknown admin")
    )
)]
pub async fn create_meeting(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewMeetingRequest>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    payload.validate(chrono::Utc::now())?;
    let meeting = state.repo.create_meeting(student_id, &payload).await?;
    tracing::info!(meeting_id = meeting.id, student_id, admin_id = meeting.admin_id, "meeting booked");
    Ok((StatusCode::CREATED, Json(meeting)))
}

#[utoipa::path(
    delete,
    path = "/meetings/{meeting_id}",
    params(("meeting_id" = i64, Path, description = "Meeting ID")),
    responses((status = 204, description = "Cancelled"))
)]
pub async fn delete_meeting(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.repo.delete_meeting(id).await?, "meeting")
}

// --- Pins ---

#[utoipa::path(
    get,
    path = "/student/{id}/pins",
    params(("id" = i64, Path, description = "Student ID")),
    responses((status = 200, description = "Pinned activities", body = [Activity]))
)]
pub async fn list_pins(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Activity>>> {
    Ok(Json(state.repo.list_pins(student_id).await?))
}

/// pin_activity
///
/// Pins an activity for the student. A second pin of the same activity is a
/// 409; pinning a missing activity surfaces as 404 via the foreign key.
#[utoipa::path(
    post,
    path = "/student/{id}/pins",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = PinRequest,
    responses(
        (status = 201, description = "Pinned"),
        (status = 409, description = "Already pinned")
    )
)]
pub async fn pin_activity(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<PinRequest>,
) -> ApiResult<StatusCode> {
    if state.repo.pin_activity(student_id, payload.activity_id).await? {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::Conflict("activity already pinned".to_string()))
    }
}

#[utoipa::path(
    delete,
    path = "/student/{id}/pins/{activity_id}",
    params(
        ("id" = i64, Path, description = "Student ID"),
        ("activity_id" = i64, Path, description = "Activity ID")
    ),
    responses((status = 204, description = "Unpinned"))
)]
pub async fn unpin_activity(
    State(state): State<AppState>,
    ApiPath((student_id, activity_id)): ApiPath<(i64, i64)>,
) -> ApiResult<StatusCode> {
    deleted(state.repo.unpin_activity(student_id, activity_id).await?, "pin")
}

// --- Admins ---

#[utoipa::path(
    get,
    path = "/admins",
    responses((status = 200, description = "All admins", body = [Admin]))
)]
pub async fn list_admins(State(state): State<AppState>) -> ApiResult<Json<Vec<Admin>>> {
    Ok(Json(state.repo.list_admins().await?))
}

#[utoipa::path(
    post,
    path = "/admins",
    request_body = NewAdminRequest,
    responses((status = 201, description = "Created", body = Admin))
)]
pub async fn create_admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAdminRequest>,
) -> ApiResult<(StatusCode, Json<Admin>)> {
    payload.validate()?;
    let password_hash = auth::hash_password(&payload.password)?;
    let admin = state.repo.create_admin(&payload, &password_hash).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

#[utoipa::path(
    get,
    path = "/admin/{id}",
    params(("id" = i64, Path, description = "Admin ID")),
    responses((status = 200, description = "Found", body = Admin))
)]
pub async fn get_admin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Admin>> {
    state
        .repo
        .get_admin(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("admin not found"))
}

#[utoipa::path(
    delete,
    path = "/admin/{id}",
    params(("id" = i64, Path, description = "Admin ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_admin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.repo.delete_admin(id).await?, "admin")
}

// --- Activities ---

#[utoipa::path(
    get,
    path = "/activities",
    responses((status = 200, description = "All activities", body = [Activity]))
)]
pub async fn list_activities(State(state): State<AppState>) -> ApiResult<Json<Vec<Activity>>> {
    Ok(Json(state.repo.list_activities().await?))
}

/// create_activity
///
/// [Admin Route] Creates the activity, its first document and, when a student
/// is named, the personal-documentation link, all in one transaction.
#[utoipa::path(
    post,
    path = "/activities",
    request_body = NewActivityRequest,
    responses((status = 201, description = "Created", body = Activity))
)]
pub async fn create_activity(
    principal: Principal,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewActivityRequest>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    payload.validate()?;
    let activity = state.repo.create_activity(&payload, principal.id).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// get_activity
///
/// Students only see shared documentation and their own personal documents.
#[utoipa::path(
    get,
    path = "/activities/{activity_id}",
    params(("activity_id" = i64, Path, description = "Activity ID")),
    responses((status = 200, description = "Found", body = ActivityDetail))
)]
pub async fn get_activity(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ActivityDetail>> {
    let activity = state
        .repo
        .get_activity(id)
        .await?
        .ok_or_else(|| ApiError::not_found("activity not found"))?;

    let viewer = match principal.role {
        Role::Admin => None,
        Role::Student => Some(principal.id),
    };
    let documentation = state.repo.list_documentation(id, viewer).await?;

    Ok(Json(ActivityDetail {
        activity,
        documentation,
    }))
}

#[utoipa::path(
    delete,
    path = "/activities/{activity_id}",
    params(("activity_id" = i64, Path, description = "Activity ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.repo.delete_activity(id).await?, "activity")
}
