use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use http::header;
use uuid::Uuid;

use crate::{
    AppState, auth, catalog,
    error::ApiError,
    models::{
        Booking, Course, CourseView, Dashboard, Enrolment, LoginRequest, RegisterRequest, Session,
        TokenResponse,
    },
    schedule::ClassOccurrence,
};

#[derive(Debug, Default, serde::Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

pub(crate) type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

pub(crate) async fn require_session(
    state: &AppState,
    bearer: BearerHeader,
    query: &TokenQuery,
) -> Result<Session, ApiError> {
    let auth_header = bearer.map(|TypedHeader(a)| a);
    auth::verify_token(state.store.as_ref(), auth_header, query.token.as_deref()).await
}

async fn with_enrolment_flags(
    state: &AppState,
    session: Option<&Session>,
) -> Result<Vec<CourseView>, ApiError> {
    let courses = catalog::all_courses_with_classes(state.store.as_ref()).await?;
    let enrolments = match session {
        Some(session) => Some(state.store.enrolments_by_user(&session.username).await?),
        None => None,
    };
    Ok(courses
        .into_iter()
        .map(|course| CourseView {
            enrolled: enrolments
                .as_ref()
                .map(|list| list.iter().any(|e| e.course_id == course.id)),
            course,
        })
        .collect())
}

async fn find_course(state: &AppState, id: Uuid) -> Result<Course, ApiError> {
    catalog::course_with_classes(state.store.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))
}

#[utoipa::path(get, path = "/", tag = "courses")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Dance School Booking API",
        "endpoints": {
            "/courses": "List courses",
            "/courses/{id}": "Course with its generated classes",
            "/courses/{id}/classes.ical": "Download a course's classes as iCal",
            "/login": "Start a session",
            "/register": "Create an account",
            "/organiser/courses": "Manage courses (admin)"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "health")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "health")]
pub async fn healthz_ready(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.store.list_courses().await?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Page not found")
}

#[utoipa::path(
    get,
    path = "/courses",
    params(
        ("token" = Option<String>, Query, description = "Session token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "All courses; `enrolled` is set for signed-in users", body = [CourseView])
    ),
    tag = "courses"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = bearer.map(|TypedHeader(a)| a);
    let session =
        auth::optional_session(state.store.as_ref(), auth_header, query.token.as_deref()).await?;
    let courses = with_enrolment_flags(&state, session.as_ref()).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with its classes", body = Course),
        (status = 404, description = "Course not found")
    ),
    tag = "courses"
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_course(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/courses/{id}/classes",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Classes in date order", body = [ClassOccurrence]),
        (status = 404, description = "Course not found")
    ),
    tag = "courses"
)]
pub async fn get_classes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_course(&state, id).await?.classes))
}

#[utoipa::path(
    get,
    path = "/courses/{id}/classes.ical",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 404, description = "Course not found or no classes scheduled")
    ),
    tag = "courses"
)]
pub async fn get_classes_ical(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let course = find_course(&state, id).await?;
    if course.classes.is_empty() {
        return Err(ApiError::NotFound("No classes scheduled".into()));
    }

    let body = state.exporter.generate(&course);
    let file_stem: String = course
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let disposition = format!("attachment; filename={file_stem}.ics");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/calendar".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = TokenResponse),
        (status = 400, description = "Missing fields or passwords do not match"),
        (status = 409, description = "Username or email already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = auth::register(&state, request).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Unknown user or incorrect password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(auth::login(&state, request).await?))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&state, bearer, &query).await?;
    auth::logout(&state, &session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Courses with enrolment flags and own bookings", body = Dashboard),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "courses"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&state, bearer, &query).await?;
    let courses = with_enrolment_flags(&state, Some(&session)).await?;
    let bookings = state.store.bookings_by_user(&session.username).await?;
    Ok(Json(Dashboard {
        is_admin: auth::is_admin(&state.settings, &session),
        username: session.username,
        courses,
        bookings,
    }))
}

#[utoipa::path(
    post,
    path = "/courses/{id}/enrol",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 201, description = "Enrolled", body = Enrolment),
        (status = 200, description = "Already enrolled", body = Enrolment),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "courses"
)]
pub async fn enrol(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&state, bearer, &query).await?;
    let (enrolment, created) =
        catalog::enrol(state.store.as_ref(), id, &session.username).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(enrolment)))
}

#[utoipa::path(
    post,
    path = "/courses/{id}/classes/{class_id}/book",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("class_id" = Uuid, Path, description = "Class id")
    ),
    responses(
        (status = 201, description = "Class booked", body = Booking),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Course or class not found"),
        (status = 409, description = "Class already booked")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "courses"
)]
pub async fn book_class(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path((id, class_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&state, bearer, &query).await?;
    let booking =
        catalog::book_class(state.store.as_ref(), id, class_id, &session.username).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
