//! Admin-only endpoints under `/organiser`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use futures::future::try_join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState, auth, catalog,
    error::ApiError,
    handlers::{BearerHeader, TokenQuery, require_session},
    models::{
        Booking, ClassUpdate, Course, CourseEditView, CourseInput, EnrolmentDetails, NewOrganiser,
        Organiser, Session, UserProfile,
    },
    schedule::ClassOccurrence,
    validation::{validate_course, validate_organiser},
};

async fn require_admin(
    state: &AppState,
    bearer: BearerHeader,
    query: &TokenQuery,
) -> Result<Session, ApiError> {
    let session = require_session(state, bearer, query).await?;
    auth::require_admin(&state.settings, &session)?;
    Ok(session)
}

#[utoipa::path(
    post,
    path = "/organiser/courses",
    request_body = CourseInput,
    responses(
        (status = 201, description = "Course created with its classes", body = Course),
        (status = 400, description = "All fields are required."),
        (status = 401, description = "Invalid authentication token"),
        (status = 403, description = "Access denied")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn create_course(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Json(input): Json<CourseInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    let draft = validate_course(input)?;
    let course = catalog::create_course(state.store.as_ref(), draft).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/organiser/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with split start/end time", body = CourseEditView),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn get_course_for_edit(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    let course = catalog::course_with_classes(state.store.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;
    let (start_time, end_time) = course.time_parts();
    Ok(Json(CourseEditView {
        course,
        start_time,
        end_time,
    }))
}

#[utoipa::path(
    put,
    path = "/organiser/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = CourseInput,
    responses(
        (status = 200, description = "Updated course", body = Course),
        (status = 400, description = "All fields are required."),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn update_course(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
    Json(input): Json<CourseInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    let draft = validate_course(input)?;
    let course = catalog::update_course(state.store.as_ref(), id, draft)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/organiser/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn delete_course(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    match state.store.delete_course(id).await? {
        Some(course) => {
            info!(course_id = %id, title = %course.title, "course deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Course not found".into())),
    }
}

#[utoipa::path(
    patch,
    path = "/organiser/courses/{id}/classes/{class_id}",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("class_id" = Uuid, Path, description = "Class id")
    ),
    request_body = ClassUpdate,
    responses(
        (status = 200, description = "Updated class", body = ClassOccurrence),
        (status = 404, description = "Course or class not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn update_class(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path((id, class_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<ClassUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    let class = catalog::update_class(state.store.as_ref(), id, class_id, update).await?;
    Ok(Json(class))
}

#[utoipa::path(
    get,
    path = "/organiser/courses/{id}/enrolments",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrolments with user details", body = [EnrolmentDetails]),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn course_enrolments(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    if state.store.find_course(id).await?.is_none() {
        return Err(ApiError::NotFound("Course not found".into()));
    }

    let enrolments = state.store.enrolments_by_course(id).await?;
    let lookups = enrolments.into_iter().map(|enrolment| {
        let store = state.store.clone();
        async move {
            let user = store.find_user(&enrolment.username).await?;
            Ok::<_, ApiError>(match user {
                Some(user) => Some(EnrolmentDetails {
                    user: UserProfile::from(&user),
                    enrolment,
                }),
                None => {
                    warn!(username = %enrolment.username, "enrolment for unknown user");
                    None
                }
            })
        }
    });
    let details: Vec<EnrolmentDetails> = try_join_all(lookups).await?.into_iter().flatten().collect();
    Ok(Json(details))
}

#[utoipa::path(
    get,
    path = "/organiser/classes/{class_id}/bookings",
    params(("class_id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Participants booked on the class", body = [Booking])
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn class_bookings(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(class_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    Ok(Json(state.store.bookings_by_class(class_id).await?))
}

#[utoipa::path(
    delete,
    path = "/organiser/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 204, description = "Participant removed from the class"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    match state.store.delete_booking(id).await? {
        Some(booking) => {
            info!(booking_id = %id, username = %booking.username, "participant removed");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Booking not found".into())),
    }
}

#[utoipa::path(
    get,
    path = "/organiser/organisers",
    responses((status = 200, description = "All organisers", body = [Organiser])),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn list_organisers(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    Ok(Json(state.store.list_organisers().await?))
}

#[utoipa::path(
    post,
    path = "/organiser/organisers",
    request_body = NewOrganiser,
    responses(
        (status = 201, description = "Organiser added", body = Organiser),
        (status = 400, description = "name and role are required")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn add_organiser(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Json(input): Json<NewOrganiser>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    validate_organiser(&input)?;
    let organiser = Organiser {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        role: input.role.trim().to_string(),
        courses: input.courses,
    };
    state.store.insert_organiser(&organiser).await?;
    info!(organiser_id = %organiser.id, name = %organiser.name, "organiser added");
    Ok((StatusCode::CREATED, Json(organiser)))
}

#[utoipa::path(
    delete,
    path = "/organiser/organisers/{id}",
    params(("id" = Uuid, Path, description = "Organiser id")),
    responses(
        (status = 204, description = "Organiser deleted"),
        (status = 404, description = "Organiser not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "organiser"
)]
pub async fn delete_organiser(
    State(state): State<AppState>,
    bearer: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, bearer, &query).await?;
    match state.store.delete_organiser(id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound("Organiser not found".into())),
    }
}
