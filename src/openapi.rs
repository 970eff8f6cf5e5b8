use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    Booking, ClassUpdate, Course, CourseEditView, CourseInput, CourseView, Dashboard, Enrolment,
    EnrolmentDetails, LoginRequest, NewOrganiser, Organiser, RegisterRequest, TokenResponse,
    UserProfile,
};
use crate::schedule::{ClassOccurrence, Weekday};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::list_courses,
        crate::handlers::get_course,
        crate::handlers::get_classes,
        crate::handlers::get_classes_ical,
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::logout,
        crate::handlers::dashboard,
        crate::handlers::enrol,
        crate::handlers::book_class,
        crate::organiser::create_course,
        crate::organiser::get_course_for_edit,
        crate::organiser::update_course,
        crate::organiser::delete_course,
        crate::organiser::update_class,
        crate::organiser::course_enrolments,
        crate::organiser::class_bookings,
        crate::organiser::delete_booking,
        crate::organiser::list_organisers,
        crate::organiser::add_organiser,
        crate::organiser::delete_organiser
    ),
    components(schemas(
        Course,
        CourseView,
        CourseEditView,
        CourseInput,
        ClassOccurrence,
        ClassUpdate,
        Weekday,
        Enrolment,
        EnrolmentDetails,
        Booking,
        Organiser,
        NewOrganiser,
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        UserProfile,
        Dashboard
    )),
    tags(
        (name = "courses", description = "Courses, classes, enrolment and booking"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "organiser", description = "Course and participant management (admin)"),
        (name = "health", description = "Liveness and readiness probes")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
