pub mod auth;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod organiser;
pub mod pricing;
pub mod schedule;
pub mod seed;
pub mod settings;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use handlers::{
    book_class, dashboard, enrol, get_classes, get_classes_ical, get_course, healthz_live,
    healthz_ready, list_courses, login, logout, not_found, register, root,
};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::{MemoryStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn Store>,
    pub exporter: Arc<ICalExporter>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn Store>) -> Result<Self, config::ConfigError> {
        let exporter = ICalExporter::new(settings.tz()?, settings.public_url.clone());
        Ok(Self {
            settings,
            store,
            exporter: Arc::new(exporter),
        })
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    if settings.seed_defaults {
        seed::seed_defaults(store.as_ref(), &settings).await?;
    }

    let state = AppState::new(settings, store)?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Dance School API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let organiser_routes = Router::new()
        .route("/courses", post(organiser::create_course))
        .route(
            "/courses/{id}",
            get(organiser::get_course_for_edit)
                .put(organiser::update_course)
                .delete(organiser::delete_course),
        )
        .route(
            "/courses/{id}/classes/{class_id}",
            patch(organiser::update_class),
        )
        .route("/courses/{id}/enrolments", get(organiser::course_enrolments))
        .route("/classes/{class_id}/bookings", get(organiser::class_bookings))
        .route("/bookings/{id}", delete(organiser::delete_booking))
        .route(
            "/organisers",
            get(organiser::list_organisers).post(organiser::add_organiser),
        )
        .route("/organisers/{id}", delete(organiser::delete_organiser));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/classes", get(get_classes))
        .route("/courses/{id}/classes.ical", get(get_classes_ical))
        .route("/courses/{id}/enrol", post(enrol))
        .route("/courses/{id}/classes/{class_id}/book", post(book_class))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .nest("/organiser", organiser_routes)
        .fallback(not_found)
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer)
}
