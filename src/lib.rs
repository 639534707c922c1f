use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, header},
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing grouped by audience (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{Principal, Role, TokenKeys};
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` annotations,
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::signup, handlers::login, handlers::get_me,
        handlers::list_students, handlers::create_student, handlers::get_student,
        handlers::update_student, handlers::delete_student,
        handlers::list_accommodations, handlers::create_accommodation,
        handlers::update_accommodation, handlers::delete_accommodation,
        handlers::list_meetings, handlers::create_meeting, handlers::delete_meeting,
        handlers::list_pins, handlers::pin_activity, handlers::unpin_activity,
        handlers::list_admins, handlers::create_admin, handlers::get_admin, handlers::delete_admin,
        handlers::list_activities, handlers::create_activity, handlers::get_activity,
        handlers::delete_activity
    ),
    components(
        schemas(
            models::Person, models::Student, models::Admin, models::Accommodation,
            models::Activity, models::Documentation, models::ActivityDetail,
            models::NewStudentRequest, models::NewAdminRequest, models::LoginRequest,
            models::UpdateStudentRequest, models::NewAccommodationRequest,
            models::UpdateAccommodationRequest, models::NewActivityRequest,
            models::PinRequest, models::Meeting, models::NewMeetingRequest,
            models::TokenResponse, auth::Role,
        )
    ),
    tags(
        (name = "accommodation-portal", description = "Student accommodations API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for everything handlers and middleware need.
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer.
    pub repo: RepositoryState,
    /// Token signing and verification keys, derived from `config` at startup.
    pub tokens: TokenKeys,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            tokens: TokenKeys::from_config(&config),
            repo,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(app_state: &AppState) -> TokenKeys {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree and the request pipeline:
/// CORS → request id → trace → routing → authentication → role check →
/// ownership check → handler. Each stage may end the request early.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    // Permissive CORS, outermost so preflight `OPTIONS` requests are answered
    // before any authentication runs. Headers are listed explicitly: a `*`
    // in Access-Control-Allow-Headers never covers `Authorization`.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            x_request_id.clone(),
        ])
        .expose_headers([x_request_id.clone()]);

    // Authentication covers every protected route; role and ownership stages
    // are attached per route inside the groups.
    let protected = Router::new()
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth::authenticate,
        ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set above so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
