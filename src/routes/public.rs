use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no token: health checks and the two flows that issue
/// tokens in the first place.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /signup
        // Student self-registration; answers with a token for the new account.
        .route("/signup", post(handlers::signup))
        // POST /login
        .route("/login", post(handlers::login))
}
