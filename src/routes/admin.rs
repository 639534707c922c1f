use super::{ADMIN_ONLY, restrict};
use crate::{
    AppState,
    authz::RolePolicy,
    handlers,
};
use axum::{
    Router,
    http::Method,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// Routes restricted to the `admin` role on every method: roster management
/// accommodation review and meeting cancellation.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /students
        .route(
            "/students",
            restrict(
                get(handlers::list_students).post(handlers::create_student),
                RolePolicy::new()
                    .allow(Method::GET, ADMIN_ONLY)
                    .allow(Method::POST, ADMIN_ONLY),
            ),
        )
        // GET/POST /admins
        .route(
            "/admins",
            restrict(
                get(handlers::list_admins).post(handlers::create_admin),
                RolePolicy::new()
                    .allow(Method::GET, ADMIN_ONLY)
                    .allow(Method::POST, ADMIN_ONLY),
            ),
        )
        // GET/DELETE /admin/{id}
        .route(
            "/admin/{id}",
            restrict(
                get(handlers::get_admin).delete(handlers::delete_admin),
                RolePolicy::new()
                    .allow(Method::GET, ADMIN_ONLY)
                    .allow(Method::DELETE, ADMIN_ONLY),
            ),
        )
        // PUT/DELETE /accommodations/{accommodation_id}
        // Approval and removal of accommodation requests.
        .route(
            "/accommodations/{accommodation_id}",
            restrict(
                put(handlers::update_accommodation).delete(handlers::delete_accommodation),
                RolePolicy::new()
                    .allow(Method::PUT, ADMIN_ONLY)
                    .allow(Method::DELETE, ADMIN_ONLY),
            ),
        )
        // DELETE /meetings/{meeting_id}
        .route(
            "/meetings/{meeting_id}",
            restrict(
                delete(handlers::delete_meeting),
                RolePolicy::new().allow(Method::DELETE, ADMIN_ONLY),
            ),
        )
}
