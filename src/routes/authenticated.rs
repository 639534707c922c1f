use super::{ADMIN_ONLY, ANY_ROLE, restrict, restrict_owned};
use crate::{
    AppState,
    authz::{OwnershipGuard, RolePolicy},
    handlers,
};
use axum::{
    Router,
    http::Method,
    routing::{delete, get},
};

/// Authenticated Router Module
///
/// Routes reachable by both students and admins. Anything addressed by a
/// student identity in the path is ownership-checked on `id`, so a student
/// only ever reaches their own records while admins reach all of them.
pub fn authenticated_routes() -> Router<AppState> {
    let own_student = OwnershipGuard::path_param("id");

    Router::<AppState>::new()
        // GET /me
        .route(
            "/me",
            restrict(
                get(handlers::get_me),
                RolePolicy::new().allow(Method::GET, ANY_ROLE),
            ),
        )
        // GET/PUT/DELETE /student/{id}
        // Deletion is admin-only; reads and edits are self-service.
        .route(
            "/student/{id}",
            restrict_owned(
                get(handlers::get_student)
                    .put(handlers::update_student)
                    .delete(handlers::delete_student),
                RolePolicy::new()
                    .allow(Method::GET, ANY_ROLE)
                    .allow(Method::PUT, ANY_ROLE)
                    .allow(Method::DELETE, ADMIN_ONLY),
                own_student,
            ),
        )
        // GET/POST /student/{id}/accommodations
        // Students read and file their own accommodation requests.
        .route(
            "/student/{id}/accommodations",
            restrict_owned(
                get(handlers::list_accommodations).post(handlers::create_accommodation),
                RolePolicy::new()
                    .allow(Method::GET, ANY_ROLE)
                    .allow(Method::POST, ANY_ROLE),
                own_student,
            ),
        )
        // GET/POST /student/{id}/meetings
        // Students book point-of-contact meetings for themselves.
        .route(
            "/student/{id}/meetings",
            restrict_owned(
                get(handlers::list_meetings).post(handlers::create_meeting),
                RolePolicy::new()
                    .allow(Method::GET, ANY_ROLE)
                    .allow(Method::POST, ANY_ROLE),
                own_student,
            ),
        )
        // GET/POST /student/{id}/pins
        .route(
            "/student/{id}/pins",
            restrict_owned(
                get(handlers::list_pins).post(handlers::pin_activity),
                RolePolicy::new()
                    .allow(Method::GET, ANY_ROLE)
                    .allow(Method::POST, ANY_ROLE),
                own_student,
            ),
        )
        // DELETE /student/{id}/pins/{activity_id}
        .route(
            "/student/{id}/pins/{activity_id}",
            restrict_owned(
                delete(handlers::unpin_activity),
                RolePolicy::new().allow(Method::DELETE, ANY_ROLE),
                own_student,
            ),
        )
        // GET/POST /activities
        // Everyone browses activities; only admins create them.
        .route(
            "/activities",
            restrict(
                get(handlers::list_activities).post(handlers::create_activity),
                RolePolicy::new()
                    .allow(Method::GET, ANY_ROLE)
                    .allow(Method::POST, ADMIN_ONLY),
            ),
        )
        // GET/DELETE /activities/{activity_id}
        .route(
            "/activities/{activity_id}",
            restrict(
                get(handlers::get_activity).delete(handlers::delete_activity),
                RolePolicy::new()
                    .allow(Method::GET, ANY_ROLE)
                    .allow(Method::DELETE, ADMIN_ONLY),
            ),
        )
}
