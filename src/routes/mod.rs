/// Router Module Index
///
/// Routes are grouped by who can reach them. Every protected route carries its
/// own [`RolePolicy`] and, where self-service applies, an [`OwnershipGuard`];
/// the authentication stage is layered over the protected groups in
/// [`crate::create_router`].

/// Routes accessible to anonymous clients.
pub mod public;

/// Routes students and admins share. Self-service routes are ownership-checked.
pub mod authenticated;

/// Routes only admins may invoke.
pub mod admin;

use crate::{
    AppState,
    auth::Role,
    authz::{OwnershipGuard, RolePolicy, enforce_ownership, enforce_role_policy},
};
use axum::{middleware, routing::MethodRouter};

/// Every role.
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Student];
/// Admins only.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Wraps `route` in the role-check stage for `policy`.
pub fn restrict(route: MethodRouter<AppState>, policy: RolePolicy) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        policy.shared(),
        enforce_role_policy,
    ))
}

/// Like [`restrict`], with the ownership stage nested inside the role check.
pub fn restrict_owned(
    route: MethodRouter<AppState>,
    policy: RolePolicy,
    guard: OwnershipGuard,
) -> MethodRouter<AppState> {
    let route = route.route_layer(middleware::from_fn_with_state(guard, enforce_ownership));
    restrict(route, policy)
}
