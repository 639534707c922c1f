//! Authorization stages: per-route role policies and the ownership guard.
//!
//! Both stages run after [`crate::auth::authenticate`] and read the
//! [`Principal`] it attached. Their configuration is built at router setup and
//! shared read-only between requests.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{RawPathParams, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{Principal, Role},
    error::ApiError,
};

/// RolePolicy
///
/// Allow-list of roles per HTTP method for a single route. Methods without an
/// entry deny every role.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    allowed: HashMap<Method, HashSet<Role>>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permits `roles` to invoke `method`. Repeated calls for the same method
    /// extend its set.
    pub fn allow(mut self, method: Method, roles: &[Role]) -> Self {
        self.allowed
            .entry(method)
            .or_default()
            .extend(roles.iter().copied());
        self
    }

    /// `HEAD` is answered by the `GET` handler, so it is judged as `GET`.
    pub fn permits(&self, method: &Method, role: Role) -> bool {
        let method = if *method == Method::HEAD { Method::GET } else { method.clone() };
        self.allowed
            .get(&method)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Freezes the policy for use as middleware state.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// enforce_role_policy
///
/// Role-check stage. Forwards the request unchanged only when the principal's
/// role is listed for the request method.
pub async fn enforce_role_policy(
    State(policy): State<Arc<RolePolicy>>,
    principal: Principal,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = request.method();
    if !policy.permits(method, principal.role) {
        tracing::debug!(
            principal = principal.id,
            role = %principal.role,
            %method,
            "role not permitted"
        );
        return Err(ApiError::forbidden(format!(
            "role '{}' may not {} this resource",
            principal.role, method
        )));
    }
    Ok(next.run(request).await)
}

/// OwnershipGuard
///
/// Restricts a route so that a principal holding the restricted role may only
/// address the resource whose path identifier equals its own identity. Every
/// other role passes untouched.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipGuard {
    param: &'static str,
    restricted: Role,
}

impl OwnershipGuard {
    /// Guards the path parameter named `param` against students.
    pub fn path_param(param: &'static str) -> Self {
        Self {
            param,
            restricted: Role::Student,
        }
    }

    pub fn restricting(mut self, role: Role) -> Self {
        self.restricted = role;
        self
    }

    pub fn param(&self) -> &'static str {
        self.param
    }

    /// Decides access for `principal` given the raw path value, if any.
    pub fn check(&self, principal: Principal, raw_id: Option<&str>) -> Result<(), ApiError> {
        if principal.role != self.restricted {
            return Ok(());
        }

        let raw_id = raw_id.ok_or_else(|| {
            ApiError::Internal(format!(
                "ownership guard configured for missing path parameter '{}'",
                self.param
            ))
        })?;

        let id: i64 = raw_id.parse().map_err(|_| {
            ApiError::bad_request(format!("path parameter '{}' must be an integer", self.param))
        })?;

        if id != principal.id {
            return Err(ApiError::forbidden("access to another user's resource is not allowed"));
        }
        Ok(())
    }
}

/// enforce_ownership
///
/// Ownership-check stage. Always layered inside [`enforce_role_policy`].
pub async fn enforce_ownership(
    State(guard): State<OwnershipGuard>,
    principal: Principal,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw_id = params
        .iter()
        .find(|(name, _)| *name == guard.param())
        .map(|(_, value)| value);

    if let Err(e) = guard.check(principal, raw_id) {
        tracing::debug!(principal = principal.id, reason = %e, "ownership check failed");
        return Err(e);
    }
    Ok(next.run(request).await)
}
