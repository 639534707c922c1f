use std::{fmt, str::FromStr};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
};

/// Role
///
/// The closed set of roles a principal can hold. `Student` is subject to
/// self-service (ownership) restrictions, `Admin` is privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(ApiError::Internal(format!("unknown role '{other}'"))),
        }
    }
}

/// Claims
///
/// Payload of a bearer token. Signed with the server's shared secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity of the person the token was issued to.
    pub sub: i64,
    pub role: Role,
    /// Issued at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Principal
///
/// The authenticated caller of one request. Placed into the request
/// extensions by [`authenticate`] and dropped with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

/// Reads the principal attached by the authentication stage.
///
/// A missing principal is treated exactly like a missing credential.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("not authenticated"))
    }
}

/// TokenKeys
///
/// Signing and verification material for bearer tokens, built once at startup
/// and shared read-only by every request.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Expiry is exact: a token is dead the second its `exp` passes.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_secs)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issues a token for `id` with `role`, valid for the configured lifetime.
    pub fn issue(&self, id: i64, role: Role) -> ApiResult<String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| ApiError::Internal(format!("token lifetime {}s overflows expiry", self.ttl_secs)))?;
        let claims = Claims {
            sub: id,
            role,
            iat: now,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Verifies signature and expiry and returns the principal the token names.
    pub fn verify(&self, token: &str) -> ApiResult<Principal> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(Principal {
                id: data.claims.sub,
                role: data.claims.role,
            }),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(ApiError::unauthorized("token expired")),
                _ => {
                    tracing::debug!(error = %e, "token rejected");
                    Err(ApiError::unauthorized("invalid token"))
                }
            },
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("malformed authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("authorization header must use the Bearer scheme"))?;

    if token.is_empty() {
        return Err(ApiError::unauthorized("empty bearer token"));
    }
    Ok(token)
}

/// authenticate
///
/// Authentication stage. Converts the bearer header into a [`Principal`] and
/// attaches it to the request, or rejects with 401. Pure computation: no
/// database lookup, so a token stays valid until it expires.
pub async fn authenticate(
    State(keys): State<TokenKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = bearer_token(request.headers()).and_then(|token| keys.verify(token));

    let principal = match principal {
        Ok(principal) => principal,
        Err(e) => {
            tracing::debug!(reason = %e, "authentication failed");
            return Err(e);
        }
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Checks `password` against a stored Argon2 hash. Unparsable hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unparsable");
            false
        }
    }
}
