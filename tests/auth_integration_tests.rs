mod common;

use accommodation_portal::{
    ApiError, Role, TokenKeys,
    auth::{Claims, Principal},
};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{MockRepo, TEST_JWT_SECRET, request, send, student, test_router, token_for};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;

fn now() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

fn keys() -> TokenKeys {
    TokenKeys::new(TEST_JWT_SECRET, 3600)
}

fn sign(claims: &serde_json::Value, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn assert_unauthorized(result: Result<Principal, ApiError>, expected: &str) {
    match result {
        Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, expected),
        other => panic!("expected Unauthorized({expected}), got {other:?}"),
    }
}

// --- TokenKeys ---

#[test]
fn issued_token_verifies_to_same_principal() {
    let keys = keys();

    let token = keys.issue(42, Role::Student).unwrap();
    let principal = keys.verify(&token).unwrap();

    assert_eq!(principal, Principal { id: 42, role: Role::Student });
}

#[test]
fn admin_role_survives_issue_and_verify() {
    let keys = keys();
    let token = keys.issue(7, Role::Admin).unwrap();

    assert_eq!(keys.verify(&token).unwrap().role, Role::Admin);
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let token = TokenKeys::new("some-other-secret", 3600)
        .issue(42, Role::Admin)
        .unwrap();

    assert_unauthorized(keys().verify(&token), "invalid token");
}

#[test]
fn forged_payload_with_original_signature_is_rejected() {
    let keys = keys();
    let token = keys.issue(42, Role::Student).unwrap();
    let forged_payload = sign(
        &json!({ "sub": 42, "role": "admin", "iat": now(), "exp": now() + 3600 }),
        "attacker-secret",
    );

    // Header and payload of the forged token, signature of the genuine one.
    let genuine: Vec<&str> = token.split('.').collect();
    let forged: Vec<&str> = forged_payload.split('.').collect();
    let spliced = format!("{}.{}.{}", forged[0], forged[1], genuine[2]);

    assert_unauthorized(keys.verify(&spliced), "invalid token");
}

#[test]
fn expired_token_is_rejected_as_expired() {
    let claims = Claims {
        sub: 42,
        role: Role::Student,
        iat: now() - 7200,
        exp: now() - 60,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert_unauthorized(keys().verify(&token), "token expired");
}

#[test]
fn unknown_role_in_token_is_rejected() {
    let token = sign(
        &json!({ "sub": 1, "role": "superuser", "iat": now(), "exp": now() + 3600 }),
        TEST_JWT_SECRET,
    );

    assert_unauthorized(keys().verify(&token), "invalid token");
}

#[test]
fn garbage_token_is_rejected() {
    assert_unauthorized(keys().verify("not-a-jwt"), "invalid token");
}

#[test]
fn lifetime_past_the_clock_range_is_an_error_not_a_panic() {
    let err = TokenKeys::new(TEST_JWT_SECRET, u64::MAX)
        .issue(1, Role::Student)
        .unwrap_err();

    assert!(matches!(err, ApiError::Internal(_)), "got {err:?}");
}

#[test]
fn expiry_is_issue_time_plus_lifetime() {
    let token = TokenKeys::new(TEST_JWT_SECRET, 900).issue(1, Role::Student).unwrap();

    let mut validation = jsonwebtoken::Validation::default();
    validation.leeway = 0;
    let claims = jsonwebtoken::decode::<Claims>(
        &token,
        &jsonwebtoken::DecodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;

    assert_eq!(claims.exp - claims.iat, 900);
}

// --- Authentication stage (through the router) ---

#[tokio::test]
async fn valid_bearer_token_reaches_handler() {
    let repo = Arc::new(MockRepo::with_students(vec![student(42)]));
    let token = token_for(42, Role::Student);

    let response = send(test_router(repo.clone()), request("GET", "/me", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], 42);
    assert_eq!(repo.calls(), vec!["get_person:42"]);
}

#[tokio::test]
async fn missing_authorization_header_is_401_and_never_reaches_repository() {
    let repo = Arc::new(MockRepo::with_students(vec![student(42)]));

    let response = send(test_router(repo.clone()), request("GET", "/me", None)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message(), "missing authorization header");
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn non_bearer_scheme_is_401() {
    let repo = Arc::new(MockRepo::default());
    let req = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, "Basic abc123")
        .body(Body::empty())
        .unwrap();

    let response = send(test_router(repo.clone()), req).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.error_message(),
        "authorization header must use the Bearer scheme"
    );
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn bearer_scheme_is_case_sensitive() {
    let token = token_for(42, Role::Student);
    let req = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, format!("bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = send(test_router(Arc::new(MockRepo::default())), req).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_bearer_token_is_401() {
    let req = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, "Bearer ")
        .body(Body::empty())
        .unwrap();

    let response = send(test_router(Arc::new(MockRepo::default())), req).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message(), "empty bearer token");
}

#[tokio::test]
async fn expired_token_is_401_at_the_boundary() {
    let token = sign(
        &json!({ "sub": 42, "role": "student", "iat": now() - 7200, "exp": now() - 60 }),
        TEST_JWT_SECRET,
    );
    let repo = Arc::new(MockRepo::with_students(vec![student(42)]));

    let response = send(test_router(repo.clone()), request("GET", "/student/42", Some(&token))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message(), "token expired");
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let response = send(
        test_router(Arc::new(MockRepo::default())),
        request("GET", "/health", None),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"ok");
}
