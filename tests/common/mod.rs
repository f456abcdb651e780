// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use goalcrew::config::Config;
use goalcrew::middleware::auth::{Claims, TOKEN_AUDIENCE};
use goalcrew::routes::create_router;
use goalcrew::services::MemoryGateway;
use goalcrew::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Signed-in test user.
#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// Create a test app backed by the in-memory gateway.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let (app, state, _) = create_test_app_with_gateway();
    (app, state)
}

/// Like [`create_test_app`], also returning the backing gateway for seeding.
#[allow(dead_code)]
pub fn create_test_app_with_gateway() -> (Router, Arc<AppState>, Arc<MemoryGateway>) {
    let config = Config::test_default();
    let gateway = Arc::new(MemoryGateway::new());
    let state = Arc::new(AppState::new(config, gateway.clone()));
    (create_router(state.clone()), state, gateway)
}

/// Create a backend-style session token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, secret: &[u8]) -> String {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        aud: TOKEN_AUDIENCE.to_string(),
        exp: now + 3600,
        iat: now,
        email: None,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn test_user() -> TestUser {
    let id = Uuid::new_v4();
    TestUser {
        id,
        token: create_test_jwt(id, &Config::test_default().jwt_secret),
    }
}

/// Build an authenticated JSON request.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str, user: &TestUser, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", user.token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request through the router.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a group through the API and return its JSON.
#[allow(dead_code)]
pub async fn create_group(app: &Router, user: &TestUser, body: Value) -> Value {
    let response = send(app, request(Method::POST, "/api/groups", user, Some(body))).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    json_body(response).await
}

/// A weekly equal-division group ending 60 days from now.
#[allow(dead_code)]
pub fn new_group_body(name: &str, goal_amount: f64) -> Value {
    let deadline = chrono::Utc::now().date_naive() + chrono::Duration::days(60);
    json!({
        "name": name,
        "deadline": deadline.to_string(),
        "goal_amount": goal_amount,
        "frequency": "weekly",
        "division_type": "equal",
    })
}
