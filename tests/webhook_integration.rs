// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database webhook tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use goalcrew::routes::webhook::SIGNATURE_HEADER;
use goalcrew::services::GroupEvent;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn webhook_request(body: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/webhooks/contributions")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_insert_notifies_group_subscribers() {
    let (app, state) = common::create_test_app();
    let group_id = Uuid::new_v4();
    let mut rx = state.hub.subscribe(group_id);

    let body = json!({
        "type": "INSERT",
        "table": "contributions",
        "schema": "public",
        "record": { "id": Uuid::new_v4(), "group_id": group_id, "amount": 25.0 },
        "old_record": null,
    })
    .to_string();
    let signature = sign(&state.config.webhook_secret, body.as_bytes());

    let response = app.oneshot(webhook_request(&body, &signature)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["notified"], 1);

    assert!(matches!(rx.try_recv().unwrap(), GroupEvent::Refresh));
}

#[tokio::test]
async fn test_delete_uses_old_record() {
    let (app, state) = common::create_test_app();
    let group_id = Uuid::new_v4();
    let mut rx = state.hub.subscribe(group_id);

    let body = json!({
        "type": "DELETE",
        "table": "contributions",
        "record": null,
        "old_record": { "group_id": group_id },
    })
    .to_string();
    let signature = format!("sha256={}", sign(&state.config.webhook_secret, body.as_bytes()));

    let response = app.oneshot(webhook_request(&body, &signature)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(matches!(rx.try_recv().unwrap(), GroupEvent::Refresh));
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let (app, state) = common::create_test_app();
    let group_id = Uuid::new_v4();
    let mut rx = state.hub.subscribe(group_id);

    let body = json!({
        "type": "INSERT",
        "table": "contributions",
        "record": { "group_id": group_id },
    })
    .to_string();
    let signature = sign(b"wrong_secret", body.as_bytes());

    let response = app
        .clone()
        .oneshot(webhook_request(&body, &signature))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Missing header
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/webhooks/contributions")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_other_tables_are_ignored() {
    let (app, state) = common::create_test_app();

    let body = json!({
        "type": "INSERT",
        "table": "profiles",
        "record": { "id": Uuid::new_v4() },
    })
    .to_string();
    let signature = sign(&state.config.webhook_secret, body.as_bytes());

    let response = app.oneshot(webhook_request(&body, &signature)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await["notified"], 0);
}

#[tokio::test]
async fn test_malformed_payload() {
    let (app, state) = common::create_test_app();
    let body = "{not json";
    let signature = sign(&state.config.webhook_secret, body.as_bytes());

    let response = app.oneshot(webhook_request(body, &signature)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
