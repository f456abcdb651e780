// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group lifecycle through the HTTP API.

use axum::http::{header, Method, StatusCode};
use serde_json::json;

mod common;
use common::{create_group, json_body, new_group_body, request, send, test_user};

#[tokio::test]
async fn test_create_and_fetch_group() {
    let (app, _) = common::create_test_app();
    let alice = test_user();

    let group = create_group(&app, &alice, new_group_body("Trip to Lisbon", 600.0)).await;
    let group_id = group["id"].as_str().unwrap();
    assert_eq!(group["created_by"], alice.id.to_string());
    assert_eq!(group["invite_code"].as_str().unwrap().len(), 8);

    let response = send(
        &app,
        request(Method::GET, &format!("/api/groups/{}", group_id), &alice, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["name"], "Trip to Lisbon");
    assert_eq!(body["total_saved"], 0.0);
    assert_eq!(body["total_goal"], 600.0);
    assert_eq!(body["progress_percent"], 0);
    assert_eq!(body["days_remaining"], 60);
    // ceil(60 / 7) periods; the per-period divisor adds one more
    assert_eq!(body["periods_remaining"], 9);
    assert_eq!(body["per_period_needed"], 60.0);
    assert_eq!(body["pending_contributions"], 0);
    assert_eq!(body["members"][0]["status"], "on_track");
    assert_eq!(body["display"]["total_goal"], "$600.00");
    assert_eq!(body["display"]["frequency"], "Weekly");
}

#[tokio::test]
async fn test_display_block_follows_requested_locale() {
    let (app, _) = common::create_test_app();
    let alice = test_user();
    let group = create_group(&app, &alice, new_group_body("Piso", 1500.0)).await;
    let uri = format!("/api/groups/{}", group["id"].as_str().unwrap());

    let es_uri = format!("{}?lang=es", uri);
    let response = send(&app, request(Method::GET, &es_uri, &alice, None)).await;
    let body = json_body(response).await;
    assert_eq!(body["display"]["total_goal"], "1.500,00 €");
    assert_eq!(body["display"]["members"][0]["status"], "Al día");

    let mut req = request(Method::GET, &uri, &alice, None);
    req.headers_mut()
        .insert(header::ACCEPT_LANGUAGE, "es-MX,es;q=0.9".parse().unwrap());
    let body = json_body(send(&app, req).await).await;
    assert_eq!(body["display"]["frequency"], "Semanal");
}

#[tokio::test]
async fn test_create_group_validation() {
    let (app, _) = common::create_test_app();
    let alice = test_user();

    let mut body = new_group_body("", 100.0);
    let req = request(Method::POST, "/api/groups", &alice, Some(body.clone()));
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_failed");

    body["name"] = json!("Rent");
    body["goal_amount"] = json!(0.0);
    let req = request(Method::POST, "/api/groups", &alice, Some(body.clone()));
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    body["goal_amount"] = json!(100.0);
    body["frequency"] = json!("custom");
    let req = request(Method::POST, "/api/groups", &alice, Some(body.clone()));
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    body["frequency"] = json!("weekly");
    body["deadline"] = json!(chrono::Utc::now().date_naive().to_string());
    let response = send(&app, request(Method::POST, "/api/groups", &alice, Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_join_by_invite_code() {
    let (app, _) = common::create_test_app();
    let alice = test_user();
    let bob = test_user();

    let group = create_group(&app, &alice, new_group_body("Concert", 200.0)).await;
    let code = group["invite_code"].as_str().unwrap().to_lowercase();

    // Codes are case-insensitive
    let response = send(
        &app,
        request(Method::POST, "/api/groups/join", &bob, Some(json!({ "invite_code": code }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        request(Method::POST, "/api/groups/join", &bob, Some(json!({ "invite_code": code }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "already_member");

    let response = send(
        &app,
        request(
            Method::POST,
            "/api/groups/join",
            &bob,
            Some(json!({ "invite_code": "NOPE0000" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_invite_code");

    let response = send(&app, request(Method::GET, "/api/groups", &bob, None)).await;
    let groups = json_body(response).await;
    assert_eq!(groups.as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["members"].as_array().unwrap().len(), 2);
    assert_eq!(groups[0]["total_goal"], 400.0);
}

#[tokio::test]
async fn test_groups_are_private_to_members() {
    let (app, _) = common::create_test_app();
    let alice = test_user();
    let mallory = test_user();

    let group = create_group(&app, &alice, new_group_body("Secret", 50.0)).await;
    let uri = format!("/api/groups/{}", group["id"].as_str().unwrap());

    let response = send(&app, request(Method::GET, &uri, &mallory, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, request(Method::GET, "/api/groups", &mallory, None)).await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_creator_rules() {
    let (app, _) = common::create_test_app();
    let alice = test_user();
    let bob = test_user();

    let group = create_group(&app, &alice, new_group_body("Rules", 100.0)).await;
    let group_id = group["id"].as_str().unwrap();
    let code = group["invite_code"].as_str().unwrap();
    send(
        &app,
        request(Method::POST, "/api/groups/join", &bob, Some(json!({ "invite_code": code }))),
    )
    .await;

    // Only the creator may edit or delete
    let response = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/groups/{}", group_id),
            &bob,
            Some(json!({ "name": "Mine now" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "not_creator");

    let response = send(
        &app,
        request(Method::DELETE, &format!("/api/groups/{}", group_id), &bob, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The creator cannot leave
    let response = send(
        &app,
        request(Method::POST, &format!("/api/groups/{}/leave", group_id), &alice, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "creator_cannot_leave");

    // Equal division: new goal applies to everyone
    let response = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/groups/{}", group_id),
            &alice,
            Some(json!({ "goal_amount": 250.0 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(
        &app,
        request(Method::GET, &format!("/api/groups/{}", group_id), &alice, None),
    )
    .await;
    assert_eq!(json_body(response).await["total_goal"], 500.0);

    let response = send(
        &app,
        request(Method::POST, &format!("/api/groups/{}/leave", group_id), &bob, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request(Method::DELETE, &format!("/api/groups/{}", group_id), &alice, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request(Method::GET, &format!("/api/groups/{}", group_id), &alice, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_rejects_bad_deadline() {
    let (app, _) = common::create_test_app();
    let alice = test_user();
    let group = create_group(&app, &alice, new_group_body("Dates", 100.0)).await;

    let response = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/groups/{}", group["id"].as_str().unwrap()),
            &alice,
            Some(json!({ "deadline": "someday" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_individual_goal_requires_custom_division() {
    let (app, _) = common::create_test_app();
    let alice = test_user();

    let equal = create_group(&app, &alice, new_group_body("Equal", 100.0)).await;
    let response = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/groups/{}/goal", equal["id"].as_str().unwrap()),
            &alice,
            Some(json!({ "individual_goal": 80.0 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "division_not_custom");

    let mut body = new_group_body("Custom", 100.0);
    body["division_type"] = json!("custom");
    let custom = create_group(&app, &alice, body).await;
    let group_id = custom["id"].as_str().unwrap();

    let response = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/groups/{}/goal", group_id),
            &alice,
            Some(json!({ "individual_goal": 80.0 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["individual_goal"], 80.0);

    let response = send(
        &app,
        request(Method::GET, &format!("/api/groups/{}", group_id), &alice, None),
    )
    .await;
    assert_eq!(json_body(response).await["total_goal"], 80.0);
}
