// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database webhook for contribution changes made outside this service.

use crate::error::AppError;
use crate::services::GroupEvent;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the hex HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

const CONTRIBUTIONS_TABLE: &str = "contributions";

type HmacSha256 = Hmac<Sha256>;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/contributions", post(handle_event))
}

/// Database webhook payload. Row shapes depend on the table.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    table: String,
    #[serde(default)]
    record: Option<serde_json::Value>,
    #[serde(default)]
    old_record: Option<serde_json::Value>,
}

fn row_group_id(row: &serde_json::Value) -> Option<Uuid> {
    row.get("group_id")?.as_str()?.parse().ok()
}

#[derive(Serialize)]
struct WebhookResponse {
    received: bool,
    notified: usize,
}

/// Check a hex signature (optionally `sha256=`-prefixed) against the body.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Handle a webhook event (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&state.config.webhook_secret, &body, signature) {
        tracing::warn!("Security Alert: Webhook signature mismatch");
        return Err(AppError::Unauthorized);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    tracing::info!(
        event_type = %event.event_type,
        table = %event.table,
        "Received webhook event"
    );

    if event.table != CONTRIBUTIONS_TABLE {
        return Ok((
            StatusCode::OK,
            Json(WebhookResponse {
                received: true,
                notified: 0,
            }),
        ));
    }

    // Deletes only carry the old row
    let row = match event.event_type.as_str() {
        "INSERT" | "UPDATE" => event.record,
        "DELETE" => event.old_record,
        other => {
            tracing::debug!(event_type = other, "Ignoring webhook event type");
            None
        }
    };

    let notified = match row.as_ref().and_then(row_group_id) {
        Some(group_id) => state.hub.publish(group_id, GroupEvent::Refresh),
        None => 0,
    };

    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            received: true,
            notified,
        }),
    ))
}
