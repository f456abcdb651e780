// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contribution routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{
    AchievementType, Contribution, ContributionUpdate, GroupWithStats, NewContribution,
};
use crate::services::GroupEvent;
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/groups/{id}/contributions", post(record_contribution))
        .route(
            "/api/contributions/{id}",
            patch(update_contribution).delete(delete_contribution),
        )
}

/// Response for a recorded contribution.
#[derive(Serialize)]
pub struct RecordContributionResponse {
    pub contribution: Contribution,
    pub points_awarded: i64,
    pub streak_days: u32,
    /// Achievements unlocked for the first time
    pub unlocked: Vec<AchievementType>,
    pub group: GroupWithStats,
}

async fn record_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Json(input): Json<NewContribution>,
) -> Result<(StatusCode, Json<RecordContributionResponse>)> {
    input.validate()?;

    let outcome = state
        .recorder
        .record(&user.session(), group_id, input, today_utc())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordContributionResponse {
            contribution: outcome.contribution,
            points_awarded: outcome.points_awarded,
            streak_days: outcome.streak_days,
            unlocked: outcome.unlocked,
            group: outcome.group,
        }),
    ))
}

/// Edit one of the caller's own contributions.
async fn update_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contribution_id): Path<Uuid>,
    Json(changes): Json<ContributionUpdate>,
) -> Result<Json<Contribution>> {
    changes.validate()?;

    let contribution = state
        .gateway
        .update_contribution(&user.session(), contribution_id, &changes)
        .await?;
    tracing::info!(
        user_id = %user.user_id,
        contribution_id = %contribution_id,
        amount = contribution.amount,
        "Contribution updated"
    );

    state
        .hub
        .publish(contribution.group_id, GroupEvent::Refresh);
    Ok(Json(contribution))
}

/// Delete one of the caller's own contributions, returning the removed row.
async fn delete_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contribution_id): Path<Uuid>,
) -> Result<Json<Contribution>> {
    let removed = state
        .gateway
        .delete_contribution(&user.session(), contribution_id)
        .await?;
    tracing::info!(
        user_id = %user.user_id,
        contribution_id = %contribution_id,
        "Contribution deleted"
    );

    state.hub.publish(removed.group_id, GroupEvent::Refresh);
    Ok(Json(removed))
}
