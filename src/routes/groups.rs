// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group routes: listing, membership, and the derived group view.

use crate::error::{AppError, Result};
use crate::format::{format_currency, format_percent, frequency_label, status_label, FormatContext};
use crate::middleware::AuthUser;
use crate::models::{
    derive_group_stats, Group, GroupMember, GroupUpdate, GroupWithStats, IndividualGoal, NewGroup,
};
use crate::routes::locale::RequestLocale;
use crate::services::{GroupEvent, Session};
use crate::time_utils::{parse_iso_date, today_utc};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

/// Group routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/groups", get(list_groups).post(create_group))
        .route("/api/groups/join", post(join_group))
        .route(
            "/api/groups/{id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/api/groups/{id}/leave", post(leave_group))
        .route("/api/groups/{id}/goal", put(set_individual_goal))
}

/// Fetch a group as the session user and derive its stats.
pub(crate) async fn load_group_view(
    state: &AppState,
    session: &Session,
    group_id: Uuid,
) -> Result<GroupWithStats> {
    let raw = state.gateway.fetch_group(session, group_id).await?;
    Ok(derive_group_stats(raw, today_utc())?)
}

// ─── Listing ─────────────────────────────────────────────────

/// Caller's groups, each with derived stats.
///
/// A malformed record is logged and left out rather than failing the list.
async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<GroupWithStats>>> {
    let today = today_utc();
    let raw_groups = state.gateway.fetch_user_groups(&user.session()).await?;

    let groups = raw_groups
        .into_iter()
        .filter_map(|raw| {
            let group_id = raw.group.id;
            derive_group_stats(raw, today)
                .map_err(|e| {
                    tracing::error!(group_id = %group_id, error = %e, "Skipping malformed group");
                })
                .ok()
        })
        .collect();

    Ok(Json(groups))
}

// ─── Group Detail ────────────────────────────────────────────

/// Display strings for a member row.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct MemberDisplay {
    pub user_id: Uuid,
    pub status: String,
    pub saved: String,
    pub goal: String,
}

/// Localized strings for the group screen.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct GroupDisplay {
    pub total_saved: String,
    pub total_goal: String,
    pub per_period_needed: String,
    pub progress: String,
    pub frequency: String,
    pub members: Vec<MemberDisplay>,
}

impl GroupDisplay {
    pub fn new(stats: &GroupWithStats, ctx: &FormatContext) -> Self {
        let group = &stats.group;
        Self {
            total_saved: format_currency(stats.total_saved, ctx),
            total_goal: format_currency(stats.total_goal, ctx),
            per_period_needed: format_currency(stats.per_period_needed, ctx),
            progress: format_percent(stats.progress_percent),
            frequency: frequency_label(group.frequency, group.custom_frequency_days, ctx.locale),
            members: stats
                .members
                .iter()
                .map(|m| MemberDisplay {
                    user_id: m.member.user_id,
                    status: status_label(m.status, ctx.locale).to_string(),
                    saved: format_currency(m.member.current_amount, ctx),
                    goal: format_currency(m.member.goal_or(group.goal_amount), ctx),
                })
                .collect(),
        }
    }
}

/// Group detail response.
#[derive(Serialize)]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupWithStats,
    /// Contributions written but not yet confirmed by the backend
    pub pending_contributions: usize,
    pub display: GroupDisplay,
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    RequestLocale(locale): RequestLocale,
) -> Result<Json<GroupDetailResponse>> {
    let group = load_group_view(&state, &user.session(), group_id).await?;
    let ctx = state.config.format_context(locale);

    Ok(Json(GroupDetailResponse {
        display: GroupDisplay::new(&group, &ctx),
        pending_contributions: state.views.pending_count(group_id),
        group,
    }))
}

// ─── Create / Update / Delete ────────────────────────────────

/// Deadlines must be ISO dates; new groups must end after today.
fn parse_deadline(raw: &str) -> Result<NaiveDate> {
    parse_iso_date(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid deadline: {:?}", raw)))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<NewGroup>,
) -> Result<(StatusCode, Json<Group>)> {
    input.validate()?;
    if parse_deadline(&input.deadline)? <= today_utc() {
        return Err(AppError::BadRequest("Deadline must be after today".to_string()));
    }

    let group = state.gateway.create_group(&user.session(), &input).await?;
    tracing::info!(
        user_id = %user.user_id,
        group_id = %group.id,
        "Group created"
    );

    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Json(changes): Json<GroupUpdate>,
) -> Result<Json<Group>> {
    changes.validate()?;
    if let Some(deadline) = &changes.deadline {
        parse_deadline(deadline)?;
    }

    let group = state
        .gateway
        .update_group(&user.session(), group_id, &changes)
        .await?;
    state.hub.publish(group_id, GroupEvent::Refresh);

    Ok(Json(group))
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .gateway
        .delete_group(&user.session(), group_id)
        .await?;
    tracing::info!(user_id = %user.user_id, group_id = %group_id, "Group deleted");

    state.hub.publish(group_id, GroupEvent::Refresh);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Membership ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 32))]
    pub invite_code: String,
}

async fn join_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<JoinRequest>,
) -> Result<Json<Group>> {
    input.validate()?;

    let group = state
        .gateway
        .join_group(&user.session(), &input.invite_code)
        .await?;
    tracing::info!(user_id = %user.user_id, group_id = %group.id, "Joined group");

    state.hub.publish(group.id, GroupEvent::Refresh);
    Ok(Json(group))
}

async fn leave_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.gateway.leave_group(&user.session(), group_id).await?;
    tracing::info!(user_id = %user.user_id, group_id = %group_id, "Left group");

    state.hub.publish(group_id, GroupEvent::Refresh);
    Ok(StatusCode::NO_CONTENT)
}

async fn set_individual_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Json(input): Json<IndividualGoal>,
) -> Result<Json<GroupMember>> {
    input.validate()?;

    let member = state
        .gateway
        .set_individual_goal(&user.session(), group_id, input.individual_goal)
        .await?;

    state.hub.publish(group_id, GroupEvent::Refresh);
    Ok(Json(member))
}
