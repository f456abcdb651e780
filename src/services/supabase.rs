// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Managed backend client (PostgREST tables + RPC functions).
//!
//! Handles:
//! - Group reads with nested members and contributions
//! - Membership and contribution mutations through RPC functions
//! - Idempotent achievement unlocks
//! - Mapping backend error payloads onto [`BackendError`] kinds

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::{
    Achievement, AchievementType, Contribution, ContributionRecord, ContributionUpdate, Group,
    GroupMember, GroupUpdate, NewGroup, RawGroup,
};
use crate::services::gateway::{BackendError, BackendGateway, Session};

/// Embedded select for a group with everything the stats deriver needs.
const GROUP_SELECT: &str =
    "*,members:group_members(*,profile:profiles(username,avatar_url)),contributions(*)";
/// PostgREST code for "no rows" on a single-object request.
const NO_ROWS_CODE: &str = "PGRST116";
/// Media type asking PostgREST for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Managed backend client.
#[derive(Clone)]
pub struct SupabaseGateway {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
}

impl SupabaseGateway {
    /// Create a client for the project at `project_url`.
    pub fn new(project_url: &str, anon_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            anon_key,
        }
    }

    /// Request builder carrying the project key and the caller's session.
    fn request(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    /// Call an RPC function and parse its JSON result.
    async fn rpc<T: DeserializeOwned>(
        &self,
        session: &Session,
        function: &str,
        args: serde_json::Value,
    ) -> Result<T, BackendError> {
        tracing::debug!(function, user_id = %session.user_id, "Calling backend RPC");

        let response = self
            .request(Method::POST, &format!("rpc/{}", function), session)
            .json(&args)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        check_response_json(response).await
    }

    /// Call an RPC function that returns nothing useful.
    async fn rpc_void(
        &self,
        session: &Session,
        function: &str,
        args: serde_json::Value,
    ) -> Result<(), BackendError> {
        tracing::debug!(function, user_id = %session.user_id, "Calling backend RPC");

        let response = self
            .request(Method::POST, &format!("rpc/{}", function), session)
            .json(&args)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        check_response(response).await
    }
}

#[async_trait]
impl BackendGateway for SupabaseGateway {
    async fn fetch_group(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<RawGroup, BackendError> {
        let response = self
            .request(Method::GET, "groups", session)
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .query(&[
                ("id", format!("eq.{}", group_id)),
                ("select", GROUP_SELECT.to_string()),
                ("contributions.order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        check_response_json(response).await
    }

    async fn fetch_user_groups(&self, session: &Session) -> Result<Vec<RawGroup>, BackendError> {
        #[derive(Deserialize)]
        struct Membership {
            group: RawGroup,
        }

        let response = self
            .request(Method::GET, "group_members", session)
            .query(&[
                ("user_id", format!("eq.{}", session.user_id)),
                ("select", format!("group:groups({})", GROUP_SELECT)),
                ("order", "joined_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let memberships: Vec<Membership> = check_response_json(response).await?;
        Ok(memberships.into_iter().map(|m| m.group).collect())
    }

    async fn create_group(
        &self,
        session: &Session,
        group: &NewGroup,
    ) -> Result<Group, BackendError> {
        self.rpc(
            session,
            "create_group",
            json!({
                "p_name": group.name,
                "p_emoji": group.emoji,
                "p_deadline": group.deadline,
                "p_goal_amount": group.goal_amount,
                "p_frequency": group.frequency,
                "p_custom_frequency_days": group.custom_frequency_days,
                "p_division_type": group.division_type,
            }),
        )
        .await
    }

    async fn join_group(
        &self,
        session: &Session,
        invite_code: &str,
    ) -> Result<Group, BackendError> {
        self.rpc(
            session,
            "join_group_by_code",
            json!({ "p_invite_code": invite_code.trim().to_uppercase() }),
        )
        .await
    }

    async fn leave_group(&self, session: &Session, group_id: Uuid) -> Result<(), BackendError> {
        self.rpc_void(session, "leave_group", json!({ "p_group_id": group_id }))
            .await
    }

    async fn delete_group(&self, session: &Session, group_id: Uuid) -> Result<(), BackendError> {
        self.rpc_void(session, "delete_group", json!({ "p_group_id": group_id }))
            .await
    }

    async fn update_group(
        &self,
        session: &Session,
        group_id: Uuid,
        changes: &GroupUpdate,
    ) -> Result<Group, BackendError> {
        self.rpc(
            session,
            "update_group",
            json!({ "p_group_id": group_id, "p_changes": changes }),
        )
        .await
    }

    async fn set_individual_goal(
        &self,
        session: &Session,
        group_id: Uuid,
        individual_goal: f64,
    ) -> Result<GroupMember, BackendError> {
        self.rpc(
            session,
            "set_individual_goal",
            json!({ "p_group_id": group_id, "p_individual_goal": individual_goal }),
        )
        .await
    }

    async fn add_contribution(
        &self,
        session: &Session,
        record: &ContributionRecord,
    ) -> Result<Contribution, BackendError> {
        self.rpc(
            session,
            "add_contribution",
            json!({
                "p_group_id": record.group_id,
                "p_amount": record.amount,
                "p_note": record.note,
                "p_points": record.points,
                "p_streak_days": record.streak_days,
                "p_contributed_on": record.contributed_on,
            }),
        )
        .await
    }

    async fn update_contribution(
        &self,
        session: &Session,
        contribution_id: Uuid,
        changes: &ContributionUpdate,
    ) -> Result<Contribution, BackendError> {
        self.rpc(
            session,
            "update_contribution",
            json!({
                "p_contribution_id": contribution_id,
                "p_amount": changes.amount,
                "p_note": changes.note,
            }),
        )
        .await
    }

    async fn delete_contribution(
        &self,
        session: &Session,
        contribution_id: Uuid,
    ) -> Result<Contribution, BackendError> {
        self.rpc(
            session,
            "delete_contribution",
            json!({ "p_contribution_id": contribution_id }),
        )
        .await
    }

    async fn unlock_achievement(
        &self,
        session: &Session,
        group_id: Uuid,
        achievement: AchievementType,
    ) -> Result<bool, BackendError> {
        let response = self
            .request(Method::POST, "achievements", session)
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .query(&[("on_conflict", "user_id,group_id,achievement_type")])
            .json(&json!({
                "user_id": session.user_id,
                "group_id": group_id,
                "achievement_type": achievement,
            }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        // Duplicates are ignored and come back as an empty representation
        let inserted: Vec<Achievement> = check_response_json(response).await?;
        Ok(!inserted.is_empty())
    }

    async fn list_achievements(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<Vec<Achievement>, BackendError> {
        let response = self
            .request(Method::GET, "achievements", session)
            .query(&[
                ("user_id", format!("eq.{}", session.user_id)),
                ("group_id", format!("eq.{}", group_id)),
                ("order", "unlocked_at.asc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), BackendError> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(classify_error(status, &body))
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(classify_error(status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| BackendError::Decode(format!("JSON parse error: {}", e)))
}

/// PostgREST error payload.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Map a failed backend response onto an error kind.
///
/// Business-rule violations come back from RPC functions as raised exceptions
/// whose message (or hint) names the rule. This is the only place that text
/// is inspected.
pub(crate) fn classify_error(status: u16, body: &str) -> BackendError {
    let payload: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let code = payload.code.unwrap_or_default();
    let message = payload.message.unwrap_or_else(|| body.to_string());
    let text = format!(
        "{} {}",
        message.to_lowercase(),
        payload.hint.unwrap_or_default().to_lowercase()
    );

    if text.contains("invalid invite code") {
        return BackendError::InvalidInviteCode;
    }
    if text.contains("already a member") {
        return BackendError::AlreadyMember;
    }
    if text.contains("creator cannot leave") {
        return BackendError::CreatorCannotLeave;
    }
    if text.contains("not the creator") || text.contains("only the creator") {
        return BackendError::NotCreator;
    }
    if text.contains("custom division") {
        return BackendError::DivisionNotCustom;
    }

    match status {
        401 => BackendError::Unauthorized,
        404 => BackendError::NotFound(message),
        406 if code == NO_ROWS_CODE => BackendError::NotFound(message),
        429 => {
            tracing::warn!("Backend rate limit hit (429)");
            BackendError::RateLimited
        }
        _ if code == NO_ROWS_CODE || text.contains("not found") => BackendError::NotFound(message),
        _ => BackendError::Rejected {
            code: if code.is_empty() {
                format!("HTTP {}", status)
            } else {
                code
            },
            message,
        },
    }
}
