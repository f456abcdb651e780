// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend gateway seam.
//!
//! The managed backend owns persistence, invite codes and every business rule
//! around group membership. This trait is the only way the rest of the crate
//! talks to it, so it can be swapped for [`super::MemoryGateway`] in tests
//! and local development.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Achievement, AchievementType, Contribution, ContributionRecord, ContributionUpdate, Group,
    GroupMember, GroupUpdate, NewGroup, RawGroup,
};

/// Caller identity forwarded with every backend request.
///
/// The access token is the caller's own backend session token so row-level
/// security applies to every read and write.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
}

/// Failures reported by the backend, classified once at the gateway boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("invalid invite code")]
    InvalidInviteCode,

    #[error("only the group creator can do that")]
    NotCreator,

    #[error("already a member of this group")]
    AlreadyMember,

    #[error("the group creator cannot leave the group")]
    CreatorCannotLeave,

    #[error("individual goals can only be set in custom division groups")]
    DivisionNotCustom,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend rejected the session")]
    Unauthorized,

    #[error("backend rate limit exceeded")]
    RateLimited,

    #[error("backend request failed: {0}")]
    Transport(String),

    #[error("unexpected backend response: {0}")]
    Decode(String),

    #[error("backend rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },
}

impl BackendError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::RateLimited | BackendError::Transport(_))
    }
}

/// Operations the managed backend exposes.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Fetch one group with nested members and contributions.
    async fn fetch_group(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<RawGroup, BackendError>;

    /// Fetch every group the session user belongs to.
    async fn fetch_user_groups(&self, session: &Session) -> Result<Vec<RawGroup>, BackendError>;

    /// Create a group; the creator joins it automatically.
    async fn create_group(
        &self,
        session: &Session,
        group: &NewGroup,
    ) -> Result<Group, BackendError>;

    async fn join_group(
        &self,
        session: &Session,
        invite_code: &str,
    ) -> Result<Group, BackendError>;

    async fn leave_group(&self, session: &Session, group_id: Uuid) -> Result<(), BackendError>;

    async fn delete_group(&self, session: &Session, group_id: Uuid) -> Result<(), BackendError>;

    async fn update_group(
        &self,
        session: &Session,
        group_id: Uuid,
        changes: &GroupUpdate,
    ) -> Result<Group, BackendError>;

    /// Set the session user's own goal in a `custom` division group.
    async fn set_individual_goal(
        &self,
        session: &Session,
        group_id: Uuid,
        individual_goal: f64,
    ) -> Result<GroupMember, BackendError>;

    /// Insert a contribution and apply its amount, points and streak to the
    /// session user's membership row.
    async fn add_contribution(
        &self,
        session: &Session,
        record: &ContributionRecord,
    ) -> Result<Contribution, BackendError>;

    /// Edit one of the session user's contributions, adjusting member totals.
    async fn update_contribution(
        &self,
        session: &Session,
        contribution_id: Uuid,
        changes: &ContributionUpdate,
    ) -> Result<Contribution, BackendError>;

    /// Delete one of the session user's contributions, reversing member
    /// totals. Returns the removed row.
    async fn delete_contribution(
        &self,
        session: &Session,
        contribution_id: Uuid,
    ) -> Result<Contribution, BackendError>;

    /// Unlock an achievement. Returns `false` if it was already unlocked.
    async fn unlock_achievement(
        &self,
        session: &Session,
        group_id: Uuid,
        achievement: AchievementType,
    ) -> Result<bool, BackendError>;

    async fn list_achievements(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<Vec<Achievement>, BackendError>;
}
