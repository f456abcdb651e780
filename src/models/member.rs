//! Group membership model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Pacing classification of a member relative to elapsed group time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    OnTrack,
    AtRisk,
    Behind,
}

/// Public profile fields joined onto a membership row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Membership row (`group_members` table). One per (group, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    /// Falls back to the group goal when absent
    #[serde(default)]
    pub individual_goal: Option<f64>,
    /// Cumulative amount contributed
    #[serde(default)]
    pub current_amount: f64,
    /// Consecutive periods with a contribution
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub total_points: i64,
    /// Date of the latest contribution (ISO 8601)
    #[serde(default)]
    pub last_contribution_date: Option<String>,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<MemberProfile>,
}

impl GroupMember {
    /// Target for this member, falling back to the group goal.
    pub fn goal_or(&self, group_goal: f64) -> f64 {
        self.individual_goal.unwrap_or(group_goal)
    }
}

/// Request body for setting one's own goal in a `custom` division group.
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct IndividualGoal {
    #[validate(range(exclusive_min = 0.0))]
    pub individual_goal: f64,
}
