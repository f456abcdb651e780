//! Derived group statistics for the dashboard.
//!
//! Turns a raw group record (group row plus nested members and contributions)
//! into the [`GroupWithStats`] view model: totals, progress, per-member pacing
//! status, and how much each member should save per remaining period.
//!
//! Everything here is pure. The caller supplies `today` so the same record
//! always derives the same view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Contribution, Frequency, Group, GroupMember, MemberStatus, RawGroup};
use crate::time_utils::{days_between, parse_iso_date};

/// Ratio of expected savings at or above which a member is on track.
const ON_TRACK_RATIO: f64 = 0.9;
/// Ratio of expected savings at or above which a member is at risk (else behind).
const AT_RISK_RATIO: f64 = 0.6;
/// Points earned per currency unit contributed.
const POINTS_PER_UNIT: f64 = 0.25;
/// Flat bonus for contributing while on a streak.
const STREAK_BONUS_POINTS: i64 = 5;

/// Malformed group records. The backend is trusted to send well-formed rows,
/// so these indicate a bug upstream rather than bad user input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("group {field} is not an ISO 8601 date: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("group goal_amount must be a positive number, got {0}")]
    InvalidGoalAmount(f64),

    #[error("member {field} must be a finite non-negative number, got {value}")]
    InvalidMemberAmount { field: &'static str, value: f64 },
}

/// Member row annotated with its pacing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberWithStatus {
    #[serde(flatten)]
    pub member: GroupMember,
    pub status: MemberStatus,
}

/// Group view model consumed by the mobile client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupWithStats {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<MemberWithStatus>,
    pub contributions: Vec<Contribution>,
    pub total_saved: f64,
    pub total_goal: f64,
    /// Rounded percentage of the combined goal; exceeds 100 when overfunded
    pub progress_percent: i64,
    pub days_remaining: i64,
    pub per_period_needed: f64,
    pub periods_remaining: i64,
}

impl GroupWithStats {
    /// Annotated row for a user, if they belong to the group.
    pub fn member(&self, user_id: uuid::Uuid) -> Option<&MemberWithStatus> {
        self.members.iter().find(|m| m.member.user_id == user_id)
    }
}

/// Day counts of a group's timeline relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct Timeline {
    /// Days until the deadline, never negative
    pub days_remaining: i64,
    /// Length of the whole group, at least 1
    pub total_days: i64,
    pub days_elapsed: i64,
}

impl Timeline {
    /// Compute the timeline of a group as seen on `today`.
    pub fn for_group(group: &Group, today: NaiveDate) -> Result<Self, StatsError> {
        let deadline = parse_date_field("deadline", &group.deadline)?;
        let created = parse_date_field("created_at", &group.created_at)?;

        let days_remaining = days_between(today, deadline).max(0);
        let total_days = days_between(created, deadline).max(1);

        Ok(Self {
            days_remaining,
            total_days,
            days_elapsed: total_days - days_remaining,
        })
    }
}

fn parse_date_field(field: &'static str, value: &str) -> Result<NaiveDate, StatsError> {
    parse_iso_date(value).ok_or_else(|| StatsError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Derive the full view model for a group.
pub fn derive_group_stats(raw: RawGroup, today: NaiveDate) -> Result<GroupWithStats, StatsError> {
    let RawGroup {
        group,
        members,
        contributions,
    } = raw;

    if !group.goal_amount.is_finite() || group.goal_amount <= 0.0 {
        return Err(StatsError::InvalidGoalAmount(group.goal_amount));
    }
    for member in &members {
        check_member_amount("current_amount", member.current_amount)?;
        if let Some(goal) = member.individual_goal {
            check_member_amount("individual_goal", goal)?;
        }
    }

    let timeline = Timeline::for_group(&group, today)?;

    let total_saved: f64 = members.iter().map(|m| m.current_amount).sum();
    let total_goal: f64 = members.iter().map(|m| m.goal_or(group.goal_amount)).sum();

    let periods_remaining = periods_remaining(
        group.frequency,
        group.frequency_days(),
        timeline.days_remaining,
    );
    let per_period_needed = per_period_needed(group.goal_amount, periods_remaining);

    let members = members
        .into_iter()
        .map(|member| {
            let status = member_status(
                member.current_amount,
                member.goal_or(group.goal_amount),
                timeline.days_elapsed,
                timeline.total_days,
            );
            MemberWithStatus { member, status }
        })
        .collect();

    Ok(GroupWithStats {
        group,
        members,
        contributions,
        total_saved,
        total_goal,
        progress_percent: progress_percent(total_saved, total_goal),
        days_remaining: timeline.days_remaining,
        per_period_needed,
        periods_remaining,
    })
}

fn check_member_amount(field: &'static str, value: f64) -> Result<(), StatsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidMemberAmount { field, value })
    }
}

/// Classify a member's pacing against the share of the timeline already used.
///
/// A group that has not started yet (no elapsed days) or a member with no goal
/// expects nothing, so both count as on track.
pub fn member_status(
    current_amount: f64,
    individual_goal: f64,
    days_elapsed: i64,
    total_days: i64,
) -> MemberStatus {
    if total_days <= 0 || days_elapsed <= 0 || individual_goal <= 0.0 {
        return MemberStatus::OnTrack;
    }

    let expected = (days_elapsed as f64 / total_days as f64) * individual_goal;
    let ratio = current_amount / expected;

    if ratio >= ON_TRACK_RATIO {
        MemberStatus::OnTrack
    } else if ratio >= AT_RISK_RATIO {
        MemberStatus::AtRisk
    } else {
        MemberStatus::Behind
    }
}

/// Rounded percentage of `total_goal` saved. Not clamped.
pub fn progress_percent(total_saved: f64, total_goal: f64) -> i64 {
    if total_goal > 0.0 {
        (100.0 * total_saved / total_goal).round() as i64
    } else {
        0
    }
}

/// Number of contribution periods left before the deadline.
pub fn periods_remaining(frequency: Frequency, frequency_days: i64, days_remaining: i64) -> i64 {
    let days_remaining = days_remaining.max(0);
    if frequency == Frequency::Daily {
        return days_remaining;
    }
    let frequency_days = frequency_days.max(1);
    days_remaining / frequency_days + i64::from(days_remaining % frequency_days != 0)
}

/// Amount to save each remaining period to reach `goal_amount`.
///
/// The divisor carries one extra period so the final period is never treated
/// as due immediately.
pub fn per_period_needed(goal_amount: f64, periods_remaining: i64) -> f64 {
    if periods_remaining > 0 {
        round2(goal_amount / (periods_remaining + 1) as f64)
    } else {
        0.0
    }
}

/// Points awarded for a contribution.
pub fn calculate_points(amount: f64, streak_days: u32) -> i64 {
    let bonus = if streak_days > 0 {
        STREAK_BONUS_POINTS
    } else {
        0
    };
    base_points(amount) + bonus
}

/// Points for the amount alone, without the streak bonus.
pub fn base_points(amount: f64) -> i64 {
    (amount * POINTS_PER_UNIT).round() as i64
}

/// Streak after contributing on `today`.
///
/// Contributing again on the same day keeps the streak; a gap of at most one
/// period extends it; a longer gap starts over.
pub fn next_streak(
    last_contribution_date: Option<&str>,
    streak_days: u32,
    today: NaiveDate,
    frequency_days: i64,
) -> u32 {
    let Some(last) = last_contribution_date.and_then(parse_iso_date) else {
        return 1;
    };

    match days_between(last, today) {
        gap if gap <= 0 => streak_days.max(1),
        gap if gap <= frequency_days.max(1) => streak_days.saturating_add(1),
        _ => 1,
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
