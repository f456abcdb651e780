// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement unlocks and the rules that award them.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Streak lengths that unlock an achievement.
const STREAK_MILESTONES: [(u32, AchievementType); 3] = [
    (3, AchievementType::Streak3),
    (7, AchievementType::Streak7),
    (30, AchievementType::Streak30),
];
/// Share of the individual goal a single contribution must reach for `big_saver`.
const BIG_SAVER_SHARE: f64 = 0.25;
/// Minimum streak to qualify as the group's most consistent saver.
const MOST_CONSISTENT_MIN_STREAK: u32 = 7;

/// The fixed set of achievement tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    FirstContribution,
    #[serde(rename = "streak_3")]
    Streak3,
    #[serde(rename = "streak_7")]
    Streak7,
    #[serde(rename = "streak_30")]
    Streak30,
    #[serde(rename = "first_50_percent")]
    First50Percent,
    GoalCompleted,
    MostConsistent,
    EarlyBird,
    BigSaver,
}

impl AchievementType {
    pub const ALL: [AchievementType; 9] = [
        AchievementType::FirstContribution,
        AchievementType::Streak3,
        AchievementType::Streak7,
        AchievementType::Streak30,
        AchievementType::First50Percent,
        AchievementType::GoalCompleted,
        AchievementType::MostConsistent,
        AchievementType::EarlyBird,
        AchievementType::BigSaver,
    ];

    /// Tag as stored in the `achievements.achievement_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementType::FirstContribution => "first_contribution",
            AchievementType::Streak3 => "streak_3",
            AchievementType::Streak7 => "streak_7",
            AchievementType::Streak30 => "streak_30",
            AchievementType::First50Percent => "first_50_percent",
            AchievementType::GoalCompleted => "goal_completed",
            AchievementType::MostConsistent => "most_consistent",
            AchievementType::EarlyBird => "early_bird",
            AchievementType::BigSaver => "big_saver",
        }
    }
}

/// Unlock record (`achievements` table). Unique per (user, group, type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub achievement_type: AchievementType,
    /// When the achievement was unlocked (ISO 8601)
    pub unlocked_at: String,
}

/// Facts about one confirmed contribution needed to evaluate unlocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionFacts {
    pub amount: f64,
    /// Member total before this contribution
    pub previous_amount: f64,
    /// Member total after this contribution
    pub current_amount: f64,
    pub individual_goal: f64,
    /// Member streak after this contribution
    pub streak_days: u32,
    /// Whether the member had contributed to the group before
    pub had_prior_contributions: bool,
    /// Days since the group was created
    pub days_elapsed: i64,
    /// Highest streak among the other members of the group
    pub best_other_streak: u32,
}

/// Achievements earned by a contribution, in tag order.
///
/// Unlocking is idempotent on the backend, so this may return tags the
/// member already holds.
pub fn earned_achievements(facts: &ContributionFacts) -> Vec<AchievementType> {
    let mut earned = Vec::new();

    if !facts.had_prior_contributions {
        earned.push(AchievementType::FirstContribution);
    }

    for (threshold, tag) in STREAK_MILESTONES {
        if facts.streak_days >= threshold {
            earned.push(tag);
        }
    }

    if facts.individual_goal > 0.0 {
        let half = facts.individual_goal * 0.5;
        if facts.previous_amount < half && facts.current_amount >= half {
            earned.push(AchievementType::First50Percent);
        }
        if facts.previous_amount < facts.individual_goal
            && facts.current_amount >= facts.individual_goal
        {
            earned.push(AchievementType::GoalCompleted);
        }
        if facts.amount >= facts.individual_goal * BIG_SAVER_SHARE {
            earned.push(AchievementType::BigSaver);
        }
    }

    if facts.streak_days >= MOST_CONSISTENT_MIN_STREAK
        && facts.streak_days > facts.best_other_streak
    {
        earned.push(AchievementType::MostConsistent);
    }

    if facts.days_elapsed <= 0 {
        earned.push(AchievementType::EarlyBird);
    }

    earned.sort();
    earned
}
