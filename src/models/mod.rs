// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod contribution;
pub mod group;
pub mod member;
pub mod stats;

pub use achievement::{Achievement, AchievementType};
pub use contribution::{Contribution, ContributionRecord, ContributionUpdate, NewContribution};
pub use group::{DivisionType, Frequency, Group, GroupUpdate, NewGroup, RawGroup};
pub use member::{GroupMember, IndividualGoal, MemberProfile, MemberStatus};
pub use stats::{derive_group_stats, GroupWithStats, MemberWithStatus, StatsError};
