// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process backend for tests and offline development.
//!
//! Enforces the same membership and contribution rules as the managed
//! backend's RPC functions so routes behave identically against either.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::stats::base_points;
use crate::models::{
    Achievement, AchievementType, Contribution, ContributionRecord, ContributionUpdate,
    DivisionType, Group, GroupMember, GroupUpdate, NewGroup, RawGroup,
};
use crate::services::gateway::{BackendError, BackendGateway, Session};
use crate::time_utils::format_utc_rfc3339;

const INVITE_CODE_LEN: usize = 8;

#[derive(Default)]
struct MemoryStore {
    groups: Vec<Group>,
    members: Vec<GroupMember>,
    contributions: Vec<Contribution>,
    achievements: Vec<Achievement>,
}

impl MemoryStore {
    fn group(&self, group_id: Uuid) -> Result<&Group, BackendError> {
        self.groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or_else(|| BackendError::NotFound(format!("group {}", group_id)))
    }

    fn group_mut(&mut self, group_id: Uuid) -> Result<&mut Group, BackendError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| BackendError::NotFound(format!("group {}", group_id)))
    }

    fn is_member(&self, group_id: Uuid, user_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
    }

    fn member_mut(
        &mut self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<&mut GroupMember, BackendError> {
        self.members
            .iter_mut()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .ok_or_else(|| BackendError::NotFound(format!("membership in group {}", group_id)))
    }

    /// Groups are only visible to their members.
    fn visible_group(&self, group_id: Uuid, user_id: Uuid) -> Result<&Group, BackendError> {
        let group = self.group(group_id)?;
        if !self.is_member(group_id, user_id) {
            return Err(BackendError::NotFound(format!("group {}", group_id)));
        }
        Ok(group)
    }

    fn raw_group(&self, group: &Group) -> RawGroup {
        let mut contributions: Vec<Contribution> = self
            .contributions
            .iter()
            .filter(|c| c.group_id == group.id)
            .cloned()
            .collect();
        contributions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        RawGroup {
            group: group.clone(),
            members: self
                .members
                .iter()
                .filter(|m| m.group_id == group.id)
                .cloned()
                .collect(),
            contributions,
        }
    }

    fn add_member(&mut self, group: &Group, user_id: Uuid, now: &str) {
        self.members.push(GroupMember {
            id: Uuid::new_v4(),
            group_id: group.id,
            user_id,
            individual_goal: Some(group.goal_amount),
            current_amount: 0.0,
            streak_days: 0,
            total_points: 0,
            last_contribution_date: None,
            joined_at: Some(now.to_string()),
            profile: None,
        });
    }

    fn own_contribution_index(
        &self,
        contribution_id: Uuid,
        user_id: Uuid,
    ) -> Result<usize, BackendError> {
        self.contributions
            .iter()
            .position(|c| c.id == contribution_id && c.user_id == user_id)
            .ok_or_else(|| BackendError::NotFound(format!("contribution {}", contribution_id)))
    }
}

/// In-memory [`BackendGateway`].
#[derive(Clone, Default)]
pub struct MemoryGateway {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a complete group record as-is (members and contributions included).
    pub async fn seed_group(&self, raw: RawGroup) {
        let mut store = self.store.write().await;
        store.groups.retain(|g| g.id != raw.group.id);
        store.members.retain(|m| m.group_id != raw.group.id);
        store.contributions.retain(|c| c.group_id != raw.group.id);

        store.members.extend(raw.members);
        store.contributions.extend(raw.contributions);
        store.groups.push(raw.group);
    }
}

fn now_rfc3339() -> String {
    format_utc_rfc3339(chrono::Utc::now())
}

fn generate_invite_code() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(INVITE_CODE_LEN)
        .collect()
}

#[async_trait]
impl BackendGateway for MemoryGateway {
    async fn fetch_group(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<RawGroup, BackendError> {
        let store = self.store.read().await;
        let group = store.visible_group(group_id, session.user_id)?;
        Ok(store.raw_group(group))
    }

    async fn fetch_user_groups(&self, session: &Session) -> Result<Vec<RawGroup>, BackendError> {
        let store = self.store.read().await;
        Ok(store
            .groups
            .iter()
            .filter(|g| store.is_member(g.id, session.user_id))
            .map(|g| store.raw_group(g))
            .collect())
    }

    async fn create_group(
        &self,
        session: &Session,
        new_group: &NewGroup,
    ) -> Result<Group, BackendError> {
        let now = now_rfc3339();
        let group = Group {
            id: Uuid::new_v4(),
            name: new_group.name.clone(),
            emoji: new_group.emoji.clone(),
            deadline: new_group.deadline.clone(),
            goal_amount: new_group.goal_amount,
            frequency: new_group.frequency,
            custom_frequency_days: new_group.custom_frequency_days,
            division_type: new_group.division_type,
            invite_code: generate_invite_code(),
            created_by: session.user_id,
            created_at: now.clone(),
        };

        let mut store = self.store.write().await;
        store.add_member(&group, session.user_id, &now);
        store.groups.push(group.clone());
        Ok(group)
    }

    async fn join_group(
        &self,
        session: &Session,
        invite_code: &str,
    ) -> Result<Group, BackendError> {
        let code = invite_code.trim().to_uppercase();
        let mut store = self.store.write().await;

        let group = store
            .groups
            .iter()
            .find(|g| g.invite_code == code)
            .cloned()
            .ok_or(BackendError::InvalidInviteCode)?;

        if store.is_member(group.id, session.user_id) {
            return Err(BackendError::AlreadyMember);
        }

        store.add_member(&group, session.user_id, &now_rfc3339());
        Ok(group)
    }

    async fn leave_group(&self, session: &Session, group_id: Uuid) -> Result<(), BackendError> {
        let mut store = self.store.write().await;
        let group = store.visible_group(group_id, session.user_id)?;

        if group.created_by == session.user_id {
            return Err(BackendError::CreatorCannotLeave);
        }

        let user_id = session.user_id;
        store
            .members
            .retain(|m| !(m.group_id == group_id && m.user_id == user_id));
        store
            .contributions
            .retain(|c| !(c.group_id == group_id && c.user_id == user_id));
        Ok(())
    }

    async fn delete_group(&self, session: &Session, group_id: Uuid) -> Result<(), BackendError> {
        let mut store = self.store.write().await;
        let group = store.visible_group(group_id, session.user_id)?;

        if group.created_by != session.user_id {
            return Err(BackendError::NotCreator);
        }

        store.groups.retain(|g| g.id != group_id);
        store.members.retain(|m| m.group_id != group_id);
        store.contributions.retain(|c| c.group_id != group_id);
        store.achievements.retain(|a| a.group_id != group_id);
        Ok(())
    }

    async fn update_group(
        &self,
        session: &Session,
        group_id: Uuid,
        changes: &GroupUpdate,
    ) -> Result<Group, BackendError> {
        let mut store = self.store.write().await;
        let creator = store.visible_group(group_id, session.user_id)?.created_by;
        if creator != session.user_id {
            return Err(BackendError::NotCreator);
        }

        let group = store.group_mut(group_id)?;
        changes.apply_to(group);
        let updated = group.clone();

        // Equal division keeps every member on the group goal
        if updated.division_type == DivisionType::Equal && changes.goal_amount.is_some() {
            for member in store.members.iter_mut().filter(|m| m.group_id == group_id) {
                member.individual_goal = Some(updated.goal_amount);
            }
        }

        Ok(updated)
    }

    async fn set_individual_goal(
        &self,
        session: &Session,
        group_id: Uuid,
        individual_goal: f64,
    ) -> Result<GroupMember, BackendError> {
        let mut store = self.store.write().await;
        let division = store.visible_group(group_id, session.user_id)?.division_type;
        if division != DivisionType::Custom {
            return Err(BackendError::DivisionNotCustom);
        }

        let member = store.member_mut(group_id, session.user_id)?;
        member.individual_goal = Some(individual_goal);
        Ok(member.clone())
    }

    async fn add_contribution(
        &self,
        session: &Session,
        record: &ContributionRecord,
    ) -> Result<Contribution, BackendError> {
        let mut store = self.store.write().await;
        store.visible_group(record.group_id, session.user_id)?;

        let contribution = Contribution {
            id: Uuid::new_v4(),
            group_id: record.group_id,
            user_id: session.user_id,
            amount: record.amount,
            note: record.note.clone(),
            points: record.points,
            created_at: now_rfc3339(),
        };

        let member = store.member_mut(record.group_id, session.user_id)?;
        member.current_amount += record.amount;
        member.total_points += record.points;
        member.streak_days = record.streak_days;
        member.last_contribution_date = Some(record.contributed_on.to_string());

        store.contributions.push(contribution.clone());
        Ok(contribution)
    }

    async fn update_contribution(
        &self,
        session: &Session,
        contribution_id: Uuid,
        changes: &ContributionUpdate,
    ) -> Result<Contribution, BackendError> {
        let mut store = self.store.write().await;
        let index = store.own_contribution_index(contribution_id, session.user_id)?;

        let old = store.contributions[index].clone();
        let streak_bonus = old.points - base_points(old.amount);
        let new_points = base_points(changes.amount) + streak_bonus;

        let member = store.member_mut(old.group_id, session.user_id)?;
        member.current_amount = (member.current_amount - old.amount + changes.amount).max(0.0);
        member.total_points = (member.total_points - old.points + new_points).max(0);

        let contribution = &mut store.contributions[index];
        contribution.amount = changes.amount;
        contribution.note = changes.note.clone();
        contribution.points = new_points;
        Ok(contribution.clone())
    }

    async fn delete_contribution(
        &self,
        session: &Session,
        contribution_id: Uuid,
    ) -> Result<Contribution, BackendError> {
        let mut store = self.store.write().await;
        let index = store.own_contribution_index(contribution_id, session.user_id)?;
        let (group_id, amount, points) = {
            let c = &store.contributions[index];
            (c.group_id, c.amount, c.points)
        };

        // Membership is checked before the row goes away
        let member = store.member_mut(group_id, session.user_id)?;
        member.current_amount = (member.current_amount - amount).max(0.0);
        member.total_points = (member.total_points - points).max(0);
        Ok(store.contributions.remove(index))
    }

    async fn unlock_achievement(
        &self,
        session: &Session,
        group_id: Uuid,
        achievement: AchievementType,
    ) -> Result<bool, BackendError> {
        let mut store = self.store.write().await;
        store.visible_group(group_id, session.user_id)?;

        let exists = store.achievements.iter().any(|a| {
            a.user_id == session.user_id
                && a.group_id == group_id
                && a.achievement_type == achievement
        });
        if exists {
            return Ok(false);
        }

        store.achievements.push(Achievement {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            group_id,
            achievement_type: achievement,
            unlocked_at: now_rfc3339(),
        });
        Ok(true)
    }

    async fn list_achievements(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<Vec<Achievement>, BackendError> {
        let store = self.store.read().await;
        store.visible_group(group_id, session.user_id)?;

        Ok(store
            .achievements
            .iter()
            .filter(|a| a.user_id == session.user_id && a.group_id == group_id)
            .cloned()
            .collect())
    }
}
