// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contribution recording service.
//!
//! Handles the core workflow:
//! 1. Fetch the group and the caller's membership
//! 2. Compute points and the continued streak
//! 3. Publish a tentative view to realtime subscribers
//! 4. Write the contribution through the backend
//! 5. Re-fetch, reconcile and publish the confirmed view
//! 6. Unlock any achievements the contribution earned

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::achievement::{earned_achievements, ContributionFacts};
use crate::models::stats::{calculate_points, next_streak, Timeline};
use crate::models::{
    AchievementType, Contribution, ContributionRecord, GroupWithStats, NewContribution,
};
use crate::services::gateway::{BackendGateway, Session};
use crate::services::optimistic::{GroupViewCache, TentativeContribution};
use crate::services::realtime::{GroupEvent, RealtimeHub};

/// Records contributions and keeps subscribers in sync.
#[derive(Clone)]
pub struct ContributionRecorder {
    gateway: Arc<dyn BackendGateway>,
    views: GroupViewCache,
    hub: RealtimeHub,
}

/// Result of recording a contribution.
#[derive(Debug)]
pub struct RecordOutcome {
    pub contribution: Contribution,
    pub points_awarded: i64,
    pub streak_days: u32,
    /// Achievements unlocked for the first time by this contribution
    pub unlocked: Vec<AchievementType>,
    pub group: GroupWithStats,
}

impl ContributionRecorder {
    pub fn new(gateway: Arc<dyn BackendGateway>, views: GroupViewCache, hub: RealtimeHub) -> Self {
        Self {
            gateway,
            views,
            hub,
        }
    }

    /// Record a contribution by the session user to a group.
    pub async fn record(
        &self,
        session: &Session,
        group_id: Uuid,
        input: NewContribution,
        today: NaiveDate,
    ) -> Result<RecordOutcome> {
        tracing::info!(
            user_id = %session.user_id,
            group_id = %group_id,
            amount = input.amount,
            "Recording contribution"
        );

        // 1. Current state of the group and the caller's membership
        let raw = self.gateway.fetch_group(session, group_id).await?;
        let member = raw.member(session.user_id).cloned().ok_or_else(|| {
            AppError::Forbidden(format!("Not a member of group {}", group_id))
        })?;

        let individual_goal = member.goal_or(raw.group.goal_amount);
        let timeline = Timeline::for_group(&raw.group, today)?;
        let had_prior_contributions = raw
            .contributions
            .iter()
            .any(|c| c.user_id == session.user_id);

        // 2. Points use the streak the member is carrying into this contribution
        let points = calculate_points(input.amount, member.streak_days);
        let streak_days = next_streak(
            member.last_contribution_date.as_deref(),
            member.streak_days,
            today,
            raw.group.frequency_days(),
        );

        // 3. Tentative view for everyone watching the group
        let (ticket, tentative) = self.views.begin(
            raw,
            TentativeContribution {
                user_id: session.user_id,
                amount: input.amount,
                note: input.note.clone(),
                points,
                streak_days,
                contributed_on: today,
            },
            today,
        )?;
        self.hub
            .publish(group_id, GroupEvent::Tentative(Box::new(tentative)));

        // 4. Write through the backend
        let record = ContributionRecord {
            group_id,
            amount: input.amount,
            note: input.note,
            points,
            streak_days,
            contributed_on: today,
        };
        let contribution = match self.gateway.add_contribution(session, &record).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    group_id = %group_id,
                    "Contribution rejected, rolling back tentative view"
                );
                self.views.rollback(ticket);
                self.hub.publish(group_id, GroupEvent::Refresh);
                return Err(e.into());
            }
        };

        // 5. Reconcile with what the backend now holds
        let fresh = match self.gateway.fetch_group(session, group_id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                self.views.rollback(ticket);
                self.hub.publish(group_id, GroupEvent::Refresh);
                return Err(e.into());
            }
        };
        let group = self.views.confirm(ticket, fresh, today)?;
        self.hub
            .publish(group_id, GroupEvent::Confirmed(Box::new(group.clone())));

        // 6. Achievements
        let current_amount = group
            .member(session.user_id)
            .map(|m| m.member.current_amount)
            .unwrap_or(member.current_amount + record.amount);
        let best_other_streak = group
            .members
            .iter()
            .filter(|m| m.member.user_id != session.user_id)
            .map(|m| m.member.streak_days)
            .max()
            .unwrap_or(0);

        let facts = ContributionFacts {
            amount: record.amount,
            previous_amount: member.current_amount,
            current_amount,
            individual_goal,
            streak_days,
            had_prior_contributions,
            days_elapsed: timeline.days_elapsed,
            best_other_streak,
        };
        let unlocked = self.unlock_all(session, group_id, &facts).await;

        tracing::info!(
            user_id = %session.user_id,
            group_id = %group_id,
            contribution_id = %contribution.id,
            points,
            streak_days,
            unlocked = ?unlocked,
            "Contribution recorded"
        );

        Ok(RecordOutcome {
            contribution,
            points_awarded: points,
            streak_days,
            unlocked,
            group,
        })
    }

    /// Unlock every earned achievement, returning the newly unlocked ones.
    ///
    /// The contribution is already stored at this point, so unlock failures
    /// are logged rather than failing the request.
    async fn unlock_all(
        &self,
        session: &Session,
        group_id: Uuid,
        facts: &ContributionFacts,
    ) -> Vec<AchievementType> {
        let mut unlocked = Vec::new();
        for achievement in earned_achievements(facts) {
            match self
                .gateway
                .unlock_achievement(session, group_id, achievement)
                .await
            {
                Ok(true) => unlocked.push(achievement),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        achievement = achievement.as_str(),
                        "Failed to unlock achievement"
                    );
                }
            }
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DivisionType, Frequency, NewGroup};
    use crate::services::MemoryGateway;

    fn session() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            access_token: "test".to_string(),
        }
    }

    fn contribution(amount: f64) -> NewContribution {
        NewContribution { amount, note: None }
    }

    async fn setup() -> (ContributionRecorder, Arc<MemoryGateway>, Session, Uuid, NaiveDate) {
        let gateway = Arc::new(MemoryGateway::new());
        let owner = session();
        let today = crate::time_utils::today_utc();
        let deadline = today + chrono::Duration::days(60);
        let group = gateway
            .create_group(
                &owner,
                &NewGroup {
                    name: "Emergency fund".to_string(),
                    emoji: None,
                    deadline: deadline.to_string(),
                    goal_amount: 400.0,
                    frequency: Frequency::Weekly,
                    custom_frequency_days: None,
                    division_type: DivisionType::Equal,
                },
            )
            .await
            .unwrap();

        let recorder =
            ContributionRecorder::new(gateway.clone(), GroupViewCache::new(), RealtimeHub::new());
        (recorder, gateway, owner, group.id, today)
    }

    #[tokio::test]
    async fn test_first_contribution_awards_points_and_achievements() {
        let (recorder, _gateway, owner, group_id, today) = setup().await;

        let outcome = recorder
            .record(&owner, group_id, contribution(100.0), today)
            .await
            .unwrap();

        assert_eq!(outcome.points_awarded, 25);
        assert_eq!(outcome.streak_days, 1);
        assert_eq!(outcome.group.total_saved, 100.0);
        assert_eq!(
            outcome.unlocked,
            vec![
                AchievementType::FirstContribution,
                AchievementType::EarlyBird,
                AchievementType::BigSaver,
            ]
        );
    }

    #[tokio::test]
    async fn test_second_contribution_same_day_keeps_streak_and_earns_bonus() {
        let (recorder, _gateway, owner, group_id, today) = setup().await;

        recorder
            .record(&owner, group_id, contribution(20.0), today)
            .await
            .unwrap();
        let outcome = recorder
            .record(&owner, group_id, contribution(40.0), today)
            .await
            .unwrap();

        // 40 * 0.25 + streak bonus
        assert_eq!(outcome.points_awarded, 15);
        assert_eq!(outcome.streak_days, 1);
        assert!(!outcome.unlocked.contains(&AchievementType::FirstContribution));
        let member = outcome.group.member(owner.user_id).unwrap();
        assert_eq!(member.member.total_points, 5 + 15);
    }

    #[tokio::test]
    async fn test_crossing_goal_unlocks_once() {
        let (recorder, _gateway, owner, group_id, today) = setup().await;

        let outcome = recorder
            .record(&owner, group_id, contribution(450.0), today)
            .await
            .unwrap();
        assert!(outcome.unlocked.contains(&AchievementType::First50Percent));
        assert!(outcome.unlocked.contains(&AchievementType::GoalCompleted));
        assert_eq!(outcome.group.progress_percent, 113);

        let outcome = recorder
            .record(&owner, group_id, contribution(150.0), today)
            .await
            .unwrap();
        // BigSaver and EarlyBird were already unlocked by the first contribution
        assert!(outcome.unlocked.is_empty());
    }

    #[tokio::test]
    async fn test_non_member_cannot_record() {
        let (recorder, _gateway, _owner, group_id, today) = setup().await;
        let stranger = session();

        let err = recorder
            .record(&stranger, group_id, contribution(10.0), today)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Backend(crate::services::BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_realtime_subscribers_see_tentative_then_confirmed() {
        let gateway = Arc::new(MemoryGateway::new());
        let owner = session();
        let today = crate::time_utils::today_utc();
        let group = gateway
            .create_group(
                &owner,
                &NewGroup {
                    name: "Gift".to_string(),
                    emoji: None,
                    deadline: (today + chrono::Duration::days(14)).to_string(),
                    goal_amount: 50.0,
                    frequency: Frequency::Daily,
                    custom_frequency_days: None,
                    division_type: DivisionType::Equal,
                },
            )
            .await
            .unwrap();
        let hub = RealtimeHub::new();
        let mut rx = hub.subscribe(group.id);
        let recorder = ContributionRecorder::new(gateway, GroupViewCache::new(), hub);

        recorder
            .record(&owner, group.id, contribution(5.0), today)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            GroupEvent::Tentative(view) => assert_eq!(view.total_saved, 5.0),
            other => panic!("expected tentative event, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            GroupEvent::Confirmed(view) => assert_eq!(view.total_saved, 5.0),
            other => panic!("expected confirmed event, got {:?}", other),
        }
    }
}
