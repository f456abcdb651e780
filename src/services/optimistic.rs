// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Two-phase view updates for in-flight contributions.
//!
//! Phase one ([`GroupViewCache::begin`]) snapshots the last fetched record and
//! returns a tentative view with the contribution applied. Phase two either
//! confirms the write with a freshly fetched record ([`GroupViewCache::confirm`])
//! or discards it ([`GroupViewCache::rollback`]). Entries only live while a
//! write is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{derive_group_stats, Contribution, GroupWithStats, RawGroup, StatsError};

/// Handle for one in-flight contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub group_id: Uuid,
    id: u64,
}

/// Contribution not yet confirmed by the backend.
#[derive(Debug, Clone)]
pub struct TentativeContribution {
    pub user_id: Uuid,
    pub amount: f64,
    pub note: Option<String>,
    pub points: i64,
    pub streak_days: u32,
    pub contributed_on: NaiveDate,
}

struct Pending {
    ticket: u64,
    change: TentativeContribution,
    placeholder_id: Uuid,
}

struct ViewEntry {
    /// Last record fetched from the backend
    base: RawGroup,
    pending: Vec<Pending>,
}

impl ViewEntry {
    /// Base record with every pending contribution applied.
    fn tentative_record(&self) -> RawGroup {
        let mut raw = self.base.clone();
        for pending in &self.pending {
            let change = &pending.change;
            if let Some(member) = raw.members.iter_mut().find(|m| m.user_id == change.user_id) {
                member.current_amount += change.amount;
                member.total_points += change.points;
                member.streak_days = change.streak_days;
                member.last_contribution_date = Some(change.contributed_on.to_string());
            }
            raw.contributions.insert(
                0,
                Contribution {
                    id: pending.placeholder_id,
                    group_id: raw.group.id,
                    user_id: change.user_id,
                    amount: change.amount,
                    note: change.note.clone(),
                    points: change.points,
                    created_at: change.contributed_on.to_string(),
                },
            );
        }
        raw
    }
}

/// Cache of groups with in-flight contributions.
#[derive(Clone, Default)]
pub struct GroupViewCache {
    entries: Arc<DashMap<Uuid, ViewEntry>>,
    next_ticket: Arc<AtomicU64>,
}

impl GroupViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase one: record a tentative contribution against `base`.
    ///
    /// Replaces the cached base record with `base` and returns the view with
    /// all pending contributions for the group applied.
    pub fn begin(
        &self,
        base: RawGroup,
        change: TentativeContribution,
        today: NaiveDate,
    ) -> Result<(Ticket, GroupWithStats), StatsError> {
        let group_id = base.group.id;
        let ticket = Ticket {
            group_id,
            id: self.next_ticket.fetch_add(1, Ordering::Relaxed),
        };

        let record = {
            let mut entry = self.entries.entry(group_id).or_insert_with(|| ViewEntry {
                base: base.clone(),
                pending: Vec::new(),
            });
            entry.base = base;
            entry.pending.push(Pending {
                ticket: ticket.id,
                change,
                placeholder_id: Uuid::new_v4(),
            });
            entry.tentative_record()
        };

        match derive_group_stats(record, today) {
            Ok(view) => Ok((ticket, view)),
            Err(e) => {
                self.discard(ticket);
                Err(e)
            }
        }
    }

    /// Phase two, success: reconcile with the record fetched after the write.
    ///
    /// The returned view is derived from `fresh` alone; other in-flight
    /// contributions stay pending until their own writes settle.
    pub fn confirm(
        &self,
        ticket: Ticket,
        fresh: RawGroup,
        today: NaiveDate,
    ) -> Result<GroupWithStats, StatsError> {
        if let Some(mut entry) = self.entries.get_mut(&ticket.group_id) {
            entry.base = fresh.clone();
        }
        self.discard(ticket);
        derive_group_stats(fresh, today)
    }

    /// Phase two, failure: drop the tentative contribution.
    ///
    /// Returns `false` if the ticket was already settled.
    pub fn rollback(&self, ticket: Ticket) -> bool {
        let removed = self.discard(ticket);
        if removed {
            tracing::debug!(group_id = %ticket.group_id, "Rolled back tentative contribution");
        }
        removed
    }

    /// Current tentative view of a group, if it has writes in flight.
    pub fn tentative_view(
        &self,
        group_id: Uuid,
        today: NaiveDate,
    ) -> Option<Result<GroupWithStats, StatsError>> {
        let record = self.entries.get(&group_id)?.tentative_record();
        Some(derive_group_stats(record, today))
    }

    /// Number of in-flight contributions for a group.
    pub fn pending_count(&self, group_id: Uuid) -> usize {
        self.entries
            .get(&group_id)
            .map(|entry| entry.pending.len())
            .unwrap_or(0)
    }

    fn discard(&self, ticket: Ticket) -> bool {
        let removed = match self.entries.get_mut(&ticket.group_id) {
            Some(mut entry) => {
                let before = entry.pending.len();
                entry.pending.retain(|p| p.ticket != ticket.id);
                entry.pending.len() != before
            }
            None => false,
        };

        self.entries
            .remove_if(&ticket.group_id, |_, entry| entry.pending.is_empty());
        removed
    }
}
