// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-group fan-out of change notifications to connected clients.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::GroupWithStats;

/// Buffered events per group before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Something changed in a group.
#[derive(Debug, Clone)]
pub enum GroupEvent {
    /// Backend data changed; subscribers should re-fetch and re-derive.
    Refresh,
    /// A contribution is being recorded; the view is not yet confirmed.
    Tentative(Box<GroupWithStats>),
    /// Freshly fetched view after a confirmed write.
    Confirmed(Box<GroupWithStats>),
}

/// Registry of broadcast channels keyed by group ID.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    channels: Arc<DashMap<Uuid, broadcast::Sender<GroupEvent>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events for a group.
    pub fn subscribe(&self, group_id: Uuid) -> broadcast::Receiver<GroupEvent> {
        self.channels
            .entry(group_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to a group's subscribers.
    ///
    /// Returns the number of subscribers reached. Channels with no remaining
    /// subscribers are dropped.
    pub fn publish(&self, group_id: Uuid, event: GroupEvent) -> usize {
        let delivered = match self.channels.get(&group_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => return 0,
        };

        if delivered == 0 {
            self.prune(group_id);
        }

        tracing::debug!(group_id = %group_id, delivered, "Published group event");
        delivered
    }

    /// Give back a receiver from [`subscribe`](Self::subscribe), dropping
    /// the group's channel if it was the last one.
    pub fn unsubscribe(&self, group_id: Uuid, rx: broadcast::Receiver<GroupEvent>) {
        drop(rx);
        self.prune(group_id);
    }

    fn prune(&self, group_id: Uuid) {
        self.channels.remove_if(&group_id, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of groups with an open channel.
    pub fn watched_groups(&self) -> usize {
        self.channels.len()
    }
}
