// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live group updates over server-sent events.
//!
//! A stream opens with a `snapshot` of the derived group (followed by a
//! `tentative` view if a contribution is already in flight), then carries
//! `tentative` views while a contribution is in flight and `update` views
//! whenever the group changes. Refresh notifications are turned into an
//! `update` by re-fetching as the subscriber, so row-level security still
//! applies to what each client sees.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::GroupWithStats;
use crate::routes::groups::load_group_view;
use crate::services::{GroupEvent, Session};
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::stream::{self, Stream};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/groups/{id}/events", get(group_events))
}

struct Subscription {
    state: Arc<AppState>,
    session: Session,
    group_id: Uuid,
    /// Taken back by `Drop` so the hub can prune the channel
    rx: Option<broadcast::Receiver<GroupEvent>>,
    /// Events sent before anything from the channel
    initial: VecDeque<Event>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(rx) = self.rx.take() {
            self.state.hub.unsubscribe(self.group_id, rx);
            tracing::debug!(group_id = %self.group_id, "Event stream closed");
        }
    }
}

fn view_event(name: &str, view: &GroupWithStats) -> Option<Event> {
    match Event::default().event(name).json_data(view) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode group event");
            None
        }
    }
}

async fn group_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let session = user.session();

    // Subscribe before the snapshot fetch so no change falls in between
    let rx = state.hub.subscribe(group_id);
    let view = match load_group_view(&state, &session, group_id).await {
        Ok(view) => view,
        Err(e) => {
            state.hub.unsubscribe(group_id, rx);
            return Err(e);
        }
    };

    let mut initial: VecDeque<Event> = view_event("snapshot", &view).into_iter().collect();
    // Late subscribers still see contributions that are in flight
    if let Some(Ok(tentative)) = state.views.tentative_view(group_id, today_utc()) {
        initial.extend(view_event("tentative", &tentative));
    }

    tracing::debug!(
        user_id = %user.user_id,
        group_id = %group_id,
        watched_groups = state.hub.watched_groups(),
        "Event stream opened"
    );

    let subscription = Subscription {
        initial,
        state,
        session,
        group_id,
        rx: Some(rx),
    };

    let stream = stream::unfold(subscription, |mut sub| async move {
        if let Some(event) = sub.initial.pop_front() {
            return Some((Ok::<Event, Infallible>(event), sub));
        }

        loop {
            let rx = sub.rx.as_mut()?;
            let event = match rx.recv().await {
                Ok(GroupEvent::Tentative(view)) => view_event("tentative", &view),
                Ok(GroupEvent::Confirmed(view)) => view_event("update", &view),
                // Missed events are covered by a fresh fetch
                Ok(GroupEvent::Refresh) | Err(RecvError::Lagged(_)) => {
                    match load_group_view(&sub.state, &sub.session, sub.group_id).await {
                        Ok(view) => view_event("update", &view),
                        Err(e) => {
                            tracing::info!(
                                group_id = %sub.group_id,
                                error = %e,
                                "Closing event stream"
                            );
                            return None;
                        }
                    }
                }
                Err(RecvError::Closed) => return None,
            };

            if let Some(event) = event {
                return Some((Ok::<Event, Infallible>(event), sub));
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
