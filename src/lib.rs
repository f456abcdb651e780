// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GoalCrew: shared savings goals for small groups
//!
//! This crate provides the API gateway in front of the managed backend and
//! derives the progress statistics every group view is built from.

pub mod config;
pub mod error;
pub mod format;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use services::{BackendGateway, ContributionRecorder, GroupViewCache, RealtimeHub};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn BackendGateway>,
    pub hub: RealtimeHub,
    pub views: GroupViewCache,
    pub recorder: ContributionRecorder,
}

impl AppState {
    /// Wire the shared services around a backend gateway.
    pub fn new(config: Config, gateway: Arc<dyn BackendGateway>) -> Self {
        let hub = RealtimeHub::new();
        let views = GroupViewCache::new();
        let recorder = ContributionRecorder::new(gateway.clone(), views.clone(), hub.clone());
        Self {
            config,
            gateway,
            hub,
            views,
            recorder,
        }
    }
}
