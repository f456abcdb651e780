// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod contribution;
pub mod gateway;
pub mod memory;
pub mod optimistic;
pub mod realtime;
pub mod supabase;

pub use contribution::{ContributionRecorder, RecordOutcome};
pub use gateway::{BackendError, BackendGateway, Session};
pub use memory::MemoryGateway;
pub use optimistic::GroupViewCache;
pub use realtime::{GroupEvent, RealtimeHub};
pub use supabase::SupabaseGateway;
