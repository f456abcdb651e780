// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contribution model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Stored contribution row (`contributions` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    pub group_id: Uuid,
    /// Owning member's user ID
    pub user_id: Uuid,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
    /// Points awarded for this contribution (including streak bonus)
    #[serde(default)]
    pub points: i64,
    /// When the contribution was made (ISO 8601)
    pub created_at: String,
}

/// Contribution as submitted by a member.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewContribution {
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub note: Option<String>,
}

/// Edit of an existing contribution.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContributionUpdate {
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub note: Option<String>,
}

/// Fully resolved contribution handed to the backend.
///
/// Points and the member's new streak are computed here; the backend applies
/// them to the membership row in the same write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionRecord {
    pub group_id: Uuid,
    pub amount: f64,
    pub note: Option<String>,
    pub points: i64,
    pub streak_days: u32,
    pub contributed_on: NaiveDate,
}
