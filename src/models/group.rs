// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Savings group model as returned by the backend.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Contribution, GroupMember};

/// Fallback period length for `custom` groups with no usable day count.
pub const DEFAULT_CUSTOM_FREQUENCY_DAYS: i64 = 7;

/// Contribution cadence of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Custom,
}

impl Frequency {
    /// Length of one period in days.
    ///
    /// `custom_days` is only consulted for [`Frequency::Custom`]; absent or
    /// non-positive values fall back to a week.
    pub fn period_days(self, custom_days: Option<i64>) -> i64 {
        match self {
            Frequency::Daily => 1,
            Frequency::Weekly => 7,
            Frequency::Biweekly => 14,
            Frequency::Monthly => 30,
            Frequency::Custom => custom_days
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_CUSTOM_FREQUENCY_DAYS),
        }
    }
}

/// How the group goal is split between members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum DivisionType {
    /// Every member saves toward the group goal.
    Equal,
    /// Members set their own individual goals.
    Custom,
}

/// Group row (`groups` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    /// Icon tag shown next to the group name
    #[serde(default)]
    pub emoji: Option<String>,
    /// Calendar date the group saves toward (ISO 8601 date)
    pub deadline: String,
    /// Per-person target in the group's native currency
    pub goal_amount: f64,
    pub frequency: Frequency,
    #[serde(default)]
    pub custom_frequency_days: Option<i64>,
    pub division_type: DivisionType,
    pub invite_code: String,
    /// Owning user
    pub created_by: Uuid,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl Group {
    /// Period length in days for this group's cadence.
    pub fn frequency_days(&self) -> i64 {
        self.frequency.period_days(self.custom_frequency_days)
    }
}

/// Group with its nested members and contributions, as fetched in one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGroup {
    #[serde(flatten)]
    pub group: Group,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl RawGroup {
    /// Find the membership row for a user.
    pub fn member(&self, user_id: Uuid) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

/// Payload for creating a group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_custom_frequency"))]
pub struct NewGroup {
    #[validate(length(min = 1, max = 60))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 16))]
    pub emoji: Option<String>,
    /// ISO 8601 date
    pub deadline: String,
    #[validate(range(exclusive_min = 0.0))]
    pub goal_amount: f64,
    pub frequency: Frequency,
    #[serde(default)]
    #[validate(range(min = 1, max = 365))]
    pub custom_frequency_days: Option<i64>,
    pub division_type: DivisionType,
}

/// Partial update of a group (creator only).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GroupUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 60))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 16))]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0))]
    pub goal_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 365))]
    pub custom_frequency_days: Option<i64>,
}

impl GroupUpdate {
    /// Apply the present fields to a group row.
    pub fn apply_to(&self, group: &mut Group) {
        if let Some(name) = &self.name {
            group.name = name.clone();
        }
        if let Some(emoji) = &self.emoji {
            group.emoji = Some(emoji.clone());
        }
        if let Some(deadline) = &self.deadline {
            group.deadline = deadline.clone();
        }
        if let Some(goal_amount) = self.goal_amount {
            group.goal_amount = goal_amount;
        }
        if let Some(frequency) = self.frequency {
            group.frequency = frequency;
        }
        if let Some(days) = self.custom_frequency_days {
            group.custom_frequency_days = Some(days);
        }
    }
}

fn validate_custom_frequency(group: &NewGroup) -> Result<(), ValidationError> {
    if group.frequency == Frequency::Custom && group.custom_frequency_days.is_none() {
        return Err(ValidationError::new("custom_frequency_days_required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_group(frequency: Frequency, custom: Option<i64>) -> NewGroup {
        NewGroup {
            name: "Trip to Lisbon".to_string(),
            emoji: Some("✈️".to_string()),
            deadline: "2026-12-31".to_string(),
            goal_amount: 500.0,
            frequency,
            custom_frequency_days: custom,
            division_type: DivisionType::Equal,
        }
    }

    #[test]
    fn test_period_days_fixed_cadences() {
        assert_eq!(Frequency::Daily.period_days(None), 1);
        assert_eq!(Frequency::Weekly.period_days(Some(3)), 7);
        assert_eq!(Frequency::Biweekly.period_days(None), 14);
        assert_eq!(Frequency::Monthly.period_days(None), 30);
    }

    #[test]
    fn test_period_days_custom_fallback() {
        assert_eq!(Frequency::Custom.period_days(Some(10)), 10);
        assert_eq!(Frequency::Custom.period_days(None), 7);
        assert_eq!(Frequency::Custom.period_days(Some(0)), 7);
        assert_eq!(Frequency::Custom.period_days(Some(-4)), 7);
    }

    #[test]
    fn test_frequency_wire_format() {
        let json = serde_json::to_string(&Frequency::Biweekly).unwrap();
        assert_eq!(json, "\"biweekly\"");
        let parsed: DivisionType = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(parsed, DivisionType::Custom);
    }

    #[test]
    fn test_new_group_validation() {
        assert!(new_group(Frequency::Weekly, None).validate().is_ok());
        assert!(new_group(Frequency::Custom, Some(10)).validate().is_ok());
        assert!(new_group(Frequency::Custom, None).validate().is_err());
        assert!(new_group(Frequency::Custom, Some(0)).validate().is_err());

        let mut zero_goal = new_group(Frequency::Weekly, None);
        zero_goal.goal_amount = 0.0;
        assert!(zero_goal.validate().is_err());

        let mut empty_name = new_group(Frequency::Weekly, None);
        empty_name.name = String::new();
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_group_update_applies_present_fields_only() {
        let mut group = Group {
            id: Uuid::new_v4(),
            name: "Old".to_string(),
            emoji: None,
            deadline: "2026-12-31".to_string(),
            goal_amount: 100.0,
            frequency: Frequency::Weekly,
            custom_frequency_days: None,
            division_type: DivisionType::Equal,
            invite_code: "ABCD1234".to_string(),
            created_by: Uuid::new_v4(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        GroupUpdate {
            name: Some("New".to_string()),
            goal_amount: Some(250.0),
            ..Default::default()
        }
        .apply_to(&mut group);

        assert_eq!(group.name, "New");
        assert_eq!(group.goal_amount, 250.0);
        assert_eq!(group.deadline, "2026-12-31");
        assert_eq!(group.frequency, Frequency::Weekly);
    }
}
