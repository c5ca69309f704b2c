use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::activities::ActivityError;
use crate::constants::DECIMAL_PRECISION;

/// Kind of cash-flow event feeding the IRR solver's schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Investment,
    Withdrawal,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Investment => "INVESTMENT",
            ActivityType::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVESTMENT" => Ok(ActivityType::Investment),
            "WITHDRAWAL" => Ok(ActivityType::Withdrawal),
            other => Err(ActivityError::InvalidData(format!(
                "Unknown activity type '{}'",
                other
            ))),
        }
    }
}

/// Domain model for a cash-flow event on a fund
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub fund_id: String,
    pub activity_type: ActivityType,
    pub activity_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Amount as seen from the investor's side of the schedule:
    /// investments are outflows, withdrawals are inflows.
    pub fn signed_amount(&self) -> Decimal {
        match self.activity_type {
            ActivityType::Investment => -self.amount,
            ActivityType::Withdrawal => self.amount,
        }
    }
}

/// Input model for creating a new activity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fund_id: String,
    pub activity_type: ActivityType,
    pub activity_date: NaiveDate,
    pub amount: Decimal,
}

impl NewActivity {
    /// Validates the new activity data
    pub fn validate(&self) -> Result<(), ActivityError> {
        if self.fund_id.trim().is_empty() {
            return Err(ActivityError::InvalidData(
                "Fund ID cannot be empty".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(ActivityError::InvalidData(
                "Activity amount must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input model for updating an existing activity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUpdate {
    pub id: String,
    pub fund_id: String,
    pub activity_type: ActivityType,
    pub activity_date: NaiveDate,
    pub amount: Decimal,
}

impl ActivityUpdate {
    /// Validates the activity update data
    pub fn validate(&self) -> Result<(), ActivityError> {
        if self.id.trim().is_empty() {
            return Err(ActivityError::InvalidData(
                "Activity ID is required for updates".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(ActivityError::InvalidData(
                "Activity amount must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for activities
#[derive(Debug, Clone, PartialEq, Queryable, QueryableByName, Insertable)]
#[diesel(table_name = crate::schema::activities)]
pub struct ActivityDb {
    pub id: String,
    pub fund_id: String,
    pub activity_type: String,
    pub activity_date: NaiveDate,
    pub amount: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Activity> for ActivityDb {
    fn from(value: Activity) -> Self {
        ActivityDb {
            id: value.id,
            fund_id: value.fund_id,
            activity_type: value.activity_type.as_str().to_string(),
            activity_date: value.activity_date,
            amount: value.amount.round_dp(DECIMAL_PRECISION).to_string(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

impl From<ActivityDb> for Activity {
    fn from(value: ActivityDb) -> Self {
        let activity_type = value
            .activity_type
            .parse()
            .unwrap_or(ActivityType::Investment);
        Activity {
            id: value.id,
            fund_id: value.fund_id,
            activity_type,
            activity_date: value.activity_date,
            amount: Decimal::from_str(&value.amount).unwrap_or_default(),
            created_at: crate::valuations::valuations_model::parse_rfc3339(&value.created_at),
            updated_at: crate::valuations::valuations_model::parse_rfc3339(&value.updated_at),
        }
    }
}
