use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{FUND_STATUS_ACTIVE, FUND_STATUS_INACTIVE};
use crate::funds::FundError;

/// Lifecycle status of a fund. Only active funds participate in
/// portfolio completeness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundStatus {
    #[default]
    Active,
    Inactive,
}

impl FundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundStatus::Active => FUND_STATUS_ACTIVE,
            FundStatus::Inactive => FUND_STATUS_INACTIVE,
        }
    }
}

impl std::str::FromStr for FundStatus {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            FUND_STATUS_ACTIVE => Ok(FundStatus::Active),
            FUND_STATUS_INACTIVE => Ok(FundStatus::Inactive),
            other => Err(FundError::InvalidData(format!(
                "Unknown fund status '{}'",
                other
            ))),
        }
    }
}

/// Domain model representing a portfolio owning a set of funds
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Domain model representing a fund belonging to exactly one portfolio
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub status: FundStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Fund {
    pub fn is_active(&self) -> bool {
        self.status == FundStatus::Active
    }
}

/// Input model for creating a new fund
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFund {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub portfolio_id: String,
    pub name: String,
    pub status: FundStatus,
}

impl NewFund {
    /// Validates the new fund data
    pub fn validate(&self) -> Result<(), FundError> {
        if self.name.trim().is_empty() {
            return Err(FundError::InvalidData(
                "Fund name cannot be empty".to_string(),
            ));
        }
        if self.portfolio_id.trim().is_empty() {
            return Err(FundError::InvalidData(
                "Portfolio ID cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for portfolios
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioDb {
    pub id: String,
    pub name: String,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
    #[diesel(skip_insertion)]
    pub updated_at: NaiveDateTime,
}

/// Database model for funds
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::funds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundDb {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub status: String,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
    #[diesel(skip_insertion)]
    pub updated_at: NaiveDateTime,
}

impl From<PortfolioDb> for Portfolio {
    fn from(db: PortfolioDb) -> Self {
        Self {
            id: db.id,
            name: db.name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<FundDb> for Fund {
    fn from(db: FundDb) -> Self {
        let status = db.status.parse().unwrap_or(FundStatus::Inactive);
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            name: db.name,
            status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewFund> for FundDb {
    fn from(domain: NewFund) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            portfolio_id: domain.portfolio_id,
            name: domain.name,
            status: domain.status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
