use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;
use crate::valuations::ValuationError;

/// A point-in-time monetary value of a single fund. Entered and edited by
/// the external valuation workflow; at most one per (fund_id, date).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundValuation {
    pub id: String,
    pub fund_id: String,
    pub valuation_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for creating or editing a fund valuation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFundValuation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fund_id: String,
    pub valuation_date: NaiveDate,
    pub amount: Decimal,
}

impl NewFundValuation {
    /// Validates the valuation data
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.fund_id.trim().is_empty() {
            return Err(ValuationError::InvalidData(
                "Fund ID cannot be empty".to_string(),
            ));
        }
        if self.amount < Decimal::ZERO {
            return Err(ValuationError::InvalidData(
                "Valuation amount cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Derived sum of all active funds' valuations for a portfolio on one date.
/// Exists only while the portfolio is complete on that date; owned entirely
/// by the IRR engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub id: String,
    pub portfolio_id: String,
    pub valuation_date: NaiveDate,
    pub amount: Decimal,
    pub calculated_at: DateTime<Utc>,
}

/// Database model for fund valuations
#[derive(Debug, Clone, PartialEq, Queryable, QueryableByName, Insertable)]
#[diesel(table_name = crate::schema::fund_valuations)]
pub struct FundValuationDb {
    pub id: String,
    pub fund_id: String,
    pub valuation_date: NaiveDate,
    pub amount: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database model for portfolio valuations
#[derive(Debug, Clone, PartialEq, Queryable, QueryableByName, Insertable)]
#[diesel(table_name = crate::schema::portfolio_valuations)]
pub struct PortfolioValuationDb {
    pub id: String,
    pub portfolio_id: String,
    pub valuation_date: NaiveDate,
    pub amount: String,
    pub calculated_at: String,
}

impl From<FundValuation> for FundValuationDb {
    fn from(value: FundValuation) -> Self {
        FundValuationDb {
            id: value.id,
            fund_id: value.fund_id,
            valuation_date: value.valuation_date,
            amount: value.amount.round_dp(DECIMAL_PRECISION).to_string(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

impl From<FundValuationDb> for FundValuation {
    fn from(value: FundValuationDb) -> Self {
        FundValuation {
            id: value.id,
            fund_id: value.fund_id,
            valuation_date: value.valuation_date,
            amount: Decimal::from_str(&value.amount).unwrap_or_default(),
            created_at: parse_rfc3339(&value.created_at),
            updated_at: parse_rfc3339(&value.updated_at),
        }
    }
}

impl From<PortfolioValuation> for PortfolioValuationDb {
    fn from(value: PortfolioValuation) -> Self {
        PortfolioValuationDb {
            id: value.id,
            portfolio_id: value.portfolio_id,
            valuation_date: value.valuation_date,
            amount: value.amount.round_dp(DECIMAL_PRECISION).to_string(),
            calculated_at: value.calculated_at.to_rfc3339(),
        }
    }
}

impl From<PortfolioValuationDb> for PortfolioValuation {
    fn from(value: PortfolioValuationDb) -> Self {
        PortfolioValuation {
            id: value.id,
            portfolio_id: value.portfolio_id,
            valuation_date: value.valuation_date,
            amount: Decimal::from_str(&value.amount).unwrap_or_default(),
            calculated_at: parse_rfc3339(&value.calculated_at),
        }
    }
}

pub(crate) fn parse_rfc3339(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
