use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::valuations::valuations_model::parse_rfc3339;

/// Controls how calculators treat previously stored results. Passed once at
/// the entry point of each trigger instead of threading bypass flags
/// through every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalculationMode {
    /// Reuse a stored IRR when it is still grounded on the current
    /// valuation row and was computed after that row's last edit.
    UseCachedIfFresh,
    /// Always rebuild the schedule and re-run the solver.
    ForceRecompute,
}

/// Derived IRR for one fund on one date. Never exists without a fund
/// valuation logically backing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundIrrValue {
    pub id: String,
    pub fund_id: String,
    pub irr_date: NaiveDate,
    pub irr_result: f64,
    /// The fund valuation this result was computed against.
    pub fund_valuation_id: Option<String>,
    pub calculated_at: DateTime<Utc>,
}

/// Derived IRR for one portfolio on one date. Exists only while the
/// portfolio is complete on that date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioIrrValue {
    pub id: String,
    pub portfolio_id: String,
    pub irr_date: NaiveDate,
    pub irr_result: f64,
    /// The portfolio valuation this result was computed against.
    pub portfolio_valuation_id: Option<String>,
    pub calculated_at: DateTime<Utc>,
}

/// Database model for fund IRR values
#[derive(Debug, Clone, PartialEq, Queryable, QueryableByName, Insertable)]
#[diesel(table_name = crate::schema::fund_irr_values)]
pub struct FundIrrValueDb {
    pub id: String,
    pub fund_id: String,
    pub irr_date: NaiveDate,
    pub irr_result: f64,
    pub fund_valuation_id: Option<String>,
    pub calculated_at: String,
}

/// Database model for portfolio IRR values
#[derive(Debug, Clone, PartialEq, Queryable, QueryableByName, Insertable)]
#[diesel(table_name = crate::schema::portfolio_irr_values)]
pub struct PortfolioIrrValueDb {
    pub id: String,
    pub portfolio_id: String,
    pub irr_date: NaiveDate,
    pub irr_result: f64,
    pub portfolio_valuation_id: Option<String>,
    pub calculated_at: String,
}

impl From<FundIrrValue> for FundIrrValueDb {
    fn from(value: FundIrrValue) -> Self {
        FundIrrValueDb {
            id: value.id,
            fund_id: value.fund_id,
            irr_date: value.irr_date,
            irr_result: value.irr_result,
            fund_valuation_id: value.fund_valuation_id,
            calculated_at: value.calculated_at.to_rfc3339(),
        }
    }
}

impl From<FundIrrValueDb> for FundIrrValue {
    fn from(value: FundIrrValueDb) -> Self {
        FundIrrValue {
            id: value.id,
            fund_id: value.fund_id,
            irr_date: value.irr_date,
            irr_result: value.irr_result,
            fund_valuation_id: value.fund_valuation_id,
            calculated_at: parse_rfc3339(&value.calculated_at),
        }
    }
}

impl From<PortfolioIrrValue> for PortfolioIrrValueDb {
    fn from(value: PortfolioIrrValue) -> Self {
        PortfolioIrrValueDb {
            id: value.id,
            portfolio_id: value.portfolio_id,
            irr_date: value.irr_date,
            irr_result: value.irr_result,
            portfolio_valuation_id: value.portfolio_valuation_id,
            calculated_at: value.calculated_at.to_rfc3339(),
        }
    }
}

impl From<PortfolioIrrValueDb> for PortfolioIrrValue {
    fn from(value: PortfolioIrrValueDb) -> Self {
        PortfolioIrrValue {
            id: value.id,
            portfolio_id: value.portfolio_id,
            irr_date: value.irr_date,
            irr_result: value.irr_result,
            portfolio_valuation_id: value.portfolio_valuation_id,
            calculated_at: parse_rfc3339(&value.calculated_at),
        }
    }
}

/// One date the batch recalculator could not fully process. The batch
/// continues past it; callers decide what to surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateFailure {
    pub date: NaiveDate,
    pub message: String,
}

/// Aggregated result of a batch recalculation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationSummary {
    pub fund_irr_recomputed: usize,
    pub portfolio_irr_recomputed: usize,
    pub portfolio_irr_deleted: usize,
    pub failures: Vec<DateFailure>,
}

impl RecalculationSummary {
    /// Folds another summary into this one (multi-portfolio imports).
    pub fn absorb(&mut self, other: RecalculationSummary) {
        self.fund_irr_recomputed += other.fund_irr_recomputed;
        self.portfolio_irr_recomputed += other.portfolio_irr_recomputed;
        self.portfolio_irr_deleted += other.portfolio_irr_deleted;
        self.failures.extend(other.failures);
    }
}

/// Structured result of a fund valuation deletion cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCascadeOutcome {
    pub fund_id: String,
    pub portfolio_id: String,
    pub date: NaiveDate,
    pub fund_irr_deleted: bool,
    /// True when losing this valuation broke completeness and the
    /// portfolio-level derived rows were removed as well.
    pub portfolio_cascaded: bool,
}

/// Structured result of a fund valuation create/edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationUpsertOutcome {
    pub fund_id: String,
    pub portfolio_id: String,
    pub date: NaiveDate,
    pub fund_irr: f64,
    pub portfolio_complete: bool,
    pub portfolio_irr: Option<f64>,
    pub portfolio_irr_deleted: bool,
}
