use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;
use crate::irr::irr_model::{
    CalculationMode, DeletionCascadeOutcome, FundIrrValue, PortfolioIrrValue,
    RecalculationSummary, ValuationUpsertOutcome,
};
use crate::irr::solver::CashFlow;
use crate::valuations::NewFundValuation;

/// Trait defining the contract for fund IRR value repository operations.
pub trait FundIrrRepositoryTrait: Send + Sync {
    fn get_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<Option<FundIrrValue>>;
    /// Inserts the row, falling back to an in-place update when a
    /// concurrent writer already inserted for the same (fund_id, date).
    fn upsert(&self, value: FundIrrValue) -> Result<FundIrrValue>;
    /// Removes the row if present; returns whether a row was actually removed.
    fn delete_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<bool>;
    /// Distinct IRR dates >= `start_date` across `fund_ids`, ascending.
    fn get_dates_from(&self, fund_ids: &[String], start_date: NaiveDate)
        -> Result<Vec<NaiveDate>>;
}

/// Trait defining the contract for portfolio IRR value repository operations.
pub trait PortfolioIrrRepositoryTrait: Send + Sync {
    fn get_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<Option<PortfolioIrrValue>>;
    fn upsert(&self, value: PortfolioIrrValue) -> Result<PortfolioIrrValue>;
    fn delete_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool>;
    fn get_dates_from(&self, portfolio_id: &str, start_date: NaiveDate)
        -> Result<Vec<NaiveDate>>;
}

/// External IRR solver. Consumes an ordered cash-flow schedule plus the
/// terminal value on the target date and returns an annualized rate; the
/// engine treats it as a correct black box and only validates the result.
#[async_trait]
pub trait IrrSolverTrait: Send + Sync {
    async fn solve(
        &self,
        schedule: &[CashFlow],
        terminal_value: f64,
        terminal_date: NaiveDate,
    ) -> Result<f64>;
}

/// Read-cache consumed by external readers of IRR values. The engine only
/// ever invalidates it, after every successful fund- or portfolio-level
/// IRR write, so readers never observe stale values.
pub trait IrrCacheTrait: Send + Sync {
    /// Returns the number of entries removed.
    fn invalidate(&self, fund_ids: &[String]) -> usize;
    fn invalidate_all(&self) -> usize;
}

/// Determines whether every active fund of a portfolio has a valuation on
/// a given date.
pub trait CompletenessCheckerTrait: Send + Sync {
    fn is_complete(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool>;
    /// Simulates completeness as it will be immediately after
    /// `excluded_fund_id`'s valuation for `date` is deleted. Must be
    /// evaluated before the deletion actually happens.
    fn is_complete_after_removing(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        excluded_fund_id: &str,
    ) -> Result<bool>;
}

/// Computes and stores a single fund's IRR for one date.
#[async_trait]
pub trait FundIrrCalculatorTrait: Send + Sync {
    async fn compute_and_store(
        &self,
        fund_id: &str,
        date: NaiveDate,
        mode: CalculationMode,
    ) -> Result<FundIrrValue>;
    fn delete(&self, fund_id: &str, date: NaiveDate) -> Result<bool>;
}

/// Computes and stores one portfolio's IRR for one date. Callers must have
/// verified completeness before invoking the store path.
#[async_trait]
pub trait PortfolioIrrCalculatorTrait: Send + Sync {
    async fn compute_and_store(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        mode: CalculationMode,
    ) -> Result<PortfolioIrrValue>;
    /// Unconditional, idempotent delete of the portfolio IRR value and the
    /// portfolio valuation for the date. Exposed for cascade use.
    fn delete(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool>;
}

/// Reacts to a single fund valuation being deleted.
#[async_trait]
pub trait DeletionCascadeHandlerTrait: Send + Sync {
    async fn handle(&self, fund_valuation_id: &str) -> Result<DeletionCascadeOutcome>;
}

/// Reacts to one or more changed activity dates for a portfolio by
/// recomputing the affected date range.
#[async_trait]
pub trait ActivityBatchRecalculatorTrait: Send + Sync {
    async fn recalculate(
        &self,
        portfolio_id: &str,
        affected_dates: &[NaiveDate],
        mode: CalculationMode,
    ) -> Result<RecalculationSummary>;
}

/// Reacts to a single fund valuation being created or edited.
#[async_trait]
pub trait ValuationUpsertHandlerTrait: Send + Sync {
    async fn handle(
        &self,
        valuation: NewFundValuation,
        mode: CalculationMode,
    ) -> Result<ValuationUpsertOutcome>;
}

/// Reacts to a historical correction from a start date onward. Expensive;
/// not for routine single-activity edits.
#[async_trait]
pub trait HistoricalRecalculatorTrait: Send + Sync {
    async fn recalculate_from(
        &self,
        portfolio_id: &str,
        start_date: NaiveDate,
    ) -> Result<RecalculationSummary>;
}
