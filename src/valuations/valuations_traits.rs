use chrono::NaiveDate;

use crate::errors::Result;
use crate::valuations::valuations_model::{FundValuation, NewFundValuation, PortfolioValuation};

/// Trait defining the contract for fund valuation repository operations.
pub trait FundValuationRepositoryTrait: Send + Sync {
    fn get_by_id(&self, valuation_id: &str) -> Result<FundValuation>;
    fn get_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<Option<FundValuation>>;
    /// Returns the subset of `fund_ids` that have a valuation on `date`.
    fn get_valued_fund_ids(&self, fund_ids: &[String], date: NaiveDate) -> Result<Vec<String>>;
    fn get_valuations_on_date(
        &self,
        fund_ids: &[String],
        date: NaiveDate,
    ) -> Result<Vec<FundValuation>>;
    /// Distinct valuation dates >= `start_date` across `fund_ids`, ascending.
    fn get_valuation_dates_from(
        &self,
        fund_ids: &[String],
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;
    /// Inserts the valuation, or updates the existing row for the same
    /// (fund_id, valuation_date) key.
    fn save(&self, valuation: NewFundValuation) -> Result<FundValuation>;
    /// Removes the row if present; returns whether a row was actually removed.
    fn delete_by_id(&self, valuation_id: &str) -> Result<bool>;
}

/// Trait defining the contract for portfolio valuation repository operations.
/// Portfolio valuations are derived rows owned by the IRR engine.
pub trait PortfolioValuationRepositoryTrait: Send + Sync {
    fn get_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<Option<PortfolioValuation>>;
    /// Replaces any existing row for the same (portfolio_id, valuation_date)
    /// key with the given valuation, in one transaction.
    fn replace(&self, valuation: PortfolioValuation) -> Result<PortfolioValuation>;
    /// Idempotent delete; returns whether a row was actually removed.
    fn delete_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool>;
}
