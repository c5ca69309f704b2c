use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_traits::CompletenessCheckerTrait;
use crate::valuations::FundValuationRepositoryTrait;

/// Decides whether a portfolio-level derived row may exist for a date:
/// every currently-active fund must have a valuation on that date. Excess
/// valuations from inactive funds never break completeness.
pub struct CompletenessChecker {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
}

impl CompletenessChecker {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
    ) -> Self {
        Self {
            fund_repository,
            fund_valuation_repository,
        }
    }

    fn check(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        excluded_fund_id: Option<&str>,
    ) -> Result<bool> {
        // The active set is read first, before any deletion the caller is
        // about to perform, so the simulation cannot race a status change
        // it has already observed.
        let active_funds = self.fund_repository.get_active_funds(portfolio_id)?;
        let active_ids: Vec<String> = active_funds.into_iter().map(|f| f.id).collect();

        let mut valued: HashSet<String> = self
            .fund_valuation_repository
            .get_valued_fund_ids(&active_ids, date)?
            .into_iter()
            .collect();

        if let Some(excluded) = excluded_fund_id {
            valued.remove(excluded);
        }

        Ok(active_ids.iter().all(|fund_id| valued.contains(fund_id)))
    }
}

impl CompletenessCheckerTrait for CompletenessChecker {
    fn is_complete(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool> {
        self.check(portfolio_id, date, None)
    }

    fn is_complete_after_removing(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        excluded_fund_id: &str,
    ) -> Result<bool> {
        self.check(portfolio_id, date, Some(excluded_fund_id))
    }
}
