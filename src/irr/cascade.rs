use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_model::DeletionCascadeOutcome;
use crate::irr::irr_traits::{
    CompletenessCheckerTrait, DeletionCascadeHandlerTrait, FundIrrCalculatorTrait,
    PortfolioIrrCalculatorTrait,
};
use crate::valuations::FundValuationRepositoryTrait;

/// Owns the deletion of a fund valuation and everything derived from it.
///
/// Ordering is load-bearing: derived rows are removed before the valuation
/// that grounded them, so no reader ever sees an IRR referencing a missing
/// valuation. Completeness after the removal is simulated up front, against
/// the active-fund set as it stands before the delete.
pub struct DeletionCascadeHandler {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
    fund_calculator: Arc<dyn FundIrrCalculatorTrait>,
    completeness_checker: Arc<dyn CompletenessCheckerTrait>,
    portfolio_calculator: Arc<dyn PortfolioIrrCalculatorTrait>,
}

impl DeletionCascadeHandler {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
        fund_calculator: Arc<dyn FundIrrCalculatorTrait>,
        completeness_checker: Arc<dyn CompletenessCheckerTrait>,
        portfolio_calculator: Arc<dyn PortfolioIrrCalculatorTrait>,
    ) -> Self {
        Self {
            fund_repository,
            fund_valuation_repository,
            fund_calculator,
            completeness_checker,
            portfolio_calculator,
        }
    }
}

#[async_trait]
impl DeletionCascadeHandlerTrait for DeletionCascadeHandler {
    async fn handle(&self, fund_valuation_id: &str) -> Result<DeletionCascadeOutcome> {
        let valuation = self.fund_valuation_repository.get_by_id(fund_valuation_id)?;
        let fund = self.fund_repository.get_fund(&valuation.fund_id)?;
        let date = valuation.valuation_date;

        // Non-fatal if the fund never had a derived IRR for this date
        let fund_irr_deleted = self.fund_calculator.delete(&fund.id, date)?;

        let still_complete = self.completeness_checker.is_complete_after_removing(
            &fund.portfolio_id,
            date,
            &fund.id,
        )?;

        let mut portfolio_cascaded = false;
        if !still_complete {
            // Losing this valuation breaks completeness; the portfolio's
            // derived rows for the date must go too
            self.portfolio_calculator.delete(&fund.portfolio_id, date)?;
            portfolio_cascaded = true;
        }

        // The grounding fact is removed last
        self.fund_valuation_repository.delete_by_id(fund_valuation_id)?;

        info!(
            "Deleted valuation {} for fund {} on {} (fund IRR removed: {}, portfolio cascade: {})",
            fund_valuation_id, fund.id, date, fund_irr_deleted, portfolio_cascaded
        );

        Ok(DeletionCascadeOutcome {
            fund_id: fund.id,
            portfolio_id: fund.portfolio_id,
            date,
            fund_irr_deleted,
            portfolio_cascaded,
        })
    }
}
