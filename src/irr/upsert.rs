use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_model::{CalculationMode, ValuationUpsertOutcome};
use crate::irr::irr_traits::{
    CompletenessCheckerTrait, FundIrrCalculatorTrait, PortfolioIrrCalculatorTrait,
    ValuationUpsertHandlerTrait,
};
use crate::valuations::{FundValuationRepositoryTrait, NewFundValuation};

/// Reacts to a fund valuation being created or edited: stores the fact,
/// recomputes the fund's IRR, then either refreshes or clears the
/// portfolio-level derived rows depending on completeness. A portfolio
/// that was complete before (e.g. a fund has since been reactivated
/// without a valuation) loses its stale IRR here.
pub struct ValuationUpsertHandler {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
    fund_calculator: Arc<dyn FundIrrCalculatorTrait>,
    completeness_checker: Arc<dyn CompletenessCheckerTrait>,
    portfolio_calculator: Arc<dyn PortfolioIrrCalculatorTrait>,
}

impl ValuationUpsertHandler {
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
impl ValuationUpsertHandlerTrait for ValuationUpsertHandler {
    async fn handle(
        &self,
        valuation: NewFundValuation,
        mode: CalculationMode,
    ) -> Result<ValuationUpsertOutcome> {
        let fund = self.fund_repository.get_fund(&valuation.fund_id)?;
        let saved = self.fund_valuation_repository.save(valuation)?;
        let date = saved.valuation_date;

        let fund_irr = self
            .fund_calculator
            .compute_and_store(&fund.id, date, mode)
            .await?;

        let portfolio_complete = self
            .completeness_checker
            .is_complete(&fund.portfolio_id, date)?;

        let mut portfolio_irr = None;
        let mut portfolio_irr_deleted = false;
        if portfolio_complete {
            let stored = self
                .portfolio_calculator
                .compute_and_store(&fund.portfolio_id, date, mode)
                .await?;
            portfolio_irr = Some(stored.irr_result);
        } else {
            portfolio_irr_deleted = self
                .portfolio_calculator
                .delete(&fund.portfolio_id, date)?;
        }

        debug!(
            "Upserted valuation for fund {} on {} (complete: {}, portfolio IRR: {:?})",
            fund.id, date, portfolio_complete, portfolio_irr
        );

        Ok(ValuationUpsertOutcome {
            fund_id: fund.id,
            portfolio_id: fund.portfolio_id,
            date,
            fund_irr: fund_irr.irr_result,
            portfolio_complete,
            portfolio_irr,
            portfolio_irr_deleted,
        })
    }
}
