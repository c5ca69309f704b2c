use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::activities::ActivityRepositoryTrait;
use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_model::{CalculationMode, PortfolioIrrValue};
use crate::irr::irr_traits::{
    IrrCacheTrait, IrrSolverTrait, PortfolioIrrCalculatorTrait, PortfolioIrrRepositoryTrait,
};
use crate::irr::numeric_guard;
use crate::irr::solver::build_schedule;
use crate::irr::IrrError;
use crate::valuations::{
    FundValuationRepositoryTrait, PortfolioValuation, PortfolioValuationRepositoryTrait,
};

/// Computes and stores one portfolio's IRR for one date. The store path is
/// completeness-gated: callers must have verified completeness first, so
/// the sum of active funds' valuations here is total portfolio value.
pub struct PortfolioIrrCalculator {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
    portfolio_valuation_repository: Arc<dyn PortfolioValuationRepositoryTrait>,
    activity_repository: Arc<dyn ActivityRepositoryTrait>,
    portfolio_irr_repository: Arc<dyn PortfolioIrrRepositoryTrait>,
    solver: Arc<dyn IrrSolverTrait>,
    cache: Arc<dyn IrrCacheTrait>,
}

impl PortfolioIrrCalculator {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
        portfolio_valuation_repository: Arc<dyn PortfolioValuationRepositoryTrait>,
        activity_repository: Arc<dyn ActivityRepositoryTrait>,
        portfolio_irr_repository: Arc<dyn PortfolioIrrRepositoryTrait>,
        solver: Arc<dyn IrrSolverTrait>,
        cache: Arc<dyn IrrCacheTrait>,
    ) -> Self {
        Self {
            fund_repository,
            fund_valuation_repository,
            portfolio_valuation_repository,
            activity_repository,
            portfolio_irr_repository,
            solver,
            cache,
        }
    }
}

#[async_trait]
impl PortfolioIrrCalculatorTrait for PortfolioIrrCalculator {
    async fn compute_and_store(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        mode: CalculationMode,
    ) -> Result<PortfolioIrrValue> {
        let portfolio = self.fund_repository.get_portfolio(portfolio_id)?;
        let active_funds = self.fund_repository.get_active_funds(portfolio_id)?;
        let active_ids: Vec<String> = active_funds.into_iter().map(|f| f.id).collect();

        let valuations = self
            .fund_valuation_repository
            .get_valuations_on_date(&active_ids, date)?;
        let total: Decimal = valuations.iter().map(|v| v.amount).sum();

        if mode == CalculationMode::UseCachedIfFresh {
            let existing_valuation = self
                .portfolio_valuation_repository
                .get_by_key(portfolio_id, date)?;
            if let (Some(pv), Some(existing)) = (
                existing_valuation,
                self.portfolio_irr_repository.get_by_key(portfolio_id, date)?,
            ) {
                if pv.amount == total
                    && existing.portfolio_valuation_id.as_deref() == Some(pv.id.as_str())
                {
                    debug!(
                        "Stored IRR for portfolio {} on {} still grounded on valuation {}, reusing",
                        portfolio_id, date, pv.id
                    );
                    return Ok(existing);
                }
            }
        }

        let activities = self
            .activity_repository
            .get_activities_for_funds_up_to(&active_ids, date)?;
        let schedule = build_schedule(&activities);
        let terminal_value = total.to_f64().ok_or_else(|| {
            IrrError::CalculationRejected(format!(
                "Portfolio valuation amount {} is not representable as a float",
                total
            ))
        })?;

        // Solve and validate before touching any prior derived row; a
        // rejected rate must leave the date's state exactly as it was
        let rate = self.solver.solve(&schedule, terminal_value, date).await?;
        let rate = numeric_guard::validate(rate)?;

        // Overwrite in place: one portfolio valuation per (portfolio, date)
        let portfolio_valuation = self.portfolio_valuation_repository.replace(
            PortfolioValuation {
                id: uuid::Uuid::new_v4().to_string(),
                portfolio_id: portfolio.id.clone(),
                valuation_date: date,
                amount: total,
                calculated_at: Utc::now(),
            },
        )?;

        let stored = self.portfolio_irr_repository.upsert(PortfolioIrrValue {
            id: uuid::Uuid::new_v4().to_string(),
            portfolio_id: portfolio.id,
            irr_date: date,
            irr_result: rate,
            portfolio_valuation_id: Some(portfolio_valuation.id),
            calculated_at: Utc::now(),
        })?;

        self.cache.invalidate(&active_ids);

        debug!(
            "Stored IRR {:.6} for portfolio {} on {}",
            stored.irr_result, portfolio_id, date
        );
        Ok(stored)
    }

    fn delete(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool> {
        // The IRR row references the valuation, so it goes first
        let irr_removed = self
            .portfolio_irr_repository
            .delete_by_key(portfolio_id, date)?;
        let valuation_removed = self
            .portfolio_valuation_repository
            .delete_by_key(portfolio_id, date)?;

        let removed = irr_removed || valuation_removed;
        if removed {
            let active_funds = self.fund_repository.get_active_funds(portfolio_id)?;
            let active_ids: Vec<String> = active_funds.into_iter().map(|f| f.id).collect();
            self.cache.invalidate(&active_ids);
            debug!(
                "Deleted derived portfolio rows for {} on {}",
                portfolio_id, date
            );
        }
        Ok(removed)
    }
}
