use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::debug;
use num_traits::ToPrimitive;
use std::sync::Arc;

use crate::activities::ActivityRepositoryTrait;
use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_model::{CalculationMode, FundIrrValue};
use crate::irr::irr_traits::{FundIrrCalculatorTrait, FundIrrRepositoryTrait, IrrCacheTrait,
    IrrSolverTrait};
use crate::irr::numeric_guard;
use crate::irr::solver::build_schedule;
use crate::irr::IrrError;

/// Computes and stores one fund's IRR for one date, grounded on the fund's
/// valuation for that date.
pub struct FundIrrCalculator {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_valuation_repository: Arc<dyn crate::valuations::FundValuationRepositoryTrait>,
    activity_repository: Arc<dyn ActivityRepositoryTrait>,
    fund_irr_repository: Arc<dyn FundIrrRepositoryTrait>,
    solver: Arc<dyn IrrSolverTrait>,
    cache: Arc<dyn IrrCacheTrait>,
}

impl FundIrrCalculator {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_valuation_repository: Arc<dyn crate::valuations::FundValuationRepositoryTrait>,
        activity_repository: Arc<dyn ActivityRepositoryTrait>,
        fund_irr_repository: Arc<dyn FundIrrRepositoryTrait>,
        solver: Arc<dyn IrrSolverTrait>,
        cache: Arc<dyn IrrCacheTrait>,
    ) -> Self {
        Self {
            fund_repository,
            fund_valuation_repository,
            activity_repository,
            fund_irr_repository,
            solver,
            cache,
        }
    }
}

#[async_trait]
impl FundIrrCalculatorTrait for FundIrrCalculator {
    async fn compute_and_store(
        &self,
        fund_id: &str,
        date: NaiveDate,
        mode: CalculationMode,
    ) -> Result<FundIrrValue> {
        let fund = self.fund_repository.get_fund(fund_id)?;

        let valuation = self
            .fund_valuation_repository
            .get_by_key(fund_id, date)?
            .ok_or_else(|| {
                IrrError::NotFound(format!(
                    "No valuation for fund {} on {}; nothing to ground an IRR on",
                    fund_id, date
                ))
            })?;

        if mode == CalculationMode::UseCachedIfFresh {
            if let Some(existing) = self.fund_irr_repository.get_by_key(fund_id, date)? {
                // Fresh means grounded on the same valuation row AND computed
                // after its last edit; an in-place amount edit keeps the row id
                if existing.fund_valuation_id.as_deref() == Some(valuation.id.as_str())
                    && existing.calculated_at >= valuation.updated_at
                {
                    debug!(
                        "Stored IRR for fund {} on {} still grounded on valuation {}, reusing",
                        fund_id, date, valuation.id
                    );
                    return Ok(existing);
                }
            }
        }

        let activities = self.activity_repository.get_activities_up_to(fund_id, date)?;
        let schedule = build_schedule(&activities);
        let terminal_value = valuation.amount.to_f64().ok_or_else(|| {
            IrrError::CalculationRejected(format!(
                "Valuation amount {} is not representable as a float",
                valuation.amount
            ))
        })?;

        let rate = self.solver.solve(&schedule, terminal_value, date).await?;
        let rate = numeric_guard::validate(rate)?;

        let stored = self.fund_irr_repository.upsert(FundIrrValue {
            id: uuid::Uuid::new_v4().to_string(),
            fund_id: fund.id.clone(),
            irr_date: date,
            irr_result: rate,
            fund_valuation_id: Some(valuation.id),
            calculated_at: Utc::now(),
        })?;

        self.cache.invalidate(&[fund.id]);

        debug!(
            "Stored IRR {:.6} for fund {} on {}",
            stored.irr_result, fund_id, date
        );
        Ok(stored)
    }

    fn delete(&self, fund_id: &str, date: NaiveDate) -> Result<bool> {
        let removed = self.fund_irr_repository.delete_by_key(fund_id, date)?;
        if removed {
            self.cache.invalidate(&[fund_id.to_string()]);
        }
        Ok(removed)
    }
}
