use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_model::{CalculationMode, DateFailure, RecalculationSummary};
use crate::irr::irr_traits::{
    ActivityBatchRecalculatorTrait, CompletenessCheckerTrait, FundIrrCalculatorTrait,
    PortfolioIrrCalculatorTrait,
};
use crate::valuations::FundValuationRepositoryTrait;

/// Recomputes the minimum downstream-affected date range after activity
/// changes. An activity dated X invalidates every IRR on or after X, so
/// the walk starts at the earliest affected date and only visits dates
/// that actually have fund valuations. Failures are isolated per date:
/// one bad date never rolls back or blocks the others.
pub struct ActivityBatchRecalculator {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
    completeness_checker: Arc<dyn CompletenessCheckerTrait>,
    fund_calculator: Arc<dyn FundIrrCalculatorTrait>,
    portfolio_calculator: Arc<dyn PortfolioIrrCalculatorTrait>,
}

impl ActivityBatchRecalculator {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_valuation_repository: Arc<dyn FundValuationRepositoryTrait>,
        completeness_checker: Arc<dyn CompletenessCheckerTrait>,
        fund_calculator: Arc<dyn FundIrrCalculatorTrait>,
        portfolio_calculator: Arc<dyn PortfolioIrrCalculatorTrait>,
    ) -> Self {
        Self {
            fund_repository,
            fund_valuation_repository,
            completeness_checker,
            fund_calculator,
            portfolio_calculator,
        }
    }

    async fn recalculate_date(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        active_ids: &[String],
        mode: CalculationMode,
        summary: &mut RecalculationSummary,
    ) -> Result<()> {
        let valued: HashSet<String> = self
            .fund_valuation_repository
            .get_valued_fund_ids(active_ids, date)?
            .into_iter()
            .collect();

        for fund_id in active_ids.iter().filter(|id| valued.contains(*id)) {
            match self
                .fund_calculator
                .compute_and_store(fund_id, date, mode)
                .await
            {
                Ok(_) => summary.fund_irr_recomputed += 1,
                Err(e) => {
                    // A rejected fund write skips that fund only; the date
                    // and the rest of the batch keep going
                    warn!("Fund {} IRR on {} not stored: {}", fund_id, date, e);
                    summary.failures.push(DateFailure {
                        date,
                        message: format!("fund {}: {}", fund_id, e),
                    });
                }
            }
        }

        if self.completeness_checker.is_complete(portfolio_id, date)? {
            match self
                .portfolio_calculator
                .compute_and_store(portfolio_id, date, mode)
                .await
            {
                Ok(_) => summary.portfolio_irr_recomputed += 1,
                Err(e) => {
                    warn!("Portfolio {} IRR on {} not stored: {}", portfolio_id, date, e);
                    summary.failures.push(DateFailure {
                        date,
                        message: format!("portfolio {}: {}", portfolio_id, e),
                    });
                }
            }
        } else if self.portfolio_calculator.delete(portfolio_id, date)? {
            // Stale derived rows for a now-incomplete date
            summary.portfolio_irr_deleted += 1;
        }

        Ok(())
    }
}

#[async_trait]
impl ActivityBatchRecalculatorTrait for ActivityBatchRecalculator {
    async fn recalculate(
        &self,
        portfolio_id: &str,
        affected_dates: &[NaiveDate],
        mode: CalculationMode,
    ) -> Result<RecalculationSummary> {
        let mut summary = RecalculationSummary::default();

        let earliest = match affected_dates.iter().min() {
            Some(earliest) => *earliest,
            None => return Ok(summary),
        };

        let all_funds = self.fund_repository.list_funds(portfolio_id)?;
        let all_ids: Vec<String> = all_funds.iter().map(|f| f.id.clone()).collect();
        let active_ids: Vec<String> = all_funds
            .iter()
            .filter(|f| f.is_active())
            .map(|f| f.id.clone())
            .collect();

        // Only dates that have at least one valuation can carry an IRR
        let dates = self
            .fund_valuation_repository
            .get_valuation_dates_from(&all_ids, earliest)?;
        let valued_dates: HashSet<NaiveDate> = dates.iter().copied().collect();

        for date in dates {
            if let Err(e) = self
                .recalculate_date(portfolio_id, date, &active_ids, mode, &mut summary)
                .await
            {
                warn!(
                    "Recalculation for portfolio {} on {} failed: {}",
                    portfolio_id, date, e
                );
                summary.failures.push(DateFailure {
                    date,
                    message: e.to_string(),
                });
            }
        }

        // Affected dates with no remaining valuations cannot satisfy
        // completeness; portfolio rows still sitting there are orphans
        let mut orphan_candidates: Vec<NaiveDate> = affected_dates
            .iter()
            .copied()
            .filter(|date| !valued_dates.contains(date))
            .collect();
        orphan_candidates.sort_unstable();
        orphan_candidates.dedup();
        for date in orphan_candidates {
            if !self.completeness_checker.is_complete(portfolio_id, date)?
                && self.portfolio_calculator.delete(portfolio_id, date)?
            {
                summary.portfolio_irr_deleted += 1;
            }
        }

        info!(
            "Recalculated portfolio {} from {}: {} fund IRRs, {} portfolio IRRs stored, {} deleted, {} failures",
            portfolio_id,
            earliest,
            summary.fund_irr_recomputed,
            summary.portfolio_irr_recomputed,
            summary.portfolio_irr_deleted,
            summary.failures.len()
        );
        Ok(summary)
    }
}
