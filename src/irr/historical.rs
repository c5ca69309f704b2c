use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use std::sync::Arc;

use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::irr_model::{CalculationMode, RecalculationSummary};
use crate::irr::irr_traits::{
    ActivityBatchRecalculatorTrait, FundIrrRepositoryTrait, HistoricalRecalculatorTrait,
    PortfolioIrrRepositoryTrait,
};

/// Reacts to a historical correction by rebuilding derived IRRs from
/// `start_date` onward. The affected set is every date that currently has
/// a fund- or portfolio-level IRR row, fed to the batch recalculator as if
/// those dates were all activity-invalidated. This is the expensive path;
/// routine single-activity edits go through the batch recalculator
/// directly.
pub struct HistoricalRecalculator {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_irr_repository: Arc<dyn FundIrrRepositoryTrait>,
    portfolio_irr_repository: Arc<dyn PortfolioIrrRepositoryTrait>,
    batch_recalculator: Arc<dyn ActivityBatchRecalculatorTrait>,
}

impl HistoricalRecalculator {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_irr_repository: Arc<dyn FundIrrRepositoryTrait>,
        portfolio_irr_repository: Arc<dyn PortfolioIrrRepositoryTrait>,
        batch_recalculator: Arc<dyn ActivityBatchRecalculatorTrait>,
    ) -> Self {
        Self {
            fund_repository,
            fund_irr_repository,
            portfolio_irr_repository,
            batch_recalculator,
        }
    }
}

#[async_trait]
impl HistoricalRecalculatorTrait for HistoricalRecalculator {
    async fn recalculate_from(
        &self,
        portfolio_id: &str,
        start_date: NaiveDate,
    ) -> Result<RecalculationSummary> {
        let funds = self.fund_repository.list_funds(portfolio_id)?;
        let fund_ids: Vec<String> = funds.into_iter().map(|f| f.id).collect();

        let mut dates = self
            .fund_irr_repository
            .get_dates_from(&fund_ids, start_date)?;
        dates.extend(
            self.portfolio_irr_repository
                .get_dates_from(portfolio_id, start_date)?,
        );
        dates.sort_unstable();
        dates.dedup();

        if dates.is_empty() {
            return Ok(RecalculationSummary::default());
        }

        warn!(
            "Historical recalculation for portfolio {} from {}: {} dates to rebuild",
            portfolio_id,
            start_date,
            dates.len()
        );

        self.batch_recalculator
            .recalculate(portfolio_id, &dates, CalculationMode::ForceRecompute)
            .await
    }
}
