use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::activities::activities_model::{Activity, ActivityUpdate, NewActivity};
use crate::activities::activities_traits::{ActivityRepositoryTrait, ActivityServiceTrait};
use crate::errors::Result;
use crate::funds::FundRepositoryTrait;
use crate::irr::{ActivityBatchRecalculatorTrait, CalculationMode, RecalculationSummary};

/// Service for managing activities. Every mutation invalidates downstream
/// IRR values from the earliest affected date onward, so each write is
/// followed by a scoped batch recalculation of the owning portfolio.
pub struct ActivityService {
    activity_repository: Arc<dyn ActivityRepositoryTrait>,
    fund_repository: Arc<dyn FundRepositoryTrait>,
    batch_recalculator: Arc<dyn ActivityBatchRecalculatorTrait>,
}

impl ActivityService {
    /// Creates a new ActivityService instance with injected dependencies
    pub fn new(
        activity_repository: Arc<dyn ActivityRepositoryTrait>,
        fund_repository: Arc<dyn FundRepositoryTrait>,
        batch_recalculator: Arc<dyn ActivityBatchRecalculatorTrait>,
    ) -> Self {
        Self {
            activity_repository,
            fund_repository,
            batch_recalculator,
        }
    }

    fn portfolio_of(&self, fund_id: &str) -> Result<String> {
        Ok(self.fund_repository.get_fund(fund_id)?.portfolio_id)
    }
}

#[async_trait]
impl ActivityServiceTrait for ActivityService {
    fn get_activity(&self, activity_id: &str) -> Result<Activity> {
        self.activity_repository.get_by_id(activity_id)
    }

    /// Creates a new activity and recalculates IRRs from its date onward
    async fn create_activity(
        &self,
        new_activity: NewActivity,
        mode: CalculationMode,
    ) -> Result<(Activity, RecalculationSummary)> {
        let portfolio_id = self.portfolio_of(&new_activity.fund_id)?;
        let created = self.activity_repository.create(new_activity)?;

        let summary = self
            .batch_recalculator
            .recalculate(&portfolio_id, &[created.activity_date], mode)
            .await?;

        Ok((created, summary))
    }

    /// Updates an activity; both the old and the new date invalidate
    /// downstream IRR values
    async fn update_activity(
        &self,
        update: ActivityUpdate,
        mode: CalculationMode,
    ) -> Result<(Activity, RecalculationSummary)> {
        let existing = self.activity_repository.get_by_id(&update.id)?;
        let old_portfolio_id = self.portfolio_of(&existing.fund_id)?;

        let updated = self.activity_repository.update(update)?;
        let new_portfolio_id = self.portfolio_of(&updated.fund_id)?;

        let mut summary = self
            .batch_recalculator
            .recalculate(
                &new_portfolio_id,
                &[existing.activity_date, updated.activity_date],
                mode,
            )
            .await?;

        // An activity moved between funds can affect two portfolios
        if old_portfolio_id != new_portfolio_id {
            let other = self
                .batch_recalculator
                .recalculate(&old_portfolio_id, &[existing.activity_date], mode)
                .await?;
            summary.absorb(other);
        }

        Ok((updated, summary))
    }

    /// Deletes an activity and recalculates IRRs from its date onward
    async fn delete_activity(
        &self,
        activity_id: &str,
        mode: CalculationMode,
    ) -> Result<(Activity, RecalculationSummary)> {
        let deleted = self.activity_repository.delete(activity_id)?;
        let portfolio_id = self.portfolio_of(&deleted.fund_id)?;

        let summary = self
            .batch_recalculator
            .recalculate(&portfolio_id, &[deleted.activity_date], mode)
            .await?;

        Ok((deleted, summary))
    }

    /// Bulk import. The allocator reserving primary-key ranges lives with
    /// the ingestion pipeline; this service only consumes the affected
    /// (fund, date) pairs the batch exposes.
    async fn import_activities(
        &self,
        new_activities: Vec<NewActivity>,
        mode: CalculationMode,
    ) -> Result<RecalculationSummary> {
        let affected_pairs = self.activity_repository.create_batch(new_activities)?;
        debug!("Imported {} activities", affected_pairs.len());

        let mut dates_by_portfolio: HashMap<String, Vec<NaiveDate>> = HashMap::new();
        let mut portfolio_by_fund: HashMap<String, String> = HashMap::new();

        for (fund_id, date) in affected_pairs {
            let portfolio_id = match portfolio_by_fund.get(&fund_id) {
                Some(existing) => existing.clone(),
                None => {
                    let portfolio_id = self.portfolio_of(&fund_id)?;
                    portfolio_by_fund.insert(fund_id.clone(), portfolio_id.clone());
                    portfolio_id
                }
            };
            dates_by_portfolio.entry(portfolio_id).or_default().push(date);
        }

        let mut summary = RecalculationSummary::default();
        for (portfolio_id, dates) in dates_by_portfolio {
            let outcome = self
                .batch_recalculator
                .recalculate(&portfolio_id, &dates, mode)
                .await?;
            summary.absorb(outcome);
        }

        Ok(summary)
    }
}
