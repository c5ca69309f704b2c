use async_trait::async_trait;
use chrono::NaiveDate;

use crate::activities::activities_model::{Activity, ActivityUpdate, NewActivity};
use crate::errors::Result;
use crate::irr::{CalculationMode, RecalculationSummary};

/// Trait defining the contract for activity repository operations.
pub trait ActivityRepositoryTrait: Send + Sync {
    fn get_by_id(&self, activity_id: &str) -> Result<Activity>;
    /// Activities for one fund dated on or before `date`, ascending by date.
    fn get_activities_up_to(&self, fund_id: &str, date: NaiveDate) -> Result<Vec<Activity>>;
    /// Activities across a fund set dated on or before `date`, ascending by date.
    fn get_activities_for_funds_up_to(
        &self,
        fund_ids: &[String],
        date: NaiveDate,
    ) -> Result<Vec<Activity>>;
    fn create(&self, new_activity: NewActivity) -> Result<Activity>;
    fn update(&self, update: ActivityUpdate) -> Result<Activity>;
    fn delete(&self, activity_id: &str) -> Result<Activity>;
    /// Bulk insert; returns the affected (fund_id, activity_date) pairs so
    /// the caller can feed them into the batch recalculator.
    fn create_batch(&self, new_activities: Vec<NewActivity>)
        -> Result<Vec<(String, NaiveDate)>>;
}

/// Trait defining the contract for activity service operations. Every
/// mutation triggers the downstream IRR recalculation for the affected
/// date range.
#[async_trait]
pub trait ActivityServiceTrait: Send + Sync {
    fn get_activity(&self, activity_id: &str) -> Result<Activity>;
    async fn create_activity(
        &self,
        new_activity: NewActivity,
        mode: CalculationMode,
    ) -> Result<(Activity, RecalculationSummary)>;
    async fn update_activity(
        &self,
        update: ActivityUpdate,
        mode: CalculationMode,
    ) -> Result<(Activity, RecalculationSummary)>;
    async fn delete_activity(
        &self,
        activity_id: &str,
        mode: CalculationMode,
    ) -> Result<(Activity, RecalculationSummary)>;
    async fn import_activities(
        &self,
        new_activities: Vec<NewActivity>,
        mode: CalculationMode,
    ) -> Result<RecalculationSummary>;
}
