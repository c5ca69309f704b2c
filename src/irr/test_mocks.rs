//! Shared in-memory repository fakes for the IRR engine tests.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::activities::{
    Activity, ActivityError, ActivityRepositoryTrait, ActivityType, ActivityUpdate, NewActivity,
};
use crate::errors::Result;
use crate::funds::{Fund, FundError, FundRepositoryTrait, FundStatus, NewFund, Portfolio};
use crate::irr::batch::ActivityBatchRecalculator;
use crate::irr::cache::IrrReadCache;
use crate::irr::cascade::DeletionCascadeHandler;
use crate::irr::completeness::CompletenessChecker;
use crate::irr::fund_calculator::FundIrrCalculator;
use crate::irr::historical::HistoricalRecalculator;
use crate::irr::irr_model::{FundIrrValue, PortfolioIrrValue};
use crate::irr::irr_traits::{
    FundIrrRepositoryTrait, IrrSolverTrait, PortfolioIrrRepositoryTrait,
};
use crate::irr::portfolio_calculator::PortfolioIrrCalculator;
use crate::irr::solver::CashFlow;
use crate::irr::upsert::ValuationUpsertHandler;
use crate::irr::IrrError;
use crate::valuations::{
    FundValuation, FundValuationRepositoryTrait, NewFundValuation, PortfolioValuation,
    PortfolioValuationRepositoryTrait, ValuationError,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
pub struct MockFundRepository {
    portfolios: RwLock<HashMap<String, Portfolio>>,
    funds: RwLock<HashMap<String, Fund>>,
}

impl MockFundRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_portfolio(&self, id: &str) {
        let now = Utc::now().naive_utc();
        self.portfolios.write().unwrap().insert(
            id.to_string(),
            Portfolio {
                id: id.to_string(),
                name: format!("Portfolio {}", id),
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn add_fund(&self, id: &str, portfolio_id: &str, status: FundStatus) {
        let now = Utc::now().naive_utc();
        self.funds.write().unwrap().insert(
            id.to_string(),
            Fund {
                id: id.to_string(),
                portfolio_id: portfolio_id.to_string(),
                name: format!("Fund {}", id),
                status,
                created_at: now,
                updated_at: now,
            },
        );
    }
}

impl FundRepositoryTrait for MockFundRepository {
    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio> {
        self.portfolios
            .read()
            .unwrap()
            .get(portfolio_id)
            .cloned()
            .ok_or_else(|| {
                FundError::NotFound(format!("Portfolio with id {} not found", portfolio_id))
                    .into()
            })
    }

    fn get_fund(&self, fund_id: &str) -> Result<Fund> {
        self.funds
            .read()
            .unwrap()
            .get(fund_id)
            .cloned()
            .ok_or_else(|| {
                FundError::NotFound(format!("Fund with id {} not found", fund_id)).into()
            })
    }

    fn list_funds(&self, portfolio_id: &str) -> Result<Vec<Fund>> {
        let mut funds: Vec<Fund> = self
            .funds
            .read()
            .unwrap()
            .values()
            .filter(|f| f.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        funds.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(funds)
    }

    fn get_active_funds(&self, portfolio_id: &str) -> Result<Vec<Fund>> {
        Ok(self
            .list_funds(portfolio_id)?
            .into_iter()
            .filter(|f| f.is_active())
            .collect())
    }

    fn create_fund(&self, new_fund: NewFund) -> Result<Fund> {
        let id = new_fund
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.add_fund(&id, &new_fund.portfolio_id, new_fund.status);
        self.get_fund(&id)
    }

    fn update_fund_status(&self, fund_id: &str, new_status: FundStatus) -> Result<Fund> {
        let mut funds = self.funds.write().unwrap();
        let fund = funds.get_mut(fund_id).ok_or_else(|| {
            FundError::NotFound(format!("Fund with id {} not found", fund_id))
        })?;
        fund.status = new_status;
        Ok(fund.clone())
    }
}

#[derive(Default)]
pub struct MockFundValuationRepository {
    rows: RwLock<HashMap<String, FundValuation>>,
}

impl MockFundValuationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, fund_id: &str, date: NaiveDate, amount: Decimal) -> String {
        let id = format!("val-{}-{}", fund_id, date);
        let now = Utc::now();
        self.rows.write().unwrap().insert(
            id.clone(),
            FundValuation {
                id: id.clone(),
                fund_id: fund_id.to_string(),
                valuation_date: date,
                amount,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn contains(&self, valuation_id: &str) -> bool {
        self.rows.read().unwrap().contains_key(valuation_id)
    }
}

impl FundValuationRepositoryTrait for MockFundValuationRepository {
    fn get_by_id(&self, valuation_id: &str) -> Result<FundValuation> {
        self.rows
            .read()
            .unwrap()
            .get(valuation_id)
            .cloned()
            .ok_or_else(|| {
                ValuationError::NotFound(format!(
                    "Fund valuation with id {} not found",
                    valuation_id
                ))
                .into()
            })
    }

    fn get_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<Option<FundValuation>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|v| v.fund_id == fund_id && v.valuation_date == date)
            .cloned())
    }

    fn get_valued_fund_ids(&self, fund_ids: &[String], date: NaiveDate) -> Result<Vec<String>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|v| v.valuation_date == date && fund_ids.contains(&v.fund_id))
            .map(|v| v.fund_id.clone())
            .collect())
    }

    fn get_valuations_on_date(
        &self,
        fund_ids: &[String],
        date: NaiveDate,
    ) -> Result<Vec<FundValuation>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|v| v.valuation_date == date && fund_ids.contains(&v.fund_id))
            .cloned()
            .collect())
    }

    fn get_valuation_dates_from(
        &self,
        fund_ids: &[String],
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|v| v.valuation_date >= start_date && fund_ids.contains(&v.fund_id))
            .map(|v| v.valuation_date)
            .collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    fn save(&self, valuation: NewFundValuation) -> Result<FundValuation> {
        valuation.validate().map_err(crate::Error::Valuation)?;
        let mut rows = self.rows.write().unwrap();
        let now = Utc::now();

        let existing_id = rows
            .values()
            .find(|v| {
                v.fund_id == valuation.fund_id && v.valuation_date == valuation.valuation_date
            })
            .map(|v| v.id.clone());

        let id = existing_id.unwrap_or_else(|| {
            format!("val-{}-{}", valuation.fund_id, valuation.valuation_date)
        });
        let stored = match rows.get_mut(&id) {
            Some(existing) => {
                existing.amount = valuation.amount;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = FundValuation {
                    id: id.clone(),
                    fund_id: valuation.fund_id,
                    valuation_date: valuation.valuation_date,
                    amount: valuation.amount,
                    created_at: now,
                    updated_at: now,
                };
                rows.insert(id, row.clone());
                row
            }
        };
        Ok(stored)
    }

    fn delete_by_id(&self, valuation_id: &str) -> Result<bool> {
        Ok(self.rows.write().unwrap().remove(valuation_id).is_some())
    }
}

#[derive(Default)]
pub struct MockPortfolioValuationRepository {
    rows: RwLock<HashMap<(String, NaiveDate), PortfolioValuation>>,
}

impl MockPortfolioValuationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, portfolio_id: &str, date: NaiveDate) -> Option<PortfolioValuation> {
        self.rows
            .read()
            .unwrap()
            .get(&(portfolio_id.to_string(), date))
            .cloned()
    }
}

impl PortfolioValuationRepositoryTrait for MockPortfolioValuationRepository {
    fn get_by_key(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioValuation>> {
        Ok(self.get(portfolio_id, date))
    }

    fn replace(&self, valuation: PortfolioValuation) -> Result<PortfolioValuation> {
        self.rows.write().unwrap().insert(
            (valuation.portfolio_id.clone(), valuation.valuation_date),
            valuation.clone(),
        );
        Ok(valuation)
    }

    fn delete_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self
            .rows
            .write()
            .unwrap()
            .remove(&(portfolio_id.to_string(), date))
            .is_some())
    }
}

#[derive(Default)]
pub struct MockActivityRepository {
    rows: RwLock<HashMap<String, Activity>>,
}

impl MockActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        fund_id: &str,
        date: NaiveDate,
        activity_type: ActivityType,
        amount: Decimal,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.rows.write().unwrap().insert(
            id.clone(),
            Activity {
                id: id.clone(),
                fund_id: fund_id.to_string(),
                activity_type,
                activity_date: date,
                amount,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }
}

impl ActivityRepositoryTrait for MockActivityRepository {
    fn get_by_id(&self, activity_id: &str) -> Result<Activity> {
        self.rows
            .read()
            .unwrap()
            .get(activity_id)
            .cloned()
            .ok_or_else(|| {
                ActivityError::NotFound(format!("Activity with id {} not found", activity_id))
                    .into()
            })
    }

    fn get_activities_up_to(&self, fund_id: &str, date: NaiveDate) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|a| a.fund_id == fund_id && a.activity_date <= date)
            .cloned()
            .collect();
        activities.sort_by_key(|a| a.activity_date);
        Ok(activities)
    }

    fn get_activities_for_funds_up_to(
        &self,
        fund_ids: &[String],
        date: NaiveDate,
    ) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|a| a.activity_date <= date && fund_ids.contains(&a.fund_id))
            .cloned()
            .collect();
        activities.sort_by_key(|a| a.activity_date);
        Ok(activities)
    }

    fn create(&self, new_activity: NewActivity) -> Result<Activity> {
        new_activity.validate().map_err(crate::Error::Activity)?;
        let id = self.add(
            &new_activity.fund_id,
            new_activity.activity_date,
            new_activity.activity_type,
            new_activity.amount,
        );
        self.get_by_id(&id)
    }

    fn update(&self, update: ActivityUpdate) -> Result<Activity> {
        update.validate().map_err(crate::Error::Activity)?;
        let mut rows = self.rows.write().unwrap();
        let activity = rows.get_mut(&update.id).ok_or_else(|| {
            ActivityError::NotFound(format!("Activity with id {} not found", update.id))
        })?;
        activity.fund_id = update.fund_id;
        activity.activity_type = update.activity_type;
        activity.activity_date = update.activity_date;
        activity.amount = update.amount;
        activity.updated_at = Utc::now();
        Ok(activity.clone())
    }

    fn delete(&self, activity_id: &str) -> Result<Activity> {
        self.rows
            .write()
            .unwrap()
            .remove(activity_id)
            .ok_or_else(|| {
                ActivityError::NotFound(format!("Activity with id {} not found", activity_id))
                    .into()
            })
    }

    fn create_batch(
        &self,
        new_activities: Vec<NewActivity>,
    ) -> Result<Vec<(String, NaiveDate)>> {
        let mut affected = Vec::with_capacity(new_activities.len());
        for new_activity in new_activities {
            let created = self.create(new_activity)?;
            affected.push((created.fund_id, created.activity_date));
        }
        Ok(affected)
    }
}

#[derive(Default)]
pub struct MockFundIrrRepository {
    rows: RwLock<HashMap<(String, NaiveDate), FundIrrValue>>,
}

impl MockFundIrrRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fund_id: &str, date: NaiveDate) -> Option<FundIrrValue> {
        self.rows
            .read()
            .unwrap()
            .get(&(fund_id.to_string(), date))
            .cloned()
    }

    pub fn insert(&self, value: FundIrrValue) {
        self.rows
            .write()
            .unwrap()
            .insert((value.fund_id.clone(), value.irr_date), value);
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }
}

impl FundIrrRepositoryTrait for MockFundIrrRepository {
    fn get_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<Option<FundIrrValue>> {
        Ok(self.get(fund_id, date))
    }

    fn upsert(&self, value: FundIrrValue) -> Result<FundIrrValue> {
        let mut rows = self.rows.write().unwrap();
        let key = (value.fund_id.clone(), value.irr_date);
        let stored = match rows.get_mut(&key) {
            Some(existing) => {
                // Overwrite in place, keeping the original row identity
                existing.irr_result = value.irr_result;
                existing.fund_valuation_id = value.fund_valuation_id;
                existing.calculated_at = value.calculated_at;
                existing.clone()
            }
            None => {
                rows.insert(key, value.clone());
                value
            }
        };
        Ok(stored)
    }

    fn delete_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self
            .rows
            .write()
            .unwrap()
            .remove(&(fund_id.to_string(), date))
            .is_some())
    }

    fn get_dates_from(
        &self,
        fund_ids: &[String],
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|v| v.irr_date >= start_date && fund_ids.contains(&v.fund_id))
            .map(|v| v.irr_date)
            .collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }
}

#[derive(Default)]
pub struct MockPortfolioIrrRepository {
    rows: RwLock<HashMap<(String, NaiveDate), PortfolioIrrValue>>,
}

impl MockPortfolioIrrRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, portfolio_id: &str, date: NaiveDate) -> Option<PortfolioIrrValue> {
        self.rows
            .read()
            .unwrap()
            .get(&(portfolio_id.to_string(), date))
            .cloned()
    }

    pub fn insert(&self, value: PortfolioIrrValue) {
        self.rows
            .write()
            .unwrap()
            .insert((value.portfolio_id.clone(), value.irr_date), value);
    }
}

impl PortfolioIrrRepositoryTrait for MockPortfolioIrrRepository {
    fn get_by_key(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioIrrValue>> {
        Ok(self.get(portfolio_id, date))
    }

    fn upsert(&self, value: PortfolioIrrValue) -> Result<PortfolioIrrValue> {
        let mut rows = self.rows.write().unwrap();
        let key = (value.portfolio_id.clone(), value.irr_date);
        let stored = match rows.get_mut(&key) {
            Some(existing) => {
                existing.irr_result = value.irr_result;
                existing.portfolio_valuation_id = value.portfolio_valuation_id;
                existing.calculated_at = value.calculated_at;
                existing.clone()
            }
            None => {
                rows.insert(key, value.clone());
                value
            }
        };
        Ok(stored)
    }

    fn delete_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self
            .rows
            .write()
            .unwrap()
            .remove(&(portfolio_id.to_string(), date))
            .is_some())
    }

    fn get_dates_from(
        &self,
        portfolio_id: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|v| v.irr_date >= start_date && v.portfolio_id == portfolio_id)
            .map(|v| v.irr_date)
            .collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }
}

/// Solver stub returning a fixed rate, optionally failing for one
/// terminal date to exercise per-date isolation.
pub struct MockSolver {
    pub rate: f64,
    pub fail_on: Option<NaiveDate>,
}

impl MockSolver {
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate,
            fail_on: None,
        }
    }
}

#[async_trait]
impl IrrSolverTrait for MockSolver {
    async fn solve(
        &self,
        _schedule: &[CashFlow],
        _terminal_value: f64,
        terminal_date: NaiveDate,
    ) -> Result<f64> {
        if self.fail_on == Some(terminal_date) {
            return Err(IrrError::Unsolvable(format!(
                "induced failure on {}",
                terminal_date
            ))
            .into());
        }
        Ok(self.rate)
    }
}

/// Fully wired engine over in-memory repositories.
pub struct TestEngine {
    pub funds: Arc<MockFundRepository>,
    pub fund_valuations: Arc<MockFundValuationRepository>,
    pub portfolio_valuations: Arc<MockPortfolioValuationRepository>,
    pub activities: Arc<MockActivityRepository>,
    pub fund_irrs: Arc<MockFundIrrRepository>,
    pub portfolio_irrs: Arc<MockPortfolioIrrRepository>,
    pub cache: Arc<IrrReadCache>,
    pub completeness: Arc<CompletenessChecker>,
    pub fund_calculator: Arc<FundIrrCalculator>,
    pub portfolio_calculator: Arc<PortfolioIrrCalculator>,
    pub cascade: DeletionCascadeHandler,
    pub batch: Arc<ActivityBatchRecalculator>,
    pub upsert: ValuationUpsertHandler,
    pub historical: HistoricalRecalculator,
}

impl TestEngine {
    pub fn with_rate(rate: f64) -> Self {
        Self::new(MockSolver::with_rate(rate))
    }

    pub fn new(solver: MockSolver) -> Self {
        let funds = Arc::new(MockFundRepository::new());
        let fund_valuations = Arc::new(MockFundValuationRepository::new());
        let portfolio_valuations = Arc::new(MockPortfolioValuationRepository::new());
        let activities = Arc::new(MockActivityRepository::new());
        let fund_irrs = Arc::new(MockFundIrrRepository::new());
        let portfolio_irrs = Arc::new(MockPortfolioIrrRepository::new());
        let cache = Arc::new(IrrReadCache::new());
        let solver: Arc<dyn IrrSolverTrait> = Arc::new(solver);

        let completeness = Arc::new(CompletenessChecker::new(
            funds.clone(),
            fund_valuations.clone(),
        ));
        let fund_calculator = Arc::new(FundIrrCalculator::new(
            funds.clone(),
            fund_valuations.clone(),
            activities.clone(),
            fund_irrs.clone(),
            solver.clone(),
            cache.clone(),
        ));
        let portfolio_calculator = Arc::new(PortfolioIrrCalculator::new(
            funds.clone(),
            fund_valuations.clone(),
            portfolio_valuations.clone(),
            activities.clone(),
            portfolio_irrs.clone(),
            solver,
            cache.clone(),
        ));
        let cascade = DeletionCascadeHandler::new(
            funds.clone(),
            fund_valuations.clone(),
            fund_calculator.clone(),
            completeness.clone(),
            portfolio_calculator.clone(),
        );
        let batch = Arc::new(ActivityBatchRecalculator::new(
            funds.clone(),
            fund_valuations.clone(),
            completeness.clone(),
            fund_calculator.clone(),
            portfolio_calculator.clone(),
        ));
        let upsert = ValuationUpsertHandler::new(
            funds.clone(),
            fund_valuations.clone(),
            fund_calculator.clone(),
            completeness.clone(),
            portfolio_calculator.clone(),
        );
        let historical = HistoricalRecalculator::new(
            funds.clone(),
            fund_irrs.clone(),
            portfolio_irrs.clone(),
            batch.clone(),
        );

        Self {
            funds,
            fund_valuations,
            portfolio_valuations,
            activities,
            fund_irrs,
            portfolio_irrs,
            cache,
            completeness,
            fund_calculator,
            portfolio_calculator,
            cascade,
            batch,
            upsert,
            historical,
        }
    }
}
