use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::funds::funds_model::{Fund, FundDb, FundStatus, NewFund, Portfolio, PortfolioDb};
use crate::funds::funds_traits::FundRepositoryTrait;
use crate::funds::FundError;
use crate::schema::{funds, portfolios};

/// Repository for managing fund and portfolio data in the database
pub struct FundRepository {
    pool: Arc<DbPool>,
}

impl FundRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl FundRepositoryTrait for FundRepository {
    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;

        let portfolio = portfolios::table
            .find(portfolio_id)
            .first::<PortfolioDb>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => FundError::NotFound(format!(
                    "Portfolio with id {} not found",
                    portfolio_id
                )),
                _ => FundError::DatabaseError(e.to_string()),
            })?;

        Ok(portfolio.into())
    }

    fn get_fund(&self, fund_id: &str) -> Result<Fund> {
        let mut conn = get_connection(&self.pool)?;

        let fund = funds::table
            .find(fund_id)
            .first::<FundDb>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    FundError::NotFound(format!("Fund with id {} not found", fund_id))
                }
                _ => FundError::DatabaseError(e.to_string()),
            })?;

        Ok(fund.into())
    }

    fn list_funds(&self, portfolio_id: &str) -> Result<Vec<Fund>> {
        let mut conn = get_connection(&self.pool)?;

        let results = funds::table
            .filter(funds::portfolio_id.eq(portfolio_id))
            .order(funds::name.asc())
            .load::<FundDb>(&mut conn)?;

        Ok(results.into_iter().map(Fund::from).collect())
    }

    fn get_active_funds(&self, portfolio_id: &str) -> Result<Vec<Fund>> {
        let mut conn = get_connection(&self.pool)?;

        let results = funds::table
            .filter(funds::portfolio_id.eq(portfolio_id))
            .filter(funds::status.eq(FundStatus::Active.as_str()))
            .order(funds::name.asc())
            .load::<FundDb>(&mut conn)?;

        Ok(results.into_iter().map(Fund::from).collect())
    }

    fn create_fund(&self, new_fund: NewFund) -> Result<Fund> {
        new_fund.validate().map_err(crate::errors::Error::Fund)?;

        let mut fund_db: FundDb = new_fund.into();
        if fund_db.id.is_empty() {
            fund_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)?;

        diesel::insert_into(funds::table)
            .values(&fund_db)
            .execute(&mut conn)
            .map_err(|e| FundError::DatabaseError(e.to_string()))?;

        Ok(fund_db.into())
    }

    fn update_fund_status(&self, fund_id: &str, new_status: FundStatus) -> Result<Fund> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(funds::table.find(fund_id))
            .set((
                funds::status.eq(new_status.as_str()),
                funds::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(|e| FundError::DatabaseError(e.to_string()))?;

        self.get_fund(fund_id)
    }
}
