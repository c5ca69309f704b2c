use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::debug;
use std::sync::Arc;

use crate::constants::DECIMAL_PRECISION;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::{fund_valuations, portfolio_valuations};
use crate::valuations::valuations_model::{
    FundValuation, FundValuationDb, NewFundValuation, PortfolioValuation, PortfolioValuationDb,
};
use crate::valuations::valuations_traits::{
    FundValuationRepositoryTrait, PortfolioValuationRepositoryTrait,
};
use crate::valuations::ValuationError;

pub struct FundValuationRepository {
    pool: Arc<DbPool>,
}

impl FundValuationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl FundValuationRepositoryTrait for FundValuationRepository {
    fn get_by_id(&self, valuation_id: &str) -> Result<FundValuation> {
        let mut conn = get_connection(&self.pool)?;

        let row = fund_valuations::table
            .find(valuation_id)
            .first::<FundValuationDb>(&mut conn)
            .map_err(|e| match e {
                DieselError::NotFound => ValuationError::NotFound(format!(
                    "Fund valuation with id {} not found",
                    valuation_id
                )),
                _ => ValuationError::DatabaseError(e.to_string()),
            })?;

        Ok(row.into())
    }

    fn get_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<Option<FundValuation>> {
        let mut conn = get_connection(&self.pool)?;

        let row = fund_valuations::table
            .filter(fund_valuations::fund_id.eq(fund_id))
            .filter(fund_valuations::valuation_date.eq(date))
            .first::<FundValuationDb>(&mut conn)
            .optional()?;

        Ok(row.map(FundValuation::from))
    }

    fn get_valued_fund_ids(&self, fund_ids: &[String], date: NaiveDate) -> Result<Vec<String>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;

        let ids = fund_valuations::table
            .filter(fund_valuations::fund_id.eq_any(fund_ids))
            .filter(fund_valuations::valuation_date.eq(date))
            .select(fund_valuations::fund_id)
            .load::<String>(&mut conn)?;

        Ok(ids)
    }

    fn get_valuations_on_date(
        &self,
        fund_ids: &[String],
        date: NaiveDate,
    ) -> Result<Vec<FundValuation>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;

        let rows = fund_valuations::table
            .filter(fund_valuations::fund_id.eq_any(fund_ids))
            .filter(fund_valuations::valuation_date.eq(date))
            .load::<FundValuationDb>(&mut conn)?;

        Ok(rows.into_iter().map(FundValuation::from).collect())
    }

    fn get_valuation_dates_from(
        &self,
        fund_ids: &[String],
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;

        let dates = fund_valuations::table
            .filter(fund_valuations::fund_id.eq_any(fund_ids))
            .filter(fund_valuations::valuation_date.ge(start_date))
            .select(fund_valuations::valuation_date)
            .distinct()
            .order(fund_valuations::valuation_date.asc())
            .load::<NaiveDate>(&mut conn)?;

        Ok(dates)
    }

    fn save(&self, valuation: NewFundValuation) -> Result<FundValuation> {
        valuation.validate().map_err(crate::errors::Error::Valuation)?;

        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now();

        let row = FundValuationDb {
            id: valuation
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            fund_id: valuation.fund_id.clone(),
            valuation_date: valuation.valuation_date,
            amount: valuation.amount.round_dp(DECIMAL_PRECISION).to_string(),
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        match diesel::insert_into(fund_valuations::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => {}
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                debug!(
                    "Valuation for fund {} on {} already exists, updating in place",
                    valuation.fund_id, valuation.valuation_date
                );
                diesel::update(
                    fund_valuations::table
                        .filter(fund_valuations::fund_id.eq(&valuation.fund_id))
                        .filter(fund_valuations::valuation_date.eq(valuation.valuation_date)),
                )
                .set((
                    fund_valuations::amount.eq(&row.amount),
                    fund_valuations::updated_at.eq(&row.updated_at),
                ))
                .execute(&mut conn)?;
            }
            Err(e) => return Err(e.into()),
        }

        // Reload so callers see the authoritative row, whichever writer won
        let stored = fund_valuations::table
            .filter(fund_valuations::fund_id.eq(&valuation.fund_id))
            .filter(fund_valuations::valuation_date.eq(valuation.valuation_date))
            .first::<FundValuationDb>(&mut conn)?;

        Ok(stored.into())
    }

    fn delete_by_id(&self, valuation_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let affected = diesel::delete(fund_valuations::table.find(valuation_id))
            .execute(&mut conn)?;

        Ok(affected > 0)
    }
}

pub struct PortfolioValuationRepository {
    pool: Arc<DbPool>,
}

impl PortfolioValuationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl PortfolioValuationRepositoryTrait for PortfolioValuationRepository {
    fn get_by_key(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioValuation>> {
        let mut conn = get_connection(&self.pool)?;

        let row = portfolio_valuations::table
            .filter(portfolio_valuations::portfolio_id.eq(portfolio_id))
            .filter(portfolio_valuations::valuation_date.eq(date))
            .first::<PortfolioValuationDb>(&mut conn)
            .optional()?;

        Ok(row.map(PortfolioValuation::from))
    }

    fn replace(&self, valuation: PortfolioValuation) -> Result<PortfolioValuation> {
        let mut conn = get_connection(&self.pool)?;
        let row = PortfolioValuationDb::from(valuation.clone());

        conn.transaction::<_, DieselError, _>(|conn| {
            diesel::delete(
                portfolio_valuations::table
                    .filter(portfolio_valuations::portfolio_id.eq(&row.portfolio_id))
                    .filter(portfolio_valuations::valuation_date.eq(row.valuation_date)),
            )
            .execute(conn)?;

            diesel::insert_into(portfolio_valuations::table)
                .values(&row)
                .execute(conn)?;

            Ok(())
        })?;

        Ok(valuation)
    }

    fn delete_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let affected = diesel::delete(
            portfolio_valuations::table
                .filter(portfolio_valuations::portfolio_id.eq(portfolio_id))
                .filter(portfolio_valuations::valuation_date.eq(date)),
        )
        .execute(&mut conn)?;

        Ok(affected > 0)
    }
}
