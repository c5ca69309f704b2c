use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::debug;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::irr::irr_model::{
    FundIrrValue, FundIrrValueDb, PortfolioIrrValue, PortfolioIrrValueDb,
};
use crate::irr::irr_traits::{FundIrrRepositoryTrait, PortfolioIrrRepositoryTrait};
use crate::schema::{fund_irr_values, portfolio_irr_values};

/// Repository for the derived fund-level IRR rows. Relies on the unique
/// index on (fund_id, irr_date): a conflicting insert from a concurrent
/// writer is converted into an update, never surfaced.
pub struct FundIrrRepository {
    pool: Arc<DbPool>,
}

impl FundIrrRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl FundIrrRepositoryTrait for FundIrrRepository {
    fn get_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<Option<FundIrrValue>> {
        let mut conn = get_connection(&self.pool)?;

        let row = fund_irr_values::table
            .filter(fund_irr_values::fund_id.eq(fund_id))
            .filter(fund_irr_values::irr_date.eq(date))
            .first::<FundIrrValueDb>(&mut conn)
            .optional()?;

        Ok(row.map(FundIrrValue::from))
    }

    fn upsert(&self, value: FundIrrValue) -> Result<FundIrrValue> {
        let mut conn = get_connection(&self.pool)?;
        let row = FundIrrValueDb::from(value);

        match diesel::insert_into(fund_irr_values::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => {}
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                debug!(
                    "Concurrent insert for fund {} on {}, falling back to update",
                    row.fund_id, row.irr_date
                );
                diesel::update(
                    fund_irr_values::table
                        .filter(fund_irr_values::fund_id.eq(&row.fund_id))
                        .filter(fund_irr_values::irr_date.eq(row.irr_date)),
                )
                .set((
                    fund_irr_values::irr_result.eq(row.irr_result),
                    fund_irr_values::fund_valuation_id.eq(&row.fund_valuation_id),
                    fund_irr_values::calculated_at.eq(&row.calculated_at),
                ))
                .execute(&mut conn)?;
            }
            Err(e) => return Err(e.into()),
        }

        let stored = fund_irr_values::table
            .filter(fund_irr_values::fund_id.eq(&row.fund_id))
            .filter(fund_irr_values::irr_date.eq(row.irr_date))
            .first::<FundIrrValueDb>(&mut conn)?;

        Ok(stored.into())
    }

    fn delete_by_key(&self, fund_id: &str, date: NaiveDate) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let affected = diesel::delete(
            fund_irr_values::table
                .filter(fund_irr_values::fund_id.eq(fund_id))
                .filter(fund_irr_values::irr_date.eq(date)),
        )
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    fn get_dates_from(
        &self,
        fund_ids: &[String],
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;

        let dates = fund_irr_values::table
            .filter(fund_irr_values::fund_id.eq_any(fund_ids))
            .filter(fund_irr_values::irr_date.ge(start_date))
            .select(fund_irr_values::irr_date)
            .distinct()
            .order(fund_irr_values::irr_date.asc())
            .load::<NaiveDate>(&mut conn)?;

        Ok(dates)
    }
}

/// Repository for the derived portfolio-level IRR rows, mirroring the fund
/// repository's insert-then-update contract on (portfolio_id, irr_date).
pub struct PortfolioIrrRepository {
    pool: Arc<DbPool>,
}

impl PortfolioIrrRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl PortfolioIrrRepositoryTrait for PortfolioIrrRepository {
    fn get_by_key(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioIrrValue>> {
        let mut conn = get_connection(&self.pool)?;

        let row = portfolio_irr_values::table
            .filter(portfolio_irr_values::portfolio_id.eq(portfolio_id))
            .filter(portfolio_irr_values::irr_date.eq(date))
            .first::<PortfolioIrrValueDb>(&mut conn)
            .optional()?;

        Ok(row.map(PortfolioIrrValue::from))
    }

    fn upsert(&self, value: PortfolioIrrValue) -> Result<PortfolioIrrValue> {
        let mut conn = get_connection(&self.pool)?;
        let row = PortfolioIrrValueDb::from(value);

        match diesel::insert_into(portfolio_irr_values::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => {}
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                debug!(
                    "Concurrent insert for portfolio {} on {}, falling back to update",
                    row.portfolio_id, row.irr_date
                );
                diesel::update(
                    portfolio_irr_values::table
                        .filter(portfolio_irr_values::portfolio_id.eq(&row.portfolio_id))
                        .filter(portfolio_irr_values::irr_date.eq(row.irr_date)),
                )
                .set((
                    portfolio_irr_values::irr_result.eq(row.irr_result),
                    portfolio_irr_values::portfolio_valuation_id
                        .eq(&row.portfolio_valuation_id),
                    portfolio_irr_values::calculated_at.eq(&row.calculated_at),
                ))
                .execute(&mut conn)?;
            }
            Err(e) => return Err(e.into()),
        }

        let stored = portfolio_irr_values::table
            .filter(portfolio_irr_values::portfolio_id.eq(&row.portfolio_id))
            .filter(portfolio_irr_values::irr_date.eq(row.irr_date))
            .first::<PortfolioIrrValueDb>(&mut conn)?;

        Ok(stored.into())
    }

    fn delete_by_key(&self, portfolio_id: &str, date: NaiveDate) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let affected = diesel::delete(
            portfolio_irr_values::table
                .filter(portfolio_irr_values::portfolio_id.eq(portfolio_id))
                .filter(portfolio_irr_values::irr_date.eq(date)),
        )
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    fn get_dates_from(
        &self,
        portfolio_id: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let dates = portfolio_irr_values::table
            .filter(portfolio_irr_values::portfolio_id.eq(portfolio_id))
            .filter(portfolio_irr_values::irr_date.ge(start_date))
            .select(portfolio_irr_values::irr_date)
            .distinct()
            .order(portfolio_irr_values::irr_date.asc())
            .load::<NaiveDate>(&mut conn)?;

        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use diesel::r2d2::{ConnectionManager, Pool};
    use diesel::sqlite::SqliteConnection;

    use crate::db::run_migrations;
    use crate::funds::{FundDb, PortfolioDb};
    use crate::irr::irr_model::{FundIrrValue, PortfolioIrrValue};
    use crate::schema::{funds, portfolios};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // A single-connection pool so the in-memory database is shared by
    // every statement in the test
    fn seeded_pool() -> Arc<DbPool> {
        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        run_migrations(&pool).unwrap();

        let now = Utc::now().naive_utc();
        let mut conn = pool.get().unwrap();
        diesel::insert_into(portfolios::table)
            .values(&PortfolioDb {
                id: "p1".to_string(),
                name: "Portfolio One".to_string(),
                created_at: now,
                updated_at: now,
            })
            .execute(&mut conn)
            .unwrap();
        diesel::insert_into(funds::table)
            .values(&FundDb {
                id: "f1".to_string(),
                portfolio_id: "p1".to_string(),
                name: "Fund One".to_string(),
                status: "ACTIVE".to_string(),
                created_at: now,
                updated_at: now,
            })
            .execute(&mut conn)
            .unwrap();

        Arc::new(pool)
    }

    fn fund_irr(id: &str, d: NaiveDate, rate: f64, valuation_id: &str) -> FundIrrValue {
        FundIrrValue {
            id: id.to_string(),
            fund_id: "f1".to_string(),
            irr_date: d,
            irr_result: rate,
            fund_valuation_id: Some(valuation_id.to_string()),
            calculated_at: Utc::now(),
        }
    }

    #[test]
    fn conflicting_fund_insert_falls_back_to_update() {
        let repository = FundIrrRepository::new(seeded_pool());
        let d = date(2024, 1, 31);

        let first = repository
            .upsert(fund_irr("row-a", d, 0.04, "val-a"))
            .unwrap();
        let second = repository
            .upsert(fund_irr("row-b", d, 0.07, "val-b"))
            .unwrap();

        // The unique index rejects the second insert; it must land as an
        // in-place update of the winner's row
        assert_eq!(second.id, first.id);
        assert_eq!(second.irr_result, 0.07);
        assert_eq!(second.fund_valuation_id.as_deref(), Some("val-b"));

        let stored = repository.get_by_key("f1", d).unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.irr_result, 0.07);
    }

    #[test]
    fn conflicting_portfolio_insert_falls_back_to_update() {
        let repository = PortfolioIrrRepository::new(seeded_pool());
        let d = date(2024, 1, 31);

        let first = repository
            .upsert(PortfolioIrrValue {
                id: "row-a".to_string(),
                portfolio_id: "p1".to_string(),
                irr_date: d,
                irr_result: 0.04,
                portfolio_valuation_id: Some("pval-a".to_string()),
                calculated_at: Utc::now(),
            })
            .unwrap();
        let second = repository
            .upsert(PortfolioIrrValue {
                id: "row-b".to_string(),
                portfolio_id: "p1".to_string(),
                irr_date: d,
                irr_result: 0.07,
                portfolio_valuation_id: Some("pval-b".to_string()),
                calculated_at: Utc::now(),
            })
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.irr_result, 0.07);
        assert_eq!(
            second.portfolio_valuation_id.as_deref(),
            Some("pval-b")
        );
    }

    #[test]
    fn delete_by_key_reports_whether_a_row_existed() {
        let repository = FundIrrRepository::new(seeded_pool());
        let d = date(2024, 1, 31);

        assert!(!repository.delete_by_key("f1", d).unwrap());
        repository.upsert(fund_irr("row-a", d, 0.04, "val-a")).unwrap();
        assert!(repository.delete_by_key("f1", d).unwrap());
        assert!(repository.get_by_key("f1", d).unwrap().is_none());
    }
}
