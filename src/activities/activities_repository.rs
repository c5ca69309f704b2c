use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use std::sync::Arc;

use crate::activities::activities_model::{
    Activity, ActivityDb, ActivityUpdate, NewActivity,
};
use crate::activities::activities_traits::ActivityRepositoryTrait;
use crate::activities::ActivityError;
use crate::constants::DECIMAL_PRECISION;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::activities;

/// Repository for managing activity data in the database
pub struct ActivityRepository {
    pool: Arc<DbPool>,
}

impl ActivityRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl ActivityRepositoryTrait for ActivityRepository {
    fn get_by_id(&self, activity_id: &str) -> Result<Activity> {
        let mut conn = get_connection(&self.pool)?;

        let row = activities::table
            .find(activity_id)
            .first::<ActivityDb>(&mut conn)
            .map_err(|e| match e {
                DieselError::NotFound => ActivityError::NotFound(format!(
                    "Activity with id {} not found",
                    activity_id
                )),
                _ => ActivityError::DatabaseError(e.to_string()),
            })?;

        Ok(row.into())
    }

    fn get_activities_up_to(&self, fund_id: &str, date: NaiveDate) -> Result<Vec<Activity>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = activities::table
            .filter(activities::fund_id.eq(fund_id))
            .filter(activities::activity_date.le(date))
            .order(activities::activity_date.asc())
            .load::<ActivityDb>(&mut conn)?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    fn get_activities_for_funds_up_to(
        &self,
        fund_ids: &[String],
        date: NaiveDate,
    ) -> Result<Vec<Activity>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;

        let rows = activities::table
            .filter(activities::fund_id.eq_any(fund_ids))
            .filter(activities::activity_date.le(date))
            .order(activities::activity_date.asc())
            .load::<ActivityDb>(&mut conn)?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    fn create(&self, new_activity: NewActivity) -> Result<Activity> {
        new_activity
            .validate()
            .map_err(crate::errors::Error::Activity)?;

        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now();

        let row = ActivityDb {
            id: new_activity
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            fund_id: new_activity.fund_id,
            activity_type: new_activity.activity_type.as_str().to_string(),
            activity_date: new_activity.activity_date,
            amount: new_activity
                .amount
                .round_dp(DECIMAL_PRECISION)
                .to_string(),
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        diesel::insert_into(activities::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| ActivityError::DatabaseError(e.to_string()))?;

        Ok(row.into())
    }

    fn update(&self, update: ActivityUpdate) -> Result<Activity> {
        update.validate().map_err(crate::errors::Error::Activity)?;

        let mut conn = get_connection(&self.pool)?;

        diesel::update(activities::table.find(&update.id))
            .set((
                activities::fund_id.eq(&update.fund_id),
                activities::activity_type.eq(update.activity_type.as_str()),
                activities::activity_date.eq(update.activity_date),
                activities::amount.eq(update.amount.round_dp(DECIMAL_PRECISION).to_string()),
                activities::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .map_err(|e| ActivityError::DatabaseError(e.to_string()))?;

        self.get_by_id(&update.id)
    }

    fn delete(&self, activity_id: &str) -> Result<Activity> {
        let deleted = self.get_by_id(activity_id)?;

        let mut conn = get_connection(&self.pool)?;
        diesel::delete(activities::table.find(activity_id))
            .execute(&mut conn)
            .map_err(|e| ActivityError::DatabaseError(e.to_string()))?;

        Ok(deleted)
    }

    fn create_batch(
        &self,
        new_activities: Vec<NewActivity>,
    ) -> Result<Vec<(String, NaiveDate)>> {
        for new_activity in &new_activities {
            new_activity
                .validate()
                .map_err(crate::errors::Error::Activity)?;
        }

        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now();

        let rows: Vec<ActivityDb> = new_activities
            .into_iter()
            .map(|new_activity| ActivityDb {
                id: new_activity
                    .id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                fund_id: new_activity.fund_id,
                activity_type: new_activity.activity_type.as_str().to_string(),
                activity_date: new_activity.activity_date,
                amount: new_activity
                    .amount
                    .round_dp(DECIMAL_PRECISION)
                    .to_string(),
                created_at: now.to_rfc3339(),
                updated_at: now.to_rfc3339(),
            })
            .collect();

        conn.transaction::<_, DieselError, _>(|conn| {
            for chunk in rows.chunks(1000) {
                diesel::insert_into(activities::table)
                    .values(chunk)
                    .execute(conn)?;
            }
            Ok(())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| (row.fund_id, row.activity_date))
            .collect())
    }
}
