/// Decimal precision for persisted monetary amounts
pub const DECIMAL_PRECISION: u32 = 6;

/// Day-count basis used to annualize cash-flow schedules
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Fund lifecycle status values as stored in the database
pub const FUND_STATUS_ACTIVE: &str = "ACTIVE";
pub const FUND_STATUS_INACTIVE: &str = "INACTIVE";
