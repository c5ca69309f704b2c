use crate::errors::Result;
use crate::funds::funds_model::{Fund, FundStatus, NewFund, Portfolio};

/// Trait defining the contract for fund and portfolio repository operations.
pub trait FundRepositoryTrait: Send + Sync {
    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio>;
    fn get_fund(&self, fund_id: &str) -> Result<Fund>;
    fn list_funds(&self, portfolio_id: &str) -> Result<Vec<Fund>>;
    fn get_active_funds(&self, portfolio_id: &str) -> Result<Vec<Fund>>;
    fn create_fund(&self, new_fund: NewFund) -> Result<Fund>;
    fn update_fund_status(&self, fund_id: &str, new_status: FundStatus) -> Result<Fund>;
}
