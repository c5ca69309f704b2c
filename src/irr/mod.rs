// Module declarations
pub(crate) mod batch;
pub(crate) mod cache;
pub(crate) mod cascade;
pub(crate) mod completeness;
pub(crate) mod fund_calculator;
pub(crate) mod historical;
pub(crate) mod irr_errors;
pub(crate) mod irr_model;
pub(crate) mod irr_repository;
pub(crate) mod irr_traits;
pub mod numeric_guard;
pub(crate) mod portfolio_calculator;
pub(crate) mod solver;
pub(crate) mod upsert;

#[cfg(test)]
pub(crate) mod test_mocks;


// Re-export the public interface
pub use batch::ActivityBatchRecalculator;
pub use cache::IrrReadCache;
pub use cascade::DeletionCascadeHandler;
pub use completeness::CompletenessChecker;
pub use fund_calculator::FundIrrCalculator;
pub use historical::HistoricalRecalculator;
pub use irr_errors::IrrError;
pub use irr_model::{
    CalculationMode, DateFailure, DeletionCascadeOutcome, FundIrrValue, FundIrrValueDb,
    PortfolioIrrValue, PortfolioIrrValueDb, RecalculationSummary, ValuationUpsertOutcome,
};
pub use irr_repository::{FundIrrRepository, PortfolioIrrRepository};
pub use irr_traits::{
    ActivityBatchRecalculatorTrait, CompletenessCheckerTrait, DeletionCascadeHandlerTrait,
    FundIrrCalculatorTrait, FundIrrRepositoryTrait, HistoricalRecalculatorTrait, IrrCacheTrait,
    IrrSolverTrait, PortfolioIrrCalculatorTrait, PortfolioIrrRepositoryTrait,
    ValuationUpsertHandlerTrait,
};
pub use portfolio_calculator::PortfolioIrrCalculator;
pub use solver::{build_schedule, CashFlow, XirrSolver};
pub use upsert::ValuationUpsertHandler;
