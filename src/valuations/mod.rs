// Module declarations
pub(crate) mod valuations_errors;
pub(crate) mod valuations_model;
pub(crate) mod valuations_repository;
pub(crate) mod valuations_traits;

// Re-export the public interface
pub use valuations_errors::ValuationError;
pub use valuations_model::{
    FundValuation, FundValuationDb, NewFundValuation, PortfolioValuation, PortfolioValuationDb,
};
pub use valuations_repository::{FundValuationRepository, PortfolioValuationRepository};
pub use valuations_traits::{FundValuationRepositoryTrait, PortfolioValuationRepositoryTrait};
