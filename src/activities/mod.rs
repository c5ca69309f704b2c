// Module declarations
pub(crate) mod activities_errors;
pub(crate) mod activities_model;
pub(crate) mod activities_repository;
pub(crate) mod activities_service;
pub(crate) mod activities_traits;

// Re-export the public interface
pub use activities_errors::ActivityError;
pub use activities_model::{Activity, ActivityDb, ActivityType, ActivityUpdate, NewActivity};
pub use activities_repository::ActivityRepository;
pub use activities_service::ActivityService;
pub use activities_traits::{ActivityRepositoryTrait, ActivityServiceTrait};
