pub mod db;

pub mod activities;
pub mod constants;
pub mod errors;
pub mod funds;
pub mod irr;
pub mod schema;
pub mod valuations;

pub use errors::{Error, Result};
pub use irr::*;
