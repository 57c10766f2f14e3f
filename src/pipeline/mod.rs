//! Pipeline module - loading, filtering, derivation and estimation stages

pub mod categories;
pub mod cohorts;
pub mod describe;
pub mod dummies;
pub mod filter;
pub mod loader;
pub mod regression;
pub mod stata;

pub use categories::CategoryError;
pub use cohorts::CohortError;
pub use describe::*;
pub use dummies::*;
pub use filter::FilterError;
pub use loader::*;
