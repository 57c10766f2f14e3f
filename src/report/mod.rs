//! Report module - console tables and file exports

pub mod export;
pub mod tables;

pub use export::*;
pub use tables::*;
