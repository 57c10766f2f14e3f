//! Console helpers shared by the pipelines

mod progress;
mod styling;

pub use progress::*;
pub use styling::*;
