//! Yearly retirement income projection

mod state;
mod engine;
mod rows;

pub use state::{ProjectionState, StreamState};
pub use engine::ProjectionEngine;
pub use rows::{summarize, ProjectionSummary, RetirementProjectionResult, YearlyProjectionRow};
