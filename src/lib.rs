//! Retirement Projection - year-by-year retirement income engine for federal employees
//!
//! This library provides:
//! - FERS, CSRS and CSRS Offset annuities, the FERS supplement and survivor benefits
//! - Social Security benefit estimation with claiming-age adjustments
//! - Traditional/Roth account projection with RMDs and Monte Carlo sequence risk
//! - Federal and flat state tax liability
//! - COLA compounding and the full yearly retirement projection

pub mod error;
pub mod inputs;
pub mod assumptions;
pub mod benefits;
pub mod account;
pub mod tax;
pub mod projection;
pub mod scenario;
pub mod cache;
pub mod api;

// Re-export commonly used types
pub use error::{ProjectionError, Result};
pub use inputs::{ScenarioInput, Scenario, ScenarioStore};
pub use assumptions::Assumptions;
pub use projection::{ProjectionEngine, RetirementProjectionResult, YearlyProjectionRow};
pub use scenario::ScenarioRunner;
pub use cache::ResultCache;
pub use api::{CallRequest, CallResponse};
