//! Defined-contribution account projection and stochastic testing

mod projector;
mod monte_carlo;

pub use projector::{
    AccountProjector, AccountState, AccountYear, AccountProjectionInput, AccountProjectionResult,
    AccountSummary,
};
pub use monte_carlo::{MonteCarloSimulator, MonteCarloInput, MonteCarloResult, BalancePercentiles};
