//! Benefit calculators: pension annuity, Social Security, COLA, supplement, survivor income
//! and health premiums

mod pension;
mod social_security;
mod cola;
mod supplement;
mod survivor;
mod health;

pub use pension::{PensionCalculator, PensionResult};
pub use social_security::{SocialSecurityEstimator, SocialSecurityResult, EstimateMethod};
pub use cola::{ColaAdjuster, ColaAdjustmentInput, ColaPolicy, ColaResult, ColaYear};
pub use supplement::{SupplementCalculator, SupplementInput, SupplementResult};
pub use survivor::{SurvivorProjector, SurvivorInput, SurvivorResult};
pub use health::{project_premiums, HealthPremiumInput, HealthPremiumResult};
