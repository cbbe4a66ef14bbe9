//! FERS annuity supplement (special retirement supplement)
//!
//! Bridges the gap between an early immediate retirement and Social Security
//! eligibility at 62. The amount approximates the Social Security benefit
//! earned by FERS service: `(SS at 62 / 40) * ceil(FERS years)`.

use crate::assumptions::{PensionRules, SocialSecurityRules};
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementInput {
    /// Monthly Social Security estimate at 62
    pub ss_at_62_monthly: f64,
    pub fers_service_years: f64,
    pub retirement_age: u32,
    #[serde(default)]
    pub annual_earned_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementResult {
    pub is_eligible: bool,
    pub annual_amount: f64,
    pub monthly_amount: f64,
    pub earnings_test_reduction: f64,
    /// Age at which the supplement stops
    pub ends_at_age: u32,
    pub notes: Vec<String>,
}

pub struct SupplementCalculator<'a> {
    pension: &'a PensionRules,
    social_security: &'a SocialSecurityRules,
}

impl<'a> SupplementCalculator<'a> {
    pub fn new(pension: &'a PensionRules, social_security: &'a SocialSecurityRules) -> Self {
        Self {
            pension,
            social_security,
        }
    }

    pub fn calculate(&self, input: &SupplementInput) -> Result<SupplementResult> {
        if !input.ss_at_62_monthly.is_finite() || input.ss_at_62_monthly < 0.0 {
            return Err(ProjectionError::invalid("ssAt62Monthly", "must be a non-negative number"));
        }
        if !input.fers_service_years.is_finite() || input.fers_service_years < 0.0 {
            return Err(ProjectionError::invalid("fersServiceYears", "must be a non-negative number"));
        }
        if !input.annual_earned_income.is_finite() || input.annual_earned_income < 0.0 {
            return Err(ProjectionError::invalid(
                "annualEarnedIncome",
                "must be a non-negative number",
            ));
        }

        let ends_at_age = self.social_security.earliest_claiming_age;
        let mut notes = Vec::new();

        let immediate = self
            .pension
            .is_immediate_unreduced(input.retirement_age, input.fers_service_years);
        if !immediate || input.retirement_age >= ends_at_age {
            notes.push(format!(
                "Not eligible for the annuity supplement: requires an immediate unreduced \
                 FERS annuity beginning before age {}.",
                ends_at_age
            ));
            return Ok(SupplementResult {
                is_eligible: false,
                annual_amount: 0.0,
                monthly_amount: 0.0,
                earnings_test_reduction: 0.0,
                ends_at_age,
                notes,
            });
        }

        let years = input.fers_service_years.ceil();
        let gross = input.ss_at_62_monthly * 12.0 / self.social_security.supplement_service_divisor * years;

        let over_limit = input.annual_earned_income - self.social_security.supplement_earnings_limit;
        let earnings_test_reduction = if over_limit > 0.0 {
            let reduction = (over_limit / 2.0).min(gross);
            notes.push(format!("Earnings test reduction of ${:.2} applied.", reduction));
            reduction
        } else {
            0.0
        };

        let annual = (gross - earnings_test_reduction).max(0.0);
        Ok(SupplementResult {
            is_eligible: true,
            annual_amount: annual,
            monthly_amount: annual / 12.0,
            earnings_test_reduction,
            ends_at_age,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input() -> SupplementInput {
        SupplementInput {
            ss_at_62_monthly: 1_600.0,
            fers_service_years: 29.5,
            retirement_age: 57,
            annual_earned_income: 0.0,
        }
    }

    #[test]
    fn test_supplement_amount() {
        let pension = PensionRules::default();
        let ss = SocialSecurityRules::default();
        let mut eligible = input();
        eligible.fers_service_years = 30.0;

        let result = SupplementCalculator::new(&pension, &ss).calculate(&eligible).unwrap();

        // 1,600 / 40 x 30 = 1,200/month
        assert!(result.is_eligible);
        assert_relative_eq!(result.monthly_amount, 1_200.0, epsilon = 1e-9);
        assert_eq!(result.ends_at_age, 62);
    }

    #[test]
    fn test_mra_plus_10_is_ineligible() {
        let pension = PensionRules::default();
        let ss = SocialSecurityRules::default();

        // 29.5 years at MRA is not an unreduced annuity
        let result = SupplementCalculator::new(&pension, &ss).calculate(&input()).unwrap();
        assert!(!result.is_eligible);
        assert_eq!(result.annual_amount, 0.0);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn test_earnings_test() {
        let pension = PensionRules::default();
        let ss = SocialSecurityRules::default();
        let mut working = input();
        working.fers_service_years = 30.0;
        working.annual_earned_income = 33_400.0;

        let result = SupplementCalculator::new(&pension, &ss).calculate(&working).unwrap();

        // $10,000 over the limit costs $5,000 of the $14,400 supplement
        assert_relative_eq!(result.earnings_test_reduction, 5_000.0, epsilon = 1e-9);
        assert_relative_eq!(result.annual_amount, 9_400.0, epsilon = 1e-9);
    }
}
