//! Social Security claiming-age benefit estimates

use crate::assumptions::SocialSecurityRules;
use crate::error::Result;
use crate::inputs::validate::validate_social_security;
use crate::inputs::{SocialSecurityInput, StatementEstimates};
use serde::{Deserialize, Serialize};

/// Where the full-retirement-age benefit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EstimateMethod {
    /// SSA statement figures at 62, FRA and 70
    Statement,
    /// User-supplied monthly benefit at FRA
    UserEstimate,
    /// AIME from the supplied earnings history
    EarningsHistory,
    /// Average-earnings proxy; not an authoritative benefit calculation
    EarningsHeuristic,
    Ineligible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSecurityResult {
    pub full_retirement_age_months: u32,
    pub estimated_at_62: f64,
    pub estimated_at_fra: f64,
    pub estimated_at_70: f64,
    pub claiming_age: u32,
    pub claiming_monthly_amount: f64,
    pub claiming_annual_amount: f64,
    pub method: EstimateMethod,
    pub notes: Vec<String>,
}

pub struct SocialSecurityEstimator<'a> {
    rules: &'a SocialSecurityRules,
}

impl<'a> SocialSecurityEstimator<'a> {
    pub fn new(rules: &'a SocialSecurityRules) -> Self {
        Self { rules }
    }

    pub fn estimate(&self, input: &SocialSecurityInput) -> Result<SocialSecurityResult> {
        validate_social_security(input)?;

        let fra_months = self.rules.full_retirement_age_months(input.fra_birth_year());
        let mut notes = Vec::new();

        if !input.is_eligible {
            notes.push("Not eligible for Social Security; benefit set to zero.".into());
            return Ok(SocialSecurityResult {
                full_retirement_age_months: fra_months,
                estimated_at_62: 0.0,
                estimated_at_fra: 0.0,
                estimated_at_70: 0.0,
                claiming_age: input.claiming_age,
                claiming_monthly_amount: 0.0,
                claiming_annual_amount: 0.0,
                method: EstimateMethod::Ineligible,
                notes,
            });
        }

        let earliest_months = self.rules.earliest_claiming_age * 12;
        let latest_months = self.rules.latest_credit_age * 12;

        let (method, at62, at_fra, at70) = if let Some(statement) = &input.statement_estimates {
            (EstimateMethod::Statement, statement.at62, statement.at_fra, statement.at70)
        } else {
            let (method, pia) = match input.estimated_monthly_benefit {
                Some(benefit) => (EstimateMethod::UserEstimate, benefit),
                None if !input.earnings_history.is_empty() => {
                    (EstimateMethod::EarningsHistory, self.history_pia(&input.earnings_history))
                }
                None => {
                    notes.push(
                        "No benefit estimate supplied; using an average-earnings heuristic. \
                         Obtain an SSA statement for an authoritative figure."
                            .into(),
                    );
                    (EstimateMethod::EarningsHeuristic, self.heuristic_pia(input))
                }
            };
            (
                method,
                self.adjust_for_claiming(pia, fra_months, earliest_months),
                pia,
                self.adjust_for_claiming(pia, fra_months, latest_months),
            )
        };

        let claim_months = input.claiming_age * 12;
        if input.claiming_age > self.rules.latest_credit_age {
            notes.push(format!(
                "No delayed retirement credits accrue after age {}.",
                self.rules.latest_credit_age
            ));
        }

        let claiming_monthly_amount = if claim_months < earliest_months {
            notes.push(format!(
                "Claiming age {} is before the earliest eligibility age of {}; benefit set to zero.",
                input.claiming_age, self.rules.earliest_claiming_age
            ));
            0.0
        } else if let Some(statement) = &input.statement_estimates {
            interpolate_statement(statement, claim_months, fra_months, earliest_months, latest_months)
        } else {
            self.adjust_for_claiming(at_fra, fra_months, claim_months)
        };

        Ok(SocialSecurityResult {
            full_retirement_age_months: fra_months,
            estimated_at_62: at62,
            estimated_at_fra: at_fra,
            estimated_at_70: at70,
            claiming_age: input.claiming_age,
            claiming_monthly_amount,
            claiming_annual_amount: claiming_monthly_amount * 12.0,
            method,
            notes,
        })
    }

    /// Apply early reduction or delayed credits relative to FRA
    pub fn adjust_for_claiming(&self, fra_benefit: f64, fra_months: u32, claim_months: u32) -> f64 {
        if claim_months < fra_months {
            let reduction = self.rules.early_reduction(fra_months - claim_months);
            fra_benefit * (1.0 - reduction).max(0.0)
        } else {
            let capped = claim_months.min(self.rules.latest_credit_age * 12);
            let credit = self.rules.delayed_credit(capped.saturating_sub(fra_months));
            fra_benefit * (1.0 + credit)
        }
    }

    /// PIA from the highest `computation_years` of earnings; missing years count as zero
    fn history_pia(&self, history: &[f64]) -> f64 {
        let computation_years = self.rules.computation_years as usize;
        let mut sorted = history.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let total: f64 = sorted.iter().take(computation_years).sum();
        let aime = total / (computation_years as f64 * 12.0);
        self.rules.primary_insurance_amount(aime)
    }

    fn heuristic_pia(&self, input: &SocialSecurityInput) -> f64 {
        let computation_years = self.rules.computation_years;
        let years = input.years_worked.min(computation_years) as f64;
        let aime = input.average_annual_earnings * years / (computation_years as f64 * 12.0);
        self.rules.primary_insurance_amount(aime)
    }
}

/// Piecewise-linear interpolation between statement figures
fn interpolate_statement(
    statement: &StatementEstimates,
    claim_months: u32,
    fra_months: u32,
    earliest_months: u32,
    latest_months: u32,
) -> f64 {
    let lerp = |from: f64, to: f64, start: u32, end: u32, at: u32| -> f64 {
        if end <= start {
            return to;
        }
        from + (to - from) * (at - start) as f64 / (end - start) as f64
    };

    if claim_months <= earliest_months {
        statement.at62
    } else if claim_months < fra_months {
        lerp(statement.at62, statement.at_fra, earliest_months, fra_months, claim_months)
    } else if claim_months < latest_months {
        lerp(statement.at_fra, statement.at70, fra_months, latest_months, claim_months)
    } else {
        statement.at70
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(claiming_age: u32) -> SocialSecurityInput {
        SocialSecurityInput {
            birth_year: 1963,
            birth_month: 6,
            birth_day: None,
            claiming_age,
            is_eligible: true,
            estimated_monthly_benefit: Some(2_000.0),
            statement_estimates: None,
            average_annual_earnings: 0.0,
            years_worked: 0,
            earnings_history: Vec::new(),
        }
    }

    #[test]
    fn test_claiming_at_fra_pays_estimate() {
        let rules = SocialSecurityRules::default();
        let result = SocialSecurityEstimator::new(&rules).estimate(&input(67)).unwrap();

        assert_eq!(result.full_retirement_age_months, 804);
        assert_relative_eq!(result.claiming_monthly_amount, 2_000.0);
        assert_relative_eq!(result.claiming_annual_amount, 24_000.0);
        assert_eq!(result.method, EstimateMethod::UserEstimate);
    }

    #[test]
    fn test_early_and_delayed_figures() {
        let rules = SocialSecurityRules::default();
        let result = SocialSecurityEstimator::new(&rules).estimate(&input(62)).unwrap();

        // 60 months early: 30% reduction; 36 months late: 24% credit
        assert_relative_eq!(result.estimated_at_62, 1_400.0, epsilon = 1e-6);
        assert_relative_eq!(result.estimated_at_70, 2_480.0, epsilon = 1e-6);
        assert_relative_eq!(result.claiming_monthly_amount, 1_400.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_credit_after_70() {
        let rules = SocialSecurityRules::default();
        let result = SocialSecurityEstimator::new(&rules).estimate(&input(72)).unwrap();

        assert_relative_eq!(result.claiming_monthly_amount, 2_480.0, epsilon = 1e-6);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn test_ineligible_is_zero_with_note() {
        let rules = SocialSecurityRules::default();
        let mut ineligible = input(67);
        ineligible.is_eligible = false;

        let result = SocialSecurityEstimator::new(&rules).estimate(&ineligible).unwrap();
        assert_eq!(result.claiming_monthly_amount, 0.0);
        assert_eq!(result.method, EstimateMethod::Ineligible);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn test_claiming_before_62_is_zero_with_note() {
        let rules = SocialSecurityRules::default();
        let result = SocialSecurityEstimator::new(&rules).estimate(&input(60)).unwrap();

        assert_eq!(result.claiming_monthly_amount, 0.0);
        assert!(result.notes.iter().any(|n| n.contains("earliest eligibility")));
        // The reference estimates are still reported
        assert!(result.estimated_at_62 > 0.0);
    }

    #[test]
    fn test_heuristic_is_flagged() {
        let rules = SocialSecurityRules::default();
        let mut heuristic = input(67);
        heuristic.estimated_monthly_benefit = None;
        heuristic.average_annual_earnings = 60_000.0;
        heuristic.years_worked = 35;

        let result = SocialSecurityEstimator::new(&rules).estimate(&heuristic).unwrap();

        // AIME 5,000 -> PIA 1,103.40 + 1,207.68
        assert_relative_eq!(result.estimated_at_fra, 2_311.08, epsilon = 1e-6);
        assert_eq!(result.method, EstimateMethod::EarningsHeuristic);
        assert!(result.notes.iter().any(|n| n.contains("heuristic")));
    }

    #[test]
    fn test_earnings_history_uses_top_years() {
        let rules = SocialSecurityRules::default();
        let mut history = input(67);
        history.estimated_monthly_benefit = None;
        history.average_annual_earnings = 10_000.0;
        history.years_worked = 35;
        // 35 years at 60k plus five low years that drop out
        history.earnings_history = vec![1_000.0; 5];
        history.earnings_history.extend(vec![60_000.0; 35]);

        let result = SocialSecurityEstimator::new(&rules).estimate(&history).unwrap();

        assert_relative_eq!(result.estimated_at_fra, 2_311.08, epsilon = 1e-6);
        assert_eq!(result.method, EstimateMethod::EarningsHistory);
        assert!(!result.notes.iter().any(|n| n.contains("heuristic")));
    }

    #[test]
    fn test_short_history_counts_missing_years_as_zero() {
        let rules = SocialSecurityRules::default();
        let mut history = input(67);
        history.estimated_monthly_benefit = None;
        history.earnings_history = vec![42_000.0; 10];

        let result = SocialSecurityEstimator::new(&rules).estimate(&history).unwrap();

        // AIME 1,000 sits below the first bend point
        assert_relative_eq!(result.estimated_at_fra, 900.0, epsilon = 1e-9);
    }

    #[test]
    fn test_january_first_birthday_uses_prior_year() {
        let rules = SocialSecurityRules::default();
        let mut born = input(67);
        born.birth_year = 1960;
        born.birth_month = 1;
        born.birth_day = Some(1);

        let result = SocialSecurityEstimator::new(&rules).estimate(&born).unwrap();
        assert_eq!(result.full_retirement_age_months, 802);

        born.birth_day = Some(2);
        let result = SocialSecurityEstimator::new(&rules).estimate(&born).unwrap();
        assert_eq!(result.full_retirement_age_months, 804);
    }

    #[test]
    fn test_statement_interpolation() {
        let rules = SocialSecurityRules::default();
        let mut with_statement = input(65);
        with_statement.statement_estimates = Some(StatementEstimates {
            at62: 1_500.0,
            at_fra: 2_100.0,
            at70: 2_700.0,
        });

        let result = SocialSecurityEstimator::new(&rules).estimate(&with_statement).unwrap();

        // 36 of 60 months from 62 toward FRA 67
        assert_relative_eq!(result.claiming_monthly_amount, 1_500.0 + 600.0 * 0.6, epsilon = 1e-6);
        assert_eq!(result.method, EstimateMethod::Statement);
        assert_eq!(result.estimated_at_70, 2_700.0);
    }
}
