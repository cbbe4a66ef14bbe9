//! Cost-of-living adjustment compounding

use crate::assumptions::PensionRules;
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

fn default_months() -> u32 {
    12
}

/// Which rule turns assumed inflation into a COLA
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColaPolicy {
    /// Full inflation (CSRS, Social Security, other income)
    #[default]
    Full,
    /// FERS diet COLA, withheld before the minimum COLA age unless special provision
    FersCapped {
        #[serde(rename = "ageAtStart")]
        age_at_start: u32,
        #[serde(default, rename = "specialProvision")]
        special_provision: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColaAdjustmentInput {
    pub base_amount: f64,
    #[serde(alias = "assumedInflationRate")]
    pub annual_rate: f64,
    pub start_year: i32,
    pub projection_years: u32,
    /// Months of benefit in the first year; the first COLA is prorated by months/12
    #[serde(default = "default_months")]
    pub months_in_first_year: u32,
    #[serde(default)]
    pub policy: ColaPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColaYear {
    pub year: i32,
    pub inflation_rate: f64,
    pub starting_amount: f64,
    pub cola_rate: f64,
    pub adjusted_amount: f64,
    pub cumulative_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColaResult {
    pub base_amount: f64,
    pub final_amount: f64,
    pub total_growth_rate: f64,
    pub effective_annual_rate: f64,
    pub yearly_adjustments: Vec<ColaYear>,
    pub notes: Vec<String>,
}

pub struct ColaAdjuster<'a> {
    rules: &'a PensionRules,
}

impl<'a> ColaAdjuster<'a> {
    pub fn new(rules: &'a PensionRules) -> Self {
        Self { rules }
    }

    /// COLA granted for one year at the given attained age
    pub fn effective_rate(&self, policy: &ColaPolicy, inflation: f64, age: u32) -> f64 {
        match policy {
            ColaPolicy::Full => inflation,
            ColaPolicy::FersCapped { special_provision, .. } => {
                if !special_provision && age < self.rules.fers_cola_min_age {
                    0.0
                } else {
                    self.rules.fers_cola_rate(inflation)
                }
            }
        }
    }

    /// Build the per-year adjustment table
    pub fn adjust(&self, input: &ColaAdjustmentInput) -> Result<ColaResult> {
        if !input.base_amount.is_finite() || input.base_amount < 0.0 {
            return Err(ProjectionError::invalid("baseAmount", "must be a non-negative number"));
        }
        if !input.annual_rate.is_finite() || input.annual_rate <= -1.0 {
            return Err(ProjectionError::invalid("annualRate", "must be greater than -100%"));
        }
        if input.months_in_first_year > 12 {
            return Err(ProjectionError::invalid("monthsInFirstYear", "must be at most 12"));
        }

        let mut notes = Vec::new();
        let prorate = input.months_in_first_year < 12;
        if input.months_in_first_year == 0 {
            notes.push("No benefit months in the first year; first-year COLA is zero.".to_string());
        } else if prorate {
            notes.push(format!(
                "First-year COLA prorated for {} months.",
                input.months_in_first_year
            ));
        }
        if let ColaPolicy::FersCapped { age_at_start, special_provision: false } = input.policy {
            if age_at_start < self.rules.fers_cola_min_age {
                notes.push(format!(
                    "FERS COLA not applied before age {} for regular retirement.",
                    self.rules.fers_cola_min_age
                ));
            }
        }

        let age_at_start = match input.policy {
            ColaPolicy::FersCapped { age_at_start, .. } => age_at_start,
            ColaPolicy::Full => 0,
        };

        let mut current = input.base_amount;
        let mut yearly_adjustments = Vec::with_capacity(input.projection_years as usize);

        for offset in 0..input.projection_years {
            let mut rate = self.effective_rate(&input.policy, input.annual_rate, age_at_start + offset);
            if offset == 0 && prorate {
                rate *= input.months_in_first_year as f64 / 12.0;
            }

            let adjusted = current * (1.0 + rate);
            yearly_adjustments.push(ColaYear {
                year: input.start_year + offset as i32,
                inflation_rate: input.annual_rate,
                starting_amount: current,
                cola_rate: rate,
                adjusted_amount: adjusted,
                cumulative_growth: growth(input.base_amount, adjusted),
            });
            current = adjusted;
        }

        let total_growth_rate = growth(input.base_amount, current);
        let effective_annual_rate = if input.projection_years > 0 {
            (1.0 + total_growth_rate).powf(1.0 / input.projection_years as f64) - 1.0
        } else {
            0.0
        };

        Ok(ColaResult {
            base_amount: input.base_amount,
            final_amount: current,
            total_growth_rate,
            effective_annual_rate,
            yearly_adjustments,
            notes,
        })
    }
}

fn growth(base: f64, amount: f64) -> f64 {
    if base > 0.0 {
        amount / base - 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(rate: f64, years: u32) -> ColaAdjustmentInput {
        ColaAdjustmentInput {
            base_amount: 30_000.0,
            annual_rate: rate,
            start_year: 2025,
            projection_years: years,
            months_in_first_year: 12,
            policy: ColaPolicy::Full,
        }
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let rules = PensionRules::default();
        let result = ColaAdjuster::new(&rules).adjust(&input(0.0, 25)).unwrap();

        assert_eq!(result.yearly_adjustments.len(), 25);
        for year in &result.yearly_adjustments {
            assert_eq!(year.adjusted_amount, 30_000.0);
        }
        assert_eq!(result.final_amount, 30_000.0);
        assert_eq!(result.total_growth_rate, 0.0);
        assert_eq!(result.effective_annual_rate, 0.0);
    }

    #[test]
    fn test_compounding() {
        let rules = PensionRules::default();
        let result = ColaAdjuster::new(&rules).adjust(&input(0.02, 10)).unwrap();

        assert_relative_eq!(result.final_amount, 30_000.0 * 1.02_f64.powi(10), epsilon = 1e-6);
        assert_relative_eq!(result.effective_annual_rate, 0.02, epsilon = 1e-12);
        assert_eq!(result.yearly_adjustments[3].year, 2028);
        assert_relative_eq!(
            result.yearly_adjustments[1].starting_amount,
            result.yearly_adjustments[0].adjusted_amount
        );
    }

    #[test]
    fn test_first_year_proration() {
        let rules = PensionRules::default();
        let mut prorated = input(0.03, 2);
        prorated.months_in_first_year = 6;

        let result = ColaAdjuster::new(&rules).adjust(&prorated).unwrap();

        assert_relative_eq!(result.yearly_adjustments[0].cola_rate, 0.015);
        assert_relative_eq!(result.yearly_adjustments[1].cola_rate, 0.03);
        assert_relative_eq!(result.final_amount, 30_000.0 * 1.015 * 1.03, epsilon = 1e-6);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn test_zero_first_year_months_gets_no_cola() {
        let rules = PensionRules::default();
        let mut late_start = input(0.03, 2);
        late_start.months_in_first_year = 0;

        let result = ColaAdjuster::new(&rules).adjust(&late_start).unwrap();

        assert_eq!(result.yearly_adjustments[0].cola_rate, 0.0);
        assert_eq!(result.yearly_adjustments[0].adjusted_amount, 30_000.0);
        assert_relative_eq!(result.yearly_adjustments[1].cola_rate, 0.03);
        assert_relative_eq!(result.final_amount, 30_000.0 * 1.03, epsilon = 1e-6);
    }

    #[test]
    fn test_fers_capped_policy() {
        let rules = PensionRules::default();
        let mut fers = input(0.04, 4);
        fers.policy = ColaPolicy::FersCapped {
            age_at_start: 60,
            special_provision: false,
        };

        let result = ColaAdjuster::new(&rules).adjust(&fers).unwrap();
        let rates: Vec<f64> = result.yearly_adjustments.iter().map(|y| y.cola_rate).collect();

        // Ages 60 and 61 get nothing; from 62 the diet COLA is inflation - 1%
        assert_eq!(rates[0], 0.0);
        assert_eq!(rates[1], 0.0);
        assert_relative_eq!(rates[2], 0.03, epsilon = 1e-12);
        assert_relative_eq!(rates[3], 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_special_provision_gets_cola_early() {
        let rules = PensionRules::default();
        let adjuster = ColaAdjuster::new(&rules);
        let policy = ColaPolicy::FersCapped {
            age_at_start: 57,
            special_provision: true,
        };

        assert_relative_eq!(adjuster.effective_rate(&policy, 0.025, 57), 0.02);
    }

    #[test]
    fn test_invalid_months_rejected() {
        let rules = PensionRules::default();
        let mut bad = input(0.02, 3);
        bad.months_in_first_year = 13;

        assert!(ColaAdjuster::new(&rules).adjust(&bad).is_err());
    }
}
