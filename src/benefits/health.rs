//! Health insurance premium projection (FEHB, Medicare and other coverage)

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPremiumInput {
    /// Annual FEHB premium in the first year
    #[serde(default)]
    pub fehb_premium: f64,
    /// Annual Medicare Part B/D premium in the first year
    #[serde(default)]
    pub medicare_premium: f64,
    #[serde(default)]
    pub other_premium: f64,
    #[serde(default = "default_true", alias = "includeFEHB")]
    pub include_fehb: bool,
    #[serde(default)]
    pub include_medicare: bool,
    /// Annual premium growth applied to every premium
    #[serde(default, alias = "colaRate")]
    pub premium_growth_rate: f64,
    pub years_to_project: u32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPremiumResult {
    pub projected_premiums: Vec<f64>,
    pub total_premiums: f64,
    pub notes: Vec<String>,
}

/// Yearly premiums; year 0 pays the input amounts, later years grow by the premium rate
pub fn project_premiums(input: &HealthPremiumInput) -> Result<HealthPremiumResult> {
    for (value, field) in [
        (input.fehb_premium, "fehbPremium"),
        (input.medicare_premium, "medicarePremium"),
        (input.other_premium, "otherPremium"),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ProjectionError::invalid(field, "must be a non-negative number"));
        }
    }
    if !input.premium_growth_rate.is_finite() || input.premium_growth_rate <= -1.0 {
        return Err(ProjectionError::invalid("premiumGrowthRate", "must be greater than -100%"));
    }

    let base = if input.include_fehb { input.fehb_premium } else { 0.0 }
        + if input.include_medicare { input.medicare_premium } else { 0.0 }
        + input.other_premium;

    let mut projected_premiums = Vec::with_capacity(input.years_to_project as usize);
    let mut annual = base;
    for year in 0..input.years_to_project {
        if year > 0 {
            annual *= 1.0 + input.premium_growth_rate;
        }
        projected_premiums.push(annual);
    }
    let total_premiums = projected_premiums.iter().sum();

    let mut notes = vec![
        format!("FEHB {}.", if input.include_fehb { "included" } else { "not included" }),
        format!("Medicare {}.", if input.include_medicare { "included" } else { "not included" }),
    ];
    if input.premium_growth_rate > 0.0 {
        notes.push(format!(
            "Premiums grow {:.2}% per year.",
            input.premium_growth_rate * 100.0
        ));
    }

    Ok(HealthPremiumResult {
        projected_premiums,
        total_premiums,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input() -> HealthPremiumInput {
        HealthPremiumInput {
            fehb_premium: 3_600.0,
            medicare_premium: 2_100.0,
            other_premium: 0.0,
            include_fehb: true,
            include_medicare: true,
            premium_growth_rate: 0.05,
            years_to_project: 3,
        }
    }

    #[test]
    fn test_premiums_compound() {
        let result = project_premiums(&input()).unwrap();

        assert_eq!(result.projected_premiums.len(), 3);
        assert_relative_eq!(result.projected_premiums[0], 5_700.0);
        assert_relative_eq!(result.projected_premiums[2], 5_700.0 * 1.05 * 1.05, epsilon = 1e-9);
        assert_relative_eq!(
            result.total_premiums,
            5_700.0 * (1.0 + 1.05 + 1.05 * 1.05),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_excluded_coverage_is_not_charged() {
        let mut fehb_only = input();
        fehb_only.include_medicare = false;
        fehb_only.other_premium = 400.0;
        fehb_only.premium_growth_rate = 0.0;

        let result = project_premiums(&fehb_only).unwrap();
        assert_eq!(result.projected_premiums, vec![4_000.0; 3]);
        assert!(result.notes.iter().any(|n| n == "Medicare not included."));
    }

    #[test]
    fn test_negative_premium_rejected() {
        let mut bad = input();
        bad.medicare_premium = -1.0;
        let err = project_premiums(&bad).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidInput { ref field, .. } if field == "medicarePremium"));
    }
}
