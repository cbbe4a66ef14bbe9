//! Survivor income projection after the annuitant's death

use crate::assumptions::PensionRules;
use crate::error::{ProjectionError, Result};
use crate::inputs::{RetirementSystem, SurvivorElection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivorInput {
    pub system: RetirementSystem,
    pub election: SurvivorElection,
    /// Unreduced annual annuity at retirement
    pub initial_annuity: f64,
    #[serde(default)]
    pub cola_rate: f64,
    pub years_to_project: u32,
    /// Annual Social Security survivor benefit, if any
    #[serde(default)]
    pub ss_survivor_amount: Option<f64>,
    /// Account balance passing to the survivor, drawn evenly over the horizon
    #[serde(default)]
    pub account_balance_at_death: Option<f64>,
    #[serde(default)]
    pub other_survivor_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivorResult {
    pub annuity_reduction: f64,
    pub survivor_share: f64,
    pub initial_survivor_annuity: f64,
    pub projected_income: Vec<f64>,
    pub total_survivor_income: f64,
    pub notes: Vec<String>,
}

pub struct SurvivorProjector<'a> {
    rules: &'a PensionRules,
}

impl<'a> SurvivorProjector<'a> {
    pub fn new(rules: &'a PensionRules) -> Self {
        Self { rules }
    }

    pub fn project(&self, input: &SurvivorInput) -> Result<SurvivorResult> {
        if !input.initial_annuity.is_finite() || input.initial_annuity < 0.0 {
            return Err(ProjectionError::invalid("initialAnnuity", "must be a non-negative number"));
        }
        if !input.cola_rate.is_finite() || input.cola_rate <= -1.0 {
            return Err(ProjectionError::invalid("colaRate", "must be greater than -100%"));
        }

        let annuity_reduction = self.rules.survivor_reduction(input.system, input.election);
        let survivor_share = self.rules.survivor_share(input.system, input.election);
        let initial_survivor_annuity = input.initial_annuity * survivor_share;

        let mut notes = Vec::new();
        if input.election == SurvivorElection::None {
            notes.push("No survivor annuity elected.".into());
        } else {
            notes.push(format!(
                "Survivor receives {:.0}% of the unreduced annuity; retiree annuity reduced {:.0}%.",
                survivor_share * 100.0,
                annuity_reduction * 100.0
            ));
        }

        let account_draw = match input.account_balance_at_death {
            Some(balance) if balance > 0.0 && input.years_to_project > 0 => {
                balance / input.years_to_project as f64
            }
            _ => 0.0,
        };
        let ss = input.ss_survivor_amount.unwrap_or(0.0);

        let mut annuity = initial_survivor_annuity;
        let mut projected_income = Vec::with_capacity(input.years_to_project as usize);
        for year in 0..input.years_to_project {
            if year > 0 {
                annuity *= 1.0 + input.cola_rate;
            }
            projected_income.push(annuity + ss + account_draw + input.other_survivor_income);
        }
        let total_survivor_income = projected_income.iter().sum();

        Ok(SurvivorResult {
            annuity_reduction,
            survivor_share,
            initial_survivor_annuity,
            projected_income,
            total_survivor_income,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input() -> SurvivorInput {
        SurvivorInput {
            system: RetirementSystem::Fers,
            election: SurvivorElection::Full,
            initial_annuity: 40_000.0,
            cola_rate: 0.0,
            years_to_project: 10,
            ss_survivor_amount: None,
            account_balance_at_death: None,
            other_survivor_income: 0.0,
        }
    }

    #[test]
    fn test_fers_full_survivor() {
        let rules = PensionRules::default();
        let result = SurvivorProjector::new(&rules).project(&input()).unwrap();

        assert_relative_eq!(result.initial_survivor_annuity, 20_000.0);
        assert_relative_eq!(result.annuity_reduction, 0.10);
        assert_eq!(result.projected_income.len(), 10);
        assert_relative_eq!(result.total_survivor_income, 200_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_csrs_partial_with_other_income() {
        let rules = PensionRules::default();
        let mut csrs = input();
        csrs.system = RetirementSystem::Csrs;
        csrs.election = SurvivorElection::Partial;
        csrs.cola_rate = 0.02;
        csrs.years_to_project = 2;
        csrs.ss_survivor_amount = Some(12_000.0);
        csrs.account_balance_at_death = Some(100_000.0);

        let result = SurvivorProjector::new(&rules).project(&csrs).unwrap();

        assert_relative_eq!(result.initial_survivor_annuity, 20_000.0);
        assert_relative_eq!(result.projected_income[0], 20_000.0 + 12_000.0 + 50_000.0);
        assert_relative_eq!(
            result.projected_income[1],
            20_400.0 + 12_000.0 + 50_000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_no_election() {
        let rules = PensionRules::default();
        let mut none = input();
        none.election = SurvivorElection::None;

        let result = SurvivorProjector::new(&rules).project(&none).unwrap();
        assert_eq!(result.initial_survivor_annuity, 0.0);
        assert_eq!(result.total_survivor_income, 0.0);
    }
}
