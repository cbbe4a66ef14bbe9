//! Core projection engine for yearly retirement income projections

use super::rows::{RetirementProjectionResult, YearlyProjectionRow};
use super::state::{ProjectionState, StreamState};
use crate::account::AccountProjector;
use crate::assumptions::Assumptions;
use crate::benefits::{
    ColaAdjuster, ColaPolicy, PensionCalculator, SocialSecurityEstimator, SocialSecurityResult,
    SupplementCalculator, SupplementInput, SupplementResult,
};
use crate::error::Result;
use crate::inputs::validate::validate_scenario;
use crate::inputs::{PensionInput, RetirementSystem, ScenarioInput, TaxInput};
use crate::tax::{TaxCalculator, TaxableIncome};
use log::{debug, info};

/// Age at which the CSRS Offset reduction begins
const OFFSET_AGE: u32 = 62;

/// Main projection engine
pub struct ProjectionEngine {
    assumptions: Assumptions,
}

/// Other income for one year split by tax treatment
#[derive(Debug, Default)]
struct OtherIncome {
    taxable: f64,
    non_taxable: f64,
}

impl ProjectionEngine {
    pub fn new(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Run a full projection for one scenario
    pub fn project(&self, scenario: &ScenarioInput) -> Result<RetirementProjectionResult> {
        validate_scenario(scenario, &self.assumptions)?;
        info!(
            "Projecting ages {}-{} ({:?} annuity, claiming Social Security at {})",
            scenario.projection_start_age,
            scenario.projection_end_age,
            scenario.pension.system,
            scenario.social_security.claiming_age
        );

        let a = &self.assumptions;
        let pension = PensionCalculator::new(&a.pension).calculate(&scenario.pension)?;
        let social_security =
            SocialSecurityEstimator::new(&a.social_security).estimate(&scenario.social_security)?;
        let supplement = self.supplement(&scenario.pension, &social_security)?;

        let mut result = RetirementProjectionResult::new(pension.clone(), social_security.clone());
        for note in pension.notes.iter().chain(&social_security.notes) {
            result.add_note(note.as_str());
        }
        if let Some(s) = &supplement {
            for note in &s.notes {
                result.add_note(note.as_str());
            }
        }

        let birth_year = scenario.birth_year();
        let salary = scenario
            .account
            .annual_salary
            .unwrap_or(scenario.pension.high3_salary);
        let projector = AccountProjector::new(&scenario.account, &a.rmd, birth_year)
            .with_contributions(salary, scenario.pension.retirement_age);

        let mut state = ProjectionState::new(
            scenario.projection_start_age,
            birth_year,
            StreamState::new(scenario.pension.retirement_age, pension.annual_pension),
            StreamState::new(scenario.social_security.claiming_age, social_security.claiming_annual_amount),
            projector.initial_state(),
        );
        state.pending_offset = self.deferred_offset(&scenario.pension)?;

        // Bring streams that began before the first row up to date
        let first_stream = scenario
            .pension
            .retirement_age
            .min(scenario.social_security.claiming_age);
        for age in (first_stream + 1)..=scenario.projection_start_age {
            self.roll_forward(scenario, &mut state, age, &mut result);
        }

        let tax_calc = TaxCalculator::new(&a.tax);
        let mut row_tax = scenario.tax.clone();

        for age in scenario.projection_start_age..=scenario.projection_end_age {
            if age > scenario.projection_start_age {
                state.advance_year();
                self.roll_forward(scenario, &mut state, age, &mut result);
            }

            let mut row = YearlyProjectionRow::new(age, state.year);
            row.pension_income = state.pension.paid_at(age);
            row.supplement_income = supplement_at(supplement.as_ref(), &scenario.pension, age);
            row.social_security_income = state.social_security.paid_at(age);

            let cola_factor = self.fixed_withdrawal_factor(scenario, age);
            let account_year = projector.step(&mut state.account, age, cola_factor, &mut result.notes)?;
            row.account_withdrawal = account_year.withdrawals;
            row.account_starting_balance = account_year.starting_balance;
            row.account_balance = account_year.ending_balance;

            let other = other_income_at(scenario, age);
            row.other_income = other.taxable + other.non_taxable;
            row.total_income();

            let income = TaxableIncome {
                pension: row.pension_income * scenario.pension.taxable_fraction() + row.supplement_income,
                social_security: row.social_security_income,
                taxable_withdrawals: account_year.taxable_withdrawals,
                roth_withdrawals: account_year.withdrawals - account_year.taxable_withdrawals,
                other_taxable: other.taxable,
                non_taxable: other.non_taxable,
            };
            age_tax_input(&mut row_tax, &scenario.tax, age);
            let tax = tax_calc.calculate(&row_tax, &income)?;
            row.apply_taxes(tax.federal_tax, tax.state_tax);

            debug!(
                "age {}: gross {:.2}, taxes {:.2}, balance {:.2}",
                age, row.total_gross_income, row.total_taxes, row.account_balance
            );
            result.add_row(row);
        }

        result.supplement = supplement;
        result.finish();

        info!(
            "Projection complete: {} years, net income {:.2}",
            result.summary.years, result.summary.total_net_income
        );
        Ok(result)
    }

    /// Apply one year of COLA to each started stream and any offset due at 62
    fn roll_forward(
        &self,
        scenario: &ScenarioInput,
        state: &mut ProjectionState,
        age: u32,
        result: &mut RetirementProjectionResult,
    ) {
        let cola = ColaAdjuster::new(&self.assumptions.pension);
        let inflation = scenario.cola.assumed_inflation_rate;

        if scenario.cola.apply_to_pension && age > state.pension.start_age {
            let policy = pension_cola_policy(&scenario.pension);
            state.pension.amount *= 1.0 + cola.effective_rate(&policy, inflation, age);
        }
        if scenario.cola.apply_to_social_security && age > state.social_security.start_age {
            state.social_security.amount *= 1.0 + cola.effective_rate(&ColaPolicy::Full, inflation, age);
        }

        if state.pending_offset > 0.0 && age >= OFFSET_AGE {
            state.pension.amount = (state.pension.amount - state.pending_offset).max(0.0);
            result.add_note(format!(
                "CSRS Offset reduction of ${:.2}/year applied from age {}.",
                state.pending_offset, OFFSET_AGE
            ));
            state.pending_offset = 0.0;
        }
    }

    /// CSRS Offset reduction owed at 62 for a retirement that begins earlier
    fn deferred_offset(&self, pension: &PensionInput) -> Result<f64> {
        if pension.system != RetirementSystem::CsrsOffset
            || pension.csrs_offset.is_none()
            || pension.retirement_age >= OFFSET_AGE
        {
            return Ok(0.0);
        }
        let at_offset_age = PensionInput {
            retirement_age: OFFSET_AGE,
            ..pension.clone()
        };
        let result = PensionCalculator::new(&self.assumptions.pension).calculate(&at_offset_age)?;
        Ok(result.offset_reduction)
    }

    fn supplement(
        &self,
        pension: &PensionInput,
        social_security: &SocialSecurityResult,
    ) -> Result<Option<SupplementResult>> {
        let Some(election) = &pension.supplement else {
            return Ok(None);
        };
        if pension.system != RetirementSystem::Fers {
            return Ok(Some(SupplementResult {
                is_eligible: false,
                annual_amount: 0.0,
                monthly_amount: 0.0,
                earnings_test_reduction: 0.0,
                ends_at_age: self.assumptions.social_security.earliest_claiming_age,
                notes: vec!["The annuity supplement is only paid under FERS.".into()],
            }));
        }

        let input = SupplementInput {
            ss_at_62_monthly: social_security.estimated_at_62,
            fers_service_years: pension.years_of_service,
            retirement_age: pension.retirement_age,
            annual_earned_income: election.annual_earned_income,
        };
        let calc = SupplementCalculator::new(&self.assumptions.pension, &self.assumptions.social_security);
        calc.calculate(&input).map(Some)
    }

    /// Inflation factor for a fixed withdrawal at `age`
    fn fixed_withdrawal_factor(&self, scenario: &ScenarioInput, age: u32) -> f64 {
        if !scenario.cola.apply_to_fixed_withdrawal {
            return 1.0;
        }
        let years = age.saturating_sub(scenario.account.withdrawal_start_age);
        (1.0 + scenario.cola.assumed_inflation_rate).powi(years as i32)
    }
}

/// FERS annuities get the capped COLA; CSRS gets full inflation
fn pension_cola_policy(pension: &PensionInput) -> ColaPolicy {
    match pension.system {
        RetirementSystem::Fers => ColaPolicy::FersCapped {
            age_at_start: pension.retirement_age,
            special_provision: pension.special_provision,
        },
        RetirementSystem::Csrs | RetirementSystem::CsrsOffset => ColaPolicy::Full,
    }
}

fn supplement_at(supplement: Option<&SupplementResult>, pension: &PensionInput, age: u32) -> f64 {
    match supplement {
        Some(s) if s.is_eligible && age >= pension.retirement_age && age < s.ends_at_age => s.annual_amount,
        _ => 0.0,
    }
}

fn other_income_at(scenario: &ScenarioInput, age: u32) -> OtherIncome {
    let inflation = scenario.cola.assumed_inflation_rate;
    let mut other = OtherIncome::default();

    for source in scenario.other_income.sources.iter().filter(|s| s.is_active(age)) {
        let mut amount = source.annual_amount();
        if source.apply_cola {
            amount *= (1.0 + inflation).powi((age - source.start_age) as i32);
        }
        if source.taxable {
            other.taxable += amount;
        } else {
            other.non_taxable += amount;
        }
    }
    other
}

/// Age the filer and spouse to the row's attained age
fn age_tax_input(row_tax: &mut TaxInput, base: &TaxInput, age: u32) {
    row_tax.age = age;
    row_tax.spouse_age = base
        .spouse_age
        .map(|spouse| (spouse + age).saturating_sub(base.age));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectionError;
    use crate::inputs::fixtures::fers_scenario;
    use crate::inputs::{
        CsrsOffsetInput, IncomeFrequency, OtherIncomeSource, SupplementElection, WithdrawalStrategy,
    };
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn engine() -> ProjectionEngine {
        ProjectionEngine::new(Assumptions::default_tables())
    }

    #[test]
    fn test_end_to_end_fers_scenario() {
        let result = engine().project(&fers_scenario()).unwrap();

        assert_eq!(result.rows.len(), 29);
        assert_eq!(result.summary.years, 29);

        let first = &result.rows[0];
        assert_eq!(first.age, 62);
        assert_eq!(first.year, 2025);
        assert_relative_eq!(first.pension_income, 33_000.0, epsilon = 1e-6);
        assert_relative_eq!(first.account_starting_balance, 400_000.0);
        assert_relative_eq!(first.account_withdrawal, 24_000.0, epsilon = 1e-9);
        assert_relative_eq!(first.account_balance, 400_000.0 * 1.06 - 24_000.0, epsilon = 1e-6);
        assert_eq!(first.social_security_income, 0.0);

        let at_67 = &result.rows[5];
        assert_eq!(at_67.age, 67);
        assert_relative_eq!(at_67.social_security_income, 30_000.0, epsilon = 1e-6);

        assert_eq!(result.rows.last().map(|r| r.age), Some(90));
    }

    #[test]
    fn test_rows_and_summary_invariants() {
        let result = engine().project(&fers_scenario()).unwrap();

        for (i, row) in result.rows.iter().enumerate() {
            assert_eq!(row.age, 62 + i as u32);
            assert_eq!(row.year, 1963 + row.age as i32);
            assert_relative_eq!(row.net_income, row.total_gross_income - row.total_taxes, epsilon = 1e-9);
            assert!(row.total_taxes >= 0.0);
        }

        let gross: f64 = result.rows.iter().map(|r| r.total_gross_income).sum();
        let net: f64 = result.rows.iter().map(|r| r.net_income).sum();
        let max_balance = result.rows.iter().map(|r| r.account_balance).fold(0.0, f64::max);
        assert_relative_eq!(result.summary.total_gross_income, gross, epsilon = 1e-6);
        assert_relative_eq!(result.summary.total_net_income, net, epsilon = 1e-6);
        assert_relative_eq!(result.summary.max_account_balance, max_balance);
        assert_eq!(
            result.summary.final_account_balance,
            result.rows.last().map(|r| r.account_balance).unwrap_or(0.0)
        );
    }

    #[test]
    fn test_invalid_scenario_fails_fast() {
        let mut scenario = fers_scenario();
        scenario.pension.high3_salary = 0.0;

        let err = engine().project(&scenario).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidInput { .. }));

        let mut scenario = fers_scenario();
        scenario.projection_end_age = 60;
        assert!(engine().project(&scenario).is_err());
    }

    #[test]
    fn test_cola_compounds_each_stream() {
        let mut scenario = fers_scenario();
        scenario.cola.assumed_inflation_rate = 0.025;

        let result = engine().project(&scenario).unwrap();

        // FERS diet COLA: 2.5% inflation grants 2%
        assert_relative_eq!(result.rows[1].pension_income, 33_000.0 * 1.02, epsilon = 1e-6);
        assert_relative_eq!(result.rows[5].social_security_income, 30_000.0, epsilon = 1e-6);
        assert_relative_eq!(result.rows[6].social_security_income, 30_000.0 * 1.025, epsilon = 1e-6);
        // fixed withdrawal stays nominal by default
        assert_relative_eq!(result.rows[1].account_withdrawal, 24_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fixed_withdrawal_follows_inflation_when_enabled() {
        let mut scenario = fers_scenario();
        scenario.cola.assumed_inflation_rate = 0.025;
        scenario.cola.apply_to_fixed_withdrawal = true;

        let result = engine().project(&scenario).unwrap();

        for k in 0..5 {
            assert_relative_eq!(
                result.rows[k].account_withdrawal,
                24_000.0 * 1.025_f64.powi(k as i32),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_excluded_pension_portion_lowers_tax() {
        let full = engine().project(&fers_scenario()).unwrap();

        let mut scenario = fers_scenario();
        scenario.pension.taxable_fraction = Some(0.8);
        let partial = engine().project(&scenario).unwrap();

        assert_relative_eq!(partial.rows[0].pension_income, full.rows[0].pension_income);
        assert_relative_eq!(partial.rows[0].total_gross_income, full.rows[0].total_gross_income);
        assert!(partial.rows[0].total_taxes < full.rows[0].total_taxes);
        for row in &partial.rows {
            assert_relative_eq!(row.net_income, row.total_gross_income - row.total_taxes, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_taxable_fraction_out_of_range_rejected() {
        let mut scenario = fers_scenario();
        scenario.pension.taxable_fraction = Some(1.5);
        let err = engine().project(&scenario).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidInput { ref field, .. } if field == "pension.taxableFraction"));
    }

    #[test]
    fn test_streams_started_before_projection_are_compounded() {
        let mut scenario = fers_scenario();
        scenario.cola.assumed_inflation_rate = 0.025;
        scenario.projection_start_age = 65;

        let result = engine().project(&scenario).unwrap();
        assert_eq!(result.rows[0].age, 65);
        assert_relative_eq!(result.rows[0].pension_income, 33_000.0 * 1.02_f64.powi(3), epsilon = 1e-6);
    }

    #[test]
    fn test_annuity_supplement_until_62() {
        let mut scenario = fers_scenario();
        scenario.pension.retirement_age = 57;
        scenario.pension.supplement = Some(SupplementElection { annual_earned_income: 0.0 });
        scenario.projection_start_age = 57;
        scenario.tax.age = 57;

        let result = engine().project(&scenario).unwrap();

        // SS at 62 is 70% of the 2,500 FRA estimate: 1,750 x 12 / 40 x 30
        assert_relative_eq!(result.rows[0].supplement_income, 15_750.0, epsilon = 1e-3);
        assert_relative_eq!(result.rows[4].supplement_income, 15_750.0, epsilon = 1e-3);
        assert_eq!(result.rows[5].age, 62);
        assert_eq!(result.rows[5].supplement_income, 0.0);
        assert!(result.supplement.is_some());
    }

    #[test]
    fn test_other_income_window() {
        let mut scenario = fers_scenario();
        scenario.cola.assumed_inflation_rate = 0.03;
        scenario.other_income.sources.push(OtherIncomeSource {
            id: "rental".into(),
            name: "Rental".into(),
            amount: 1_000.0,
            frequency: IncomeFrequency::Monthly,
            start_age: 63,
            end_age: Some(64),
            apply_cola: true,
            taxable: false,
        });

        let result = engine().project(&scenario).unwrap();

        assert_eq!(result.rows[0].other_income, 0.0);
        assert_relative_eq!(result.rows[1].other_income, 12_000.0);
        assert_relative_eq!(result.rows[2].other_income, 12_360.0, epsilon = 1e-6);
        assert_eq!(result.rows[3].other_income, 0.0);
    }

    #[test]
    fn test_csrs_offset_begins_at_62() {
        let mut scenario = fers_scenario();
        scenario.pension.system = RetirementSystem::CsrsOffset;
        scenario.pension.retirement_age = 60;
        scenario.pension.csrs_offset = Some(CsrsOffsetInput {
            offset_service_years: 10.0,
            ss_at_62_with_offset: 1_600.0,
            ss_at_62_without_offset: 1_000.0,
        });
        scenario.projection_start_age = 60;
        scenario.tax.age = 60;

        let result = engine().project(&scenario).unwrap();

        assert_relative_eq!(result.rows[0].pension_income, 56_250.0, epsilon = 1e-6);
        assert_relative_eq!(result.rows[2].pension_income, 56_250.0 - 4_800.0, epsilon = 1e-6);
        assert!(result.notes.iter().any(|n| n.contains("CSRS Offset")));
    }

    #[test]
    fn test_percentage_strategy_through_engine() {
        let mut scenario = fers_scenario();
        scenario.account.withdrawal_strategy = WithdrawalStrategy::Percentage { rate: 0.04 };

        let result = engine().project(&scenario).unwrap();
        assert_relative_eq!(result.rows[0].account_withdrawal, 16_000.0, epsilon = 1e-9);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_rows_balance_and_fold(
            inflation_bp in 0u32..600,
            return_bp in -500i32..1200,
            monthly in 0u32..8_000,
            start_age in 55u32..70,
            span in 0u32..30,
        ) {
            let mut scenario = fers_scenario();
            scenario.cola.assumed_inflation_rate = inflation_bp as f64 / 10_000.0;
            scenario.account.expected_return = return_bp as f64 / 10_000.0;
            scenario.account.withdrawal_strategy = WithdrawalStrategy::Fixed { monthly_amount: monthly as f64 };
            scenario.projection_start_age = start_age;
            scenario.projection_end_age = start_age + span;

            let result = engine().project(&scenario).unwrap();

            prop_assert_eq!(result.rows.len() as u32, span + 1);
            for row in &result.rows {
                prop_assert!((row.net_income - (row.total_gross_income - row.total_taxes)).abs() < 1e-6);
                prop_assert!(row.account_balance >= 0.0);
                prop_assert!(row.account_withdrawal <= row.account_starting_balance * 1.2 + 1e-6);
            }
            let taxes: f64 = result.rows.iter().map(|r| r.total_taxes).sum();
            prop_assert!((result.summary.total_taxes - taxes).abs() < 1e-6);
        }
    }
}
