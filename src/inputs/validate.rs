//! Fail-fast input validation
//!
//! Each check returns the first violation found. The orchestrator validates a
//! scenario once at entry so no partial result is ever produced for bad input.

use super::data::*;
use crate::assumptions::Assumptions;
use crate::error::{ProjectionError, Result};

const MAX_AGE: u32 = 120;

fn ensure(condition: bool, field: &str, reason: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ProjectionError::invalid(field, reason))
    }
}

fn ensure_non_negative(value: f64, field: &str) -> Result<()> {
    ensure(value.is_finite() && value >= 0.0, field, "must be a non-negative number")
}

fn ensure_fraction(value: f64, field: &str) -> Result<()> {
    ensure(
        value.is_finite() && (0.0..=1.0).contains(&value),
        field,
        "must be between 0 and 1",
    )
}

pub fn validate_pension(input: &PensionInput) -> Result<()> {
    ensure(
        input.high3_salary.is_finite() && input.high3_salary > 0.0,
        "pension.high3Salary",
        "must be positive",
    )?;
    ensure_non_negative(input.years_of_service, "pension.yearsOfService")?;
    ensure_non_negative(input.unused_sick_leave_months, "pension.unusedSickLeaveMonths")?;
    ensure(
        input.part_time_proration_factor > 0.0 && input.part_time_proration_factor <= 1.0,
        "pension.partTimeProrationFactor",
        "must be greater than 0 and at most 1",
    )?;
    ensure(
        input.retirement_age <= MAX_AGE,
        "pension.retirementAge",
        "must be a plausible age",
    )?;
    if let Some(years) = input.military_service_years {
        ensure_non_negative(years, "pension.militaryServiceYears")?;
    }
    if let Some(fraction) = input.taxable_fraction {
        ensure_fraction(fraction, "pension.taxableFraction")?;
    }
    if let Some(offset) = &input.csrs_offset {
        ensure(
            input.system == RetirementSystem::CsrsOffset,
            "pension.csrsOffset",
            "only applies to the CSRS_OFFSET system",
        )?;
        ensure_non_negative(offset.offset_service_years, "pension.csrsOffset.offsetServiceYears")?;
        ensure_non_negative(offset.ss_at_62_with_offset, "pension.csrsOffset.ssAt62WithOffset")?;
        ensure_non_negative(
            offset.ss_at_62_without_offset,
            "pension.csrsOffset.ssAt62WithoutOffset",
        )?;
    }
    if let Some(supplement) = &input.supplement {
        ensure_non_negative(supplement.annual_earned_income, "pension.supplement.annualEarnedIncome")?;
    }
    Ok(())
}

pub fn validate_social_security(input: &SocialSecurityInput) -> Result<()> {
    ensure(
        (1900..=2100).contains(&input.birth_year),
        "socialSecurity.birthYear",
        "must be between 1900 and 2100",
    )?;
    ensure(
        (1..=12).contains(&input.birth_month),
        "socialSecurity.birthMonth",
        "must be between 1 and 12",
    )?;
    if let Some(day) = input.birth_day {
        ensure((1..=31).contains(&day), "socialSecurity.birthDay", "must be between 1 and 31")?;
    }
    ensure(
        input.claiming_age <= MAX_AGE,
        "socialSecurity.claimingAge",
        "must be a plausible age",
    )?;
    if let Some(benefit) = input.estimated_monthly_benefit {
        ensure_non_negative(benefit, "socialSecurity.estimatedMonthlyBenefit")?;
    }
    if let Some(statement) = &input.statement_estimates {
        ensure_non_negative(statement.at62, "socialSecurity.statementEstimates.at62")?;
        ensure_non_negative(statement.at_fra, "socialSecurity.statementEstimates.atFra")?;
        ensure_non_negative(statement.at70, "socialSecurity.statementEstimates.at70")?;
    }
    ensure_non_negative(input.average_annual_earnings, "socialSecurity.averageAnnualEarnings")?;
    for earnings in &input.earnings_history {
        ensure_non_negative(*earnings, "socialSecurity.earningsHistory")?;
    }
    Ok(())
}

pub fn validate_account(input: &AccountInput, assumptions: &Assumptions) -> Result<()> {
    ensure_non_negative(input.traditional_balance, "account.traditionalBalance")?;
    ensure_non_negative(input.roth_balance, "account.rothBalance")?;
    ensure_fraction(input.contribution_rate, "account.contributionRate")?;
    ensure_fraction(input.roth_contribution_rate, "account.rothContributionRate")?;
    ensure_fraction(input.agency_match_rate, "account.agencyMatchRate")?;
    if let Some(salary) = input.annual_salary {
        ensure_non_negative(salary, "account.annualSalary")?;
    }
    ensure(
        input.expected_return.is_finite() && input.expected_return > -1.0,
        "account.expectedReturn",
        "must be greater than -100%",
    )?;
    ensure(
        input.withdrawal_start_age <= MAX_AGE,
        "account.withdrawalStartAge",
        "must be a plausible age",
    )?;

    match &input.withdrawal_strategy {
        WithdrawalStrategy::Fixed { monthly_amount } => {
            ensure_non_negative(*monthly_amount, "account.withdrawalStrategy.monthlyAmount")
        }
        WithdrawalStrategy::Percentage { rate } => {
            ensure_fraction(*rate, "account.withdrawalStrategy.rate")
        }
        WithdrawalStrategy::RequiredMinimum => {
            if assumptions.rmd.is_empty() {
                Err(ProjectionError::missing_table("rmd_divisors", "any age"))
            } else {
                Ok(())
            }
        }
    }
}

pub fn validate_tax(input: &TaxInput, assumptions: &Assumptions) -> Result<()> {
    ensure_fraction(input.state_tax_rate, "tax.stateTaxRate")?;
    ensure_non_negative(input.state_deduction, "tax.stateDeduction")?;
    ensure_non_negative(input.itemized_deductions, "tax.itemizedDeductions")?;
    ensure_non_negative(input.federal_tax_credits, "tax.federalTaxCredits")?;
    ensure_non_negative(input.state_tax_credits, "tax.stateTaxCredits")?;

    let year = assumptions.tax.resolve_year(input.tax_year)?;
    assumptions.tax.brackets(year, input.filing_status)?;
    assumptions.tax.standard_deduction(year, input.filing_status)?;
    assumptions.tax.ss_thresholds(input.filing_status)?;
    Ok(())
}

pub fn validate_cola(input: &ColaInput) -> Result<()> {
    ensure(
        input.assumed_inflation_rate.is_finite()
            && input.assumed_inflation_rate > -1.0
            && input.assumed_inflation_rate <= 1.0,
        "cola.assumedInflationRate",
        "must be greater than -100% and at most 100%",
    )
}

pub fn validate_other_income(input: &OtherIncomeInput) -> Result<()> {
    for (i, source) in input.sources.iter().enumerate() {
        ensure_non_negative(source.amount, &format!("otherIncome.sources[{}].amount", i))?;
        if let Some(end) = source.end_age {
            ensure(
                end >= source.start_age,
                &format!("otherIncome.sources[{}].endAge", i),
                "must not precede startAge",
            )?;
        }
    }
    Ok(())
}

/// Validate a complete scenario, stopping at the first violation
pub fn validate_scenario(input: &ScenarioInput, assumptions: &Assumptions) -> Result<()> {
    ensure(
        input.projection_start_age <= input.projection_end_age,
        "projectionStartAge",
        "must not exceed projectionEndAge",
    )?;
    ensure(
        input.projection_end_age <= MAX_AGE,
        "projectionEndAge",
        "must be at most 120",
    )?;

    validate_pension(&input.pension)?;
    validate_social_security(&input.social_security)?;
    validate_account(&input.account, assumptions)?;
    validate_tax(&input.tax, assumptions)?;
    validate_cola(&input.cola)?;
    validate_other_income(&input.other_income)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::fixtures::fers_scenario;

    #[test]
    fn test_valid_scenario_passes() {
        let assumptions = Assumptions::default_tables();
        assert!(validate_scenario(&fers_scenario(), &assumptions).is_ok());
    }

    #[test]
    fn test_inverted_horizon_rejected() {
        let assumptions = Assumptions::default_tables();
        let mut scenario = fers_scenario();
        scenario.projection_start_age = 91;

        let err = validate_scenario(&scenario, &assumptions).unwrap_err();
        match err {
            ProjectionError::InvalidInput { field, .. } => assert_eq!(field, "projectionStartAge"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_positive_high3_rejected() {
        let mut scenario = fers_scenario();
        scenario.pension.high3_salary = 0.0;
        assert!(validate_pension(&scenario.pension).is_err());
    }

    #[test]
    fn test_proration_bounds() {
        let mut scenario = fers_scenario();
        scenario.pension.part_time_proration_factor = 1.5;
        assert!(validate_pension(&scenario.pension).is_err());

        scenario.pension.part_time_proration_factor = 0.0;
        assert!(validate_pension(&scenario.pension).is_err());

        scenario.pension.part_time_proration_factor = 0.5;
        assert!(validate_pension(&scenario.pension).is_ok());
    }

    #[test]
    fn test_unknown_tax_year_is_missing_table() {
        let assumptions = Assumptions::default_tables();
        let mut scenario = fers_scenario();
        scenario.tax.tax_year = Some(2001);

        assert!(matches!(
            validate_scenario(&scenario, &assumptions),
            Err(ProjectionError::MissingTable { .. })
        ));
    }

    #[test]
    fn test_other_income_end_before_start_rejected() {
        let mut scenario = fers_scenario();
        scenario.other_income.sources.push(OtherIncomeSource {
            id: "consulting".into(),
            name: "Consulting".into(),
            amount: 10_000.0,
            frequency: IncomeFrequency::Annual,
            start_age: 65,
            end_age: Some(64),
            apply_cola: false,
            taxable: true,
        });

        assert!(validate_other_income(&scenario.other_income).is_err());
    }
}
