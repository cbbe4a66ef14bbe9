//! Scenario input structures
//!
//! One canonical schema per input category. Field names serialize as camelCase so
//! the same shapes are used by the scenario file, the JSON call boundary and the CLI.
//! All rates are decimals (0.06 = 6%).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn default_birth_month() -> u32 {
    1
}

/// Federal retirement system the annuity is computed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetirementSystem {
    #[serde(rename = "FERS", alias = "fers")]
    Fers,
    #[serde(rename = "CSRS", alias = "csrs")]
    Csrs,
    /// CSRS with Social Security offset
    #[serde(rename = "CSRS_OFFSET", alias = "csrs_offset", alias = "CSRS Offset")]
    CsrsOffset,
}

impl RetirementSystem {
    pub fn is_csrs(&self) -> bool {
        matches!(self, RetirementSystem::Csrs | RetirementSystem::CsrsOffset)
    }
}

/// Survivor annuity election at retirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurvivorElection {
    #[default]
    None,
    Partial,
    #[serde(alias = "max", alias = "maximum")]
    Full,
}

/// Tax filing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 4] = [
        FilingStatus::Single,
        FilingStatus::MarriedJoint,
        FilingStatus::MarriedSeparate,
        FilingStatus::HeadOfHousehold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJoint => "married_joint",
            FilingStatus::MarriedSeparate => "married_separate",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }

    /// Married statuses receive a per-spouse senior deduction add-on
    pub fn is_married(&self) -> bool {
        matches!(self, FilingStatus::MarriedJoint | FilingStatus::MarriedSeparate)
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(FilingStatus::Single),
            "married_joint" | "married" => Ok(FilingStatus::MarriedJoint),
            "married_separate" => Ok(FilingStatus::MarriedSeparate),
            "head_of_household" => Ok(FilingStatus::HeadOfHousehold),
            other => Err(format!("Unknown filing status: {}", other)),
        }
    }
}

/// Inputs needed to compute the CSRS Offset reduction at 62
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrsOffsetInput {
    /// Years of service covered by both CSRS and Social Security
    pub offset_service_years: f64,
    /// Monthly Social Security at 62 including offset-covered earnings
    pub ss_at_62_with_offset: f64,
    /// Monthly Social Security at 62 excluding offset-covered earnings
    pub ss_at_62_without_offset: f64,
}

/// FERS annuity supplement election
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementElection {
    /// Expected annual earned income while the supplement is paid (earnings test)
    #[serde(default)]
    pub annual_earned_income: f64,
}

/// Defined-benefit pension inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionInput {
    pub system: RetirementSystem,
    pub high3_salary: f64,
    pub years_of_service: f64,
    pub retirement_age: u32,
    #[serde(default)]
    pub unused_sick_leave_months: f64,
    #[serde(default = "default_one")]
    pub part_time_proration_factor: f64,
    #[serde(default, alias = "survivorBenefitOption")]
    pub survivor_election: SurvivorElection,
    #[serde(default)]
    pub military_service_years: Option<f64>,
    /// Law enforcement, firefighter and similar special-category service
    #[serde(default)]
    pub special_provision: bool,
    #[serde(default)]
    pub csrs_offset: Option<CsrsOffsetInput>,
    #[serde(default)]
    pub supplement: Option<SupplementElection>,
    /// Share of the annuity subject to income tax after recovery of
    /// after-tax contributions; fully taxable when omitted
    #[serde(default)]
    pub taxable_fraction: Option<f64>,
}

impl PensionInput {
    pub fn taxable_fraction(&self) -> f64 {
        self.taxable_fraction.unwrap_or(1.0)
    }
}

/// Figures from an SSA benefit statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementEstimates {
    pub at62: f64,
    pub at_fra: f64,
    pub at70: f64,
}

/// Social Security inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSecurityInput {
    pub birth_year: u32,
    #[serde(default = "default_birth_month")]
    pub birth_month: u32,
    /// Day of month; SSA counts a January 1 birthday as the prior year
    #[serde(default)]
    pub birth_day: Option<u32>,
    #[serde(alias = "startAge")]
    pub claiming_age: u32,
    #[serde(default = "default_true")]
    pub is_eligible: bool,
    /// Monthly benefit at full retirement age, if known
    #[serde(default)]
    pub estimated_monthly_benefit: Option<f64>,
    #[serde(default)]
    pub statement_estimates: Option<StatementEstimates>,
    /// Fallback heuristic inputs used when no estimate is supplied
    #[serde(default)]
    pub average_annual_earnings: f64,
    #[serde(default)]
    pub years_worked: u32,
    /// Annual covered earnings, any order; the highest years feed the AIME
    #[serde(default)]
    pub earnings_history: Vec<f64>,
}

impl SocialSecurityInput {
    /// Birth year SSA uses for the full-retirement-age schedule
    pub fn fra_birth_year(&self) -> u32 {
        if self.birth_month == 1 && self.birth_day == Some(1) {
            self.birth_year - 1
        } else {
            self.birth_year
        }
    }
}

/// How the account is drawn down once withdrawals begin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WithdrawalStrategy {
    /// Level nominal monthly amount
    Fixed {
        #[serde(rename = "monthlyAmount")]
        monthly_amount: f64,
    },
    /// Fraction of the starting balance, recomputed each year
    Percentage { rate: f64 },
    /// Required minimum distribution from the actuarial divisor table
    RequiredMinimum,
}

/// Defined-contribution (TSP-style) account inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    #[serde(default)]
    pub traditional_balance: f64,
    #[serde(default)]
    pub roth_balance: f64,
    #[serde(default)]
    pub contribution_rate: f64,
    #[serde(default)]
    pub roth_contribution_rate: f64,
    #[serde(default)]
    pub agency_match_rate: f64,
    /// Contribution base; defaults to the pension high-3 in a full scenario
    #[serde(default)]
    pub annual_salary: Option<f64>,
    pub expected_return: f64,
    pub withdrawal_strategy: WithdrawalStrategy,
    pub withdrawal_start_age: u32,
}

impl AccountInput {
    pub fn starting_balance(&self) -> f64 {
        self.traditional_balance + self.roth_balance
    }
}

/// Tax inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxInput {
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub state_of_residence: String,
    #[serde(default)]
    pub state_tax_rate: f64,
    #[serde(default)]
    pub state_deduction: f64,
    #[serde(default)]
    pub state_taxes_social_security: bool,
    #[serde(default)]
    pub itemized_deductions: f64,
    #[serde(default)]
    pub federal_tax_credits: f64,
    #[serde(default)]
    pub state_tax_credits: f64,
    pub age: u32,
    #[serde(default)]
    pub spouse_age: Option<u32>,
    /// Bracket table year; the latest configured year when absent
    #[serde(default)]
    pub tax_year: Option<u16>,
}

/// Inflation assumptions and which streams they apply to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColaInput {
    pub assumed_inflation_rate: f64,
    #[serde(default = "default_true")]
    pub apply_to_pension: bool,
    #[serde(default = "default_true")]
    pub apply_to_social_security: bool,
    #[serde(default)]
    pub apply_to_fixed_withdrawal: bool,
}

impl Default for ColaInput {
    fn default() -> Self {
        Self {
            assumed_inflation_rate: 0.0,
            apply_to_pension: true,
            apply_to_social_security: true,
            apply_to_fixed_withdrawal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeFrequency {
    Monthly,
    Annual,
}

/// A time-boxed miscellaneous income stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherIncomeSource {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub frequency: IncomeFrequency,
    pub start_age: u32,
    #[serde(default)]
    pub end_age: Option<u32>,
    #[serde(default)]
    pub apply_cola: bool,
    #[serde(default = "default_true")]
    pub taxable: bool,
}

impl OtherIncomeSource {
    /// Nominal annual amount before any COLA
    pub fn annual_amount(&self) -> f64 {
        match self.frequency {
            IncomeFrequency::Monthly => self.amount * 12.0,
            IncomeFrequency::Annual => self.amount,
        }
    }

    /// Whether the source pays at the given age (end age inclusive)
    pub fn is_active(&self, age: u32) -> bool {
        age >= self.start_age && self.end_age.map_or(true, |end| age <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherIncomeInput {
    #[serde(default)]
    pub sources: Vec<OtherIncomeSource>,
}

/// A complete scenario: everything one projection run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    pub pension: PensionInput,
    pub social_security: SocialSecurityInput,
    #[serde(alias = "tsp")]
    pub account: AccountInput,
    pub tax: TaxInput,
    #[serde(default)]
    pub cola: ColaInput,
    #[serde(default)]
    pub other_income: OtherIncomeInput,
    pub projection_start_age: u32,
    pub projection_end_age: u32,
}

impl ScenarioInput {
    pub fn birth_year(&self) -> u32 {
        self.social_security.birth_year
    }

    /// Number of yearly rows a projection of this scenario produces
    pub fn projection_years(&self) -> u32 {
        self.projection_end_age
            .saturating_sub(self.projection_start_age)
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_deserializes_from_camel_case() {
        let json = r#"{
            "pension": {
                "system": "FERS",
                "high3Salary": 100000,
                "yearsOfService": 30,
                "retirementAge": 62,
                "survivorBenefitOption": "max"
            },
            "socialSecurity": { "birthYear": 1963, "startAge": 67, "estimatedMonthlyBenefit": 2500 },
            "tsp": {
                "traditionalBalance": 400000,
                "expectedReturn": 0.06,
                "withdrawalStrategy": { "type": "fixed", "monthlyAmount": 2000 },
                "withdrawalStartAge": 62
            },
            "tax": { "filingStatus": "married_joint", "age": 62 },
            "projectionStartAge": 62,
            "projectionEndAge": 90
        }"#;

        let scenario: ScenarioInput = serde_json::from_str(json).unwrap();

        assert_eq!(scenario.pension.system, RetirementSystem::Fers);
        assert_eq!(scenario.pension.survivor_election, SurvivorElection::Full);
        assert_eq!(scenario.pension.part_time_proration_factor, 1.0);
        assert_eq!(scenario.social_security.claiming_age, 67);
        assert!(scenario.social_security.is_eligible);
        assert_eq!(
            scenario.account.withdrawal_strategy,
            WithdrawalStrategy::Fixed { monthly_amount: 2000.0 }
        );
        assert_eq!(scenario.tax.filing_status, FilingStatus::MarriedJoint);
        assert!(scenario.cola.apply_to_pension);
        assert!(scenario.other_income.sources.is_empty());
        assert_eq!(scenario.projection_years(), 29);
    }

    #[test]
    fn test_other_income_window() {
        let source = OtherIncomeSource {
            id: "rental".into(),
            name: "Rental".into(),
            amount: 1000.0,
            frequency: IncomeFrequency::Monthly,
            start_age: 65,
            end_age: Some(70),
            apply_cola: false,
            taxable: true,
        };

        assert_eq!(source.annual_amount(), 12000.0);
        assert!(!source.is_active(64));
        assert!(source.is_active(65));
        assert!(source.is_active(70));
        assert!(!source.is_active(71));
    }

    #[test]
    fn test_filing_status_parse() {
        assert_eq!("married".parse::<FilingStatus>(), Ok(FilingStatus::MarriedJoint));
        assert_eq!(
            "head_of_household".parse::<FilingStatus>(),
            Ok(FilingStatus::HeadOfHousehold)
        );
        assert!("widowed".parse::<FilingStatus>().is_err());
    }
}
