//! Federal and state income tax on retirement income

use crate::assumptions::{Assumptions, TaxBracket, TaxTables};
use crate::error::{ProjectionError, Result};
use crate::inputs::validate::validate_tax;
use crate::inputs::{FilingStatus, TaxInput};
use serde::{Deserialize, Serialize};

/// One year's income split by tax treatment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxableIncome {
    pub pension: f64,
    pub social_security: f64,
    /// Traditional account withdrawals
    pub taxable_withdrawals: f64,
    pub roth_withdrawals: f64,
    pub other_taxable: f64,
    /// Tax-exempt income that still counts toward provisional income
    pub non_taxable: f64,
}

impl TaxableIncome {
    /// Fully taxable ordinary income
    pub fn ordinary(&self) -> f64 {
        self.pension + self.taxable_withdrawals + self.other_taxable
    }

    pub fn gross(&self) -> f64 {
        self.ordinary() + self.social_security + self.roth_withdrawals + self.non_taxable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLiabilityInput {
    pub tax: TaxInput,
    pub income: TaxableIncome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub tax_year: u16,
    pub taxable_social_security: f64,
    pub deduction: f64,
    pub federal_taxable_income: f64,
    pub federal_tax: f64,
    pub state_taxable_income: f64,
    pub state_tax: f64,
    pub total_tax: f64,
    pub marginal_rate: f64,
    pub effective_federal_rate: f64,
    pub effective_state_rate: f64,
    pub effective_total_rate: f64,
    pub notes: Vec<String>,
}

pub struct TaxCalculator<'a> {
    tables: &'a TaxTables,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        Self { tables }
    }

    /// Validate the request against the tables, then calculate
    pub fn compute(input: &TaxLiabilityInput, assumptions: &Assumptions) -> Result<TaxResult> {
        validate_tax(&input.tax, assumptions)?;
        TaxCalculator::new(&assumptions.tax).calculate(&input.tax, &input.income)
    }

    pub fn calculate(&self, tax: &TaxInput, income: &TaxableIncome) -> Result<TaxResult> {
        check_income(income)?;

        let year = self.tables.resolve_year(tax.tax_year)?;
        let brackets = self.tables.brackets(year, tax.filing_status)?;
        let mut notes = Vec::new();

        let ordinary = income.ordinary();
        let taxable_social_security = self.taxable_social_security(
            tax.filing_status,
            income.social_security,
            ordinary + income.non_taxable,
        )?;
        if taxable_social_security > 0.0 && income.social_security > 0.0 {
            notes.push(format!(
                "{:.1}% of Social Security benefits are federally taxable.",
                taxable_social_security / income.social_security * 100.0
            ));
        }

        let standard = self.standard_deduction(year, tax)?;
        let deduction = if tax.itemized_deductions > standard {
            notes.push("Itemized deductions exceed the standard deduction.".into());
            tax.itemized_deductions
        } else {
            standard
        };

        let federal_taxable_income = (ordinary + taxable_social_security - deduction).max(0.0);
        let (bracket_tax, marginal_rate) = bracket_tax(brackets, federal_taxable_income);
        let federal_tax = (bracket_tax - tax.federal_tax_credits).max(0.0);

        let state_base = if tax.state_taxes_social_security {
            ordinary + income.social_security
        } else {
            ordinary
        };
        let state_taxable_income = (state_base - tax.state_deduction).max(0.0);
        let state_tax = (state_taxable_income * tax.state_tax_rate - tax.state_tax_credits).max(0.0);
        if tax.state_tax_rate > 0.0 && !tax.state_of_residence.is_empty() {
            notes.push(format!(
                "State tax for {} at a flat {:.2}%.",
                tax.state_of_residence,
                tax.state_tax_rate * 100.0
            ));
        }

        let total_tax = federal_tax + state_tax;
        let gross = income.gross();
        let rate_of = |amount: f64| if gross > 0.0 { amount / gross } else { 0.0 };

        Ok(TaxResult {
            tax_year: year,
            taxable_social_security,
            deduction,
            federal_taxable_income,
            federal_tax,
            state_taxable_income,
            state_tax,
            total_tax,
            marginal_rate,
            effective_federal_rate: rate_of(federal_tax),
            effective_state_rate: rate_of(state_tax),
            effective_total_rate: rate_of(total_tax),
            notes,
        })
    }

    /// Taxable portion of Social Security using provisional income
    ///
    /// `other_income` is everything except Social Security that counts toward
    /// provisional income, including tax-exempt income.
    pub fn taxable_social_security(
        &self,
        status: FilingStatus,
        social_security: f64,
        other_income: f64,
    ) -> Result<f64> {
        if social_security <= 0.0 {
            return Ok(0.0);
        }
        let thresholds = self.tables.ss_thresholds(status)?;
        let base = thresholds.base_amount;
        let adjusted = thresholds.adjusted_base_amount;
        let provisional = other_income + 0.5 * social_security;

        let taxable = if provisional <= base {
            0.0
        } else if provisional <= adjusted {
            (0.5 * (provisional - base)).min(0.5 * social_security)
        } else {
            let first_tier = (0.5 * (adjusted - base)).min(0.5 * social_security);
            (0.85 * (provisional - adjusted) + first_tier).min(0.85 * social_security)
        };
        Ok(taxable)
    }

    /// Standard deduction plus the age-65 add-on for the filer and a married spouse
    fn standard_deduction(&self, year: u16, tax: &TaxInput) -> Result<f64> {
        let table = self.tables.standard_deduction(year, tax.filing_status)?;
        let mut seniors = u32::from(tax.age >= 65);
        if tax.filing_status.is_married() && tax.spouse_age.is_some_and(|age| age >= 65) {
            seniors += 1;
        }
        Ok(table.base + table.senior_addon * seniors as f64)
    }
}

fn check_income(income: &TaxableIncome) -> Result<()> {
    let fields = [
        (income.pension, "income.pension"),
        (income.social_security, "income.socialSecurity"),
        (income.taxable_withdrawals, "income.taxableWithdrawals"),
        (income.roth_withdrawals, "income.rothWithdrawals"),
        (income.other_taxable, "income.otherTaxable"),
        (income.non_taxable, "income.nonTaxable"),
    ];
    match fields.iter().find(|(value, _)| !value.is_finite()) {
        Some((_, field)) => Err(ProjectionError::invalid(*field, "must be a finite number")),
        None => Ok(()),
    }
}

/// Progressive tax over bracket slices; returns (tax, marginal rate)
fn bracket_tax(brackets: &[TaxBracket], taxable: f64) -> (f64, f64) {
    if taxable <= 0.0 {
        return (0.0, 0.0);
    }

    let mut tax = 0.0;
    let mut marginal = 0.0;
    for (i, bracket) in brackets.iter().enumerate() {
        if taxable <= bracket.lower_bound {
            break;
        }
        let upper = brackets.get(i + 1).map_or(f64::INFINITY, |next| next.lower_bound);
        tax += (taxable.min(upper) - bracket.lower_bound) * bracket.rate;
        marginal = bracket.rate;
    }
    (tax, marginal)
}
