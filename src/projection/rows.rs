//! Yearly projection output structures

use crate::benefits::{PensionResult, SocialSecurityResult, SupplementResult};
use serde::{Deserialize, Serialize};

/// A single row of projection output for one year of age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyProjectionRow {
    // Timing
    pub age: u32,
    pub year: i32,

    // Income streams
    pub pension_income: f64,
    pub supplement_income: f64,
    pub social_security_income: f64,
    pub account_withdrawal: f64,
    pub other_income: f64,
    pub total_gross_income: f64,

    // Taxes
    pub federal_tax: f64,
    pub state_tax: f64,
    pub total_taxes: f64,

    pub net_income: f64,

    // Account
    pub account_starting_balance: f64,
    pub account_balance: f64,
}

impl YearlyProjectionRow {
    pub fn new(age: u32, year: i32) -> Self {
        Self {
            age,
            year,
            pension_income: 0.0,
            supplement_income: 0.0,
            social_security_income: 0.0,
            account_withdrawal: 0.0,
            other_income: 0.0,
            total_gross_income: 0.0,
            federal_tax: 0.0,
            state_tax: 0.0,
            total_taxes: 0.0,
            net_income: 0.0,
            account_starting_balance: 0.0,
            account_balance: 0.0,
        }
    }

    /// Sum the income streams into gross income
    pub fn total_income(&mut self) {
        self.total_gross_income = self.pension_income
            + self.supplement_income
            + self.social_security_income
            + self.account_withdrawal
            + self.other_income;
    }

    /// Record taxes and derive net income
    pub fn apply_taxes(&mut self, federal_tax: f64, state_tax: f64) {
        self.federal_tax = federal_tax;
        self.state_tax = state_tax;
        self.total_taxes = federal_tax + state_tax;
        self.net_income = self.total_gross_income - self.total_taxes;
    }
}

/// Scenario aggregates folded from the rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_gross_income: f64,
    pub total_net_income: f64,
    pub total_taxes: f64,
    pub max_account_balance: f64,
    pub final_account_balance: f64,
    pub years: u32,
}

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementProjectionResult {
    /// Yearly rows, age ascending with no gaps
    pub rows: Vec<YearlyProjectionRow>,

    pub summary: ProjectionSummary,

    pub pension: PensionResult,

    pub social_security: SocialSecurityResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplement: Option<SupplementResult>,

    pub notes: Vec<String>,
}

impl RetirementProjectionResult {
    pub fn new(pension: PensionResult, social_security: SocialSecurityResult) -> Self {
        Self {
            rows: Vec::new(),
            summary: summarize(&[]),
            pension,
            social_security,
            supplement: None,
            notes: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: YearlyProjectionRow) {
        self.rows.push(row);
    }

    /// Record a note once, skipping exact duplicates
    pub fn add_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }

    /// Refresh the summary from the current rows
    pub fn finish(&mut self) {
        self.summary = summarize(&self.rows);
    }
}

/// Fold rows into aggregates
pub fn summarize(rows: &[YearlyProjectionRow]) -> ProjectionSummary {
    ProjectionSummary {
        total_gross_income: rows.iter().map(|r| r.total_gross_income).sum(),
        total_net_income: rows.iter().map(|r| r.net_income).sum(),
        total_taxes: rows.iter().map(|r| r.total_taxes).sum(),
        max_account_balance: rows.iter().map(|r| r.account_balance).fold(0.0, f64::max),
        final_account_balance: rows.last().map(|r| r.account_balance).unwrap_or(0.0),
        years: rows.len() as u32,
    }
}
