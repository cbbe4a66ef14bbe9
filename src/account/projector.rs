//! Defined-contribution account simulator
//!
//! Each year contributions land first, then the year's return is credited on
//! `starting + contributions`, then the withdrawal is taken. Traditional and
//! Roth balances are carried separately so the taxable share of a withdrawal
//! is known.

use crate::assumptions::{Assumptions, RmdTable};
use crate::error::{ProjectionError, Result};
use crate::inputs::validate::validate_account;
use crate::inputs::{AccountInput, WithdrawalStrategy};
use log::debug;
use serde::{Deserialize, Serialize};

/// Running balances carried from one year to the next
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub traditional: f64,
    pub roth: f64,
    /// Age at which the account first ran dry
    pub depletion_age: Option<u32>,
}

impl AccountState {
    pub fn from_account(account: &AccountInput) -> Self {
        Self {
            traditional: account.traditional_balance,
            roth: account.roth_balance,
            depletion_age: None,
        }
    }

    pub fn balance(&self) -> f64 {
        self.traditional + self.roth
    }
}

/// One year of account activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountYear {
    pub age: u32,
    pub year: i32,
    pub starting_balance: f64,
    pub contributions: f64,
    pub returns: f64,
    pub withdrawals: f64,
    /// Portion of withdrawals drawn from the traditional balance
    pub taxable_withdrawals: f64,
    pub ending_balance: f64,
}

/// Standalone account projection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProjectionInput {
    pub account: AccountInput,
    pub birth_year: u32,
    pub start_age: u32,
    pub end_age: u32,
    /// Contributions stop at this age; defaults to the withdrawal start age
    #[serde(default)]
    pub contribution_end_age: Option<u32>,
    /// Inflation applied to fixed withdrawals after the first withdrawal year
    #[serde(default)]
    pub fixed_withdrawal_inflation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub final_balance: f64,
    pub max_balance: f64,
    pub total_contributions: f64,
    pub total_returns: f64,
    pub total_withdrawals: f64,
    pub depletion_age: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProjectionResult {
    pub years: Vec<AccountYear>,
    pub summary: AccountSummary,
    pub notes: Vec<String>,
}

impl AccountProjectionResult {
    fn new() -> Self {
        Self {
            years: Vec::new(),
            summary: AccountSummary {
                final_balance: 0.0,
                max_balance: 0.0,
                total_contributions: 0.0,
                total_returns: 0.0,
                total_withdrawals: 0.0,
                depletion_age: None,
            },
            notes: Vec::new(),
        }
    }

    fn add_year(&mut self, year: AccountYear) {
        self.years.push(year);
    }

    /// Fold the yearly rows into the summary
    fn finish(&mut self, state: &AccountState) {
        self.summary = AccountSummary {
            final_balance: self.years.last().map(|y| y.ending_balance).unwrap_or(0.0),
            max_balance: self.years.iter().map(|y| y.ending_balance).fold(0.0, f64::max),
            total_contributions: self.years.iter().map(|y| y.contributions).sum(),
            total_returns: self.years.iter().map(|y| y.returns).sum(),
            total_withdrawals: self.years.iter().map(|y| y.withdrawals).sum(),
            depletion_age: state.depletion_age,
        };
    }
}

/// Steps an account forward one year at a time
pub struct AccountProjector<'a> {
    account: &'a AccountInput,
    rmd: &'a RmdTable,
    birth_year: u32,
    salary: f64,
    contribution_end_age: u32,
}

impl<'a> AccountProjector<'a> {
    /// Projector with no further contributions
    pub fn new(account: &'a AccountInput, rmd: &'a RmdTable, birth_year: u32) -> Self {
        Self {
            account,
            rmd,
            birth_year,
            salary: account.annual_salary.unwrap_or(0.0),
            contribution_end_age: 0,
        }
    }

    /// Contribute on `salary` while the attained age is below `end_age`
    pub fn with_contributions(mut self, salary: f64, end_age: u32) -> Self {
        self.salary = salary;
        self.contribution_end_age = end_age;
        self
    }

    pub fn initial_state(&self) -> AccountState {
        AccountState::from_account(self.account)
    }

    /// Advance one year. `cola_factor` scales a fixed withdrawal.
    pub fn step(
        &self,
        state: &mut AccountState,
        age: u32,
        cola_factor: f64,
        notes: &mut Vec<String>,
    ) -> Result<AccountYear> {
        let year = self.birth_year as i32 + age as i32;
        let starting_balance = state.balance();
        let r = self.account.expected_return;

        let (traditional_contrib, roth_contrib) = if age < self.contribution_end_age {
            (
                self.salary * (self.account.contribution_rate + self.account.agency_match_rate),
                self.salary * self.account.roth_contribution_rate,
            )
        } else {
            (0.0, 0.0)
        };

        let traditional_returns = (state.traditional + traditional_contrib) * r;
        let roth_returns = (state.roth + roth_contrib) * r;
        let traditional_available = (state.traditional + traditional_contrib + traditional_returns).max(0.0);
        let roth_available = (state.roth + roth_contrib + roth_returns).max(0.0);
        let available = traditional_available + roth_available;

        let requested = self.requested_withdrawal(state, starting_balance, age, cola_factor)?;

        let (from_traditional, from_roth) = match self.account.withdrawal_strategy {
            WithdrawalStrategy::RequiredMinimum => (requested.min(traditional_available), 0.0),
            _ => {
                let total = requested.min(available);
                if available > 0.0 {
                    let share = traditional_available / available;
                    (total * share, total * (1.0 - share))
                } else {
                    (0.0, 0.0)
                }
            }
        };
        let withdrawals = from_traditional + from_roth;

        if requested > 0.0 && requested > withdrawals + 1e-9 && state.depletion_age.is_none() {
            state.depletion_age = Some(age);
            notes.push(format!(
                "Account depleted at age {}; withdrawal limited to ${:.2} of ${:.2} requested.",
                age, withdrawals, requested
            ));
            debug!("account depleted at age {}", age);
        }

        state.traditional = (traditional_available - from_traditional).max(0.0);
        state.roth = (roth_available - from_roth).max(0.0);

        Ok(AccountYear {
            age,
            year,
            starting_balance,
            contributions: traditional_contrib + roth_contrib,
            returns: traditional_returns + roth_returns,
            withdrawals,
            taxable_withdrawals: from_traditional,
            ending_balance: state.balance(),
        })
    }

    fn requested_withdrawal(
        &self,
        state: &AccountState,
        starting_balance: f64,
        age: u32,
        cola_factor: f64,
    ) -> Result<f64> {
        if age < self.account.withdrawal_start_age {
            return Ok(0.0);
        }
        match self.account.withdrawal_strategy {
            WithdrawalStrategy::Fixed { monthly_amount } => Ok(12.0 * monthly_amount * cola_factor),
            WithdrawalStrategy::Percentage { rate } => Ok(rate * starting_balance),
            WithdrawalStrategy::RequiredMinimum => {
                self.rmd.required_distribution(state.traditional, age, self.birth_year)
            }
        }
    }

    /// Project an account on its own across `start_age..=end_age`
    pub fn project(input: &AccountProjectionInput, assumptions: &Assumptions) -> Result<AccountProjectionResult> {
        validate_account(&input.account, assumptions)?;
        if input.start_age > input.end_age {
            return Err(ProjectionError::invalid("startAge", "must not exceed endAge"));
        }
        if !input.fixed_withdrawal_inflation.is_finite() || input.fixed_withdrawal_inflation <= -1.0 {
            return Err(ProjectionError::invalid(
                "fixedWithdrawalInflation",
                "must be greater than -100%",
            ));
        }

        let end_contributions = input
            .contribution_end_age
            .unwrap_or(input.account.withdrawal_start_age);
        let projector = AccountProjector::new(&input.account, &assumptions.rmd, input.birth_year)
            .with_contributions(input.account.annual_salary.unwrap_or(0.0), end_contributions);

        let mut result = AccountProjectionResult::new();
        let mut state = projector.initial_state();

        for age in input.start_age..=input.end_age {
            let years_drawing = age.saturating_sub(input.account.withdrawal_start_age);
            let cola_factor = (1.0 + input.fixed_withdrawal_inflation).powi(years_drawing as i32);
            let year = projector.step(&mut state, age, cola_factor, &mut result.notes)?;
            result.add_year(year);
        }

        result.finish(&state);
        Ok(result)
    }
}
