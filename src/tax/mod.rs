//! Income tax liability

mod calculator;

pub use calculator::{TaxCalculator, TaxableIncome, TaxLiabilityInput, TaxResult};
