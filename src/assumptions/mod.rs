//! Configuration tables: tax brackets, pension multipliers, Social Security rules and RMD divisors

mod tax_tables;
mod pension_rules;
mod social_security_rules;
mod rmd;
pub mod loader;

pub use tax_tables::{TaxTables, TaxBracket, StandardDeduction, SsThresholds, TaxYearTable};
pub use pension_rules::{PensionRules, CsrsTier};
pub use social_security_rules::SocialSecurityRules;
pub use rmd::RmdTable;
pub use loader::LoadedTables;

use crate::error::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Container for all table-driven assumptions
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub tax: TaxTables,
    pub pension: PensionRules,
    pub social_security: SocialSecurityRules,
    pub rmd: RmdTable,
}

impl Assumptions {
    /// Built-in tables (tax years 2023 through 2025)
    pub fn default_tables() -> Self {
        Self {
            tax: TaxTables::default(),
            pension: PensionRules::default(),
            social_security: SocialSecurityRules::default(),
            rmd: RmdTable::default(),
        }
    }

    /// Load tables from CSV files in the default location (data/tables/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_TABLES_PATH))
    }

    /// Load tables from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let loaded = LoadedTables::load_from(path)?;

        Ok(Self {
            tax: TaxTables::from_loaded(&loaded),
            pension: PensionRules::from_loaded(&loaded)?,
            social_security: SocialSecurityRules::from_loaded(&loaded)?,
            rmd: RmdTable::from_loaded(&loaded),
        })
    }

    /// Content hash of every table; equal tables give equal fingerprints
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self).hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_tables()
    }
}
