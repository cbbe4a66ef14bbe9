//! CSV-based table loader
//!
//! Loads tax, pension, Social Security and RMD tables from CSV files in data/tables/

use crate::error::{ProjectionError, Result};
use crate::inputs::FilingStatus;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Default path to the tables directory
pub const DEFAULT_TABLES_PATH: &str = "data/tables";

fn open_reader(path: &Path, file: &str) -> Result<csv::Reader<File>> {
    let file = File::open(path.join(file))?;
    Ok(csv::Reader::from_reader(file))
}

fn parse_field<T: FromStr>(record: &csv::StringRecord, index: usize, file: &str) -> Result<T> {
    let raw = record.get(index).ok_or_else(|| ProjectionError::TableParse {
        file: file.to_string(),
        reason: format!("missing column {}", index),
    })?;
    raw.trim().parse().map_err(|_| ProjectionError::TableParse {
        file: file.to_string(),
        reason: format!("cannot parse '{}' in column {}", raw, index),
    })
}

fn parse_status(record: &csv::StringRecord, index: usize, file: &str) -> Result<FilingStatus> {
    let raw = record.get(index).unwrap_or_default();
    FilingStatus::from_str(raw).map_err(|reason| ProjectionError::TableParse {
        file: file.to_string(),
        reason,
    })
}

/// Federal bracket rows: (tax_year, filing_status, lower_bound, rate)
pub fn load_federal_brackets(path: &Path) -> Result<Vec<(u16, FilingStatus, f64, f64)>> {
    const FILE: &str = "federal_brackets.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push((
            parse_field(&record, 0, FILE)?,
            parse_status(&record, 1, FILE)?,
            parse_field(&record, 2, FILE)?,
            parse_field(&record, 3, FILE)?,
        ));
    }

    Ok(rows)
}

/// Standard deduction rows: (tax_year, filing_status, base, senior_addon)
pub fn load_standard_deductions(path: &Path) -> Result<Vec<(u16, FilingStatus, f64, f64)>> {
    const FILE: &str = "standard_deductions.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push((
            parse_field(&record, 0, FILE)?,
            parse_status(&record, 1, FILE)?,
            parse_field(&record, 2, FILE)?,
            parse_field(&record, 3, FILE)?,
        ));
    }

    Ok(rows)
}

/// Social Security taxability thresholds: filing_status -> (base, adjusted base)
pub fn load_ss_thresholds(path: &Path) -> Result<HashMap<FilingStatus, (f64, f64)>> {
    const FILE: &str = "social_security_thresholds.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut thresholds = HashMap::new();
    for result in reader.records() {
        let record = result?;
        let status = parse_status(&record, 0, FILE)?;
        thresholds.insert(status, (parse_field(&record, 1, FILE)?, parse_field(&record, 2, FILE)?));
    }

    Ok(thresholds)
}

/// Uniform Lifetime Table divisors: Vec<(age, divisor)>
pub fn load_rmd_divisors(path: &Path) -> Result<Vec<(u32, f64)>> {
    const FILE: &str = "rmd_divisors.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut divisors = Vec::new();
    for result in reader.records() {
        let record = result?;
        divisors.push((parse_field(&record, 0, FILE)?, parse_field(&record, 1, FILE)?));
    }

    Ok(divisors)
}

/// RMD start ages: Vec<(last birth year covered, start age)>
pub fn load_rmd_start_ages(path: &Path) -> Result<Vec<(u32, u32)>> {
    const FILE: &str = "rmd_start_ages.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut ages = Vec::new();
    for result in reader.records() {
        let record = result?;
        ages.push((parse_field(&record, 0, FILE)?, parse_field(&record, 1, FILE)?));
    }

    Ok(ages)
}

/// Key/value parameter file: HashMap<parameter, value>
pub fn load_parameters(path: &Path, file: &str) -> Result<HashMap<String, f64>> {
    let mut reader = open_reader(path, file)?;

    let mut params = HashMap::new();
    for result in reader.records() {
        let record = result?;
        let key = record.get(0).unwrap_or_default().trim().to_string();
        params.insert(key, parse_field(&record, 1, file)?);
    }

    Ok(params)
}

/// CSRS multiplier tiers in service order: Vec<(years_in_tier, multiplier)>
pub fn load_csrs_tiers(path: &Path) -> Result<Vec<(f64, f64)>> {
    const FILE: &str = "csrs_tiers.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut tiers = Vec::new();
    for result in reader.records() {
        let record = result?;
        tiers.push((parse_field(&record, 0, FILE)?, parse_field(&record, 1, FILE)?));
    }

    Ok(tiers)
}

/// Full retirement age schedule: Vec<(birth_year, fra_months)>
pub fn load_fra_schedule(path: &Path) -> Result<Vec<(u32, u32)>> {
    const FILE: &str = "full_retirement_age.csv";
    let mut reader = open_reader(path, FILE)?;

    let mut schedule = Vec::new();
    for result in reader.records() {
        let record = result?;
        schedule.push((parse_field(&record, 0, FILE)?, parse_field(&record, 1, FILE)?));
    }

    Ok(schedule)
}

/// Look up a required key in a parameter map
pub fn required(params: &HashMap<String, f64>, key: &str, file: &str) -> Result<f64> {
    params.get(key).copied().ok_or_else(|| ProjectionError::TableParse {
        file: file.to_string(),
        reason: format!("missing parameter '{}'", key),
    })
}

/// Raw table data loaded from a directory
pub struct LoadedTables {
    pub federal_brackets: Vec<(u16, FilingStatus, f64, f64)>,
    pub standard_deductions: Vec<(u16, FilingStatus, f64, f64)>,
    pub ss_thresholds: HashMap<FilingStatus, (f64, f64)>,
    pub rmd_divisors: Vec<(u32, f64)>,
    pub rmd_start_ages: Vec<(u32, u32)>,
    pub pension_parameters: HashMap<String, f64>,
    pub csrs_tiers: Vec<(f64, f64)>,
    pub social_security_parameters: HashMap<String, f64>,
    pub fra_schedule: Vec<(u32, u32)>,
}

impl LoadedTables {
    /// Load all tables from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_TABLES_PATH))
    }

    /// Load all tables from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            federal_brackets: load_federal_brackets(path)?,
            standard_deductions: load_standard_deductions(path)?,
            ss_thresholds: load_ss_thresholds(path)?,
            rmd_divisors: load_rmd_divisors(path)?,
            rmd_start_ages: load_rmd_start_ages(path)?,
            pension_parameters: load_parameters(path, "pension_parameters.csv")?,
            csrs_tiers: load_csrs_tiers(path)?,
            social_security_parameters: load_parameters(path, "social_security_parameters.csv")?,
            fra_schedule: load_fra_schedule(path)?,
        })
    }
}
