//! Federal tax tables versioned by tax year

use super::loader::LoadedTables;
use crate::error::{ProjectionError, Result};
use crate::inputs::FilingStatus;
use std::collections::{BTreeMap, HashMap};

/// One marginal bracket: income above `lower_bound` is taxed at `rate`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    pub lower_bound: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardDeduction {
    pub base: f64,
    /// Additional amount per filer (and spouse) aged 65 or over
    pub senior_addon: f64,
}

/// Provisional-income thresholds for Social Security taxation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsThresholds {
    pub base_amount: f64,
    pub adjusted_base_amount: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TaxYearTable {
    pub brackets: BTreeMap<FilingStatus, Vec<TaxBracket>>,
    pub standard_deductions: BTreeMap<FilingStatus, StandardDeduction>,
}

/// All configured tax years
#[derive(Debug, Clone)]
pub struct TaxTables {
    years: BTreeMap<u16, TaxYearTable>,
    ss_thresholds: BTreeMap<FilingStatus, SsThresholds>,
}

type BracketRow = (u16, FilingStatus, f64, f64);

// (year, status, [(lower_bound, rate)])
const DEFAULT_BRACKETS: &[(u16, FilingStatus, [f64; 7])] = &[
    (2023, FilingStatus::Single, [0.0, 11000.0, 44725.0, 95375.0, 182100.0, 231250.0, 578125.0]),
    (2023, FilingStatus::MarriedJoint, [0.0, 22000.0, 89450.0, 190750.0, 364200.0, 462500.0, 693750.0]),
    (2023, FilingStatus::MarriedSeparate, [0.0, 11000.0, 44725.0, 95375.0, 182100.0, 231250.0, 346875.0]),
    (2023, FilingStatus::HeadOfHousehold, [0.0, 15700.0, 59850.0, 95350.0, 182100.0, 231250.0, 578100.0]),
    (2024, FilingStatus::Single, [0.0, 11600.0, 47150.0, 100525.0, 191950.0, 243725.0, 609350.0]),
    (2024, FilingStatus::MarriedJoint, [0.0, 23200.0, 94300.0, 201050.0, 383900.0, 487450.0, 731200.0]),
    (2024, FilingStatus::MarriedSeparate, [0.0, 11600.0, 47150.0, 100525.0, 191950.0, 243725.0, 365600.0]),
    (2024, FilingStatus::HeadOfHousehold, [0.0, 16550.0, 63100.0, 100500.0, 191950.0, 243700.0, 609350.0]),
    (2025, FilingStatus::Single, [0.0, 11925.0, 48475.0, 103350.0, 197300.0, 250525.0, 626350.0]),
    (2025, FilingStatus::MarriedJoint, [0.0, 23850.0, 96950.0, 206700.0, 394600.0, 501050.0, 751600.0]),
    (2025, FilingStatus::MarriedSeparate, [0.0, 11925.0, 48475.0, 103350.0, 197300.0, 250525.0, 375800.0]),
    (2025, FilingStatus::HeadOfHousehold, [0.0, 17000.0, 64850.0, 103350.0, 197300.0, 250500.0, 626350.0]),
];

const DEFAULT_BRACKET_RATES: [f64; 7] = [0.10, 0.12, 0.22, 0.24, 0.32, 0.35, 0.37];

// (year, status, base, senior add-on)
const DEFAULT_STANDARD_DEDUCTIONS: &[BracketRow] = &[
    (2023, FilingStatus::Single, 13850.0, 1850.0),
    (2023, FilingStatus::MarriedJoint, 27700.0, 1500.0),
    (2023, FilingStatus::MarriedSeparate, 13850.0, 1500.0),
    (2023, FilingStatus::HeadOfHousehold, 20800.0, 1850.0),
    (2024, FilingStatus::Single, 14600.0, 1950.0),
    (2024, FilingStatus::MarriedJoint, 29200.0, 1550.0),
    (2024, FilingStatus::MarriedSeparate, 14600.0, 1550.0),
    (2024, FilingStatus::HeadOfHousehold, 21900.0, 1950.0),
    (2025, FilingStatus::Single, 15000.0, 2000.0),
    (2025, FilingStatus::MarriedJoint, 30000.0, 1600.0),
    (2025, FilingStatus::MarriedSeparate, 15000.0, 1600.0),
    (2025, FilingStatus::HeadOfHousehold, 22500.0, 2000.0),
];

impl Default for TaxTables {
    fn default() -> Self {
        let brackets: Vec<BracketRow> = DEFAULT_BRACKETS
            .iter()
            .flat_map(|(year, status, bounds)| {
                bounds
                    .iter()
                    .zip(DEFAULT_BRACKET_RATES)
                    .map(move |(lower, rate)| (*year, *status, *lower, rate))
            })
            .collect();

        let mut ss_thresholds = HashMap::new();
        ss_thresholds.insert(FilingStatus::Single, (25000.0, 34000.0));
        ss_thresholds.insert(FilingStatus::MarriedJoint, (32000.0, 44000.0));
        ss_thresholds.insert(FilingStatus::MarriedSeparate, (25000.0, 34000.0));
        ss_thresholds.insert(FilingStatus::HeadOfHousehold, (25000.0, 34000.0));

        Self::from_rows(&brackets, DEFAULT_STANDARD_DEDUCTIONS, &ss_thresholds)
    }
}

impl TaxTables {
    /// Create from loaded CSV data
    pub fn from_loaded(loaded: &LoadedTables) -> Self {
        Self::from_rows(
            &loaded.federal_brackets,
            &loaded.standard_deductions,
            &loaded.ss_thresholds,
        )
    }

    fn from_rows(
        brackets: &[BracketRow],
        deductions: &[BracketRow],
        thresholds: &HashMap<FilingStatus, (f64, f64)>,
    ) -> Self {
        let mut years: BTreeMap<u16, TaxYearTable> = BTreeMap::new();

        for &(year, status, lower_bound, rate) in brackets {
            years
                .entry(year)
                .or_default()
                .brackets
                .entry(status)
                .or_default()
                .push(TaxBracket { lower_bound, rate });
        }
        for table in years.values_mut() {
            for list in table.brackets.values_mut() {
                list.sort_by(|a, b| a.lower_bound.total_cmp(&b.lower_bound));
            }
        }

        for &(year, status, base, senior_addon) in deductions {
            years
                .entry(year)
                .or_default()
                .standard_deductions
                .insert(status, StandardDeduction { base, senior_addon });
        }

        let ss_thresholds = thresholds
            .iter()
            .map(|(status, (base, adjusted))| {
                (
                    *status,
                    SsThresholds {
                        base_amount: *base,
                        adjusted_base_amount: *adjusted,
                    },
                )
            })
            .collect();

        Self { years, ss_thresholds }
    }

    pub fn latest_year(&self) -> Option<u16> {
        self.years.keys().next_back().copied()
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.keys().copied()
    }

    /// The requested year, or the latest configured year when none is requested
    pub fn resolve_year(&self, requested: Option<u16>) -> Result<u16> {
        match requested {
            Some(year) if self.years.contains_key(&year) => Ok(year),
            Some(year) => Err(ProjectionError::missing_table("federal_brackets", year.to_string())),
            None => self
                .latest_year()
                .ok_or_else(|| ProjectionError::missing_table("federal_brackets", "any year")),
        }
    }

    pub fn brackets(&self, year: u16, status: FilingStatus) -> Result<&[TaxBracket]> {
        self.years
            .get(&year)
            .and_then(|t| t.brackets.get(&status))
            .filter(|b| !b.is_empty())
            .map(|b| b.as_slice())
            .ok_or_else(|| {
                ProjectionError::missing_table("federal_brackets", format!("{}/{}", year, status))
            })
    }

    pub fn standard_deduction(&self, year: u16, status: FilingStatus) -> Result<StandardDeduction> {
        self.years
            .get(&year)
            .and_then(|t| t.standard_deductions.get(&status))
            .copied()
            .ok_or_else(|| {
                ProjectionError::missing_table("standard_deductions", format!("{}/{}", year, status))
            })
    }

    pub fn ss_thresholds(&self, status: FilingStatus) -> Result<SsThresholds> {
        self.ss_thresholds
            .get(&status)
            .copied()
            .ok_or_else(|| ProjectionError::missing_table("social_security_thresholds", status.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_cover_all_statuses() {
        let tables = TaxTables::default();
        assert_eq!(tables.latest_year(), Some(2025));

        for year in tables.years().collect::<Vec<_>>() {
            for status in FilingStatus::ALL {
                let brackets = tables.brackets(year, status).unwrap();
                assert_eq!(brackets.len(), 7);
                assert_eq!(brackets[0].lower_bound, 0.0);
                assert!(tables.standard_deduction(year, status).is_ok());
            }
        }
    }

    #[test]
    fn test_resolve_year() {
        let tables = TaxTables::default();
        assert_eq!(tables.resolve_year(None).unwrap(), 2025);
        assert_eq!(tables.resolve_year(Some(2023)).unwrap(), 2023);
        assert!(matches!(
            tables.resolve_year(Some(1999)),
            Err(ProjectionError::MissingTable { .. })
        ));
    }

    #[test]
    fn test_csv_matches_defaults() {
        let loaded = LoadedTables::load_default().unwrap();
        let from_csv = TaxTables::from_loaded(&loaded);
        let defaults = TaxTables::default();

        for year in defaults.years().collect::<Vec<_>>() {
            for status in FilingStatus::ALL {
                assert_eq!(
                    from_csv.brackets(year, status).unwrap(),
                    defaults.brackets(year, status).unwrap()
                );
                assert_eq!(
                    from_csv.standard_deduction(year, status).unwrap(),
                    defaults.standard_deduction(year, status).unwrap()
                );
                assert_eq!(
                    from_csv.ss_thresholds(status).unwrap(),
                    defaults.ss_thresholds(status).unwrap()
                );
            }
        }
    }
}
