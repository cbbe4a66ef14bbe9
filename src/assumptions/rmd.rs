//! Required minimum distribution table

use super::loader::LoadedTables;
use crate::error::{ProjectionError, Result};

/// RMD divisors by attained age (IRS Uniform Lifetime Table) and start ages by birth year
#[derive(Debug, Clone, PartialEq)]
pub struct RmdTable {
    /// Distribution periods by age, ascending
    divisors: Vec<(u32, f64)>,
    /// (last birth year covered, RMD start age), ascending
    start_ages: Vec<(u32, u32)>,
}

impl Default for RmdTable {
    fn default() -> Self {
        Self {
            divisors: vec![
                (72, 27.4),
                (73, 26.5),
                (74, 25.5),
                (75, 24.6),
                (76, 23.7),
                (77, 22.9),
                (78, 22.0),
                (79, 21.1),
                (80, 20.2),
                (81, 19.4),
                (82, 18.5),
                (83, 17.7),
                (84, 16.8),
                (85, 16.0),
                (86, 15.2),
                (87, 14.4),
                (88, 13.7),
                (89, 12.9),
                (90, 12.2),
                (91, 11.5),
                (92, 10.8),
                (93, 10.1),
                (94, 9.5),
                (95, 8.9),
                (96, 8.4),
                (97, 7.8),
                (98, 7.3),
                (99, 6.8),
                (100, 6.4),
                (101, 6.0),
                (102, 5.6),
                (103, 5.2),
                (104, 4.9),
                (105, 4.6),
                (106, 4.3),
                (107, 4.1),
                (108, 3.9),
                (109, 3.7),
                (110, 3.5),
                (111, 3.4),
                (112, 3.3),
                (113, 3.1),
                (114, 3.0),
                (115, 2.9),
                (116, 2.8),
                (117, 2.7),
                (118, 2.5),
                (119, 2.3),
                (120, 2.0),
            ],
            start_ages: vec![(1950, 72), (1959, 73), (9999, 75)],
        }
    }
}

impl RmdTable {
    pub fn new(mut divisors: Vec<(u32, f64)>, mut start_ages: Vec<(u32, u32)>) -> Self {
        divisors.sort_by_key(|(age, _)| *age);
        start_ages.sort_by_key(|(year, _)| *year);
        Self { divisors, start_ages }
    }

    /// Create from loaded CSV data
    pub fn from_loaded(loaded: &LoadedTables) -> Self {
        Self::new(loaded.rmd_divisors.clone(), loaded.rmd_start_ages.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.divisors.is_empty()
    }

    /// Age at which distributions become required for a birth year
    pub fn start_age(&self, birth_year: u32) -> u32 {
        self.start_ages
            .iter()
            .find(|(through, _)| birth_year <= *through)
            .or_else(|| self.start_ages.last())
            .map(|(_, age)| *age)
            .unwrap_or(73)
    }

    /// Distribution period for an attained age
    ///
    /// Ages past the last row reuse the terminal divisor. Ages below the first
    /// row, or gaps inside the table, have no divisor.
    pub fn divisor(&self, attained_age: u32) -> Option<f64> {
        let (last_age, last_divisor) = self.divisors.last()?;
        if attained_age > *last_age {
            return Some(*last_divisor);
        }

        self.divisors
            .iter()
            .find(|(age, _)| *age == attained_age)
            .map(|(_, d)| *d)
    }

    /// Required distribution for a prior year-end balance
    ///
    /// Zero before the start age for this birth year. Once distributions are
    /// required, a missing or non-positive divisor is a table error.
    pub fn required_distribution(&self, balance: f64, attained_age: u32, birth_year: u32) -> Result<f64> {
        if attained_age < self.start_age(birth_year) {
            return Ok(0.0);
        }

        match self.divisor(attained_age) {
            Some(d) if d > 0.0 => Ok(balance.max(0.0) / d),
            _ => Err(ProjectionError::missing_table("rmd_divisors", attained_age.to_string())),
        }
    }
}
