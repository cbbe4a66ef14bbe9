//! Social Security claiming adjustments and benefit formula parameters

use super::loader::{required, LoadedTables};
use crate::error::Result;

const FILE: &str = "social_security_parameters.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct SocialSecurityRules {
    pub earliest_claiming_age: u32,
    /// No delayed retirement credits accrue after this age
    pub latest_credit_age: u32,
    pub early_reduction_first_months: u32,
    pub early_reduction_first_rate: f64,
    pub early_reduction_later_rate: f64,
    pub delayed_credit_monthly_rate: f64,
    pub pia_bend_point_1: f64,
    pub pia_bend_point_2: f64,
    pub pia_factor_1: f64,
    pub pia_factor_2: f64,
    pub pia_factor_3: f64,
    pub computation_years: u32,
    /// Annual earnings above which the FERS supplement is reduced
    pub supplement_earnings_limit: f64,
    pub supplement_service_divisor: f64,
    /// (birth_year, full retirement age in months), ascending by birth year
    fra_schedule: Vec<(u32, u32)>,
}

impl Default for SocialSecurityRules {
    fn default() -> Self {
        Self {
            earliest_claiming_age: 62,
            latest_credit_age: 70,
            early_reduction_first_months: 36,
            early_reduction_first_rate: 5.0 / 900.0,
            early_reduction_later_rate: 5.0 / 1200.0,
            delayed_credit_monthly_rate: 2.0 / 300.0,
            pia_bend_point_1: 1226.0,
            pia_bend_point_2: 7391.0,
            pia_factor_1: 0.90,
            pia_factor_2: 0.32,
            pia_factor_3: 0.15,
            computation_years: 35,
            supplement_earnings_limit: 23400.0,
            supplement_service_divisor: 40.0,
            fra_schedule: vec![
                (1937, 780),
                (1938, 782),
                (1939, 784),
                (1940, 786),
                (1941, 788),
                (1942, 790),
                (1943, 792),
                (1955, 794),
                (1956, 796),
                (1957, 798),
                (1958, 800),
                (1959, 802),
                (1960, 804),
            ],
        }
    }
}

impl SocialSecurityRules {
    /// Create from loaded CSV data
    pub fn from_loaded(loaded: &LoadedTables) -> Result<Self> {
        let p = &loaded.social_security_parameters;

        let mut fra_schedule = loaded.fra_schedule.clone();
        fra_schedule.sort_by_key(|(year, _)| *year);

        Ok(Self {
            earliest_claiming_age: required(p, "earliest_claiming_age", FILE)? as u32,
            latest_credit_age: required(p, "latest_credit_age", FILE)? as u32,
            early_reduction_first_months: required(p, "early_reduction_first_months", FILE)? as u32,
            early_reduction_first_rate: required(p, "early_reduction_first_rate", FILE)?,
            early_reduction_later_rate: required(p, "early_reduction_later_rate", FILE)?,
            delayed_credit_monthly_rate: required(p, "delayed_credit_monthly_rate", FILE)?,
            pia_bend_point_1: required(p, "pia_bend_point_1", FILE)?,
            pia_bend_point_2: required(p, "pia_bend_point_2", FILE)?,
            pia_factor_1: required(p, "pia_factor_1", FILE)?,
            pia_factor_2: required(p, "pia_factor_2", FILE)?,
            pia_factor_3: required(p, "pia_factor_3", FILE)?,
            computation_years: required(p, "computation_years", FILE)? as u32,
            supplement_earnings_limit: required(p, "supplement_earnings_limit", FILE)?,
            supplement_service_divisor: required(p, "supplement_service_divisor", FILE)?,
            fra_schedule,
        })
    }

    /// Full retirement age in months for a birth year
    pub fn full_retirement_age_months(&self, birth_year: u32) -> u32 {
        self.fra_schedule
            .iter()
            .rev()
            .find(|(year, _)| *year <= birth_year)
            .or_else(|| self.fra_schedule.first())
            .map(|(_, months)| *months)
            .unwrap_or(67 * 12)
    }

    /// Fractional reduction for claiming `months_early` months before FRA
    pub fn early_reduction(&self, months_early: u32) -> f64 {
        let first = months_early.min(self.early_reduction_first_months) as f64;
        let later = months_early.saturating_sub(self.early_reduction_first_months) as f64;
        first * self.early_reduction_first_rate + later * self.early_reduction_later_rate
    }

    /// Fractional increase for delaying `months_late` months past FRA
    pub fn delayed_credit(&self, months_late: u32) -> f64 {
        months_late as f64 * self.delayed_credit_monthly_rate
    }

    /// Primary insurance amount from average indexed monthly earnings
    pub fn primary_insurance_amount(&self, aime: f64) -> f64 {
        let aime = aime.max(0.0);
        let tier1 = aime.min(self.pia_bend_point_1);
        let tier2 = (aime.min(self.pia_bend_point_2) - self.pia_bend_point_1).max(0.0);
        let tier3 = (aime - self.pia_bend_point_2).max(0.0);

        tier1 * self.pia_factor_1 + tier2 * self.pia_factor_2 + tier3 * self.pia_factor_3
    }
}
