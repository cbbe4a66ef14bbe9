//! Federal annuity multipliers, reductions and COLA parameters

use super::loader::{required, LoadedTables};
use crate::error::Result;
use crate::inputs::{RetirementSystem, SurvivorElection};

const FILE: &str = "pension_parameters.csv";

/// A CSRS multiplier tier covering `years` of service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsrsTier {
    pub years: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PensionRules {
    pub fers_multiplier: f64,
    pub fers_enhanced_multiplier: f64,
    pub fers_enhanced_min_age: u32,
    pub fers_enhanced_min_service: f64,
    /// Reduction per year under the unreduced age for MRA+10 retirements
    pub fers_early_reduction_per_year: f64,
    pub fers_unreduced_age: u32,
    /// Minimum retirement age used for immediate-annuity eligibility
    pub minimum_retirement_age: u32,
    /// Service that makes a retirement at the MRA unreduced
    pub mra_unreduced_service: f64,
    /// Age and service for the second unreduced combination (60 with 20)
    pub alternate_unreduced_age: u32,
    pub alternate_unreduced_service: f64,
    pub csrs_tiers: Vec<CsrsTier>,
    pub csrs_max_share_of_high3: f64,
    pub survivor_reduction_partial_fers: f64,
    pub survivor_reduction_full_fers: f64,
    pub survivor_reduction_partial_csrs: f64,
    pub survivor_reduction_full_csrs: f64,
    pub survivor_share_partial_fers: f64,
    pub survivor_share_full_fers: f64,
    pub survivor_share_partial_csrs: f64,
    pub survivor_share_full_csrs: f64,
    pub csrs_offset_divisor_years: f64,
    /// FERS COLA: inflation up to the floor passes through in full
    pub fers_cola_floor: f64,
    /// FERS COLA: inflation above the ceiling is reduced by one point
    pub fers_cola_ceiling: f64,
    /// Points withheld from inflation above the ceiling
    pub fers_cola_excess_reduction: f64,
    pub fers_cola_min_age: u32,
}

impl Default for PensionRules {
    fn default() -> Self {
        Self {
            fers_multiplier: 0.010,
            fers_enhanced_multiplier: 0.011,
            fers_enhanced_min_age: 62,
            fers_enhanced_min_service: 20.0,
            fers_early_reduction_per_year: 0.05,
            fers_unreduced_age: 62,
            minimum_retirement_age: 57,
            mra_unreduced_service: 30.0,
            alternate_unreduced_age: 60,
            alternate_unreduced_service: 20.0,
            csrs_tiers: vec![
                CsrsTier { years: 5.0, multiplier: 0.015 },
                CsrsTier { years: 5.0, multiplier: 0.0175 },
                CsrsTier { years: 999.0, multiplier: 0.020 },
            ],
            csrs_max_share_of_high3: 0.80,
            survivor_reduction_partial_fers: 0.05,
            survivor_reduction_full_fers: 0.10,
            survivor_reduction_partial_csrs: 0.05,
            survivor_reduction_full_csrs: 0.10,
            survivor_share_partial_fers: 0.25,
            survivor_share_full_fers: 0.50,
            survivor_share_partial_csrs: 0.50,
            survivor_share_full_csrs: 0.55,
            csrs_offset_divisor_years: 40.0,
            fers_cola_floor: 0.02,
            fers_cola_ceiling: 0.03,
            fers_cola_excess_reduction: 0.01,
            fers_cola_min_age: 62,
        }
    }
}

impl PensionRules {
    /// Create from loaded CSV data
    pub fn from_loaded(loaded: &LoadedTables) -> Result<Self> {
        let p = &loaded.pension_parameters;

        Ok(Self {
            fers_multiplier: required(p, "fers_multiplier", FILE)?,
            fers_enhanced_multiplier: required(p, "fers_enhanced_multiplier", FILE)?,
            fers_enhanced_min_age: required(p, "fers_enhanced_min_age", FILE)? as u32,
            fers_enhanced_min_service: required(p, "fers_enhanced_min_service", FILE)?,
            fers_early_reduction_per_year: required(p, "fers_early_reduction_per_year", FILE)?,
            fers_unreduced_age: required(p, "fers_unreduced_age", FILE)? as u32,
            minimum_retirement_age: required(p, "minimum_retirement_age", FILE)? as u32,
            mra_unreduced_service: required(p, "mra_unreduced_service", FILE)?,
            alternate_unreduced_age: required(p, "alternate_unreduced_age", FILE)? as u32,
            alternate_unreduced_service: required(p, "alternate_unreduced_service", FILE)?,
            csrs_tiers: loaded
                .csrs_tiers
                .iter()
                .map(|&(years, multiplier)| CsrsTier { years, multiplier })
                .collect(),
            csrs_max_share_of_high3: required(p, "csrs_max_share_of_high3", FILE)?,
            survivor_reduction_partial_fers: required(p, "survivor_reduction_partial_fers", FILE)?,
            survivor_reduction_full_fers: required(p, "survivor_reduction_full_fers", FILE)?,
            survivor_reduction_partial_csrs: required(p, "survivor_reduction_partial_csrs", FILE)?,
            survivor_reduction_full_csrs: required(p, "survivor_reduction_full_csrs", FILE)?,
            survivor_share_partial_fers: required(p, "survivor_share_partial_fers", FILE)?,
            survivor_share_full_fers: required(p, "survivor_share_full_fers", FILE)?,
            survivor_share_partial_csrs: required(p, "survivor_share_partial_csrs", FILE)?,
            survivor_share_full_csrs: required(p, "survivor_share_full_csrs", FILE)?,
            csrs_offset_divisor_years: required(p, "csrs_offset_divisor_years", FILE)?,
            fers_cola_floor: required(p, "fers_cola_floor", FILE)?,
            fers_cola_ceiling: required(p, "fers_cola_ceiling", FILE)?,
            fers_cola_excess_reduction: required(p, "fers_cola_excess_reduction", FILE)?,
            fers_cola_min_age: required(p, "fers_cola_min_age", FILE)? as u32,
        })
    }

    /// Annuity reduction for the survivor election
    pub fn survivor_reduction(&self, system: RetirementSystem, election: SurvivorElection) -> f64 {
        match (system.is_csrs(), election) {
            (_, SurvivorElection::None) => 0.0,
            (false, SurvivorElection::Partial) => self.survivor_reduction_partial_fers,
            (false, SurvivorElection::Full) => self.survivor_reduction_full_fers,
            (true, SurvivorElection::Partial) => self.survivor_reduction_partial_csrs,
            (true, SurvivorElection::Full) => self.survivor_reduction_full_csrs,
        }
    }

    /// Share of the unreduced annuity paid to the survivor
    pub fn survivor_share(&self, system: RetirementSystem, election: SurvivorElection) -> f64 {
        match (system.is_csrs(), election) {
            (_, SurvivorElection::None) => 0.0,
            (false, SurvivorElection::Partial) => self.survivor_share_partial_fers,
            (false, SurvivorElection::Full) => self.survivor_share_full_fers,
            (true, SurvivorElection::Partial) => self.survivor_share_partial_csrs,
            (true, SurvivorElection::Full) => self.survivor_share_full_csrs,
        }
    }

    /// Immediate annuity without the MRA+10 reduction: MRA with 30 years, or 60 with 20
    pub fn is_immediate_unreduced(&self, retirement_age: u32, service: f64) -> bool {
        retirement_age >= self.fers_unreduced_age
            || (retirement_age >= self.minimum_retirement_age && service >= self.mra_unreduced_service)
            || (retirement_age >= self.alternate_unreduced_age
                && service >= self.alternate_unreduced_service)
    }

    /// FERS "diet COLA" applied to a given inflation rate
    pub fn fers_cola_rate(&self, inflation: f64) -> f64 {
        if inflation <= self.fers_cola_floor {
            inflation.max(0.0)
        } else if inflation <= self.fers_cola_ceiling {
            self.fers_cola_floor
        } else {
            inflation - self.fers_cola_excess_reduction
        }
    }
}
