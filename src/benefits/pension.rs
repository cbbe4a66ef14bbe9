//! Defined-benefit annuity for FERS, CSRS and CSRS Offset

use crate::assumptions::PensionRules;
use crate::error::Result;
use crate::inputs::validate::validate_pension;
use crate::inputs::{PensionInput, RetirementSystem, SurvivorElection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionResult {
    pub annual_pension: f64,
    pub monthly_pension: f64,
    /// Annuity before early, survivor and offset reductions
    pub gross_annual_pension: f64,
    pub multiplier: f64,
    pub service_years_credited: f64,
    pub sick_leave_credit_years: f64,
    pub early_retirement_reduction: f64,
    pub survivor_reduction: f64,
    pub offset_reduction: f64,
    pub proration_applied: bool,
    pub notes: Vec<String>,
}

/// Computes the first-year annuity from salary, service and elections
pub struct PensionCalculator<'a> {
    rules: &'a PensionRules,
}

impl<'a> PensionCalculator<'a> {
    pub fn new(rules: &'a PensionRules) -> Self {
        Self { rules }
    }

    pub fn calculate(&self, input: &PensionInput) -> Result<PensionResult> {
        validate_pension(input)?;

        let mut notes = Vec::new();

        let sick_leave_years = input.unused_sick_leave_months / 12.0;
        let military_years = input.military_service_years.unwrap_or(0.0);
        let eligibility_service = input.years_of_service + military_years;
        let full_service = eligibility_service + sick_leave_years;

        if sick_leave_years > 0.0 {
            notes.push(format!(
                "Unused sick leave adds {:.2} years of service credit.",
                sick_leave_years
            ));
        }

        let proration = input.part_time_proration_factor;
        let proration_applied = proration < 1.0;
        let credited = full_service * proration;
        if proration_applied {
            notes.push(format!("Part-time proration factor {:.2} applied to service.", proration));
        }

        let (gross, multiplier) = match input.system {
            RetirementSystem::Fers => {
                let multiplier = self.fers_multiplier(input.retirement_age, eligibility_service);
                if multiplier > self.rules.fers_multiplier {
                    notes.push(format!(
                        "Enhanced {:.1}% multiplier applies (age {}+ with {}+ years).",
                        multiplier * 100.0,
                        self.rules.fers_enhanced_min_age,
                        self.rules.fers_enhanced_min_service
                    ));
                }
                (input.high3_salary * credited * multiplier, multiplier)
            }
            RetirementSystem::Csrs | RetirementSystem::CsrsOffset => {
                let (mut annuity, rate) = self.csrs_annuity(input.high3_salary, full_service);
                let cap = input.high3_salary * self.rules.csrs_max_share_of_high3;
                if annuity > cap {
                    annuity = cap;
                    notes.push(format!(
                        "{:.0}% of high-3 maximum applied.",
                        self.rules.csrs_max_share_of_high3 * 100.0
                    ));
                }
                (annuity * proration, rate)
            }
        };

        let mut annuity = gross;

        let early_retirement_reduction = match input.system {
            RetirementSystem::Fers => {
                let years_under = self.fers_reduction_years(input.retirement_age, eligibility_service);
                let reduction = gross * self.rules.fers_early_reduction_per_year * years_under as f64;
                if reduction > 0.0 {
                    notes.push(format!(
                        "MRA+10 early retirement reduction of {:.0}% ({} years under {}).",
                        self.rules.fers_early_reduction_per_year * years_under as f64 * 100.0,
                        years_under,
                        self.rules.fers_unreduced_age
                    ));
                }
                reduction.min(annuity)
            }
            _ => 0.0,
        };
        annuity -= early_retirement_reduction;

        let survivor_pct = self.rules.survivor_reduction(input.system, input.survivor_election);
        let survivor_reduction = annuity * survivor_pct;
        annuity -= survivor_reduction;
        match input.survivor_election {
            SurvivorElection::None => {}
            SurvivorElection::Partial => notes.push(format!(
                "Partial survivor benefit elected ({:.0}% reduction).",
                survivor_pct * 100.0
            )),
            SurvivorElection::Full => notes.push(format!(
                "Full survivor benefit elected ({:.0}% reduction).",
                survivor_pct * 100.0
            )),
        }

        let offset_reduction = if input.system == RetirementSystem::CsrsOffset {
            self.offset_reduction(input, &mut notes)
        } else {
            0.0
        };
        annuity = (annuity - offset_reduction).max(0.0);

        Ok(PensionResult {
            annual_pension: annuity,
            monthly_pension: annuity / 12.0,
            gross_annual_pension: gross,
            multiplier,
            service_years_credited: credited,
            sick_leave_credit_years: sick_leave_years,
            early_retirement_reduction,
            survivor_reduction,
            offset_reduction,
            proration_applied,
            notes,
        })
    }

    fn fers_multiplier(&self, retirement_age: u32, service: f64) -> f64 {
        if retirement_age >= self.rules.fers_enhanced_min_age
            && service >= self.rules.fers_enhanced_min_service
        {
            self.rules.fers_enhanced_multiplier
        } else {
            self.rules.fers_multiplier
        }
    }

    /// Years under the unreduced age, zero unless this is an MRA+10 retirement
    fn fers_reduction_years(&self, retirement_age: u32, service: f64) -> u32 {
        if self.rules.is_immediate_unreduced(retirement_age, service) {
            0
        } else {
            self.rules.fers_unreduced_age.saturating_sub(retirement_age)
        }
    }

    /// Tiered CSRS annuity; returns (annuity, average multiplier)
    fn csrs_annuity(&self, high3: f64, service: f64) -> (f64, f64) {
        let mut remaining = service;
        let mut factor = 0.0;
        for tier in &self.rules.csrs_tiers {
            if remaining <= 0.0 {
                break;
            }
            let years = remaining.min(tier.years);
            factor += years * tier.multiplier;
            remaining -= years;
        }

        let average = if service > 0.0 { factor / service } else { 0.0 };
        (high3 * factor, average)
    }

    /// Annual CSRS Offset reduction, applied from age 62
    fn offset_reduction(&self, input: &PensionInput, notes: &mut Vec<String>) -> f64 {
        let Some(offset) = &input.csrs_offset else {
            notes.push("CSRS Offset selected without Social Security figures; no offset applied.".into());
            return 0.0;
        };
        if input.retirement_age < 62 {
            notes.push("CSRS Offset reduction begins at age 62.".into());
            return 0.0;
        }

        let by_difference = offset.ss_at_62_with_offset - offset.ss_at_62_without_offset;
        let by_service = offset.ss_at_62_with_offset * offset.offset_service_years
            / self.rules.csrs_offset_divisor_years;
        let monthly = by_difference.min(by_service).max(0.0);

        notes.push(format!("CSRS Offset reduction of ${:.2}/month applied.", monthly));
        monthly * 12.0
    }
}
