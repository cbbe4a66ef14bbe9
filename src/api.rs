//! Call boundary: one function per operation plus a tagged request envelope
//!
//! Each operation takes one typed input and the configuration tables, and
//! returns its typed result or a `ProjectionError`. `dispatch` wraps the same
//! operations for transports that speak JSON.

use crate::account::{
    AccountProjectionInput, AccountProjectionResult, AccountProjector, MonteCarloInput,
    MonteCarloResult, MonteCarloSimulator,
};
use crate::assumptions::Assumptions;
use crate::benefits::{
    project_premiums, ColaAdjuster, ColaAdjustmentInput, ColaResult, HealthPremiumInput,
    HealthPremiumResult, PensionCalculator, PensionResult,
    SocialSecurityEstimator, SocialSecurityResult, SupplementCalculator, SupplementInput,
    SupplementResult, SurvivorInput, SurvivorProjector, SurvivorResult,
};
use crate::error::Result;
use crate::inputs::{PensionInput, ScenarioInput, SocialSecurityInput};
use crate::projection::{ProjectionEngine, RetirementProjectionResult};
use crate::tax::{TaxCalculator, TaxLiabilityInput, TaxResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub fn compute_pension(input: &PensionInput, assumptions: &Assumptions) -> Result<PensionResult> {
    PensionCalculator::new(&assumptions.pension).calculate(input)
}

pub fn compute_social_security(
    input: &SocialSecurityInput,
    assumptions: &Assumptions,
) -> Result<SocialSecurityResult> {
    SocialSecurityEstimator::new(&assumptions.social_security).estimate(input)
}

pub fn compute_account_projection(
    input: &AccountProjectionInput,
    assumptions: &Assumptions,
) -> Result<AccountProjectionResult> {
    AccountProjector::project(input, assumptions)
}

pub fn compute_tax_liability(input: &TaxLiabilityInput, assumptions: &Assumptions) -> Result<TaxResult> {
    TaxCalculator::compute(input, assumptions)
}

pub fn compute_cola_adjustment(input: &ColaAdjustmentInput, assumptions: &Assumptions) -> Result<ColaResult> {
    ColaAdjuster::new(&assumptions.pension).adjust(input)
}

/// Full yearly projection. Builds a fresh engine per call.
pub fn compute_retirement_projection(
    input: &ScenarioInput,
    assumptions: &Assumptions,
) -> Result<RetirementProjectionResult> {
    ProjectionEngine::new(assumptions.clone()).project(input)
}

pub fn compute_annuity_supplement(input: &SupplementInput, assumptions: &Assumptions) -> Result<SupplementResult> {
    SupplementCalculator::new(&assumptions.pension, &assumptions.social_security).calculate(input)
}

pub fn compute_survivor_benefit(input: &SurvivorInput, assumptions: &Assumptions) -> Result<SurvivorResult> {
    SurvivorProjector::new(&assumptions.pension).project(input)
}

pub fn compute_health_premiums(input: &HealthPremiumInput) -> Result<HealthPremiumResult> {
    project_premiums(input)
}

pub fn run_monte_carlo(input: &MonteCarloInput) -> Result<MonteCarloResult> {
    Ok(MonteCarloSimulator::new(input)?.run(input))
}

/// A single operation call, tagged by operation name
///
/// ```json
/// { "operation": "computePension", "input": { "system": "FERS", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "input", rename_all = "camelCase")]
pub enum CallRequest {
    ComputePension(PensionInput),
    ComputeSocialSecurity(SocialSecurityInput),
    ComputeAccountProjection(AccountProjectionInput),
    ComputeTaxLiability(TaxLiabilityInput),
    #[serde(rename = "computeCOLAAdjustment", alias = "computeColaAdjustment")]
    ComputeColaAdjustment(ColaAdjustmentInput),
    ComputeRetirementProjection(Box<ScenarioInput>),
    ComputeAnnuitySupplement(SupplementInput),
    ComputeSurvivorBenefit(SurvivorInput),
    ComputeHealthPremiums(HealthPremiumInput),
    RunMonteCarlo(MonteCarloInput),
}

impl CallRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            CallRequest::ComputePension(_) => "computePension",
            CallRequest::ComputeSocialSecurity(_) => "computeSocialSecurity",
            CallRequest::ComputeAccountProjection(_) => "computeAccountProjection",
            CallRequest::ComputeTaxLiability(_) => "computeTaxLiability",
            CallRequest::ComputeColaAdjustment(_) => "computeCOLAAdjustment",
            CallRequest::ComputeRetirementProjection(_) => "computeRetirementProjection",
            CallRequest::ComputeAnnuitySupplement(_) => "computeAnnuitySupplement",
            CallRequest::ComputeSurvivorBenefit(_) => "computeSurvivorBenefit",
            CallRequest::ComputeHealthPremiums(_) => "computeHealthPremiums",
            CallRequest::RunMonteCarlo(_) => "runMonteCarlo",
        }
    }
}

/// Transport response; `data` is present only on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CallResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

fn respond<T: Serialize>(operation: &str, result: Result<T>) -> CallResponse {
    let value = result.and_then(|r| serde_json::to_value(r).map_err(Into::into));
    match value {
        Ok(data) => CallResponse::ok(format!("{} completed", operation), data),
        Err(e) => {
            warn!("{} failed: {}", operation, e);
            CallResponse::failure(e.to_string())
        }
    }
}

/// Run a tagged request and wrap the outcome for transport
pub fn dispatch(request: &CallRequest, assumptions: &Assumptions) -> CallResponse {
    let operation = request.operation();
    debug!("Dispatching {}", operation);

    match request {
        CallRequest::ComputePension(input) => respond(operation, compute_pension(input, assumptions)),
        CallRequest::ComputeSocialSecurity(input) => {
            respond(operation, compute_social_security(input, assumptions))
        }
        CallRequest::ComputeAccountProjection(input) => {
            respond(operation, compute_account_projection(input, assumptions))
        }
        CallRequest::ComputeTaxLiability(input) => {
            respond(operation, compute_tax_liability(input, assumptions))
        }
        CallRequest::ComputeColaAdjustment(input) => {
            respond(operation, compute_cola_adjustment(input, assumptions))
        }
        CallRequest::ComputeRetirementProjection(input) => {
            respond(operation, compute_retirement_projection(input, assumptions))
        }
        CallRequest::ComputeAnnuitySupplement(input) => {
            respond(operation, compute_annuity_supplement(input, assumptions))
        }
        CallRequest::ComputeSurvivorBenefit(input) => {
            respond(operation, compute_survivor_benefit(input, assumptions))
        }
        CallRequest::ComputeHealthPremiums(input) => respond(operation, compute_health_premiums(input)),
        CallRequest::RunMonteCarlo(input) => respond(operation, run_monte_carlo(input)),
    }
}

/// Parse a JSON request body and dispatch it
pub fn dispatch_json(body: &str, assumptions: &Assumptions) -> CallResponse {
    match serde_json::from_str::<CallRequest>(body) {
        Ok(request) => dispatch(&request, assumptions),
        Err(e) => CallResponse::failure(format!("Invalid request: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::fixtures::fers_scenario;
    use serde_json::json;

    #[test]
    fn test_dispatch_pension_from_json() {
        let assumptions = Assumptions::default_tables();
        let body = json!({
            "operation": "computePension",
            "input": {
                "system": "FERS",
                "high3Salary": 100000,
                "yearsOfService": 30,
                "retirementAge": 62
            }
        })
        .to_string();

        let response = dispatch_json(&body, &assumptions);

        assert!(response.success, "{}", response.message);
        let annual = response.data.as_ref().and_then(|d| d["annualPension"].as_f64()).unwrap();
        assert!((annual - 33_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_failure_carries_no_data() {
        let assumptions = Assumptions::default_tables();
        let mut scenario = fers_scenario();
        scenario.pension.high3_salary = 0.0;

        let response = dispatch(&CallRequest::ComputeRetirementProjection(Box::new(scenario)), &assumptions);

        assert!(!response.success);
        assert!(response.data.is_none());
        assert!(response.message.contains("high3Salary"));
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let assumptions = Assumptions::default_tables();
        let response = dispatch_json(r#"{"operation":"launchRocket","input":{}}"#, &assumptions);
        assert!(!response.success);
        assert!(response.data.is_none());
    }

    #[test]
    fn test_cola_operation_name_round_trips() {
        let json = json!({
            "operation": "computeCOLAAdjustment",
            "input": { "baseAmount": 1000, "annualRate": 0.02, "startYear": 2025, "projectionYears": 3 }
        });
        let request: CallRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.operation(), "computeCOLAAdjustment");

        let response = dispatch(&request, &Assumptions::default_tables());
        assert!(response.success);
    }

    #[test]
    fn test_projection_operation_matches_engine() {
        let assumptions = Assumptions::default_tables();
        let direct = compute_retirement_projection(&fers_scenario(), &assumptions).unwrap();

        let response = dispatch(
            &CallRequest::ComputeRetirementProjection(Box::new(fers_scenario())),
            &assumptions,
        );
        let rows = response.data.as_ref().and_then(|d| d["rows"].as_array()).map(|r| r.len());
        assert_eq!(rows, Some(direct.rows.len()));
    }

    #[test]
    fn test_monte_carlo_operation() {
        let input = MonteCarloInput {
            num_simulations: 50,
            years: 10,
            initial_balance: 500_000.0,
            annual_withdrawal: 20_000.0,
            expected_return: 0.05,
            return_std_dev: 0.1,
            inflation_mean: 0.02,
            inflation_std_dev: 0.01,
            seed: Some(7),
            include_paths: false,
        };
        let response = dispatch(&CallRequest::RunMonteCarlo(input), &Assumptions::default_tables());
        assert!(response.success);
    }

    #[test]
    fn test_health_premiums_from_json() {
        let body = json!({
            "operation": "computeHealthPremiums",
            "input": {
                "fehbPremium": 3600.0,
                "medicarePremium": 2100.0,
                "includeMedicare": true,
                "premiumGrowthRate": 0.0,
                "yearsToProject": 2
            }
        })
        .to_string();

        let response = dispatch_json(&body, &Assumptions::default_tables());
        assert!(response.success, "{}", response.message);
        let total = response.data.as_ref().and_then(|d| d["totalPremiums"].as_f64());
        assert_eq!(total, Some(11_400.0));
    }
}
