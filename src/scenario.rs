//! Scenario runner for batch and side-by-side projections
//!
//! Pre-loads assumptions once, then runs any number of scenarios against them
//! without re-reading CSV files.

use crate::error::Result;
use crate::inputs::{Scenario, ScenarioInput};
use crate::projection::{ProjectionEngine, ProjectionSummary, RetirementProjectionResult};
use crate::Assumptions;
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One named scenario's outcome in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ProjectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let results = runner.run_batch(&scenarios);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Pre-loaded base assumptions
    base_assumptions: Assumptions,
}

impl ScenarioRunner {
    /// Create runner with built-in tables
    pub fn new() -> Self {
        Self {
            base_assumptions: Assumptions::default_tables(),
        }
    }

    /// Create runner by loading tables from data/tables/
    pub fn from_csv() -> Result<Self> {
        Ok(Self {
            base_assumptions: Assumptions::from_csv()?,
        })
    }

    /// Create runner from a specific tables directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self {
            base_assumptions: Assumptions::from_csv_path(path)?,
        })
    }

    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self {
            base_assumptions: assumptions,
        }
    }

    fn engine(&self) -> ProjectionEngine {
        ProjectionEngine::new(self.base_assumptions.clone())
    }

    pub fn run(&self, scenario: &ScenarioInput) -> Result<RetirementProjectionResult> {
        self.engine().project(scenario)
    }

    /// Project many scenarios in parallel; results keep input order
    pub fn run_batch(&self, scenarios: &[ScenarioInput]) -> Vec<Result<RetirementProjectionResult>> {
        let engine = self.engine();
        scenarios.par_iter().map(|s| engine.project(s)).collect()
    }

    /// Summaries for saved scenarios, with failures reported per scenario
    pub fn compare(&self, scenarios: &[Scenario]) -> Vec<ScenarioComparison> {
        let engine = self.engine();
        scenarios
            .par_iter()
            .map(|s| match engine.project(&s.data) {
                Ok(result) => ScenarioComparison {
                    id: s.id,
                    name: s.name.clone(),
                    summary: Some(result.summary),
                    error: None,
                },
                Err(e) => {
                    warn!("Scenario {} ({}) failed: {}", s.id, s.name, e);
                    ScenarioComparison {
                        id: s.id,
                        name: s.name.clone(),
                        summary: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.base_assumptions
    }

    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.base_assumptions
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
