//! Scenario inputs, validation and the scenario file format

mod data;
pub mod store;
pub mod validate;

pub use data::*;
pub use store::{Scenario, ScenarioFile, ScenarioStore, LoadScenariosResult, SaveScenariosResult};
pub use validate::validate_scenario;
