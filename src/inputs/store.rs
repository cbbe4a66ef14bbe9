//! Scenario file persistence
//!
//! A scenario file is a JSON document `{ "scenarios": [ {id, name, data} ] }`.
//! This module sits outside the projection engine: the engine never calls it.

use super::data::ScenarioInput;
use crate::error::{ProjectionError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named, saved scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: u64,
    pub name: String,
    pub data: ScenarioInput,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScenariosResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadScenariosResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

/// Scenario files kept in one directory
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    dir: PathBuf,
}

impl ScenarioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a file name, adding the .json extension when missing
    pub fn path_for(&self, filename: &str) -> PathBuf {
        let path = self.dir.join(filename);
        if path.extension().map_or(false, |ext| ext == "json") {
            path
        } else {
            self.dir.join(format!("{}.json", filename))
        }
    }

    /// Write scenarios to `filename`, creating the directory if needed
    pub fn write(&self, filename: &str, scenarios: &[Scenario]) -> Result<PathBuf> {
        if filename.trim().is_empty() {
            return Err(ProjectionError::invalid("filename", "must not be empty"));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(filename);

        let file = ScenarioFile {
            scenarios: scenarios.to_vec(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;

        info!("Saved {} scenarios to {}", scenarios.len(), path.display());
        Ok(path)
    }

    pub fn read(&self, filename: &str) -> Result<ScenarioFile> {
        let path = self.path_for(filename);
        debug!("Reading scenarios from {}", path.display());

        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saved scenario files, sorted by name
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();

        Ok(names)
    }

    /// Save with the success/message envelope used at the call boundary
    pub fn save(&self, filename: &str, scenarios: &[Scenario]) -> SaveScenariosResult {
        match self.write(filename, scenarios) {
            Ok(path) => SaveScenariosResult {
                success: true,
                message: format!("Saved {} scenarios", scenarios.len()),
                path: Some(path.display().to_string()),
            },
            Err(e) => SaveScenariosResult {
                success: false,
                message: format!("Failed to save scenarios: {}", e),
                path: None,
            },
        }
    }

    /// Load with the success/message envelope used at the call boundary
    pub fn load(&self, filename: &str) -> LoadScenariosResult {
        match self.read(filename) {
            Ok(file) => LoadScenariosResult {
                success: true,
                message: format!("Loaded {} scenarios", file.scenarios.len()),
                scenarios: file.scenarios,
            },
            Err(e) => LoadScenariosResult {
                success: false,
                message: format!("Failed to load scenarios: {}", e),
                scenarios: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::fixtures::fers_scenario;

    fn temp_store(tag: &str) -> ScenarioStore {
        let dir = std::env::temp_dir().join(format!(
            "retirement_projection_store_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        ScenarioStore::new(dir)
    }

    #[test]
    fn test_save_then_load() {
        let store = temp_store("roundtrip");
        let scenarios = vec![Scenario {
            id: 1,
            name: "Retire at 62".into(),
            data: fers_scenario(),
        }];

        let saved = store.save("plans", &scenarios);
        assert!(saved.success, "{}", saved.message);
        assert!(saved.path.unwrap().ends_with("plans.json"));

        let loaded = store.load("plans.json");
        assert!(loaded.success);
        assert_eq!(loaded.scenarios, scenarios);

        assert_eq!(store.list().unwrap(), vec!["plans.json".to_string()]);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_load_missing_file_reports_failure() {
        let store = temp_store("missing");
        let loaded = store.load("nothing_here");

        assert!(!loaded.success);
        assert!(loaded.scenarios.is_empty());
        assert!(loaded.message.starts_with("Failed to load"));
    }

    #[test]
    fn test_list_without_directory_is_empty() {
        let store = temp_store("absent");
        assert!(store.list().unwrap().is_empty());
    }
}
