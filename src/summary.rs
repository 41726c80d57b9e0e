//! Run-level record of a planning run.
//!
//! After all scripts are written, `<render_root>/plan.json` lists every planned model
//! with the samples baked into its scripts, plus the manifest rows that were skipped
//! because their model file was missing.
//!
//! ```ignore
//! use render_planner::summary::PlanSummary;
//!
//! let summary = PlanSummary::load("/data/render")?;
//! for model in &summary.models {
//!     println!("{} -> {}", model.index, model.render_script.display());
//! }
//! ```

use crate::PlanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the summary under the render root.
pub const SUMMARY_FILE: &str = "plan.json";

/// Version of the summary format.
pub const SUMMARY_VERSION: &str = "1.0";

/// Everything one planning run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Version of the summary format
    pub version: String,
    /// Seed of the random stream, when the run used the seeded generator
    pub seed: Option<u64>,
    /// Manifest the models were read from
    pub manifest: PathBuf,
    /// Environment maps used for every model, in emission order
    pub environment_maps: Vec<PathBuf>,
    /// Models that received a script pair
    pub models: Vec<PlannedModel>,
    /// Manifest rows without a model file
    pub skipped: Vec<SkippedModel>,
}

/// A model that received a script pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedModel {
    pub index: String,
    pub category: String,
    pub uuid: String,
    pub model_path: PathBuf,
    /// Camera position `[x, y, z]`
    pub view: [f64; 3],
    pub kd: f64,
    pub ks: f64,
    pub ns: f64,
    pub render_script: PathBuf,
    pub synthesize_script: PathBuf,
}

/// A manifest row whose model file was not found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedModel {
    pub index: String,
    pub model_path: PathBuf,
}

impl PlanSummary {
    /// Empty summary for a run over the given inputs.
    pub fn new(manifest: PathBuf, environment_maps: Vec<PathBuf>) -> Self {
        Self {
            version: SUMMARY_VERSION.to_string(),
            seed: None,
            manifest,
            environment_maps,
            models: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Number of renderer invocations across all render scripts
    pub fn render_invocations(&self) -> usize {
        self.models.len() * self.environment_maps.len() * crate::command::Pass::ALL.len()
    }

    /// Look up a planned model by manifest index
    pub fn model(&self, index: &str) -> Option<&PlannedModel> {
        self.models.iter().find(|m| m.index == index)
    }

    /// Write the summary to `<render_root>/plan.json`.
    pub fn save<P: AsRef<Path>>(&self, render_root: P) -> Result<PathBuf, PlanError> {
        let path = render_root.as_ref().join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| PlanError::io(&path, e))?;
        Ok(path)
    }

    /// Read the summary written by a previous run.
    pub fn load<P: AsRef<Path>>(render_root: P) -> Result<Self, PlanError> {
        let path = render_root.as_ref().join(SUMMARY_FILE);
        let json = fs::read_to_string(&path).map_err(|e| PlanError::io(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Check if a summary exists under `render_root`
    pub fn exists<P: AsRef<Path>>(render_root: P) -> bool {
        render_root.as_ref().join(SUMMARY_FILE).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn planned(index: &str) -> PlannedModel {
        PlannedModel {
            index: index.to_string(),
            category: "chair".to_string(),
            uuid: "abc123".to_string(),
            model_path: PathBuf::from("/data/chair/abc123/model.obj"),
            view: [0.0, 2.0, 0.0],
            kd: 0.9,
            ks: 0.1,
            ns: 42.0,
            render_script: PathBuf::from("/render/0/render.sh"),
            synthesize_script: PathBuf::from("/render/0/synthesize.sh"),
        }
    }

    #[test]
    fn test_summary_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!PlanSummary::exists(temp_dir.path()));
        assert!(matches!(
            PlanSummary::load(temp_dir.path()),
            Err(PlanError::Io { .. })
        ));
    }

    #[test]
    fn test_summary_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut summary = PlanSummary::new(
            temp_dir.path().join("dataset.csv"),
            vec![PathBuf::from("/env/a.exr"), PathBuf::from("/env/b.exr")],
        );
        summary.seed = Some(0);
        summary.models.push(planned("0"));
        summary.skipped.push(SkippedModel {
            index: "1".to_string(),
            model_path: PathBuf::from("/data/lamp/x/model.obj"),
        });

        let path = summary.save(temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join(SUMMARY_FILE));
        assert!(PlanSummary::exists(temp_dir.path()));

        let loaded = PlanSummary::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, summary);
        assert_eq!(loaded.version, SUMMARY_VERSION);
    }

    #[test]
    fn test_render_invocation_count() {
        let mut summary = PlanSummary::new(
            PathBuf::from("dataset.csv"),
            vec![PathBuf::from("a.exr"), PathBuf::from("b.exr"), PathBuf::from("c.exr")],
        );
        summary.models.push(planned("0"));
        summary.models.push(planned("5"));
        assert_eq!(summary.render_invocations(), 2 * 3 * 4);
        assert!(summary.model("5").is_some());
        assert!(summary.model("2").is_none());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SUMMARY_FILE), "{ not json").unwrap();
        assert!(matches!(
            PlanSummary::load(temp_dir.path()),
            Err(PlanError::Summary(_))
        ));
    }
}
