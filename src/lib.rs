//! render-planner: render and synthesize scripts for ShapeNet-style datasets
//!
//! This library prepares a batch rendering job. For every model in the dataset manifest
//! it samples one random viewpoint and one random specular/diffuse material split, then
//! writes a pair of scripts under `<render_root>/<index>/`:
//!
//! - `render.sh` / `render.bat` calls the renderer once per pass (albedo, shading,
//!   specular, depth) for every environment map
//! - `synthesize.sh` / `synthesize.bat` calls ImageMagick to build `I = A * S + R`,
//!   extracts an object mask from depth, and removes the scratch buffer
//!
//! Nothing is rendered here. The same manifest and environment-map list always produce
//! byte-identical scripts.
//!
//! # Planning a dataset
//!
//! ```ignore
//! use render_planner::{plan, PlanConfig};
//!
//! let config = PlanConfig::new(
//!     "/opt/mitsuba/mitsuba",
//!     "/data/ShapeNetCore.v1",
//!     "/data/envmaps",
//!     "/data/render",
//! );
//! let summary = plan(&config)?;
//! println!("{} models, {} skipped", summary.models.len(), summary.skipped.len());
//! ```
//!
//! # Custom random streams
//!
//! Anything implementing [`sampling::RandomSource`] can drive the sampling:
//!
//! ```ignore
//! use render_planner::{emit::generate_plan, platform::ScriptFormat, sampling::SeededStream};
//!
//! let mut rng = SeededStream::new(7);
//! generate_plan(&config, ScriptFormat::SHELL, &mut rng)?;
//! ```

use std::io;
use std::path::{Path, PathBuf};

pub mod command;
pub mod emit;
pub mod manifest;
pub mod platform;
pub mod sampling;
pub mod summary;

pub use emit::{generate_plan, ScriptEmitter};
pub use manifest::{EnvironmentMap, ManifestRow, ModelRecord};
pub use platform::{detect_platform, Platform, ScriptFormat};
pub use sampling::{MaterialSample, RandomSource, SeededStream, ViewSample};
pub use summary::PlanSummary;

/// Name of the template directory looked up next to the running executable.
pub const TEMPLATE_DIR_NAME: &str = "templates";

/// Directory holding `template-{a,s,r,d}.xml` when none is configured.
///
/// Resolved at run time as `templates/` beside the running executable. Falls back to
/// `templates/` relative to the working directory if the executable path is unknown.
pub fn default_template_dir() -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => template_dir_beside(&exe),
        Err(_) => PathBuf::from(TEMPLATE_DIR_NAME),
    }
}

fn template_dir_beside(exe: &Path) -> PathBuf {
    exe.parent()
        .map(|dir| dir.join(TEMPLATE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(TEMPLATE_DIR_NAME))
}

/// Inputs of a planning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanConfig {
    /// Renderer executable written at the start of every render line
    pub renderer: PathBuf,
    /// Root containing `<category>/<uuid>/model.obj`
    pub dataset_root: PathBuf,
    /// Directory containing `list.txt` and the environment maps
    pub envmap_root: PathBuf,
    /// Output root; holds `dataset.csv`, `plan.json` and one directory per model
    pub render_root: PathBuf,
    /// Directory of the renderer scene templates
    pub template_dir: PathBuf,
    /// Where the manifest is fetched from when `dataset.csv` is missing
    pub manifest_url: String,
}

impl PlanConfig {
    /// Config with the default template directory and manifest URL.
    pub fn new(
        renderer: impl Into<PathBuf>,
        dataset_root: impl Into<PathBuf>,
        envmap_root: impl Into<PathBuf>,
        render_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            renderer: renderer.into(),
            dataset_root: dataset_root.into(),
            envmap_root: envmap_root.into(),
            render_root: render_root.into(),
            template_dir: default_template_dir(),
            manifest_url: manifest::MANIFEST_URL.to_string(),
        }
    }

    /// Use a different template directory
    pub fn with_template_dir(mut self, template_dir: impl Into<PathBuf>) -> Self {
        self.template_dir = template_dir.into();
        self
    }

    /// Local path of the manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.render_root.join(manifest::MANIFEST_FILE)
    }
}

/// Errors that abort a planning run.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The manifest is not on disk after the download step
    #[error("manifest not found: {}", .0.display())]
    MissingManifest(PathBuf),
    /// `list.txt` is missing from the environment-map root
    #[error("environment map list not found: {}", .0.display())]
    MissingInventoryList(PathBuf),
    /// A manifest data line has too few columns
    #[error("malformed manifest row at line {line}: expected at least 4 columns, found {found}")]
    MalformedRow { line: usize, found: usize },
    /// Fetching the manifest failed
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Filesystem failure
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The plan summary could not be encoded or decoded
    #[error("plan summary error: {0}")]
    Summary(#[from] serde_json::Error),
}

impl PlanError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        PlanError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Plan a dataset with the fixed seed and the host's script format.
pub fn plan(config: &PlanConfig) -> Result<PlanSummary, PlanError> {
    let mut rng = SeededStream::fixed();
    generate_plan(config, ScriptFormat::host(), &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_config_defaults() {
        let config = PlanConfig::new("/bin/mitsuba", "/data", "/env", "/render");
        assert_eq!(config.renderer, PathBuf::from("/bin/mitsuba"));
        assert_eq!(config.template_dir, default_template_dir());
        assert_eq!(config.manifest_url, manifest::MANIFEST_URL);
        assert_eq!(config.manifest_path(), Path::new("/render").join("dataset.csv"));
    }

    #[test]
    fn test_default_template_dir_follows_executable() {
        let exe = std::env::current_exe().unwrap();
        let dir = default_template_dir();
        assert_eq!(dir, exe.parent().unwrap().join("templates"));
        // Not the source tree the crate was compiled from
        assert_ne!(dir, Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"));
    }

    #[test]
    fn test_template_dir_beside_installed_binary() {
        assert_eq!(
            template_dir_beside(Path::new("/usr/local/bin/render-planner")),
            Path::new("/usr/local/bin").join("templates")
        );
        assert_eq!(template_dir_beside(Path::new("/")), PathBuf::from("templates"));
    }

    #[test]
    fn test_plan_config_template_override() {
        let config =
            PlanConfig::new("/bin/mitsuba", "/data", "/env", "/render").with_template_dir("/tpl");
        assert_eq!(config.template_dir, PathBuf::from("/tpl"));
    }

    #[test]
    fn test_plan_error_display() {
        let errors = vec![
            PlanError::MissingManifest(PathBuf::from("/render/dataset.csv")),
            PlanError::MissingInventoryList(PathBuf::from("/env/list.txt")),
            PlanError::MalformedRow { line: 3, found: 2 },
            PlanError::io(
                Path::new("/render/0"),
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ),
            PlanError::Summary(serde_json::from_str::<String>("invalid").unwrap_err()),
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(!msg.is_empty());
        }

        let row = PlanError::MalformedRow { line: 3, found: 2 };
        assert_eq!(
            row.to_string(),
            "malformed manifest row at line 3: expected at least 4 columns, found 2"
        );
    }
}
