//! Per-model script emission and the planning loop.
//!
//! For each model whose file exists, in manifest order, the emitter creates
//! `<render_root>/<index>/`, draws one view and one material from the shared stream,
//! and writes:
//!
//! - `render.<ext>`: four renderer invocations per environment map
//! - `synthesize.<ext>`: mask, conversions and composites per environment map, then one
//!   cleanup line for the scratch buffer
//!
//! # Example
//!
//! ```ignore
//! use render_planner::{emit::generate_plan, platform::ScriptFormat, sampling::SeededStream};
//!
//! let mut rng = SeededStream::fixed();
//! let summary = generate_plan(&config, ScriptFormat::host(), &mut rng)?;
//! println!("{} models planned", summary.models.len());
//! ```

use crate::command::{CompositeStep, Defines, Pass, RenderCommandBuilder, TEMP_BUFFER};
use crate::manifest::{self, EnvironmentMap, ModelRecord};
use crate::platform::ScriptFormat;
use crate::sampling::{sample_material, sample_view, MaterialSample, RandomSource, ViewSample};
use crate::summary::{PlanSummary, PlannedModel, SkippedModel};
use crate::{PlanConfig, PlanError};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Stem of the render script file name.
pub const RENDER_SCRIPT: &str = "render";

/// Stem of the synthesize script file name.
pub const SYNTHESIZE_SCRIPT: &str = "synthesize";

/// Writes the script pair of each model.
#[derive(Debug, Clone)]
pub struct ScriptEmitter<'a> {
    commands: RenderCommandBuilder,
    format: ScriptFormat,
    environment_maps: &'a [EnvironmentMap],
}

impl<'a> ScriptEmitter<'a> {
    pub fn new(
        config: &PlanConfig,
        format: ScriptFormat,
        environment_maps: &'a [EnvironmentMap],
    ) -> Self {
        Self {
            commands: RenderCommandBuilder::new(&config.renderer, &config.template_dir),
            format,
            environment_maps,
        }
    }

    /// Write both scripts of one model to the given sinks.
    ///
    /// Draws no randomness; the samples are fixed by the caller.
    pub fn write_scripts<R: Write, S: Write>(
        &self,
        model: &ModelRecord,
        view: &ViewSample,
        material: &MaterialSample,
        render: &mut R,
        synthesize: &mut S,
    ) -> io::Result<()> {
        let eol = self.format.line_ending;

        for env in self.environment_maps {
            let stem = env.stem();
            let defines = Defines {
                model: &model.model_path,
                env: &env.path,
                view,
                material,
            };

            for pass in Pass::ALL {
                write!(render, "{}{}", self.commands.command(pass, &defines, &stem), eol)?;
            }

            for step in CompositeStep::sequence(&stem) {
                write!(synthesize, "{}{}", step, eol)?;
            }
        }

        write!(synthesize, "{}{}", self.format.cleanup_line(TEMP_BUFFER), eol)?;
        render.flush()?;
        synthesize.flush()
    }

    /// Create the model's output directory, draw its samples and write its scripts.
    pub fn emit_model<G: RandomSource + ?Sized>(
        &self,
        model: &ModelRecord,
        render_root: &Path,
        rng: &mut G,
    ) -> Result<PlannedModel, PlanError> {
        let output_dir = render_root.join(&model.index);
        fs::create_dir_all(&output_dir).map_err(|e| PlanError::io(&output_dir, e))?;

        let view = sample_view(rng);
        let material = sample_material(rng);

        let mut render = Vec::new();
        let mut synthesize = Vec::new();
        self.write_scripts(model, &view, &material, &mut render, &mut synthesize)
            .map_err(|e| PlanError::io(&output_dir, e))?;

        let render_script = output_dir.join(self.format.script_name(RENDER_SCRIPT));
        let synthesize_script = output_dir.join(self.format.script_name(SYNTHESIZE_SCRIPT));
        fs::write(&render_script, render).map_err(|e| PlanError::io(&render_script, e))?;
        fs::write(&synthesize_script, synthesize)
            .map_err(|e| PlanError::io(&synthesize_script, e))?;

        debug!(
            index = %model.index,
            lines = self.environment_maps.len() * Pass::ALL.len(),
            "render script written"
        );

        Ok(PlannedModel {
            index: model.index.clone(),
            category: model.category.clone(),
            uuid: model.uuid.clone(),
            model_path: model.model_path.clone(),
            view: view.to_array(),
            kd: material.kd,
            ks: material.ks,
            ns: material.ns,
            render_script,
            synthesize_script,
        })
    }
}

/// Plan a whole dataset.
///
/// Creates the render root, fetches the manifest if it is missing, loads the
/// environment maps, then emits scripts for every manifest row in order. Rows whose
/// model file is missing are logged and skipped without touching the random stream.
/// The summary is written to `<render_root>/plan.json` and returned.
pub fn generate_plan<G: RandomSource + ?Sized>(
    config: &PlanConfig,
    format: ScriptFormat,
    rng: &mut G,
) -> Result<PlanSummary, PlanError> {
    let render_root = config.render_root.as_path();
    fs::create_dir_all(render_root).map_err(|e| PlanError::io(render_root, e))?;

    let manifest_path = config.manifest_path();
    manifest::ensure_manifest(&config.manifest_url, &manifest_path)?;

    let environment_maps = manifest::load_environment_maps(&config.envmap_root)?;
    info!(count = environment_maps.len(), "environment maps loaded");

    let rows = manifest::read_manifest(&manifest_path)?;
    info!(count = rows.len(), "manifest rows loaded");

    let emitter = ScriptEmitter::new(config, format, &environment_maps);
    let mut summary = PlanSummary::new(
        manifest_path,
        environment_maps.iter().map(|m| m.path.clone()).collect(),
    );
    summary.seed = rng.seed();

    for row in &rows {
        match row.resolve(&config.dataset_root) {
            Some(model) => {
                info!("Model {}, {}, {}", model.index, model.category, model.uuid);
                let planned = emitter.emit_model(&model, render_root, rng)?;
                summary.models.push(planned);
            }
            None => {
                let model_path = row.model_path(&config.dataset_root);
                warn!(
                    index = %row.index,
                    path = %model_path.display(),
                    "model file not found, skipping"
                );
                summary.skipped.push(SkippedModel {
                    index: row.index.clone(),
                    model_path,
                });
            }
        }
    }

    summary.save(render_root)?;
    info!(
        planned = summary.models.len(),
        skipped = summary.skipped.len(),
        "planning complete"
    );
    Ok(summary)
}
