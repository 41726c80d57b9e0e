//! Typed renderer and compositor command lines.
//!
//! Every line written to a script comes from one of these types. Their `Display`
//! implementations are the exact script text, so the render and synthesize scripts
//! always agree on output names.

use crate::sampling::{MaterialSample, ViewSample};
use std::fmt;
use std::path::{Path, PathBuf};

/// Options passed to every renderer invocation (`-q`: quiet).
pub const RENDER_OPTIONS: &str = "-q";

/// Compositor executable.
pub const COMPOSITOR: &str = "magick";

/// Scratch buffer shared by the composite steps of one script.
pub const TEMP_BUFFER: &str = "temp.exr";

/// One renderer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Albedo,
    Shading,
    Specular,
    Depth,
}

impl Pass {
    /// Emission order within one environment map.
    pub const ALL: [Pass; 4] = [Pass::Albedo, Pass::Shading, Pass::Specular, Pass::Depth];

    /// Output-name suffix of this pass
    pub fn suffix(&self) -> &'static str {
        match self {
            Pass::Albedo => "a",
            Pass::Shading => "s",
            Pass::Specular => "r",
            Pass::Depth => "d",
        }
    }

    /// Scene template file name, e.g. `template-a.xml`
    pub fn template_name(&self) -> String {
        format!("template-{}.xml", self.suffix())
    }

    /// Output name of this pass for a stem, e.g. `sunset_a`
    pub fn output_name(&self, stem: &str) -> String {
        format!("{}_{}", stem, self.suffix())
    }
}

/// The `-D` block shared by all passes of one model and environment map.
#[derive(Debug, Clone)]
pub struct Defines<'a> {
    pub model: &'a Path,
    pub env: &'a Path,
    pub view: &'a ViewSample,
    pub material: &'a MaterialSample,
}

impl fmt::Display for Defines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-Dmodel=\"{}\" -Denv=\"{}\" -Dview=\"{}\" -Dkd={:.6} -Dks={:.6} -Dns={:.6}",
            self.model.display(),
            self.env.display(),
            self.view,
            self.material.kd,
            self.material.ks,
            self.material.ns,
        )
    }
}

/// Builds renderer invocations for one run.
#[derive(Debug, Clone)]
pub struct RenderCommandBuilder {
    renderer: PathBuf,
    template_dir: PathBuf,
}

impl RenderCommandBuilder {
    pub fn new(renderer: impl Into<PathBuf>, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer: renderer.into(),
            template_dir: template_dir.into(),
        }
    }

    /// Full path of the template used by `pass`
    pub fn template_path(&self, pass: Pass) -> PathBuf {
        self.template_dir.join(pass.template_name())
    }

    pub fn command<'a>(
        &'a self,
        pass: Pass,
        defines: &'a Defines<'a>,
        stem: &str,
    ) -> RenderCommand<'a> {
        RenderCommand {
            renderer: &self.renderer,
            template: self.template_path(pass),
            defines,
            output: pass.output_name(stem),
        }
    }
}

/// A single renderer invocation line.
#[derive(Debug, Clone)]
pub struct RenderCommand<'a> {
    pub renderer: &'a Path,
    pub template: PathBuf,
    pub defines: &'a Defines<'a>,
    pub output: String,
}

impl fmt::Display for RenderCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} -o {}",
            self.renderer.display(),
            self.template.display(),
            RENDER_OPTIONS,
            self.defines,
            self.output
        )
    }
}

/// One compositor step of the synthesize script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeStep {
    /// 1-bit object mask from the depth pass
    Mask { stem: String },
    /// Lossy JPEG copy of one pass next to its EXR
    Convert { stem: String, pass: Pass },
    /// `albedo * shading` into the scratch buffer
    Multiply { stem: String },
    /// `specular + scratch` written as the final image
    Plus { stem: String },
}

impl CompositeStep {
    /// All steps for one stem, in script order.
    pub fn sequence(stem: &str) -> Vec<CompositeStep> {
        let stem = stem.to_string();
        vec![
            CompositeStep::Mask { stem: stem.clone() },
            CompositeStep::Convert {
                stem: stem.clone(),
                pass: Pass::Albedo,
            },
            CompositeStep::Convert {
                stem: stem.clone(),
                pass: Pass::Shading,
            },
            CompositeStep::Convert {
                stem: stem.clone(),
                pass: Pass::Specular,
            },
            CompositeStep::Multiply { stem: stem.clone() },
            CompositeStep::Plus { stem },
        ]
    }

    /// Name of the final synthesized image for a stem, without extension
    pub fn image_name(stem: &str) -> String {
        format!("{}_i", stem)
    }
}

impl fmt::Display for CompositeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeStep::Mask { stem } => write!(
                f,
                "{} convert -format png -alpha off -depth 1 {}.exr {}_m.png",
                COMPOSITOR,
                Pass::Depth.output_name(stem),
                stem
            ),
            CompositeStep::Convert { stem, pass } => write!(
                f,
                "{} mogrify -format jpg {}.exr",
                COMPOSITOR,
                pass.output_name(stem)
            ),
            CompositeStep::Multiply { stem } => write!(
                f,
                "{} composite -compose Multiply {}.exr {}.exr {}",
                COMPOSITOR,
                Pass::Albedo.output_name(stem),
                Pass::Shading.output_name(stem),
                TEMP_BUFFER
            ),
            CompositeStep::Plus { stem } => write!(
                f,
                "{} composite -compose Plus {}.exr {} -format jpg {}.jpg",
                COMPOSITOR,
                Pass::Specular.output_name(stem),
                TEMP_BUFFER,
                CompositeStep::image_name(stem)
            ),
        }
    }
}
