//! Generate per-model render and synthesize scripts.
//!
//! Usage:
//!   MITSUBA=... SHAPENET_ROOT=... ENVMAP_ROOT=... RENDER_ROOT=... render-planner
//!
//! Every setting can also be passed as a flag, see `render-planner --help`. The renderer
//! is also read from the older `MTISUBA` variable when neither `--renderer` nor
//! `MITSUBA` is set.

use anyhow::{anyhow, Context};
use clap::Parser;
use render_planner::{
    default_template_dir, detect_platform, generate_plan, PlanConfig, ScriptFormat, SeededStream,
};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Renderer executable [falls back to env: MTISUBA]
    #[arg(long, env = "MITSUBA")]
    renderer: Option<PathBuf>,

    /// Root containing <category>/<uuid>/model.obj
    #[arg(long, env = "SHAPENET_ROOT")]
    dataset_root: PathBuf,

    /// Directory containing list.txt and the environment maps
    #[arg(long, env = "ENVMAP_ROOT")]
    envmap_root: PathBuf,

    /// Output directory for the manifest, plan.json and per-model scripts
    #[arg(long, env = "RENDER_ROOT")]
    render_root: PathBuf,

    /// Directory holding template-{a,s,r,d}.xml [default: templates/ beside this executable]
    #[arg(long, env = "RENDER_TEMPLATE_DIR")]
    template_dir: Option<PathBuf>,
}

/// Misspelled renderer variable still found in existing environments.
const LEGACY_RENDERER_ENV: &str = "MTISUBA";

fn resolve_renderer(renderer: Option<PathBuf>, legacy: Option<OsString>) -> Option<PathBuf> {
    renderer.or_else(|| legacy.filter(|v| !v.is_empty()).map(PathBuf::from))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let renderer = resolve_renderer(args.renderer, std::env::var_os(LEGACY_RENDERER_ENV))
        .ok_or_else(|| anyhow!("renderer not set: pass --renderer or set MITSUBA"))?;
    let config = PlanConfig::new(
        renderer,
        args.dataset_root,
        args.envmap_root,
        args.render_root,
    )
    .with_template_dir(args.template_dir.unwrap_or_else(default_template_dir));

    let format = ScriptFormat::host();
    info!(
        platform = %detect_platform(),
        extension = format.extension,
        render_root = %config.render_root.display(),
        "planning render scripts"
    );

    let mut rng = SeededStream::fixed();
    let summary = generate_plan(&config, format, &mut rng)
        .with_context(|| format!("planning failed under {}", config.render_root.display()))?;

    info!(
        models = summary.models.len(),
        skipped = summary.skipped.len(),
        invocations = summary.render_invocations(),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_flag_wins_over_legacy_env() {
        let renderer = resolve_renderer(
            Some(PathBuf::from("/opt/mitsuba")),
            Some(OsString::from("/old/mitsuba")),
        );
        assert_eq!(renderer, Some(PathBuf::from("/opt/mitsuba")));
    }

    #[test]
    fn test_legacy_renderer_env_fallback() {
        let renderer = resolve_renderer(None, Some(OsString::from("/old/mitsuba")));
        assert_eq!(renderer, Some(PathBuf::from("/old/mitsuba")));
        assert_eq!(resolve_renderer(None, Some(OsString::new())), None);
        assert_eq!(resolve_renderer(None, None), None);
    }

    #[test]
    fn test_template_dir_is_optional() {
        let args = Args::try_parse_from([
            "render-planner",
            "--renderer",
            "/opt/mitsuba",
            "--dataset-root",
            "/data",
            "--envmap-root",
            "/env",
            "--render-root",
            "/render",
        ])
        .unwrap();
        if std::env::var_os("RENDER_TEMPLATE_DIR").is_none() {
            assert_eq!(args.template_dir, None);
        }
        assert_eq!(args.renderer, Some(PathBuf::from("/opt/mitsuba")));
    }
}
