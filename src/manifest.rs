//! Dataset manifest and environment-map inventory loading.
//!
//! The manifest is the ShapeNet `all.csv` split file. Its first line is a header and is
//! always dropped. Columns used: `0` index, `1` category, `3` model uuid.

use crate::PlanError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the manifest is fetched from when it is not on disk yet.
pub const MANIFEST_URL: &str = "http://shapenet.cs.stanford.edu/shapenet/obj-zip/SHREC16/all.csv";

/// Local file name of the manifest under the render root.
pub const MANIFEST_FILE: &str = "dataset.csv";

/// Model file inside `<dataset_root>/<category>/<uuid>/`.
pub const MODEL_FILE: &str = "model.obj";

/// Inventory list inside the environment-map root.
pub const ENVMAP_LIST_FILE: &str = "list.txt";

/// One parsed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// Model index exactly as written in the manifest
    pub index: String,
    /// ShapeNet category id
    pub category: String,
    /// Model id within the category
    pub uuid: String,
}

impl ManifestRow {
    /// Path of the model file under `dataset_root`
    pub fn model_path(&self, dataset_root: &Path) -> PathBuf {
        dataset_root
            .join(&self.category)
            .join(&self.uuid)
            .join(MODEL_FILE)
    }

    /// Resolve the model file, or `None` if it is not on disk.
    pub fn resolve(&self, dataset_root: &Path) -> Option<ModelRecord> {
        let model_path = self.model_path(dataset_root);
        if !model_path.exists() {
            return None;
        }
        Some(ModelRecord {
            index: self.index.clone(),
            category: self.category.clone(),
            uuid: self.uuid.clone(),
            model_path,
        })
    }
}

/// A manifest row whose model file exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    pub index: String,
    pub category: String,
    pub uuid: String,
    pub model_path: PathBuf,
}

/// An environment map that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMap {
    pub path: PathBuf,
}

impl EnvironmentMap {
    /// File name without extension; shared by every artifact rendered with this map.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Download the manifest to `path` unless a file is already there.
///
/// Presence is the only check; an existing file is never refreshed. The body is
/// written to a `.part` sibling first and renamed once complete.
pub fn ensure_manifest(url: &str, path: &Path) -> Result<bool, PlanError> {
    if path.exists() {
        debug!(path = %path.display(), "manifest already present");
        return Ok(false);
    }

    info!(url, "downloading model list");
    let body = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(|source| PlanError::Download {
            url: url.to_string(),
            source,
        })?;

    let partial = path.with_extension("csv.part");
    {
        let mut file = fs::File::create(&partial).map_err(|e| PlanError::io(&partial, e))?;
        file.write_all(&body)
            .and_then(|_| file.sync_all())
            .map_err(|e| PlanError::io(&partial, e))?;
    }
    fs::rename(&partial, path).map_err(|e| PlanError::io(path, e))?;

    info!(path = %path.display(), bytes = body.len(), "saved model list");
    Ok(true)
}

/// Parse manifest text into rows.
///
/// The first line is dropped whatever it contains. Blank lines are ignored. A data
/// line with fewer than four comma-separated columns is an error; `line` in the error
/// is 1-based and counts the header.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestRow>, PlanError> {
    let mut rows = Vec::new();

    for (i, raw) in text.lines().enumerate().skip(1) {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() < 4 {
            return Err(PlanError::MalformedRow {
                line: i + 1,
                found: cols.len(),
            });
        }

        rows.push(ManifestRow {
            index: cols[0].to_string(),
            category: cols[1].to_string(),
            uuid: cols[3].to_string(),
        });
    }

    Ok(rows)
}

/// Read and parse the manifest file.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>, PlanError> {
    if !path.exists() {
        return Err(PlanError::MissingManifest(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
    parse_manifest(&text)
}

/// Load `list.txt` under `envmap_root`, keeping only maps that exist, in list order.
pub fn load_environment_maps(envmap_root: &Path) -> Result<Vec<EnvironmentMap>, PlanError> {
    let list_path = envmap_root.join(ENVMAP_LIST_FILE);
    if !list_path.exists() {
        return Err(PlanError::MissingInventoryList(list_path));
    }
    let text = fs::read_to_string(&list_path).map_err(|e| PlanError::io(&list_path, e))?;

    let mut maps = Vec::new();
    for line in text.lines() {
        let entry = line.trim_end_matches('\r');
        if entry.trim().is_empty() {
            continue;
        }
        let path = envmap_root.join(entry);
        if path.exists() {
            maps.push(EnvironmentMap { path });
        } else {
            debug!(path = %path.display(), "environment map missing, ignored");
        }
    }

    Ok(maps)
}
