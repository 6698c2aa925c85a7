//! Manifest generation from the raw images directory.
//!
//! The directory contents are the ground truth, not the progress store:
//! the manifest reflects the files on disk regardless of how they got there.

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The manifest document, overwritten each run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Image filenames, in directory-listing order
    pub images: Vec<String>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Lists item identifiers in the raw images directory (filenames with the
/// .png extension stripped), in directory-listing order.
pub fn list_items(raw_dir: &Path) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let entries = fs::read_dir(raw_dir)
        .with_context(|| format!("Failed to read {}", raw_dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(stem) = name.strip_suffix(".png") {
            items.push(stem.to_string());
        }
    }

    Ok(items)
}

/// Builds the manifest from an item list.
pub fn build_manifest(items: &[String]) -> Manifest {
    Manifest {
        images: items.iter().map(|item| format!("{}.png", item)).collect(),
        total_count: items.len(),
        created_at: Local::now().to_rfc3339(),
    }
}

/// Writes the manifest for the raw images directory to `manifest_path`.
pub fn write_manifest(raw_dir: &Path, manifest_path: &Path) -> Result<Manifest> {
    crate::log("Creating manifest file...");

    let items = list_items(raw_dir)?;
    let manifest = build_manifest(&items);

    let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    fs::write(manifest_path, json)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    crate::log(&format!(
        "Manifest file created: {}",
        manifest_path.display()
    ));
    crate::log(&format!("Total items: {}", manifest.total_count));

    Ok(manifest)
}
