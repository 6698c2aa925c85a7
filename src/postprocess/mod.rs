//! Post-processing stage: manifest generation and transparency pass.
//!
//! Runs after enumeration ends (normally, by cap, or by cancellation) and
//! can also run in isolation over a previously captured directory. Both
//! steps read the raw images directory as ground truth.

pub mod manifest;
pub mod transparency;

pub use manifest::{list_items, write_manifest, Manifest};
pub use transparency::{make_transparent, process_directory, BACKGROUND_RGB};

use anyhow::Result;
use std::path::Path;

/// Generates the manifest and regenerates every transparent variant.
pub fn run(raw_dir: &Path, transparent_dir: &Path, manifest_path: &Path) -> Result<()> {
    crate::log("Generating item list and manifest...");
    write_manifest(raw_dir, manifest_path)?;

    let processed = process_directory(raw_dir, transparent_dir)?;
    crate::log(&format!("Transparent images written: {}", processed));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_run_produces_manifest_and_transparent_set() {
        let base = tempdir().unwrap();
        let raw = base.path().join("raw_images");
        let transparent = base.path().join("transparent_images");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::create_dir_all(&transparent).unwrap();
        let manifest_path = base.path().join("manifest.json");

        let mut image = RgbaImage::new(1, 1);
        image.put_pixel(0, 0, Rgba([139, 139, 139, 255]));
        image.save(raw.join("dirt.png")).unwrap();

        run(&raw, &transparent, &manifest_path).unwrap();

        assert!(manifest_path.exists());
        assert!(transparent.join("dirt.png").exists());
        let manifest: Manifest =
            serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!(manifest.images, vec!["dirt.png".to_string()]);
        assert_eq!(manifest.total_count, 1);
    }
}
