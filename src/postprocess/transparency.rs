//! Background removal for captured item images.
//!
//! Rewrites every pixel whose color exactly matches the inventory's pale
//! gray background to fully transparent, leaving all other pixels
//! untouched. A pure per-image transform with no shared state.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// The inventory background color that becomes transparent.
pub const BACKGROUND_RGB: [u8; 3] = [139, 139, 139];

/// Returns a copy of `image` with every exact-background pixel replaced by
/// fully transparent white.
pub fn make_transparent(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, _]) = *pixel;
        if [r, g, b] == BACKGROUND_RGB {
            *pixel = Rgba([255, 255, 255, 0]);
        }
    }
    out
}

/// Processes every .png in `raw_dir` into `out_dir` under the same
/// filename. Returns the number of images processed.
pub fn process_directory(raw_dir: &Path, out_dir: &Path) -> Result<u32> {
    crate::log("Processing images for transparency...");

    let mut processed = 0;
    let entries = std::fs::read_dir(raw_dir)
        .with_context(|| format!("Failed to read {}", raw_dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(".png") {
            continue;
        }

        crate::log(&format!("Processing: {}", name));

        let source = entry.path();
        let image = image::open(&source)
            .with_context(|| format!("Failed to open {}", source.display()))?
            .to_rgba8();

        let transparent = make_transparent(&image);

        let destination = out_dir.join(name);
        transparent
            .save(&destination)
            .with_context(|| format!("Failed to save {}", destination.display()))?;
        processed += 1;
    }

    crate::log("Transparency processing complete!");
    Ok(processed)
}
