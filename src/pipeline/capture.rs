//! Screen capture channel for the fixed hotbar-slot region.
//!
//! Grabs the primary monitor through xcap, crops to the configured absolute
//! rectangle, and saves a PNG. Capture failure is a boolean, never an error:
//! the state machine records no progress for the item and a future run
//! retries it.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::path::Path;
use std::thread;
use std::time::Duration;
use xcap::Monitor;

use crate::pipeline::config::{CaptureRegion, PipelineConfig};

/// Narrow interface over "grab this region into this file".
pub trait CaptureChannel {
    /// Captures the configured region to `destination`. Returns true only
    /// if the file exists afterward with non-zero size. Must never panic or
    /// propagate an error.
    fn capture(&mut self, destination: &Path) -> bool;
}

/// Real screen capture of a fixed monitor region.
pub struct RegionCapture {
    region: CaptureRegion,
    screenshot_delay: Duration,
}

impl RegionCapture {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            region: config.capture_region,
            screenshot_delay: config.screenshot_delay(),
        }
    }

    fn try_capture(&self, destination: &Path) -> Result<()> {
        let monitors = Monitor::all().context("Failed to enumerate monitors")?;
        let primary = monitors
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("No monitors found"))?;

        let frame = primary
            .capture_image()
            .context("Failed to capture monitor image")?;
        let screen = DynamicImage::ImageRgba8(frame);

        let cropped = crop_to_region(&screen, self.region)?;
        cropped
            .save(destination)
            .with_context(|| format!("Failed to save {}", destination.display()))?;

        let size = std::fs::metadata(destination)
            .with_context(|| format!("Missing capture file {}", destination.display()))?
            .len();
        if size == 0 {
            return Err(anyhow!(
                "Capture file {} is empty",
                destination.display()
            ));
        }
        Ok(())
    }
}

impl CaptureChannel for RegionCapture {
    fn capture(&mut self, destination: &Path) -> bool {
        // Give the inventory a moment to render before grabbing.
        thread::sleep(self.screenshot_delay);

        match self.try_capture(destination) {
            Ok(()) => {
                crate::log(&format!(
                    "Screenshot saved successfully: {}",
                    destination.display()
                ));
                true
            }
            Err(e) => {
                crate::log(&format!("Screenshot error: {:#}", e));
                false
            }
        }
    }
}

/// Crops a full-screen image to the capture region, validating bounds.
fn crop_to_region(screen: &DynamicImage, region: CaptureRegion) -> Result<DynamicImage> {
    let (screen_w, screen_h) = (screen.width(), screen.height());

    if region.width == 0 || region.height == 0 {
        return Err(anyhow!("Capture region has zero area"));
    }
    if region.x.saturating_add(region.width) > screen_w
        || region.y.saturating_add(region.height) > screen_h
    {
        return Err(anyhow!(
            "Capture region ({},{}) {}x{} exceeds screen {}x{}",
            region.x,
            region.y,
            region.width,
            region.height,
            screen_w,
            screen_h
        ));
    }

    Ok(screen.crop_imm(region.x, region.y, region.width, region.height))
}
