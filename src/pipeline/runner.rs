//! Pipeline runner - main entry point for the enumeration loop.
//!
//! Builds the real channels, runs the state machine to completion on the
//! calling thread, and guarantees the final progress flush, post-processing,
//! and summary regardless of how the loop ended.

use anyhow::{Context, Result};

use crate::paths;
use crate::pipeline::capture::RegionCapture;
use crate::pipeline::config::{PipelineConfig, ALPHABET};
use crate::pipeline::control::{ControlChannel, GameControl};
use crate::pipeline::progress::ProgressStore;
use crate::pipeline::state::{EnumerationContext, EnumerationState};
use crate::postprocess;

/// Runs enumeration from `start_letter_index`, then post-processing.
///
/// The enumeration loop, channel calls, and post-processing run strictly
/// one after another on this thread; the only waits are the configured
/// fixed delays inside the channels.
pub fn run(
    config: &PipelineConfig,
    start_letter_index: usize,
    progress: &mut ProgressStore,
) -> Result<()> {
    let mut control = GameControl::new(config).context("Failed to set up game control")?;
    let mut capture = RegionCapture::new(config);

    crate::log(&format!(
        "Starting enumeration at letter '{}', offset {} (hold CapsLock to stop)",
        ALPHABET[start_letter_index], config.start_item_offset
    ));

    // Open the chat once; every later command starts from an empty box.
    control.open_command_surface();

    let mut ctx = EnumerationContext::new(
        config.clone(),
        start_letter_index,
        &mut control,
        &mut capture,
        progress,
        paths::get_raw_images_dir(),
    );

    loop {
        match ctx.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                crate::log(&format!("Enumeration error: {:#}", e));
                break;
            }
        }
    }

    match &ctx.state {
        EnumerationState::Done => {
            crate::log(&format!("Enumeration finished: {}", ctx.progress_string()));
        }
        other => {
            crate::log(&format!(
                "Enumeration stopped in state '{}': {}",
                other,
                ctx.progress_string()
            ));
        }
    }

    let summary = ctx.progress_string();
    let last_captured = ctx.last_captured.clone();

    // Final flush. Saves also happened after every capture, so this only
    // matters if the last save failed.
    if let Err(e) = progress.save() {
        crate::log(&format!("Error saving progress: {:#}", e));
    }

    // Post-processing runs unconditionally on whatever is on disk.
    if let Err(e) = postprocess::run(
        &paths::get_raw_images_dir(),
        &paths::get_transparent_images_dir(),
        &paths::get_manifest_file(),
    ) {
        crate::log(&format!("Post-processing error: {:#}", e));
    }

    crate::log("================================================================");
    crate::log(&format!("Pipeline completed: {}", summary));
    if let Some(id) = last_captured {
        crate::log(&format!("Last processed item: {}", id));
    }
    crate::log(&format!(
        "Progress saved to {}",
        paths::get_progress_file().display()
    ));
    crate::log(&format!("Total items processed: {}", progress.len()));
    crate::log("================================================================");
    crate::log(
        "!IMPORTANT! - Check the generated images, and make sure images in the \
         transparent_images folder are not messed up. POLISHED_DIORITE is a usual suspect.",
    );

    Ok(())
}
