//! Item enumeration and capture pipeline.
//!
//! This module provides:
//! - Synthetic keyboard input and clipboard readback for driving the game
//! - Fixed-region screen capture
//! - The enumeration state machine walking the item namespace letter by letter
//! - Durable, per-item progress so runs can resume after interruption

pub mod capture;
pub mod config;
pub mod control;
pub mod input;
pub mod progress;
pub mod runner;
pub mod state;

pub use config::{get_config, init_config, PipelineConfig, ALPHABET};
pub use progress::ProgressStore;
