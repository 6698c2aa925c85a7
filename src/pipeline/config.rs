//! Configuration types for the item capture pipeline.
//!
//! Loads settings from config.json at startup. Provides the player name used
//! in templated commands, the capture region, timing delays, and the loop
//! caps that bound worst-case runtime per letter.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<PipelineConfig> = OnceLock::new();

/// The alphabet walked by the enumeration loop, in order.
pub const ALPHABET: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// A rectangle in absolute screen coordinates (pixels).
/// Defines the fixed hotbar-slot region that gets captured for every item.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CaptureRegion {
    /// X position of top-left corner
    pub x: u32,
    /// Y position of top-left corner
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self {
            x: 1208,
            y: 1410,
            width: 128,
            height: 128,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minecraft username substituted into every templated command
    pub player_name: String,
    /// Screen region captured for each item
    pub capture_region: CaptureRegion,
    /// Delay after typing commands (milliseconds)
    pub command_delay_ms: u64,
    /// Delay before taking a screenshot (milliseconds)
    pub screenshot_delay_ms: u64,
    /// Delay after opening the inventory (milliseconds)
    pub inventory_delay_ms: u64,
    /// Delay after pressing Tab to trigger completion (milliseconds)
    pub tab_delay_ms: u64,
    /// Delay between completion-advance key pairs (milliseconds)
    pub navigation_delay_ms: u64,
    /// Countdown before the automation starts (seconds)
    #[serde(default = "default_starting_delay")]
    pub starting_delay_secs: u64,
    /// Letter the enumeration starts from (overridable at the prompt)
    pub start_letter: char,
    /// Completion offset the first letter starts from
    pub start_item_offset: u32,
    /// Consecutive empty results before moving to the next letter
    pub max_consecutive_empty: u32,
    /// Maximum attempts for a single letter before giving up on it
    pub max_attempts_per_letter: u32,
    /// Base directory for all durable artifacts (exe directory if absent)
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

fn default_starting_delay() -> u64 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            player_name: "Steve".to_string(),
            capture_region: CaptureRegion::default(),
            command_delay_ms: 100,
            screenshot_delay_ms: 100,
            inventory_delay_ms: 100,
            tab_delay_ms: 100,
            navigation_delay_ms: 1,
            starting_delay_secs: default_starting_delay(),
            start_letter: 'a',
            start_item_offset: 0,
            max_consecutive_empty: 10,
            max_attempts_per_letter: 200,
            base_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Returns the fixed command prefix typed before each letter,
    /// e.g. `/give Steve minecraft:`.
    pub fn command_prefix(&self) -> String {
        format!("/give {} minecraft:", self.player_name)
    }

    /// Returns the prefix length in characters. Clipboard text at or below
    /// this length carries no identifier and classifies as empty.
    pub fn prefix_len(&self) -> usize {
        self.command_prefix().chars().count()
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }

    pub fn screenshot_delay(&self) -> Duration {
        Duration::from_millis(self.screenshot_delay_ms)
    }

    pub fn inventory_delay(&self) -> Duration {
        Duration::from_millis(self.inventory_delay_ms)
    }

    pub fn tab_delay(&self) -> Duration {
        Duration::from_millis(self.tab_delay_ms)
    }

    pub fn navigation_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_delay_ms)
    }

    /// Returns the alphabet index of the configured start letter,
    /// falling back to 'a' with a warning if it is not a lowercase letter.
    pub fn start_letter_index(&self) -> usize {
        match ALPHABET.iter().position(|&c| c == self.start_letter) {
            Some(idx) => idx,
            None => {
                crate::log(&format!(
                    "Warning: '{}' is not a valid letter. Starting with 'a'.",
                    self.start_letter
                ));
                0
            }
        }
    }
}

/// Loads configuration from config.json or returns defaults.
/// Looks for config.json in the same directory as the executable.
fn load_config() -> PipelineConfig {
    let config_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf());

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    PipelineConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static PipelineConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_prefix_length_matches_reference_name() {
        // The reference setup used an 11-character username, giving the
        // well-known 28-character prefix.
        let config = PipelineConfig {
            player_name: "tinytank800".to_string(),
            ..Default::default()
        };
        assert_eq!(config.prefix_len(), 28);
    }

    #[test]
    fn test_command_prefix_shape() {
        let config = PipelineConfig::default();
        assert_eq!(config.command_prefix(), "/give Steve minecraft:");
    }

    #[test]
    fn test_invalid_start_letter_falls_back_to_a() {
        let config = PipelineConfig {
            start_letter: '7',
            ..Default::default()
        };
        assert_eq!(config.start_letter_index(), 0);
    }

    #[test]
    fn test_start_letter_index() {
        let config = PipelineConfig {
            start_letter: 'q',
            ..Default::default()
        };
        assert_eq!(ALPHABET[config.start_letter_index()], 'q');
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.player_name, config.player_name);
        assert_eq!(parsed.max_consecutive_empty, config.max_consecutive_empty);
        assert_eq!(parsed.start_letter, 'a');
    }
}
