//! Minecraft Item Pipeline
//!
//! Drives Minecraft through simulated keyboard and clipboard input to
//! enumerate every item the /give tab-completion can produce, captures a
//! cropped screenshot of each, and post-processes the set into
//! transparent-background variants plus a manifest. Progress is persisted
//! per item so the run resumes where it left off.

mod paths;
mod pipeline;
mod postprocess;

use anyhow::{anyhow, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::{BufRead, Write};

use pipeline::config::ALPHABET;
use pipeline::{ProgressStore, input, runner};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("mc_item_pipeline.log");
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        eprintln!("[PANIC]{} {}", location, msg);
    }));

    pipeline::init_config();
    let config = pipeline::get_config();

    paths::init_base_dir(config.base_dir.clone());
    paths::ensure_directories()?;

    if !input::backend_available() {
        return Err(anyhow!(
            "Synthetic keyboard input is only implemented on Windows; \
             this platform can run the post-processing stage only."
        ));
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    // Prompt for starting letter
    let start_letter = loop {
        print!(
            "\nEnter starting letter (a-z) or press Enter to start from '{}': ",
            config.start_letter
        );
        std::io::stdout().flush()?;
        let input_line = lines
            .next()
            .transpose()?
            .ok_or_else(|| anyhow!("stdin closed"))?;
        match parse_start_letter(&input_line, config.start_letter) {
            Some(letter) => break letter,
            None => println!("Invalid input. Please enter a single letter from a to z."),
        }
    };

    // Prompt for clearing progress
    let clear_progress = loop {
        print!("\nDo you want to clear previous progress? (y/n): ");
        std::io::stdout().flush()?;
        let input_line = lines
            .next()
            .transpose()?
            .ok_or_else(|| anyhow!("stdin closed"))?;
        match parse_yes_no(&input_line) {
            Some(answer) => break answer,
            None => println!("Invalid input. Please enter 'y' or 'n'."),
        }
    };

    if clear_progress {
        let progress_path = paths::get_progress_file();
        if progress_path.exists() {
            std::fs::remove_file(&progress_path)?;
            log("Progress file cleared.");
        }
    }
    let mut progress = ProgressStore::load(paths::get_progress_file());

    let start_letter_index = ALPHABET
        .iter()
        .position(|&c| c == start_letter)
        .unwrap_or_else(|| config.start_letter_index());

    print_banner(config, start_letter);

    // Countdown so the operator can focus the Minecraft window.
    for i in (1..=config.starting_delay_secs).rev() {
        println!("{}...", i);
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
    log("Starting automation!");
    log("================================================================");

    runner::run(config, start_letter_index, &mut progress)
}

fn print_banner(config: &pipeline::PipelineConfig, start_letter: char) {
    log("================================================================");
    log("MINECRAFT ITEM PIPELINE");
    log("================================================================");
    log(&format!(
        "Script will start in {} seconds.",
        config.starting_delay_secs
    ));
    log("1. Switch to your Minecraft window");
    log("2. Make sure you're in-game (not in a menu)");
    log("3. You should be in creative mode");
    log("4. The script will automatically open the command interface");
    log("5. Hold CAPS LOCK at any time to stop the script");
    log("----------------------------------------------------------------");
    log(&format!("Player name: {}", config.player_name));
    log(&format!("Starting letter: {}", start_letter));
    log(&format!(
        "Starting item offset: {}",
        config.start_item_offset
    ));
    log(&format!(
        "Raw images will be saved to: {}",
        paths::get_raw_images_dir().display()
    ));
    log(&format!(
        "Transparent images will be saved to: {}",
        paths::get_transparent_images_dir().display()
    ));
    log("----------------------------------------------------------------");
}

/// Parses the starting-letter prompt. Empty input means the default;
/// anything other than a single ascii lowercase letter is invalid.
fn parse_start_letter(input: &str, default: char) -> Option<char> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return Some(default);
    }
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

/// Parses the clear-progress prompt: 'y' or 'n' only.
fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}
