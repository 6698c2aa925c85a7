//! External control channel: drives the game through timed key sequences
//! and reads completion text back through the clipboard.
//!
//! The channel does not interpret what it reads; classification of the raw
//! clipboard string is the state machine's job. There is no feedback from
//! the game, so every operation is a fixed sequence of key events separated
//! by configured delays. A channel failure (game not focused, clipboard
//! empty) surfaces as a short or empty string, which downstream code treats
//! as an empty completion slot.

use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;

use crate::pipeline::config::PipelineConfig;
use crate::pipeline::input::{self, Key};

/// Narrow interface between the state machine and the game. A future
/// implementation that polls a real acknowledgement signal can replace
/// [`GameControl`] without touching the enumeration loop.
pub trait ControlChannel {
    /// Opens the chat/command surface once, at the start of a run.
    fn open_command_surface(&mut self);

    /// Types the templated prefix command for `letter`, triggers
    /// tab-completion, advances it `offset` steps, then selects all and
    /// copies. Returns the raw clipboard text (empty on channel failure).
    fn request_candidate(&mut self, letter: char, offset: u32) -> String;

    /// Commits the selected completion (runs /give) and opens the
    /// inventory so the item is visible for capture.
    fn confirm_and_open_capture_surface(&mut self);

    /// Returns the game to a state where the next command sequence can
    /// safely begin, clearing the player's inventory along the way.
    fn reset_to_neutral(&mut self);

    /// Polls the designated stop key. True means the operator wants the
    /// run to end after the current iteration.
    fn stop_requested(&mut self) -> bool;
}

/// Real game control over synthetic keyboard input plus the OS clipboard.
pub struct GameControl {
    prefix: String,
    player_name: String,
    command_delay: Duration,
    tab_delay: Duration,
    inventory_delay: Duration,
    navigation_delay: Duration,
    clipboard: arboard::Clipboard,
}

impl GameControl {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            prefix: config.command_prefix(),
            player_name: config.player_name.clone(),
            command_delay: config.command_delay(),
            tab_delay: config.tab_delay(),
            inventory_delay: config.inventory_delay(),
            navigation_delay: config.navigation_delay(),
            clipboard: arboard::Clipboard::new().context("Failed to open clipboard")?,
        })
    }

    /// Taps a key, logs a dispatch failure, then waits.
    fn tap(&self, key: Key, delay: Duration) {
        if let Err(e) = input::tap_key(key) {
            crate::log(&format!("Input dispatch failed ({:?}): {}", key, e));
        }
        thread::sleep(delay);
    }

    fn tap_char(&self, c: char, delay: Duration) {
        if let Err(e) = input::tap_char(c) {
            crate::log(&format!("Input dispatch failed ('{}'): {}", c, e));
        }
        thread::sleep(delay);
    }

    fn chord(&self, c: char, delay: Duration) {
        if let Err(e) = input::tap_char_with_ctrl(c) {
            crate::log(&format!("Input dispatch failed (Ctrl+{}): {}", c, e));
        }
        thread::sleep(delay);
    }

    fn write(&self, text: &str, delay: Duration) {
        if let Err(e) = input::type_text(text) {
            crate::log(&format!("Input dispatch failed (text): {}", e));
        }
        thread::sleep(delay);
    }
}

impl ControlChannel for GameControl {
    fn open_command_surface(&mut self) {
        self.tap(Key::Slash, self.command_delay);
    }

    fn request_candidate(&mut self, letter: char, offset: u32) -> String {
        // Type the /give prefix with the current letter and trigger completion.
        self.write(&format!("{}{}", self.prefix, letter), self.command_delay);
        self.tap(Key::Tab, self.tab_delay);

        // Advance the completion to the requested offset.
        for _ in 0..offset {
            self.tap(Key::Down, self.navigation_delay);
            self.tap(Key::Tab, self.navigation_delay);
        }

        // Select all and copy, then read the clipboard back.
        self.chord('a', self.command_delay);
        self.chord('c', self.command_delay);

        match self.clipboard.get_text() {
            Ok(text) => text,
            Err(e) => {
                crate::log(&format!("Clipboard read failed: {}", e));
                String::new()
            }
        }
    }

    fn confirm_and_open_capture_surface(&mut self) {
        self.tap(Key::Enter, self.command_delay);
        self.tap_char('e', self.inventory_delay);
    }

    fn reset_to_neutral(&mut self) {
        // Close the inventory, then clear the player through chat and leave
        // an empty chat box ready for the next command.
        self.tap(Key::Escape, self.command_delay);
        self.tap(Key::Slash, self.command_delay);
        self.tap(Key::Backspace, self.command_delay);
        self.write(&format!("/clear {}", self.player_name), self.command_delay);
        self.tap(Key::Enter, self.command_delay);
        self.tap(Key::Slash, self.command_delay);
        self.tap(Key::Backspace, self.command_delay);
    }

    fn stop_requested(&mut self) -> bool {
        input::is_stop_key_held()
    }
}
