//! Enumeration state machine for walking the item namespace.
//!
//! The walker sequences through: AdvanceLetter → RequestCandidate →
//! Classify → Capture/SkipDuplicate → (advance offset) and loops, with
//! AbortLetter cutting a letter short and Done ending the run.
//!
//! Per-letter rules, in priority order:
//! 1. attempt cap, bounding runtime against a namespace that never ends
//! 2. classification of the raw clipboard text (short text = empty slot)
//! 3. loop detection, the only signal that a cyclic completion wrapped
//! 4. consecutive-empty cap
//! 5. skip identifiers already in the progress store (resumption)
//! 6. otherwise capture, persisting progress immediately on success

use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use crate::pipeline::capture::CaptureChannel;
use crate::pipeline::config::{PipelineConfig, ALPHABET};
use crate::pipeline::control::ControlChannel;
use crate::pipeline::progress::ProgressStore;

/// Enumeration state machine states.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumerationState {
    /// Entering a letter: check alphabet exhaustion, then start requesting
    AdvanceLetter,
    /// Asking the control channel for the candidate at the current offset
    RequestCandidate,
    /// Classifying the raw clipboard text
    Classify(String),
    /// Capturing a new identifier
    Capture(String),
    /// Identifier already captured on a previous run; skipping
    SkipDuplicate(String),
    /// Giving up on the current letter and moving to the next one
    AbortLetter,
    /// Alphabet exhausted or stop key observed
    Done,
}

impl std::fmt::Display for EnumerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumerationState::AdvanceLetter => write!(f, "Advancing letter"),
            EnumerationState::RequestCandidate => write!(f, "Requesting candidate"),
            EnumerationState::Classify(_) => write!(f, "Classifying"),
            EnumerationState::Capture(id) => write!(f, "Capturing {}", id),
            EnumerationState::SkipDuplicate(id) => write!(f, "Skipping {}", id),
            EnumerationState::AbortLetter => write!(f, "Aborting letter"),
            EnumerationState::Done => write!(f, "Done"),
        }
    }
}

/// Transient per-letter walker state. Never persisted; reset whenever the
/// letter advances. `seen_this_letter` exists only for intra-letter loop
/// detection and is distinct from the durable progress store.
#[derive(Debug)]
pub struct EnumerationCursor {
    pub letter_index: usize,
    pub item_offset: u32,
    pub consecutive_empty: u32,
    pub attempts_this_letter: u32,
    pub seen_this_letter: HashSet<String>,
}

impl EnumerationCursor {
    fn new(letter_index: usize, item_offset: u32) -> Self {
        Self {
            letter_index,
            item_offset,
            consecutive_empty: 0,
            attempts_this_letter: 0,
            seen_this_letter: HashSet::new(),
        }
    }

    /// Resets all per-letter fields. The letter index itself is advanced by
    /// the AbortLetter transition.
    fn reset_for_letter(&mut self) {
        self.item_offset = 0;
        self.consecutive_empty = 0;
        self.attempts_this_letter = 0;
        self.seen_this_letter.clear();
    }
}

/// Enumeration context holding the cursor, channels, and progress store.
pub struct EnumerationContext<'a, C: ControlChannel, P: CaptureChannel> {
    pub state: EnumerationState,
    pub cursor: EnumerationCursor,
    config: PipelineConfig,
    control: &'a mut C,
    capture: &'a mut P,
    progress: &'a mut ProgressStore,
    raw_dir: PathBuf,
    /// Last identifier captured this run (for the final summary)
    pub last_captured: Option<String>,
    /// Number of captures recorded this run
    pub captured_this_run: u32,
    iteration_started: Instant,
}

impl<'a, C: ControlChannel, P: CaptureChannel> EnumerationContext<'a, C, P> {
    /// Creates a context seeded with the starting letter and offset.
    pub fn new(
        config: PipelineConfig,
        start_letter_index: usize,
        control: &'a mut C,
        capture: &'a mut P,
        progress: &'a mut ProgressStore,
        raw_dir: PathBuf,
    ) -> Self {
        let start_offset = config.start_item_offset;
        Self {
            state: EnumerationState::AdvanceLetter,
            cursor: EnumerationCursor::new(start_letter_index, start_offset),
            config,
            control,
            capture,
            progress,
            raw_dir,
            last_captured: None,
            captured_this_run: 0,
            iteration_started: Instant::now(),
        }
    }

    fn current_letter(&self) -> Option<char> {
        ALPHABET.get(self.cursor.letter_index).copied()
    }

    /// Ends one offset iteration: polls the stop key, then either
    /// terminates or moves to the next offset of the same letter.
    fn advance_offset(&mut self) {
        crate::log(&format!(
            "Time elapsed for offset #{}: {:.2}s",
            self.cursor.item_offset,
            self.iteration_started.elapsed().as_secs_f32()
        ));

        if self.control.stop_requested() {
            crate::log("Stop key held down, stopping enumeration.");
            self.state = EnumerationState::Done;
        } else {
            self.cursor.item_offset += 1;
            self.state = EnumerationState::RequestCandidate;
        }
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` if enumeration should continue, `Ok(false)` once
    /// the Done state is reached.
    pub fn step(&mut self) -> Result<bool> {
        match &self.state {
            EnumerationState::AdvanceLetter => {
                match self.current_letter() {
                    Some(letter) => {
                        crate::log(&format!("Processing letter '{}'", letter));
                        self.state = EnumerationState::RequestCandidate;
                    }
                    None => {
                        crate::log("Alphabet exhausted, enumeration complete");
                        self.state = EnumerationState::Done;
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            EnumerationState::RequestCandidate => {
                let letter = match self.current_letter() {
                    Some(letter) => letter,
                    None => {
                        self.state = EnumerationState::Done;
                        return Ok(false);
                    }
                };

                self.cursor.attempts_this_letter += 1;
                if self.cursor.attempts_this_letter > self.config.max_attempts_per_letter {
                    crate::log(&format!(
                        "Reached maximum attempts for letter '{}', moving to next letter",
                        letter
                    ));
                    self.state = EnumerationState::AbortLetter;
                    return Ok(true);
                }

                self.iteration_started = Instant::now();
                crate::log(&format!(
                    "Processing letter '{}', offset #{}",
                    letter, self.cursor.item_offset
                ));

                let raw = self
                    .control
                    .request_candidate(letter, self.cursor.item_offset);
                self.state = EnumerationState::Classify(raw);
                Ok(true)
            }

            EnumerationState::Classify(raw) => {
                let raw = raw.clone();
                let prefix_len = self.config.prefix_len();

                if raw.chars().count() <= prefix_len {
                    // Too short to carry an identifier: either a genuine
                    // namespace gap or an unresponsive game. Both count
                    // against the consecutive-empty cap.
                    self.cursor.consecutive_empty += 1;
                    crate::log(&format!(
                        "No valid item at offset {}, consecutive empty: {}",
                        self.cursor.item_offset, self.cursor.consecutive_empty
                    ));

                    if self.cursor.consecutive_empty >= self.config.max_consecutive_empty {
                        crate::log(&format!(
                            "Hit {} consecutive empty items, moving to next letter",
                            self.config.max_consecutive_empty
                        ));
                        self.state = EnumerationState::AbortLetter;
                    } else {
                        self.advance_offset();
                    }
                    return Ok(true);
                }

                let identifier: String = raw.chars().skip(prefix_len).collect();
                crate::log(&format!("Found item: {}", identifier));

                if !self.cursor.seen_this_letter.insert(identifier.clone()) {
                    // The completion sequence wrapped around. This is the
                    // only signal that the letter's namespace is exhausted.
                    crate::log(&format!("Loop detected: item {} already seen", identifier));
                    self.state = EnumerationState::AbortLetter;
                    return Ok(true);
                }

                self.cursor.consecutive_empty = 0;
                if self.progress.contains(&identifier) {
                    self.state = EnumerationState::SkipDuplicate(identifier);
                } else {
                    self.state = EnumerationState::Capture(identifier);
                }
                Ok(true)
            }

            EnumerationState::SkipDuplicate(identifier) => {
                crate::log(&format!(
                    "Item {} already processed, skipping",
                    identifier
                ));
                self.advance_offset();
                Ok(true)
            }

            EnumerationState::Capture(identifier) => {
                let identifier = identifier.clone();
                let destination = self.raw_dir.join(format!("{}.png", identifier));

                self.control.confirm_and_open_capture_surface();

                if self.capture.capture(&destination) {
                    self.progress.mark(&identifier);
                    if let Err(e) = self.progress.save() {
                        crate::log(&format!("Error saving progress: {:#}", e));
                    } else {
                        crate::log(&format!("Progress saved: {} items", self.progress.len()));
                    }
                    self.last_captured = Some(identifier);
                    self.captured_this_run += 1;
                } else {
                    crate::log(&format!(
                        "Capture of {} failed, it will be retried on a future run",
                        identifier
                    ));
                }

                self.control.reset_to_neutral();
                self.advance_offset();
                Ok(true)
            }

            EnumerationState::AbortLetter => {
                self.cursor.letter_index += 1;
                self.cursor.reset_for_letter();
                self.state = EnumerationState::AdvanceLetter;
                Ok(true)
            }

            EnumerationState::Done => Ok(false),
        }
    }

    /// Returns a progress string for the final summary.
    pub fn progress_string(&self) -> String {
        match &self.last_captured {
            Some(id) => format!(
                "last captured '{}', {} new this run, {} total",
                id,
                self.captured_this_run,
                self.progress.len()
            ),
            None => format!("no new captures, {} total", self.progress.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    /// Control channel that replays a fixed list of clipboard responses.
    /// Exhausted responses read back as empty strings.
    struct ScriptedControl {
        responses: Vec<String>,
        requests: usize,
        confirms: usize,
        resets: usize,
        /// When set, stop_requested() becomes true once this many
        /// candidates have been requested.
        stop_after_requests: Option<usize>,
    }

    impl ScriptedControl {
        fn new(responses: Vec<String>) -> Self {
            Self {
                responses,
                requests: 0,
                confirms: 0,
                resets: 0,
                stop_after_requests: None,
            }
        }
    }

    impl ControlChannel for ScriptedControl {
        fn open_command_surface(&mut self) {}

        fn request_candidate(&mut self, _letter: char, _offset: u32) -> String {
            let response = self.responses.get(self.requests).cloned().unwrap_or_default();
            self.requests += 1;
            response
        }

        fn confirm_and_open_capture_surface(&mut self) {
            self.confirms += 1;
        }

        fn reset_to_neutral(&mut self) {
            self.resets += 1;
        }

        fn stop_requested(&mut self) -> bool {
            self.stop_after_requests
                .is_some_and(|n| self.requests >= n)
        }
    }

    /// Capture channel that records destinations without touching the screen.
    struct MockCapture {
        succeed: bool,
        captured: Vec<PathBuf>,
    }

    impl MockCapture {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                captured: Vec::new(),
            }
        }
    }

    impl CaptureChannel for MockCapture {
        fn capture(&mut self, destination: &Path) -> bool {
            if self.succeed {
                self.captured.push(destination.to_path_buf());
            }
            self.succeed
        }
    }

    fn test_config(start_letter: char, max_empty: u32, max_attempts: u32) -> PipelineConfig {
        PipelineConfig {
            player_name: "Steve".to_string(),
            start_letter,
            max_consecutive_empty: max_empty,
            max_attempts_per_letter: max_attempts,
            ..Default::default()
        }
    }

    fn candidate(config: &PipelineConfig, identifier: &str) -> String {
        format!("{}{}", config.command_prefix(), identifier)
    }

    fn run_to_completion<C: ControlChannel, P: CaptureChannel>(
        ctx: &mut EnumerationContext<'_, C, P>,
    ) {
        for _ in 0..100_000 {
            if !ctx.step().unwrap() {
                return;
            }
        }
        panic!("state machine did not terminate");
    }

    #[test]
    fn test_loop_detection_aborts_letter() {
        let config = test_config('z', 10, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let mut control = ScriptedControl::new(vec![
            candidate(&config, "zinc"),
            candidate(&config, "zombie_head"),
            candidate(&config, "zinc"),
        ]);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        assert_eq!(ctx.state, EnumerationState::Done);
        // zinc and zombie_head captured exactly once; the repeat aborted
        // the letter before a third capture.
        assert_eq!(capture.captured.len(), 2);
        assert!(capture.captured[0].ends_with("zinc.png"));
        assert!(capture.captured[1].ends_with("zombie_head.png"));
        assert_eq!(control.confirms, 2);
        assert!(progress.contains("zinc"));
        assert!(progress.contains("zombie_head"));
    }

    #[test]
    fn test_empty_run_cap_advances_letter() {
        let config = test_config('z', 3, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let mut control = ScriptedControl::new(vec![]);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        // Exactly three empty classifications before the letter (and with
        // it the alphabet) was abandoned.
        assert_eq!(control.requests, 3);
        assert!(capture.captured.is_empty());
        assert_eq!(progress.len(), 0);
    }

    #[test]
    fn test_nonempty_resets_empty_counter() {
        let config = test_config('z', 2, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let mut control = ScriptedControl::new(vec![
            String::new(),
            candidate(&config, "zinc"),
            String::new(),
            candidate(&config, "zombie_head"),
            String::new(),
            String::new(),
        ]);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        // Single empties between valid items never reached the cap of 2;
        // both items were captured before the final double-empty abort.
        assert_eq!(capture.captured.len(), 2);
        assert_eq!(control.requests, 6);
    }

    #[test]
    fn test_attempt_cap_bounds_letter() {
        let config = test_config('z', 10, 5);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        // Endless unique identifiers: only the attempt cap can end this.
        let responses = (0..100)
            .map(|i| candidate(&config, &format!("zone_{}", i)))
            .collect();
        let mut control = ScriptedControl::new(responses);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        assert_eq!(control.requests, 5);
        assert_eq!(capture.captured.len(), 5);
    }

    #[test]
    fn test_resume_skips_processed_items() {
        let config = test_config('z', 10, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        progress.mark("zinc");
        progress.save().unwrap();

        let mut control = ScriptedControl::new(vec![
            candidate(&config, "zinc"),
            candidate(&config, "zombie_head"),
            candidate(&config, "zinc"),
        ]);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        // zinc skipped without confirming or capturing; only zombie_head
        // was new.
        assert_eq!(capture.captured.len(), 1);
        assert!(capture.captured[0].ends_with("zombie_head.png"));
        assert_eq!(control.confirms, 1);
    }

    #[test]
    fn test_idempotent_resume_captures_nothing_twice() {
        let config = test_config('z', 10, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let responses = vec![
            candidate(&config, "zinc"),
            candidate(&config, "zombie_head"),
            candidate(&config, "zinc"),
        ];

        let mut control = ScriptedControl::new(responses.clone());
        let mut capture = MockCapture::new(true);
        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config.clone(),
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);
        let first_run_total = progress.len();

        // Second run against the same store and the same namespace.
        let mut control = ScriptedControl::new(responses);
        let mut capture = MockCapture::new(true);
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        assert_eq!(ctx.captured_this_run, 0);
        assert!(capture.captured.is_empty());
        assert_eq!(progress.len(), first_run_total);
    }

    #[test]
    fn test_capture_failure_leaves_store_unchanged() {
        let config = test_config('z', 1, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let mut control = ScriptedControl::new(vec![candidate(&config, "zinc")]);
        let mut capture = MockCapture::new(false);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        // The failed item is absent from the store so a future run retries
        // it, and the game was still reset to neutral afterward.
        assert_eq!(ctx.captured_this_run, 0);
        assert!(ctx.last_captured.is_none());
        assert!(!progress.contains("zinc"));
        assert_eq!(control.confirms, 1);
        assert_eq!(control.resets, 1);
    }

    #[test]
    fn test_stop_key_terminates_run_early() {
        let config = test_config('a', 10, 200);
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let mut control = ScriptedControl::new(vec![candidate(&config, "apple")]);
        control.stop_after_requests = Some(1);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        run_to_completion(&mut ctx);

        // One iteration completed (including its capture), then the held
        // stop key ended the run without walking the remaining letters.
        assert_eq!(ctx.state, EnumerationState::Done);
        assert_eq!(control.requests, 1);
        assert_eq!(capture.captured.len(), 1);
    }

    #[test]
    fn test_starting_offset_is_honored_for_first_letter_only() {
        let config = PipelineConfig {
            start_item_offset: 7,
            ..test_config('z', 1, 200)
        };
        let dir = tempdir().unwrap();
        let mut progress = ProgressStore::load(dir.path().join("progress.json"));
        let mut control = ScriptedControl::new(vec![]);
        let mut capture = MockCapture::new(true);

        let start = config.start_letter_index();
        let mut ctx = EnumerationContext::new(
            config,
            start,
            &mut control,
            &mut capture,
            &mut progress,
            dir.path().to_path_buf(),
        );
        // AdvanceLetter, then the first RequestCandidate sees offset 7.
        ctx.step().unwrap();
        assert_eq!(ctx.cursor.item_offset, 7);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", EnumerationState::Done), "Done");
        assert_eq!(
            format!("{}", EnumerationState::Capture("stone".to_string())),
            "Capturing stone"
        );
    }
}
