//! Durable progress store for captured items.
//!
//! Maps item identifier -> true; presence means the item was already captured
//! to the raw images directory. Saved after every successful capture so an
//! interruption loses at most the in-flight item, making re-runs resumable.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// The durable identifier -> captured mapping.
pub struct ProgressStore {
    path: PathBuf,
    items: BTreeMap<String, bool>,
}

impl ProgressStore {
    /// Loads the store from disk. Never fails:
    /// - missing file: creates an empty one and starts empty
    /// - unparseable file: logs a warning and starts empty
    pub fn load(path: PathBuf) -> Self {
        let items = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<BTreeMap<String, bool>>(&contents) {
                    Ok(items) => {
                        crate::log(&format!(
                            "Loaded progress file with {} processed items.",
                            items.len()
                        ));
                        items
                    }
                    Err(e) => {
                        crate::log(&format!(
                            "Error loading progress file: {}. Starting with empty progress.",
                            e
                        ));
                        BTreeMap::new()
                    }
                },
                Err(e) => {
                    crate::log(&format!(
                        "Error reading progress file: {}. Starting with empty progress.",
                        e
                    ));
                    BTreeMap::new()
                }
            }
        } else {
            if let Err(e) = fs::write(&path, "{}") {
                crate::log(&format!("Could not create progress file: {}", e));
            } else {
                crate::log("Created new progress file.");
            }
            BTreeMap::new()
        };

        Self { path, items }
    }

    /// Rewrites the progress file from the in-memory map.
    /// Called after every successful capture, not just on shutdown.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.items).context("Failed to serialize progress")?;
        fs::write(&self.path, json).context("Failed to write progress file")?;
        Ok(())
    }

    /// Marks an identifier as captured.
    pub fn mark(&mut self, identifier: &str) {
        self.items.insert(identifier.to_string(), true);
    }

    /// Returns true if the identifier was already captured.
    pub fn contains(&self, identifier: &str) -> bool {
        self.items.get(identifier).copied().unwrap_or(false)
    }

    /// Number of captured items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_creates_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let store = ProgressStore::load(path.clone());

        assert!(store.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_load_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{not json!").unwrap();

        let store = ProgressStore::load(path);

        assert!(store.is_empty());
    }

    #[test]
    fn test_mark_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let mut store = ProgressStore::load(path.clone());
        store.mark("stone");
        store.mark("dirt");
        store.save().unwrap();

        let reloaded = ProgressStore::load(path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("stone"));
        assert!(reloaded.contains("dirt"));
        assert!(!reloaded.contains("gravel"));
    }

    #[test]
    fn test_mark_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = ProgressStore::load(dir.path().join("progress.json"));

        store.mark("stone");
        store.mark("stone");

        assert_eq!(store.len(), 1);
    }
}
