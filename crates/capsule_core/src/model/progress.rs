//! Per-capsule study progress.
//!
//! # Responsibility
//! - Hold the best quiz score and the set of known flashcard positions.
//!
//! # Invariants
//! - `best_score` stays within `0..=MAX_SCORE` and never decreases through
//!   `record_score`.
//! - `known_flashcards` holds positions into the flashcard list at the time
//!   they were marked; later edits to the list are not reconciled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MAX_SCORE: u8 = 100;

/// Study state for one capsule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub best_score: u8,
    #[serde(default)]
    pub known_flashcards: BTreeSet<usize>,
}

impl Progress {
    /// Clamps a raw percentage into the valid score range.
    pub fn clamp_score(percent: i64) -> u8 {
        // Lossless: value is within 0..=100 after clamp.
        percent.clamp(0, i64::from(MAX_SCORE)) as u8
    }

    /// Raises `best_score` to `percent` when higher. Returns whether it changed.
    pub fn record_score(&mut self, percent: i64) -> bool {
        let clamped = Self::clamp_score(percent);
        if clamped > self.best_score {
            self.best_score = clamped;
            return true;
        }
        false
    }

    /// Adds a known flashcard position. Returns whether the set changed.
    pub fn mark_known(&mut self, index: usize) -> bool {
        self.known_flashcards.insert(index)
    }

    /// Removes a known flashcard position. Returns whether the set changed.
    pub fn mark_unknown(&mut self, index: usize) -> bool {
        self.known_flashcards.remove(&index)
    }

    pub fn is_known(&self, index: usize) -> bool {
        self.known_flashcards.contains(&index)
    }

    pub fn known_count(&self) -> usize {
        self.known_flashcards.len()
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.best_score = self.best_score.min(MAX_SCORE);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;

    #[test]
    fn record_score_keeps_the_maximum() {
        let mut progress = Progress::default();
        assert!(progress.record_score(40));
        assert!(!progress.record_score(10));
        assert!(progress.record_score(90));
        assert_eq!(progress.best_score, 90);
    }

    #[test]
    fn record_score_clamps_out_of_range_values() {
        let mut progress = Progress::default();
        assert!(!progress.record_score(-20));
        assert_eq!(progress.best_score, 0);
        progress.record_score(250);
        assert_eq!(progress.best_score, 100);
    }

    #[test]
    fn decodes_partial_documents_with_defaults() {
        let empty: Progress = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Progress::default());

        let legacy: Progress = serde_json::from_str(r#"{"knownFlashcards":[2,0,2]}"#).unwrap();
        assert_eq!(legacy.best_score, 0);
        assert_eq!(legacy.known_count(), 2);
        assert!(legacy.is_known(0));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut progress = Progress::default();
        progress.record_score(55);
        progress.mark_known(3);
        let json = serde_json::to_string(&progress).unwrap();
        assert_eq!(json, r#"{"bestScore":55,"knownFlashcards":[3]}"#);
    }
}
