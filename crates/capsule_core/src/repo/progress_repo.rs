//! Progress tracker over a key-value store.
//!
//! # Responsibility
//! - Read and write per-capsule progress with safe defaults.
//! - Provide idempotent read-modify-write helpers for study sessions.
//!
//! # Invariants
//! - `load` never fails: absent, corrupt or unreadable progress is zeroed.
//! - `save` overwrites the whole record; last write wins, no field merge.
//! - `best_score` only moves up through `record_quiz_score`.

use crate::model::progress::Progress;
use crate::repo::capsule_repo::RepoResult;
use crate::store::keys::progress_key;
use crate::store::KvStore;
use log::{debug, warn};

/// Store-backed progress tracker.
pub struct ProgressTracker<S: KvStore> {
    store: S,
}

impl<S: KvStore> ProgressTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads progress for `id`, defaulting to zeroed progress.
    pub fn load(&self, id: &str) -> Progress {
        let raw = match self.store.get(&progress_key(id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Progress::default(),
            Err(err) => {
                warn!(
                    "event=progress_load module=progress status=recovered reason=store_read id={} error={}",
                    id, err
                );
                return Progress::default();
            }
        };

        match serde_json::from_str::<Progress>(&raw) {
            Ok(progress) => progress.normalized(),
            Err(err) => {
                warn!(
                    "event=progress_load module=progress status=recovered reason=malformed id={} error={}",
                    id, err
                );
                Progress::default()
            }
        }
    }

    /// Overwrites progress for `id`.
    pub fn save(&self, id: &str, progress: &Progress) -> RepoResult<()> {
        let body = serde_json::to_string(progress)?;
        self.store.set(&progress_key(id), &body)?;
        Ok(())
    }

    /// Adds `flashcard_index` to the known set.
    pub fn mark_known(&self, id: &str, flashcard_index: usize) -> RepoResult<Progress> {
        let mut progress = self.load(id);
        progress.mark_known(flashcard_index);
        self.save(id, &progress)?;
        Ok(progress)
    }

    /// Removes `flashcard_index` from the known set.
    pub fn mark_unknown(&self, id: &str, flashcard_index: usize) -> RepoResult<Progress> {
        let mut progress = self.load(id);
        progress.mark_unknown(flashcard_index);
        self.save(id, &progress)?;
        Ok(progress)
    }

    /// Keeps the best of the stored score and `percent` (clamped to 0..=100).
    pub fn record_quiz_score(&self, id: &str, percent: i64) -> RepoResult<Progress> {
        let mut progress = self.load(id);
        let improved = progress.record_score(percent);
        self.save(id, &progress)?;
        debug!(
            "event=quiz_score module=progress status=ok id={} percent={} best={} improved={}",
            id, percent, progress.best_score, improved
        );
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressTracker;
    use crate::model::progress::Progress;
    use crate::store::keys::progress_key;
    use crate::store::{KvStore, MemoryStore};

    #[test]
    fn missing_progress_is_zeroed() {
        let store = MemoryStore::new();
        let tracker = ProgressTracker::new(&store);
        assert_eq!(tracker.load("nope"), Progress::default());
    }

    #[test]
    fn malformed_progress_is_zeroed() {
        let store = MemoryStore::new();
        store.set(&progress_key("c"), "{\"bestScore\":\"high\"").unwrap();
        let tracker = ProgressTracker::new(&store);
        let progress = tracker.load("c");
        assert_eq!(progress.best_score, 0);
        assert!(progress.known_flashcards.is_empty());
    }

    #[test]
    fn out_of_range_stored_score_is_clamped() {
        let store = MemoryStore::new();
        store.set(&progress_key("c"), "{\"bestScore\":180}").unwrap();
        let tracker = ProgressTracker::new(&store);
        assert_eq!(tracker.load("c").best_score, 100);
    }

    #[test]
    fn mark_helpers_are_idempotent() {
        let store = MemoryStore::new();
        let tracker = ProgressTracker::new(&store);
        tracker.mark_known("c", 1).unwrap();
        let twice = tracker.mark_known("c", 1).unwrap();
        assert_eq!(twice.known_count(), 1);
        tracker.mark_unknown("c", 1).unwrap();
        let again = tracker.mark_unknown("c", 1).unwrap();
        assert_eq!(again.known_count(), 0);
    }
}
