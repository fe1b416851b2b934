//! Flashcard cursor session.
//!
//! # Responsibility
//! - Navigate a capsule's flashcards without wraparound.
//! - Delegate known/unknown marks for the card under the cursor.
//!
//! # Invariants
//! - `cursor` stays within `0..total` and `total >= 1`.
//! - Known membership is never cached here; it is read from the tracker.
//! - `revealed` is presentation state only and resets on navigation.

use crate::model::capsule::{Capsule, CapsuleId, Flashcard};
use crate::model::progress::Progress;
use crate::repo::capsule_repo::RepoResult;
use crate::repo::progress_repo::ProgressTracker;
use crate::store::KvStore;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashcardError {
    /// Capsule has no flashcards; callers show an empty state instead.
    NoFlashcards,
}

impl Display for FlashcardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFlashcards => write!(f, "capsule has no flashcards"),
        }
    }
}

impl Error for FlashcardError {}

/// Cursor over one capsule's flashcards.
#[derive(Debug, Clone)]
pub struct FlashcardSession {
    capsule_id: CapsuleId,
    cards: Vec<Flashcard>,
    cursor: usize,
    revealed: bool,
}

impl FlashcardSession {
    pub fn start(capsule: &Capsule) -> Result<Self, FlashcardError> {
        if capsule.flashcards.is_empty() {
            return Err(FlashcardError::NoFlashcards);
        }
        Ok(Self {
            capsule_id: capsule.id.clone(),
            cards: capsule.flashcards.clone(),
            cursor: 0,
            revealed: false,
        })
    }

    pub fn capsule_id(&self) -> &str {
        &self.capsule_id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn current(&self) -> &Flashcard {
        &self.cards[self.cursor]
    }

    /// One-based position, e.g. `"3 / 10"`.
    pub fn position_label(&self) -> String {
        format!("{} / {}", self.cursor + 1, self.cards.len())
    }

    /// Moves forward, stopping at the last card.
    pub fn next(&mut self) -> usize {
        if self.cursor + 1 < self.cards.len() {
            self.cursor += 1;
        }
        self.revealed = false;
        self.cursor
    }

    /// Moves back, stopping at the first card.
    pub fn prev(&mut self) -> usize {
        self.cursor = self.cursor.saturating_sub(1);
        self.revealed = false;
        self.cursor
    }

    /// Toggles which side is shown. Returns the new `revealed` flag.
    pub fn flip(&mut self) -> bool {
        self.revealed = !self.revealed;
        self.revealed
    }

    pub fn mark_known<S: KvStore>(&self, tracker: &ProgressTracker<S>) -> RepoResult<Progress> {
        tracker.mark_known(&self.capsule_id, self.cursor)
    }

    pub fn mark_unknown<S: KvStore>(&self, tracker: &ProgressTracker<S>) -> RepoResult<Progress> {
        tracker.mark_unknown(&self.capsule_id, self.cursor)
    }

    /// Reads whether the current card is marked known.
    pub fn is_known<S: KvStore>(&self, tracker: &ProgressTracker<S>) -> bool {
        tracker.load(&self.capsule_id).is_known(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::{FlashcardError, FlashcardSession};
    use crate::model::capsule::{Capsule, CapsuleMeta, Flashcard};

    fn capsule(cards: usize) -> Capsule {
        Capsule {
            id: "deck".to_string(),
            meta: CapsuleMeta {
                title: "Deck".to_string(),
                ..CapsuleMeta::default()
            },
            notes: Vec::new(),
            flashcards: (0..cards)
                .map(|i| Flashcard {
                    front: format!("front {i}"),
                    back: format!("back {i}"),
                })
                .collect(),
            quiz: Vec::new(),
        }
    }

    #[test]
    fn empty_deck_cannot_start() {
        assert_eq!(
            FlashcardSession::start(&capsule(0)).unwrap_err(),
            FlashcardError::NoFlashcards
        );
    }

    #[test]
    fn navigation_resets_flip_state() {
        let mut session = FlashcardSession::start(&capsule(2)).unwrap();
        assert!(session.flip());
        session.next();
        assert!(!session.is_revealed());
        assert_eq!(session.current().front, "front 1");
        assert_eq!(session.position_label(), "2 / 2");
        assert!(session.flip());
        assert!(!session.flip());
    }
}
