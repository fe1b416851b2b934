//! Editable capsule draft used by authoring flows.
//!
//! # Responsibility
//! - Carry authoring input as a typed value instead of scraped form state.
//! - Provide list mutations for flashcards and quiz rows.
//! - Normalize whitespace the same way for every save path.
//!
//! # Invariants
//! - `id == None` means "not persisted yet"; the repository assigns one.
//! - `normalized()` never reorders notes, flashcards or quiz items.

use crate::model::capsule::{
    has_content, validate_structure, Capsule, CapsuleId, CapsuleMeta, CapsuleValidationError,
    Flashcard, QuizItem,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Mutable, not-yet-validated capsule content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftCapsule {
    #[serde(default)]
    pub id: Option<CapsuleId>,
    #[serde(default)]
    pub meta: CapsuleMeta,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flashcards: Vec<Flashcard>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub quiz: Vec<QuizItem>,
}

impl DraftCapsule {
    /// Empty draft for a new capsule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft pre-filled from a stored capsule, keeping its id.
    pub fn from_capsule(capsule: &Capsule) -> Self {
        Self {
            id: Some(capsule.id.clone()),
            meta: capsule.meta.clone(),
            notes: capsule.notes.clone(),
            flashcards: capsule.flashcards.clone(),
            quiz: capsule.quiz.clone(),
        }
    }

    /// Replaces notes from multi-line text, one note per non-blank line.
    pub fn set_notes_from_text(&mut self, text: &str) {
        self.notes = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Notes joined back into the one-per-line editing form.
    pub fn notes_text(&self) -> String {
        self.notes.join("\n")
    }

    /// Appends a blank flashcard and returns its position.
    pub fn add_flashcard(&mut self) -> usize {
        self.flashcards.push(Flashcard::default());
        self.flashcards.len() - 1
    }

    /// Removes the flashcard at `index`; out-of-range indexes are ignored.
    pub fn remove_flashcard_at(&mut self, index: usize) -> Option<Flashcard> {
        (index < self.flashcards.len()).then(|| self.flashcards.remove(index))
    }

    /// Appends a blank quiz item and returns its position.
    pub fn add_quiz_item(&mut self) -> usize {
        self.quiz.push(QuizItem::blank());
        self.quiz.len() - 1
    }

    /// Removes the quiz item at `index`; out-of-range indexes are ignored.
    pub fn remove_quiz_item_at(&mut self, index: usize) -> Option<QuizItem> {
        (index < self.quiz.len()).then(|| self.quiz.remove(index))
    }

    pub fn has_content(&self) -> bool {
        has_content(&self.notes, &self.flashcards, &self.quiz)
    }

    /// Checks title and quiz shape.
    pub fn validate_structure(&self) -> Result<(), CapsuleValidationError> {
        validate_structure(&self.meta, &self.quiz)
    }

    /// Returns a copy with all text trimmed and blank notes dropped.
    pub fn normalized(&self) -> Self {
        let meta = CapsuleMeta {
            title: self.meta.title.trim().to_string(),
            subject: self.meta.subject.trim().to_string(),
            level: self.meta.level,
            description: self.meta.description.trim().to_string(),
        };
        let notes = self
            .notes
            .iter()
            .map(|note| note.trim())
            .filter(|note| !note.is_empty())
            .map(str::to_string)
            .collect();
        let flashcards = self
            .flashcards
            .iter()
            .map(|card| Flashcard {
                front: card.front.trim().to_string(),
                back: card.back.trim().to_string(),
            })
            .collect();
        let quiz = self
            .quiz
            .iter()
            .map(|item| QuizItem {
                question: item.question.trim().to_string(),
                choices: item.choices.iter().map(|c| c.trim().to_string()).collect(),
                correct: item.correct,
                explanation: item.explanation.trim().to_string(),
            })
            .collect();

        Self {
            id: self
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            meta,
            notes,
            flashcards,
            quiz,
        }
    }

    /// Converts into a persisted capsule under `id`.
    pub(crate) fn into_capsule(self, id: CapsuleId) -> Capsule {
        Capsule {
            id,
            meta: self.meta,
            notes: self.notes,
            flashcards: self.flashcards,
            quiz: self.quiz,
        }
    }
}

/// Reads `null` list fields as empty lists.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
