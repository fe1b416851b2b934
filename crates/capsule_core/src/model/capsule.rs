//! Capsule domain model.
//!
//! # Responsibility
//! - Define the canonical study unit (meta + notes + flashcards + quiz).
//! - Own structural validation shared by save and import paths.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reassigned.
//! - Every quiz item carries exactly `QUIZ_CHOICE_COUNT` choices.
//! - `correct` always indexes into `choices`.
//!
//! # See also
//! - model::draft for the editable counterpart used by authoring flows.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Number of choices every quiz item must carry.
pub const QUIZ_CHOICE_COUNT: usize = 4;

/// Opaque, stable identifier of one capsule.
///
/// Kept as a plain string: newly created capsules get UUID v4 text, while
/// legacy or imported data may carry any token.
pub type CapsuleId = String;

/// Generates a fresh capsule id.
pub fn new_capsule_id() -> CapsuleId {
    Uuid::new_v4().to_string()
}

/// Difficulty level shown next to a capsule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive header of a capsule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsuleMeta {
    /// Required display title.
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub description: String,
}

/// Two-sided recall card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
}

/// Multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    #[serde(default)]
    pub question: String,
    pub choices: Vec<String>,
    /// Index into `choices` of the right answer.
    #[serde(default)]
    pub correct: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizItem {
    /// Blank question with four empty choices, first choice marked correct.
    pub fn blank() -> Self {
        Self {
            question: String::new(),
            choices: vec![String::new(); QUIZ_CHOICE_COUNT],
            correct: 0,
            explanation: String::new(),
        }
    }
}

/// Persisted study unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capsule {
    /// The storage key is authoritative; a missing field decodes as empty.
    #[serde(default)]
    pub id: CapsuleId,
    pub meta: CapsuleMeta,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub quiz: Vec<QuizItem>,
}

impl Capsule {
    /// Returns whether at least one study mode has content.
    pub fn has_content(&self) -> bool {
        has_content(&self.notes, &self.flashcards, &self.quiz)
    }

    /// Checks title and quiz shape; the minimum required before persisting.
    pub fn validate_structure(&self) -> Result<(), CapsuleValidationError> {
        validate_structure(&self.meta, &self.quiz)
    }

    /// Full validity: structure plus at least one non-empty study mode.
    pub fn validate(&self) -> Result<(), CapsuleValidationError> {
        self.validate_structure()?;
        if !self.has_content() {
            return Err(CapsuleValidationError::EmptyContent);
        }
        Ok(())
    }
}

pub(crate) fn has_content(notes: &[String], flashcards: &[Flashcard], quiz: &[QuizItem]) -> bool {
    !notes.is_empty() || !flashcards.is_empty() || !quiz.is_empty()
}

pub(crate) fn validate_structure(
    meta: &CapsuleMeta,
    quiz: &[QuizItem],
) -> Result<(), CapsuleValidationError> {
    if meta.title.trim().is_empty() {
        return Err(CapsuleValidationError::EmptyTitle);
    }

    for (item, entry) in quiz.iter().enumerate() {
        if entry.choices.len() != QUIZ_CHOICE_COUNT {
            return Err(CapsuleValidationError::WrongChoiceCount {
                item,
                found: entry.choices.len(),
            });
        }
        if entry.correct >= QUIZ_CHOICE_COUNT {
            return Err(CapsuleValidationError::CorrectOutOfRange {
                item,
                correct: entry.correct,
            });
        }
    }

    Ok(())
}

/// Structural validation failures for capsules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapsuleValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// `meta.title` is absent or not a string in an imported document.
    MissingTitle,
    /// Notes, flashcards and quiz are all empty.
    EmptyContent,
    /// A field is valid JSON of the wrong type or value, as `field: reason`.
    Malformed(String),
    WrongChoiceCount {
        item: usize,
        found: usize,
    },
    CorrectOutOfRange {
        item: usize,
        correct: usize,
    },
}

impl Display for CapsuleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::MissingTitle => write!(f, "missing title: meta.title must be a string"),
            Self::EmptyContent => {
                write!(f, "capsule must contain notes, flashcards or quiz items")
            }
            Self::Malformed(detail) => write!(f, "malformed {detail}"),
            Self::WrongChoiceCount { item, found } => write!(
                f,
                "quiz item {item} must have {QUIZ_CHOICE_COUNT} choices, found {found}"
            ),
            Self::CorrectOutOfRange { item, correct } => write!(
                f,
                "quiz item {item} marks choice {correct} as correct; expected 0..{}",
                QUIZ_CHOICE_COUNT - 1
            ),
        }
    }
}

impl Error for CapsuleValidationError {}

#[cfg(test)]
mod tests {
    use super::{Capsule, CapsuleMeta, CapsuleValidationError, Flashcard, Level, QuizItem};

    fn capsule(title: &str) -> Capsule {
        Capsule {
            id: "c1".to_string(),
            meta: CapsuleMeta {
                title: title.to_string(),
                ..CapsuleMeta::default()
            },
            notes: Vec::new(),
            flashcards: Vec::new(),
            quiz: Vec::new(),
        }
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = capsule("   ").validate_structure().unwrap_err();
        assert_eq!(err, CapsuleValidationError::EmptyTitle);
    }

    #[test]
    fn title_only_capsule_has_no_content() {
        let err = capsule("Rust").validate().unwrap_err();
        assert_eq!(err, CapsuleValidationError::EmptyContent);

        let mut with_card = capsule("Rust");
        with_card.flashcards.push(Flashcard::default());
        assert!(with_card.validate().is_ok());
    }

    #[test]
    fn quiz_shape_is_checked() {
        let mut three_choices = capsule("Quiz");
        let mut item = QuizItem::blank();
        item.choices.pop();
        three_choices.quiz.push(item);
        assert_eq!(
            three_choices.validate().unwrap_err(),
            CapsuleValidationError::WrongChoiceCount { item: 0, found: 3 }
        );

        let mut bad_correct = capsule("Quiz");
        let mut item = QuizItem::blank();
        item.correct = 4;
        bad_correct.quiz.push(item);
        assert_eq!(
            bad_correct.validate().unwrap_err(),
            CapsuleValidationError::CorrectOutOfRange {
                item: 0,
                correct: 4
            }
        );
    }

    #[test]
    fn level_serializes_with_display_names() {
        let json = serde_json::to_string(&Level::Intermediate).unwrap();
        assert_eq!(json, "\"Intermediate\"");
        assert_eq!(Level::default(), Level::Beginner);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let parsed: Capsule =
            serde_json::from_str(r#"{"id":"x","meta":{"title":"Only title"},"notes":["a"]}"#)
                .unwrap();
        assert_eq!(parsed.meta.level, Level::Beginner);
        assert!(parsed.meta.subject.is_empty());
        assert!(parsed.quiz.is_empty());
    }
}
