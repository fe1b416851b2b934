//! Core domain logic for study capsules.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::capsule::{
    new_capsule_id, Capsule, CapsuleId, CapsuleMeta, CapsuleValidationError, Flashcard, Level,
    QuizItem, QUIZ_CHOICE_COUNT,
};
pub use model::draft::DraftCapsule;
pub use model::index::IndexEntry;
pub use model::progress::{Progress, MAX_SCORE};
pub use repo::capsule_repo::{
    export_file_name, CapsuleExport, CapsuleRepository, ImportError, RepoError, RepoResult,
};
pub use repo::progress_repo::ProgressTracker;
pub use service::flashcard_session::{FlashcardError, FlashcardSession};
pub use service::notes_view::filter_notes;
pub use service::quiz_session::{
    final_score, AnswerFeedback, QuizError, QuizSession, QuizState, QuizSummary,
    CORRECT_ANSWER_DELAY, PASSING_SCORE, PENALTY_PER_MISTAKE,
};
pub use service::study_service::{LibraryCard, StudyError, StudyResult, StudyService};
pub use store::{KvStore, MemoryStore, SqliteStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
