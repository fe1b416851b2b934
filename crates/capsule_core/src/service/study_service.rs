//! Study use-case service.
//!
//! # Responsibility
//! - Expose the library, authoring and study operations the presentation
//!   layer calls, over one store.
//! - Compose repository, progress tracker and session state machines.
//!
//! # Invariants
//! - Every operation takes the capsule id explicitly; the service keeps no
//!   "current capsule".
//! - Sessions are owned by the caller and passed back in for transitions.
//! - Deleting a capsule leaves its progress record in place.

use crate::model::capsule::{Capsule, CapsuleId};
use crate::model::draft::DraftCapsule;
use crate::model::index::IndexEntry;
use crate::model::progress::Progress;
use crate::repo::capsule_repo::{CapsuleExport, CapsuleRepository, RepoError};
use crate::repo::progress_repo::ProgressTracker;
use crate::service::flashcard_session::{FlashcardError, FlashcardSession};
use crate::service::notes_view::filter_notes;
use crate::service::quiz_session::{AnswerFeedback, QuizError, QuizSession, QuizState};
use crate::store::KvStore;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StudyResult<T> = Result<T, StudyError>;

/// Service error for study use-cases.
#[derive(Debug)]
pub enum StudyError {
    Repo(RepoError),
    Quiz(QuizError),
    Flashcard(FlashcardError),
    /// Flashcard index does not exist on the capsule.
    FlashcardOutOfRange {
        id: CapsuleId,
        index: usize,
        total: usize,
    },
}

impl Display for StudyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Quiz(err) => write!(f, "{err}"),
            Self::Flashcard(err) => write!(f, "{err}"),
            Self::FlashcardOutOfRange { id, index, total } => write!(
                f,
                "flashcard {index} does not exist on capsule {id} ({total} cards)"
            ),
        }
    }
}

impl Error for StudyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Quiz(err) => Some(err),
            Self::Flashcard(err) => Some(err),
            Self::FlashcardOutOfRange { .. } => None,
        }
    }
}

impl From<RepoError> for StudyError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<QuizError> for StudyError {
    fn from(value: QuizError) -> Self {
        match value {
            QuizError::Repo(err) => Self::Repo(err),
            other => Self::Quiz(other),
        }
    }
}

impl From<FlashcardError> for StudyError {
    fn from(value: FlashcardError) -> Self {
        Self::Flashcard(value)
    }
}

/// Library listing row joined with progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCard {
    pub entry: IndexEntry,
    pub best_score: u8,
    pub known_count: usize,
}

/// Facade over capsule storage and study sessions.
pub struct StudyService<S: KvStore> {
    store: S,
}

impl<S: KvStore> StudyService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store, for hosts that need direct access.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn capsules(&self) -> CapsuleRepository<&S> {
        CapsuleRepository::new(&self.store)
    }

    fn progress(&self) -> ProgressTracker<&S> {
        ProgressTracker::new(&self.store)
    }

    /// Lists index entries in insertion order.
    pub fn list_capsules(&self) -> StudyResult<Vec<IndexEntry>> {
        Ok(self.capsules().list()?)
    }

    /// Lists index entries with best score and known-card count.
    pub fn library(&self) -> StudyResult<Vec<LibraryCard>> {
        let tracker = self.progress();
        let cards = self
            .capsules()
            .list()?
            .into_iter()
            .map(|entry| {
                let progress = tracker.load(&entry.id);
                LibraryCard {
                    entry,
                    best_score: progress.best_score,
                    known_count: progress.known_count(),
                }
            })
            .collect();
        Ok(cards)
    }

    pub fn get_capsule(&self, id: &str) -> StudyResult<Option<Capsule>> {
        Ok(self.capsules().get(id)?)
    }

    /// Editable draft of a stored capsule.
    pub fn edit_draft(&self, id: &str) -> StudyResult<DraftCapsule> {
        let capsule = self.require_capsule(id)?;
        Ok(DraftCapsule::from_capsule(&capsule))
    }

    pub fn save_capsule(&self, draft: &DraftCapsule) -> StudyResult<Capsule> {
        Ok(self.capsules().save(draft)?)
    }

    pub fn delete_capsule(&self, id: &str) -> StudyResult<()> {
        Ok(self.capsules().delete(id)?)
    }

    pub fn import_capsule(&self, json_text: &str) -> StudyResult<Capsule> {
        Ok(self.capsules().import_json(json_text)?)
    }

    pub fn export_capsule(&self, id: &str) -> StudyResult<CapsuleExport> {
        Ok(self.capsules().export_json(id)?)
    }

    pub fn get_progress(&self, id: &str) -> Progress {
        self.progress().load(id)
    }

    pub fn mark_flashcard_known(&self, id: &str, index: usize) -> StudyResult<Progress> {
        self.require_flashcard(id, index)?;
        Ok(self.progress().mark_known(id, index)?)
    }

    pub fn mark_flashcard_unknown(&self, id: &str, index: usize) -> StudyResult<Progress> {
        self.require_flashcard(id, index)?;
        Ok(self.progress().mark_unknown(id, index)?)
    }

    /// Notes of one capsule matching `term`.
    pub fn search_notes(&self, id: &str, term: &str) -> StudyResult<Vec<String>> {
        let capsule = self.require_capsule(id)?;
        Ok(filter_notes(&capsule.notes, term)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn start_quiz(&self, id: &str) -> StudyResult<QuizSession> {
        let capsule = self.require_capsule(id)?;
        Ok(QuizSession::start(&capsule)?)
    }

    pub fn submit_quiz_answer(
        &self,
        session: &mut QuizSession,
        selected: usize,
    ) -> StudyResult<AnswerFeedback> {
        Ok(session.submit_answer(selected)?)
    }

    pub fn retry_quiz_question(&self, session: &mut QuizSession) -> StudyResult<()> {
        Ok(session.retry()?)
    }

    /// Advances past a revealed answer, recording the score on completion.
    pub fn advance_quiz(&self, session: &mut QuizSession) -> StudyResult<QuizState> {
        Ok(session.advance(&self.progress())?)
    }

    pub fn restart_quiz(&self, session: &mut QuizSession) -> StudyResult<()> {
        Ok(session.restart()?)
    }

    pub fn start_flashcards(&self, id: &str) -> StudyResult<FlashcardSession> {
        let capsule = self.require_capsule(id)?;
        Ok(FlashcardSession::start(&capsule)?)
    }

    pub fn mark_current_known(&self, session: &FlashcardSession) -> StudyResult<Progress> {
        Ok(session.mark_known(&self.progress())?)
    }

    pub fn mark_current_unknown(&self, session: &FlashcardSession) -> StudyResult<Progress> {
        Ok(session.mark_unknown(&self.progress())?)
    }

    pub fn is_current_known(&self, session: &FlashcardSession) -> bool {
        session.is_known(&self.progress())
    }

    fn require_capsule(&self, id: &str) -> StudyResult<Capsule> {
        self.capsules()
            .get(id)?
            .ok_or_else(|| StudyError::Repo(RepoError::NotFound(id.to_string())))
    }

    fn require_flashcard(&self, id: &str, index: usize) -> StudyResult<()> {
        let capsule = self.require_capsule(id)?;
        let total = capsule.flashcards.len();
        if index >= total {
            return Err(StudyError::FlashcardOutOfRange {
                id: id.to_string(),
                index,
                total,
            });
        }
        Ok(())
    }
}
