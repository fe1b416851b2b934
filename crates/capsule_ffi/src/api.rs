//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose library, authoring and study use-cases to Dart via FRB.
//! - Own in-flight quiz and flashcard sessions between calls.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Structured results travel as JSON strings inside response envelopes.
//! - Storage path is fixed after the first `init_storage` or DB-backed call.
//! - At most one quiz and one flashcard session per capsule; starting a new
//!   one drops the previous.

use capsule_core::db::open_db;
use capsule_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DraftCapsule, FlashcardSession, LibraryCard, QuizSession, QuizState, SqliteStore,
    StudyService, CORRECT_ANSWER_DELAY,
};
use log::{info, warn};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

const STORE_DB_FILE_NAME: &str = "capsule_store.sqlite3";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type Registry<T> = Mutex<HashMap<String, T>>;
static QUIZ_SESSIONS: OnceLock<Registry<QuizSession>> = OnceLock::new();
static FLASHCARD_SESSIONS: OnceLock<Registry<FlashcardSession>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the SQLite file used by every DB-backed call and migrates it.
///
/// # FFI contract
/// - Idempotent for the same path; a different path after the first call is
///   rejected.
/// - When never called, the store lives at `<temp_dir>/capsule_store.sqlite3`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_storage(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = STORE_DB_PATH.get_or_init(|| requested.clone());
    if *active != requested {
        return format!(
            "storage already initialized at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        );
    }

    if let Some(parent) = active.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            return format!("init_storage failed: {err}");
        }
    }
    match open_db(active) {
        Ok(_) => String::new(),
        Err(err) => format!("init_storage failed: {err}"),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Capsule ID or session ID, depending on the call.
    pub id: Option<String>,
    /// JSON document describing the result.
    pub payload: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl CapsuleActionResponse {
    fn success(message: impl Into<String>, id: Option<String>, payload: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            payload,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            payload: None,
            message: message.into(),
        }
    }

    fn from_result(result: Result<Self, String>) -> Self {
        result.unwrap_or_else(Self::failure)
    }
}

/// Export envelope: suggested file name plus pretty JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub json: String,
    pub message: String,
}

/// Lists capsules with their best score and known-card count.
///
/// Payload is a JSON array in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn list_capsules() -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let cards = service
            .library()
            .map_err(|err| format!("list_capsules failed: {err}"))?;
        let count = cards.len();
        let payload = Value::Array(cards.iter().map(library_card_json).collect());
        Ok(CapsuleActionResponse::success(
            format!("Found {count} capsule(s)."),
            None,
            Some(payload.to_string()),
        ))
    }))
}

/// Loads one capsule as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn get_capsule_json(id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let capsule = service
            .get_capsule(&id)
            .map_err(|err| format!("get_capsule_json failed: {err}"))?
            .ok_or_else(|| format!("get_capsule_json failed: capsule not found: {id}"))?;
        let payload = serde_json::to_string(&capsule)
            .map_err(|err| format!("get_capsule_json failed: {err}"))?;
        Ok(CapsuleActionResponse::success(
            "Capsule loaded.",
            Some(capsule.id),
            Some(payload),
        ))
    }))
}

/// Saves an authoring draft given as JSON.
///
/// A draft without `id` creates a capsule; with `id` it overwrites in place.
#[flutter_rust_bridge::frb(sync)]
pub fn save_capsule_json(draft_json: String) -> CapsuleActionResponse {
    let draft: DraftCapsule = match serde_json::from_str(&draft_json) {
        Ok(draft) => draft,
        Err(err) => {
            return CapsuleActionResponse::failure(format!(
                "save_capsule_json failed: invalid draft JSON: {err}"
            ))
        }
    };
    CapsuleActionResponse::from_result(with_service(|service| {
        let capsule = service
            .save_capsule(&draft)
            .map_err(|err| format!("save_capsule_json failed: {err}"))?;
        let payload = serde_json::to_string(&capsule)
            .map_err(|err| format!("save_capsule_json failed: {err}"))?;
        Ok(CapsuleActionResponse::success(
            "Capsule saved.",
            Some(capsule.id),
            Some(payload),
        ))
    }))
}

/// Deletes a capsule and its index entry. Progress is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_capsule(id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        service
            .delete_capsule(&id)
            .map_err(|err| format!("delete_capsule failed: {err}"))?;
        Ok(CapsuleActionResponse::success(
            "Capsule deleted.",
            Some(id.clone()),
            None,
        ))
    }))
}

/// Imports a capsule document as a new capsule with a fresh id.
#[flutter_rust_bridge::frb(sync)]
pub fn import_capsule(json_text: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let capsule = service
            .import_capsule(&json_text)
            .map_err(|err| format!("import_capsule failed: {err}"))?;
        Ok(CapsuleActionResponse::success(
            "Capsule imported.",
            Some(capsule.id),
            None,
        ))
    }))
}

/// Exports a capsule as pretty JSON with a suggested file name.
#[flutter_rust_bridge::frb(sync)]
pub fn export_capsule(id: String) -> CapsuleExportResponse {
    match with_service(|service| {
        service
            .export_capsule(&id)
            .map_err(|err| format!("export_capsule failed: {err}"))
    }) {
        Ok(export) => CapsuleExportResponse {
            ok: true,
            file_name: export.file_name,
            json: export.json,
            message: "Capsule exported.".to_string(),
        },
        Err(message) => CapsuleExportResponse {
            ok: false,
            file_name: String::new(),
            json: String::new(),
            message,
        },
    }
}

/// Progress for one capsule; unknown ids read as zero progress.
#[flutter_rust_bridge::frb(sync)]
pub fn get_progress(id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let progress = service.get_progress(&id);
        progress_response("Progress loaded.", &id, &progress)
    }))
}

/// Marks flashcard `index` of capsule `id` as known.
#[flutter_rust_bridge::frb(sync)]
pub fn mark_flashcard_known(id: String, index: u32) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let progress = service
            .mark_flashcard_known(&id, index as usize)
            .map_err(|err| format!("mark_flashcard_known failed: {err}"))?;
        progress_response("Flashcard marked known.", &id, &progress)
    }))
}

/// Removes flashcard `index` of capsule `id` from the known set.
#[flutter_rust_bridge::frb(sync)]
pub fn mark_flashcard_unknown(id: String, index: u32) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let progress = service
            .mark_flashcard_unknown(&id, index as usize)
            .map_err(|err| format!("mark_flashcard_unknown failed: {err}"))?;
        progress_response("Flashcard marked unknown.", &id, &progress)
    }))
}

/// Starts a quiz session; `id` of the response is the session id.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_start(capsule_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let session = service
            .start_quiz(&capsule_id)
            .map_err(|err| format!("quiz_start failed: {err}"))?;
        let session_id = Uuid::new_v4().to_string();
        let payload = quiz_view(&session_id, &session);
        let replaced = register_session(quiz_sessions(), &session_id, session, |open| {
            open.capsule_id() == capsule_id
        });
        info!(
            "event=session_open module=ffi status=ok kind=quiz session={} capsule={} replaced={}",
            session_id, capsule_id, replaced
        );
        Ok(CapsuleActionResponse::success(
            "Quiz started.",
            Some(session_id),
            Some(payload.to_string()),
        ))
    }))
}

/// Submits choice `selected` for the current question.
///
/// Payload carries `feedback` plus the updated `session` view; a correct
/// answer includes `advanceAfterMs` for the auto-advance delay.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_submit_answer(session_id: String, selected: u32) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_quiz(&session_id, |session| {
        let feedback = session
            .submit_answer(selected as usize)
            .map_err(|err| format!("quiz_submit_answer failed: {err}"))?;
        let advance_after_ms = feedback
            .was_correct
            .then(|| CORRECT_ANSWER_DELAY.as_millis() as u64);
        let payload = json!({
            "feedback": {
                "questionIndex": feedback.question_index,
                "selected": feedback.selected,
                "wasCorrect": feedback.was_correct,
                "correctIndex": feedback.correct_index,
                "explanation": feedback.explanation,
                "advanceAfterMs": advance_after_ms,
            },
            "session": quiz_view(&session_id, session),
        });
        let message = if feedback.was_correct {
            "Correct."
        } else {
            "Incorrect."
        };
        Ok(CapsuleActionResponse::success(
            message,
            Some(session_id.clone()),
            Some(payload.to_string()),
        ))
    }))
}

/// Re-asks the current question after a wrong answer.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_retry(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_quiz(&session_id, |session| {
        session
            .retry()
            .map_err(|err| format!("quiz_retry failed: {err}"))?;
        quiz_response("Question reset.", &session_id, session)
    }))
}

/// Moves past a revealed answer; the last question records the score.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_advance(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_quiz(&session_id, |session| {
        let state = with_service(|service| {
            service
                .advance_quiz(&mut *session)
                .map_err(|err| format!("quiz_advance failed: {err}"))
        })?;
        let message = match state {
            QuizState::Finished { .. } => "Quiz finished.",
            _ => "Next question.",
        };
        quiz_response(message, &session_id, session)
    }))
}

/// Starts a finished quiz over from the first question.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_restart(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_quiz(&session_id, |session| {
        session
            .restart()
            .map_err(|err| format!("quiz_restart failed: {err}"))?;
        quiz_response("Quiz restarted.", &session_id, session)
    }))
}

/// Starts a flashcard session; `id` of the response is the session id.
#[flutter_rust_bridge::frb(sync)]
pub fn flashcards_start(capsule_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_service(|service| {
        let session = service
            .start_flashcards(&capsule_id)
            .map_err(|err| format!("flashcards_start failed: {err}"))?;
        let session_id = Uuid::new_v4().to_string();
        let payload = flashcard_view(&session_id, &session, service.is_current_known(&session));
        let replaced = register_session(flashcard_sessions(), &session_id, session, |open| {
            open.capsule_id() == capsule_id
        });
        info!(
            "event=session_open module=ffi status=ok kind=flashcards session={} capsule={} replaced={}",
            session_id, capsule_id, replaced
        );
        Ok(CapsuleActionResponse::success(
            "Flashcards started.",
            Some(session_id),
            Some(payload.to_string()),
        ))
    }))
}

/// Moves to the next card, staying on the last one.
#[flutter_rust_bridge::frb(sync)]
pub fn flashcards_next(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_flashcards(&session_id, |session| {
        session.next();
        flashcard_response("Moved.", &session_id, session)
    }))
}

/// Moves to the previous card, staying on the first one.
#[flutter_rust_bridge::frb(sync)]
pub fn flashcards_prev(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_flashcards(&session_id, |session| {
        session.prev();
        flashcard_response("Moved.", &session_id, session)
    }))
}

/// Toggles front/back of the current card.
#[flutter_rust_bridge::frb(sync)]
pub fn flashcards_flip(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_flashcards(&session_id, |session| {
        session.flip();
        flashcard_response("Flipped.", &session_id, session)
    }))
}

/// Marks the card under the cursor as known.
#[flutter_rust_bridge::frb(sync)]
pub fn flashcards_mark_known(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_flashcards(&session_id, |session| {
        with_service(|service| {
            service
                .mark_current_known(&*session)
                .map_err(|err| format!("flashcards_mark_known failed: {err}"))
        })?;
        flashcard_response("Marked known.", &session_id, session)
    }))
}

/// Removes the card under the cursor from the known set.
#[flutter_rust_bridge::frb(sync)]
pub fn flashcards_mark_unknown(session_id: String) -> CapsuleActionResponse {
    CapsuleActionResponse::from_result(with_flashcards(&session_id, |session| {
        with_service(|service| {
            service
                .mark_current_unknown(&*session)
                .map_err(|err| format!("flashcards_mark_unknown failed: {err}"))
        })?;
        flashcard_response("Marked unknown.", &session_id, session)
    }))
}

/// Drops a quiz or flashcard session. Returns whether one existed.
#[flutter_rust_bridge::frb(sync)]
pub fn session_close(session_id: String) -> bool {
    let closed = lock_registry(quiz_sessions()).remove(&session_id).is_some()
        || lock_registry(flashcard_sessions())
            .remove(&session_id)
            .is_some();
    if !closed {
        warn!(
            "event=session_close module=ffi status=error reason=unknown_session session={}",
            session_id
        );
    }
    closed
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| std::env::temp_dir().join(STORE_DB_FILE_NAME))
        .clone()
}

fn open_store() -> Result<Connection, String> {
    let db_path = resolve_store_db_path();
    open_db(&db_path).map_err(|err| format!("store DB open failed: {err}"))
}

fn with_service<T>(
    f: impl FnOnce(&StudyService<SqliteStore<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_store()?;
    let service = StudyService::new(SqliteStore::new(&conn));
    f(&service)
}

fn quiz_sessions() -> &'static Registry<QuizSession> {
    QUIZ_SESSIONS.get_or_init(Default::default)
}

fn flashcard_sessions() -> &'static Registry<FlashcardSession> {
    FLASHCARD_SESSIONS.get_or_init(Default::default)
}

fn lock_registry<T>(
    registry: &'static Registry<T>,
) -> std::sync::MutexGuard<'static, HashMap<String, T>> {
    // Sessions stay usable after a panicked call.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stores `session`, dropping sessions of the same kind for the same
/// capsule. Returns how many were dropped.
fn register_session<T>(
    registry: &'static Registry<T>,
    session_id: &str,
    session: T,
    same_capsule: impl Fn(&T) -> bool,
) -> usize {
    let mut sessions = lock_registry(registry);
    let before = sessions.len();
    sessions.retain(|_, open| !same_capsule(open));
    let replaced = before - sessions.len();
    sessions.insert(session_id.to_string(), session);
    replaced
}

fn with_session<T, R>(
    registry: &'static Registry<T>,
    session_id: &str,
    f: impl FnOnce(&mut T) -> Result<R, String>,
) -> Result<R, String> {
    let mut sessions = lock_registry(registry);
    let session = sessions
        .get_mut(session_id)
        .ok_or_else(|| format!("unknown session `{session_id}`"))?;
    f(session)
}

fn with_quiz<R>(
    session_id: &str,
    f: impl FnOnce(&mut QuizSession) -> Result<R, String>,
) -> Result<R, String> {
    with_session(quiz_sessions(), session_id, f)
}

fn with_flashcards<R>(
    session_id: &str,
    f: impl FnOnce(&mut FlashcardSession) -> Result<R, String>,
) -> Result<R, String> {
    with_session(flashcard_sessions(), session_id, f)
}

fn progress_response(
    message: &str,
    id: &str,
    progress: &capsule_core::Progress,
) -> Result<CapsuleActionResponse, String> {
    let payload = serde_json::to_string(progress).map_err(|err| err.to_string())?;
    Ok(CapsuleActionResponse::success(
        message,
        Some(id.to_string()),
        Some(payload),
    ))
}

fn quiz_response(
    message: &str,
    session_id: &str,
    session: &QuizSession,
) -> Result<CapsuleActionResponse, String> {
    Ok(CapsuleActionResponse::success(
        message,
        Some(session_id.to_string()),
        Some(quiz_view(session_id, session).to_string()),
    ))
}

fn flashcard_response(
    message: &str,
    session_id: &str,
    session: &FlashcardSession,
) -> Result<CapsuleActionResponse, String> {
    let known = with_service(|service| Ok(service.is_current_known(session)))?;
    Ok(CapsuleActionResponse::success(
        message,
        Some(session_id.to_string()),
        Some(flashcard_view(session_id, session, known).to_string()),
    ))
}

fn library_card_json(card: &LibraryCard) -> Value {
    json!({
        "id": card.entry.id,
        "title": card.entry.title,
        "subject": card.entry.subject,
        "level": card.entry.level,
        "updatedAt": card.entry.updated_at,
        "bestScore": card.best_score,
        "knownCount": card.known_count,
    })
}

fn quiz_view(session_id: &str, session: &QuizSession) -> Value {
    let (state, question_index, was_correct) = match session.state() {
        QuizState::AwaitingAnswer { question_index } => {
            ("awaiting_answer", Some(question_index), None)
        }
        QuizState::AnswerRevealed {
            question_index,
            was_correct,
        } => ("answer_revealed", Some(question_index), Some(was_correct)),
        QuizState::Finished { .. } => ("finished", None, None),
    };
    let question = session.current_item().map(|item| {
        json!({
            "question": item.question,
            "choices": item.choices,
        })
    });
    let summary = session.summary().map(|summary| {
        json!({
            "correct": summary.correct,
            "total": summary.total,
            "mistakes": summary.mistakes,
            "finalScore": summary.final_score,
            "passed": summary.passed,
        })
    });
    json!({
        "sessionId": session_id,
        "capsuleId": session.capsule_id(),
        "state": state,
        "questionIndex": question_index,
        "wasCorrect": was_correct,
        "total": session.total(),
        "score": session.score(),
        "penalties": session.penalties(),
        "question": question,
        "summary": summary,
    })
}

fn flashcard_view(session_id: &str, session: &FlashcardSession, known: bool) -> Value {
    let card = session.current();
    json!({
        "sessionId": session_id,
        "capsuleId": session.capsule_id(),
        "cursor": session.cursor(),
        "total": session.total(),
        "position": session.position_label(),
        "revealed": session.is_revealed(),
        "front": card.front,
        "back": card.back,
        "known": known,
    })
}
