//! Capsule repository over a key-value store.
//!
//! # Responsibility
//! - Assign ids, persist capsule records and keep the library index in sync.
//! - Import and export single-capsule JSON documents.
//!
//! # Invariants
//! - A capsule write always upserts its index entry; a delete always removes
//!   it. The two writes are separate store calls, so readers tolerate a
//!   record without an entry and an entry without a record.
//! - Undecodable stored data is treated as absent and logged, never surfaced.
//! - Index order is insertion order; updates replace entries in place.

use crate::model::capsule::{new_capsule_id, Capsule, CapsuleId, CapsuleValidationError};
use crate::model::draft::DraftCapsule;
use crate::model::index::IndexEntry;
use crate::store::keys::{capsule_key, INDEX_KEY};
use crate::store::{KvStore, StoreError};
use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const EXPORT_FALLBACK_STEM: &str = "capsule";

pub type RepoResult<T> = Result<T, RepoError>;

/// Why an import document was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Text is not JSON.
    Parse(String),
    /// JSON document has a wrong field or breaks a capsule rule.
    Invalid(CapsuleValidationError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "import failed: invalid JSON: {message}"),
            Self::Invalid(err) => write!(f, "import failed: invalid capsule: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(_) => None,
            Self::Invalid(err) => Some(err),
        }
    }
}

/// Repository error for capsule persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CapsuleValidationError),
    Import(ImportError),
    NotFound(CapsuleId),
    Store(StoreError),
    Encode(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "capsule not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode(message) => write!(f, "failed to encode record: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::Encode(_) => None,
        }
    }
}

impl From<CapsuleValidationError> for RepoError {
    fn from(value: CapsuleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ImportError> for RepoError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value.to_string())
    }
}

/// Pretty-printed capsule document plus a suggested download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleExport {
    pub file_name: String,
    pub json: String,
}

/// Store-backed capsule repository.
pub struct CapsuleRepository<S: KvStore> {
    store: S,
}

impl<S: KvStore> CapsuleRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates or updates one capsule from a draft.
    ///
    /// # Contract
    /// - Text fields are trimmed and blank notes dropped before validation.
    /// - A draft without id gets a fresh one; a draft with id overwrites.
    /// - Returns the capsule exactly as stored.
    ///
    /// # Errors
    /// - `RepoError::Validation` on blank title or malformed quiz items.
    pub fn save(&self, draft: &DraftCapsule) -> RepoResult<Capsule> {
        let draft = draft.normalized();
        draft.validate_structure()?;

        let created = draft.id.is_none();
        let id = draft.id.clone().unwrap_or_else(new_capsule_id);
        let capsule = draft.into_capsule(id);
        self.write(&capsule)?;

        info!(
            "event=capsule_save module=repo status=ok id={} created={}",
            capsule.id, created
        );
        Ok(capsule)
    }

    /// Gets one capsule; missing or corrupt records read as `None`.
    pub fn get(&self, id: &str) -> RepoResult<Option<Capsule>> {
        let Some(raw) = self.store.get(&capsule_key(id))? else {
            return Ok(None);
        };

        match serde_json::from_str::<Capsule>(&raw) {
            Ok(mut capsule) => {
                capsule.id = id.to_string();
                Ok(Some(capsule))
            }
            Err(err) => {
                warn!(
                    "event=capsule_decode module=repo status=recovered id={} error={}",
                    id, err
                );
                Ok(None)
            }
        }
    }

    /// Removes one capsule record and its index entry.
    ///
    /// Progress stored for the capsule is left untouched.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when neither the record nor the entry existed.
    pub fn delete(&self, id: &str) -> RepoResult<()> {
        let removed_record = self.store.delete(&capsule_key(id))?;

        let mut index = self.load_index()?;
        let before = index.len();
        index.retain(|entry| entry.id != id);
        let removed_entry = index.len() != before;
        if removed_entry {
            self.save_index(&index)?;
        }

        if !removed_record && !removed_entry {
            return Err(RepoError::NotFound(id.to_string()));
        }

        info!(
            "event=capsule_delete module=repo status=ok id={} record={} entry={}",
            id, removed_record, removed_entry
        );
        Ok(())
    }

    /// Lists index entries in storage order.
    pub fn list(&self) -> RepoResult<Vec<IndexEntry>> {
        self.load_index()
    }

    /// Imports one capsule document under a fresh id.
    ///
    /// # Errors
    /// - `ImportError::Parse` when the text is not JSON.
    /// - `ImportError::Invalid` when the title is missing, a field has the
    ///   wrong type or value, or all study modes are empty.
    pub fn import_json(&self, text: &str) -> RepoResult<Capsule> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| ImportError::Parse(err.to_string()))?;

        let has_title = value
            .get("meta")
            .and_then(|meta| meta.get("title"))
            .and_then(Value::as_str)
            .is_some_and(|title| !title.is_empty());
        if !has_title {
            return Err(ImportError::Invalid(CapsuleValidationError::MissingTitle).into());
        }

        // Incoming ids are never read.
        let Value::Object(mut object) = value else {
            return Err(ImportError::Invalid(CapsuleValidationError::MissingTitle).into());
        };
        let draft = DraftCapsule {
            id: None,
            meta: decode_field(&mut object, "meta")?,
            notes: decode_list(&mut object, "notes")?,
            flashcards: decode_list(&mut object, "flashcards")?,
            quiz: decode_list(&mut object, "quiz")?,
        }
        .normalized();
        draft.validate_structure().map_err(ImportError::Invalid)?;
        if !draft.has_content() {
            return Err(ImportError::Invalid(CapsuleValidationError::EmptyContent).into());
        }

        let capsule = draft.into_capsule(new_capsule_id());
        self.write(&capsule)?;

        info!(
            "event=capsule_import module=repo status=ok id={} notes={} flashcards={} quiz={}",
            capsule.id,
            capsule.notes.len(),
            capsule.flashcards.len(),
            capsule.quiz.len()
        );
        Ok(capsule)
    }

    /// Exports one stored capsule as pretty-printed JSON.
    pub fn export_json(&self, id: &str) -> RepoResult<CapsuleExport> {
        let capsule = self
            .get(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        let json = serde_json::to_string_pretty(&capsule)?;
        Ok(CapsuleExport {
            file_name: export_file_name(&capsule.meta.title),
            json,
        })
    }

    fn write(&self, capsule: &Capsule) -> RepoResult<()> {
        let body = serde_json::to_string(capsule)?;
        self.store.set(&capsule_key(&capsule.id), &body)?;

        let entry = IndexEntry::for_capsule(capsule, Utc::now());
        let mut index = self.load_index()?;
        match index.iter_mut().find(|existing| existing.id == entry.id) {
            Some(slot) => *slot = entry,
            None => index.push(entry),
        }
        self.save_index(&index)
    }

    fn load_index(&self) -> RepoResult<Vec<IndexEntry>> {
        let Some(raw) = self.store.get(INDEX_KEY)? else {
            return Ok(Vec::new());
        };

        let values = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!(
                    "event=index_decode module=repo status=recovered reason=malformed_index error={}",
                    err
                );
                return Ok(Vec::new());
            }
        };

        let mut entries = Vec::with_capacity(values.len());
        for (position, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<IndexEntry>(value) {
                Ok(entry) if !entry.id.is_empty() => entries.push(entry),
                Ok(_) => warn!(
                    "event=index_decode module=repo status=recovered reason=empty_id position={}",
                    position
                ),
                Err(err) => warn!(
                    "event=index_decode module=repo status=recovered reason=malformed_entry position={} error={}",
                    position, err
                ),
            }
        }
        Ok(entries)
    }

    fn save_index(&self, index: &[IndexEntry]) -> RepoResult<()> {
        let body = serde_json::to_string(index)?;
        self.store.set(INDEX_KEY, &body)?;
        Ok(())
    }
}

fn malformed(field: &str, reason: impl Display) -> ImportError {
    ImportError::Invalid(CapsuleValidationError::Malformed(format!(
        "{field}: {reason}"
    )))
}

fn decode_field<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    field: &str,
) -> Result<T, ImportError> {
    let value = object.remove(field).unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| malformed(field, err))
}

/// Decodes a list field item by item so errors name the position.
/// Absent and `null` lists read as empty.
fn decode_list<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    field: &str,
) -> Result<Vec<T>, ImportError> {
    match object.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item)
                    .map_err(|err| malformed(&format!("{field}[{index}]"), err))
            })
            .collect(),
        Some(_) => Err(malformed(field, "expected a list")),
    }
}

/// Derives a download file name from a capsule title.
///
/// Whitespace runs become `_`; an empty title falls back to `capsule.json`.
pub fn export_file_name(title: &str) -> String {
    let trimmed = title.trim();
    let stem = if trimmed.is_empty() {
        EXPORT_FALLBACK_STEM.to_string()
    } else {
        WHITESPACE_RE.replace_all(trimmed, "_").into_owned()
    };
    format!("{stem}.json")
}
