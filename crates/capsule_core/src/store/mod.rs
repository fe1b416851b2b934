//! Key-value persistence abstraction.
//!
//! # Responsibility
//! - Define the synchronous `get/set/delete` contract the repository and
//!   progress tracker write through.
//! - Own the persisted key layout.
//!
//! # Invariants
//! - Values are opaque text; stores never parse them, so malformed content
//!   can never make `get` fail.
//! - Calls are serialized by the single-threaded host; stores do no locking.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod keys;
mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport failure from a store backend.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "store backend failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string key-value storage.
pub trait KvStore {
    /// Returns the stored value, or `None` when the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Inserts or overwrites one value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes one value. Returns whether the key existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }
}
