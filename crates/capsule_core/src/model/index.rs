//! Library index entry model.
//!
//! # Invariants
//! - Exactly one entry per stored capsule; `id` is the join key.
//! - `updated_at` is refreshed on every capsule save.

use crate::model::capsule::{Capsule, CapsuleId, Level};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lightweight listing projection of one capsule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: CapsuleId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: Level,
    pub updated_at: DateTime<Utc>,
}

impl IndexEntry {
    /// Derives an entry from capsule meta, stamped with `updated_at`.
    pub fn for_capsule(capsule: &Capsule, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: capsule.id.clone(),
            title: capsule.meta.title.clone(),
            subject: capsule.meta.subject.clone(),
            level: capsule.meta.level,
            updated_at,
        }
    }
}
