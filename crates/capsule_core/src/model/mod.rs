//! Domain model for capsules, drafts, listing entries and progress.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the persisted JSON shape stable across save, import and export.
//!
//! # Invariants
//! - Every capsule is identified by a stable `CapsuleId`.
//! - Progress lives apart from capsule content and is keyed by the same id.

pub mod capsule;
pub mod draft;
pub mod index;
pub mod progress;
