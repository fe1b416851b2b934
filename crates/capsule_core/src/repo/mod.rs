//! Repository layer over the key-value store.
//!
//! # Responsibility
//! - Own every write to capsule, index and progress keys.
//! - Turn storage decode failures into safe defaults.
//!
//! # Invariants
//! - `CapsuleRepository` is the only writer of capsule and index keys.
//! - `ProgressTracker` is the only writer of progress keys.

pub mod capsule_repo;
pub mod progress_repo;
