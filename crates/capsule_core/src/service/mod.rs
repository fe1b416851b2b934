//! Core use-case services and study session state machines.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod flashcard_session;
pub mod notes_view;
pub mod quiz_session;
pub mod study_service;
