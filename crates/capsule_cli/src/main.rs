//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `capsule_core` linkage without the Flutter/FFI runtime.
//! - Run one in-memory save/list/quiz round trip with deterministic output.

use capsule_core::{DraftCapsule, MemoryStore, StudyError, StudyService};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("capsule_core ping={}", capsule_core::ping());
    println!("capsule_core version={}", capsule_core::core_version());

    match round_trip() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("capsule_core round_trip=error message={err}");
            ExitCode::FAILURE
        }
    }
}

fn round_trip() -> Result<(), StudyError> {
    let service = StudyService::new(MemoryStore::new());

    let mut draft = DraftCapsule::new();
    draft.meta.title = "Smoke".to_string();
    let item = draft.add_quiz_item();
    draft.quiz[item].question = "1 + 1".to_string();
    draft.quiz[item].choices = ["1", "2", "3", "4"].map(String::from).to_vec();
    draft.quiz[item].correct = 1;

    let capsule = service.save_capsule(&draft)?;
    println!("capsule_core capsules={}", service.list_capsules()?.len());

    let mut quiz = service.start_quiz(&capsule.id)?;
    service.submit_quiz_answer(&mut quiz, 1)?;
    service.advance_quiz(&mut quiz)?;
    println!(
        "capsule_core best_score={}",
        service.get_progress(&capsule.id).best_score
    );
    Ok(())
}
