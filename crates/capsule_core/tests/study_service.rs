use capsule_core::db::open_db_in_memory;
use capsule_core::{
    DraftCapsule, MemoryStore, QuizState, RepoError, SqliteStore, StudyError, StudyService,
};

fn authored_draft(title: &str) -> DraftCapsule {
    let mut draft = DraftCapsule::new();
    draft.meta.title = title.to_string();
    draft.set_notes_from_text("Closures capture\nIterators are lazy\nclosures can move");

    let card = draft.add_flashcard();
    draft.flashcards[card].front = "Fn vs FnMut?".to_string();
    draft.flashcards[card].back = "FnMut may mutate captures".to_string();
    let card = draft.add_flashcard();
    draft.flashcards[card].front = "collect()?".to_string();
    draft.flashcards[card].back = "Consumes an iterator".to_string();

    for correct in [2, 0] {
        let item = draft.add_quiz_item();
        draft.quiz[item].question = format!("Pick {correct}");
        for (position, choice) in draft.quiz[item].choices.iter_mut().enumerate() {
            *choice = format!("choice {position}");
        }
        draft.quiz[item].correct = correct;
    }
    draft
}

#[test]
fn list_tracks_live_capsules_through_save_and_delete() {
    let service = StudyService::new(MemoryStore::new());
    let a = service.save_capsule(&authored_draft("A")).unwrap();
    let b = service.save_capsule(&authored_draft("B")).unwrap();
    service.save_capsule(&authored_draft("C")).unwrap();
    assert_eq!(service.list_capsules().unwrap().len(), 3);

    service.delete_capsule(&b.id).unwrap();
    let listed = service.list_capsules().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|entry| entry.id != b.id));
    assert!(service.get_capsule(&b.id).unwrap().is_none());
    assert!(service.get_capsule(&a.id).unwrap().is_some());
}

#[test]
fn edit_draft_roundtrips_through_save() {
    let service = StudyService::new(MemoryStore::new());
    let saved = service.save_capsule(&authored_draft("Iterators")).unwrap();

    let mut draft = service.edit_draft(&saved.id).unwrap();
    assert_eq!(draft.id.as_deref(), Some(saved.id.as_str()));
    draft.remove_flashcard_at(0);
    draft.remove_quiz_item_at(1);
    let updated = service.save_capsule(&draft).unwrap();

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.flashcards.len(), 1);
    assert_eq!(updated.quiz.len(), 1);
    assert_eq!(service.list_capsules().unwrap().len(), 1);
}

#[test]
fn library_joins_progress_and_keeps_orphaned_progress_after_delete() {
    let service = StudyService::new(MemoryStore::new());
    let saved = service.save_capsule(&authored_draft("Closures")).unwrap();

    service.mark_flashcard_known(&saved.id, 1).unwrap();
    let mut quiz = service.start_quiz(&saved.id).unwrap();
    service.submit_quiz_answer(&mut quiz, 2).unwrap();
    service.advance_quiz(&mut quiz).unwrap();
    service.submit_quiz_answer(&mut quiz, 0).unwrap();
    let state = service.advance_quiz(&mut quiz).unwrap();
    assert_eq!(state, QuizState::Finished { final_score: 100 });

    let library = service.library().unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].best_score, 100);
    assert_eq!(library[0].known_count, 1);

    service.delete_capsule(&saved.id).unwrap();
    assert!(service.library().unwrap().is_empty());
    assert_eq!(service.get_progress(&saved.id).best_score, 100);
}

#[test]
fn flashcard_marks_validate_the_index() {
    let service = StudyService::new(MemoryStore::new());
    let saved = service.save_capsule(&authored_draft("Cards")).unwrap();

    let err = service.mark_flashcard_known(&saved.id, 7).unwrap_err();
    assert!(matches!(
        err,
        StudyError::FlashcardOutOfRange {
            index: 7,
            total: 2,
            ..
        }
    ));

    let err = service.mark_flashcard_unknown("missing", 0).unwrap_err();
    assert!(matches!(err, StudyError::Repo(RepoError::NotFound(_))));

    service.mark_flashcard_known(&saved.id, 0).unwrap();
    let progress = service.mark_flashcard_unknown(&saved.id, 0).unwrap();
    assert_eq!(progress.known_count(), 0);
}

#[test]
fn flashcard_session_through_service() {
    let service = StudyService::new(MemoryStore::new());
    let saved = service.save_capsule(&authored_draft("Session")).unwrap();

    let mut session = service.start_flashcards(&saved.id).unwrap();
    session.next();
    service.mark_current_known(&session).unwrap();
    assert!(service.is_current_known(&session));
    session.prev();
    assert!(!service.is_current_known(&session));
    service.mark_current_unknown(&session).unwrap();
    assert_eq!(service.get_progress(&saved.id).known_count(), 1);
}

#[test]
fn empty_modes_are_reported_before_sessions_start() {
    let service = StudyService::new(MemoryStore::new());
    let mut draft = DraftCapsule::new();
    draft.meta.title = "Notes only".to_string();
    draft.set_notes_from_text("just a note");
    let saved = service.save_capsule(&draft).unwrap();

    assert!(matches!(
        service.start_quiz(&saved.id),
        Err(StudyError::Quiz(_))
    ));
    assert!(matches!(
        service.start_flashcards(&saved.id),
        Err(StudyError::Flashcard(_))
    ));
    assert!(matches!(
        service.start_quiz("missing"),
        Err(StudyError::Repo(RepoError::NotFound(_)))
    ));
}

#[test]
fn search_notes_filters_case_insensitively() {
    let service = StudyService::new(MemoryStore::new());
    let saved = service.save_capsule(&authored_draft("Search")).unwrap();

    let hits = service.search_notes(&saved.id, "closures").unwrap();
    assert_eq!(hits, vec!["Closures capture", "closures can move"]);
}

#[test]
fn quiz_retry_and_restart_through_service_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let service = StudyService::new(SqliteStore::new(&conn));
    let saved = service.save_capsule(&authored_draft("Sqlite")).unwrap();

    let mut quiz = service.start_quiz(&saved.id).unwrap();
    let feedback = service.submit_quiz_answer(&mut quiz, 1).unwrap();
    assert!(!feedback.was_correct);
    assert_eq!(feedback.correct_index, 2);
    service.retry_quiz_question(&mut quiz).unwrap();
    service.submit_quiz_answer(&mut quiz, 2).unwrap();
    service.advance_quiz(&mut quiz).unwrap();
    service.submit_quiz_answer(&mut quiz, 0).unwrap();
    assert_eq!(
        service.advance_quiz(&mut quiz).unwrap(),
        QuizState::Finished { final_score: 95 }
    );

    service.restart_quiz(&mut quiz).unwrap();
    assert_eq!(
        quiz.state(),
        QuizState::AwaitingAnswer { question_index: 0 }
    );
    assert_eq!(service.get_progress(&saved.id).best_score, 95);

    let export = service.export_capsule(&saved.id).unwrap();
    assert_eq!(export.file_name, "Sqlite.json");
    let copy = service.import_capsule(&export.json).unwrap();
    assert_ne!(copy.id, saved.id);
    assert_eq!(service.list_capsules().unwrap().len(), 2);
}
