use capsule_core::{
    Capsule, CapsuleMeta, Flashcard, FlashcardSession, MemoryStore, ProgressTracker,
};

fn deck(cards: usize) -> Capsule {
    Capsule {
        id: "deck".to_string(),
        meta: CapsuleMeta {
            title: "Deck".to_string(),
            ..CapsuleMeta::default()
        },
        notes: Vec::new(),
        flashcards: (0..cards)
            .map(|i| Flashcard {
                front: format!("Q{i}"),
                back: format!("A{i}"),
            })
            .collect(),
        quiz: Vec::new(),
    }
}

#[test]
fn cursor_clamps_at_both_ends() {
    let mut session = FlashcardSession::start(&deck(3)).unwrap();
    assert_eq!(session.prev(), 0);
    assert_eq!(session.position_label(), "1 / 3");

    assert_eq!(session.next(), 1);
    assert_eq!(session.next(), 2);
    assert_eq!(session.next(), 2);
    assert_eq!(session.current().back, "A2");
    assert_eq!(session.prev(), 1);
}

#[test]
fn single_card_deck_never_moves() {
    let mut session = FlashcardSession::start(&deck(1)).unwrap();
    assert_eq!(session.next(), 0);
    assert_eq!(session.prev(), 0);
    assert_eq!(session.total(), 1);
}

#[test]
fn marks_apply_to_the_card_under_the_cursor() {
    let store = MemoryStore::new();
    let tracker = ProgressTracker::new(&store);
    let mut session = FlashcardSession::start(&deck(3)).unwrap();

    session.next();
    session.next();
    session.mark_known(&tracker).unwrap();
    assert!(session.is_known(&tracker));

    session.prev();
    assert!(!session.is_known(&tracker));
    session.mark_unknown(&tracker).unwrap();

    let progress = tracker.load("deck");
    assert!(progress.is_known(2));
    assert_eq!(progress.known_count(), 1);
}

#[test]
fn known_state_is_read_fresh_from_the_tracker() {
    let store = MemoryStore::new();
    let tracker = ProgressTracker::new(&store);
    let session = FlashcardSession::start(&deck(2)).unwrap();

    session.mark_known(&tracker).unwrap();
    assert!(session.is_known(&tracker));

    tracker.mark_unknown("deck", 0).unwrap();
    assert!(!session.is_known(&tracker));
}

#[test]
fn flip_is_presentation_only() {
    let store = MemoryStore::new();
    let tracker = ProgressTracker::new(&store);
    let mut session = FlashcardSession::start(&deck(2)).unwrap();

    assert!(session.flip());
    assert!(store.is_empty());
    assert!(!session.flip());
    assert_eq!(tracker.load("deck").known_count(), 0);
}
