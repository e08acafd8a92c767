//! Session controller integration tests
//!
//! Drives whole sessions through scripted recognizers and a recording
//! announcer, so no audio hardware or network is needed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use wishlist_kiosk::session::{
    HEARING_FAILURE, ITEM_NOT_UNDERSTOOD, SPEAKER_NOT_RECOGNIZED, WAKE_PROMPT,
};
use wishlist_kiosk::{
    Confidence, IgnoreReason, SessionOutcome, SessionPhase, Stage, Timing, WakeOutcome,
    WishlistEntry,
};

mod common;

use common::{
    ADMIN, BOB, RecordingAnnouncer, ScriptedRecognizer, engine_failure, harness,
    harness_with_announcer, harness_with_timing, heard, heard_with, mumbled, ready_harness,
};

/// Time from `start` to `at`, in whole milliseconds
fn ms(start: Instant, at: Instant) -> u128 {
    at.duration_since(start).as_millis()
}

#[tokio::test]
async fn test_known_speaker_adds_item() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard(BOB)]),
        ScriptedRecognizer::new("item", [heard("a bike")]),
    )
    .await;

    let outcome = h.controller.on_wake().await;

    assert_eq!(
        outcome,
        WakeOutcome::Completed(SessionOutcome::ItemAdded(WishlistEntry::new(BOB, "a bike")))
    );
    assert_eq!(
        h.announcer.spoken(),
        vec![
            WAKE_PROMPT.to_string(),
            "Hello Bob.\nWhat would you like for Christmas?".to_string(),
            "a bike.\nGot it. I have added it to your Christmas list, Bob.".to_string(),
        ]
    );

    let wishlist = h.controller.wishlist();
    assert_eq!(wishlist.all(), &[WishlistEntry::new(BOB, "a bike")]);
    assert!(!h.controller.is_session_active());
    assert_eq!(h.controller.phase(), SessionPhase::Idle);
    assert_eq!(h.controller.requestor(), None);
}

#[tokio::test]
async fn test_administrator_hears_empty_list() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard(ADMIN)]),
        ScriptedRecognizer::new("item", []),
    )
    .await;

    let outcome = h.controller.on_wake().await;

    assert_eq!(
        outcome,
        WakeOutcome::Completed(SessionOutcome::ListReviewed { entries: 0 })
    );
    assert_eq!(
        h.announcer.spoken(),
        vec![WAKE_PROMPT.to_string(), "Hello Admin.\nThe list is empty.".to_string()]
    );
    assert_eq!(h.items.listens(), 0);
}

#[tokio::test]
async fn test_administrator_review_reads_entries_in_order() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard(BOB), heard(BOB), heard(ADMIN)]),
        ScriptedRecognizer::new("item", [heard("a bike"), heard("a kite")]),
    )
    .await;

    h.controller.on_wake().await;
    h.controller.on_wake().await;
    h.announcer.clear();

    let outcome = h.controller.on_wake().await;

    assert_eq!(
        outcome,
        WakeOutcome::Completed(SessionOutcome::ListReviewed { entries: 2 })
    );
    assert_eq!(
        h.announcer.spoken(),
        vec![
            WAKE_PROMPT.to_string(),
            "Hello Admin.\nHere is the list.".to_string(),
            "Bob wants a bike".to_string(),
            "Bob wants a kite".to_string(),
        ]
    );
    // Review never modifies the list
    assert_eq!(h.controller.wishlist().len(), 2);
}

#[tokio::test]
async fn test_low_confidence_name_is_not_recognized() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [mumbled(BOB)]),
        ScriptedRecognizer::new("item", [heard("a bike")]),
    )
    .await;

    let outcome = h.controller.on_wake().await;

    assert_eq!(
        outcome,
        WakeOutcome::Completed(SessionOutcome::SpeakerNotRecognized)
    );
    assert_eq!(
        h.announcer.spoken(),
        vec![WAKE_PROMPT.to_string(), SPEAKER_NOT_RECOGNIZED.to_string()]
    );
    assert_eq!(h.items.listens(), 0);
    assert!(h.controller.wishlist().is_empty());
    assert!(!h.controller.is_session_active());
}

#[tokio::test]
async fn test_name_outside_roster_is_not_recognized() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard("Mallory"), heard("bob")]),
        ScriptedRecognizer::new("item", []),
    )
    .await;

    for _ in 0..2 {
        assert_eq!(
            h.controller.on_wake().await,
            WakeOutcome::Completed(SessionOutcome::SpeakerNotRecognized)
        );
    }
    assert_eq!(h.items.listens(), 0);
}

#[tokio::test]
async fn test_unclear_item_is_not_added() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard(BOB)]),
        ScriptedRecognizer::new("item", [mumbled("a b")]),
    )
    .await;

    let outcome = h.controller.on_wake().await;

    assert_eq!(
        outcome,
        WakeOutcome::Completed(SessionOutcome::ItemNotUnderstood {
            requestor: BOB.to_string()
        })
    );
    assert_eq!(h.announcer.spoken().last().map(String::as_str), Some(ITEM_NOT_UNDERSTOOD));
    assert!(h.controller.wishlist().is_empty());
}

#[tokio::test]
async fn test_engine_failure_at_name_stage_recovers() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [engine_failure(), heard(BOB)]),
        ScriptedRecognizer::new("item", [heard("a bike")]),
    )
    .await;

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::EngineFailure { stage: Stage::Name })
    );
    assert_eq!(h.announcer.spoken().last().map(String::as_str), Some(HEARING_FAILURE));
    assert!(!h.controller.is_session_active());

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::ItemAdded(WishlistEntry::new(BOB, "a bike")))
    );
}

#[tokio::test]
async fn test_engine_failure_at_item_stage_recovers() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard(BOB), heard(BOB)]),
        ScriptedRecognizer::new("item", [engine_failure(), heard("a kite")]),
    )
    .await;

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::EngineFailure { stage: Stage::Item })
    );
    assert_eq!(h.announcer.spoken().last().map(String::as_str), Some(HEARING_FAILURE));
    assert!(h.controller.wishlist().is_empty());
    assert!(!h.controller.is_session_active());

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::ItemAdded(WishlistEntry::new(BOB, "a kite")))
    );
}

#[tokio::test]
async fn test_wake_during_session_is_ignored() {
    let gate = Arc::new(Notify::new());
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard(BOB)]).gated(Arc::clone(&gate)),
        ScriptedRecognizer::new("item", [heard("a bike")]),
    )
    .await;
    let started = h.names.started();

    let controller = Arc::clone(&h.controller);
    let first = tokio::spawn(async move { controller.on_wake().await });

    started.notified().await;
    assert!(h.controller.is_session_active());
    assert_eq!(h.controller.phase(), SessionPhase::AwaitingName);

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Ignored(IgnoreReason::Busy)
    );
    assert_eq!(h.names.listens(), 1);

    gate.notify_one();
    let outcome = first.await.unwrap();

    assert_eq!(
        outcome,
        WakeOutcome::Completed(SessionOutcome::ItemAdded(WishlistEntry::new(BOB, "a bike")))
    );
    assert_eq!(h.controller.wishlist().len(), 1);
    // The dropped wake never spoke
    assert_eq!(
        h.announcer.spoken().iter().filter(|s| *s == WAKE_PROMPT).count(),
        1
    );
}

#[tokio::test]
async fn test_sessions_append_in_order() {
    let items = ["a bike", "a kite", "a book", "a drum"];
    let h = ready_harness(
        ScriptedRecognizer::new("name", items.iter().map(|_| heard(BOB))),
        ScriptedRecognizer::new("item", items.iter().map(|item| heard(item))),
    )
    .await;

    for _ in items {
        h.controller.on_wake().await;
    }

    let wishlist = h.controller.wishlist();
    let recorded: Vec<&str> = wishlist.all().iter().map(WishlistEntry::item).collect();
    assert_eq!(recorded, items);
    assert!(wishlist.all().iter().all(|entry| entry.requestor() == BOB));
}

#[tokio::test]
async fn test_wakes_ignored_until_prepared() {
    let h = harness(
        ScriptedRecognizer::new("name", [heard(BOB)]),
        ScriptedRecognizer::new("item", [heard("a bike")]),
    );

    assert!(!h.controller.is_ready());
    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Ignored(IgnoreReason::NotReady)
    );
    assert!(h.announcer.spoken().is_empty());
    assert_eq!(h.names.listens(), 0);
}

#[tokio::test]
async fn test_failed_item_constraints_keep_kiosk_not_ready() {
    let h = harness(
        ScriptedRecognizer::new("name", [heard(BOB)]),
        ScriptedRecognizer::new("item", []).failing_configure(),
    );

    let err = h.controller.prepare().await.unwrap_err();
    assert!(matches!(
        err,
        wishlist_kiosk::Error::ConstraintCompilation { recognizer: "item", .. }
    ));
    assert!(!h.controller.is_ready());
    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Ignored(IgnoreReason::NotReady)
    );
}

#[tokio::test]
async fn test_speak_failure_does_not_abort_session() {
    let h = harness_with_announcer(
        ScriptedRecognizer::new("name", [heard(BOB)]),
        ScriptedRecognizer::new("item", [heard("a bike")]),
        RecordingAnnouncer::failing(),
    );
    h.controller.prepare().await.unwrap();

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::ItemAdded(WishlistEntry::new(BOB, "a bike")))
    );
    assert_eq!(h.announcer.spoken().len(), 3);
}

#[tokio::test]
async fn test_medium_confidence_name_is_accepted() {
    let h = ready_harness(
        ScriptedRecognizer::new("name", [heard_with(BOB, Confidence::Medium)]),
        ScriptedRecognizer::new("item", [heard_with("Lego set", Confidence::High)]),
    )
    .await;

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::ItemAdded(WishlistEntry::new(BOB, "Lego set")))
    );
    assert_eq!(h.controller.wishlist().all(), &[WishlistEntry::new(BOB, "Lego set")]);
}

#[tokio::test]
async fn test_untrusted_confidence_grades_end_the_session() {
    let h = ready_harness(
        ScriptedRecognizer::new(
            "name",
            [
                heard_with(BOB, Confidence::Low),
                heard_with(ADMIN, Confidence::Rejected),
                heard_with(BOB, Confidence::High),
            ],
        ),
        ScriptedRecognizer::new("item", [heard_with("a bike", Confidence::Rejected)]),
    )
    .await;

    for _ in 0..2 {
        assert_eq!(
            h.controller.on_wake().await,
            WakeOutcome::Completed(SessionOutcome::SpeakerNotRecognized)
        );
    }
    assert_eq!(h.items.listens(), 0);

    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::ItemNotUnderstood {
            requestor: BOB.to_string()
        })
    );
    assert!(h.controller.wishlist().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_item_session_waits_before_each_listen() {
    let h = harness_with_timing(
        ScriptedRecognizer::new("name", [heard(BOB)]),
        ScriptedRecognizer::new("item", [heard("a bike")]),
        Timing::default(),
    );
    h.controller.prepare().await.unwrap();

    let start = Instant::now();
    h.controller.on_wake().await;

    let spoken = h.announcer.spoken_at();
    let name_listen = h.names.listened_at()[0];
    let item_listen = h.items.listened_at()[0];

    // wake delay, then the prompt
    assert_eq!(spoken[0].1, WAKE_PROMPT);
    assert!(ms(start, spoken[0].0) >= 2000);

    // settle delay between each prompt and its listen
    assert!(name_listen.duration_since(spoken[0].0) >= Duration::from_secs(2));
    assert!(spoken[1].0 >= name_listen);
    assert!(item_listen.duration_since(spoken[1].0) >= Duration::from_secs(2));
    assert!(spoken[2].0 >= item_listen);

    assert!(ms(start, item_listen) < 6100);
}

#[tokio::test(start_paused = true)]
async fn test_review_paces_each_entry() {
    let h = harness_with_timing(
        ScriptedRecognizer::new("name", [heard(BOB), heard(BOB), heard(ADMIN)]),
        ScriptedRecognizer::new("item", [heard("a bike"), heard("a kite")]),
        Timing::default(),
    );
    h.controller.prepare().await.unwrap();

    h.controller.on_wake().await;
    h.controller.on_wake().await;
    h.announcer.clear();

    let start = Instant::now();
    assert_eq!(
        h.controller.on_wake().await,
        WakeOutcome::Completed(SessionOutcome::ListReviewed { entries: 2 })
    );

    let spoken = h.announcer.spoken_at();
    let texts: Vec<&str> = spoken.iter().map(|(_, text)| text.as_str()).collect();
    assert_eq!(
        texts,
        [
            WAKE_PROMPT,
            "Hello Admin.\nHere is the list.",
            "Bob wants a bike",
            "Bob wants a kite",
        ]
    );

    let intro = spoken[1].0;
    assert!(ms(start, intro) >= 4000);
    assert!(spoken[2].0.duration_since(intro) >= Duration::from_secs(4));
    assert!(spoken[3].0.duration_since(spoken[2].0) >= Duration::from_secs(4));
}
