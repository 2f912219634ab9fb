mod common;

use std::time::{Duration, Instant};

use axum::extract::ws::Message;
use common::live;
use live_scoreboard_back::state::{
    clock,
    game::{GameSnapshot, GameStatus},
    gate::BroadcastSettings,
    scoreboard::ScoreboardEngine,
    store::{MergeOutcome, ReconciliationStore},
    validator::{ReconcileThresholds, Rejection, Side},
};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

const STEP: Duration = Duration::from_millis(500);

fn engine() -> ScoreboardEngine {
    ScoreboardEngine::new(ReconcileThresholds::default(), BroadcastSettings::default())
}

fn received(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let Message::Text(text) = message {
            messages.push(serde_json::from_str(text.as_str()).expect("valid json"));
        }
    }
    messages
}

fn merge_all(store: &mut ReconciliationStore, steps: &[GameSnapshot]) {
    let now = Instant::now();
    for step in steps {
        store.merge(step.clone().normalized(), now);
    }
}

#[test]
fn supported_clock_formats_reduce_to_seconds() {
    let cases = [
        ("5:06", Some(306.0)),
        ("PT09M47.00S", Some(587.0)),
        ("12.3", Some(12.3)),
        ("0:00", Some(0.0)),
        ("", None),
        ("   ", None),
        ("halftime", None),
    ];
    for (raw, expected) in cases {
        let normalized = clock::normalize(Some(raw));
        let seconds = clock::to_seconds(normalized.as_deref());
        match (seconds, expected) {
            (Some(actual), Some(expected)) => {
                assert!((actual - expected).abs() < 1e-9, "{raw}: {actual} != {expected}")
            }
            (actual, expected) => assert_eq!(actual, expected, "{raw}"),
        }
    }
    assert_eq!(clock::normalize(None), None);
}

#[test]
fn steady_state_score_drop_is_rejected_and_state_kept() {
    let mut store = ReconciliationStore::default();
    merge_all(
        &mut store,
        &[
            live("g", 1, "12:00", 0, 0),
            live("g", 1, "11:30", 2, 0),
            live("g", 1, "11:00", 4, 0),
            live("g", 1, "10:30", 6, 0),
        ],
    );
    let before = store.get("g").expect("tracked").current().clone();
    assert_eq!(store.get("g").map(|s| s.update_count()), Some(4));

    let outcome = store.merge(live("g", 1, "10:20", 3, 0).normalized(), Instant::now());

    assert_eq!(
        outcome,
        MergeOutcome::Rejected(Rejection::ScoreRegression {
            side: Side::Home,
            from: 6,
            to: 3
        })
    );
    let after = store.get("g").expect("tracked");
    assert_eq!(after.current(), &before);
    assert_eq!(after.update_count(), 4);
}

#[test]
fn early_phase_score_drop_is_a_correction() {
    let mut store = ReconciliationStore::default();
    merge_all(
        &mut store,
        &[live("g", 1, "12:00", 0, 0), live("g", 1, "11:30", 6, 0)],
    );

    let outcome = store.merge(live("g", 1, "11:20", 3, 0).normalized(), Instant::now());

    assert_eq!(outcome, MergeOutcome::Updated);
    assert_eq!(store.get("g").map(|s| s.current().home.score), Some(3));
}

#[test]
fn oscillating_upstream_never_alternates_on_the_wire() {
    let mut engine = engine();
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine.subscribe(Uuid::new_v4(), tx);
    received(&mut rx);

    let a = live("g", 2, "5:00", 50, 48);
    let b = live("g", 2, "4:58", 52, 48);
    let start = Instant::now();
    let sequence = [&a, &b, &a, &b, &a, &b, &a, &b];
    for (i, snapshot) in sequence.iter().enumerate() {
        engine.maybe_broadcast(vec![(*snapshot).clone()], start + STEP * i as u32);
    }

    let home_scores: Vec<u64> = received(&mut rx)
        .iter()
        .map(|aggregate| aggregate[0]["home_team"]["score"].as_u64().expect("score"))
        .collect();
    // The flip-flop is accepted until history shows it; from then on A is held.
    assert_eq!(home_scores, vec![50, 52, 50]);
    assert_eq!(engine.store().get("g").map(|s| s.current().home.score), Some(50));
}

#[test]
fn period_advance_resets_the_clock_unconditionally() {
    let mut store = ReconciliationStore::default();
    merge_all(
        &mut store,
        &[
            live("g", 1, "0:30", 25, 22),
            live("g", 1, "0:20", 25, 22),
            live("g", 1, "0:10", 25, 22),
            live("g", 1, "0:02", 25, 22),
        ],
    );

    let outcome = store.merge(live("g", 2, "12:00", 25, 22).normalized(), Instant::now());

    assert_eq!(outcome, MergeOutcome::Updated);
    let current = store.get("g").expect("tracked").current();
    assert_eq!(current.period, 2);
    assert_eq!(current.clock.as_deref(), Some("PT12M00.00S"));
}

#[test]
fn games_missing_from_a_poll_are_retained() {
    let mut engine = engine();
    let start = Instant::now();
    let g = live("0022400001", 3, "2:00", 80, 77);
    let h = live("0022400002", 1, "9:00", 10, 12);

    engine.maybe_broadcast(vec![g.clone(), h.clone()], start);
    engine.maybe_broadcast(vec![live("0022400002", 1, "8:30", 12, 12)], start + STEP);

    let all = engine.store().snapshot_all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], g.normalized());
    assert_eq!(all[1].home.score, 12);
}

#[test]
fn changes_during_cooldown_are_emitted_once_cooldown_elapses() {
    let mut engine = engine();
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine.subscribe(Uuid::new_v4(), tx);
    received(&mut rx);

    let start = Instant::now();
    assert!(engine.maybe_broadcast(vec![live("g", 1, "10:00", 0, 0)], start));
    assert!(!engine.maybe_broadcast(
        vec![live("g", 1, "9:50", 2, 0)],
        start + Duration::from_millis(50)
    ));
    assert_eq!(received(&mut rx).len(), 1);

    // Same upstream data on the next cycle: the pending change goes out now.
    assert!(engine.maybe_broadcast(
        vec![live("g", 1, "9:50", 2, 0)],
        start + Duration::from_millis(250)
    ));
    let messages = received(&mut rx);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0][0]["home_team"]["score"], 2);
}

#[test]
fn final_games_stay_final() {
    let mut store = ReconciliationStore::default();
    let mut finished = live("g", 4, "0:00", 101, 99);
    finished.status = GameStatus::Final;
    finished.clock = None;
    merge_all(&mut store, &[live("g", 4, "0:05", 101, 99), finished]);

    let outcome = store.merge(live("g", 4, "0:05", 101, 99).normalized(), Instant::now());

    assert_eq!(
        outcome,
        MergeOutcome::Rejected(Rejection::ReopenedFinal {
            to: GameStatus::InProgress
        })
    );
    assert_eq!(
        store.get("g").map(|s| s.current().status),
        Some(GameStatus::Final)
    );
}
