use std::time::Instant;

use axum::extract::ws::Message;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::scoreboard::aggregate_json,
    state::{
        game::GameSnapshot,
        gate::{BroadcastGate, BroadcastSettings},
        registry::SubscriberRegistry,
        store::{MergeOutcome, ReconciliationStore},
        validator::ReconcileThresholds,
    },
};

/// Reconciliation store, broadcast gate and aggregate subscribers, mutated together.
#[derive(Debug, Default)]
pub struct ScoreboardEngine {
    store: ReconciliationStore,
    gate: BroadcastGate,
    subscribers: SubscriberRegistry,
}

impl ScoreboardEngine {
    /// Fresh engine with no games and no subscribers.
    pub fn new(thresholds: ReconcileThresholds, settings: BroadcastSettings) -> Self {
        Self {
            store: ReconciliationStore::new(thresholds),
            gate: BroadcastGate::new(settings),
            subscribers: SubscriberRegistry::default(),
        }
    }

    /// Merge a poll batch and emit the aggregate when it changed and the cooldown allows it.
    ///
    /// Returns whether an emission happened. A suppressed change stays pending: the next call
    /// compares against the last emitted aggregate again and picks it up.
    pub fn maybe_broadcast(&mut self, candidates: Vec<GameSnapshot>, now: Instant) -> bool {
        let mut rejected = 0usize;
        for candidate in candidates {
            if let MergeOutcome::Rejected(_) = self.store.merge(candidate.normalized(), now) {
                rejected += 1;
            }
        }

        let aggregate = self.store.snapshot_all();
        if !self.gate.has_meaningful_change(&aggregate) {
            return false;
        }
        if !self.gate.cooldown_elapsed(now) {
            debug!(rejected, "aggregate changed during cooldown; deferring broadcast");
            return false;
        }

        let payload = match aggregate_json(&aggregate) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize scoreboard aggregate");
                return false;
            }
        };
        let games = aggregate.len();
        self.gate.record(aggregate, now);

        let pruned = self.subscribers.fan_out(&Message::Text(payload.into()));
        for id in &pruned {
            info!(connection = %id, "scoreboard subscriber gone; pruned");
        }
        debug!(
            games,
            rejected,
            subscribers = self.subscribers.len(),
            "scoreboard broadcast"
        );
        true
    }

    /// Register a subscriber and queue the current aggregate as its first message.
    ///
    /// Returns `false` (and registers nothing) when the connection is already closed.
    pub fn subscribe(&mut self, id: Uuid, tx: mpsc::UnboundedSender<Message>) -> bool {
        let payload = match aggregate_json(&self.store.snapshot_all()) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize scoreboard aggregate");
                return false;
            }
        };
        if tx.send(Message::Text(payload.into())).is_err() {
            return false;
        }
        self.subscribers.insert(id, tx);
        true
    }

    /// Remove a subscriber; returns whether it was still registered.
    pub fn unsubscribe(&mut self, id: &Uuid) -> bool {
        self.subscribers.remove(id)
    }

    /// Read access to the accepted states.
    pub fn store(&self) -> &ReconciliationStore {
        &self.store
    }

    /// Aggregate as last emitted to subscribers.
    pub fn last_broadcast(&self) -> &[GameSnapshot] {
        self.gate.last_sent()
    }

    /// Number of registered aggregate subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Shared handle serializing the poll cycle against subscriber registration.
///
/// The lock only covers map mutation, serialization and queueing onto writer channels; network
/// writes happen in each connection's writer task.
pub struct ScoreboardHub {
    engine: Mutex<ScoreboardEngine>,
}

impl ScoreboardHub {
    /// Wrap a fresh engine.
    pub fn new(thresholds: ReconcileThresholds, settings: BroadcastSettings) -> Self {
        Self {
            engine: Mutex::new(ScoreboardEngine::new(thresholds, settings)),
        }
    }

    /// Feed one poll batch through the engine.
    pub async fn maybe_broadcast(&self, candidates: Vec<GameSnapshot>) -> bool {
        let mut engine = self.engine.lock().await;
        engine.maybe_broadcast(candidates, Instant::now())
    }

    /// Register an aggregate subscriber and send it the current aggregate.
    pub async fn subscribe(&self, id: Uuid, tx: mpsc::UnboundedSender<Message>) -> bool {
        let mut engine = self.engine.lock().await;
        engine.subscribe(id, tx)
    }

    /// Drop an aggregate subscriber.
    pub async fn unsubscribe(&self, id: &Uuid) -> bool {
        let mut engine = self.engine.lock().await;
        engine.unsubscribe(id)
    }

    /// Current accepted snapshot of every known game.
    pub async fn snapshot(&self) -> Vec<GameSnapshot> {
        let engine = self.engine.lock().await;
        engine.store().snapshot_all()
    }

    /// Number of registered aggregate subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.engine.lock().await.subscriber_count()
    }
}
