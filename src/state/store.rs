use std::time::Instant;

use indexmap::IndexMap;
use tracing::debug;

use crate::state::{
    game::{AcceptedGameState, GameSnapshot},
    validator::{self, ReconcileThresholds, Rejection, Verdict},
};

/// Result of merging one candidate into the store.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// First time this game was seen.
    Inserted,
    /// The candidate replaced the accepted state.
    Updated,
    /// The candidate is identical to the accepted state.
    Unchanged,
    /// The validator held the candidate back; the accepted state is retained.
    Rejected(Rejection),
}

/// Per-game accepted state, kept for the whole process lifetime.
///
/// Games are never removed: a game missing from a poll response keeps its last accepted state,
/// since upstream omission is not treated as deletion. Iteration follows first-seen order.
#[derive(Debug, Default)]
pub struct ReconciliationStore {
    games: IndexMap<String, AcceptedGameState>,
    thresholds: ReconcileThresholds,
}

impl ReconciliationStore {
    /// Empty store using the provided validator thresholds.
    pub fn new(thresholds: ReconcileThresholds) -> Self {
        Self {
            games: IndexMap::new(),
            thresholds,
        }
    }

    /// Validate `candidate` against the accepted state and apply it when acceptable.
    pub fn merge(&mut self, candidate: GameSnapshot, now: Instant) -> MergeOutcome {
        let Some(accepted) = self.games.get_mut(&candidate.game_id) else {
            let state =
                AcceptedGameState::new(candidate.clone(), self.thresholds.history_capacity, now);
            self.games.insert(candidate.game_id, state);
            return MergeOutcome::Inserted;
        };

        if accepted.current() == &candidate {
            return MergeOutcome::Unchanged;
        }

        match validator::evaluate(Some(&*accepted), &candidate, &self.thresholds) {
            Verdict::Accept => {
                accepted.replace(candidate, now);
                MergeOutcome::Updated
            }
            Verdict::Reject(rejection) => {
                debug!(
                    game_id = %candidate.game_id,
                    reason = %rejection,
                    "holding accepted state; candidate rejected"
                );
                MergeOutcome::Rejected(rejection)
            }
        }
    }

    /// Accepted state for one game.
    pub fn get(&self, game_id: &str) -> Option<&AcceptedGameState> {
        self.games.get(game_id)
    }

    /// Current accepted snapshot of every known game, in first-seen order.
    pub fn snapshot_all(&self) -> Vec<GameSnapshot> {
        self.games
            .values()
            .map(|state| state.current().clone())
            .collect()
    }

    /// Number of tracked games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no game has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
