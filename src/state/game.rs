use std::{collections::VecDeque, time::Instant};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::clock;

/// Lifecycle stage reported by the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum GameStatus {
    /// Tip-off has not happened yet.
    Scheduled,
    /// The game is being played.
    InProgress,
    /// The game is over.
    Final,
}

impl GameStatus {
    /// Map an upstream status code, clamping out-of-range values to the nearest valid status.
    pub fn from_code(code: i64) -> Self {
        match code {
            i64::MIN..=1 => Self::Scheduled,
            2 => Self::InProgress,
            _ => Self::Final,
        }
    }

    /// Numeric code used on the wire (1, 2 or 3).
    pub fn code(self) -> u8 {
        match self {
            Self::Scheduled => 1,
            Self::InProgress => 2,
            Self::Final => 3,
        }
    }
}

impl From<GameStatus> for u8 {
    fn from(value: GameStatus) -> Self {
        value.code()
    }
}

impl From<u8> for GameStatus {
    fn from(value: u8) -> Self {
        Self::from_code(i64::from(value))
    }
}

/// Team identity plus the score it currently holds in one game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamScore {
    pub team_id: String,
    pub team_name: String,
    pub team_city: String,
    pub team_tricode: String,
    pub score: u32,
}

/// Descriptive venue information; immutable once the game exists upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Venue {
    pub arena: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// One upstream-reported state of a single game at a point in time.
///
/// Snapshots are plain values: a fresh one is built on every poll and the reconciliation store
/// replaces its stored copy wholesale instead of patching fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub game_id: String,
    pub status: GameStatus,
    pub period: u32,
    /// Time left in the period. Canonical once the snapshot went through [`Self::normalized`].
    pub clock: Option<String>,
    pub home: TeamScore,
    pub away: TeamScore,
    pub scheduled_time: Option<OffsetDateTime>,
    pub venue: Option<Venue>,
}

impl GameSnapshot {
    /// Return the same snapshot with its clock rewritten into canonical form.
    pub fn normalized(mut self) -> Self {
        self.clock = clock::normalize(self.clock.as_deref());
        self
    }

    /// Seconds remaining in the period, if the clock is readable.
    pub fn clock_seconds(&self) -> Option<f64> {
        clock::to_seconds(self.clock.as_deref())
    }
}

/// The reconciliation store's current belief about one game.
#[derive(Debug, Clone)]
pub struct AcceptedGameState {
    current: GameSnapshot,
    history: VecDeque<GameSnapshot>,
    capacity: usize,
    last_update_time: Instant,
    update_count: u32,
}

impl AcceptedGameState {
    /// Start tracking a game from its first accepted snapshot.
    pub(crate) fn new(snapshot: GameSnapshot, capacity: usize, now: Instant) -> Self {
        let capacity = capacity.max(1);
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(snapshot.clone());
        Self {
            current: snapshot,
            history,
            capacity,
            last_update_time: now,
            update_count: 1,
        }
    }

    /// Replace the current state with an accepted candidate.
    pub(crate) fn replace(&mut self, snapshot: GameSnapshot, now: Instant) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(snapshot.clone());
        self.current = snapshot;
        self.last_update_time = now;
        self.update_count = self.update_count.saturating_add(1);
    }

    /// Current accepted snapshot.
    pub fn current(&self) -> &GameSnapshot {
        &self.current
    }

    /// Recently accepted snapshots, oldest first; the last entry is the current state.
    pub fn history(&self) -> &VecDeque<GameSnapshot> {
        &self.history
    }

    /// Up to `count` of the newest history entries, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &GameSnapshot> {
        self.history
            .iter()
            .skip(self.history.len().saturating_sub(count))
    }

    /// Monotonic instant of the last accepted mutation.
    pub fn last_update_time(&self) -> Instant {
        self.last_update_time
    }

    /// Number of accepted mutations, including the bootstrap snapshot.
    pub fn update_count(&self) -> u32 {
        self.update_count
    }
}
