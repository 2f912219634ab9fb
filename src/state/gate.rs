use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::state::game::GameSnapshot;

/// Tunables of the broadcast gate.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastSettings {
    /// Minimum spacing between two emissions.
    pub cooldown: Duration,
    /// Clock movement (seconds) below which a clock change alone is not worth a broadcast.
    pub clock_change_secs: f64,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(200),
            clock_change_secs: 1.0,
        }
    }
}

/// Change detection and rate limiting in front of the aggregate stream.
///
/// The gate owns the aggregate as it was last sent. It is replaced wholesale on every emission
/// and only ever used for comparisons.
#[derive(Debug, Default)]
pub struct BroadcastGate {
    last_sent: Vec<GameSnapshot>,
    last_emitted_at: Option<Instant>,
    settings: BroadcastSettings,
}

impl BroadcastGate {
    /// Gate that has never emitted.
    pub fn new(settings: BroadcastSettings) -> Self {
        Self {
            last_sent: Vec::new(),
            last_emitted_at: None,
            settings,
        }
    }

    /// Whether `fresh` differs from the last emitted aggregate in a way clients would notice.
    pub fn has_meaningful_change(&self, fresh: &[GameSnapshot]) -> bool {
        let previous: HashMap<&str, &GameSnapshot> = self
            .last_sent
            .iter()
            .map(|snapshot| (snapshot.game_id.as_str(), snapshot))
            .collect();

        fresh.iter().any(|next| match previous.get(next.game_id.as_str()) {
            Some(prev) => materially_differs(prev, next, self.settings.clock_change_secs),
            None => true,
        })
    }

    /// Whether enough time passed since the last emission.
    pub fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.last_emitted_at
            .is_none_or(|at| now.saturating_duration_since(at) >= self.settings.cooldown)
    }

    /// Remember `aggregate` as the last emitted content.
    pub fn record(&mut self, aggregate: Vec<GameSnapshot>, now: Instant) {
        self.last_sent = aggregate;
        self.last_emitted_at = Some(now);
    }

    /// Aggregate as last emitted.
    pub fn last_sent(&self) -> &[GameSnapshot] {
        &self.last_sent
    }

    /// Instant of the last emission.
    pub fn last_emitted_at(&self) -> Option<Instant> {
        self.last_emitted_at
    }
}

fn materially_differs(prev: &GameSnapshot, next: &GameSnapshot, clock_change_secs: f64) -> bool {
    if prev.status != next.status
        || prev.period != next.period
        || prev.home.score != next.home.score
        || prev.away.score != next.away.score
    {
        return true;
    }
    match (prev.clock_seconds(), next.clock_seconds()) {
        (Some(before), Some(after)) => (before - after).abs() > clock_change_secs,
        (None, None) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::fixtures::live;

    #[test]
    fn new_games_are_meaningful() {
        let gate = BroadcastGate::default();
        assert!(!gate.has_meaningful_change(&[]));
        assert!(gate.has_meaningful_change(&[live("a", 1, "12:00", 0, 0)]));
    }

    #[test]
    fn sub_second_clock_moves_are_ignored() {
        let mut gate = BroadcastGate::default();
        gate.record(vec![live("a", 1, "5:00", 10, 8)], Instant::now());

        assert!(!gate.has_meaningful_change(&[live("a", 1, "4:59.5", 10, 8)]));
        assert!(!gate.has_meaningful_change(&[live("a", 1, "4:59", 10, 8)]));
        assert!(gate.has_meaningful_change(&[live("a", 1, "4:58.5", 10, 8)]));
        assert!(gate.has_meaningful_change(&[live("a", 1, "5:00", 11, 8)]));
        assert!(gate.has_meaningful_change(&[live("a", 2, "5:00", 10, 8)]));

        let mut cleared = live("a", 1, "5:00", 10, 8);
        cleared.clock = None;
        assert!(gate.has_meaningful_change(&[cleared]));
    }

    #[test]
    fn cooldown_spaces_emissions() {
        let mut gate = BroadcastGate::default();
        let start = Instant::now();
        assert!(gate.cooldown_elapsed(start));

        gate.record(Vec::new(), start);
        assert!(!gate.cooldown_elapsed(start + Duration::from_millis(150)));
        assert!(gate.cooldown_elapsed(start + Duration::from_millis(200)));
        assert_eq!(gate.last_emitted_at(), Some(start));
    }
}
