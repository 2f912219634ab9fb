//! Forward-progress heuristics deciding whether an upstream snapshot may replace the accepted one.
//!
//! The upstream feed regularly serves stale or contradictory snapshots, but it also issues
//! genuine corrections (a basket waived off, a clock reset after review). Every rule below only
//! rejects a regression when recent history makes the previous value look trustworthy; weak
//! evidence lets the candidate through as a correction.

use std::fmt;

use crate::state::game::{AcceptedGameState, GameSnapshot, GameStatus};

/// Tunable constants used by the validator and the reconciliation store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileThresholds {
    /// Forward clock slippage (seconds) accepted without question.
    pub clock_tolerance_secs: f64,
    /// A clock at or below this value is treated as the end of the period.
    pub end_of_period_secs: f64,
    /// Largest single-update score decrease accepted without question.
    pub score_tolerance: u32,
    /// Games with at most this many accepted updates are in their early phase.
    pub early_phase_updates: u32,
    /// Number of accepted snapshots kept per game.
    pub history_capacity: usize,
    /// Clock difference (seconds) under which two states are considered equivalent.
    pub equivalence_clock_secs: f64,
    /// Per-side score difference under which two states are considered equivalent.
    pub equivalence_score: u32,
}

impl Default for ReconcileThresholds {
    fn default() -> Self {
        Self {
            clock_tolerance_secs: 30.0,
            end_of_period_secs: 1.0,
            score_tolerance: 2,
            early_phase_updates: 3,
            history_capacity: 5,
            equivalence_clock_secs: 10.0,
            equivalence_score: 1,
        }
    }
}

/// Number of history entries consulted when looking for a consistent pattern.
const PATTERN_WINDOW: usize = 3;

/// Outcome of validating one candidate snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The candidate may replace the accepted state.
    Accept,
    /// The accepted state must be kept.
    Reject(Rejection),
}

/// Why a candidate was held back.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Upstream is flapping between two snapshots.
    Oscillation,
    /// The period went backwards while the higher period was consistently observed.
    PeriodRegression { from: u32, to: u32 },
    /// The clock jumped back up while it had been running down steadily.
    ClockRegression { from_secs: f64, to_secs: f64 },
    /// A score dropped by more than the tolerance after a stable run.
    ScoreRegression { side: Side, from: u32, to: u32 },
    /// A final game was reported as not final anymore.
    ReopenedFinal { to: GameStatus },
}

/// Home or away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Home team.
    Home,
    /// Away team.
    Away,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oscillation => write!(f, "upstream oscillation"),
            Self::PeriodRegression { from, to } => write!(f, "period regression {from} -> {to}"),
            Self::ClockRegression { from_secs, to_secs } => {
                write!(f, "clock regression {from_secs:.1}s -> {to_secs:.1}s")
            }
            Self::ScoreRegression { side, from, to } => {
                write!(f, "{side:?} score regression {from} -> {to}")
            }
            Self::ReopenedFinal { to } => write!(f, "final game reported as {to:?}"),
        }
    }
}

/// Whether `candidate` represents acceptable progress over the accepted state.
pub fn is_acceptable(
    accepted: Option<&AcceptedGameState>,
    candidate: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> bool {
    matches!(evaluate(accepted, candidate, thresholds), Verdict::Accept)
}

/// Run every rule in order and report the first rejection, if any.
pub fn evaluate(
    accepted: Option<&AcceptedGameState>,
    candidate: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> Verdict {
    let Some(accepted) = accepted else {
        return Verdict::Accept;
    };

    let checks = [
        check_oscillation,
        check_period,
        check_clock,
        check_score,
        check_status,
    ];
    for check in checks {
        if let Err(rejection) = check(accepted, candidate, thresholds) {
            return Verdict::Reject(rejection);
        }
    }
    Verdict::Accept
}

/// Equivalence used for flapping detection: same status and period, scores within one point
/// on each side and clocks within a few seconds when both are readable.
pub fn states_equivalent(
    a: &GameSnapshot,
    b: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> bool {
    if a.status != b.status || a.period != b.period {
        return false;
    }
    if a.home.score.abs_diff(b.home.score) > thresholds.equivalence_score
        || a.away.score.abs_diff(b.away.score) > thresholds.equivalence_score
    {
        return false;
    }
    match (a.clock_seconds(), b.clock_seconds()) {
        (Some(left), Some(right)) => (left - right).abs() <= thresholds.equivalence_clock_secs,
        _ => true,
    }
}

type RuleResult = Result<(), Rejection>;

fn is_early_phase(accepted: &AcceptedGameState, thresholds: &ReconcileThresholds) -> bool {
    accepted.update_count() <= thresholds.early_phase_updates
}

fn check_oscillation(
    accepted: &AcceptedGameState,
    candidate: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> RuleResult {
    let history = accepted.history();
    if history.len() < 3 {
        return Ok(());
    }
    let previous = &history[history.len() - 1];
    let two_ago = &history[history.len() - 2];
    if states_equivalent(candidate, two_ago, thresholds)
        && !states_equivalent(candidate, previous, thresholds)
    {
        return Err(Rejection::Oscillation);
    }
    Ok(())
}

fn check_period(
    accepted: &AcceptedGameState,
    candidate: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> RuleResult {
    let current = accepted.current().period;
    if candidate.period >= current || is_early_phase(accepted, thresholds) {
        return Ok(());
    }
    let consistent = accepted
        .recent(PATTERN_WINDOW)
        .all(|snapshot| snapshot.period >= current);
    if consistent {
        return Err(Rejection::PeriodRegression {
            from: current,
            to: candidate.period,
        });
    }
    Ok(())
}

fn check_clock(
    accepted: &AcceptedGameState,
    candidate: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> RuleResult {
    let current = accepted.current();
    if candidate.period != current.period
        || candidate.status != GameStatus::InProgress
        || current.status != GameStatus::InProgress
    {
        return Ok(());
    }
    let (Some(old), Some(new)) = (current.clock_seconds(), candidate.clock_seconds()) else {
        return Ok(());
    };
    if old <= thresholds.end_of_period_secs || new <= old + thresholds.clock_tolerance_secs {
        return Ok(());
    }
    if is_early_phase(accepted, thresholds) {
        return Ok(());
    }

    let clocks: Vec<f64> = accepted
        .recent(PATTERN_WINDOW)
        .filter(|snapshot| snapshot.period == current.period)
        .filter_map(GameSnapshot::clock_seconds)
        .collect();
    let running_down = clocks.len() >= 2 && clocks.windows(2).all(|pair| pair[1] <= pair[0]);
    if running_down {
        return Err(Rejection::ClockRegression {
            from_secs: old,
            to_secs: new,
        });
    }
    Ok(())
}

fn check_score(
    accepted: &AcceptedGameState,
    candidate: &GameSnapshot,
    thresholds: &ReconcileThresholds,
) -> RuleResult {
    if is_early_phase(accepted, thresholds) {
        return Ok(());
    }
    let current = accepted.current();
    let sides = [
        (Side::Home, current.home.score, candidate.home.score),
        (Side::Away, current.away.score, candidate.away.score),
    ];
    for (side, from, to) in sides {
        if from <= to || from - to <= thresholds.score_tolerance {
            continue;
        }
        let scores: Vec<u32> = accepted
            .recent(PATTERN_WINDOW)
            .map(|snapshot| match side {
                Side::Home => snapshot.home.score,
                Side::Away => snapshot.away.score,
            })
            .collect();
        let stable = scores.len() >= 2 && scores.windows(2).all(|pair| pair[1] >= pair[0]);
        if stable {
            return Err(Rejection::ScoreRegression { side, from, to });
        }
    }
    Ok(())
}

fn check_status(
    accepted: &AcceptedGameState,
    candidate: &GameSnapshot,
    _thresholds: &ReconcileThresholds,
) -> RuleResult {
    if accepted.current().status == GameStatus::Final && candidate.status < GameStatus::Final {
        return Err(Rejection::ReopenedFinal {
            to: candidate.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::state::game::fixtures::live;

    /// Build an accepted state by replaying `steps` without validation.
    fn accepted_from(steps: &[GameSnapshot]) -> AcceptedGameState {
        let now = Instant::now();
        let mut iter = steps.iter().cloned();
        let mut state = AcceptedGameState::new(iter.next().expect("at least one step"), 5, now);
        for snapshot in iter {
            state.replace(snapshot, now);
        }
        state
    }

    fn verdict(state: &AcceptedGameState, candidate: &GameSnapshot) -> Verdict {
        evaluate(Some(state), candidate, &ReconcileThresholds::default())
    }

    #[test]
    fn unknown_game_is_always_accepted() {
        let mut weird = live("g", 0, "99:99", 0, 0);
        weird.status = GameStatus::Final;
        assert!(is_acceptable(None, &weird, &ReconcileThresholds::default()));
    }

    #[test]
    fn equivalence_tolerates_small_deltas() {
        let t = ReconcileThresholds::default();
        let a = live("g", 2, "5:00", 50, 48);
        assert!(states_equivalent(&a, &live("g", 2, "4:51", 51, 47), &t));
        assert!(!states_equivalent(&a, &live("g", 2, "4:49", 50, 48), &t));
        assert!(!states_equivalent(&a, &live("g", 2, "5:00", 52, 48), &t));
        assert!(!states_equivalent(&a, &live("g", 3, "5:00", 50, 48), &t));

        let mut unreadable = a.clone();
        unreadable.clock = None;
        assert!(states_equivalent(&a, &unreadable, &t));
    }

    #[test]
    fn flapping_back_to_two_cycles_ago_is_rejected() {
        let a = live("g", 2, "5:00", 50, 48);
        let b = live("g", 2, "4:58", 52, 48);
        let state = accepted_from(&[a.clone(), b.clone(), a.clone()]);

        assert_eq!(verdict(&state, &b), Verdict::Reject(Rejection::Oscillation));
        assert_eq!(verdict(&state, &a), Verdict::Accept);
    }

    #[test]
    fn oscillation_needs_three_states() {
        let a = live("g", 2, "5:00", 50, 48);
        let b = live("g", 2, "4:58", 52, 48);
        let state = accepted_from(&[a.clone(), b.clone()]);
        assert_eq!(verdict(&state, &a), Verdict::Accept);
    }

    #[test]
    fn consistent_higher_period_blocks_regression() {
        let state = accepted_from(&[
            live("g", 3, "6:00", 60, 60),
            live("g", 3, "5:40", 62, 60),
            live("g", 3, "5:20", 62, 63),
            live("g", 3, "5:00", 64, 63),
        ]);
        assert_eq!(
            verdict(&state, &live("g", 2, "0:30", 64, 63)),
            Verdict::Reject(Rejection::PeriodRegression { from: 3, to: 2 })
        );
    }

    #[test]
    fn blip_period_allows_correction() {
        let state = accepted_from(&[
            live("g", 2, "1:00", 50, 50),
            live("g", 2, "0:45", 52, 50),
            live("g", 2, "0:30", 52, 52),
            live("g", 3, "0:25", 52, 52),
        ]);
        assert_eq!(verdict(&state, &live("g", 2, "0:15", 52, 52)), Verdict::Accept);
    }

    #[test]
    fn early_phase_accepts_period_correction() {
        let state = accepted_from(&[live("g", 4, "2:00", 90, 88)]);
        assert_eq!(verdict(&state, &live("g", 3, "2:00", 90, 88)), Verdict::Accept);
    }

    #[test]
    fn clock_jump_after_steady_run_down_is_rejected() {
        let state = accepted_from(&[
            live("g", 1, "8:00", 10, 10),
            live("g", 1, "7:30", 12, 10),
            live("g", 1, "7:00", 12, 12),
            live("g", 1, "6:30", 14, 12),
        ]);
        assert!(matches!(
            verdict(&state, &live("g", 1, "7:30", 14, 12)),
            Verdict::Reject(Rejection::ClockRegression { .. })
        ));
    }

    #[test]
    fn small_clock_slippage_is_tolerated() {
        let state = accepted_from(&[
            live("g", 1, "8:00", 10, 10),
            live("g", 1, "7:30", 12, 10),
            live("g", 1, "7:00", 12, 12),
            live("g", 1, "6:30", 14, 12),
        ]);
        assert_eq!(verdict(&state, &live("g", 1, "6:55", 14, 12)), Verdict::Accept);
    }

    #[test]
    fn clock_increase_without_run_down_pattern_is_a_correction() {
        let state = accepted_from(&[
            live("g", 1, "8:00", 10, 10),
            live("g", 1, "6:30", 12, 10),
            live("g", 1, "6:50", 12, 12),
            live("g", 1, "6:30", 14, 12),
        ]);
        assert_eq!(verdict(&state, &live("g", 1, "8:00", 14, 12)), Verdict::Accept);
    }

    #[test]
    fn clock_at_zero_permits_anything() {
        let state = accepted_from(&[
            live("g", 1, "0:30", 20, 20),
            live("g", 1, "0:10", 22, 20),
            live("g", 1, "0:05", 22, 22),
            live("g", 1, "0:00.8", 24, 22),
        ]);
        assert_eq!(verdict(&state, &live("g", 1, "12:00", 24, 22)), Verdict::Accept);
    }

    #[test]
    fn period_advance_resets_clock() {
        let state = accepted_from(&[
            live("g", 1, "0:30", 20, 20),
            live("g", 1, "0:20", 22, 20),
            live("g", 1, "0:10", 22, 22),
            live("g", 1, "0:02", 24, 22),
        ]);
        assert_eq!(verdict(&state, &live("g", 2, "12:00", 24, 22)), Verdict::Accept);
    }

    #[test]
    fn large_score_drop_after_stable_run_is_rejected() {
        let state = accepted_from(&[
            live("g", 2, "9:00", 40, 38),
            live("g", 2, "8:40", 40, 38),
            live("g", 2, "8:20", 40, 38),
            live("g", 2, "8:00", 40, 38),
        ]);
        assert_eq!(
            verdict(&state, &live("g", 2, "7:50", 37, 38)),
            Verdict::Reject(Rejection::ScoreRegression {
                side: Side::Home,
                from: 40,
                to: 37
            })
        );
        assert_eq!(verdict(&state, &live("g", 2, "7:50", 40, 36)), Verdict::Accept);
    }

    #[test]
    fn score_drop_after_fluctuating_history_is_a_correction() {
        let state = accepted_from(&[
            live("g", 2, "9:00", 40, 38),
            live("g", 2, "8:40", 44, 38),
            live("g", 2, "8:20", 42, 38),
            live("g", 2, "8:00", 45, 38),
        ]);
        assert_eq!(verdict(&state, &live("g", 2, "7:50", 41, 38)), Verdict::Accept);
    }

    #[test]
    fn early_phase_accepts_score_correction() {
        let state = accepted_from(&[live("g", 2, "9:00", 40, 38), live("g", 2, "8:50", 40, 38)]);
        assert_eq!(verdict(&state, &live("g", 2, "8:40", 30, 38)), Verdict::Accept);
    }

    #[test]
    fn final_games_stay_final() {
        let mut done = live("g", 4, "0:00", 101, 99);
        done.status = GameStatus::Final;
        done.clock = None;
        let state = accepted_from(&[done.clone()]);

        let reopened = live("g", 4, "0:00", 101, 99);
        assert_eq!(
            verdict(&state, &reopened),
            Verdict::Reject(Rejection::ReopenedFinal {
                to: GameStatus::InProgress
            })
        );
    }

    #[test]
    fn other_status_regressions_are_tolerated() {
        let state = accepted_from(&[live("g", 1, "12:00", 0, 0)]);
        let mut scheduled = live("g", 1, "12:00", 0, 0);
        scheduled.status = GameStatus::Scheduled;
        assert_eq!(verdict(&state, &scheduled), Verdict::Accept);
    }
}
