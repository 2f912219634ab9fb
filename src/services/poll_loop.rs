//! Adaptive scoreboard polling with exponential backoff.
//!
//! Exactly one loop drives the reconciliation engine. Each cycle yields an explicit
//! [`CycleOutcome`] that the [`PollSchedule`] turns into the next delay; failures never escape
//! the loop.

use std::time::Duration;

use rand::Rng;
use tokio::{
    sync::watch,
    time::{sleep, timeout},
};
use tracing::{debug, error, info, warn};

use crate::{
    dao::feed::FeedError,
    state::{AppState, SharedState},
};

/// Tunables of the scoreboard poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    /// Starting delay between two cycles.
    pub interval: Duration,
    /// Floor reached after consecutive broadcasts.
    pub min_interval: Duration,
    /// Ceiling reached after consecutive quiet cycles.
    pub max_interval: Duration,
    /// Interval multiplier applied after a broadcast.
    pub speedup_factor: f64,
    /// Interval multiplier applied after a quiet cycle.
    pub slowdown_factor: f64,
    /// Delay after the first failure.
    pub backoff_base: Duration,
    /// Growth of the delay per additional consecutive failure.
    pub backoff_multiplier: f64,
    /// Upper bound of the backoff delay before jitter.
    pub backoff_max: Duration,
    /// Relative random spread applied to backoff delays.
    pub jitter_ratio: f64,
    /// Upper bound of one upstream fetch.
    pub fetch_timeout: Duration,
    /// Consecutive failures after which failures log as errors.
    pub escalate_after_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            min_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(3),
            speedup_factor: 0.9,
            slowdown_factor: 1.1,
            backoff_base: Duration::from_secs(1),
            backoff_multiplier: 1.5,
            backoff_max: Duration::from_secs(60),
            jitter_ratio: 0.1,
            fetch_timeout: Duration::from_secs(90),
            escalate_after_failures: 5,
        }
    }
}

/// Result of one poll cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The aggregate was emitted to subscribers.
    Broadcast,
    /// The fetch succeeded but nothing was emitted.
    Quiet,
    /// The fetch failed or timed out.
    Failed(FeedError),
}

/// Mode of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Regular adaptive polling.
    Steady,
    /// Recovering from `failures` consecutive failed cycles.
    Backoff { failures: u32 },
}

/// Interval adaptation and backoff bookkeeping, free of any I/O.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    settings: PollSettings,
    interval: Duration,
    consecutive_failures: u32,
}

impl PollSchedule {
    /// Schedule in steady mode at the configured starting interval.
    pub fn new(settings: PollSettings) -> Self {
        let interval = settings
            .interval
            .clamp(settings.min_interval, settings.max_interval.max(settings.min_interval));
        Self {
            settings,
            interval,
            consecutive_failures: 0,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> PollMode {
        match self.consecutive_failures {
            0 => PollMode::Steady,
            failures => PollMode::Backoff { failures },
        }
    }

    /// Current steady-mode interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of failed cycles since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a successful cycle and return the delay before the next one.
    ///
    /// The first success after a failure streak restarts from the base interval.
    pub fn on_success(&mut self, emitted: bool) -> Duration {
        let ceiling = self.settings.max_interval.max(self.settings.min_interval);
        if self.consecutive_failures > 0 {
            self.consecutive_failures = 0;
            self.interval = self.settings.interval.clamp(self.settings.min_interval, ceiling);
        }
        let factor = if emitted {
            self.settings.speedup_factor
        } else {
            self.settings.slowdown_factor
        };
        // An overflowing factor saturates at the ceiling.
        self.interval = Duration::try_from_secs_f64(self.interval.as_secs_f64() * factor.max(0.0))
            .ok()
            .unwrap_or(ceiling)
            .clamp(self.settings.min_interval, ceiling);
        self.interval
    }

    /// Record a failed cycle and return the backoff delay before jitter.
    pub fn on_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.backoff_delay()
    }

    /// Backoff delay for the current failure streak, before jitter.
    pub fn backoff_delay(&self) -> Duration {
        if self.consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(self.consecutive_failures - 1).unwrap_or(i32::MAX);
        let scale = self.settings.backoff_multiplier.max(1.0).powi(exponent);
        let max = self.settings.backoff_max.as_secs_f64();
        let secs = (self.settings.backoff_base.as_secs_f64() * scale).min(max);
        Duration::from_secs_f64(if secs.is_finite() { secs } else { max })
    }

    /// Whether the current failure streak deserves error-level logging.
    pub fn escalated(&self) -> bool {
        self.consecutive_failures >= self.settings.escalate_after_failures
    }
}

/// Spread `delay` randomly by up to `ratio` in either direction.
pub fn jittered(delay: Duration, ratio: f64) -> Duration {
    if ratio.is_nan() || ratio <= 0.0 || delay.is_zero() {
        return delay;
    }
    let ratio = ratio.min(1.0);
    let spread = rand::rng().random_range(-ratio..=ratio);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + spread))
        .ok()
        .unwrap_or(delay)
}

/// Fetch one scoreboard batch and feed it through the broadcast engine.
pub async fn run_cycle(state: &AppState) -> CycleOutcome {
    let limit = state.config().poll.fetch_timeout;
    let games = match timeout(limit, state.feed().fetch_scoreboard()).await {
        Ok(Ok(games)) => games,
        Ok(Err(err)) => return CycleOutcome::Failed(err),
        Err(_) => return CycleOutcome::Failed(FeedError::Timeout),
    };

    if state.scoreboard().maybe_broadcast(games).await {
        CycleOutcome::Broadcast
    } else {
        CycleOutcome::Quiet
    }
}

/// Drive the scoreboard until `shutdown` flips to `true` or its sender is dropped.
///
/// Cancellation interrupts both an in-flight fetch and the sleep between cycles; once it is
/// observed no further upstream call or broadcast happens.
pub async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let mut schedule = PollSchedule::new(state.config().poll.clone());
    info!(interval_ms = schedule.interval().as_millis() as u64, "scoreboard poll loop started");

    loop {
        let outcome = tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => break,
            outcome = run_cycle(&state) => outcome,
        };

        let delay = match outcome {
            CycleOutcome::Failed(err) => {
                let delay = jittered(schedule.on_failure(), state.config().poll.jitter_ratio);
                let failures = schedule.consecutive_failures();
                let delay_ms = delay.as_millis() as u64;
                if schedule.escalated() {
                    error!(error = %err, failures, delay_ms, "scoreboard fetch keeps failing; backing off");
                } else {
                    warn!(error = %err, failures, delay_ms, "scoreboard fetch failed; backing off");
                }
                state.set_degraded(true);
                delay
            }
            outcome => {
                if let PollMode::Backoff { failures } = schedule.mode() {
                    info!(failures, "scoreboard feed recovered");
                }
                state.set_degraded(false);
                let delay = schedule.on_success(matches!(outcome, CycleOutcome::Broadcast));
                debug!(?outcome, interval_ms = delay.as_millis() as u64, "poll cycle done");
                delay
            }
        };

        tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => break,
            _ = sleep(delay) => {}
        }
    }

    info!("scoreboard poll loop stopped");
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender counts as a shutdown request.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
