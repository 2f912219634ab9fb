//! Application-level configuration loading: upstream location and reconciliation tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dao::nba_cdn::DEFAULT_BASE_URL,
    services::poll_loop::PollSettings,
    state::{gate::BroadcastSettings, play_by_play::PlayByPlaySettings, validator::ReconcileThresholds},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_SCOREBOARD_CONFIG_PATH";
/// Environment variable that overrides the upstream base URL.
const UPSTREAM_URL_ENV: &str = "UPSTREAM_BASE_URL";

/// Where the live data comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    pub base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub reconcile: ReconcileThresholds,
    pub broadcast: BroadcastSettings,
    pub poll: PollSettings,
    pub play_by_play: PlayByPlaySettings,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(base_url) = env::var(UPSTREAM_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
        {
            info!(%base_url, "upstream base URL overridden from environment");
            config.upstream.base_url = base_url;
        }
        config
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    upstream: RawUpstream,
    reconcile: RawReconcile,
    broadcast: RawBroadcast,
    poll: RawPoll,
    play_by_play: RawPlayByPlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUpstream {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReconcile {
    clock_tolerance_secs: Option<f64>,
    end_of_period_secs: Option<f64>,
    score_tolerance: Option<u32>,
    early_phase_updates: Option<u32>,
    history_capacity: Option<usize>,
    equivalence_clock_secs: Option<f64>,
    equivalence_score: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBroadcast {
    cooldown_ms: Option<u64>,
    clock_change_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPoll {
    interval_ms: Option<u64>,
    min_interval_ms: Option<u64>,
    max_interval_ms: Option<u64>,
    speedup_factor: Option<f64>,
    slowdown_factor: Option<f64>,
    backoff_base_ms: Option<u64>,
    backoff_multiplier: Option<f64>,
    backoff_max_ms: Option<u64>,
    jitter_ratio: Option<f64>,
    fetch_timeout_secs: Option<u64>,
    escalate_after_failures: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlayByPlay {
    interval_ms: Option<u64>,
    error_delay_ms: Option<u64>,
    fetch_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            upstream: UpstreamConfig {
                base_url: raw.upstream.base_url.unwrap_or(defaults.upstream.base_url),
            },
            reconcile: raw.reconcile.apply(defaults.reconcile),
            broadcast: raw.broadcast.apply(defaults.broadcast),
            poll: raw.poll.apply(defaults.poll),
            play_by_play: raw.play_by_play.apply(defaults.play_by_play),
        }
    }
}

impl RawReconcile {
    fn apply(self, base: ReconcileThresholds) -> ReconcileThresholds {
        ReconcileThresholds {
            clock_tolerance_secs: self.clock_tolerance_secs.unwrap_or(base.clock_tolerance_secs),
            end_of_period_secs: self.end_of_period_secs.unwrap_or(base.end_of_period_secs),
            score_tolerance: self.score_tolerance.unwrap_or(base.score_tolerance),
            early_phase_updates: self.early_phase_updates.unwrap_or(base.early_phase_updates),
            history_capacity: self.history_capacity.unwrap_or(base.history_capacity),
            equivalence_clock_secs: self
                .equivalence_clock_secs
                .unwrap_or(base.equivalence_clock_secs),
            equivalence_score: self.equivalence_score.unwrap_or(base.equivalence_score),
        }
    }
}

impl RawBroadcast {
    fn apply(self, base: BroadcastSettings) -> BroadcastSettings {
        BroadcastSettings {
            cooldown: self.cooldown_ms.map_or(base.cooldown, Duration::from_millis),
            clock_change_secs: self.clock_change_secs.unwrap_or(base.clock_change_secs),
        }
    }
}

impl RawPoll {
    fn apply(self, base: PollSettings) -> PollSettings {
        PollSettings {
            interval: self.interval_ms.map_or(base.interval, Duration::from_millis),
            min_interval: self.min_interval_ms.map_or(base.min_interval, Duration::from_millis),
            max_interval: self.max_interval_ms.map_or(base.max_interval, Duration::from_millis),
            speedup_factor: self.speedup_factor.unwrap_or(base.speedup_factor),
            slowdown_factor: self.slowdown_factor.unwrap_or(base.slowdown_factor),
            backoff_base: self.backoff_base_ms.map_or(base.backoff_base, Duration::from_millis),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(base.backoff_multiplier),
            backoff_max: self.backoff_max_ms.map_or(base.backoff_max, Duration::from_millis),
            jitter_ratio: self.jitter_ratio.unwrap_or(base.jitter_ratio),
            fetch_timeout: self.fetch_timeout_secs.map_or(base.fetch_timeout, Duration::from_secs),
            escalate_after_failures: self
                .escalate_after_failures
                .unwrap_or(base.escalate_after_failures),
        }
    }
}

impl RawPlayByPlay {
    fn apply(self, base: PlayByPlaySettings) -> PlayByPlaySettings {
        PlayByPlaySettings {
            interval: self.interval_ms.map_or(base.interval, Duration::from_millis),
            error_delay: self.error_delay_ms.map_or(base.error_delay, Duration::from_millis),
            fetch_timeout: self.fetch_timeout_secs.map_or(base.fetch_timeout, Duration::from_secs),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
