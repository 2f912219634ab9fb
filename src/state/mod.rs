pub mod clock;
pub mod game;
pub mod gate;
pub mod play_by_play;
pub mod registry;
pub mod scoreboard;
pub mod store;
pub mod validator;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::{
    config::AppConfig,
    dao::feed::LiveFeed,
    state::{play_by_play::PlayByPlayHub, scoreboard::ScoreboardHub},
};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, upstream feed and the two subscriber hubs.
pub struct AppState {
    config: Arc<AppConfig>,
    feed: Arc<dyn LiveFeed>,
    scoreboard: ScoreboardHub,
    play_by_play: PlayByPlayHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, feed: Arc<dyn LiveFeed>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        let scoreboard = ScoreboardHub::new(config.reconcile.clone(), config.broadcast.clone());
        let play_by_play = PlayByPlayHub::new(Arc::clone(&feed), config.play_by_play.clone());
        Arc::new(Self {
            config: Arc::new(config),
            feed,
            scoreboard,
            play_by_play,
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Upstream live data provider.
    pub fn feed(&self) -> &Arc<dyn LiveFeed> {
        &self.feed
    }

    /// Reconciliation engine and aggregate subscribers.
    pub fn scoreboard(&self) -> &ScoreboardHub {
        &self.scoreboard
    }

    /// Per-game play-by-play subscriptions.
    pub fn play_by_play(&self) -> &PlayByPlayHub {
        &self.play_by_play
    }

    /// Whether the scoreboard poll loop is currently backing off.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn set_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        if changed {
            info!(degraded = value, "upstream health changed");
        }
    }
}
