use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use axum::extract::ws::Message;
use dashmap::DashMap;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::feed::{FeedError, LiveFeed},
    state::registry::SubscriberRegistry,
};

/// Tunables of the per-game pollers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayByPlaySettings {
    /// Delay between two successful fetches.
    pub interval: Duration,
    /// Delay after a failed fetch.
    pub error_delay: Duration,
    /// Upper bound of a single fetch.
    pub fetch_timeout: Duration,
}

impl Default for PlayByPlaySettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            error_delay: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Aborts the poll task when the owning subscription goes away.
struct PollerHandle(JoinHandle<()>);

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct LatestPayload {
    value: Value,
    text: String,
}

/// Reference-counted subscription to one game: its listeners, last payload and poll task.
struct GameFeed {
    subscribers: SubscriberRegistry,
    latest: Option<LatestPayload>,
    _poller: PollerHandle,
}

struct HubInner {
    games: DashMap<String, GameFeed>,
    feed: Arc<dyn LiveFeed>,
    settings: PlayByPlaySettings,
}

/// Per-game play-by-play fan-out.
///
/// The first subscriber of a game starts its poller, the last one leaving stops it. Games are
/// independent of each other and of the aggregate scoreboard.
#[derive(Clone)]
pub struct PlayByPlayHub {
    inner: Arc<HubInner>,
}

impl PlayByPlayHub {
    /// Hub polling `feed` with the given settings.
    pub fn new(feed: Arc<dyn LiveFeed>, settings: PlayByPlaySettings) -> Self {
        Self {
            inner: Arc::new(HubInner {
                games: DashMap::new(),
                feed,
                settings,
            }),
        }
    }

    /// Register a listener for `game_id`, starting its poller if nobody watched it yet.
    ///
    /// The latest known payload, if any, is queued right away. Returns `false` when the
    /// connection is already closed.
    pub fn subscribe(&self, game_id: &str, id: Uuid, tx: mpsc::UnboundedSender<Message>) -> bool {
        let registered = {
            let mut game = self
                .inner
                .games
                .entry(game_id.to_string())
                .or_insert_with(|| self.start_game(game_id));

            let queued = match &game.latest {
                Some(latest) => tx.send(Message::Text(latest.text.clone().into())).is_ok(),
                None => !tx.is_closed(),
            };
            if queued {
                game.subscribers.insert(id, tx);
            }
            queued
        };

        if registered {
            debug!(game_id, connection = %id, "play-by-play subscriber added");
        } else {
            self.release_if_idle(game_id);
        }
        registered
    }

    /// Remove a listener; the game's poller stops with its last listener.
    pub fn unsubscribe(&self, game_id: &str, id: &Uuid) {
        if let Some(mut game) = self.inner.games.get_mut(game_id) {
            game.subscribers.remove(id);
        }
        self.release_if_idle(game_id);
    }

    /// Fan `payload` out to the listeners of `game_id` if it differs from the last one sent.
    ///
    /// Returns whether anything was sent.
    pub fn publish(&self, game_id: &str, payload: Value) -> bool {
        let emptied = {
            let Some(mut game) = self.inner.games.get_mut(game_id) else {
                return false;
            };
            if game
                .latest
                .as_ref()
                .is_some_and(|latest| latest.value == payload)
            {
                return false;
            }

            let text = match serde_json::to_string(&payload) {
                Ok(text) => text,
                Err(err) => {
                    warn!(game_id, error = %err, "failed to serialize play-by-play payload");
                    return false;
                }
            };
            let pruned = game.subscribers.fan_out(&Message::Text(text.clone().into()));
            for id in &pruned {
                info!(game_id, connection = %id, "play-by-play subscriber gone; pruned");
            }
            game.latest = Some(LatestPayload {
                value: payload,
                text,
            });
            !pruned.is_empty() && game.subscribers.is_empty()
        };

        if emptied {
            self.release_if_idle(game_id);
        }
        true
    }

    /// Whether a poller currently runs for `game_id`.
    pub fn is_watched(&self, game_id: &str) -> bool {
        self.inner.games.contains_key(game_id)
    }

    /// Number of listeners of `game_id`.
    pub fn subscriber_count(&self, game_id: &str) -> usize {
        self.inner
            .games
            .get(game_id)
            .map_or(0, |game| game.subscribers.len())
    }

    /// Number of games with at least one listener.
    pub fn watched_games(&self) -> usize {
        self.inner.games.len()
    }

    fn start_game(&self, game_id: &str) -> GameFeed {
        info!(game_id, "starting play-by-play poller");
        let task = tokio::spawn(poll_game(Arc::downgrade(&self.inner), game_id.to_string()));
        GameFeed {
            subscribers: SubscriberRegistry::default(),
            latest: None,
            _poller: PollerHandle(task),
        }
    }

    fn release_if_idle(&self, game_id: &str) {
        let removed = self
            .inner
            .games
            .remove_if(game_id, |_, game| game.subscribers.is_empty());
        if removed.is_some() {
            info!(game_id, "last play-by-play subscriber left; poller stopped");
        }
    }
}

async fn poll_game(hub: Weak<HubInner>, game_id: String) {
    loop {
        let Some(inner) = hub.upgrade() else {
            return;
        };
        let feed = Arc::clone(&inner.feed);
        let settings = inner.settings.clone();
        drop(inner);

        let fetched = match tokio::time::timeout(
            settings.fetch_timeout,
            feed.fetch_play_by_play(&game_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout),
        };

        let delay = match fetched {
            Ok(payload) => {
                let Some(inner) = hub.upgrade() else {
                    return;
                };
                if (PlayByPlayHub { inner }).publish(&game_id, payload) {
                    debug!(game_id = %game_id, "play-by-play update sent");
                }
                settings.interval
            }
            Err(FeedError::NotFound(_)) => {
                debug!(game_id = %game_id, "no play-by-play available yet");
                settings.error_delay
            }
            Err(err) => {
                warn!(game_id = %game_id, error = %err, "play-by-play fetch failed");
                settings.error_delay
            }
        };

        sleep(delay).await;
    }
}
