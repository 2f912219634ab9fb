#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::{self, BoxFuture};
use live_scoreboard_back::{
    config::AppConfig,
    dao::feed::{FeedError, FeedResult, LiveFeed},
    state::{
        AppState, SharedState,
        game::{GameSnapshot, GameStatus, TeamScore},
    },
};
use serde_json::Value;

enum ScoreboardStep {
    Reply(FeedResult<Vec<GameSnapshot>>),
    Hang,
}

/// In-memory feed replaying scripted responses.
///
/// Once the scoreboard script runs dry every call returns an empty batch; per-game documents
/// are served from fixed maps.
#[derive(Default)]
pub struct ScriptedFeed {
    scoreboards: Mutex<VecDeque<ScoreboardStep>>,
    play_by_play: Mutex<HashMap<String, VecDeque<Value>>>,
    hung_games: Mutex<HashSet<String>>,
    box_scores: Mutex<HashMap<String, Value>>,
    scoreboard_calls: AtomicUsize,
    play_by_play_calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_scoreboard(&self, games: Vec<GameSnapshot>) {
        self.scoreboards
            .lock()
            .expect("feed lock")
            .push_back(ScoreboardStep::Reply(Ok(games)));
    }

    /// The next scoreboard fetch never resolves.
    pub fn push_hang(&self) {
        self.scoreboards
            .lock()
            .expect("feed lock")
            .push_back(ScoreboardStep::Hang);
    }

    /// Every play-by-play fetch for `game_id` never resolves.
    pub fn hang_play_by_play(&self, game_id: &str) {
        self.hung_games
            .lock()
            .expect("feed lock")
            .insert(game_id.to_string());
    }

    pub fn push_failure(&self) {
        self.scoreboards
            .lock()
            .expect("feed lock")
            .push_back(ScoreboardStep::Reply(Err(FeedError::unavailable(
                "scripted outage",
                std::io::Error::other("connection refused"),
            ))));
    }

    pub fn push_play_by_play(&self, game_id: &str, payload: Value) {
        self.play_by_play
            .lock()
            .expect("feed lock")
            .entry(game_id.to_string())
            .or_default()
            .push_back(payload);
    }

    pub fn set_box_score(&self, game_id: &str, document: Value) {
        self.box_scores
            .lock()
            .expect("feed lock")
            .insert(game_id.to_string(), document);
    }

    pub fn scoreboard_calls(&self) -> usize {
        self.scoreboard_calls.load(Ordering::SeqCst)
    }

    pub fn play_by_play_calls(&self) -> usize {
        self.play_by_play_calls.load(Ordering::SeqCst)
    }
}

impl LiveFeed for ScriptedFeed {
    fn fetch_scoreboard(&self) -> BoxFuture<'static, FeedResult<Vec<GameSnapshot>>> {
        self.scoreboard_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .scoreboards
            .lock()
            .expect("feed lock")
            .pop_front()
            .unwrap_or_else(|| ScoreboardStep::Reply(Ok(Vec::new())));
        match next {
            ScoreboardStep::Reply(result) => Box::pin(async move { result }),
            ScoreboardStep::Hang => Box::pin(future::pending()),
        }
    }

    fn fetch_play_by_play(&self, game_id: &str) -> BoxFuture<'static, FeedResult<Value>> {
        self.play_by_play_calls.fetch_add(1, Ordering::SeqCst);
        if self.hung_games.lock().expect("feed lock").contains(game_id) {
            return Box::pin(future::pending());
        }
        let mut scripts = self.play_by_play.lock().expect("feed lock");
        // The last scripted payload keeps being served, like an idle game.
        let next = match scripts.get_mut(game_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().map(Ok),
            Some(queue) => queue.front().cloned().map(Ok),
            None => None,
        }
        .unwrap_or_else(|| Err(FeedError::NotFound(game_id.to_string())));
        Box::pin(async move { next })
    }

    fn fetch_box_score(&self, game_id: &str) -> BoxFuture<'static, FeedResult<Value>> {
        let next = self
            .box_scores
            .lock()
            .expect("feed lock")
            .get(game_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(game_id.to_string()));
        Box::pin(async move { next })
    }
}

/// Configuration with intervals short enough for tests.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.poll.interval = Duration::from_millis(10);
    config.poll.min_interval = Duration::from_millis(5);
    config.poll.max_interval = Duration::from_millis(20);
    config.poll.backoff_base = Duration::from_millis(10);
    config.poll.backoff_max = Duration::from_millis(40);
    config.poll.fetch_timeout = Duration::from_millis(500);
    config.broadcast.cooldown = Duration::ZERO;
    config.play_by_play.interval = Duration::from_millis(10);
    config.play_by_play.error_delay = Duration::from_millis(10);
    config
}

pub fn app_state(feed: Arc<ScriptedFeed>) -> SharedState {
    AppState::new(fast_config(), feed)
}

pub fn team(tricode: &str, score: u32) -> TeamScore {
    TeamScore {
        team_id: format!("id-{tricode}"),
        team_name: tricode.to_string(),
        team_city: tricode.to_string(),
        team_tricode: tricode.to_string(),
        score,
    }
}

/// In-progress game between BOS (home) and LAL (away), clock left raw.
pub fn live(game_id: &str, period: u32, clock: &str, home: u32, away: u32) -> GameSnapshot {
    GameSnapshot {
        game_id: game_id.to_string(),
        status: GameStatus::InProgress,
        period,
        clock: Some(clock.to_string()),
        home: team("BOS", home),
        away: team("LAL", away),
        scheduled_time: None,
        venue: None,
    }
}
