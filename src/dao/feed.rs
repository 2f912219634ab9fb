use std::error::Error;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::state::game::GameSnapshot;

/// Result alias for upstream feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Failure reported by a live feed, regardless of the provider behind it.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The upstream did not answer in time.
    #[error("upstream request timed out")]
    Timeout,
    /// The upstream has no document for the requested game (yet).
    #[error("upstream has no data for `{0}`")]
    NotFound(String),
    /// Network failure, unexpected status or malformed payload.
    #[error("upstream unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl FeedError {
    /// Construct an unavailable error from any provider failure.
    pub fn unavailable(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        FeedError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Pull-style access to the live sports data provider.
///
/// Every call hits the provider again; nothing is cached at this layer. Responses are not
/// trusted: snapshots may be stale, contradictory between calls or partially missing.
pub trait LiveFeed: Send + Sync {
    /// Current snapshot of every game on today's board.
    fn fetch_scoreboard(&self) -> BoxFuture<'static, FeedResult<Vec<GameSnapshot>>>;
    /// Play-by-play document of one game, passed through untouched.
    fn fetch_play_by_play(&self, game_id: &str) -> BoxFuture<'static, FeedResult<Value>>;
    /// Box score document of one game, passed through untouched.
    fn fetch_box_score(&self, game_id: &str) -> BoxFuture<'static, FeedResult<Value>>;
}
