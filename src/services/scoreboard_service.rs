use serde_json::Value;
use tokio::time::timeout;
use tracing::warn;

use crate::{
    dao::feed::FeedError, dto::scoreboard::ScoreboardResponse, error::ServiceError,
    state::SharedState,
};

/// Current accepted aggregate, as last reconciled by the poll loop.
pub async fn current_scoreboard(state: &SharedState) -> ScoreboardResponse {
    let games = state.scoreboard().snapshot().await;
    ScoreboardResponse::from(games.as_slice())
}

/// Fetch the box score of one game straight from the upstream feed.
pub async fn box_score(state: &SharedState, game_id: &str) -> Result<Value, ServiceError> {
    let limit = state.config().poll.fetch_timeout;
    match timeout(limit, state.feed().fetch_box_score(game_id)).await {
        Ok(Ok(document)) => Ok(document),
        Ok(Err(FeedError::NotFound(_))) => Err(ServiceError::NotFound(format!(
            "box score for game `{game_id}`"
        ))),
        Ok(Err(err)) => {
            warn!(game_id, error = %err, "box score fetch failed");
            Err(err.into())
        }
        Err(_) => {
            warn!(game_id, "box score fetch timed out");
            Err(ServiceError::Timeout)
        }
    }
}
