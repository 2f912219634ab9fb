use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report upstream health along with a few engine counters.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let degraded = state.is_degraded();
    if degraded {
        warn!("health requested while upstream feed is failing");
    }

    HealthResponse {
        status: HealthResponse::status_label(degraded).to_string(),
        tracked_games: state.scoreboard().snapshot().await.len(),
        scoreboard_subscribers: state.scoreboard().subscriber_count().await,
        watched_games: state.play_by_play().watched_games(),
    }
}
