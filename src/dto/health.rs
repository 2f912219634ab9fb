use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok", or "degraded" while the upstream feed is failing).
    pub status: String,
    /// Games currently tracked by the reconciliation store.
    pub tracked_games: usize,
    /// Open aggregate scoreboard connections.
    pub scoreboard_subscribers: usize,
    /// Games with at least one play-by-play listener.
    pub watched_games: usize,
}

impl HealthResponse {
    /// Status label for the given degraded flag.
    pub fn status_label(degraded: bool) -> &'static str {
        if degraded { "degraded" } else { "ok" }
    }
}
