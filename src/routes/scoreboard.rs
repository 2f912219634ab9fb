use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::Value;
use validator::Validate;

use crate::{
    dto::{game::GameIdPath, scoreboard::ScoreboardResponse},
    error::AppError,
    services::scoreboard_service,
    state::SharedState,
};

/// Read-only scoreboard endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/scoreboard", get(get_scoreboard))
        .route("/api/v1/boxscore/{game_id}", get(get_box_score))
}

#[utoipa::path(
    get,
    path = "/api/v1/scoreboard",
    tag = "scoreboard",
    responses((status = 200, description = "Current reconciled scoreboard", body = ScoreboardResponse))
)]
/// Return the reconciled state of every game seen today.
pub async fn get_scoreboard(State(state): State<SharedState>) -> Json<ScoreboardResponse> {
    Json(scoreboard_service::current_scoreboard(&state).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/boxscore/{game_id}",
    tag = "scoreboard",
    params(GameIdPath),
    responses(
        (status = 200, description = "Upstream box score document", body = Object),
        (status = 400, description = "Malformed game id"),
        (status = 404, description = "No box score available for this game"),
        (status = 503, description = "Upstream unavailable")
    )
)]
/// Return the upstream box score of one game.
pub async fn get_box_score(
    State(state): State<SharedState>,
    Path(path): Path<GameIdPath>,
) -> Result<Json<Value>, AppError> {
    path.validate()?;
    let document = scoreboard_service::box_score(&state, &path.game_id).await?;
    Ok(Json(document))
}
