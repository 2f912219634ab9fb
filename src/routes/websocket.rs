use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use validator::Validate;

use crate::{dto::game::GameIdPath, error::AppError, services::websocket_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "streams",
    responses((status = 101, description = "Switching protocols; full scoreboard aggregate pushed on connect and on every change"))
)]
/// Upgrade the HTTP connection into an aggregate scoreboard stream.
pub async fn scoreboard_ws(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_scoreboard_socket(state, socket))
}

#[utoipa::path(
    get,
    path = "/ws/playbyplay/{game_id}",
    tag = "streams",
    params(GameIdPath),
    responses(
        (status = 101, description = "Switching protocols; play-by-play pushed on connect and on every change"),
        (status = 400, description = "Malformed game id")
    )
)]
/// Upgrade the HTTP connection into the play-by-play stream of one game.
pub async fn play_by_play_ws(
    State(state): State<SharedState>,
    Path(path): Path<GameIdPath>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    path.validate()?;
    let game_id = path.game_id;
    Ok(ws.on_upgrade(move |socket| {
        websocket_service::handle_play_by_play_socket(state, game_id, socket)
    }))
}

/// Configure the WebSocket endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/ws", get(scoreboard_ws))
        .route("/ws/playbyplay/{game_id}", get(play_by_play_ws))
}
