use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::scoreboard::get_scoreboard,
        crate::routes::scoreboard::get_box_score,
        crate::routes::websocket::scoreboard_ws,
        crate::routes::websocket::play_by_play_ws,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scoreboard::ScoreboardResponse,
            crate::dto::scoreboard::GameBrief,
            crate::dto::scoreboard::TeamGameInfo,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scoreboard", description = "Live scoreboard and box scores"),
        (name = "streams", description = "WebSocket streams for live updates"),
    )
)]
pub struct ApiDoc;
