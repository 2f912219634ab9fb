/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Adaptive scoreboard poll loop with backoff.
pub mod poll_loop;
/// Read-only scoreboard and box score lookups.
pub mod scoreboard_service;
/// WebSocket connection handling for the live streams.
pub mod websocket_service;
