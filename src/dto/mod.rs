/// Path parameters identifying a game.
pub mod game;
/// Health check payloads.
pub mod health;
/// Scoreboard wire shapes shared by REST and WebSocket.
pub mod scoreboard;
/// Custom validation helpers.
pub mod validation;
