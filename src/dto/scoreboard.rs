use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::state::game::{GameSnapshot, TeamScore};

/// Team identity and score as sent to scoreboard clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamGameInfo {
    pub team_id: String,
    pub team_name: String,
    pub team_city: String,
    pub team_tricode: String,
    pub score: u32,
}

/// One game of the aggregate scoreboard stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameBrief {
    pub game_id: String,
    /// 1 = scheduled, 2 = in progress, 3 = final.
    pub game_status: u8,
    pub period: u32,
    /// Time left in the period as an ISO-8601 duration (`PT05M06.00S`).
    pub clock: Option<String>,
    /// Scheduled tip-off (UTC, RFC 3339).
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub game_time: Option<OffsetDateTime>,
    pub home_team: TeamGameInfo,
    pub away_team: TeamGameInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arena: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl From<&TeamScore> for TeamGameInfo {
    fn from(team: &TeamScore) -> Self {
        Self {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
            team_city: team.team_city.clone(),
            team_tricode: team.team_tricode.clone(),
            score: team.score,
        }
    }
}

impl From<&GameSnapshot> for GameBrief {
    fn from(snapshot: &GameSnapshot) -> Self {
        let venue = snapshot.venue.clone().unwrap_or_default();
        Self {
            game_id: snapshot.game_id.clone(),
            game_status: snapshot.status.code(),
            period: snapshot.period,
            clock: snapshot.clock.clone(),
            game_time: snapshot.scheduled_time,
            home_team: TeamGameInfo::from(&snapshot.home),
            away_team: TeamGameInfo::from(&snapshot.away),
            arena: venue.arena,
            city: venue.city,
            state: venue.state,
        }
    }
}

/// Current aggregate as returned by the REST endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    /// Accepted state of every game, in first-seen order.
    pub games: Vec<GameBrief>,
    /// Number of entries in `games`.
    pub total_games: usize,
}

impl From<&[GameSnapshot]> for ScoreboardResponse {
    fn from(games: &[GameSnapshot]) -> Self {
        Self {
            games: games.iter().map(GameBrief::from).collect(),
            total_games: games.len(),
        }
    }
}

/// Serialize the full aggregate in its wire shape.
pub fn aggregate_json(games: &[GameSnapshot]) -> serde_json::Result<String> {
    let briefs: Vec<GameBrief> = games.iter().map(GameBrief::from).collect();
    serde_json::to_string(&briefs)
}
