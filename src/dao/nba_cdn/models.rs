//! Lenient decoding of the CDN documents into domain snapshots.
//!
//! Upstream fields go missing or change type from one poll to the next. Decoding never fails
//! on a single field: unreadable scores become 0, unknown status codes are clamped and a
//! missing clock stays `None`. Only a game without an identifier is skipped.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::game::{GameSnapshot, GameStatus, TeamScore, Venue};

/// Path of today's scoreboard document.
pub(super) const SCOREBOARD_PATH: &str = "static/json/liveData/scoreboard/todaysScoreboard_00.json";

/// Path of the play-by-play document of `game_id`.
pub(super) fn play_by_play_path(game_id: &str) -> String {
    format!("static/json/liveData/playbyplay/playbyplay_{game_id}.json")
}

/// Path of the box score document of `game_id`.
pub(super) fn box_score_path(game_id: &str) -> String {
    format!("static/json/liveData/boxscore/boxscore_{game_id}.json")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdnTeam {
    #[serde(default, deserialize_with = "lenient_string")]
    team_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    team_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    team_city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    team_tricode: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    score: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdnGame {
    #[serde(default, deserialize_with = "lenient_string")]
    game_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    game_status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    period: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    game_clock: Option<String>,
    #[serde(default, rename = "gameTimeUTC", deserialize_with = "lenient_string")]
    game_time_utc: Option<String>,
    #[serde(default, deserialize_with = "lenient_team")]
    home_team: CdnTeam,
    #[serde(default, deserialize_with = "lenient_team")]
    away_team: CdnTeam,
    #[serde(default, deserialize_with = "lenient_string")]
    arena_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    arena_city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    arena_state: Option<String>,
}

impl From<CdnTeam> for TeamScore {
    fn from(team: CdnTeam) -> Self {
        Self {
            team_id: team.team_id.unwrap_or_default(),
            team_name: team.team_name.unwrap_or_default(),
            team_city: team.team_city.unwrap_or_default(),
            team_tricode: team.team_tricode.unwrap_or_default(),
            score: team.score,
        }
    }
}

impl CdnGame {
    fn into_snapshot(self) -> Option<GameSnapshot> {
        let game_id = self.game_id?;
        let venue = (self.arena_name.is_some() || self.arena_city.is_some() || self.arena_state.is_some())
            .then(|| Venue {
                arena: self.arena_name,
                city: self.arena_city,
                state: self.arena_state,
            });

        Some(GameSnapshot {
            game_id,
            status: self
                .game_status
                .map(GameStatus::from_code)
                .unwrap_or(GameStatus::Scheduled),
            period: self.period,
            clock: self.game_clock,
            home: self.home_team.into(),
            away: self.away_team.into(),
            scheduled_time: self
                .game_time_utc
                .and_then(|raw| OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()),
            venue,
        })
    }
}

/// Extract every identifiable game from a scoreboard document.
///
/// Returns `None` when the document has no `scoreboard.games` array at all.
pub(super) fn parse_scoreboard(document: &Value) -> Option<Vec<GameSnapshot>> {
    let games = document.get("scoreboard")?.get("games")?.as_array()?;
    Some(games.iter().filter_map(parse_game).collect())
}

fn parse_game(raw: &Value) -> Option<GameSnapshot> {
    CdnGame::deserialize(raw).ok()?.into_snapshot()
}

/// Keep the `game` object of a per-game document, or the whole document when it has none.
///
/// The envelope carries a fetch timestamp that changes on every request; comparing it would
/// make every poll look like a change.
pub(super) fn game_payload(mut document: Value) -> Value {
    match document.get_mut("game").map(Value::take) {
        Some(game) if !game.is_null() => game,
        _ => document,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) if !text.trim().is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(parsed.and_then(|n| u32::try_from(n).ok()).unwrap_or(0))
}

fn lenient_team<'de, D>(deserializer: D) -> Result<CdnTeam, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(CdnTeam::deserialize(value).unwrap_or_default())
}
