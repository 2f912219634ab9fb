use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::{
    dao::feed::{FeedResult, LiveFeed},
    state::game::GameSnapshot,
};

use super::{
    config::NbaCdnConfig,
    error::{NbaCdnError, NbaCdnResult},
    models::{SCOREBOARD_PATH, box_score_path, game_payload, parse_scoreboard, play_by_play_path},
};

/// [`LiveFeed`] backed by the public NBA live data CDN.
#[derive(Clone)]
pub struct NbaCdnFeed {
    client: Client,
    base_url: Arc<str>,
}

impl NbaCdnFeed {
    /// Build the HTTP client. No request is made until the first fetch.
    pub fn new(config: NbaCdnConfig) -> NbaCdnResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| NbaCdnError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
        })
    }

    async fn get_json(&self, path: &str) -> NbaCdnResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| NbaCdnError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => response
                .json::<Value>()
                .await
                .map_err(|source| NbaCdnError::DecodeResponse {
                    path: path.to_string(),
                    source,
                }),
            other => Err(NbaCdnError::RequestStatus {
                path: path.to_string(),
                status: other,
            }),
        }
    }

    async fn scoreboard(&self) -> NbaCdnResult<Vec<GameSnapshot>> {
        let document = self.get_json(SCOREBOARD_PATH).await?;
        let games = parse_scoreboard(&document).ok_or_else(|| NbaCdnError::MissingField {
            path: SCOREBOARD_PATH.to_string(),
            field: "scoreboard.games",
        })?;
        debug!(games = games.len(), "fetched scoreboard");
        Ok(games)
    }
}

impl LiveFeed for NbaCdnFeed {
    fn fetch_scoreboard(&self) -> BoxFuture<'static, FeedResult<Vec<GameSnapshot>>> {
        let feed = self.clone();
        Box::pin(async move { feed.scoreboard().await.map_err(Into::into) })
    }

    fn fetch_play_by_play(&self, game_id: &str) -> BoxFuture<'static, FeedResult<Value>> {
        let feed = self.clone();
        let path = play_by_play_path(game_id);
        Box::pin(async move {
            let document = feed.get_json(&path).await?;
            Ok(game_payload(document))
        })
    }

    fn fetch_box_score(&self, game_id: &str) -> BoxFuture<'static, FeedResult<Value>> {
        let feed = self.clone();
        let path = box_score_path(game_id);
        Box::pin(async move {
            let document = feed.get_json(&path).await?;
            Ok(game_payload(document))
        })
    }
}
