use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{Instant, sleep},
};

use crate::config::Config;
use crate::print_warning;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteSeries {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteEpisode {
    pub episode_number: u32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RemoteSeries>,
}

#[derive(Debug, Deserialize)]
struct SeasonResponse {
    #[serde(default)]
    episodes: Vec<RemoteEpisode>,
}

/// Look up the title of `episode_number` in a season listing.
pub fn episode_title(episodes: &[RemoteEpisode], episode_number: u32) -> Option<&str> {
    episodes
        .iter()
        .find(|episode| episode.episode_number == episode_number)
        .and_then(|episode| episode.name.as_deref())
        .filter(|name| !name.trim().is_empty())
}

/// Turn a directory-derived series name into a search query.
pub fn normalize_query(name: &str) -> String {
    name.replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-effort TMDB client.
///
/// Lookups never fail: any network, status or decoding problem is reported as
/// a warning and the lookup returns `None`. Requests are spaced at least
/// `Config::request_delay` apart.
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
    request_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        if !config.has_tmdb_credentials() {
            bail!("Set TMDB_API_KEY or TMDB_API_TOKEN to enable TMDB lookups");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.tmdb_api_key.clone(),
            token: config.tmdb_token.clone(),
            request_delay: config.request_delay,
            last_request: Mutex::new(None),
        })
    }

    pub async fn search_series(&self, name: &str) -> Option<RemoteSeries> {
        let query = normalize_query(name);
        match self
            .get::<SearchResponse>("/search/tv", &[("query", query.as_str())])
            .await
        {
            Ok(response) => {
                let series = response.results.into_iter().next();
                if series.is_none() {
                    print_warning!("TMDB has no series matching {:?}", query);
                }
                series
            }
            Err(error) => {
                print_warning!("TMDB series search for {:?} failed: {:#}", query, error);
                None
            }
        }
    }

    pub async fn season_episodes(&self, series_id: i32, season: u32) -> Option<Vec<RemoteEpisode>> {
        match self
            .get::<SeasonResponse>(&format!("/tv/{}/season/{}", series_id, season), &[])
            .await
        {
            Ok(response) if response.episodes.is_empty() => {
                print_warning!("TMDB lists no episodes for series {series_id} season {season}");
                None
            }
            Ok(response) => Some(response.episodes),
            Err(error) => {
                print_warning!(
                    "TMDB season lookup for series {series_id} season {season} failed: {:#}",
                    error
                );
                None
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.wait_for_slot().await;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("api_key", api_key.as_str())]);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        // Errors drop the URL, which carries the API key.
        request
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Request to {path} failed"))?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Request to {path} failed"))?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to decode TMDB response")
    }

    /// Sleep until `request_delay` has passed since the previous request.
    async fn wait_for_slot(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.request_delay {
                sleep(self.request_delay - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}
