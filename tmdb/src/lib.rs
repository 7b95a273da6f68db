use anyhow::Result;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const API_BASE: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const API_KEY_VAR: &str = "TMDB_API_KEY";

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct MovieDetails {
    poster_path: Option<String>,
}

/// Poster lookup against the TMDB metadata API.
///
/// Every failure mode (transport error, timeout, non-success status,
/// unparseable body, absent `poster_path`, missing API key) degrades to
/// `None` instead of propagating. Results (including `None`) are memoized
/// per movie id for the lifetime of the client.
pub struct PosterClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    cache: RwLock<HashMap<u32, Option<String>>>,
}

impl PosterClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE)
    }

    /// Same client pointed at a different API base; [`PosterClient::new`]
    /// uses [`API_BASE`].
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self> {
        if api_key.is_none() {
            tracing::warn!("{API_KEY_VAR} not set; poster lookups are disabled");
        }
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Read the API key from the environment; an empty value counts as
    /// unset.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty()))
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Resolve the full poster image URL for a TMDB movie id, or `None` when
    /// the service has no poster (or cannot be reached).
    pub async fn poster_url(&self, movie_id: u32) -> Option<String> {
        if let Some(hit) = self.cache.read().get(&movie_id) {
            return hit.clone();
        }
        let fetched = self.fetch(movie_id).await;
        self.cache.write().insert(movie_id, fetched.clone());
        fetched
    }

    async fn fetch(&self, movie_id: u32) -> Option<String> {
        let api_key = self.api_key.as_deref()?;
        let url = format!("{}/movie/{movie_id}", self.base_url);
        let resp = match self
            .http
            .get(&url)
            .query(&[("api_key", api_key), ("language", "en-US")])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(movie_id, error = %err, "poster fetch failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::debug!(movie_id, status = %resp.status(), "poster fetch returned non-success");
            return None;
        }
        let body = match resp.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(movie_id, error = %err, "poster body read failed");
                return None;
            }
        };
        poster_from_body(&body)
    }
}

/// Extract the poster URL from a movie-details body; `None` for malformed
/// JSON or an absent/null `poster_path`.
fn poster_from_body(body: &str) -> Option<String> {
    let details: MovieDetails = serde_json::from_str(body).ok()?;
    details.poster_path.map(|path| image_url(&path))
}

/// Fully-qualified image URL for a TMDB `poster_path` value.
pub fn image_url(poster_path: &str) -> String {
    format!("{IMAGE_BASE}{poster_path}")
}
