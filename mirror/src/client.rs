//! HTTP client for the remote game service.
//!
//! Two read-only endpoints: the archive listing, and per-archive games with
//! conditional-GET support. No retry policy lives here; that is the
//! store's concern.

use crate::error::{MirrorError, MirrorResult};
use crate::model::Game;
use crate::traits::RemoteArchives;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde::Deserialize;

const API_HOST: &str = "https://api.chess.com";

/// Outcome of a conditional archive fetch.
#[derive(Debug, Clone)]
pub struct ArchiveFetch {
    /// False when the remote reported "not modified"; `games` is then empty
    /// and `etag` echoes the known validator.
    pub changed: bool,
    pub etag: String,
    pub games: Vec<Game>,
}

pub struct ArchiveClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ArchiveListing {
    archives: Vec<String>,
}

#[derive(Deserialize)]
struct ArchiveBody {
    games: Vec<Game>,
}

impl ArchiveClient {
    pub fn new() -> Self {
        Self::with_base_url(API_HOST)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for ArchiveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteArchives for ArchiveClient {
    fn list_archives(&self, user: &str) -> MirrorResult<Vec<String>> {
        tracing::info!("fetching available archives for {}", user);

        let response = self
            .http
            .get(format!("{}/pub/player/{}/games/archives", self.base_url, user))
            .send()?;
        if !response.status().is_success() {
            return Err(MirrorError::UnexpectedStatus(response.status()));
        }

        let listing: ArchiveListing = response.json()?;

        // Keep URL paths only; a malformed entry is skipped, not fatal.
        let mut archives = Vec::with_capacity(listing.archives.len());
        for entry in listing.archives {
            match reqwest::Url::parse(&entry) {
                Ok(url) => archives.push(url.path().to_string()),
                Err(err) => {
                    tracing::warn!("skipping archive with invalid URL {}: {}", entry, err);
                }
            }
        }

        Ok(archives)
    }

    fn fetch_archive(&self, id: &str, known_etag: Option<&str>) -> MirrorResult<ArchiveFetch> {
        tracing::info!("fetching archive {}", id);

        let mut request = self.http.get(format!("{}{}", self.base_url, id));
        // An empty validator is "no validator"; never send If-None-Match: "".
        if let Some(etag) = known_etag.filter(|e| !e.is_empty()) {
            tracing::info!("using validator {} for {}", etag, id);
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send()?;

        if response.status() == StatusCode::NOT_MODIFIED {
            tracing::info!("cached data for {} is up to date", id);
            return Ok(ArchiveFetch {
                changed: false,
                etag: known_etag.unwrap_or_default().to_string(),
                games: Vec::new(),
            });
        }
        if !response.status().is_success() {
            return Err(MirrorError::UnexpectedStatus(response.status()));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body: ArchiveBody = response.json()?;
        let total = body.games.len();

        // Non-standard variants never make it past this point.
        let games: Vec<Game> = body
            .games
            .into_iter()
            .filter(|game| {
                if game.is_standard() {
                    true
                } else {
                    tracing::debug!(
                        "skipped non-standard game {} ({}) in {}",
                        game.url,
                        game.rules,
                        id
                    );
                    false
                }
            })
            .collect();

        tracing::info!(
            "fetched archive {} (etag {:?}, {} of {} games kept)",
            id,
            etag,
            games.len(),
            total
        );

        Ok(ArchiveFetch {
            changed: true,
            etag,
            games,
        })
    }
}
