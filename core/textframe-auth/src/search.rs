//! Authenticated transcript search.
//!
//! The collaborator side of the protocol: obtains auth headers, posts the
//! query and returns the matched positions in seconds. Any failure degrades
//! to an empty result so the caller never has to handle it.

use crate::challenge::ChallengeSigner;
use crate::error::{SearchError, SearchResult};
use reqwest::Client;
use serde_json::Value;
use textframe_types::SearchRequest;
use tracing::{debug, warn};

/// Path of the search endpoint.
pub const SEARCH_PATH: &str = "/search";

/// Length of a YouTube video id.
const VIDEO_ID_LEN: usize = 11;

#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    url: String,
    signer: ChallengeSigner,
}

impl SearchClient {
    pub fn new(http: Client, url: String, signer: ChallengeSigner) -> Self {
        Self { http, url, signer }
    }

    /// Searches a video's transcript. Returns an empty list on any failure.
    pub async fn search(&self, video_id: &str, query: &str) -> Vec<f64> {
        match self.try_search(video_id, query).await {
            Ok(positions) => positions,
            Err(e) => {
                warn!("Error fetching timestamps: {}", e);
                Vec::new()
            }
        }
    }

    /// Searches a video's transcript, reporting failures.
    pub async fn try_search(&self, video_id: &str, query: &str) -> SearchResult<Vec<f64>> {
        let headers = self.signer.build_auth_headers_for_device().await?;
        let body = SearchRequest {
            query: query.to_string(),
            video_id: video_id.to_string(),
        };

        let response = self
            .http
            .post(&self.url)
            .headers(headers.to_header_map()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let values: Vec<Value> = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;
        let positions = parse_positions(&values);
        debug!("Search for {:?} matched {} positions", query, positions.len());
        Ok(positions)
    }
}

/// Converts the server's list of timestamps (strings or numbers, in seconds)
/// to floats. Entries that do not parse to a finite value are dropped.
pub fn parse_positions(values: &[Value]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .collect()
}

/// Extracts a YouTube video id from a watch, short, embed URL or a bare id.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    if is_video_id(url) {
        return Some(url.to_string());
    }

    if let Some((_, query)) = url.split_once('?') {
        let query = query.split('#').next().unwrap_or_default();
        let from_query = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "v")
            .map(|(_, value)| value);
        if let Some(id) = from_query.filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }
    }

    ["youtu.be/", "youtube.com/embed/", "youtube.com/v/", "youtube.com/shorts/"]
        .iter()
        .find_map(|marker| {
            let (_, rest) = url.split_once(marker)?;
            let id = rest.split(['?', '&', '#', '/']).next()?;
            (!id.is_empty()).then(|| id.to_string())
        })
}

fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
