//! Search backends behind the authenticated `/search` action.
//!
//! Ranking is pluggable. The bundled [`TranscriptIndex`] does a plain
//! case-insensitive keyword match over transcripts stored as JSON files.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Answers a query against one video's transcript with the start times, in
/// seconds, of the matching segments.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, video_id: &str, query: &str) -> ApiResult<Vec<String>>;
}

/// One transcript segment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
}

/// Transcripts read from `<dir>/<video_id>.json`, each an array of
/// [`Segment`]s.
#[derive(Debug, Clone)]
pub struct TranscriptIndex {
    dir: PathBuf,
}

impl TranscriptIndex {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load(&self, video_id: &str) -> ApiResult<Vec<Segment>> {
        if !is_safe_video_id(video_id) {
            return Err(ApiError::BadRequest(format!("invalid video id: {video_id:?}")));
        }

        let path = self.dir.join(format!("{video_id}.json"));
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound(format!("no transcript for {video_id}")));
            }
            Err(e) => {
                return Err(ApiError::Backend(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        serde_json::from_slice(&data)
            .map_err(|e| ApiError::Backend(format!("invalid transcript {}: {e}", path.display())))
    }
}

#[async_trait]
impl SearchBackend for TranscriptIndex {
    fn name(&self) -> &'static str {
        "transcript-index"
    }

    async fn search(&self, video_id: &str, query: &str) -> ApiResult<Vec<String>> {
        let segments = self.load(video_id).await?;
        let hits = match_segments(&segments, query);
        debug!(
            "Query {:?} matched {} of {} segments in {}",
            query,
            hits.len(),
            segments.len(),
            video_id
        );
        Ok(hits)
    }
}

/// Returns the start times of segments containing `query`, ignoring case.
pub fn match_segments(segments: &[Segment], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    segments
        .iter()
        .filter(|segment| segment.text.to_lowercase().contains(&needle))
        .map(|segment| segment.start.to_string())
        .collect()
}

fn is_safe_video_id(video_id: &str) -> bool {
    !video_id.is_empty()
        && video_id.len() <= 64
        && video_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
