//! HTTP client for the annotation server

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use resonote_common::{
    AnnotationPayload, AnnotationRecord, SaveAnnotationResponse, TagVocabulary, Track,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("resonote-annotate/", env!("CARGO_PKG_VERSION"));

/// Backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Operations the annotation session needs from the server
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    /// `GET /api/tags`
    async fn fetch_tags(&self) -> Result<TagVocabulary, BackendError>;

    /// `GET /api/tracks`
    async fn fetch_tracks(&self) -> Result<Vec<Track>, BackendError>;

    /// `POST /api/annotate`
    async fn save_annotation(&self, payload: &AnnotationPayload) -> Result<(), BackendError>;

    /// `GET /api/annotation/:trackId`; `None` when nothing is stored
    async fn fetch_annotation(
        &self,
        track_id: &str,
    ) -> Result<Option<AnnotationRecord>, BackendError>;
}

/// Fetch vocabulary and corpus concurrently
pub async fn fetch_catalog<B: AnnotationBackend + ?Sized>(
    backend: &B,
) -> Result<(TagVocabulary, Vec<Track>), BackendError> {
    tokio::try_join!(backend.fetch_tags(), backend.fetch_tracks())
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed [`AnnotationBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let parsed =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with path segments appended; segments are percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(url = %url, "GET");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        decode(response).await
    }
}

/// Map non-success statuses to [`BackendError::Status`] and parse the body
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(status_error(status, &text));
    }

    response
        .json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}

fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());
    BackendError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl AnnotationBackend for HttpBackend {
    async fn fetch_tags(&self) -> Result<TagVocabulary, BackendError> {
        self.get_json(&["api", "tags"]).await
    }

    async fn fetch_tracks(&self) -> Result<Vec<Track>, BackendError> {
        let document: serde_json::Value = self.get_json(&["api", "tracks"]).await?;
        Track::parse_corpus(document).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn save_annotation(&self, payload: &AnnotationPayload) -> Result<(), BackendError> {
        let url = self.endpoint(&["api", "annotate"])?;
        tracing::debug!(url = %url, track_id = %payload.track_id, "POST");

        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let ack: SaveAnnotationResponse = decode(response).await?;
        if !ack.ok {
            return Err(BackendError::Parse("save was not acknowledged".to_string()));
        }
        Ok(())
    }

    async fn fetch_annotation(
        &self,
        track_id: &str,
    ) -> Result<Option<AnnotationRecord>, BackendError> {
        self.get_json(&["api", "annotation", track_id]).await
    }
}
