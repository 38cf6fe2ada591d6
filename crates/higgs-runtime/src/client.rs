//! HTTP client for the worker API.
//!
//! `WorkerClient` exposes typed `Result` calls for each endpoint; its
//! `AudioBackend` impl folds every failure into a failed response value so
//! callers never see transport errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use higgs_core::{
    AudioBackend, ClearHistoryResponse, GenerationRequest, GenerationResponse, HistoryEntry,
    HistoryResponse, VoiceCloneRequest, VoiceCloneResponse, VoiceListResponse,
};

/// Per-request timeout for worker calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WorkerClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VoicesBody {
    voices: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryBody {
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// Typed client for one worker instance.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    http: reqwest::Client,
    base_url: String,
}

impl WorkerClient {
    /// Client with its own connection pool and the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, WorkerClientError> {
        let http = build_http_client(DEFAULT_REQUEST_TIMEOUT)?;
        Ok(Self::with_http(http, base_url))
    }

    /// Client sharing an existing connection pool.
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /generate`
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, WorkerClientError> {
        debug!(voice = ?request.voice, chars = request.text.len(), "POST /generate");
        let response = self.http.post(self.url("/generate")).json(request).send().await?;
        decode(response).await
    }

    /// `POST /clone-voice` as multipart form.
    pub async fn clone_voice(
        &self,
        request: &VoiceCloneRequest,
    ) -> Result<VoiceCloneResponse, WorkerClientError> {
        let bytes = tokio::fs::read(&request.audio_file)
            .await
            .map_err(|source| WorkerClientError::ReadFile {
                path: request.audio_file.clone(),
                source,
            })?;

        let file_name = request
            .audio_file
            .file_name()
            .map_or_else(|| "audio".to_string(), |n| n.to_string_lossy().into_owned());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(audio_mime(&request.audio_file))?;

        let form = Form::new()
            .part("audio_file", part)
            .text("text", request.text.clone())
            .text("name", request.name.clone());

        debug!(name = %request.name, "POST /clone-voice");
        let response = self
            .http
            .post(self.url("/clone-voice"))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /voices`
    pub async fn voices(&self) -> Result<Vec<String>, WorkerClientError> {
        let response = self.http.get(self.url("/voices")).send().await?;
        let body: VoicesBody = decode(response).await?;
        Ok(body.voices)
    }

    /// `GET /history`
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, WorkerClientError> {
        let response = self.http.get(self.url("/history")).send().await?;
        let body: HistoryBody = decode(response).await?;
        Ok(body.history)
    }

    /// `DELETE /history`
    pub async fn clear_history(&self) -> Result<(), WorkerClientError> {
        let response = self.http.delete(self.url("/history")).send().await?;
        check_status(response).await.map(|_| ())
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, WorkerClientError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn audio_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WorkerClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.detail))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                body
            }
        });

    Err(WorkerClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, WorkerClientError> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| WorkerClientError::Decode(e.to_string()))
}

#[async_trait]
impl AudioBackend for WorkerClient {
    async fn generate_audio(&self, request: GenerationRequest) -> GenerationResponse {
        self.generate(&request).await.unwrap_or_else(|e| {
            warn!(error = %e, "Audio generation request failed");
            GenerationResponse::failed(e.to_string())
        })
    }

    async fn clone_voice(&self, request: VoiceCloneRequest) -> VoiceCloneResponse {
        Self::clone_voice(self, &request).await.unwrap_or_else(|e| {
            warn!(error = %e, "Voice clone request failed");
            VoiceCloneResponse::failed(e.to_string())
        })
    }

    async fn list_voices(&self) -> VoiceListResponse {
        match self.voices().await {
            Ok(voices) => VoiceListResponse::ok(voices),
            Err(e) => {
                warn!(error = %e, "Voice list request failed");
                VoiceListResponse::failed(e.to_string())
            }
        }
    }

    async fn get_history(&self) -> HistoryResponse {
        match self.history().await {
            Ok(entries) => HistoryResponse::ok(entries),
            Err(e) => {
                warn!(error = %e, "History request failed");
                HistoryResponse::failed(e.to_string())
            }
        }
    }

    async fn clear_history(&self) -> ClearHistoryResponse {
        match Self::clear_history(self).await {
            Ok(()) => ClearHistoryResponse::ok(),
            Err(e) => {
                warn!(error = %e, "Clear history request failed");
                ClearHistoryResponse::failed(e.to_string())
            }
        }
    }
}
