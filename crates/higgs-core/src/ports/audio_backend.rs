//! Request/response facade over the worker.

use async_trait::async_trait;

use crate::domain::{
    ClearHistoryResponse, GenerationRequest, GenerationResponse, HistoryResponse,
    VoiceCloneRequest, VoiceCloneResponse, VoiceListResponse,
};

/// Port for the worker's audio operations.
///
/// Every call resolves to a value. Implementations convert connection errors,
/// timeouts and non-2xx answers into a response with `succeeded == false` and a
/// human-readable message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Synthesize speech for `request.text`.
    async fn generate_audio(&self, request: GenerationRequest) -> GenerationResponse;

    /// Register a reference recording as a new voice.
    async fn clone_voice(&self, request: VoiceCloneRequest) -> VoiceCloneResponse;

    /// Identifiers of the voices known to the worker.
    async fn list_voices(&self) -> VoiceListResponse;

    /// The worker's own conversation log.
    async fn get_history(&self) -> HistoryResponse;

    /// Drop the worker's conversation log.
    async fn clear_history(&self) -> ClearHistoryResponse;
}
