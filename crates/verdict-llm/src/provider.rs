//! Model capability trait

use crate::structured::{self, ModelOutput};
use crate::{CompletionRequest, CompletionResponse, ModelError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// A language model reachable behind a prompt-in, response-out call
///
/// Implementations map transport failures onto [`ModelError::RateLimited`]
/// or [`ModelError::Unavailable`]; callers decide what each means for a run.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name (e.g. "openai", "scripted")
    fn name(&self) -> &str;

    /// Complete and classify the answer as structured JSON or free text
    ///
    /// When the request carries a response schema the answer must contain
    /// a JSON document; otherwise it is returned as text.
    async fn complete_output(&self, request: CompletionRequest) -> Result<ModelOutput> {
        let wants_json = request.response_schema.is_some();
        let response = self.complete(request).await?;
        let text = response.message.text().unwrap_or_default();
        if wants_json {
            Ok(ModelOutput::Structured(structured::extract_json(text)?))
        } else {
            Ok(ModelOutput::Text(text.to_string()))
        }
    }
}

/// Complete and deserialize the JSON answer into `T`
pub async fn complete_json<T: DeserializeOwned>(
    provider: &dyn ModelProvider,
    request: CompletionRequest,
) -> Result<T> {
    match provider.complete_output(request).await? {
        ModelOutput::Structured(value) => {
            serde_json::from_value(value).map_err(ModelError::SerializationError)
        }
        ModelOutput::Text(text) => structured::parse_json(&text),
    }
}
