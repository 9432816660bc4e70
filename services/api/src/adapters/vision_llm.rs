//! services/api/src/adapters/vision_llm.rs
//!
//! This module contains the adapter for the multimodal vision LLM.
//! It implements the `VisionAnalysisService` port from the `core` crate.
//! The model is offered a web search tool so it can ground the references
//! section of its report; whether it uses it is up to the provider.

use std::path::Path;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::responses::{
        CreateResponseArgs, InputContent, InputImageArgs, InputItem, InputMessageArgs,
        InputParam, InputRole, InputTextContent, Item, MessageItem, Tool, WebSearchTool,
    },
    Client,
};
use async_trait::async_trait;
use base64::Engine;
use med_imaging_core::ports::{AnalysisError, VisionAnalysisService};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VisionAnalysisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiVisionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiVisionAdapter {
    /// Creates a new `OpenAiVisionAdapter`. `timeout` bounds each remote
    /// call so a hung provider cannot stall the request forever.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

/// Maps a provider error onto the core taxonomy: throttling signals become
/// `RateLimited` (retryable), everything else `Remote` (terminal).
fn classify(message: &str, type_hint: Option<&str>) -> AnalysisError {
    let looks_throttled = |s: &str| {
        let s = s.to_ascii_lowercase();
        s.contains("rate limit") || s.contains("rate_limit") || s.contains("429")
    };
    if type_hint.is_some_and(looks_throttled) || looks_throttled(message) {
        AnalysisError::RateLimited
    } else {
        AnalysisError::Remote(message.to_string())
    }
}

fn map_openai_error(err: OpenAIError) -> AnalysisError {
    match &err {
        OpenAIError::ApiError(api) => classify(&api.message, api.r#type.as_deref()),
        other => classify(&other.to_string(), None),
    }
}

//=========================================================================================
// `VisionAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VisionAnalysisService for OpenAiVisionAdapter {
    /// Sends the diagnostic prompt plus the staged image to the Responses
    /// API and returns the raw markdown text.
    async fn analyze_image(
        &self,
        prompt: &str,
        attachment: &Path,
    ) -> Result<String, AnalysisError> {
        let png_bytes = tokio::fs::read(attachment)
            .await
            .map_err(|e| AnalysisError::Remote(format!("could not read staged image: {e}")))?;
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png_bytes)
        );

        let message = InputMessageArgs::default()
            .role(InputRole::User)
            .content(vec![
                InputContent::InputText(InputTextContent {
                    text: prompt.to_string(),
                }),
                InputContent::InputImage(
                    InputImageArgs::default()
                        .image_url(data_url)
                        .build()
                        .map_err(|e| AnalysisError::Remote(e.to_string()))?,
                ),
            ])
            .build()
            .map_err(|e| AnalysisError::Remote(e.to_string()))?;

        // Build the request using the Responses API with the web search tool.
        let request = CreateResponseArgs::default()
            .model(&self.model)
            .input(InputParam::Items(vec![InputItem::Item(Item::Message(
                MessageItem::Input(message),
            ))]))
            .tools(vec![Tool::WebSearch(WebSearchTool::default())])
            .build()
            .map_err(|e| AnalysisError::Remote(e.to_string()))?;

        debug!(model = %self.model, "sending image analysis request");

        let responses = self.client.responses();
        let call = responses.create(request);
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AnalysisError::Remote(format!(
                    "remote analysis timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(map_openai_error)?;

        // Extract text from the response output.
        let text = response.output_text().unwrap_or_default();
        if text.is_empty() {
            return Err(AnalysisError::Remote(
                "Vision LLM response contained no text content.".to_string(),
            ));
        }
        Ok(text)
    }
}
