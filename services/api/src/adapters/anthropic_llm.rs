//! services/api/src/adapters/anthropic_llm.rs
//!
//! This module contains the adapter for the Anthropic Messages API.
//! It implements the `TextGenerationService` port from the `core` crate.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use triathlon_core::ports::{
    Completion, CompletionRequest, FinishReason, PortError, PortResult, TextGenerationService,
};

const API_VERSION: &str = "2023-06-01";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn finish_reason(stop_reason: &str) -> FinishReason {
    match stop_reason {
        "max_tokens" => FinishReason::Length,
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "refusal" => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_string()),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` against Anthropic's Messages API.
#[derive(Clone)]
pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(client: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for AnthropicAdapter {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    /// Sends one Messages call. JSON mode has no counterpart here, so the
    /// prompt alone asks for JSON.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<Completion> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.user,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Provider(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PortError::Provider(e.to_string()))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ErrorResponse>(&text) {
                return Err(PortError::Provider(error.error.message));
            }
            return Err(PortError::Provider(format!("HTTP {}: {}", status, text)));
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| PortError::Unexpected(e.to_string()))?;

        let content = parsed
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let finish_reason = parsed.stop_reason.as_deref().map(finish_reason);
        debug!(chars = content.len(), ?finish_reason, "anthropic completion received");

        Ok(Completion {
            text: content,
            finish_reason,
        })
    }
}
