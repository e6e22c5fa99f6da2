//! services/api/src/adapters/azure_llm.rs
//!
//! This module contains the adapter for Azure OpenAI chat deployments.
//! It implements the `TextGenerationService` port from the `core` crate and
//! negotiates request parameters the deployment refuses.

use async_openai::{
    config::AzureConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FinishReason as OpenAiFinishReason, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;
use triathlon_core::negotiation::{
    call_with_fallbacks, is_parameter_rejection, CallParameters, TokenLimitParam,
};
use triathlon_core::ports::{
    Completion, CompletionRequest, FinishReason, PortError, PortResult, TextGenerationService,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an Azure OpenAI deployment.
#[derive(Clone)]
pub struct AzureOpenAiAdapter {
    client: Client<AzureConfig>,
    deployment: String,
}

impl AzureOpenAiAdapter {
    /// Creates a new `AzureOpenAiAdapter`.
    pub fn new(client: Client<AzureConfig>, deployment: String) -> Self {
        Self { client, deployment }
    }

    /// Builds the client for one deployment.
    pub fn client_for(
        endpoint: &str,
        api_key: &str,
        deployment: &str,
        api_version: &str,
    ) -> Client<AzureConfig> {
        let config = AzureConfig::new()
            .with_api_base(endpoint.trim_end_matches('/'))
            .with_api_key(api_key)
            .with_deployment_id(deployment)
            .with_api_version(api_version);
        Client::with_config(config)
    }

    async fn send(
        &self,
        messages: &[ChatCompletionRequestMessage],
        params: CallParameters,
    ) -> Result<CreateChatCompletionResponse, OpenAIError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.deployment).messages(messages.to_vec());

        match params.token_param {
            TokenLimitParam::MaxCompletionTokens => {
                args.max_completion_tokens(params.max_output_tokens);
            }
            TokenLimitParam::MaxTokens => {
                #[allow(deprecated)]
                args.max_tokens(params.max_output_tokens);
            }
        }
        if let Some(temperature) = params.temperature {
            args.temperature(temperature);
        }
        if params.json_object {
            args.response_format(ResponseFormat::JsonObject);
        }

        self.client.chat().create(args.build()?).await
    }
}

fn finish_reason(reason: OpenAiFinishReason) -> FinishReason {
    match reason {
        OpenAiFinishReason::Stop => FinishReason::Stop,
        OpenAiFinishReason::Length => FinishReason::Length,
        OpenAiFinishReason::ContentFilter => FinishReason::ContentFilter,
        other => FinishReason::Other(format!("{:?}", other).to_lowercase()),
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for AzureOpenAiAdapter {
    fn provider_name(&self) -> &str {
        "azure_ai"
    }

    async fn complete(&self, request: &CompletionRequest) -> PortResult<Completion> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let initial = CallParameters::new(
            request.max_output_tokens,
            request.temperature,
            request.json_object,
        );

        let response = call_with_fallbacks(initial, |params| self.send(&messages, params))
            .await
            .map_err(|e: OpenAIError| {
                let message = e.to_string();
                if is_parameter_rejection(&message) {
                    PortError::InvalidParameter(message)
                } else {
                    PortError::Provider(message)
                }
            })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PortError::Provider("Chat completion returned no choices.".to_string())
        })?;
        let text = choice.message.content.unwrap_or_default();
        let finish_reason = choice.finish_reason.map(finish_reason);
        debug!(chars = text.len(), ?finish_reason, "azure completion received");

        Ok(Completion {
            text,
            finish_reason,
        })
    }
}
