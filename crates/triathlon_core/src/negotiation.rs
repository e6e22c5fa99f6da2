//! crates/triathlon_core/src/negotiation.rs
//!
//! Request shaping for OpenAI-compatible endpoints whose deployments disagree
//! about which parameters they accept. A call that is rejected for a known
//! parameter reason is retried with that parameter adjusted; every adjustment
//! is applied at most once, so the ladder always terminates.

use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Name under which the output-size limit is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimitParam {
    /// Required by newer model families.
    MaxCompletionTokens,
    MaxTokens,
}

impl TokenLimitParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenLimitParam::MaxCompletionTokens => "max_completion_tokens",
            TokenLimitParam::MaxTokens => "max_tokens",
        }
    }

    fn alternate(self) -> Self {
        match self {
            TokenLimitParam::MaxCompletionTokens => TokenLimitParam::MaxTokens,
            TokenLimitParam::MaxTokens => TokenLimitParam::MaxCompletionTokens,
        }
    }
}

/// The negotiable part of a chat-completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallParameters {
    pub token_param: TokenLimitParam,
    pub max_output_tokens: u32,
    pub temperature: Option<f32>,
    pub json_object: bool,
}

impl CallParameters {
    /// Starts from the preferred token parameter name.
    pub fn new(max_output_tokens: u32, temperature: Option<f32>, json_object: bool) -> Self {
        Self {
            token_param: TokenLimitParam::MaxCompletionTokens,
            max_output_tokens,
            temperature,
            json_object,
        }
    }
}

/// Adjustments in the order they are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    DropTemperature,
    DropJsonMode,
    SwapTokenParam,
}

impl Fallback {
    const ORDER: [Fallback; 3] = [
        Fallback::DropTemperature,
        Fallback::DropJsonMode,
        Fallback::SwapTokenParam,
    ];

    fn applies(self, message: &str, params: &CallParameters) -> bool {
        match self {
            Fallback::DropTemperature => {
                params.temperature.is_some()
                    && message.contains("Unsupported value")
                    && message.contains("temperature")
            }
            Fallback::DropJsonMode => {
                params.json_object
                    && (message.contains("Unsupported parameter")
                        || message.contains("Unrecognized request argument"))
                    && message.contains("response_format")
            }
            Fallback::SwapTokenParam => {
                message.contains("Unsupported parameter")
                    && message.contains(params.token_param.as_str())
            }
        }
    }

    fn apply(self, params: &mut CallParameters) {
        match self {
            Fallback::DropTemperature => params.temperature = None,
            Fallback::DropJsonMode => params.json_object = false,
            Fallback::SwapTokenParam => params.token_param = params.token_param.alternate(),
        }
    }
}

/// True when a provider error message reads as a rejected request parameter.
pub fn is_parameter_rejection(message: &str) -> bool {
    message.contains("Unsupported parameter")
        || message.contains("Unsupported value")
        || message.contains("Unrecognized request argument")
}

/// Runs `call` with `initial`, retrying with adjusted parameters while the
/// provider rejects a parameter that has not yet been adjusted.
///
/// When no unused adjustment matches a failure, the error of the first call
/// is returned, so the caller sees the rejection that started the ladder.
pub async fn call_with_fallbacks<T, E, F, Fut>(initial: CallParameters, mut call: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(CallParameters) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut params = initial;
    let mut used: Vec<Fallback> = Vec::with_capacity(Fallback::ORDER.len());
    let mut first_err: Option<E> = None;

    loop {
        let err = match call(params).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let message = err.to_string();
        let next = Fallback::ORDER
            .into_iter()
            .find(|f| !used.contains(f) && f.applies(&message, &params));

        match next {
            Some(fallback) => {
                warn!(?fallback, error = %message, "provider rejected a parameter, retrying");
                fallback.apply(&mut params);
                used.push(fallback);
                first_err.get_or_insert(err);
            }
            None => return Err(first_err.unwrap_or(err)),
        }
    }
}
