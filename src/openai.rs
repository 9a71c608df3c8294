//! The openai module sends chat-completion requests to an OpenAI-compatible
//! endpoint (`POST {base_url}/chat/completions`).

use llm::chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, Tool};
use llm::error::LLMError;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::SummaryConfig;
use crate::constants::DEFAULT_BASE_URL;

/// Chat provider speaking the OpenAI chat-completions protocol.
///
/// The system prompt of the config is sent as the first message of every
/// request, ahead of the caller's messages.
pub struct OpenAiChatProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

impl OpenAiChatProvider {
    /// Builds a provider from `config`. No request is made here.
    #[must_use]
    pub fn new(config: &SummaryConfig) -> Self {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
        }
    }

    /// URL the requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatCompletionRequest<'a> {
        let system = RequestMessage {
            role: "system",
            content: &self.system_prompt,
        };
        let turns = messages.iter().map(|message| RequestMessage {
            role: if matches!(message.role, ChatRole::Assistant) {
                "assistant"
            } else {
                "user"
            },
            content: &message.content,
        });

        ChatCompletionRequest {
            model: &self.model,
            messages: std::iter::once(system).chain(turns).collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, LLMError> {
        let body = self.request_body(messages);
        trace!("Chat completion request: {body:?}");

        let request = self.client.post(&self.endpoint).json(&body);
        let request = match &self.api_key {
            Some(api_key) => request.bearer_auth(api_key),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|err| LLMError::HttpError(err.to_string()))?;
        let status = response.status();
        let raw_response = response
            .text()
            .await
            .map_err(|err| LLMError::HttpError(err.to_string()))?;
        debug!("Chat completion answered with {status}");

        if !status.is_success() {
            return Err(status_error(status, &raw_response));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&raw_response).map_err(|err| LLMError::ResponseFormatError {
                message: format!("Failed to decode chat completion: {err}"),
                raw_response: raw_response.clone(),
            })?;

        Ok(ChatCompletion {
            text: completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
        })
    }
}

/// Maps a non-success status to the provider error, keeping the service's
/// own message: `"{code} {message}"`.
fn status_error(status: reqwest::StatusCode, raw_response: &str) -> LLMError {
    let detail = serde_json::from_str::<ErrorResponse>(raw_response)
        .map(|response| response.error.message)
        .unwrap_or_else(|_| raw_response.trim().to_owned());
    let cause = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{} {detail}", status.as_u16())
    };

    match status.as_u16() {
        401 | 403 => LLMError::AuthError(cause),
        429 => LLMError::ProviderError(cause),
        _ => LLMError::HttpError(cause),
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(self.complete(messages).await?))
    }

    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        if tools.is_some_and(|tools| !tools.is_empty()) {
            return Err(LLMError::InvalidRequest(
                "Tools are not supported by the summary provider".to_owned(),
            ));
        }
        self.chat(messages).await
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Text of the first completion choice.
#[derive(Debug)]
struct ChatCompletion {
    text: Option<String>,
}

impl ChatResponse for ChatCompletion {
    fn text(&self) -> Option<String> {
        self.text.clone()
    }

    fn tool_calls(&self) -> Option<Vec<llm::ToolCall>> {
        None
    }

    fn thinking(&self) -> Option<String> {
        None
    }

    fn usage(&self) -> Option<llm::chat::Usage> {
        None
    }
}

impl std::fmt::Display for ChatCompletion {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.text.as_deref().unwrap_or_default())
    }
}
