//! The generator module turns free text about a company into a concise
//! summary using a chat-completion model.

use llm::chat::{ChatMessage, ChatProvider};
use log::debug;

use crate::config::SummaryConfig;
use crate::constants::USER_PROMPT_PREFIX;
use crate::error::SummaryError;
use crate::openai::OpenAiChatProvider;

/// Issues one chat-completion request per summary.
///
/// The provider is built once and shared by all calls, so a generator can be
/// used from concurrent tasks.
pub struct SummaryGenerator {
    provider: Box<dyn ChatProvider>,
}

impl SummaryGenerator {
    /// Wraps an already configured chat provider.
    pub fn new(provider: Box<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Builds the OpenAI chat-completions provider described by `config`.
    ///
    /// A missing credential is not checked here; the service rejects the
    /// request instead.
    #[must_use]
    pub fn from_config(config: &SummaryConfig) -> Self {
        let provider = OpenAiChatProvider::new(config);
        debug!(
            "Summary provider ready: {} with model {}, max_tokens {}, temperature {}",
            provider.endpoint(),
            config.model,
            config.max_tokens,
            config.temperature
        );
        Self::new(Box::new(provider))
    }

    /// Generates a summary of `content`.
    ///
    /// The reply of the first completion choice is returned verbatim. An
    /// empty string is returned when the reply carries no text.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] wrapping the provider failure.
    pub async fn generate_summary(&self, content: &str) -> Result<String, SummaryError> {
        let messages = build_messages(content);

        debug!("Requesting summary of {} bytes of content", content.len());
        let response = self.provider.chat(&messages).await?;

        Ok(response.text().unwrap_or_default())
    }
}

/// Builds the user turn of a summary request. The system instruction is
/// added by the provider from its configuration.
#[must_use]
pub fn build_messages(content: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user()
            .content(format!("{USER_PROMPT_PREFIX}{content}"))
            .build(),
    ]
}
