//! The config module holds the explicit configuration used to build a
//! [`SummaryGenerator`](crate::generator::SummaryGenerator).

use log::{debug, warn};

use crate::constants::{
    API_KEY_ENV_NAME, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, SYSTEM_PROMPT,
};

/// Settings of the chat-completion endpoint used for company summaries.
///
/// The credential is supplied by the caller; nothing here reads process state
/// except [`SummaryConfig::from_env`].
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryConfig {
    /// Bearer credential of the OpenAI API.
    pub api_key: Option<String>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// System-role instruction fixing the assistant's persona.
    pub system_prompt: String,
    /// Base URL of the API, `https://api.openai.com/v1` when unset; requests
    /// go to `{base_url}/chat/completions`.
    pub base_url: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: SYSTEM_PROMPT.to_owned(),
            base_url: None,
        }
    }
}

impl SummaryConfig {
    /// Default configuration with the credential taken from `OPENAI_API_KEY`.
    ///
    /// A missing variable is not an error here: the request is rejected later
    /// by the provider.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = match std::env::var(API_KEY_ENV_NAME) {
            Ok(api_key) => {
                debug!("{API_KEY_ENV_NAME} is provided");
                Some(api_key)
            }
            Err(err) => {
                warn!("{err} while reading {API_KEY_ENV_NAME}");
                None
            }
        };

        Self {
            api_key,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}
