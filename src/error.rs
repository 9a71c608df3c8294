//! Failure kinds of summary generation.

use llm::error::LLMError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::constants::STATUS_CODE_MATCHER;

static STATUS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(STATUS_CODE_MATCHER).expect("Failed to compile STATUS_CODE_MATCHER regex")
});

/// Failure of a single summary request.
///
/// Every kind renders as `Failed to generate summary: {cause}`, where the cause
/// is the message reported by the provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// The request did not reach the service or the connection failed.
    #[error("Failed to generate summary: {0}")]
    Transport(String),
    /// The credential is missing or was rejected.
    #[error("Failed to generate summary: {0}")]
    Authentication(String),
    /// The service refused the request because of rate limits or quota.
    #[error("Failed to generate summary: {0}")]
    RateLimited(String),
    /// The service answered with something that is not a completion.
    #[error("Failed to generate summary: {0}")]
    MalformedResponse(String),
}

impl SummaryError {
    /// The provider message this error wraps.
    #[must_use]
    pub fn cause(&self) -> &str {
        match self {
            Self::Transport(cause)
            | Self::Authentication(cause)
            | Self::RateLimited(cause)
            | Self::MalformedResponse(cause) => cause,
        }
    }

    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited(_))
    }
}

impl From<LLMError> for SummaryError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::AuthError(cause) => Self::Authentication(cause),
            LLMError::HttpError(cause) => classify(cause, Self::Transport),
            LLMError::ResponseFormatError {
                message,
                raw_response,
            } => {
                let cause = if raw_response.trim().is_empty() {
                    message
                } else {
                    format!("{message}: {}", raw_response.trim())
                };
                classify(cause, Self::MalformedResponse)
            }
            LLMError::JsonError(cause) => Self::MalformedResponse(cause),
            LLMError::ProviderError(cause)
            | LLMError::InvalidRequest(cause)
            | LLMError::Generic(cause) => classify(cause, Self::Transport),
            other => classify(other.to_string(), Self::Transport),
        }
    }
}

/// Picks the kind from a status code and well-known phrases in `cause`,
/// falling back to `fallback`.
///
/// A status code only counts at the start of the message (`"429 Rate limit
/// reached"`) or after the word `status`, so digits inside URLs and ports
/// are ignored.
fn classify(cause: String, fallback: fn(String) -> SummaryError) -> SummaryError {
    let lowered = cause.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));
    let status = STATUS_REGEX
        .captures(&lowered)
        .and_then(|captures| captures.get(1))
        .map(|code| code.as_str());

    if matches!(status, Some("429")) || mentions(&["rate limit", "quota", "too many requests"]) {
        SummaryError::RateLimited(cause)
    } else if matches!(status, Some("401" | "403"))
        || mentions(&["unauthorized", "api key", "authentication"])
    {
        SummaryError::Authentication(cause)
    } else {
        fallback(cause)
    }
}
