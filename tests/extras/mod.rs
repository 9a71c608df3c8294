#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use llm::{
    chat::{ChatMessage, ChatProvider, ChatResponse, Tool},
    error::LLMError,
};

/// Declares one test per scenario: the stub replies with `reply` and the
/// generated summary must equal `summary`.
#[macro_export]
macro_rules! assert_summaries {
    (
        $(
            $test_name:ident : content => $content:expr, reply => $reply:expr, summary => $summary:expr
        ),+ $(,)?
    ) => {
        $(
            #[tokio::test]
            async fn $test_name() {
                let generator = sitemap_harvester::SummaryGenerator::new(Box::new(
                    StubLlmProvider::replying($reply),
                ));
                let result = generator
                    .generate_summary($content)
                    .await
                    .expect("Expected successful summary.");

                assert_that(&result).is_equal_to($summary.to_owned());
            }
        )+
    }
}

enum Reply {
    Text(String),
    Error(fn(String) -> LLMError, String),
}

/// Chat provider answering every request with a canned reply and recording
/// the content of the messages it received.
pub(crate) struct StubLlmProvider {
    reply: Reply,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl StubLlmProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Reply::Text(text.to_owned()),
            requests: Arc::default(),
        }
    }

    pub fn failing(error: fn(String) -> LLMError, message: &str) -> Self {
        Self {
            reply: Reply::Error(error, message.to_owned()),
            requests: Arc::default(),
        }
    }

    /// Handle to the recorded requests, usable after the stub is boxed.
    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.requests)
    }
}

#[derive(Debug)]
struct StringResponse(String);

impl ChatResponse for StringResponse {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
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

impl std::fmt::Display for StringResponse {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl ChatProvider for StubLlmProvider {
    fn chat<'life0, 'life1, 'async_trait>(
        &'life0 self,
        messages: &'life1 [ChatMessage],
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("Stub mutex poisoned")
                .push(messages.iter().map(|message| message.content.clone()).collect());

            match &self.reply {
                Reply::Text(text) => {
                    Ok(Box::new(StringResponse(text.clone())) as Box<dyn ChatResponse>)
                }
                Reply::Error(error, message) => Err(error(message.clone())),
            }
        })
    }

    fn chat_with_tools<'life0, 'life1, 'life2, 'async_trait>(
        &'life0 self,
        _messages: &'life1 [ChatMessage],
        _tools: Option<&'life2 [Tool]>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        'life2: 'async_trait,
        Self: 'async_trait,
    {
        panic!()
    }
}
