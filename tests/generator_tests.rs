use crate::extras::StubLlmProvider;
use llm::error::LLMError;
use sitemap_harvester::{SummaryError, SummaryGenerator};
use spectral::prelude::*;

mod extras;

assert_summaries![
    returns_reply_verbatim:
        content => "Acme Corp sells widgets.",
        reply => "Acme Corp sells widgets to businesses.",
        summary => "Acme Corp sells widgets to businesses.",
    accepts_empty_content:
        content => "",
        reply => "",
        summary => "",
    keeps_surrounding_whitespace:
        content => "Globex builds reactors.",
        reply => "\n  Globex builds reactors for utilities.  \n",
        summary => "\n  Globex builds reactors for utilities.  \n",
];

#[tokio::test]
async fn user_message_embeds_content_in_prompt() {
    let stub = StubLlmProvider::replying("summary");
    let requests = stub.requests();
    let generator = SummaryGenerator::new(Box::new(stub));

    generator
        .generate_summary("Acme Corp sells widgets.")
        .await
        .expect("Expected successful summary.");

    let requests = requests.lock().expect("Stub mutex poisoned");
    assert_that(&requests.len()).is_equal_to(1);
    assert_that(&requests[0]).is_equal_to(vec![
        "Please create a concise summary of this company based on the following content: Acme Corp sells widgets."
            .to_owned(),
    ]);
}

#[tokio::test]
async fn one_request_per_call() {
    let stub = StubLlmProvider::replying("summary");
    let requests = stub.requests();
    let generator = SummaryGenerator::new(Box::new(stub));

    for content in ["first", "second"] {
        generator
            .generate_summary(content)
            .await
            .expect("Expected successful summary.");
    }

    let requests = requests.lock().expect("Stub mutex poisoned");
    assert_that(&requests.len()).is_equal_to(2);
    assert_that(&requests[1][0].ends_with(": second")).is_true();
}

#[tokio::test]
async fn wraps_rate_limit_failure() {
    let generator = SummaryGenerator::new(Box::new(StubLlmProvider::failing(
        LLMError::ProviderError,
        "rate limit exceeded",
    )));

    let error = generator
        .generate_summary("Acme Corp sells widgets.")
        .await
        .expect_err("Expected failure.");

    assert_that(&error.to_string())
        .is_equal_to("Failed to generate summary: rate limit exceeded".to_owned());
    assert_that(&error).is_equal_to(SummaryError::RateLimited("rate limit exceeded".to_owned()));
}

#[tokio::test]
async fn wraps_transport_failure() {
    let generator = SummaryGenerator::new(Box::new(StubLlmProvider::failing(
        LLMError::HttpError,
        "connection reset by peer",
    )));

    let error = generator
        .generate_summary("content")
        .await
        .expect_err("Expected failure.");

    assert_that(&error.to_string())
        .is_equal_to("Failed to generate summary: connection reset by peer".to_owned());
    assert_that(&error.cause()).is_equal_to("connection reset by peer");
    assert_that(&matches!(error, SummaryError::Transport(_))).is_true();
}
