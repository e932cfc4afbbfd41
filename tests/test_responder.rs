//! End-to-end responder behaviour against scripted offline providers.
//!
//! Each test drives the full respond path: prompt composition, the
//! structured attempt, and (where scripted) the plain-text fallback.

use learnix_responder::llm::providers::dummy::DummyProvider;
use learnix_responder::llm::{LlmProvider, ProviderError};
use learnix_responder::responder::Responder;

fn responder_with(provider: DummyProvider) -> Responder {
    // A missing prompts dir exercises the compiled-in template path.
    Responder::new(LlmProvider::Dummy(provider), "/nonexistent/prompts-dir")
}

#[tokio::test]
async fn valid_json_passes_through_exactly() {
    let r = responder_with(DummyProvider::scripted([r#"{"response": "R", "summary": "S"}"#]));
    let reply = r.respond("question", "").await.unwrap();
    assert_eq!(reply.answer, "R");
    assert_eq!(reply.summary, "S");
}

#[tokio::test]
async fn json_missing_summary_gets_default() {
    let r = responder_with(DummyProvider::scripted([r#"{"response": "R"}"#]));
    let reply = r.respond("question", "").await.unwrap();
    assert_eq!(reply.answer, "R");
    assert_eq!(reply.summary, "Unable to generate summary.");
}

#[tokio::test]
async fn malformed_json_falls_back_to_markers() {
    let r = responder_with(DummyProvider::scripted([
        "this is not json",
        "RESPONSE:\nHello\n\nSUMMARY:\nDiscussed X",
    ]));
    let reply = r.respond("question", "").await.unwrap();
    assert_eq!(reply.answer, "Hello");
    assert_eq!(reply.summary, "Discussed X");
}

#[tokio::test]
async fn fallback_without_marker_gets_placeholder_summary() {
    let r = responder_with(DummyProvider::scripted(["not json", "Just an answer"]));
    let reply = r.respond("question", "").await.unwrap();
    assert_eq!(reply.answer, "Just an answer");
    assert_eq!(reply.summary, "No new information to summarize.");
}

#[tokio::test]
async fn identical_inputs_yield_identical_replies() {
    // The default dummy echoes deterministically, so two calls with the same
    // mention and memory must produce the same pair.
    let r = responder_with(DummyProvider::default());
    let first = r.respond("what is Big-O?", "Discussed recursion.").await.unwrap();
    let second = r.respond("what is Big-O?", "Discussed recursion.").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn memory_containing_marker_does_not_confuse_fallback() {
    // Only the model's output is split on SUMMARY:, never the input memory.
    let r = responder_with(DummyProvider::scripted([
        "not json",
        "RESPONSE:\nHello\n\nSUMMARY:\nNew material",
    ]));
    let memory = "earlier turns said SUMMARY: old material";
    let reply = r.respond("question", memory).await.unwrap();
    assert_eq!(reply.answer, "Hello");
    assert_eq!(reply.summary, "New material");
}

#[tokio::test]
async fn summary_is_never_empty() {
    let cases: Vec<Vec<&str>> = vec![
        vec![r#"{"response": "R", "summary": ""}"#],
        vec!["not json", "RESPONSE:\nHello\n\nSUMMARY:\n"],
        vec!["not json", "bare text"],
    ];
    for script in cases {
        let r = responder_with(DummyProvider::scripted(script.clone()));
        let reply = r.respond("question", "").await.unwrap();
        assert!(!reply.summary.is_empty(), "empty summary for script {script:?}");
    }
}

#[tokio::test]
async fn transport_failure_on_primary_attempt_propagates() {
    // A dead endpoint must surface as an error, not degrade into the
    // fallback path.
    let r = responder_with(DummyProvider::scripted_then_fail(
        Vec::<String>::new(),
        "connection refused",
    ));
    let err = r.respond("question", "").await.unwrap_err();
    assert!(matches!(err, ProviderError::Request(_)));
}

#[tokio::test]
async fn transport_failure_on_fallback_attempt_propagates() {
    let r = responder_with(DummyProvider::scripted_then_fail(
        ["this is not json"],
        "connection reset",
    ));
    let err = r.respond("question", "").await.unwrap_err();
    assert!(err.to_string().contains("connection reset"));
}
