//! Dummy LLM provider — deterministic offline replies shaped for the active
//! output mode. Used for testing the full responder round-trip without a real
//! API key, and as a dry-run backend (`[llm] default = "dummy"`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::llm::{OutputMode, ProviderError};

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    /// Canned replies consumed front-to-back; when empty, the provider echoes.
    script: Arc<Mutex<VecDeque<String>>>,
    /// When set, an exhausted script returns this as a transport error
    /// instead of echoing.
    fail_when_exhausted: Option<String>,
}

impl DummyProvider {
    /// A provider that returns `replies` in order, then reverts to echoing.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            fail_when_exhausted: None,
        }
    }

    /// A provider whose scripted replies run out into a transport error —
    /// exercises error propagation through the responder.
    pub fn scripted_then_fail<I, S>(replies: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            fail_when_exhausted: Some(message.into()),
        }
    }

    /// Pop the next scripted reply, or echo the prompt shaped for `mode`:
    /// valid JSON in JSON mode, `RESPONSE:`/`SUMMARY:` markers in plain mode.
    pub async fn generate(&self, prompt: &str, mode: OutputMode) -> Result<String, ProviderError> {
        if let Some(reply) = self.script.lock().expect("script lock poisoned").pop_front() {
            return Ok(reply);
        }
        if let Some(message) = &self.fail_when_exhausted {
            return Err(ProviderError::Request(message.clone()));
        }

        let echo = format!("[echo] {}", last_line(prompt));
        Ok(match mode {
            OutputMode::Json => serde_json::json!({
                "response": echo,
                "summary": "Echoed the mention back.",
            })
            .to_string(),
            OutputMode::Plain => {
                format!("RESPONSE:\n{echo}\n\nSUMMARY:\nEchoed the mention back.")
            }
        })
    }
}

/// The prompt's final non-empty line — enough to show what the echo answered
/// without replaying the whole instruction block.
fn last_line(prompt: &str) -> &str {
    prompt
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
}
