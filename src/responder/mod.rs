//! Mention responder — answers a group-chat mention with a privacy-safe
//! rolling summary.
//!
//! One mention in, one `(answer, summary)` out. The responder composes a
//! single instruction prompt, asks the model for strict JSON, and when the
//! returned text is not valid JSON re-issues the same request in plain-text
//! mode and recovers the two fields from `RESPONSE:`/`SUMMARY:` markers.
//!
//! Decode failures of the model's text are expected and handled here;
//! transport failures are [`ProviderError`] and propagate from either
//! attempt — a dead endpoint or bad API key never degrades silently into
//! the fallback path.

pub mod prompt;

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::{LlmProvider, OutputMode, ProviderError};
use self::prompt::PromptBuilder;

/// Compiled-in copy of the shipped mention template — used when the prompts
/// directory is missing at runtime, so the prompt contract holds regardless
/// of deployment layout.
const MENTION_TEMPLATE: &str = include_str!("../../config/prompts/mention.md");
const MENTION_TEMPLATE_FILE: &str = "mention.md";

/// Memory placeholder embedded when the caller supplies no prior summary.
const NO_MEMORY: &str = "None";

/// Appended to the prompt on the plain-text fallback attempt.
const FALLBACK_FORMAT: &str = "Format: RESPONSE:\n<response>\n\nSUMMARY:\n<summary>";

const DEFAULT_ANSWER: &str = "I apologize, I couldn't generate a response.";
const DEFAULT_SUMMARY: &str = "Unable to generate summary.";
const NO_NEW_INFORMATION: &str = "No new information to summarize.";

const RESPONSE_MARKER: &str = "RESPONSE:";
const SUMMARY_MARKER: &str = "SUMMARY:";

// ── Reply ─────────────────────────────────────────────────────────────────────

/// The two strings a mention produces. Both are ephemeral — owned by the
/// caller immediately after return. `summary` is never empty: it replaces or
/// extends the memory string the caller stores for the next mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub answer: String,
    pub summary: String,
}

// ── Responder ─────────────────────────────────────────────────────────────────

/// Stateless mention handler over a configured [`LlmProvider`].
///
/// Holds no mutable state — clone it or share it freely across concurrent
/// callers; each [`respond`](Self::respond) call is independent.
#[derive(Debug, Clone)]
pub struct Responder {
    provider: LlmProvider,
    prompts_dir: PathBuf,
}

impl Responder {
    pub fn new(provider: LlmProvider, prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            prompts_dir: prompts_dir.into(),
        }
    }

    /// Answer `text` using only `memory` as prior context.
    ///
    /// `memory` is the caller-stored privacy-safe summary from previous
    /// turns; pass `""` for no prior context. The returned
    /// [`Reply::summary`] is the replacement the caller should store.
    ///
    /// One model round-trip in the common case, two when the structured
    /// attempt returns malformed JSON. Transport errors from either attempt
    /// are returned as-is.
    pub async fn respond(&self, text: &str, memory: &str) -> Result<Reply, ProviderError> {
        let prompt = self.compose_prompt(text, memory);

        let raw = self.provider.generate(&prompt, OutputMode::Json).await?;
        match parse_structured(&raw) {
            Ok(reply) => {
                debug!(answer_len = reply.answer.len(), "structured reply parsed");
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "structured output was not valid JSON, retrying in plain-text mode");
                let fallback_prompt = format!("{prompt}\n\n{FALLBACK_FORMAT}");
                let raw = self
                    .provider
                    .generate(&fallback_prompt, OutputMode::Plain)
                    .await?;
                Ok(parse_delimited(raw.trim()))
            }
        }
    }

    /// Assemble the mention prompt: framing + privacy rules + memory section
    /// + current question + strict-JSON output specification.
    fn compose_prompt(&self, text: &str, memory: &str) -> String {
        let memory = if memory.trim().is_empty() { NO_MEMORY } else { memory };
        PromptBuilder::new(&self.prompts_dir)
            .layer_or(MENTION_TEMPLATE_FILE, MENTION_TEMPLATE)
            .var("memory", memory)
            .var("question", text)
            .build()
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Structured reply shape requested from the model.
#[derive(Debug, Deserialize)]
struct StructuredReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

/// Parse the strict-JSON reply. Absent or empty fields fall back to fixed
/// defaults per field; malformed JSON is the caller's cue to retry in
/// plain-text mode.
fn parse_structured(raw: &str) -> Result<Reply, serde_json::Error> {
    let parsed: StructuredReply = serde_json::from_str(raw)?;
    Ok(Reply {
        answer: parsed
            .response
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ANSWER.to_string()),
        summary: parsed
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
    })
}

/// Recover `(answer, summary)` from marker-delimited free text.
///
/// Splits on the first `SUMMARY:`; everything before it (with any
/// `RESPONSE:` labels stripped) is the answer. Without the marker the whole
/// text is the answer and the summary is a fixed placeholder.
fn parse_delimited(text: &str) -> Reply {
    match text.split_once(SUMMARY_MARKER) {
        Some((head, tail)) => {
            let summary = tail.trim();
            Reply {
                answer: strip_response_label(head),
                summary: if summary.is_empty() {
                    NO_NEW_INFORMATION.to_string()
                } else {
                    summary.to_string()
                },
            }
        }
        None => Reply {
            answer: strip_response_label(text),
            summary: NO_NEW_INFORMATION.to_string(),
        },
    }
}

fn strip_response_label(text: &str) -> String {
    text.replace(RESPONSE_MARKER, "").trim().to_string()
}
