//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Async is delegated to the underlying provider; the `generate` method is
//! `async fn` on the enum so callers need no trait-object machinery.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Transport-level provider failures.
///
/// These are distinct from structured-output decode failures, which the
/// responder handles locally: a `ProviderError` always propagates to the
/// caller, on the primary and the fallback attempt alike.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Output mode ───────────────────────────────────────────────────────────────

/// Requested response shape for a generation call.
///
/// `Json` asks the provider for machine-parseable JSON (Gemini:
/// `responseMimeType: "application/json"`); `Plain` leaves the output format
/// unconstrained for the text-marker fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Plain,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `generate` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Gemini(providers::gemini::GeminiProvider),
    Dummy(providers::dummy::DummyProvider),
}

impl LlmProvider {
    /// Send `prompt` to the provider and return its raw text reply.
    pub async fn generate(&self, prompt: &str, mode: OutputMode) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Gemini(p) => p.generate(prompt, mode).await,
            LlmProvider::Dummy(p) => p.generate(prompt, mode).await,
        }
    }
}
