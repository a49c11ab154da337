//! Generative backends
//!
//! A backend turns a prompt into text. Callers construct one and hand it to
//! the planner or generator as an `Arc<dyn GenerativeBackend>`.
//!
//! - [`GeminiBackend`]: HTTP client for the Gemini `generateContent` API

mod gemini;

pub use gemini::GeminiBackend;

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling parameters for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::project()
    }
}

impl GenerationParams {
    /// Parameters for whole-project generation
    #[inline]
    #[must_use]
    pub const fn project() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.9,
            max_output_tokens: 8192,
        }
    }

    /// Parameters for planning requests (tech stack, goals)
    #[inline]
    #[must_use]
    pub const fn planning() -> Self {
        Self {
            temperature: 0.4,
            top_p: 0.9,
            max_output_tokens: 2048,
        }
    }

    /// With max output tokens
    #[inline]
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }
}

/// Text generation service
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generate text for `prompt`
    ///
    /// Implementations must bound the call in time and must not retry.
    ///
    /// # Errors
    /// Returns `BackendError` on transport failure, timeout, non-success
    /// status or a response without text. Messages must not contain secrets.
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, BackendError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_request_kinds() {
        assert_eq!(GenerationParams::project().max_output_tokens, 8192);
        assert_eq!(GenerationParams::planning().max_output_tokens, 2048);
        assert!(GenerationParams::planning().temperature < GenerationParams::project().temperature);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let params: GenerationParams = toml::from_str("temperature = 0.2").unwrap();
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.max_output_tokens, 8192);
    }
}
