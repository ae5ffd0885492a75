//! Text generation service seam
//!
//! The composer only needs "prompt in, text out". Keeping that behind
//! [`TextGenerator`] lets tests substitute an in-process generator.

pub mod gemini;

use async_trait::async_trait;

use crate::error::Result;

pub use gemini::GeminiClient;

/// Model used when the configuration does not pin one
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// A single, history-free generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

/// Text-in/text-out generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider identifier used in logs
    fn name(&self) -> &'static str;

    /// Generate a complete response for `request`
    ///
    /// Transient failures are `GenerationService`, credential or quota
    /// problems are `GenerationServiceUnavailable`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
