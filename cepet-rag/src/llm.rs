//! Language model trait used by the answer generator.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion model.
///
/// Implementations receive a fully rendered prompt and return the model's
/// reply. Sampling must be deterministic (temperature zero).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier used in logs.
    fn name(&self) -> &str;

    /// Complete the prompt and return the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
