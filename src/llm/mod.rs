//! Text generation backends.
//!
//! Every stage that needs the hosted model (classification, LLM extraction,
//! answer generation) talks to it through [`TextGenerator`].

mod openai;
mod retry;

pub(crate) use openai::classify_openai_error;
pub use openai::OpenAiGenerator;
pub use retry::{with_retry, RetryPolicy, RetryingGenerator};

use crate::error::Result;
use async_trait::async_trait;

/// Prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
