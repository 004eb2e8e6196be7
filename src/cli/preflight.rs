//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{NewsdeskError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions requires the generation API key.
    Ask,
    /// Crawling only needs network access.
    Crawl,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => check_api_key(&settings.llm.api_key_env)?,
        Operation::Crawl => {}
    }
    Ok(())
}

/// Check that the configured API key variable is set.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(NewsdeskError::Config(format!(
            "{} is empty. Set it with: export {}='...' or add it to .env",
            var, var
        ))),
        Err(_) => Err(NewsdeskError::Config(format!(
            "{} not set. Set it with: export {}='...' or add it to .env",
            var, var
        ))),
    }
}
