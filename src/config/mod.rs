//! Configuration module for Newsdesk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, AnswerPrompts, ExtractPrompts, IntentPrompts, Prompts};
pub use settings::{
    ClassificationFallback, ClassifierStrategy, ContextSettings, ExtractorStrategy,
    GeneralSettings, LlmSettings, PipelineSettings, PromptSettings, RetrievalSettings,
    RetrievalStrategy, ScraperSettings, ServerSettings, Settings, StoreProvider, StoreSettings,
};
