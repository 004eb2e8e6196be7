//! Configuration settings for Newsdesk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub context: ContextSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
    pub scraper: ScraperSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.newsdesk".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Settings for the hosted text-generation service.
///
/// Any OpenAI-compatible chat completion endpoint works. The default points at
/// Gemini's compatibility endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the chat completion API. `None` uses the OpenAI default.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model used for every generation call.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// HTTP timeout per call, in seconds.
    pub timeout_secs: u64,
    /// Retries after the first failed attempt (transient failures only).
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry.
    pub retry_base_delay_ms: u64,
    /// Upper bound for the retry delay.
    pub retry_max_delay_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai".to_string()),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8_000,
        }
    }
}

impl LlmSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Article store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// SQLite file (default).
    #[default]
    Sqlite,
    /// Process-local memory, lost on exit.
    Memory,
}

impl std::str::FromStr for StoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreProvider::Sqlite),
            "memory" => Ok(StoreProvider::Memory),
            _ => Err(format!("Unknown store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreProvider::Sqlite => write!(f, "sqlite"),
            StoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Article store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: StoreProvider,
    /// Path to the SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Sqlite,
            sqlite_path: "~/.newsdesk/articles.db".to_string(),
        }
    }
}

/// Retrieval filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Maximum number of articles returned per query.
    pub limit: usize,
    /// Sort matches by date, newest first. Otherwise insertion order.
    pub most_recent_first: bool,
    /// Days covered by "최근".
    pub recent_days: i64,
    /// Days covered by "일주일".
    pub week_days: i64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            limit: 10,
            most_recent_first: false,
            recent_days: 5,
            week_days: 7,
        }
    }
}

/// Bounds on the article context embedded into prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Maximum articles embedded into one prompt.
    pub max_articles: usize,
    /// Maximum characters of body text kept per article.
    pub max_content_chars: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_articles: 10,
            max_content_chars: 1_500,
        }
    }
}

/// How a question's intent is determined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStrategy {
    /// Few-shot prompt to the generation service.
    #[default]
    Llm,
    /// Local topic-word matching, no network call.
    Keyword,
}

/// How date and section are pulled out of a news question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorStrategy {
    /// Deterministic keyword and date-pattern rules.
    #[default]
    Rules,
    /// One-shot prompt returning `date: ..., section: ...`.
    Llm,
}

/// How articles are found for a news question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Extractor followed by the filter resolver.
    #[default]
    Pipeline,
    /// Tool-calling agent that issues its own searches.
    Agent,
}

/// What to do when intent classification fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationFallback {
    /// Continue as small talk.
    #[default]
    SmallTalk,
    /// Stop and report the failure as the answer.
    AnswerError,
}

/// Pipeline behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub classifier: ClassifierStrategy,
    pub extractor: ExtractorStrategy,
    pub retrieval: RetrievalStrategy,
    pub on_classification_error: ClassificationFallback,
    /// Stop with a guidance message when no section can be determined.
    pub require_section: bool,
    /// Overall deadline for one question, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum LLM turns for the agent retrieval strategy.
    pub agent_max_iterations: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierStrategy::Llm,
            extractor: ExtractorStrategy::Rules,
            retrieval: RetrievalStrategy::Pipeline,
            on_classification_error: ClassificationFallback::SmallTalk,
            require_section: true,
            request_timeout_secs: 120,
            agent_max_iterations: 6,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
        }
    }
}

/// News crawler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Portal base URL; section pages live at `{base_url}/section/{code}`.
    pub base_url: String,
    /// Articles taken from the top of each section page.
    pub per_section: usize,
    /// Article pages fetched concurrently.
    pub concurrency: usize,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Collapse newline runs in article bodies.
    pub collapse_whitespace: bool,
    /// HTTP timeout per page, in seconds.
    pub timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: "https://news.naver.com".to_string(),
            per_section: 5,
            concurrency: 4,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            collapse_whitespace: true,
            timeout_secs: 20,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsdesk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }
}
