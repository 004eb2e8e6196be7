//! Context assembly and per-session context slots.

use crate::config::ContextSettings;
use crate::error::{NewsdeskError, Result};
use crate::store::ArticleView;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::OwnedMutexGuard;

/// Marker appended to truncated article bodies.
pub const TRUNCATION_MARKER: char = '…';

/// Format one article as a three-line block.
pub fn format_block(article: &ArticleView) -> String {
    format!(
        "제목: {}\n날짜: {}\n내용: {}",
        article.title, article.date, article.content
    )
}

/// Join articles into one context block, separated by a blank line, in input order.
pub fn assemble(articles: &[ArticleView]) -> String {
    articles
        .iter()
        .map(format_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Upper bound on what goes into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_articles: usize,
    /// Characters of body kept per article; 0 keeps the full body.
    pub max_content_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::from_settings(&ContextSettings::default())
    }
}

impl ContextBudget {
    pub fn from_settings(settings: &ContextSettings) -> Self {
        Self {
            max_articles: settings.max_articles,
            max_content_chars: settings.max_content_chars,
        }
    }

    /// Keep the first `max_articles` and shorten long bodies.
    pub fn apply(&self, articles: Vec<ArticleView>) -> Vec<ArticleView> {
        articles
            .into_iter()
            .take(self.max_articles)
            .map(|mut article| {
                article.content = truncate_chars(&article.content, self.max_content_chars);
                article
            })
            .collect()
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut shortened = text[..cut].trim_end().to_string();
            shortened.push(TRUNCATION_MARKER);
            shortened
        }
        None => text.to_string(),
    }
}

/// Single-slot context storage keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Context cached for the session, if any.
    async fn get(&self, session_id: &str) -> Result<Option<String>>;

    /// Replace the session's context.
    async fn put(&self, session_id: &str, context: String) -> Result<()>;

    /// Forget the session's context.
    async fn clear(&self, session_id: &str) -> Result<()>;
}

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> NewsdeskError {
    NewsdeskError::Store(format!("Failed to acquire session lock: {}", e))
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>> {
        let slots = self.slots.read().map_err(poisoned)?;
        Ok(slots.get(session_id).cloned())
    }

    async fn put(&self, session_id: &str, context: String) -> Result<()> {
        let mut slots = self.slots.write().map_err(poisoned)?;
        slots.insert(session_id.to_string(), context);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let mut slots = self.slots.write().map_err(poisoned)?;
        slots.remove(session_id);
        Ok(())
    }
}

/// Per-session async mutexes.
///
/// A request holds its session's guard from classification until the
/// session write, so two requests for the same id run one after the other.
/// Different ids never contend.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a session.
    pub async fn acquire(&self, session_id: &str) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().map_err(poisoned)?;
            // drop locks nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Number of sessions currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}
