//! In-memory article store.
//!
//! Useful for testing and one-off runs over an imported file.

use super::{Article, ArticleFilter, ArticleStore, ArticleView, FindOptions, InsertReport, SortOrder};
use crate::error::{NewsdeskError, Result};
use async_trait::async_trait;
use std::sync::RwLock;
use tracing::warn;

/// In-memory article store. Keeps insertion order.
pub struct MemoryArticleStore {
    articles: RwLock<Vec<Article>>,
}

impl MemoryArticleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            articles: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> NewsdeskError {
    NewsdeskError::Store(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn insert_batch(&self, articles: &[Article]) -> Result<InsertReport> {
        let mut store = self.articles.write().map_err(poisoned)?;
        let mut report = InsertReport::default();

        for article in articles {
            match article.validate() {
                Ok(()) => {
                    store.push(article.clone());
                    report.inserted += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping article");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn find(&self, filter: &ArticleFilter, options: &FindOptions) -> Result<Vec<ArticleView>> {
        let store = self.articles.read().map_err(poisoned)?;

        let mut matches: Vec<&Article> = store.iter().filter(|a| filter.matches(a)).collect();
        if options.sort == SortOrder::DateDescending {
            // stable sort keeps insertion order for equal dates
            matches.sort_by(|a, b| b.date.cmp(&a.date));
        }

        Ok(matches
            .into_iter()
            .take(options.limit)
            .map(ArticleView::from)
            .collect())
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<usize> {
        let store = self.articles.read().map_err(poisoned)?;
        Ok(store.iter().filter(|a| filter.matches(a)).count())
    }
}
