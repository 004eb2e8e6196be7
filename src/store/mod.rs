//! Article store abstraction.
//!
//! Articles are written once by the crawler (or an import) and read many times
//! by retrieval. Reads never rank; they filter on `date` and `section` only.

mod memory;
mod sqlite;

pub use memory::MemoryArticleStore;
pub use sqlite::SqliteArticleStore;

use crate::config::{Settings, StoreProvider};
use crate::context::{MemorySessionStore, SessionStore};
use crate::error::{NewsdeskError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Placeholder for a missing or blank title.
pub const MISSING_TITLE: &str = "제목 없음";
/// Placeholder for missing or blank body text.
pub const MISSING_CONTENT: &str = "내용 없음";
/// Placeholder for a missing date.
pub const MISSING_DATE: &str = "날짜 없음";

/// Fixed news topic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "정치")]
    Politics,
    #[serde(rename = "경제")]
    Economy,
    #[serde(rename = "사회")]
    Society,
    #[serde(rename = "생활문화")]
    LifeCulture,
    #[serde(rename = "IT과학")]
    ItScience,
    #[serde(rename = "세계")]
    World,
}

impl Section {
    /// All sections in portal order.
    pub const ALL: [Section; 6] = [
        Section::Politics,
        Section::Economy,
        Section::Society,
        Section::LifeCulture,
        Section::ItScience,
        Section::World,
    ];

    /// Canonical Korean name, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Politics => "정치",
            Section::Economy => "경제",
            Section::Society => "사회",
            Section::LifeCulture => "생활문화",
            Section::ItScience => "IT과학",
            Section::World => "세계",
        }
    }

    /// Section id used in portal URLs.
    pub fn portal_code(self) -> u16 {
        match self {
            Section::Politics => 100,
            Section::Economy => 101,
            Section::Society => 102,
            Section::LifeCulture => 103,
            Section::World => 104,
            Section::ItScience => 105,
        }
    }

    /// Look up a section by its canonical name.
    pub fn from_name(name: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.as_str() == name.trim())
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Section::from_name(s).ok_or_else(|| format!("Unknown section: {}", s))
    }
}

/// A crawled news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub section: Section,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub press: String,
    /// Publication date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Whitespace-normalized body text. May be empty.
    #[serde(default)]
    pub content: String,
}

impl Article {
    /// Check the write invariants: a typed section and date, and a non-blank title.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(NewsdeskError::InvalidInput(format!(
                "article has an empty title (url: {})",
                self.url
            )));
        }
        Ok(())
    }
}

/// Projection of an article returned by retrieval.
///
/// Blank or missing fields are already replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleView {
    pub title: String,
    pub content: String,
    pub date: String,
    pub url: String,
    pub press: String,
}

impl ArticleView {
    /// Build a view from raw stored fields, substituting placeholders.
    pub fn from_fields(
        title: Option<String>,
        content: Option<String>,
        date: Option<String>,
        url: Option<String>,
        press: Option<String>,
    ) -> Self {
        let mut malformed = Vec::new();
        let mut or_placeholder = |value: Option<String>, field: &'static str, placeholder: &str| {
            match value.filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    malformed.push(field);
                    placeholder.to_string()
                }
            }
        };

        let title = or_placeholder(title, "title", MISSING_TITLE);
        let content = or_placeholder(content, "content", MISSING_CONTENT);
        let date = or_placeholder(date, "date", MISSING_DATE);

        if !malformed.is_empty() {
            warn!(fields = ?malformed, title = %title, "Stored article is missing fields, using placeholders");
        }

        Self {
            title,
            content,
            date,
            url: url.unwrap_or_default(),
            press: press.unwrap_or_default(),
        }
    }
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        ArticleView::from_fields(
            Some(article.title.clone()),
            Some(article.content.clone()),
            Some(article.date.format("%Y-%m-%d").to_string()),
            Some(article.url.clone()),
            Some(article.press.clone()),
        )
    }
}

/// Date constraint of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Exactly this day.
    Exact(NaiveDate),
    /// This day or later.
    OnOrAfter(NaiveDate),
}

impl DateFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            DateFilter::Exact(d) => date == *d,
            DateFilter::OnOrAfter(d) => date >= *d,
        }
    }
}

/// Equality/range filter over `date` and `section`. `None` means no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub date: Option<DateFilter>,
    pub section: Option<Section>,
}

impl ArticleFilter {
    pub fn section(section: Section) -> Self {
        Self {
            date: None,
            section: Some(section),
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.date.map_or(true, |d| d.matches(article.date))
            && self.section.map_or(true, |s| s == article.section)
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Insertion order; stable across identical queries.
    #[default]
    Insertion,
    /// Newest date first, ties in insertion order.
    DateDescending,
}

/// Limit and ordering for `find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: usize,
    pub sort: SortOrder,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            sort: SortOrder::Insertion,
        }
    }
}

/// Outcome of a batch insert. Partial success is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub failed: usize,
}

/// Trait for article store backends.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert articles one by one; a failing article does not stop the batch.
    async fn insert_batch(&self, articles: &[Article]) -> Result<InsertReport>;

    /// Find articles matching the filter, projected to views.
    async fn find(&self, filter: &ArticleFilter, options: &FindOptions) -> Result<Vec<ArticleView>>;

    /// Count articles matching the filter.
    async fn count(&self, filter: &ArticleFilter) -> Result<usize>;
}

/// Open the store selected in the settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn ArticleStore>> {
    match settings.store.provider {
        StoreProvider::Sqlite => Ok(Arc::new(SqliteArticleStore::new(&settings.sqlite_path())?)),
        StoreProvider::Memory => Ok(Arc::new(MemoryArticleStore::new())),
    }
}

/// Open the session store matching the article store.
///
/// The SQLite provider keeps sessions in the same database file, so they
/// outlive the process. The memory provider keeps them for the process only.
pub fn open_sessions(settings: &Settings) -> Result<Arc<dyn SessionStore>> {
    match settings.store.provider {
        StoreProvider::Sqlite => Ok(Arc::new(SqliteArticleStore::new(&settings.sqlite_path())?)),
        StoreProvider::Memory => Ok(Arc::new(MemorySessionStore::new())),
    }
}

#[cfg(test)]
pub(crate) fn sample_article(section: Section, date: NaiveDate, title: &str) -> Article {
    Article {
        section,
        title: title.to_string(),
        url: format!("https://n.news.naver.com/article/{}", title.len()),
        press: "연합뉴스".to_string(),
        date,
        content: format!("{} 본문", title),
    }
}
