//! SQLite-based article store.
//!
//! The same database also keeps each session's last news context, so a
//! follow-up question can reuse it from a later process.

use super::{
    Article, ArticleFilter, ArticleStore, ArticleView, DateFilter, FindOptions, InsertReport,
    SortOrder,
};
use crate::context::SessionStore;
use crate::error::{NewsdeskError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        section TEXT NOT NULL,
        title TEXT NOT NULL,
        url TEXT,
        press TEXT,
        date TEXT NOT NULL,
        content TEXT,
        inserted_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_articles_section_date ON articles(section, date);
    CREATE INDEX IF NOT EXISTS idx_articles_date ON articles(date);

    CREATE TABLE IF NOT EXISTS sessions (
        session_id TEXT PRIMARY KEY,
        context TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// SQLite-based article store.
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
}

impl SqliteArticleStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite article store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| NewsdeskError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

/// Render a filter as a WHERE clause with positional parameters.
fn where_clause(filter: &ArticleFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    match filter.date {
        Some(DateFilter::Exact(d)) => {
            conditions.push("date = ?");
            values.push(d.format("%Y-%m-%d").to_string());
        }
        Some(DateFilter::OnOrAfter(d)) => {
            conditions.push("date >= ?");
            values.push(d.format("%Y-%m-%d").to_string());
        }
        None => {}
    }

    if let Some(section) = filter.section {
        conditions.push("section = ?");
        values.push(section.as_str().to_string());
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    #[instrument(skip(self, articles), fields(count = articles.len()))]
    async fn insert_batch(&self, articles: &[Article]) -> Result<InsertReport> {
        let conn = self.lock()?;
        let inserted_at = Utc::now().to_rfc3339();
        let mut report = InsertReport::default();

        for article in articles {
            let outcome = article.validate().and_then(|_| {
                conn.execute(
                    r#"
                    INSERT INTO articles (section, title, url, press, date, content, inserted_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        article.section.as_str(),
                        article.title,
                        article.url,
                        article.press,
                        article.date.format("%Y-%m-%d").to_string(),
                        article.content,
                        inserted_at,
                    ],
                )
                .map_err(NewsdeskError::from)
            });

            match outcome {
                Ok(_) => report.inserted += 1,
                Err(e) => {
                    warn!(error = %e, title = %article.title, "Failed to insert article");
                    report.failed += 1;
                }
            }
        }

        debug!(inserted = report.inserted, failed = report.failed, "Inserted article batch");
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: &ArticleFilter, options: &FindOptions) -> Result<Vec<ArticleView>> {
        let conn = self.lock()?;
        let (clause, values) = where_clause(filter);

        let order = match options.sort {
            SortOrder::Insertion => "id ASC",
            SortOrder::DateDescending => "date DESC, id ASC",
        };
        let sql = format!(
            "SELECT title, content, date, url, press FROM articles{} ORDER BY {} LIMIT {}",
            clause, order, options.limit
        );

        let mut stmt = conn.prepare(&sql)?;
        let views = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(ArticleView::from_fields(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(matches = views.len(), "Article query finished");
        Ok(views)
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<usize> {
        let conn = self.lock()?;
        let (clause, values) = where_clause(filter);

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM articles{}", clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }
}

#[async_trait]
impl SessionStore for SqliteArticleStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let context = conn
            .query_row(
                "SELECT context FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(context)
    }

    async fn put(&self, session_id: &str, context: String) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO sessions (session_id, context, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(session_id) DO UPDATE SET context = excluded.context, updated_at = excluded.updated_at
            "#,
            params![session_id, context, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sessions WHERE session_id = ?1", params![session_id])?;
        Ok(())
    }
}
