//! Retrieval: turn an extracted query into a store filter and run it.

use crate::config::RetrievalSettings;
use crate::error::Result;
use crate::query::DateExpr;
use crate::store::{
    ArticleFilter, ArticleStore, ArticleView, DateFilter, FindOptions, Section, SortOrder,
};
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Outcome of a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// At least one article matched.
    Found(Vec<ArticleView>),
    /// Nothing matched the filter.
    NoResults { filter: ArticleFilter },
}

/// Human-readable label for a date expression, used in prompts and messages.
pub fn date_label(date: Option<DateExpr>) -> String {
    match date {
        Some(DateExpr::Exact(d)) => d.format("%Y-%m-%d").to_string(),
        Some(DateExpr::Recent) => "최근".to_string(),
        Some(DateExpr::Week) => "일주일".to_string(),
        None => "전체 기간".to_string(),
    }
}

/// Resolves date expressions against a reference day and queries the store.
pub struct RetrievalResolver {
    store: Arc<dyn ArticleStore>,
    settings: RetrievalSettings,
}

impl RetrievalResolver {
    pub fn new(store: Arc<dyn ArticleStore>, settings: RetrievalSettings) -> Self {
        Self { store, settings }
    }

    /// Build the store filter for a date expression and section.
    ///
    /// Symbolic dates become `OnOrAfter(today - window)`.
    pub fn build_filter(
        &self,
        date: Option<DateExpr>,
        section: Option<Section>,
        today: NaiveDate,
    ) -> ArticleFilter {
        let since = |days: i64| {
            let start = today
                .checked_sub_days(Days::new(days.max(0) as u64))
                .unwrap_or(NaiveDate::MIN);
            DateFilter::OnOrAfter(start)
        };

        let date = date.map(|expr| match expr {
            DateExpr::Exact(d) => DateFilter::Exact(d),
            DateExpr::Recent => since(self.settings.recent_days),
            DateExpr::Week => since(self.settings.week_days),
        });

        ArticleFilter { date, section }
    }

    fn find_options(&self) -> FindOptions {
        FindOptions {
            limit: self.settings.limit,
            sort: if self.settings.most_recent_first {
                SortOrder::DateDescending
            } else {
                SortOrder::Insertion
            },
        }
    }

    /// Run the filter. Store errors fail fast without retry.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        date: Option<DateExpr>,
        section: Option<Section>,
        today: NaiveDate,
    ) -> Result<Retrieval> {
        let filter = self.build_filter(date, section, today);
        self.resolve_filter(filter).await
    }

    /// Run an already built filter.
    pub async fn resolve_filter(&self, filter: ArticleFilter) -> Result<Retrieval> {
        let articles = self.store.find(&filter, &self.find_options()).await?;
        debug!(?filter, matches = articles.len(), "Resolved retrieval filter");

        if articles.is_empty() {
            Ok(Retrieval::NoResults { filter })
        } else {
            Ok(Retrieval::Found(articles))
        }
    }
}
