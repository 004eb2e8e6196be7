//! News crawler for Naver News section pages.
//!
//! Produces [`Article`] batches for the store. Article pages are fetched with
//! bounded concurrency; a failed page is logged and skipped.

mod naver;

pub use naver::{normalize_content, parse_article_page, parse_section_page, ArticlePage, SectionItem};

use crate::config::ScraperSettings;
use crate::error::{NewsdeskError, Result};
use crate::store::{Article, Section};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Articles collected by a crawl, plus how many pages failed.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub articles: Vec<Article>,
    pub failed: usize,
}

/// Build articles for one section from fetched pages, in headline order.
///
/// A page without a timestamp takes the date of the previous article in the
/// same section, or `crawl_date` when there is none. Failed pages (`None`)
/// are counted and skipped.
pub fn build_section_articles(
    section: Section,
    pages: Vec<(SectionItem, Option<ArticlePage>)>,
    crawl_date: NaiveDate,
    collapse_whitespace: bool,
) -> CrawlReport {
    let mut report = CrawlReport::default();
    let mut previous_date: Option<NaiveDate> = None;

    for (item, page) in pages {
        let Some(page) = page else {
            report.failed += 1;
            continue;
        };

        let date = match page.date {
            Some(date) => {
                previous_date = Some(date);
                date
            }
            None => {
                warn!(url = %item.url, "Article has no date, using fallback");
                previous_date.unwrap_or(crawl_date)
            }
        };

        report.articles.push(Article {
            section,
            title: item.title,
            url: item.url,
            press: item.press,
            date,
            content: normalize_content(&page.content, collapse_whitespace),
        });
    }

    report
}

/// Crawler for Naver News.
pub struct NaverCrawler {
    client: reqwest::Client,
    settings: ScraperSettings,
}

impl NaverCrawler {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// Override the number of headlines taken per section.
    pub fn with_per_section(mut self, per_section: usize) -> Self {
        self.settings.per_section = per_section;
        self
    }

    /// Section page URL, e.g. `https://news.naver.com/section/101`.
    pub fn section_url(&self, section: Section) -> Result<Url> {
        let base = self.settings.base_url.trim_end_matches('/');
        Url::parse(&format!("{}/section/{}", base, section.portal_code()))
            .map_err(|e| NewsdeskError::Config(format!("Invalid scraper base_url: {}", e)))
    }

    /// Crawl the given sections in order.
    pub async fn crawl(&self, sections: &[Section]) -> Result<CrawlReport> {
        let crawl_date = chrono::Local::now().date_naive();
        let mut report = CrawlReport::default();

        for &section in sections {
            match self.crawl_section(section, crawl_date).await {
                Ok(section_report) => {
                    report.failed += section_report.failed;
                    report.articles.extend(section_report.articles);
                }
                Err(e) => {
                    warn!(section = %section, error = %e, "Failed to crawl section");
                    report.failed += 1;
                }
            }
        }

        info!(
            articles = report.articles.len(),
            failed = report.failed,
            "Crawl finished"
        );
        Ok(report)
    }

    #[instrument(skip(self), fields(section = %section))]
    async fn crawl_section(&self, section: Section, crawl_date: NaiveDate) -> Result<CrawlReport> {
        let page_url = self.section_url(section)?;
        let html = self.fetch_html(page_url.as_str()).await?;
        let items = parse_section_page(&html, &page_url, self.settings.per_section)?;
        debug!(headlines = items.len(), "Parsed section page");

        let pages: Vec<(SectionItem, Option<ArticlePage>)> = stream::iter(items)
            .map(|item| async move {
                let page = match self.fetch_article(&item.url).await {
                    Ok(page) => Some(page),
                    Err(e) => {
                        warn!(url = %item.url, error = %e, "Failed to fetch article");
                        None
                    }
                };
                (item, page)
            })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        Ok(build_section_articles(
            section,
            pages,
            crawl_date,
            self.settings.collapse_whitespace,
        ))
    }

    async fn fetch_article(&self, url: &str) -> Result<ArticlePage> {
        let html = self.fetch_html(url).await?;
        parse_article_page(&html)
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsdeskError::Scrape(format!("{} returned {}", url, status)));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> SectionItem {
        SectionItem {
            title: title.to_string(),
            url: format!("https://n.news.naver.com/{}", title),
            press: "뉴시스".to_string(),
        }
    }

    fn page(date: Option<NaiveDate>) -> Option<ArticlePage> {
        Some(ArticlePage {
            date,
            content: "본문\n\n이어짐".to_string(),
        })
    }

    #[test]
    fn test_date_fallbacks() {
        let crawl_date = NaiveDate::from_ymd_opt(2025, 2, 13).unwrap();
        let published = NaiveDate::from_ymd_opt(2025, 2, 12).unwrap();

        let report = build_section_articles(
            Section::Society,
            vec![
                (item("a"), page(None)),
                (item("b"), page(Some(published))),
                (item("c"), None),
                (item("d"), page(None)),
            ],
            crawl_date,
            true,
        );

        assert_eq!(report.failed, 1);
        let dates: Vec<_> = report.articles.iter().map(|a| a.date).collect();
        assert_eq!(dates, vec![crawl_date, published, published]);
        assert_eq!(report.articles[0].content, "본문 이어짐");
        assert!(report.articles.iter().all(|a| a.section == Section::Society));
    }

    #[test]
    fn test_section_url() {
        let crawler = NaverCrawler::new(&ScraperSettings::default()).unwrap();
        assert_eq!(
            crawler.section_url(Section::ItScience).unwrap().as_str(),
            "https://news.naver.com/section/105"
        );
    }
}
