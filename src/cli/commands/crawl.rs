//! Crawl command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::crawler::NaverCrawler;
use crate::store::{open_store, Section};
use anyhow::Result;

/// Resolve section names; no names means every section.
fn resolve_sections(names: &[String]) -> Result<Vec<Section>> {
    if names.is_empty() {
        return Ok(Section::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| name.parse::<Section>().map_err(anyhow::Error::msg))
        .collect()
}

/// Run the crawl command.
pub async fn run_crawl(
    sections: &[String],
    per_section: Option<usize>,
    dry_run: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Crawl, &settings)?;

    let sections = resolve_sections(sections)?;
    let mut crawler = NaverCrawler::new(&settings.scraper)?;
    if let Some(n) = per_section {
        crawler = crawler.with_per_section(n);
    }

    let spinner = Output::spinner(&format!("Crawling {} sections...", sections.len()));
    let report = crawler.crawl(&sections).await?;
    spinner.finish_and_clear();

    if report.failed > 0 {
        Output::warning(&format!("{} pages could not be fetched", report.failed));
    }

    if dry_run {
        Output::header(&format!("{} articles (dry run)", report.articles.len()));
        for article in &report.articles {
            Output::article(article);
        }
        return Ok(());
    }

    let store = open_store(&settings)?;
    let inserted = store.insert_batch(&report.articles).await?;

    Output::success(&format!("Stored {} articles", inserted.inserted));
    if inserted.failed > 0 {
        Output::warning(&format!("{} articles were rejected by the store", inserted.failed));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sections() {
        assert_eq!(resolve_sections(&[]).unwrap().len(), 6);
        assert_eq!(
            resolve_sections(&["경제".to_string(), "IT과학".to_string()]).unwrap(),
            vec![Section::Economy, Section::ItScience]
        );
        assert!(resolve_sections(&["연예".to_string()]).is_err());
    }
}
