//! Import command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{open_store, Article};
use anyhow::{Context, Result};
use tracing::warn;

/// Parse a JSON array of articles, skipping records that do not fit.
///
/// Returns the usable articles and the number of skipped records.
fn parse_articles(json: &str) -> Result<(Vec<Article>, usize)> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(json).context("Import file must be a JSON array of articles")?;

    let mut articles = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (index, record) in records.into_iter().enumerate() {
        let article = match serde_json::from_value::<Article>(record) {
            Ok(article) => article,
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed record");
                skipped += 1;
                continue;
            }
        };
        if let Err(e) = article.validate() {
            warn!(index, error = %e, "Skipping invalid record");
            skipped += 1;
            continue;
        }
        articles.push(article);
    }

    Ok((articles, skipped))
}

/// Run the import command.
pub async fn run_import(file: &str, settings: Settings) -> Result<()> {
    let path = Settings::expand_path(file);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let (articles, skipped) = parse_articles(&json)?;
    if skipped > 0 {
        Output::warning(&format!("Skipped {} invalid records", skipped));
    }

    let store = open_store(&settings)?;
    let report = store.insert_batch(&articles).await?;

    Output::success(&format!("Imported {} articles", report.inserted));
    if report.failed > 0 {
        Output::warning(&format!("{} articles were rejected by the store", report.failed));
    }

    Ok(())
}
