//! Stats command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{open_store, ArticleFilter, ArticleStore, Section};
use anyhow::Result;

/// Article counts per section, in canonical section order.
async fn section_counts(store: &dyn ArticleStore) -> Result<Vec<(Section, usize)>> {
    let mut counts = Vec::with_capacity(Section::ALL.len());
    for section in Section::ALL {
        counts.push((section, store.count(&ArticleFilter::section(section)).await?));
    }
    Ok(counts)
}

/// Run the stats command.
pub async fn run_stats(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let counts = section_counts(store.as_ref()).await?;
    let total = store.count(&ArticleFilter::default()).await?;

    Output::header("Articles");
    for (section, count) in counts {
        Output::section_count(section, count);
    }
    println!();
    Output::kv("Total", &total.to_string());
    Output::kv("Store", &settings.store.provider.to_string());

    Ok(())
}
