//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::NewsPipeline;
use crate::store::{open_sessions, open_store};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, session: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = open_store(&settings)?;
    let pipeline = NewsPipeline::from_settings(&settings, store, open_sessions(&settings)?)?;
    let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let spinner = Output::spinner("뉴스를 찾는 중...");
    let answer = pipeline.ask(&session, question).await;
    spinner.finish_and_clear();

    println!("\n{}\n", answer.text);
    Output::kv("outcome", &answer.outcome.to_string());

    Ok(())
}
