//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod crawl;
mod import;
mod serve;
mod stats;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use crawl::run_crawl;
pub use import::run_import;
pub use serve::run_serve;
pub use stats::run_stats;
