//! Newsdesk - Korean news Q&A
//!
//! A question-answering service over a store of crawled Korean news articles.
//!
//! # Overview
//!
//! Newsdesk allows you to:
//! - Crawl the latest headlines per section from Naver News
//! - Ask for a summary of one section's news on a given day
//! - Ask follow-up concept questions about the news you just read
//! - Serve the same pipeline over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `store` - Article store abstraction (SQLite, in-memory)
//! - `intent` - Question intent classification
//! - `query` - Date and section extraction
//! - `retrieval` - Filter construction and article lookup
//! - `context` - Context assembly and per-session state
//! - `answer` - Prompt selection and answer generation
//! - `llm` - Text generation with retries
//! - `agent` - Tool-calling retrieval
//! - `crawler` - Naver News crawler
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use newsdesk::config::Settings;
//! use newsdesk::context::MemorySessionStore;
//! use newsdesk::pipeline::NewsPipeline;
//! use newsdesk::store::open_store;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let store = open_store(&settings)?;
//!     let pipeline = NewsPipeline::from_settings(&settings, store, Arc::new(MemorySessionStore::new()))?;
//!
//!     let answer = pipeline.ask("session-1", "오늘 경제 뉴스 알려줘").await;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod answer;
pub mod cli;
pub mod config;
pub mod context;
pub mod crawler;
pub mod error;
pub mod intent;
pub mod llm;
pub mod openai;
pub mod pipeline;
pub mod query;
pub mod retrieval;
pub mod store;

pub use error::{NewsdeskError, Result};
