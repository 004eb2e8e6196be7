//! Intent classification.
//!
//! Decides whether a question asks for news, asks what a concept means, or is
//! small talk. Two strategies exist: a few-shot prompt to the model and a
//! local keyword matcher that needs no network call.

use crate::config::Prompts;
use crate::error::{NewsdeskError, Result};
use crate::llm::TextGenerator;
use crate::query::SECTION_KEYWORDS;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// What kind of answer a question needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    NewsRequest,
    ConceptQuestion,
    SmallTalk,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::NewsRequest => write!(f, "news_request"),
            IntentKind::ConceptQuestion => write!(f, "concept_question"),
            IntentKind::SmallTalk => write!(f, "small_talk"),
        }
    }
}

/// Classifies questions. Failures surface as `NewsdeskError::Classification`.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, question: &str) -> Result<IntentKind>;
}

/// Map a model label onto an intent by substring, in priority order.
pub fn parse_intent_label(label: &str) -> IntentKind {
    if label.contains("뉴스 요청") {
        IntentKind::NewsRequest
    } else if label.contains("일반 개념 질문") || label.contains("개념") {
        IntentKind::ConceptQuestion
    } else {
        IntentKind::SmallTalk
    }
}

/// Few-shot classification through the generation service.
pub struct LlmIntentClassifier {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
}

impl LlmIntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Prompts) -> Self {
        Self { generator, prompts }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    #[instrument(skip(self), fields(question = %question))]
    async fn classify(&self, question: &str) -> Result<IntentKind> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.intent.classify, &vars);

        let label = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| NewsdeskError::Classification(Box::new(e)))?;

        let intent = parse_intent_label(label.trim());
        debug!(label = %label.trim(), %intent, "Classified question");
        Ok(intent)
    }
}

const NEWS_WORDS: [&str; 3] = ["뉴스", "기사", "소식"];
const CONCEPT_MARKERS: [&str; 8] = ["뭐야", "이란", "란?", "뜻", "의미", "개념", "설명해", "무엇"];

/// Local topic-word matcher.
///
/// Explicit news words win over concept markers, and concept markers win
/// over a bare section word ("경제란?" is a concept question).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn classify_text(question: &str) -> IntentKind {
        let lowered = question.to_lowercase();

        if NEWS_WORDS.iter().any(|w| lowered.contains(w)) {
            return IntentKind::NewsRequest;
        }
        if CONCEPT_MARKERS.iter().any(|m| lowered.contains(m)) {
            return IntentKind::ConceptQuestion;
        }
        if SECTION_KEYWORDS
            .iter()
            .any(|(keyword, _)| lowered.contains(&keyword.to_lowercase()))
        {
            return IntentKind::NewsRequest;
        }
        IntentKind::SmallTalk
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, question: &str) -> Result<IntentKind> {
        Ok(Self::classify_text(question))
    }
}
