//! The question-answering pipeline.
//!
//! classify → extract → retrieve → assemble → generate. Every failure is
//! turned into answer text here; callers match on [`Outcome`] instead of
//! parsing strings.

use crate::agent::{Agent, OpenAiToolChat, ToolContext};
use crate::answer::{AnswerGenerator, AnswerMode};
use crate::config::{
    ClassificationFallback, ClassifierStrategy, ExtractorStrategy, PipelineSettings, Prompts,
    RetrievalStrategy, Settings,
};
use crate::context::{assemble, ContextBudget, SessionLocks, SessionStore};
use crate::error::{NewsdeskError, Result};
use crate::intent::{IntentClassifier, IntentKind, KeywordIntentClassifier, LlmIntentClassifier};
use crate::llm::{OpenAiGenerator, RetryPolicy, RetryingGenerator, TextGenerator};
use crate::openai::create_client;
use crate::query::{DateExpr, LlmExtractor, QueryExtractor, RuleExtractor};
use crate::retrieval::{date_label, Retrieval, RetrievalResolver};
use crate::store::{ArticleStore, ArticleView, Section};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Reply when no section could be determined.
pub const GUIDANCE_MESSAGE: &str =
    "분야를 인식할 수 없습니다. '경제 뉴스 알려줘', '정치 뉴스 궁금해'처럼 입력해주세요.";

/// Reply when the request deadline passes.
pub const TIMEOUT_MESSAGE: &str = "답변 생성 시간이 초과되었습니다. 잠시 후 다시 시도해주세요.";

/// Section label used when retrieval ran without a section.
const ALL_SECTIONS_LABEL: &str = "전체";

/// How a question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Retrieved articles were summarized.
    Summarized,
    /// A concept question was answered.
    Explained,
    /// Small talk was answered directly.
    Chatted,
    /// No section could be determined; guidance was returned.
    SectionUnknown,
    /// The filter matched no articles.
    NoResults,
    /// Classification failed and the fallback is to report it.
    ClassificationFailed,
    /// The generation service failed.
    GenerationFailed,
    /// The article or session store failed.
    StoreFailed,
    /// The request deadline passed.
    TimedOut,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Outcome::Summarized => "summarized",
            Outcome::Explained => "explained",
            Outcome::Chatted => "chatted",
            Outcome::SectionUnknown => "section_unknown",
            Outcome::NoResults => "no_results",
            Outcome::ClassificationFailed => "classification_failed",
            Outcome::GenerationFailed => "generation_failed",
            Outcome::StoreFailed => "store_failed",
            Outcome::TimedOut => "timed_out",
        };
        write!(f, "{}", name)
    }
}

/// Final answer for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub outcome: Outcome,
}

impl Answer {
    fn new(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }

    fn failed(error: &NewsdeskError, outcome: Outcome) -> Self {
        let text = match outcome {
            Outcome::StoreFailed => format!("뉴스 저장소를 조회하는 중 오류가 발생했습니다: {}", error),
            _ => format!("답변을 생성하는 중 오류가 발생했습니다: {}", error),
        };
        Self::new(text, outcome)
    }
}

/// Reply when a filter matched nothing.
pub fn no_results_message(date: &str, section: Option<Section>) -> String {
    match section {
        Some(section) => format!("❌ {}의 {} 뉴스가 없습니다. ❌", date, section),
        None => format!("❌ {}의 뉴스가 없습니다. ❌", date),
    }
}

/// How news articles are found.
enum Retriever {
    /// Extractor plus filter resolver.
    Rules {
        extractor: Arc<dyn QueryExtractor>,
        resolver: Arc<RetrievalResolver>,
    },
    /// Tool-calling agent.
    Agent(Arc<Agent>),
}

/// Articles picked for a news answer, with the labels used in the prompt.
struct NewsHit {
    date: Option<DateExpr>,
    section: Option<Section>,
    articles: Vec<ArticleView>,
}

/// Wires the stages together and owns the session state.
pub struct NewsPipeline {
    classifier: Arc<dyn IntentClassifier>,
    retriever: Retriever,
    answers: AnswerGenerator,
    sessions: Arc<dyn SessionStore>,
    locks: SessionLocks,
    budget: ContextBudget,
    require_section: bool,
    on_classification_error: ClassificationFallback,
    timeout: Duration,
}

impl NewsPipeline {
    /// Create a pipeline using rule or model extraction.
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        extractor: Arc<dyn QueryExtractor>,
        resolver: Arc<RetrievalResolver>,
        answers: AnswerGenerator,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let defaults = PipelineSettings::default();
        Self {
            classifier,
            retriever: Retriever::Rules {
                extractor,
                resolver,
            },
            answers,
            sessions,
            locks: SessionLocks::new(),
            budget: ContextBudget::default(),
            require_section: defaults.require_section,
            on_classification_error: defaults.on_classification_error,
            timeout: Duration::from_secs(defaults.request_timeout_secs),
        }
    }

    /// Let a tool-calling agent find the articles instead of the extractor.
    pub fn with_agent(mut self, agent: Arc<Agent>) -> Self {
        self.retriever = Retriever::Agent(agent);
        self
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply the pipeline switches from settings.
    pub fn with_settings(mut self, settings: &PipelineSettings) -> Self {
        self.require_section = settings.require_section;
        self.on_classification_error = settings.on_classification_error;
        self.timeout = Duration::from_secs(settings.request_timeout_secs);
        self
    }

    /// Build the full pipeline described by the settings.
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn ArticleStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let policy = RetryPolicy::from_settings(&settings.llm);
        let generator: Arc<dyn TextGenerator> = Arc::new(RetryingGenerator::new(
            Arc::new(OpenAiGenerator::new(&settings.llm)?),
            policy,
        ));

        let classifier: Arc<dyn IntentClassifier> = match settings.pipeline.classifier {
            ClassifierStrategy::Llm => {
                Arc::new(LlmIntentClassifier::new(generator.clone(), prompts.clone()))
            }
            ClassifierStrategy::Keyword => Arc::new(KeywordIntentClassifier),
        };
        let extractor: Arc<dyn QueryExtractor> = match settings.pipeline.extractor {
            ExtractorStrategy::Rules => Arc::new(RuleExtractor),
            ExtractorStrategy::Llm => Arc::new(LlmExtractor::new(generator.clone(), prompts.clone())),
        };
        let resolver = Arc::new(RetrievalResolver::new(store, settings.retrieval.clone()));

        let mut pipeline = Self::new(
            classifier,
            extractor,
            resolver.clone(),
            AnswerGenerator::new(generator, prompts.clone()),
            sessions,
        )
        .with_budget(ContextBudget::from_settings(&settings.context))
        .with_settings(&settings.pipeline);

        if settings.pipeline.retrieval == RetrievalStrategy::Agent {
            let chat = OpenAiToolChat::new(create_client(&settings.llm)?, &settings.llm.model)
                .with_retry_policy(policy);
            let agent = Agent::new(
                Arc::new(chat),
                ToolContext::new(resolver),
                &prompts.agent.system,
            )
            .with_max_iterations(settings.pipeline.agent_max_iterations);
            pipeline = pipeline.with_agent(Arc::new(agent));
        }

        Ok(pipeline)
    }

    /// Answer a question using today's local date.
    pub async fn ask(&self, session_id: &str, question: &str) -> Answer {
        let today = chrono::Local::now().date_naive();
        self.ask_on(session_id, question, today).await
    }

    /// Answer a question relative to the given day. Never fails; errors become text.
    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn ask_on(&self, session_id: &str, question: &str, today: NaiveDate) -> Answer {
        let answer = match tokio::time::timeout(
            self.timeout,
            self.answer(session_id, question, today),
        )
        .await
        {
            Ok(answer) => answer,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "Request timed out");
                Answer::new(TIMEOUT_MESSAGE, Outcome::TimedOut)
            }
        };

        info!(outcome = %answer.outcome, "Answered question");
        answer
    }

    /// Forget the cached news context of a session.
    pub async fn reset_session(&self, session_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(session_id).await?;
        self.sessions.clear(session_id).await
    }

    async fn answer(&self, session_id: &str, question: &str, today: NaiveDate) -> Answer {
        let _guard = match self.locks.acquire(session_id).await {
            Ok(guard) => guard,
            Err(e) => return Answer::failed(&e, Outcome::StoreFailed),
        };

        let intent = match self.classifier.classify(question).await {
            Ok(intent) => intent,
            Err(e) => match self.on_classification_error {
                ClassificationFallback::SmallTalk => {
                    warn!(error = %e, "Classification failed, continuing as small talk");
                    IntentKind::SmallTalk
                }
                ClassificationFallback::AnswerError => {
                    warn!(error = %e, "Classification failed");
                    return Answer::failed(&e, Outcome::ClassificationFailed);
                }
            },
        };
        info!(%intent, "Classified question");

        match intent {
            IntentKind::NewsRequest => self.answer_news(session_id, question, today).await,
            IntentKind::ConceptQuestion => {
                let context = match self.sessions.get(session_id).await {
                    Ok(context) => context,
                    Err(e) => return Answer::failed(&e, Outcome::StoreFailed),
                };
                self.generate(question, &AnswerMode::ConceptExplain { context }, Outcome::Explained)
                    .await
            }
            IntentKind::SmallTalk => {
                self.generate(question, &AnswerMode::Passthrough, Outcome::Chatted)
                    .await
            }
        }
    }

    async fn answer_news(&self, session_id: &str, question: &str, today: NaiveDate) -> Answer {
        let hit = match &self.retriever {
            Retriever::Rules {
                extractor,
                resolver,
            } => {
                let extracted = match extractor.extract(question, today).await {
                    Ok(extracted) => extracted,
                    Err(e) => return Answer::failed(&e, Outcome::GenerationFailed),
                };

                if extracted.section.is_none() && self.require_section {
                    return Answer::new(GUIDANCE_MESSAGE, Outcome::SectionUnknown);
                }

                match resolver
                    .resolve(extracted.date, extracted.section, today)
                    .await
                {
                    Ok(Retrieval::Found(articles)) => NewsHit {
                        date: extracted.date,
                        section: extracted.section,
                        articles,
                    },
                    Ok(Retrieval::NoResults { .. }) => {
                        return Answer::new(
                            no_results_message(&date_label(extracted.date), extracted.section),
                            Outcome::NoResults,
                        );
                    }
                    Err(e) => return Answer::failed(&e, Outcome::StoreFailed),
                }
            }
            Retriever::Agent(agent) => match agent.run(question, today).await {
                Ok(response) => {
                    debug!(
                        iterations = response.iterations,
                        tool_calls = response.tool_calls.len(),
                        "Agent search finished"
                    );
                    for record in &response.tool_calls {
                        debug!(call = %record, "Agent tool call");
                    }
                    match response.found {
                        Some(found) if found.section.is_none() && self.require_section => {
                            return Answer::new(GUIDANCE_MESSAGE, Outcome::SectionUnknown);
                        }
                        Some(found) => NewsHit {
                            date: found.date,
                            section: found.section,
                            articles: found.articles,
                        },
                        None => {
                            return Answer::new(
                                no_results_message(&date_label(None), None),
                                Outcome::NoResults,
                            );
                        }
                    }
                }
                Err(e) => return Answer::failed(&e, Outcome::GenerationFailed),
            },
        };

        let articles = self.budget.apply(hit.articles);
        let context = assemble(&articles);
        if let Err(e) = self.sessions.put(session_id, context.clone()).await {
            return Answer::failed(&e, Outcome::StoreFailed);
        }

        let mode = AnswerMode::Summarize {
            date_label: date_label(hit.date),
            section_label: hit
                .section
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| ALL_SECTIONS_LABEL.to_string()),
            context,
        };
        self.generate(question, &mode, Outcome::Summarized).await
    }

    async fn generate(&self, question: &str, mode: &AnswerMode, outcome: Outcome) -> Answer {
        match self.answers.generate(question, mode).await {
            Ok(text) => Answer::new(text, outcome),
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                Answer::failed(&e, Outcome::GenerationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{final_turn, tool_turn, ScriptedChat};
    use crate::agent::ModelTurn;
    use crate::config::RetrievalSettings;
    use crate::context::MemorySessionStore;
    use crate::error::GenerationFailure;
    use crate::llm::testing::ScriptedGenerator;
    use crate::store::{
        sample_article, ArticleFilter, Article, FindOptions, InsertReport, MemoryArticleStore,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 12).unwrap()
    }

    fn yesterday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()
    }

    /// Memory store that counts `find` calls.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryArticleStore,
        finds: AtomicUsize,
    }

    #[async_trait]
    impl ArticleStore for CountingStore {
        async fn insert_batch(&self, articles: &[Article]) -> Result<InsertReport> {
            self.inner.insert_batch(articles).await
        }

        async fn find(
            &self,
            filter: &ArticleFilter,
            options: &FindOptions,
        ) -> Result<Vec<ArticleView>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find(filter, options).await
        }

        async fn count(&self, filter: &ArticleFilter) -> Result<usize> {
            self.inner.count(filter).await
        }
    }

    /// Generator that never answers in time.
    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    struct Fixture {
        pipeline: NewsPipeline,
        generator: Arc<ScriptedGenerator>,
        store: Arc<CountingStore>,
        sessions: Arc<MemorySessionStore>,
    }

    async fn fixture(
        generator: ScriptedGenerator,
        classifier: Option<Arc<dyn IntentClassifier>>,
        articles: Vec<Article>,
    ) -> Fixture {
        let generator = Arc::new(generator);
        let store = Arc::new(CountingStore::default());
        store.insert_batch(&articles).await.unwrap();
        let sessions = Arc::new(MemorySessionStore::new());

        let classifier = classifier.unwrap_or_else(|| {
            Arc::new(LlmIntentClassifier::new(generator.clone(), Prompts::default()))
        });
        let pipeline = NewsPipeline::new(
            classifier,
            Arc::new(RuleExtractor),
            Arc::new(RetrievalResolver::new(store.clone(), RetrievalSettings::default())),
            AnswerGenerator::new(generator.clone(), Prompts::default()),
            sessions.clone(),
        );

        Fixture {
            pipeline,
            generator,
            store,
            sessions,
        }
    }

    fn economy_articles() -> Vec<Article> {
        vec![
            sample_article(Section::Economy, yesterday(), "기준금리 동결"),
            sample_article(Section::Economy, yesterday(), "환율 급등"),
            sample_article(Section::Economy, yesterday(), "수출 회복"),
            sample_article(Section::Economy, today(), "오늘 기사"),
            sample_article(Section::Politics, yesterday(), "국회 본회의"),
        ]
    }

    #[tokio::test]
    async fn test_yesterday_economy_news_is_summarized() {
        let f = fixture(
            ScriptedGenerator::new(["1. 뉴스 요청", "어제 경제는 금리와 환율이 화두였습니다."]),
            None,
            economy_articles(),
        )
        .await;

        let answer = f.pipeline.ask_on("u1", "어제 경제 뉴스 알려줘", today()).await;

        assert_eq!(answer.outcome, Outcome::Summarized);
        assert!(!answer.text.is_empty());
        assert_eq!(f.generator.calls(), 2);

        let prompt = &f.generator.prompts()[1];
        assert!(prompt.contains("2025-02-11의 경제 뉴스"));
        for title in ["기준금리 동결", "환율 급등", "수출 회복"] {
            assert!(prompt.contains(&format!("제목: {}", title)), "{}", title);
        }
        assert!(!prompt.contains("오늘 기사"));
        assert!(!prompt.contains("국회 본회의"));
    }

    #[tokio::test]
    async fn test_small_talk_skips_retrieval() {
        let f = fixture(
            ScriptedGenerator::new(["3. 일상 대화", "안녕하세요! 무엇을 도와드릴까요?"]),
            None,
            economy_articles(),
        )
        .await;

        let answer = f.pipeline.ask_on("u1", "안녕", today()).await;

        assert_eq!(answer.outcome, Outcome::Chatted);
        assert!(!answer.text.is_empty());
        assert_eq!(f.store.finds.load(Ordering::SeqCst), 0);
        let prompt = &f.generator.prompts()[1];
        assert!(prompt.contains("안녕"));
        assert!(!prompt.contains("제목:"));
    }

    #[tokio::test]
    async fn test_unknown_section_returns_guidance_without_generation() {
        let f = fixture(
            ScriptedGenerator::new(["unused"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;

        let answer = f.pipeline.ask_on("u1", "어제 뉴스 알려줘", today()).await;

        assert_eq!(answer.outcome, Outcome::SectionUnknown);
        assert_eq!(answer.text, GUIDANCE_MESSAGE);
        assert_eq!(f.generator.calls(), 0);
        assert_eq!(f.store.finds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_results_skips_generation() {
        let f = fixture(
            ScriptedGenerator::new(["unused"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;

        let answer = f.pipeline.ask_on("u1", "어제 세계 뉴스", today()).await;

        assert_eq!(answer.outcome, Outcome::NoResults);
        assert_eq!(answer.text, "❌ 2025-02-11의 세계 뉴스가 없습니다. ❌");
        assert_eq!(f.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_session_holds_only_latest_news() {
        let f = fixture(
            ScriptedGenerator::new(["요약"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;

        f.pipeline.ask_on("u1", "어제 경제 뉴스", today()).await;
        f.pipeline.ask_on("u1", "어제 정치 뉴스", today()).await;

        let cached = f.sessions.get("u1").await.unwrap().unwrap();
        assert_eq!(cached, "제목: 국회 본회의\n날짜: 2025-02-11\n내용: 국회 본회의 본문");
        assert!(!cached.contains("기준금리"));
    }

    #[tokio::test]
    async fn test_concept_question_uses_session_context() {
        let f = fixture(
            ScriptedGenerator::new(["요약"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;

        f.pipeline.ask_on("u1", "어제 경제 뉴스", today()).await;
        let answer = f.pipeline.ask_on("u1", "기준금리가 뭐야?", today()).await;
        assert_eq!(answer.outcome, Outcome::Explained);
        assert!(f.generator.prompts()[1].contains("제목: 기준금리 동결"));

        // a different session has no cached news
        f.pipeline.ask_on("u2", "환율이 뭐야?", today()).await;
        assert!(f.generator.prompts()[2].contains("(없음)"));
    }

    #[tokio::test]
    async fn test_classification_failure_falls_back_to_small_talk() {
        let f = fixture(
            ScriptedGenerator::from_results(vec![
                Err(NewsdeskError::generation(GenerationFailure::Rejected, "bad key")),
                Ok("반가워요".to_string()),
            ]),
            None,
            Vec::new(),
        )
        .await;

        let answer = f.pipeline.ask_on("u1", "안녕", today()).await;
        assert_eq!(answer.outcome, Outcome::Chatted);
        assert_eq!(answer.text, "반가워요");
    }

    #[tokio::test]
    async fn test_classification_failure_can_be_reported() {
        let f = fixture(
            ScriptedGenerator::failing(GenerationFailure::Rejected),
            None,
            Vec::new(),
        )
        .await;
        let settings = PipelineSettings {
            on_classification_error: ClassificationFallback::AnswerError,
            ..PipelineSettings::default()
        };
        let pipeline = f.pipeline.with_settings(&settings);

        let answer = pipeline.ask_on("u1", "안녕", today()).await;
        assert_eq!(answer.outcome, Outcome::ClassificationFailed);
        assert_eq!(f.generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_text() {
        let f = fixture(
            ScriptedGenerator::from_results(vec![
                Ok("1. 뉴스 요청".to_string()),
                Err(NewsdeskError::generation(GenerationFailure::Rejected, "model not found")),
            ]),
            None,
            economy_articles(),
        )
        .await;

        let answer = f.pipeline.ask_on("u1", "어제 경제 뉴스", today()).await;
        assert_eq!(answer.outcome, Outcome::GenerationFailed);
        assert!(answer
            .text
            .starts_with("답변을 생성하는 중 오류가 발생했습니다:"));
        assert!(answer.text.contains("model not found"));
    }

    #[tokio::test]
    async fn test_date_only_retrieval_when_section_optional() {
        let f = fixture(
            ScriptedGenerator::new(["요약"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;
        let settings = PipelineSettings {
            require_section: false,
            ..PipelineSettings::default()
        };
        let pipeline = f.pipeline.with_settings(&settings);

        let answer = pipeline.ask_on("u1", "어제 뉴스 알려줘", today()).await;
        assert_eq!(answer.outcome, Outcome::Summarized);
        let prompt = &f.generator.prompts()[0];
        assert!(prompt.contains("2025-02-11의 전체 뉴스"));
        assert!(prompt.contains("국회 본회의"));
        assert!(prompt.contains("수출 회복"));
    }

    /// Rule pipeline over the fixture's store with a scripted agent retriever.
    fn agent_pipeline(f: &Fixture, turns: Vec<ModelTurn>) -> NewsPipeline {
        let resolver = Arc::new(RetrievalResolver::new(
            f.store.clone(),
            RetrievalSettings::default(),
        ));
        let agent = Agent::new(
            Arc::new(ScriptedChat::new(turns)),
            ToolContext::new(resolver.clone()),
            "오늘은 {{today}}",
        );
        NewsPipeline::new(
            Arc::new(KeywordIntentClassifier),
            Arc::new(RuleExtractor),
            resolver,
            AnswerGenerator::new(f.generator.clone(), Prompts::default()),
            f.sessions.clone(),
        )
        .with_agent(Arc::new(agent))
    }

    fn date_only_search() -> Vec<ModelTurn> {
        vec![
            tool_turn("search_news", r#"{"date": "2025-02-11"}"#),
            final_turn("검색 완료"),
        ]
    }

    #[tokio::test]
    async fn test_agent_search_without_section_returns_guidance() {
        let f = fixture(
            ScriptedGenerator::new(["unused"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;
        let pipeline = agent_pipeline(&f, date_only_search());

        let answer = pipeline.ask_on("u1", "어제 뉴스 알려줘", today()).await;

        assert_eq!(answer.outcome, Outcome::SectionUnknown);
        assert_eq!(answer.text, GUIDANCE_MESSAGE);
        assert_eq!(f.generator.calls(), 0);
        assert_eq!(f.sessions.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_agent_date_only_search_when_section_optional() {
        let f = fixture(
            ScriptedGenerator::new(["어제는 여러 소식이 있었습니다."]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;
        let settings = PipelineSettings {
            require_section: false,
            ..PipelineSettings::default()
        };
        let pipeline = agent_pipeline(&f, date_only_search()).with_settings(&settings);

        let answer = pipeline.ask_on("u1", "어제 뉴스 알려줘", today()).await;

        assert_eq!(answer.outcome, Outcome::Summarized);
        assert_eq!(f.generator.calls(), 1);
        assert!(f.generator.prompts()[0].contains("2025-02-11의 전체 뉴스"));
    }

    #[tokio::test]
    async fn test_agent_section_search_is_summarized() {
        let f = fixture(
            ScriptedGenerator::new(["금리와 환율이 화두였습니다."]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;
        let pipeline = agent_pipeline(
            &f,
            vec![
                tool_turn("search_news", r#"{"date": "2025-02-11", "section": "경제"}"#),
                final_turn("검색 완료"),
            ],
        );

        let answer = pipeline.ask_on("u1", "어제 경제 뉴스 알려줘", today()).await;

        assert_eq!(answer.outcome, Outcome::Summarized);
        let context = f.sessions.get("u1").await.unwrap().unwrap();
        assert!(context.contains("기준금리 동결"));
        assert!(!context.contains("국회 본회의"));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let store = Arc::new(MemoryArticleStore::new());
        let pipeline = NewsPipeline::new(
            Arc::new(KeywordIntentClassifier),
            Arc::new(RuleExtractor),
            Arc::new(RetrievalResolver::new(store, RetrievalSettings::default())),
            AnswerGenerator::new(Arc::new(SlowGenerator), Prompts::default()),
            Arc::new(MemorySessionStore::new()),
        )
        .with_timeout(Duration::from_millis(50));

        let answer = pipeline.ask_on("u1", "안녕", today()).await;
        assert_eq!(answer.outcome, Outcome::TimedOut);
        assert_eq!(answer.text, TIMEOUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_reset_session() {
        let f = fixture(
            ScriptedGenerator::new(["요약"]),
            Some(Arc::new(KeywordIntentClassifier)),
            economy_articles(),
        )
        .await;

        f.pipeline.ask_on("u1", "어제 경제 뉴스", today()).await;
        f.pipeline.reset_session("u1").await.unwrap();
        assert_eq!(f.sessions.get("u1").await.unwrap(), None);
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&Outcome::SectionUnknown).unwrap();
        assert_eq!(json, "\"section_unknown\"");
        assert_eq!(Outcome::NoResults.to_string(), "no_results");
        assert_eq!(no_results_message("최근", None), "❌ 최근의 뉴스가 없습니다. ❌");
    }
}
