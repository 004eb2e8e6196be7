//! Answer generation: one prompt, one generation call.

use crate::config::Prompts;
use crate::error::Result;
use crate::llm::TextGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shown in concept prompts when the session has no cached news.
pub const NO_CONTEXT: &str = "(없음)";

/// How to answer a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerMode {
    /// Summarize retrieved articles.
    Summarize {
        date_label: String,
        section_label: String,
        context: String,
    },
    /// Explain a concept, using the session's last news context if any.
    ConceptExplain { context: Option<String> },
    /// Answer directly, no retrieved context.
    Passthrough,
}

impl AnswerMode {
    fn name(&self) -> &'static str {
        match self {
            AnswerMode::Summarize { .. } => "summarize",
            AnswerMode::ConceptExplain { .. } => "concept",
            AnswerMode::Passthrough => "passthrough",
        }
    }
}

/// Renders the mode's template and calls the generator once.
pub struct AnswerGenerator {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Prompts) -> Self {
        Self { generator, prompts }
    }

    /// Build the prompt for a question in the given mode.
    pub fn build_prompt(&self, question: &str, mode: &AnswerMode) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());

        let template = match mode {
            AnswerMode::Summarize {
                date_label,
                section_label,
                context,
            } => {
                vars.insert("date".to_string(), date_label.clone());
                vars.insert("section".to_string(), section_label.clone());
                vars.insert("context".to_string(), context.clone());
                &self.prompts.answer.summarize
            }
            AnswerMode::ConceptExplain { context } => {
                let context = context
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(NO_CONTEXT);
                vars.insert("context".to_string(), context.to_string());
                &self.prompts.answer.concept
            }
            AnswerMode::Passthrough => &self.prompts.answer.passthrough,
        };

        self.prompts.render_with_custom(template, &vars)
    }

    #[instrument(skip(self, mode), fields(mode = mode.name()))]
    pub async fn generate(&self, question: &str, mode: &AnswerMode) -> Result<String> {
        let prompt = self.build_prompt(question, mode);
        let answer = self.generator.generate(&prompt).await?;
        debug!(chars = answer.chars().count(), "Generated answer");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    fn generator() -> AnswerGenerator {
        AnswerGenerator::new(Arc::new(ScriptedGenerator::new(["ok"])), Prompts::default())
    }

    #[test]
    fn test_summarize_prompt_embeds_everything() {
        let prompt = generator().build_prompt(
            "어제 경제 뉴스 알려줘",
            &AnswerMode::Summarize {
                date_label: "2025-02-11".to_string(),
                section_label: "경제".to_string(),
                context: "제목: 금리\n날짜: 2025-02-11\n내용: 동결".to_string(),
            },
        );

        assert!(prompt.contains("2025-02-11의 경제 뉴스"));
        assert!(prompt.contains("공통된 흐름"));
        assert!(prompt.contains("전문 용어"));
        assert!(prompt.contains("제목: 금리\n날짜: 2025-02-11\n내용: 동결"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_concept_prompt_without_context() {
        let prompt = generator()
            .build_prompt("환율이 뭐야?", &AnswerMode::ConceptExplain { context: None });
        assert!(prompt.contains("환율이 뭐야?"));
        assert!(prompt.contains(NO_CONTEXT));
        assert!(prompt.contains("일반적인 지식"));
    }

    #[test]
    fn test_question_placeholders_stay_literal() {
        let mode = AnswerMode::ConceptExplain {
            context: Some("CACHED_NEWS".to_string()),
        };
        let prompt = generator().build_prompt("{{context}} 이게 뭐야?", &mode);

        assert_eq!(prompt.matches("CACHED_NEWS").count(), 1);
        assert!(prompt.contains("{{context}} 이게 뭐야?"));
    }

    #[test]
    fn test_passthrough_prompt() {
        let prompt = generator().build_prompt("안녕", &AnswerMode::Passthrough);
        assert!(prompt.ends_with("안녕"));
        assert!(!prompt.contains("제목:"));
    }

    #[tokio::test]
    async fn test_generate_calls_once() {
        let scripted = Arc::new(ScriptedGenerator::new(["안녕하세요!"]));
        let answers = AnswerGenerator::new(scripted.clone(), Prompts::default());

        let text = answers.generate("안녕", &AnswerMode::Passthrough).await.unwrap();
        assert_eq!(text, "안녕하세요!");
        assert_eq!(scripted.calls(), 1);
    }
}
