//! Prompt templates for Newsdesk.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").ok());

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub intent: IntentPrompts,
    pub extract: ExtractPrompts,
    pub answer: AnswerPrompts,
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Few-shot prompt for intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentPrompts {
    pub classify: String,
}

impl Default for IntentPrompts {
    fn default() -> Self {
        Self {
            classify: r#"사용자의 질문을 보고 아래 중 하나로 분류하세요.
1. 뉴스 요청 (예: "어제의 경제 뉴스 분석해줘", "2월 7일 정치 뉴스 요약해줘", "세계 뉴스 알려줘", "IT 뉴스")
2. 일반 개념 질문 (예: "환율이 뭐야?", "금리가 뭐야?", "GDP란?")
3. 일상 대화 (예: 안녕, 하이, 오랜만이야, 배고파, 날씨 좋다, 오늘 날씨 어때?, 친구 짜증난다)

사용자의 질문: "{{question}}"

질문 유형:"#
                .to_string(),
        }
    }
}

/// Few-shot prompt for date and section extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractPrompts {
    pub extract: String,
}

impl Default for ExtractPrompts {
    fn default() -> Self {
        Self {
            extract: r#"오늘 날짜는 {{today}}입니다.
사용자의 질문에서 뉴스 날짜와 분야를 찾아 한 줄로만 답하세요.
날짜는 YYYY-MM-DD 형식, 또는 "최근", "일주일" 중 하나입니다. 알 수 없으면 "없음"이라고 쓰세요.
분야는 정치, 경제, 사회, 생활문화, IT과학, 세계 중 하나입니다. 알 수 없으면 "없음"이라고 쓰세요.

예시:
질문: "어제 경제 뉴스 알려줘" (오늘이 2025-02-12인 경우)
date: 2025-02-11, section: 경제
질문: "최근 IT 소식 요약해줘"
date: 최근, section: IT과학
질문: "일주일치 세계 뉴스"
date: 일주일, section: 세계

질문: "{{question}}"
"#
            .to_string(),
        }
    }
}

/// Prompts for the three answer modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub summarize: String,
    pub concept: String,
    pub passthrough: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            summarize: r#"다음은 {{date}}의 {{section}} 뉴스 기사입니다. 이를 바탕으로 뉴스 요약을 제공하세요.
1. 여러 개의 뉴스들을 보고, 공통된 흐름이나 트렌드를 알려주세요.
2. 중요한 뉴스라고 생각된다면, 따로 요약해서 알려주세요.
3. 전문 용어 등의 어려운 개념은 설명을 추가해주세요.

{{context}}

사용자의 질문: {{question}}

뉴스 분석:"#
                .to_string(),

            concept: r#"사용자의 질문: {{question}}

만약 관련 뉴스가 있다면 참고하세요:
{{context}}

관련 뉴스 내용이 없거나 질문과 관계가 없으면, 일반적인 지식을 바탕으로 답변하세요."#
                .to_string(),

            passthrough: r#"다음 사용자의 말에 자연스럽고 친절하게 한국어로 답하세요.

{{question}}"#
                .to_string(),
        }
    }
}

/// System prompt for the tool-calling retrieval agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"당신은 뉴스 기사 데이터베이스를 검색하는 도우미입니다. 오늘 날짜는 {{today}}입니다.

사용할 수 있는 도구:
- search_news: 날짜(date)와 분야(section)로 기사를 찾습니다. date는 YYYY-MM-DD, "최근", "일주일" 중 하나이며 생략할 수 있습니다. section은 한국어 분야 이름입니다.
- list_sections: 검색 가능한 분야 목록을 보여줍니다.

사용자의 질문에 맞는 기사를 찾을 때까지 search_news를 호출하세요. 기사를 찾았거나 더 찾을 수 없으면 짧게 "검색 완료"라고 답하세요."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let intent_path = custom_path.join("intent.toml");
            if intent_path.exists() {
                let content = std::fs::read_to_string(&intent_path)?;
                prompts.intent = toml::from_str(&content)?;
            }

            let extract_path = custom_path.join("extract.toml");
            if extract_path.exists() {
                let content = std::fs::read_to_string(&extract_path)?;
                prompts.extract = toml::from_str(&content)?;
            }

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in one pass over the template, so inserted
    /// values are never expanded again. Unknown placeholders are left as is.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let Some(re) = PLACEHOLDER.as_ref() else {
            return template.to_string();
        };
        re.replace_all(template, |caps: &regex::Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.intent.classify.contains("{{question}}"));
        assert!(prompts.answer.summarize.contains("{{context}}"));
        assert!(prompts.extract.extract.contains("date:"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        let template = "맥락: {{context}}\n질문: {{question}}";

        // fresh maps so both iteration orders get exercised
        for _ in 0..32 {
            let mut vars = HashMap::new();
            vars.insert("context".to_string(), "CACHED_NEWS".to_string());
            vars.insert("question".to_string(), "{{context}} 이게 뭐야? {{unknown}}".to_string());
            assert_eq!(
                Prompts::render(template, &vars),
                "맥락: CACHED_NEWS\n질문: {{context}} 이게 뭐야? {{unknown}}"
            );
        }
        assert_eq!(Prompts::render("{{missing}}", &HashMap::new()), "{{missing}}");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("persona".to_string(), "기자".to_string());
        custom.insert("question".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "안녕".to_string());
        let rendered = prompts.render_with_custom("{{persona}}: {{question}}", &vars);
        assert_eq!(rendered, "기자: 안녕");
    }

    #[test]
    fn test_custom_dir_overrides_one_group() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "passthrough = \"Q: {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.answer.passthrough, "Q: {{question}}");
        // untouched fields and groups keep their defaults
        assert!(!prompts.answer.summarize.is_empty());
        assert_eq!(prompts.intent.classify, IntentPrompts::default().classify);
    }
}
