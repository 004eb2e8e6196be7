//! Tool definitions and implementations for the news search agent.
//!
//! Tool arguments arrive as JSON text from the model. They are parsed into
//! typed values and never evaluated.

use crate::error::{NewsdeskError, Result};
use crate::query::{parse_date_value, section_from_text, DateExpr};
use crate::retrieval::{Retrieval, RetrievalResolver};
use crate::store::{ArticleView, Section};
use chrono::{Days, NaiveDate};
use std::sync::Arc;

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// Search stored articles by date and section.
    SearchNews {
        date: Option<DateExpr>,
        section: Option<Section>,
    },

    /// List the searchable sections.
    ListSections,
}

/// What a tool returned: text for the model, plus articles for a search hit.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
    pub articles: Option<Vec<ArticleView>>,
}

impl ToolOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            articles: None,
        }
    }
}

/// Tool execution context with access to retrieval.
pub struct ToolContext {
    pub resolver: Arc<RetrievalResolver>,
}

impl ToolContext {
    pub fn new(resolver: Arc<RetrievalResolver>) -> Self {
        Self { resolver }
    }

    /// Execute a tool call.
    pub async fn execute(&self, tool: &ToolCall, today: NaiveDate) -> Result<ToolOutput> {
        match tool {
            ToolCall::SearchNews { date, section } => {
                self.execute_search(*date, *section, today).await
            }
            ToolCall::ListSections => Ok(ToolOutput::text(
                Section::ALL
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }

    async fn execute_search(
        &self,
        date: Option<DateExpr>,
        section: Option<Section>,
        today: NaiveDate,
    ) -> Result<ToolOutput> {
        match self.resolver.resolve(date, section, today).await? {
            Retrieval::NoResults { .. } => Ok(ToolOutput::text("해당 조건의 뉴스가 없습니다.")),
            Retrieval::Found(articles) => {
                let formatted = articles
                    .iter()
                    .enumerate()
                    .map(|(i, a)| format!("{}. [{}] {} ({})", i + 1, a.date, a.title, a.press))
                    .collect::<Vec<_>>()
                    .join("\n");

                Ok(ToolOutput {
                    text: format!("{}건의 기사를 찾았습니다:\n{}", articles.len(), formatted),
                    articles: Some(articles),
                })
            }
        }
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "search_news".to_string(),
                description: Some(
                    "저장된 뉴스 기사를 날짜(date)와 분야(section)로 검색합니다. \
                    section은 한국어 분야 이름으로 입력하세요."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "date": {
                            "type": "string",
                            "description": "YYYY-MM-DD, \"어제\", \"최근\" 또는 \"일주일\". 날짜 조건이 없으면 생략"
                        },
                        "section": {
                            "type": "string",
                            "enum": ["정치", "경제", "사회", "생활문화", "IT과학", "세계"],
                            "description": "뉴스 분야"
                        }
                    }
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "list_sections".to_string(),
                description: Some("검색할 수 있는 뉴스 분야 목록을 반환합니다.".to_string()),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {}
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a date argument. "어제" is resolved against `today`.
fn parse_date_arg(value: &str, today: NaiveDate) -> Result<Option<DateExpr>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.contains("어제") {
        return Ok(today.checked_sub_days(Days::new(1)).map(DateExpr::Exact));
    }
    if value.contains("오늘") {
        return Ok(Some(DateExpr::Exact(today)));
    }
    parse_date_value(value)
        .map(Some)
        .ok_or_else(|| NewsdeskError::Agent(format!("Unrecognized date: {}", value)))
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str, today: NaiveDate) -> Result<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| NewsdeskError::Agent(format!("Invalid tool arguments: {}", e)))?
    };

    match name {
        "search_news" => {
            let date = match args["date"].as_str() {
                Some(value) => parse_date_arg(value, today)?,
                None => None,
            };
            let section = match args["section"].as_str().map(str::trim) {
                Some(value) if !value.is_empty() => Some(section_from_text(value).ok_or_else(
                    || NewsdeskError::Agent(format!("Unknown section: {}", value)),
                )?),
                _ => None,
            };
            Ok(ToolCall::SearchNews { date, section })
        }
        "list_sections" => Ok(ToolCall::ListSections),
        _ => Err(NewsdeskError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalSettings;
    use crate::store::{sample_article, ArticleStore, MemoryArticleStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 12).unwrap()
    }

    #[test]
    fn test_parse_search_news() {
        let tool = parse_tool_call(
            "search_news",
            r#"{"date": "2025-02-11", "section": "경제"}"#,
            today(),
        )
        .unwrap();
        assert_eq!(
            tool,
            ToolCall::SearchNews {
                date: Some(DateExpr::Exact(NaiveDate::from_ymd_opt(2025, 2, 11).unwrap())),
                section: Some(Section::Economy),
            }
        );

        match parse_tool_call("search_news", r#"{"date": "어제", "section": "아이티"}"#, today())
            .unwrap()
        {
            ToolCall::SearchNews { date, section } => {
                assert_eq!(
                    date,
                    Some(DateExpr::Exact(NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()))
                );
                assert_eq!(section, Some(Section::ItScience));
            }
            _ => panic!("Expected SearchNews"),
        }

        match parse_tool_call("search_news", r#"{"date": "최근"}"#, today()).unwrap() {
            ToolCall::SearchNews { date, section } => {
                assert_eq!(date, Some(DateExpr::Recent));
                assert_eq!(section, None);
            }
            _ => panic!("Expected SearchNews"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(parse_tool_call("search_news", r#"{"section": "스포츠"}"#, today()).is_err());
        assert!(parse_tool_call("search_news", r#"{"date": "언젠가"}"#, today()).is_err());
        // expression-looking text is just an invalid argument string
        assert!(parse_tool_call("search_news", "{'date': __import__('os')}", today()).is_err());
        assert!(parse_tool_call("drop_table", "{}", today()).is_err());
    }

    #[test]
    fn test_parse_list_sections() {
        assert_eq!(
            parse_tool_call("list_sections", "", today()).unwrap(),
            ToolCall::ListSections
        );
    }

    #[test]
    fn test_tool_definitions() {
        let names: Vec<_> = tool_definitions()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(names, vec!["search_news", "list_sections"]);
    }

    #[tokio::test]
    async fn test_execute_search_returns_articles() {
        let store = Arc::new(MemoryArticleStore::new());
        store
            .insert_batch(&[sample_article(Section::Economy, today(), "물가")])
            .await
            .unwrap();
        let context = ToolContext::new(Arc::new(RetrievalResolver::new(
            store,
            RetrievalSettings::default(),
        )));

        let hit = context
            .execute(
                &ToolCall::SearchNews {
                    date: Some(DateExpr::Exact(today())),
                    section: Some(Section::Economy),
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(hit.articles.map(|a| a.len()), Some(1));
        assert!(hit.text.contains("물가"));

        let miss = context
            .execute(
                &ToolCall::SearchNews {
                    date: None,
                    section: Some(Section::World),
                },
                today(),
            )
            .await
            .unwrap();
        assert!(miss.articles.is_none());

        let sections = context.execute(&ToolCall::ListSections, today()).await.unwrap();
        assert!(sections.text.contains("생활문화"));
    }
}
