//! Agent runner with tool calling loop.

use super::tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};
use crate::error::{NewsdeskError, Result};
use crate::llm::{classify_openai_error, with_retry, RetryPolicy};
use crate::query::DateExpr;
use crate::store::{ArticleView, Section};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One reply from the chat model.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    /// Empty when the model answered without calling a tool.
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
}

/// Chat model that can call the agent's tools.
#[async_trait]
pub trait ToolChat: Send + Sync {
    /// Send the conversation so far and return the model's next turn.
    async fn turn(&self, messages: &[ChatCompletionRequestMessage]) -> Result<ModelTurn>;
}

/// [`ToolChat`] over an OpenAI-compatible chat completions endpoint.
pub struct OpenAiToolChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiToolChat {
    pub fn new(client: async_openai::Client<async_openai::config::OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the retry policy for each model call.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

#[async_trait]
impl ToolChat for OpenAiToolChat {
    async fn turn(&self, messages: &[ChatCompletionRequestMessage]) -> Result<ModelTurn> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages.to_vec())
            .tools(tool_definitions())
            .build()
            .map_err(|e| NewsdeskError::Agent(e.to_string()))?;

        let client = &self.client;
        let response = with_retry(&self.retry, || {
            let request = request.clone();
            async move {
                client
                    .chat()
                    .create(request)
                    .await
                    .map_err(classify_openai_error)
            }
        })
        .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NewsdeskError::Agent("No response from model".to_string()))?;

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

/// Agent that searches the article store through tool calls.
pub struct Agent {
    chat: Arc<dyn ToolChat>,
    tools: ToolContext,
    max_iterations: usize,
    system_prompt: String,
}

impl Agent {
    /// Create a new agent with the given chat model and tool context.
    pub fn new(chat: Arc<dyn ToolChat>, tools: ToolContext, system_prompt: &str) -> Self {
        Self {
            chat,
            tools,
            max_iterations: 6,
            system_prompt: system_prompt.to_string(),
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run the agent on a question.
    ///
    /// The result carries the last search that returned articles, if any.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn run(&self, question: &str, today: NaiveDate) -> Result<AgentResponse> {
        let system_prompt = self
            .system_prompt
            .replace("{{today}}", &today.format("%Y-%m-%d").to_string());

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| NewsdeskError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(question)
                .build()
                .map_err(|e| NewsdeskError::Agent(e.to_string()))?
                .into(),
        ];

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();
        let mut found: Option<AgentFinding> = None;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                if found.is_some() {
                    warn!(
                        max_iterations = self.max_iterations,
                        "Agent hit the iteration limit, keeping the last search result"
                    );
                    return Ok(AgentResponse {
                        tool_calls: tool_calls_made,
                        iterations: iterations - 1,
                        found,
                    });
                }
                return Err(NewsdeskError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let turn = self.chat.turn(&messages).await?;
            if turn.tool_calls.is_empty() {
                debug!(reply = turn.content.as_deref().unwrap_or_default(), "Agent finished");
                return Ok(AgentResponse {
                    tool_calls: tool_calls_made,
                    iterations,
                    found,
                });
            }

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(turn.tool_calls.clone())
                .build()
                .map_err(|e| NewsdeskError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in &turn.tool_calls {
                let (record, finding) = self.execute_tool_call(tool_call, today).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| NewsdeskError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                if finding.is_some() {
                    found = finding;
                }
                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(
        &self,
        tool_call: &ChatCompletionMessageToolCall,
        today: NaiveDate,
    ) -> (ToolCallRecord, Option<AgentFinding>) {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let mut finding = None;
        let result = match parse_tool_call(name, arguments, today) {
            Ok(tool) => match self.tools.execute(&tool, today).await {
                Ok(output) => {
                    if let (ToolCall::SearchNews { date, section }, Some(articles)) =
                        (&tool, output.articles)
                    {
                        finding = Some(AgentFinding {
                            date: *date,
                            section: *section,
                            articles,
                        });
                    }
                    output.text
                }
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        let record = ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        };
        (record, finding)
    }
}

/// Articles found by the agent's last successful search.
#[derive(Debug, Clone)]
pub struct AgentFinding {
    pub date: Option<DateExpr>,
    pub section: Option<Section>,
    pub articles: Vec<ArticleView>,
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
    /// Last search that returned articles.
    pub found: Option<AgentFinding>,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_openai::types::{ChatCompletionToolType, FunctionCall};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A model turn that calls one tool.
    pub fn tool_turn(name: &str, arguments: &str) -> ModelTurn {
        ModelTurn {
            content: None,
            tool_calls: vec![ChatCompletionMessageToolCall {
                id: format!("call_{}", name),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
        }
    }

    /// A model turn that ends the loop.
    pub fn final_turn(text: &str) -> ModelTurn {
        ModelTurn {
            content: Some(text.to_string()),
            tool_calls: Vec::new(),
        }
    }

    /// Replays model turns in order; the last one repeats once the script runs out.
    pub struct ScriptedChat {
        script: Mutex<VecDeque<ModelTurn>>,
        last: Mutex<ModelTurn>,
        calls: Mutex<usize>,
    }

    impl ScriptedChat {
        pub fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                script: Mutex::new(turns.into()),
                last: Mutex::new(ModelTurn::default()),
                calls: Mutex::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ToolChat for ScriptedChat {
        async fn turn(&self, _messages: &[ChatCompletionRequestMessage]) -> Result<ModelTurn> {
            *self.calls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(turn) => {
                    *self.last.lock().unwrap() = turn.clone();
                    Ok(turn)
                }
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }
}
