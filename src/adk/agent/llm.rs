// SPDX-License-Identifier: MIT

//! LLM Agent - sends the conversation to a model and executes the tool
//! calls it asks for, until it answers in text or runs out of turns.

use super::{Agent, AgentEvent};
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::tool::Tool;
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

const DEFAULT_MAX_TURNS: u32 = 10;

pub struct LLMAgent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Vec<Arc<dyn Tool>>,
    config: GenerationConfig,
    max_turns: u32,
    tool_map: HashMap<String, usize>,
}

impl LLMAgent {
    pub fn new(
        name: String,
        description: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        let tool_map: HashMap<String, usize> = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        Self {
            name,
            description,
            instruction,
            model,
            tools,
            config: GenerationConfig::default(),
            max_turns: DEFAULT_MAX_TURNS,
            tool_map,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_map.get(name).map(|&i| &self.tools[i])
    }

    /// Continue a conversation. The system instruction is added when `history`
    /// is empty. On error `history` is restored to what it was on entry.
    pub async fn converse(
        &self,
        history: &mut Vec<Content>,
        input: String,
        tx: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<String, AppError> {
        let start = history.len();
        let result = self.turns(history, input, tx).await;
        if result.is_err() {
            history.truncate(start);
        }
        result
    }

    async fn turns(
        &self,
        history: &mut Vec<Content>,
        input: String,
        tx: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<String, AppError> {
        if history.is_empty() {
            history.push(Content::system(self.instruction.clone()));
        }
        history.push(Content::user(input));

        for turn in 0..self.max_turns {
            log::debug!("Agent {} turn {}/{}", self.name, turn + 1, self.max_turns);
            let response = self
                .model
                .generate_content(history, Some(&self.config), Some(&self.tools))
                .await?;

            let text = response.text();
            let calls: Vec<(String, String, Value)> = response
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::FunctionCall { id, name, args } => {
                        Some((id.clone(), name.clone(), args.clone()))
                    }
                    _ => None,
                })
                .collect();

            if calls.is_empty() {
                history.push(response);
                if text.is_empty() {
                    log::warn!("Agent {} received an empty response", self.name);
                }
                emit(tx, AgentEvent::Answer(text.clone())).await;
                return Ok(text);
            }

            if !text.is_empty() {
                emit(tx, AgentEvent::Thought(text)).await;
            }

            let mut responses = Vec::with_capacity(calls.len());
            for (id, name, args) in calls {
                log::info!("Agent {} calling tool {}", self.name, name);
                emit(
                    tx,
                    AgentEvent::ToolCall {
                        name: name.clone(),
                        args: args.clone(),
                    },
                )
                .await;

                let result = match self.get_tool(&name) {
                    Some(tool) => match tool.execute(args).await {
                        Ok(res) => res,
                        Err(e) => {
                            log::warn!("Tool {} failed: {}", name, e);
                            let message = format!("Tool {} failed: {}", name, e);
                            emit(tx, AgentEvent::Error(message)).await;
                            json!({ "error": e.to_string() })
                        }
                    },
                    None => {
                        log::warn!("Tool {} not found", name);
                        emit(tx, AgentEvent::Error(format!("Tool {} not found", name))).await;
                        json!({ "error": format!("Tool {} not found", name) })
                    }
                };

                emit(
                    tx,
                    AgentEvent::ToolResult {
                        name: name.clone(),
                        result: result.clone(),
                    },
                )
                .await;

                responses.push(Part::FunctionResponse {
                    id,
                    name,
                    response: result,
                });
            }

            history.push(response);
            history.push(Content {
                role: "user".to_string(),
                parts: responses,
            });
        }

        log::error!("Agent {} reached max turns without an answer", self.name);
        Err(AppError::MaxTurns(self.max_turns))
    }
}

async fn emit(tx: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) {
    if let Some(tx) = tx {
        // A closed receiver only means nobody is listening any more
        let _ = tx.send(event).await;
    }
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String, AppError> {
        let mut history = Vec::new();
        self.converse(&mut history, input, None).await
    }

    async fn run_stream(
        &self,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, AppError> {
        let mut history = Vec::new();
        self.converse(&mut history, input, Some(&tx)).await
    }
}
