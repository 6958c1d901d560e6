// SPDX-License-Identifier: MIT

//! Model module - the LLM model trait and the conversation types it speaks
//!
//! [openai] implements it against any OpenAI-compatible chat completions API.

pub mod openai;

use crate::adk::tool::Tool;
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Parts of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    Text(String),
    /// Tool call requested by the model; `id` pairs it with its response
    FunctionCall {
        id: String,
        name: String,
        args: serde_json::Value,
    },
    FunctionResponse {
        id: String,
        name: String,
        response: serde_json::Value,
    },
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AppError>;
}

/// Single-shot completion: one system prompt, one user message, no tools
pub async fn complete(
    model: &dyn Model,
    system: &str,
    user: &str,
    config: Option<&GenerationConfig>,
) -> Result<String, AppError> {
    let history = [Content::system(system), Content::user(user)];
    let response = model.generate_content(&history, config, None).await?;
    Ok(response.text())
}
