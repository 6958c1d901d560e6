// SPDX-License-Identifier: MIT

//! OpenAI-compatible chat completions client

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::tool::Tool;
use crate::config::ModelSettings;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

const PROVIDER: &str = "openai";

pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Build a client from the `model` settings section; the API key is required.
    pub fn new(settings: &ModelSettings) -> Result<Self, AppError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::config("OPENAI_API_KEY must be set"))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name: settings.name.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert internal Content to OpenAI messages. Tool responses expand to
    /// one `tool` message each.
    fn content_to_openai_messages(content: &Content) -> Vec<Value> {
        let role = match content.role.as_str() {
            "model" => "assistant",
            other => other,
        };

        let responses: Vec<Value> = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse { id, response, .. } => Some(json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "content": response.to_string()
                })),
                _ => None,
            })
            .collect();
        if !responses.is_empty() {
            return responses;
        }

        let mut tool_calls = Vec::new();
        let mut text_content = String::new();

        for part in &content.parts {
            match part {
                Part::Text(t) => text_content.push_str(t),
                Part::FunctionCall { id, name, args } => {
                    tool_calls.push(json!({
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": args.to_string()
                        }
                    }));
                }
                Part::FunctionResponse { .. } => {}
            }
        }

        let message = if !tool_calls.is_empty() {
            json!({
                "role": role,
                "content": if text_content.is_empty() { Value::Null } else { json!(text_content) },
                "tool_calls": tool_calls
            })
        } else {
            json!({
                "role": role,
                "content": text_content
            })
        };
        vec![message]
    }

    fn tools_to_openai_format(tools: &[Arc<dyn Tool>]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema()
                    }
                })
            })
            .collect()
    }

    fn parse_openai_response(response: &Value) -> Result<Content, AppError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| AppError::upstream(PROVIDER, "no choices in response"))?;

        let message = &choice["message"];
        let mut parts = Vec::new();

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for (i, tc) in tool_calls.iter().enumerate() {
                let name = tc["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let id = tc["id"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{}", i));
                // Malformed arguments reach the tool as an empty object and fail there
                let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
                let args: Value = serde_json::from_str(args_str).unwrap_or_else(|_| json!({}));

                parts.push(Part::FunctionCall { id, name, args });
            }
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<Value> = history
            .iter()
            .flat_map(Self::content_to_openai_messages)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(Self::tools_to_openai_format(tools));
                body["tool_choice"] = json!("auto");
            }
        }

        log::debug!(
            "OpenAI request: {} messages to {}",
            messages_len(&body),
            url
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            let message = format!("{}: {}", status, text);
            return Err(AppError::upstream(PROVIDER, message));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

fn messages_len(body: &Value) -> usize {
    body["messages"].as_array().map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(api_key: Option<&str>) -> ModelSettings {
        ModelSettings {
            api_key: api_key.map(str::to_string),
            base_url: "http://localhost:8000/v1/".to_string(),
            ..ModelSettings::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(matches!(OpenAIModel::new(&settings(None)), Err(AppError::Config(_))));
        assert!(matches!(OpenAIModel::new(&settings(Some(""))), Err(AppError::Config(_))));

        let model = OpenAIModel::new(&settings(Some("sk-test"))).unwrap();
        assert_eq!(model.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_content_to_openai_roles() {
        let msgs = OpenAIModel::content_to_openai_messages(&Content::user("你好"));
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["role"], "user");
        assert_eq!(msgs[0]["content"], "你好");

        let msgs = OpenAIModel::content_to_openai_messages(&Content::system("You are helpful"));
        assert_eq!(msgs[0]["role"], "system");

        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::Text("I can help".to_string())],
        };
        let msgs = OpenAIModel::content_to_openai_messages(&content);
        assert_eq!(msgs[0]["role"], "assistant");
        assert_eq!(msgs[0]["content"], "I can help");
    }

    #[test]
    fn test_content_to_openai_with_function_call() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                id: "call_1".to_string(),
                name: "search_colleges".to_string(),
                args: json!({"province": "湖南"}),
            }],
        };

        let msgs = OpenAIModel::content_to_openai_messages(&content);
        assert_eq!(msgs[0]["role"], "assistant");
        assert!(msgs[0]["content"].is_null());

        let tool_call = &msgs[0]["tool_calls"][0];
        assert_eq!(tool_call["id"], "call_1");
        assert_eq!(tool_call["function"]["name"], "search_colleges");
        let args: Value =
            serde_json::from_str(tool_call["function"]["arguments"].as_str().unwrap()).unwrap();
        assert_eq!(args["province"], "湖南");
    }

    #[test]
    fn test_each_function_response_becomes_tool_message() {
        let content = Content {
            role: "user".to_string(),
            parts: vec![
                Part::FunctionResponse {
                    id: "call_1".to_string(),
                    name: "get_college".to_string(),
                    response: json!({"name": "中南大学"}),
                },
                Part::FunctionResponse {
                    id: "call_2".to_string(),
                    name: "get_climate".to_string(),
                    response: json!({"error": "not found"}),
                },
            ],
        };

        let msgs = OpenAIModel::content_to_openai_messages(&content);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0]["role"], "tool");
        assert_eq!(msgs[0]["tool_call_id"], "call_1");
        assert_eq!(msgs[1]["tool_call_id"], "call_2");
        let body: Value = serde_json::from_str(msgs[1]["content"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], "not found");
    }

    #[test]
    fn test_parse_openai_text_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello, how can I help?"
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.role, "model");
        assert_eq!(content.parts, vec![Part::Text("Hello, how can I help?".to_string())]);
    }

    #[test]
    fn test_parse_openai_function_call_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "get_climate",
                            "arguments": "{\"admin_code\": \"156430100\"}"
                        }
                    }]
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.parts.len(), 1);

        match &content.parts[0] {
            Part::FunctionCall { id, name, args } => {
                assert_eq!(id, "call_123");
                assert_eq!(name, "get_climate");
                assert_eq!(args["admin_code"], "156430100");
            }
            _ => panic!("Expected FunctionCall part"),
        }
    }

    #[test]
    fn test_parse_empty_choices_is_upstream_error() {
        let err = OpenAIModel::parse_openai_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}
