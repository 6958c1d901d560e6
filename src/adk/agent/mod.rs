// SPDX-License-Identifier: MIT

//! Agent module - the Agent trait and the tool-calling `LLMAgent`

mod llm;

pub use llm::LLMAgent;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Progress reported while an agent runs; serialized as `{"type": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AgentEvent {
    Thought(String),
    ToolCall {
        name: String,
        args: serde_json::Value,
    },
    ToolResult {
        name: String,
        result: serde_json::Value,
    },
    Answer(String),
    Error(String),
}

/// Core agent trait
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, input: String) -> Result<String, AppError>;

    /// Run the agent, reporting progress on `tx`
    async fn run_stream(
        &self,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, AppError> {
        match self.run(input).await {
            Ok(res) => {
                let _ = tx.send(AgentEvent::Answer(res.clone())).await;
                Ok(res)
            }
            Err(e) => {
                let _ = tx.send(AgentEvent::Error(e.to_string())).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, input: String) -> Result<String, AppError> {
            if input.is_empty() {
                return Err(AppError::validation("empty input"));
            }
            Ok(format!("echo: {}", input))
        }
    }

    #[tokio::test]
    async fn test_default_run_stream_reports_answer() {
        let (tx, mut rx) = mpsc::channel(4);
        let out = EchoAgent.run_stream("湖南".to_string(), tx).await.unwrap();
        assert_eq!(out, "echo: 湖南");
        let answer = AgentEvent::Answer("echo: 湖南".to_string());
        assert_eq!(rx.recv().await, Some(answer));
    }

    #[tokio::test]
    async fn test_default_run_stream_reports_error() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(EchoAgent.run_stream(String::new(), tx).await.is_err());
        assert!(matches!(rx.recv().await, Some(AgentEvent::Error(_))));
    }

    #[test]
    fn test_event_wire_shape() {
        let event = AgentEvent::ToolCall {
            name: "get_college".to_string(),
            args: json!({"college_id": 10533}),
        };
        let expected = json!({
            "type": "ToolCall",
            "data": {"name": "get_college", "args": {"college_id": 10533}}
        });
        assert_eq!(serde_json::to_value(&event).unwrap(), expected);
        assert_eq!(
            serde_json::to_value(AgentEvent::Answer("ok".to_string())).unwrap(),
            json!({"type": "Answer", "data": "ok"})
        );
    }
}
