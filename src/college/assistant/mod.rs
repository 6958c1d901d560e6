// SPDX-License-Identifier: MIT

//! College database assistant
//!
//! An [`LLMAgent`] per message, holding [`tools::service_tools`] bound to the
//! user who is chatting. Histories live in [`Conversations`] so follow-up
//! messages keep their context.

mod conversations;
pub mod tools;

pub use conversations::Conversations;

use crate::adk::agent::{AgentEvent, LLMAgent};
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::college::service::Services;
use crate::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const MAX_CONVERSATIONS: usize = 1024;
const PROGRESS_BUFFER: usize = 32;

pub const ASSISTANT_PROMPT: &str = "\
# Role: college database assistant
You help Chinese gaokao students and administrators work with a database of
colleges, college evaluations, climate data and administrative divisions.

# Rules
- Use the tools to read or change data; never invent records.
- Look up a college with search_colleges or get_college before changing it.
- Changes by ordinary users are queued for review; tell the user when that happens.
- Only administrators may delete colleges or add climate data and divisions.
  If a tool reports missing privileges, explain that instead of retrying.
- For transit questions, geocode both ends first, then call plan_transit_route.
- Answer in the user's language, briefly, in plain text.
";

/// State of one message exchange: the conversation it belongs to and the
/// history checked out for it
pub struct ChatTurn {
    pub conversation_id: String,
    user_id: i64,
    history: Vec<Content>,
}

pub struct Assistant {
    services: Services,
    model: Arc<dyn Model>,
    config: GenerationConfig,
    max_turns: u32,
    timeout: Duration,
    conversations: Conversations,
}

impl Assistant {
    pub fn new(
        services: Services,
        model: Arc<dyn Model>,
        config: GenerationConfig,
        max_turns: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            services,
            model,
            config,
            max_turns,
            timeout,
            conversations: Conversations::new(MAX_CONVERSATIONS),
        }
    }

    fn agent(&self, user_id: i64) -> LLMAgent {
        LLMAgent::new(
            "college_assistant".to_string(),
            "Answers questions about the college database and edits it".to_string(),
            ASSISTANT_PROMPT.to_string(),
            self.model.clone(),
            tools::service_tools(&self.services, user_id),
        )
        .with_config(self.config.clone())
        .with_max_turns(self.max_turns)
    }

    /// Resume `conversation_id`, or start a new conversation
    pub async fn open(
        &self,
        conversation_id: Option<&str>,
        user_id: i64,
    ) -> Result<ChatTurn, AppError> {
        let (conversation_id, history) = self
            .conversations
            .checkout(conversation_id, user_id)
            .await?;
        Ok(ChatTurn {
            conversation_id,
            user_id,
            history,
        })
    }

    /// Answer one message, streaming progress on `tx`. The reply is abandoned
    /// when the agent emits nothing for longer than the idle timeout; turns
    /// completed before that stay in the history. The history is handed back
    /// to the conversation whatever the outcome.
    pub async fn reply(
        &self,
        turn: ChatTurn,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, AppError> {
        let ChatTurn {
            conversation_id,
            user_id,
            mut history,
        } = turn;
        let agent = self.agent(user_id);

        let (progress_tx, mut progress) = mpsc::channel(PROGRESS_BUFFER);
        let result = {
            let converse = agent.converse(&mut history, input, Some(&progress_tx));
            tokio::pin!(converse);
            let idle = tokio::time::sleep(self.timeout);
            tokio::pin!(idle);

            loop {
                tokio::select! {
                    result = &mut converse => break result,
                    Some(event) = progress.recv() => {
                        idle.as_mut().reset(Instant::now() + self.timeout);
                        let _ = tx.send(event).await;
                    }
                    () = &mut idle => {
                        break Err(AppError::other(format!(
                            "assistant was idle for more than {}s",
                            self.timeout.as_secs_f32()
                        )));
                    }
                }
            }
        };
        while let Ok(event) = progress.try_recv() {
            let _ = tx.send(event).await;
        }
        self.conversations.checkin(&conversation_id, history).await;

        if let Err(e) = &result {
            log::warn!("conversation {} failed: {}", conversation_id, e);
            let _ = tx.send(AgentEvent::Error(e.to_string())).await;
        }
        result
    }

    /// [`open`](Self::open) then [`reply`](Self::reply); returns the
    /// conversation id with the answer
    pub async fn chat(
        &self,
        conversation_id: Option<&str>,
        user_id: i64,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<(String, String), AppError> {
        let turn = self.open(conversation_id, user_id).await?;
        let id = turn.conversation_id.clone();
        let answer = self.reply(turn, input, tx).await?;
        Ok((id, answer))
    }
}
