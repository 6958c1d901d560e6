// SPDX-License-Identifier: MIT

//! Assistant chat over server-sent events, and the model-written analyses

use super::extract::{PathParams, Payload};
use super::AppState;
use crate::adk::agent::AgentEvent;
use crate::college::auth::AuthUser;
use crate::error::AppError;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "Content", alias = "content")]
    pub content: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

fn event_for(event: &AgentEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        log::error!("cannot serialize agent event: {}", e);
        Event::default()
            .event("error")
            .data(json!({"type": "Error", "data": e.to_string()}).to_string())
    })
}

/// Stream an assistant reply. The first event, named `conversation`, carries
/// the id to send back with follow-up messages.
pub async fn chat(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(request): Payload<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::validation("Content must not be empty"));
    }

    let turn = state
        .assistant
        .open(request.conversation_id.as_deref(), caller.user_id)
        .await?;
    let conversation_id = turn.conversation_id.clone();
    log::info!(
        "user {} chatting in conversation {}",
        caller.username,
        conversation_id
    );

    let (tx, rx) = mpsc::channel(100);
    let assistant = state.assistant.clone();
    tokio::spawn(async move {
        // Failures are already reported on the stream as Error events
        let _ = assistant.reply(turn, request.content, tx).await;
    });

    let opening = Event::default()
        .event("conversation")
        .data(json!({ "conversation_id": conversation_id }).to_string());
    let events = ReceiverStream::new(rx).map(|event| Ok(event_for(&event)));
    let stream = stream::once(async move { Ok(opening) }).chain(events);

    let keep_alive = KeepAlive::new().interval(Duration::from_secs(1));
    Ok(Sse::new(stream).keep_alive(keep_alive))
}

pub async fn traffic_analysis(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(college_id): PathParams<i64>,
) -> Result<Json<String>, AppError> {
    let analysis = state
        .services
        .analysis
        .traffic(caller.user_id, college_id)
        .await?;
    Ok(Json(analysis))
}

pub async fn climate_analysis(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(college_id): PathParams<i64>,
) -> Result<Json<String>, AppError> {
    let analysis = state
        .services
        .analysis
        .climate(caller.user_id, college_id)
        .await?;
    Ok(Json(analysis))
}
