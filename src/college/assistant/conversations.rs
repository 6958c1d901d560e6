// SPDX-License-Identifier: MIT

//! Chat histories keyed by conversation id

use crate::adk::model::Content;
use crate::error::AppError;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

struct Entry {
    owner: i64,
    history: Vec<Content>,
    busy: bool,
    last_used: Instant,
}

/// Histories taken out by [`Conversations::checkout`] are handed back with
/// [`Conversations::checkin`]. A conversation is busy in between.
pub struct Conversations {
    entries: RwLock<HashMap<String, Entry>>,
    capacity: usize,
}

impl Conversations {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Take the history of `id`, or start a new conversation when `id` is None
    pub async fn checkout(
        &self,
        id: Option<&str>,
        user_id: i64,
    ) -> Result<(String, Vec<Content>), AppError> {
        let mut entries = self.entries.write().await;
        let Some(id) = id else {
            let id = Uuid::new_v4().to_string();
            entries.insert(
                id.clone(),
                Entry {
                    owner: user_id,
                    history: Vec::new(),
                    busy: true,
                    last_used: Instant::now(),
                },
            );
            evict(&mut entries, self.capacity);
            log::debug!("conversation {} started by user {}", id, user_id);
            return Ok((id, Vec::new()));
        };

        let entry = entries
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("conversation not found"))?;
        if entry.owner != user_id {
            return Err(AppError::forbidden("conversation belongs to another user"));
        }
        if entry.busy {
            return Err(AppError::conflict(
                "conversation is already answering a message",
            ));
        }
        entry.busy = true;
        entry.last_used = Instant::now();
        Ok((id.to_string(), std::mem::take(&mut entry.history)))
    }

    /// Store the history back and release the conversation
    pub async fn checkin(&self, id: &str, history: Vec<Content>) {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(entry) => {
                entry.history = history;
                entry.busy = false;
                entry.last_used = Instant::now();
            }
            None => log::debug!("conversation {} was evicted while busy", id),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Drop the least recently used idle conversations beyond `capacity`
fn evict(entries: &mut HashMap<String, Entry>, capacity: usize) {
    while entries.len() > capacity {
        let oldest = entries
            .iter()
            .filter(|(_, entry)| !entry.busy)
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(id) => {
                entries.remove(&id);
                log::debug!("conversation {} evicted", id);
            }
            None => break,
        }
    }
}
