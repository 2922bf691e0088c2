//! Message store interface and in-memory reference implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{ChatMessage, Thread};

/// Durable key-value upsert/read of messages by thread.
///
/// `upsert` must be idempotent on message id: the same id is written
/// repeatedly as a streaming message grows (replaced parts each time), and
/// exactly one final upsert with the complete parts ends each turn. The
/// store is the only shared mutable resource across turns and is treated as
/// externally synchronized; no other cross-request serialization is assumed.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert or replace a message by id.
    async fn upsert(&self, message: &ChatMessage) -> Result<()>;

    /// Messages of a thread, most-recent-last. `limit` keeps the most
    /// recent messages.
    async fn select_by_thread(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>>;

    /// Look up a thread.
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Insert or replace a thread.
    async fn upsert_thread(&self, thread: &Thread) -> Result<()>;
}

#[derive(Default)]
struct Inner {
    threads: HashMap<String, Thread>,
    /// Messages per thread, insertion order (most-recent-last).
    messages: HashMap<String, Vec<ChatMessage>>,
}

/// In-memory store used by tests and demos. Real deployments supply their
/// own [`MessageStore`] over a relational or document database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn upsert(&self, message: &ChatMessage) -> Result<()> {
        let mut inner = self.inner.write().await;
        let list = inner.messages.entry(message.thread_id.clone()).or_default();
        if let Some(existing) = list.iter_mut().find(|m| m.id == message.id) {
            *existing = message.clone();
        } else {
            list.push(message.clone());
        }
        Ok(())
    }

    async fn select_by_thread(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>> {
        let inner = self.inner.read().await;
        let list = inner.messages.get(thread_id).cloned().unwrap_or_default();
        Ok(match limit {
            Some(n) if list.len() > n => list[list.len() - n..].to_vec(),
            _ => list,
        })
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let inner = self.inner.read().await;
        Ok(inner.threads.get(thread_id).cloned())
    }

    async fn upsert_thread(&self, thread: &Thread) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.threads.insert(thread.id.clone(), thread.clone());
        Ok(())
    }
}
