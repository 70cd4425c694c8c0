//! Conversation context storage and per-sender turn serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{OwnedMutexGuard, RwLock};

use crate::context::ConversationContext;
use crate::error::EngineError;

/// Keyed storage of conversation contexts.
///
/// The engine reads a context at the start of a turn and writes the whole
/// record back at the end. Turns of one sender are serialized by
/// [`SenderLocks`], so the write never races another turn's read.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn get(&self, sender_id: &str) -> Result<Option<ConversationContext>, EngineError>;

    async fn put(&self, sender_id: &str, context: ConversationContext) -> Result<(), EngineError>;

    /// Returns whether a context existed.
    async fn delete(&self, sender_id: &str) -> Result<bool, EngineError>;

    /// Drops contexts last written before `cutoff`. Stores with native
    /// expiry keep the default, which evicts nothing.
    async fn evict_idle(&self, _cutoff: DateTime<Utc>) -> Result<usize, EngineError> {
        Ok(0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, ConversationContext>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn get(&self, sender_id: &str) -> Result<Option<ConversationContext>, EngineError> {
        Ok(self.contexts.read().await.get(sender_id).cloned())
    }

    async fn put(&self, sender_id: &str, context: ConversationContext) -> Result<(), EngineError> {
        self.contexts
            .write()
            .await
            .insert(sender_id.to_string(), context);
        Ok(())
    }

    async fn delete(&self, sender_id: &str) -> Result<bool, EngineError> {
        Ok(self.contexts.write().await.remove(sender_id).is_some())
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, EngineError> {
        let mut contexts = self.contexts.write().await;
        let before = contexts.len();
        contexts.retain(|_, ctx| ctx.updated_at >= cutoff);
        Ok(before - contexts.len())
    }
}

/// One async mutex per sender id.
#[derive(Debug, Default)]
pub struct SenderLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn of `sender_id` is running.
    pub async fn acquire(&self, sender_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(locks.entry(sender_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Forgets locks nobody holds or waits on.
    pub fn prune(&self) -> usize {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    pub fn tracked(&self) -> usize {
        match self.locks.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
