//! In-memory fact store: facts live for the duration of the process.

use async_trait::async_trait;
use ironloop_core::error::MemoryError;
use ironloop_core::memory::{Fact, FactStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store that keeps facts in a Vec, in insertion order.
///
/// Cloning shares the underlying storage.
#[derive(Clone)]
pub struct InMemoryFactStore {
    facts: Arc<RwLock<Vec<Fact>>>,
    capacity: Option<usize>,
}

impl InMemoryFactStore {
    pub fn new() -> Self {
        Self {
            facts: Arc::new(RwLock::new(Vec::new())),
            capacity: None,
        }
    }

    /// A store that refuses new facts once it holds `limit` of them.
    pub fn with_capacity(limit: usize) -> Self {
        Self {
            capacity: Some(limit),
            ..Self::new()
        }
    }
}

impl Default for InMemoryFactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    fn name(&self) -> &str { "in_memory" }

    async fn store(&self, fact: Fact) -> Result<(), MemoryError> {
        tracing::trace!(category = %fact.category, "Storing fact");
        let mut facts = self.facts.write().await;
        if let Some(limit) = self.capacity
            && facts.len() >= limit
        {
            return Err(MemoryError::Storage(format!(
                "fact store is full ({limit} facts)"
            )));
        }
        facts.push(fact);
        Ok(())
    }

    async fn recall_all(&self) -> Result<Vec<Fact>, MemoryError> {
        Ok(self.facts.read().await.clone())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.facts.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_recall_in_order() {
        let store = InMemoryFactStore::new();
        store.store(Fact::entity("INDIA")).await.unwrap();
        store.store(Fact::preference("tone", "funny")).await.unwrap();

        let facts = store.recall_all().await.unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].category, "entity");
        assert_eq!(facts[1].category, "preference");
    }

    #[tokio::test]
    async fn duplicates_are_kept() {
        let store = InMemoryFactStore::new();
        store.store(Fact::entity("INDIA")).await.unwrap();
        store.store(Fact::entity("INDIA")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn full_store_rejects_new_facts() {
        let store = InMemoryFactStore::with_capacity(2);
        store.store(Fact::entity("INDIA")).await.unwrap();
        store.store(Fact::entity("Paris")).await.unwrap();

        let err = store.store(Fact::entity("Tokyo")).await.unwrap_err();
        assert!(matches!(err, MemoryError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: fact store is full (2 facts)");

        let facts = store.recall_all().await.unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].content, "Entity mentioned: Paris");
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let store = InMemoryFactStore::new();
        let handle = store.clone();
        store.store(Fact::entity("Paris")).await.unwrap();
        assert_eq!(handle.count().await.unwrap(), 1);
    }
}
