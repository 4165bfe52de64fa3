//! No-op fact store: the loop runs without remembered facts.

use async_trait::async_trait;
use ironloop_core::error::MemoryError;
use ironloop_core::memory::{Fact, FactStore};

/// A no-op fact store that keeps nothing.
pub struct NoopFactStore;

#[async_trait]
impl FactStore for NoopFactStore {
    fn name(&self) -> &str { "none" }

    async fn store(&self, _fact: Fact) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn recall_all(&self) -> Result<Vec<Fact>, MemoryError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_nothing() {
        let store = NoopFactStore;
        store.store(Fact::entity("INDIA")).await.unwrap();
        assert!(store.recall_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
