//! Fact storage implementations for IronLoop.

pub mod in_memory;
pub mod noop;

pub use in_memory::InMemoryFactStore;
pub use noop::NoopFactStore;

use ironloop_core::memory::FactStore;
use std::sync::Arc;

/// Build a fact store by backend name (`"in_memory"` or `"none"`).
///
/// `max_facts` bounds the in-memory store.
pub fn store_for_backend(backend: &str, max_facts: Option<usize>) -> Option<Arc<dyn FactStore>> {
    match backend {
        "in_memory" => Some(Arc::new(match max_facts {
            Some(limit) => InMemoryFactStore::with_capacity(limit),
            None => InMemoryFactStore::new(),
        })),
        "none" => Some(Arc::new(NoopFactStore)),
        other => {
            tracing::warn!(backend = other, "Unknown fact store backend");
            None
        }
    }
}
