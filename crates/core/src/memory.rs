//! Fact storage: the loop's accumulated knowledge.
//!
//! Facts are append-only. A store never deduplicates, edits or deletes what
//! it was given; the only read is "everything, in insertion order".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::MemoryError;

/// A single remembered fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// The content of the fact
    pub content: String,

    /// Category used when rendering facts into prompts
    /// (e.g. "entity", "characteristic", "preference")
    pub category: String,

    /// When this fact was recorded
    pub recorded_at: DateTime<Utc>,
}

impl Fact {
    pub fn new(content: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            category: category.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn entity(name: &str) -> Self {
        Self::new(format!("Entity mentioned: {name}"), "entity")
    }

    pub fn characteristic(key: &str, value: &str) -> Self {
        Self::new(format!("User characteristic: {key} = {value}"), "characteristic")
    }

    pub fn preference(key: &str, value: &str) -> Self {
        Self::new(format!("User preference: {key} = {value}"), "preference")
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.content)
    }
}

/// The core FactStore trait.
///
/// Implementations: in-memory (default), none (no-op).
#[async_trait]
pub trait FactStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    /// Append a fact.
    async fn store(&self, fact: Fact) -> std::result::Result<(), MemoryError>;

    /// Every stored fact, oldest first.
    async fn recall_all(&self) -> std::result::Result<Vec<Fact>, MemoryError>;

    /// Get total fact count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;
}
