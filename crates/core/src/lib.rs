//! # IronLoop Core
//!
//! Domain types, traits, and error definitions for the IronLoop tool-using
//! agent loop. It performs no I/O of its own; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (oracle, tool, fact store) is a trait here.
//! Implementations live in their respective crates.
//!
//! The tool-invocation protocol lives here too: [`schema`] turns a tool's
//! JSON Schema into a validated [`schema::SchemaNode`] tree, and [`binder`]
//! maps positional oracle parameters onto it.

pub mod action;
pub mod binder;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod provider;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use action::{Action, Observation};
pub use binder::{ArgumentBinder, BoundArguments};
pub use error::{
    ActionParseError, BindError, Error, MemoryError, ProviderError, Result, SchemaError, ToolError,
};
pub use event::{DomainEvent, EventBus, RunId};
pub use memory::{Fact, FactStore};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use schema::{ScalarKind, SchemaNode, ToolSchema};
pub use tool::{Tool, ToolCatalog, ToolCategory, ToolDescriptor, ToolResult};
