//! Error types for the IronLoop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use crate::schema::ScalarKind;
use thiserror::Error;

/// The top-level error type: failures that stop a run before it starts.
///
/// Per-iteration failures never surface here; the loop turns them into
/// observations or a final answer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // Fatal at catalog load
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Could not bind arguments for {tool_name}: {source}")]
    Binding {
        tool_name: String,
        #[source]
        source: BindError,
    },
}

/// A tool schema that cannot be turned into a valid [`crate::schema::ToolSchema`].
///
/// These are configuration defects: they surface when the catalog is loaded,
/// before any iteration runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Unresolved schema reference: {name}")]
    UnresolvedReference { name: String },

    #[error("Cyclic schema reference through: {name}")]
    CyclicReference { name: String },

    #[error("Unsupported reference format: {0}")]
    UnsupportedReference(String),

    #[error("Array field '{field}' must have scalar items")]
    InvalidArrayItems { field: String },

    #[error("Invalid schema: {0}")]
    Invalid(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Invalid schema for tool '{tool}': {source}")]
    Tool {
        tool: String,
        #[source]
        source: Box<SchemaError>,
    },
}

/// Raw positional parameters that do not fit a tool's schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("Field '{field}' expects {expected}, got '{value}'")]
    TypeCoercion {
        field: String,
        expected: ScalarKind,
        value: String,
    },

    #[error("Missing argument for field '{field}' ({expected})")]
    MissingArgument { field: String, expected: ScalarKind },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// An oracle reply with no recognizable action line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("No FUNCTION_CALL or FINAL_ANSWER line in oracle reply: {preview:?}")]
    Malformed { preview: String },
}
