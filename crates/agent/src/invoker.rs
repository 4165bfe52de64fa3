//! Binds raw parameters and calls tools, normalizing every outcome into an
//! [`Observation`].

use ironloop_core::action::Observation;
use ironloop_core::binder::{ArgumentBinder, BoundArguments};
use ironloop_core::error::ToolError;
use ironloop_core::tool::{ToolCatalog, ToolResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ToolInvoker {
    catalog: Arc<ToolCatalog>,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self {
            catalog,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the timeout applied to each tool call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Bind positional parameters against the named tool's schema.
    ///
    /// The tool is looked up first, so an unknown name is reported as such
    /// rather than as a binding failure.
    pub fn bind(&self, tool_name: &str, raw_params: &[String]) -> Result<BoundArguments, ToolError> {
        let descriptor = self
            .catalog
            .descriptor(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        ArgumentBinder::new(&descriptor.schema)
            .bind(raw_params)
            .map_err(|source| ToolError::Binding {
                tool_name: tool_name.to_string(),
                source,
            })
    }

    /// Execute the named tool under the invoker's timeout.
    ///
    /// A result the tool itself marks as failed is still `Ok`; only lookup,
    /// timeout and raised errors are `Err`.
    pub async fn invoke(&self, tool_name: &str, arguments: BoundArguments) -> Result<ToolResult, ToolError> {
        let tool = self
            .catalog
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        let result = tokio::time::timeout(self.timeout, tool.execute(arguments.into_value()))
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: tool_name.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        Ok(result)
    }

    /// Bind and invoke in one step. Never fails: errors become a failed
    /// observation carrying the error text, and a tool-marked failure
    /// carries the tool's own output.
    pub async fn run(&self, tool_name: &str, raw_params: Vec<String>) -> Observation {
        let outcome = match self.bind(tool_name, &raw_params) {
            Ok(arguments) => {
                debug!(tool = %tool_name, arguments = %arguments.as_value(), "Invoking tool");
                self.invoke(tool_name, arguments).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) if result.success => Observation::success(tool_name, raw_params, result.output),
            Ok(result) => {
                warn!(tool = %tool_name, output = %result.output, "Tool reported failure");
                Observation::failure(tool_name, raw_params, result.output)
            }
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Tool call failed");
                Observation::failure(tool_name, raw_params, e.to_string())
            }
        }
    }
}
