//! Shared test helpers: scripted oracles and misbehaving tools.

use async_trait::async_trait;
use ironloop_core::error::{ProviderError, ToolError};
use ironloop_core::message::Message;
use ironloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ironloop_core::tool::{Tool, ToolCategory, ToolResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// An oracle that returns a sequence of scripted replies.
///
/// Each call returns the next reply in the queue. Once the queue is empty,
/// the last reply is repeated if `repeat_last` is set, otherwise the call
/// fails. Every prompt received is recorded.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    repeat_last: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            last: Mutex::new(None),
            repeat_last: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// An oracle that gives the same reply forever.
    pub fn repeating(reply: &str) -> Self {
        Self {
            repeat_last: true,
            ..Self::new([reply])
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);

        let next = self.replies.lock().unwrap().pop_front();
        let reply = match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None if self.repeat_last => self.last.lock().unwrap().clone().unwrap_or_default(),
            None => {
                return Err(ProviderError::NotConfigured("script exhausted".into()));
            }
        };

        Ok(text_response(&reply))
    }
}

/// An oracle that is always rate limited.
pub struct FailingOracle;

#[async_trait]
impl Provider for FailingOracle {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::RateLimited {
            retry_after_secs: 5,
        })
    }
}

/// An oracle that answers only after a delay.
pub struct SlowOracle {
    delay: Duration,
}

impl SlowOracle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Provider for SlowOracle {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(text_response("FINAL_ANSWER: too late"))
    }
}

/// Create a simple text response.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A tool that sleeps before answering.
pub struct SleepyTool {
    pub delay: Duration,
}

#[async_trait]
impl Tool for SleepyTool {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn description(&self) -> &str {
        "Sleeps, then answers"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(ToolResult::ok("awake"))
    }
}

/// A computation tool that always raises.
pub struct ExplodingTool;

#[async_trait]
impl Tool for ExplodingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "x": { "type": "integer" } }
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Err(ToolError::InvalidArguments("explode: boom".into()))
    }
}
