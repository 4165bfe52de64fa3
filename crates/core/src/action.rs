//! Actions decided by the oracle and the observations they produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step chosen by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Call a tool with positional, still-unparsed parameters.
    Invoke {
        tool_name: String,
        raw_params: Vec<String>,
    },
    /// Stop and answer.
    Final { text: String },
}

impl Action {
    pub fn invoke(tool_name: impl Into<String>, raw_params: Vec<String>) -> Self {
        Self::Invoke {
            tool_name: tool_name.into(),
            raw_params,
        }
    }

    pub fn final_answer(text: impl Into<String>) -> Self {
        Self::Final { text: text.into() }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoke {
                tool_name,
                raw_params,
            } => {
                write!(f, "FUNCTION_CALL: {tool_name}")?;
                for param in raw_params {
                    write!(f, "|{param}")?;
                }
                Ok(())
            }
            Self::Final { text } => write!(f, "FINAL_ANSWER: {text}"),
        }
    }
}

/// The outcome of one tool invocation, as the loop remembers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub tool_name: String,
    pub raw_params: Vec<String>,
    /// Rendered tool output, or the error text when the call failed.
    pub result_text: String,
    pub succeeded: bool,
}

impl Observation {
    pub fn success(
        tool_name: impl Into<String>,
        raw_params: Vec<String>,
        result_text: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_params,
            result_text: result_text.into(),
            succeeded: true,
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        raw_params: Vec<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_params,
            result_text: error.into(),
            succeeded: false,
        }
    }

    /// The history line for this observation. `iteration` is 1-based.
    pub fn history_line(&self, iteration: usize) -> String {
        let params = format!("[{}]", self.raw_params.join(", "));
        if self.succeeded {
            format!(
                "In iteration {iteration}, called {} with parameters {params}, and the function returned {}.",
                self.tool_name, self.result_text
            )
        } else {
            format!(
                "Error in iteration {iteration}: Failed to execute {} with parameters {params}. Error: {}",
                self.tool_name, self.result_text
            )
        }
    }
}
