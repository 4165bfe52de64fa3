//! Turns oracle reply text into an [`Action`].
//!
//! Only two line shapes are recognized, after trimming:
//!
//! ```text
//! FUNCTION_CALL: tool_name|param1|param2
//! FINAL_ANSWER: free text
//! ```
//!
//! The first recognized line wins and everything else in the reply is
//! ignored, so the oracle may think out loud before committing to an action.

use ironloop_core::action::Action;
use ironloop_core::error::ActionParseError;

const FUNCTION_CALL_PREFIX: &str = "FUNCTION_CALL:";
const FINAL_ANSWER_PREFIX: &str = "FINAL_ANSWER:";

/// How much of an unrecognized reply is kept for the error message.
const PREVIEW_CHARS: usize = 80;

pub struct ActionParser;

impl ActionParser {
    /// Parse the first recognizable action line in `text`.
    pub fn parse(text: &str) -> Result<Action, ActionParseError> {
        text.lines()
            .map(str::trim)
            .find_map(parse_line)
            .ok_or_else(|| ActionParseError::Malformed {
                preview: preview(text),
            })
    }
}

fn parse_line(line: &str) -> Option<Action> {
    if let Some(call) = line.strip_prefix(FUNCTION_CALL_PREFIX) {
        let mut pieces = call.trim().split('|');
        let tool_name = pieces.next().unwrap_or_default().trim();
        // A call with no tool name is not a call.
        if tool_name.is_empty() {
            return None;
        }
        let raw_params = pieces.map(|p| p.trim().to_string()).collect();
        return Some(Action::invoke(tool_name, raw_params));
    }

    line.strip_prefix(FINAL_ANSWER_PREFIX)
        .map(|answer| Action::final_answer(answer.trim()))
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &trimmed[..end]),
        None => trimmed.to_string(),
    }
}
