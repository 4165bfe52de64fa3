//! The decision engine: renders the loop's context into a prompt, asks the
//! oracle for exactly one action and parses the reply.

use crate::oracle::Oracle;
use crate::parser::ActionParser;
use crate::perception::ExtractedFacts;
use ironloop_core::action::{Action, Observation};
use ironloop_core::error::{ActionParseError, ProviderError};
use ironloop_core::memory::Fact;
use ironloop_core::tool::{ToolCatalog, ToolCategory};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[source] ProviderError),

    #[error(transparent)]
    Malformed(#[from] ActionParseError),
}

/// Everything one decision is made from.
pub struct DecisionContext<'a> {
    pub facts: &'a ExtractedFacts,
    pub memory: &'a [Fact],
    pub history: &'a [Observation],
    pub catalog: &'a ToolCatalog,
    pub query: &'a str,
}

pub struct DecisionEngine {
    oracle: Arc<Oracle>,
    verification_tool: String,
}

impl DecisionEngine {
    pub fn new(oracle: Arc<Oracle>) -> Self {
        Self {
            oracle,
            verification_tool: "verify".into(),
        }
    }

    /// Name the tool the oracle must call after every computation.
    pub fn with_verification_tool(mut self, name: impl Into<String>) -> Self {
        self.verification_tool = name.into();
        self
    }

    /// Ask the oracle for the next action.
    pub async fn decide(&self, context: &DecisionContext<'_>) -> Result<Action, DecisionError> {
        let prompt = self.build_prompt(context);
        let reply = self
            .oracle
            .generate(&prompt)
            .await
            .map_err(DecisionError::OracleUnavailable)?;
        debug!(reply = %reply, "Oracle replied");
        Ok(ActionParser::parse(&reply)?)
    }

    pub fn build_prompt(&self, context: &DecisionContext<'_>) -> String {
        let mut prompt = self.policy(context.catalog);

        prompt.push_str("\nAvailable tools:\n");
        for descriptor in context.catalog.descriptors() {
            prompt.push_str(&format!("- {}\n", descriptor.signature()));
        }

        let facts = context.facts;
        prompt.push_str(&format!(
            "\nCurrent Context:\n\
             Task: {}\n\
             Entities: {}\n\
             Characteristics: {}\n\
             Preferences: {}\n\
             Requirements: {}\n",
            facts.task,
            join_or_none(&facts.entities),
            pairs_or_none(&facts.characteristics),
            pairs_or_none(&facts.preferences),
            join_or_none(&facts.requirements),
        ));

        prompt.push_str("\nUser Preferences/Memory:\n");
        if context.memory.is_empty() {
            prompt.push_str("None\n");
        }
        for fact in context.memory {
            prompt.push_str(&format!("- {}\n", fact.content));
        }

        prompt.push_str("\nPrevious Iterations:\n");
        if context.history.is_empty() {
            prompt.push_str("No previous iterations\n");
        }
        for (i, observation) in context.history.iter().enumerate() {
            prompt.push_str(&observation.history_line(i + 1));
            prompt.push('\n');
        }

        prompt.push_str(&format!("\nCurrent Query: {}\n\n", context.query));

        if let Some(pending) = self.pending_verification(context) {
            prompt.push_str(&format!("{pending}\n\n"));
        }

        match context.history.last() {
            Some(last) if !last.succeeded => {
                prompt.push_str("The previous tool call failed. What should I do next?")
            }
            _ => prompt.push_str("What should I do next?"),
        }
        prompt
    }

    fn policy(&self, catalog: &ToolCatalog) -> String {
        let mut policy = String::from(
            "You are an agent solving problems in iterations. Think step by step \
             and choose one tool at a time. If a tool fails, read the error in the \
             history and try a different approach.\n",
        );

        let computations = catalog.names_in(ToolCategory::Computation);
        let verify = &self.verification_tool;
        if catalog.get(verify).is_some() && !computations.is_empty() {
            policy.push_str(&format!(
                "\nVERIFICATION IS MANDATORY:\n\
                 - Computation tools: {}\n\
                 - After EVERY computation, the very next action MUST be \
                 FUNCTION_CALL: {verify}|expression|expected_result\n\
                 - Never start another computation before the previous one is verified\n\
                 - If verification fails, recalculate before proceeding\n",
                computations.join(", "),
            ));
        }

        policy.push_str(&format!(
            "\nRespond with EXACTLY ONE line in one of these formats:\n\
             FUNCTION_CALL: function_name|param1|param2|...\n\
             FINAL_ANSWER: answer\n\
             \n\
             Pass list parameters as one bracketed value, e.g. [73,78,68]. \
             Only give FINAL_ANSWER once every calculation is done and verified. \
             Do not repeat a call with the same parameters.\n\
             \n\
             Examples:\n\
             FUNCTION_CALL: add|5|3\n\
             FUNCTION_CALL: {verify}|5 + 3|8\n\
             FINAL_ANSWER: 8\n"
        ));
        policy
    }

    /// A reminder when the last step was a successful, still unverified
    /// computation.
    fn pending_verification(&self, context: &DecisionContext<'_>) -> Option<String> {
        let last = context.history.last().filter(|o| o.succeeded)?;
        let category = context.catalog.descriptor(&last.tool_name)?.category;
        (category == ToolCategory::Computation && context.catalog.get(&self.verification_tool).is_some())
            .then(|| {
                format!(
                    "Verification pending: {} returned {}. Your next action must be \
                     FUNCTION_CALL: {}|<expression>|{}",
                    last.tool_name, last.result_text, self.verification_tool, last.result_text
                )
            })
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".into()
    } else {
        items.join(", ")
    }
}

fn pairs_or_none(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return "None".into();
    }
    pairs
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingOracle, ScriptedOracle};

    fn engine(provider: Arc<ScriptedOracle>) -> DecisionEngine {
        DecisionEngine::new(Arc::new(Oracle::new(provider, "mock-model")))
    }

    fn catalog() -> ToolCatalog {
        ironloop_tools::default_catalog().unwrap()
    }

    fn context<'a>(
        facts: &'a ExtractedFacts,
        history: &'a [Observation],
        catalog: &'a ToolCatalog,
    ) -> DecisionContext<'a> {
        DecisionContext {
            facts,
            memory: &[],
            history,
            catalog,
            query: "What is 5 + 3?",
        }
    }

    #[test]
    fn prompt_sections_in_order() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let prompt = engine(Arc::new(ScriptedOracle::new(Vec::<String>::new())))
            .build_prompt(&context(&facts, &[], &catalog));

        let order = [
            "VERIFICATION IS MANDATORY",
            "Available tools:",
            "- add(a: integer, b: integer) - Add two numbers",
            "Current Context:",
            "Task: Unknown task",
            "User Preferences/Memory:",
            "Previous Iterations:",
            "No previous iterations",
            "Current Query: What is 5 + 3?",
            "What should I do next?",
        ];
        let mut from = 0;
        for needle in order {
            let at = prompt[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("missing or out of order: {needle}"));
            from += at + needle.len();
        }
        assert!(prompt.ends_with("What should I do next?"));
    }

    #[test]
    fn policy_lists_computation_tools_only() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let prompt = engine(Arc::new(ScriptedOracle::new(Vec::<String>::new())))
            .build_prompt(&context(&facts, &[], &catalog));
        let line = prompt
            .lines()
            .find(|l| l.starts_with("- Computation tools:"))
            .unwrap();
        assert!(line.contains("add, subtract"));
        assert!(!line.contains("verify"));
    }

    #[test]
    fn history_and_memory_are_rendered() {
        let catalog = catalog();
        let facts = ExtractedFacts {
            entities: vec!["INDIA".into()],
            preferences: vec![("color".into(), "red".into())],
            ..ExtractedFacts::default()
        };
        let memory = vec![Fact::entity("INDIA")];
        let history = vec![Observation::success("add", vec!["5".into(), "3".into()], "8")];
        let ctx = DecisionContext {
            memory: &memory,
            ..context(&facts, &history, &catalog)
        };
        let prompt = engine(Arc::new(ScriptedOracle::new(Vec::<String>::new()))).build_prompt(&ctx);

        assert!(prompt.contains("Entities: INDIA"));
        assert!(prompt.contains("Preferences: color: red"));
        assert!(prompt.contains("- Entity mentioned: INDIA"));
        assert!(prompt.contains(
            "In iteration 1, called add with parameters [5, 3], and the function returned 8."
        ));
        assert!(prompt.contains("Verification pending: add returned 8"));
    }

    #[test]
    fn each_entry_is_on_its_own_line() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let memory = vec![Fact::entity("INDIA"), Fact::preference("tone", "funny")];
        let history = vec![
            Observation::success("add", vec!["5".into(), "3".into()], "8"),
            Observation::success("verify", vec!["5 + 3".into(), "8".into()], "True"),
        ];
        let ctx = DecisionContext {
            memory: &memory,
            ..context(&facts, &history, &catalog)
        };
        let prompt = engine(Arc::new(ScriptedOracle::new(Vec::<String>::new()))).build_prompt(&ctx);

        assert!(prompt.contains(
            "User Preferences/Memory:\n- Entity mentioned: INDIA\n- User preference: tone = funny\n\n"
        ));
        assert!(prompt.contains("returned 8.\nIn iteration 2, called verify"));
        assert!(prompt.contains("\nCurrent Query: What is 5 + 3?\n\nWhat should I do next?"));
        assert!(prompt.contains("- Computation tools: add, "));
        assert!(prompt.contains("FUNCTION_CALL: verify|5 + 3|8\nFINAL_ANSWER: 8\n\nAvailable tools:\n- add("));
    }

    #[test]
    fn no_pending_verification_after_verify() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let history = vec![Observation::success(
            "verify",
            vec!["5 + 3".into(), "8".into()],
            "True",
        )];
        let prompt = engine(Arc::new(ScriptedOracle::new(Vec::<String>::new())))
            .build_prompt(&context(&facts, &history, &catalog));
        assert!(!prompt.contains("Verification pending"));
    }

    #[test]
    fn failed_step_changes_closing_line() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let history = vec![Observation::failure("divide", vec!["1".into(), "0".into()], "boom")];
        let prompt = engine(Arc::new(ScriptedOracle::new(Vec::<String>::new())))
            .build_prompt(&context(&facts, &history, &catalog));
        assert!(prompt.ends_with("The previous tool call failed. What should I do next?"));
        assert!(!prompt.contains("Verification pending"));
    }

    #[tokio::test]
    async fn decide_parses_reply() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let provider = Arc::new(ScriptedOracle::new(["Thinking...\nFUNCTION_CALL: add|5|3"]));
        let action = engine(provider.clone())
            .decide(&context(&facts, &[], &catalog))
            .await
            .unwrap();
        assert_eq!(action, Action::invoke("add", vec!["5".into(), "3".into()]));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn unparsable_reply_is_malformed() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let provider = Arc::new(ScriptedOracle::new(["I'm not sure."]));
        let err = engine(provider)
            .decide(&context(&facts, &[], &catalog))
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::Malformed(_)));
    }

    #[tokio::test]
    async fn oracle_failure_is_unavailable() {
        let catalog = catalog();
        let facts = ExtractedFacts::default();
        let engine = DecisionEngine::new(Arc::new(Oracle::new(Arc::new(FailingOracle), "m")));
        let err = engine
            .decide(&context(&facts, &[], &catalog))
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::OracleUnavailable(_)));
    }
}
