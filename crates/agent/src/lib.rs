//! The decide/act loop for IronLoop.
//!
//! A run follows a **Perceive → Decide → Act → Observe** cycle:
//!
//! 1. **Perceive** the request: extract task, entities and preferences, and
//!    store them as facts
//! 2. **Decide**: render facts, memory and iteration history into a prompt
//!    and parse the oracle's reply into one [`Action`](ironloop_core::Action)
//! 3. **Act**: bind the positional parameters against the tool's schema and
//!    invoke it
//! 4. **Observe**: append the outcome to the history and loop back to 2
//!
//! The loop ends on a final answer or when the iteration budget runs out.

pub mod decision;
pub mod invoker;
pub mod oracle;
pub mod orchestrator;
pub mod parser;
pub mod perception;

#[cfg(test)]
mod test_helpers;

pub use decision::{DecisionContext, DecisionEngine, DecisionError};
pub use invoker::ToolInvoker;
pub use oracle::Oracle;
pub use orchestrator::{LoopState, Orchestrator, RunReport, RunStatus};
pub use parser::ActionParser;
pub use perception::{ExtractedFacts, FactExtractor, Perception};
