//! The orchestrator: Perceive → (Decide → Act → Observe)* state machine.
//!
//! Each run perceives the request once, stores the extracted facts, then
//! iterates: recall every stored fact, ask the decision engine for one
//! action, and either finish (`Final`) or bind and invoke a tool and append
//! the observation to the history. A run ends `Completed` on the first
//! final answer or `Exhausted` once the iteration budget is spent.
//!
//! Nothing inside an iteration can abort the run. Tool failures become failed
//! observations the oracle sees next time; an unparsable reply or an
//! unavailable oracle becomes a final answer carrying the error text.

use crate::decision::{DecisionContext, DecisionEngine, DecisionError};
use crate::invoker::ToolInvoker;
use crate::oracle::Oracle;
use crate::perception::{ExtractedFacts, FactExtractor, Perception};
use ironloop_config::AgentConfig;
use ironloop_core::action::{Action, Observation};
use ironloop_core::event::{DomainEvent, EventBus, RunId};
use ironloop_core::memory::{Fact, FactStore};
use ironloop_core::tool::ToolCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const UNPARSABLE_ANSWER: &str = "Error: Could not determine next action";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// A final answer was produced.
    Completed,
    /// The iteration budget ran out first.
    Exhausted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// The loop's mutable state. Changes only between iterations.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub iteration_count: usize,
    pub max_iterations: usize,
    pub history: Vec<Observation>,
    pub completed: bool,
    pub final_answer: Option<String>,
}

impl LoopState {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iteration_count: 0,
            max_iterations,
            history: Vec::new(),
            completed: false,
            final_answer: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.completed || self.iteration_count >= self.max_iterations
    }

    pub fn status(&self) -> RunStatus {
        if self.completed {
            RunStatus::Completed
        } else {
            RunStatus::Exhausted
        }
    }

    fn record(&mut self, observation: Observation) {
        self.history.push(observation);
        self.iteration_count += 1;
    }

    fn complete(&mut self, answer: String) {
        self.final_answer = Some(answer);
        self.completed = true;
    }
}

/// What a caller gets back from [`Orchestrator::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    pub final_answer: Option<String>,
    pub iterations: usize,
    pub max_iterations: usize,
    pub history: Vec<Observation>,
    pub facts: ExtractedFacts,
    pub processed_query: String,
}

impl RunReport {
    fn from_state(run_id: RunId, state: LoopState, perception: Perception) -> Self {
        Self {
            run_id,
            status: state.status(),
            final_answer: state.final_answer,
            iterations: state.iteration_count,
            max_iterations: state.max_iterations,
            history: state.history,
            facts: perception.facts,
            processed_query: perception.processed_query,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn history_lines(&self) -> Vec<String> {
        self.history
            .iter()
            .enumerate()
            .map(|(i, obs)| obs.history_line(i + 1))
            .collect()
    }

    /// The text shown to the user at the end of a run.
    pub fn summary(&self) -> String {
        match (self.status, &self.final_answer) {
            (RunStatus::Completed, Some(answer)) => format!("Final Answer: {answer}"),
            _ => {
                let mut text = format!(
                    "Maximum iterations ({}) reached without completion.",
                    self.max_iterations
                );
                if !self.history.is_empty() {
                    text.push_str("\nHistory:");
                    for line in self.history_lines() {
                        text.push_str("\n  ");
                        text.push_str(&line);
                    }
                }
                text
            }
        }
    }
}

pub struct Orchestrator {
    engine: DecisionEngine,
    invoker: ToolInvoker,
    extractor: Option<FactExtractor>,
    facts: Arc<dyn FactStore>,
    event_bus: Arc<EventBus>,
    max_iterations: usize,
}

impl Orchestrator {
    /// Create an orchestrator that decides with `oracle` over `catalog`.
    ///
    /// Fact extraction is off until [`with_fact_extractor`](Self::with_fact_extractor)
    /// is called.
    pub fn new(
        oracle: Arc<Oracle>,
        catalog: Arc<ToolCatalog>,
        facts: Arc<dyn FactStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            engine: DecisionEngine::new(oracle),
            invoker: ToolInvoker::new(catalog),
            extractor: None,
            facts,
            event_bus,
            max_iterations: 10,
        }
    }

    /// Apply the `[agent]` section of the configuration.
    ///
    /// Fact extraction, when enabled, shares the decision oracle.
    pub fn with_config(self, config: &AgentConfig, oracle: Arc<Oracle>) -> Self {
        let configured = self
            .with_max_iterations(config.max_iterations)
            .with_tool_timeout(Duration::from_secs(config.tool_timeout_secs))
            .with_verification_tool(config.verification_tool.clone());
        if config.extract_facts {
            configured.with_fact_extractor(FactExtractor::new(oracle))
        } else {
            configured
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.invoker = self.invoker.with_timeout(timeout);
        self
    }

    pub fn with_verification_tool(mut self, name: impl Into<String>) -> Self {
        self.engine = self.engine.with_verification_tool(name);
        self
    }

    /// Extract facts from each request before the loop starts.
    pub fn with_fact_extractor(mut self, extractor: FactExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Run one request to completion or exhaustion.
    pub async fn run(&self, query: &str) -> RunReport {
        let run_id = RunId::new();
        info!(run_id = %run_id, max_iter = self.max_iterations, "Run starting");
        self.event_bus.publish(DomainEvent::RunStarted {
            run_id,
            query_preview: query.chars().take(100).collect(),
            max_iterations: self.max_iterations,
            timestamp: chrono::Utc::now(),
        });

        let perception = match &self.extractor {
            Some(extractor) => extractor.extract(query).await,
            None => Perception::unextracted(query),
        };
        self.remember(run_id, &perception.facts).await;

        let mut state = LoopState::new(self.max_iterations);

        while !state.is_terminal() {
            debug_assert_eq!(state.history.len(), state.iteration_count);
            let iteration = state.iteration_count + 1;
            debug!(iteration, "Loop iteration");

            let memory = self.recall().await;
            let context = DecisionContext {
                facts: &perception.facts,
                memory: &memory,
                history: &state.history,
                catalog: self.invoker.catalog(),
                query: &perception.processed_query,
            };

            let action = match self.engine.decide(&context).await {
                Ok(action) => action,
                Err(DecisionError::Malformed(e)) => {
                    warn!(iteration, error = %e, "Oracle reply had no action");
                    Action::final_answer(UNPARSABLE_ANSWER)
                }
                Err(DecisionError::OracleUnavailable(e)) => {
                    warn!(iteration, error = %e, "Oracle unavailable");
                    Action::final_answer(format!("Error in decision making: {e}"))
                }
            };

            self.event_bus.publish(DomainEvent::ActionDecided {
                run_id,
                iteration,
                action: action.to_string(),
                timestamp: chrono::Utc::now(),
            });

            match action {
                Action::Final { text } => {
                    info!(iteration, answer = %text, "Final answer");
                    state.complete(text);
                }
                Action::Invoke {
                    tool_name,
                    raw_params,
                } => {
                    let start = std::time::Instant::now();
                    let observation = self.invoker.run(&tool_name, raw_params).await;
                    let duration_ms = start.elapsed().as_millis() as u64;

                    info!(
                        iteration,
                        tool = %tool_name,
                        success = observation.succeeded,
                        result = %observation.result_text,
                        "Tool called"
                    );
                    self.event_bus.publish(DomainEvent::ToolInvoked {
                        run_id,
                        tool_name,
                        success: observation.succeeded,
                        duration_ms,
                        timestamp: chrono::Utc::now(),
                    });

                    state.record(observation);
                }
            }
        }

        if !state.completed {
            warn!(max_iter = self.max_iterations, "Max iterations reached");
        }

        self.event_bus.publish(DomainEvent::RunFinished {
            run_id,
            completed: state.completed,
            iterations: state.iteration_count,
            timestamp: chrono::Utc::now(),
        });

        RunReport::from_state(run_id, state, perception)
    }

    /// Store the extracted facts. A storage failure loses that fact only.
    async fn remember(&self, run_id: RunId, facts: &ExtractedFacts) {
        for fact in facts.to_facts() {
            let category = fact.category.clone();
            match self.facts.store(fact).await {
                Ok(()) => self.event_bus.publish(DomainEvent::FactStored {
                    run_id,
                    category,
                    timestamp: chrono::Utc::now(),
                }),
                Err(e) => warn!(error = %e, "Failed to store fact"),
            }
        }
    }

    async fn recall(&self) -> Vec<Fact> {
        match self.facts.recall_all().await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "Fact recall failed");
                vec![]
            }
        }
    }
}
