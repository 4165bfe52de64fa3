//! `ironloop run`: solve one request and print the outcome.

use ironloop_agent::{Oracle, Orchestrator};
use ironloop_config::AppConfig;
use ironloop_core::event::{DomainEvent, EventBus};
use ironloop_core::memory::FactStore;
use ironloop_core::tool::ToolCatalog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

pub async fn run(
    query: &str,
    max_iterations: Option<usize>,
    no_extract: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(max) = max_iterations {
        config.agent.max_iterations = max;
    }
    if no_extract {
        config.agent.extract_facts = false;
    }
    config.validate()?;

    let (oracle, catalog, facts) = match build_runtime(&config) {
        Ok(runtime) => runtime,
        Err(e @ ironloop_core::Error::Provider(_)) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    IRONLOOP_API_KEY     (generic)");
            eprintln!("    OPENROUTER_API_KEY   (recommended)");
            eprintln!("    OPENAI_API_KEY       (for OpenAI direct)");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let event_bus = Arc::new(EventBus::default());
    let progress = spawn_progress(event_bus.subscribe());

    let orchestrator = Orchestrator::new(oracle.clone(), catalog, facts, event_bus)
        .with_config(&config.agent, oracle);
    let report = orchestrator.run(query).await;

    // Dropping the orchestrator drops the last sender, which ends the
    // progress task.
    drop(orchestrator);
    let _ = progress.await;

    println!("{}", report.summary());
    Ok(())
}

/// Build the oracle, the tool catalog and the fact store.
///
/// Any error here is a configuration defect and ends the command before the
/// loop runs.
fn build_runtime(
    config: &AppConfig,
) -> ironloop_core::Result<(Arc<Oracle>, Arc<ToolCatalog>, Arc<dyn FactStore>)> {
    let configured = ironloop_providers::build_from_config(config)?;
    let oracle = Oracle::new(configured.provider, configured.model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_timeout(Duration::from_secs(config.agent.oracle_timeout_secs))
        .with_request_delay(Duration::from_millis(config.agent.request_delay_ms));

    let catalog = ironloop_tools::default_catalog()?;
    let facts = ironloop_memory::store_for_backend(&config.memory.backend, config.memory.max_facts)
        .ok_or_else(|| ironloop_core::Error::Config {
            message: format!("unknown memory backend: {}", config.memory.backend),
        })?;

    Ok((Arc::new(oracle), Arc::new(catalog), facts))
}

/// Print each decision and tool outcome to stderr as the run proceeds.
fn spawn_progress(mut rx: broadcast::Receiver<Arc<DomainEvent>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.as_ref() {
                    DomainEvent::ActionDecided {
                        iteration, action, ..
                    } => eprintln!("  [{iteration}] {action}"),
                    DomainEvent::ToolInvoked {
                        tool_name,
                        success,
                        duration_ms,
                        ..
                    } => {
                        let outcome = if *success { "ok" } else { "failed" };
                        eprintln!("      {tool_name}: {outcome} ({duration_ms}ms)");
                    }
                    _ => {}
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}
