//! `ironloop config`: configuration inspection.

use ironloop_config::AppConfig;
use ironloop_core::provider::Provider;

pub async fn run(validate: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !validate {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let path = AppConfig::config_dir().join("config.toml");
    println!("Validating {}", path.display());

    let config = AppConfig::load().map_err(|e| format!("Config error: {e}"))?;
    println!("  Config is valid");
    if !config.has_api_key() {
        println!("  Warning: no API key set (IRONLOOP_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY)");
    }
    println!();
    println!("  Provider:        {}", config.default_provider);
    println!("  Model:           {}", config.default_model);
    println!("  Max iterations:  {}", config.agent.max_iterations);
    println!("  Verification:    {}", config.agent.verification_tool);
    println!("  Memory:          {}", config.memory.backend);

    let reachability = match ironloop_providers::build_from_config(&config) {
        Ok(configured) => provider_status(configured.provider.as_ref()).await,
        Err(e) => format!("not configured ({e})"),
    };
    println!("  Reachable:       {reachability}");
    Ok(())
}

/// One-line reachability report for the configured provider.
async fn provider_status(provider: &dyn Provider) -> String {
    match provider.health_check().await {
        Ok(true) => format!("yes ({})", provider.name()),
        Ok(false) => format!("no ({} rejected the request)", provider.name()),
        Err(e) => format!("no ({e})"),
    }
}
