//! Binary entry point: load settings, assemble the agent, run until
//! interrupted.

mod factory;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use duplex_agent::{DuplexOrchestrator, OrchestratorConfig};
use duplex_config::load_settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let settings = load_settings(config_path.as_deref())?;
    info!(
        llm = %settings.llm.model,
        interrupt = settings.interrupt,
        "assembling duplex agent"
    );

    let collaborators = factory::build_collaborators(&settings)?;
    let orchestrator = Arc::new(DuplexOrchestrator::new(
        collaborators,
        OrchestratorConfig {
            system_prompt: settings.system_prompt.clone(),
            interrupt_enabled: settings.interrupt,
            history_path: settings.history_path.clone().map(Into::into),
            max_tool_chain_depth: settings.turn.max_tool_chain_depth,
        },
    ));

    orchestrator.listen(Arc::new(|role, content| {
        info!(role = role.as_str(), content, "turn");
    }));

    let stopper = orchestrator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.shutdown();
        }
    });

    orchestrator.run().await?;
    Ok(())
}
