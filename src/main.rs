use anyhow::Result;
use tracing::info;

use lab_engine::config::EngineConfig;
use lab_engine::server::handler::LabServer;
use lab_engine::server::state::AppState;
use lab_engine::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = EngineConfig::resolve(std::env::args().nth(1))?;
    info!(
        "starting lab engine bind={} cache_capacity={} store={:?}",
        config.bind_addr, config.cache_capacity, config.store
    );

    let state = AppState::from_config(&config)?;
    let server = LabServer::start(&config.bind_addr, state).await?;
    info!("ready on http://{}, ctrl-c to stop", server.addr());

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    server.shutdown_and_wait().await;
    Ok(())
}
