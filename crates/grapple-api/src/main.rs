use grapple_api::setup;
use grapple_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, services, routes)
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Serve until SIGINT/SIGTERM, then stop the background workers
    setup::server::start_server(&config, router).await?;
    state.background.shutdown().await;

    Ok(())
}
