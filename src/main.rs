use dotenv::dotenv;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rust_aggregator::aggregator::Aggregator;
use rust_aggregator::api::{create_router, AppState};
use rust_aggregator::config::Settings;
use rust_aggregator::fetcher::UpstreamFetcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();
    tracing::info!(
        timeout_secs = settings.upstream_timeout_secs,
        user_agents = settings.user_agents.len(),
        "starting aggregator"
    );

    let fetcher = UpstreamFetcher::new(&settings)?;
    let state = Arc::new(AppState {
        aggregator: Aggregator::new(Arc::new(fetcher)),
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    println!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
