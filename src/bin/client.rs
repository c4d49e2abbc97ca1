use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rust_aggregator::client::cache::{CacheStore, MemoryStore, RedisStore};
use rust_aggregator::client::query::active_filter;
use rust_aggregator::client::view::{ViewController, ViewOutcome};
use rust_aggregator::client::ApiClient;
use rust_aggregator::config::Settings;
use rust_aggregator::token;

#[derive(Parser)]
#[command(name = "aggregator-client", about = "Query the aggregator API with a stale-on-error cache")]
struct Cli {
    /// Base URL of the aggregator API
    #[arg(long, env = "API_BASE_URL")]
    api: Option<String>,

    /// Persist cached responses in Redis instead of memory
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a category by its upstream URL
    Category {
        url: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search one of the sites
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        filter: Option<String>,
        /// avtub or korea
        #[arg(long)]
        domain: Option<String>,
    },
    /// Show one video by its upstream URL
    Detail { url: String },
    /// Open an app link such as `/category?url=...` or `/detailVid?data=...`
    Open { link: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let store: Arc<dyn CacheStore> = match cli.redis_url.as_deref().or(settings.redis_url.as_deref()) {
        Some(url) => Arc::new(RedisStore::new(url, settings.cache_ttl_secs).await?),
        None => Arc::new(MemoryStore::new(
            settings.cache_capacity,
            settings.cache_ttl_secs.map(|s| chrono::Duration::seconds(s as i64)),
        )),
    };
    let base = cli.api.unwrap_or(settings.api_base_url);
    let client = ApiClient::new(&base, store)?;

    let output = match cli.command {
        Command::Category { url, page } => {
            let resp = client.category(&token::encode(&url), page).await?;
            if let Some(filter) = active_filter(&resp.filters) {
                tracing::info!(filter = %filter.value, "active sort order");
            }
            serde_json::to_value(resp)?
        }
        Command::Search {
            query,
            page,
            filter,
            domain,
        } => serde_json::to_value(
            client
                .search(&query, page, filter.as_deref(), domain.as_deref())
                .await?,
        )?,
        Command::Detail { url } => serde_json::to_value(client.detail(&token::encode(&url)).await?)?,
        Command::Open { link } => {
            let view = ViewController::new(client);
            match view.open::<Value>(&link).await? {
                ViewOutcome::Loaded(value) => {
                    eprintln!("location: {}", view.location());
                    value
                }
                ViewOutcome::Superseded | ViewOutcome::Idle => {
                    eprintln!("nothing to load for {}", view.location());
                    return Ok(());
                }
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
