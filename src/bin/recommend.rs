use anyhow::Result;
use clap::Parser;
use filmrec::{init_tracing, open_store, services::recommendation::RecommendationService, Config};
use std::sync::Arc;
use tracing::info;

/// Prints recommendations for one user as JSON and exits.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[arg(short, long)]
    user_id: i64,

    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// JSON seed file, overrides the configured store with an in-memory one
    #[arg(short, long)]
    seed: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };
    if let Some(seed) = args.seed {
        config.store.backend = filmrec::config::StoreBackend::Memory;
        config.store.seed_path = Some(seed);
    }

    let count = args.count.unwrap_or(config.recommendation.default_count);
    let config = Arc::new(config);
    let store = open_store(&config).await?;
    let service = RecommendationService::new(store, config);

    let response = service.recommend(args.user_id, count).await?;
    info!(
        "Ranked {} films against snapshot {}",
        response.recommendations.len(),
        response.snapshot_version
    );

    println!("{}", serde_json::to_string_pretty(&response.recommendations)?);
    Ok(())
}
