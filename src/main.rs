use anyhow::Result;
use clap::Parser;
use filmrec::{api::create_router, init_tracing, AppState, Config};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    info!("Starting film recommendation server with config: {:?}", config.server);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.server.workers)
        .build_global()?;

    let state = AppState::new(config.clone()).await?;

    // first load must succeed; there is no earlier snapshot to fall back on
    let snapshot = state.recommendation_service.refresh().await?;
    info!("Initial snapshot {} ready", snapshot.version);

    match config.recommendation.refresh_interval_secs {
        0 => warn!("Periodic snapshot refresh disabled"),
        secs => {
            let _refresh = state
                .recommendation_service
                .clone()
                .spawn_refresh_task(Duration::from_secs(secs));
            info!("Refreshing snapshot every {}s", secs);
        }
    }

    let app = create_router(state);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
