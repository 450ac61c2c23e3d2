use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use thermoflow::api::{configure_routes, AppState};
use thermoflow::config::{self, CacheConfig, IngestionConfig};
use thermoflow::query::TemperatureService;
use thermoflow::reload::{ReloadCoordinator, ReloadObserver};
use thermoflow::store::StoreHandle;

/// Streaming temperature aggregation service
#[derive(Parser)]
#[command(name = "thermoflow", about = "Serves per-city yearly average temperatures")]
struct Cli {
    /// Source file with city;timestamp;temperature rows
    #[arg(long, default_value = "data/large_file.csv")]
    source: PathBuf,

    /// HTTP listen port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Rows per ingestion chunk
    #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Concurrent ingestion workers
    #[arg(long, default_value_t = config::DEFAULT_POOL_SIZE)]
    pool_size: usize,

    /// Chunks buffered between reader and workers
    #[arg(long, default_value_t = config::DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Memoised per-city query results
    #[arg(long, default_value_t = config::DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Ingest the source file once before serving
    #[arg(long)]
    preload: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let ingestion = IngestionConfig {
        chunk_size: cli.chunk_size,
        pool_size: cli.pool_size,
        queue_capacity: cli.queue_capacity,
    };
    ingestion.validate()?;
    let cache = CacheConfig {
        capacity: cli.cache_capacity,
    };
    cache.validate()?;

    let store = Arc::new(StoreHandle::new());
    let coordinator = Arc::new(ReloadCoordinator::new(Arc::clone(&store), ingestion));
    let service = Arc::new(TemperatureService::new(Arc::clone(&store), cache.capacity));
    coordinator.subscribe(Arc::clone(&service) as Arc<dyn ReloadObserver>);

    if cli.preload {
        let summary = coordinator
            .run_ingestion(&cli.source)
            .with_context(|| format!("preloading {}", cli.source.display()))?;
        info!(
            "preload complete: {} records, {} malformed",
            summary.records_processed, summary.malformed_count
        );
    } else if !cli.source.exists() {
        warn!(
            "source file {} does not exist yet; POST /update-data will fail until it does",
            cli.source.display()
        );
    }

    let state = web::Data::new(AppState {
        service,
        coordinator,
        source_path: cli.source,
    });

    info!("starting HTTP server on port {}", cli.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(("0.0.0.0", cli.port))?
    .run()
    .await?;

    Ok(())
}
