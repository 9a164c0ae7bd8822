//! ISBN Atlas - a tile server for the ISBN identifier space.
//!
//! This binary loads datasets and classification tables, then starts the
//! HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isbn_atlas::{
    config::{CheckConfig, Cli, Command, DataSources, ServeConfig},
    dataset::DatasetRegistry,
    render::ClassificationTables,
    server::{create_router, RouterConfig},
    tile::{TileCache, TileEncoder, TileFormat, TileService},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("ISBN Atlas v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Datasets: {}", config.sources.datasets.display());
    info!("  Countries: {}", config.sources.countries.display());
    info!("  Publishers: {}", config.sources.publishers.display());
    info!("  Tile cache: {}", config.cache_dir.display());
    match config.tile_format {
        TileFormat::WebP => info!("  Tile format: webp (lossless)"),
        TileFormat::Jpeg => info!("  Tile format: jpeg (quality {})", config.jpeg_quality),
    }
    if config.no_cache {
        warn!("  Cache: DISABLED - every request regenerates its tile");
    }

    let (datasets, tables) = match load_sources(&config.sources).await {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if datasets.is_empty() {
        warn!(
            "No datasets found in {}; only category tiles will be served",
            config.sources.datasets.display()
        );
    }
    for dataset in datasets.iter() {
        info!("  Dataset {}: {} points", dataset.name(), dataset.len());
    }
    info!(
        "  Tables: {} registration groups, {} publisher prefixes",
        tables.countries.len(),
        tables.publishers.len()
    );

    let encoder = TileEncoder::with_format(config.tile_format, config.jpeg_quality);
    let cache = TileCache::with_encoder(&config.cache_dir, encoder).with_enabled(!config.no_cache);
    let tile_service = TileService::new(datasets, tables, cache);

    let router = create_router(tile_service, build_router_config(&config));
    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/datasets", addr);
    info!("    curl http://{}/tiles/countries/16/0/0.webp", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "isbn_atlas=debug,tower_http=debug"
    } else {
        "isbn_atlas=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

/// Load the dataset directory and both classification tables.
async fn load_sources(
    sources: &DataSources,
) -> Result<(DatasetRegistry, ClassificationTables), String> {
    let datasets = DatasetRegistry::load_dir(&sources.datasets)
        .await
        .map_err(|e| format!("Failed to load datasets: {}", e))?;
    let tables = ClassificationTables::load(&sources.countries, &sources.publishers)
        .await
        .map_err(|e| format!("Failed to load classification tables: {}", e))?;
    Ok((datasets, tables))
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("ISBN Atlas Data Check");
    println!("═════════════════════");
    println!();

    let datasets = match DatasetRegistry::load_dir(&config.sources.datasets).await {
        Ok(datasets) => {
            println!(
                "✓ Datasets: {} loaded from {}",
                datasets.len(),
                config.sources.datasets.display()
            );
            datasets
        }
        Err(e) => {
            println!("✗ Datasets: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tables = match ClassificationTables::load(
        &config.sources.countries,
        &config.sources.publishers,
    )
    .await
    {
        Ok(tables) => tables,
        Err(e) => {
            println!("✗ Tables: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("✓ Registration groups: {}", tables.countries.len());
    println!(
        "✓ Publisher prefixes: {} ({} ranges)",
        tables.publishers.len(),
        tables.publishers.rule_count()
    );

    if config.list_datasets {
        println!();
        println!("Datasets:");
        println!("─────────");
        if datasets.is_empty() {
            println!("  (no datasets found)");
        }
        for dataset in datasets.iter() {
            println!("  {:<24} {:>12} points", dataset.name(), dataset.len());
        }
    }

    println!();
    println!("═════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
