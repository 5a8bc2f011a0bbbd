//! Parkeo DB Adapter - Smoke-test entry point.
//!
//! Connects with the configured credentials, probes the database, optionally
//! runs a single MySQL-dialect statement through the translator, and shuts
//! the pool down cleanly.

use clap::Parser;
use parkeo_db::config::Config;
use parkeo_db::db::Adapter;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!(
        host = %config.host,
        database = %config.database,
        "Starting Parkeo DB adapter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let adapter = Adapter::connect(&config).await?;

    if !adapter.test_connection().await {
        error!("Database is unreachable, aborting");
        adapter.shutdown().await;
        std::process::exit(1);
    }

    if let Some(sql) = &config.run_sql {
        match adapter.query(sql, Vec::new()).await {
            Ok(result) => {
                info!(
                    rows = result.rows.len(),
                    affected = result.affected_rows,
                    "Statement executed"
                );
                println!("{}", serde_json::to_string_pretty(&result.rows)?);
            }
            Err(e) => {
                error!(error = %e, "Statement failed");
                if let Some(suggestion) = e.suggestion() {
                    eprintln!("Suggestion: {}", suggestion);
                }
                adapter.shutdown().await;
                std::process::exit(1);
            }
        }
    }

    adapter.shutdown().await;
    Ok(())
}
