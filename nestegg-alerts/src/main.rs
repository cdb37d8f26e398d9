//! nestegg-alerts - Alert derivation service
//!
//! Opens the shared finance database, activates an alert session for one
//! group and keeps it refreshed until interrupted. `--once` runs a single
//! pass and exits.

use anyhow::{Context, Result};
use clap::Parser;
use nestegg_alerts::{
    AlertSession, DefaultFormatter, SessionConfig, SqliteAlertStore, SqliteFinanceSource,
};
use nestegg_common::config::ConfigResolver;
use nestegg_common::db::init_database;
use nestegg_common::time::SystemClock;
use nestegg_common::GroupId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "nestegg-alerts")]
#[command(about = "Derive and persist finance alerts for a couple")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the finance database
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Group (couple) to serve; overrides `group_id` in the config file
    #[arg(short, long, env = "NESTEGG_GROUP")]
    group: Option<String>,

    /// Run one evaluation pass and exit
    #[arg(long)]
    once: bool,

    /// Mark every alert read after loading
    #[arg(long)]
    mark_all_read: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone(), args.database.clone());
    let config = resolver.load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting nestegg-alerts v{}", env!("CARGO_PKG_VERSION"));

    let group = args
        .group
        .or_else(|| config.group_id.clone())
        .map(GroupId::new)
        .context("No group given: pass --group, set NESTEGG_GROUP or group_id in config.toml")?;

    let db_path = resolver.database_path(&config);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let session = AlertSession::new(
        Arc::new(SqliteFinanceSource::new(pool.clone())),
        Arc::new(SqliteAlertStore::new(pool)),
        Arc::new(DefaultFormatter::new(config.display.currency_symbol.clone())),
        Arc::new(SystemClock),
        SessionConfig::from(&config.alerts),
    );

    session.activate(group.clone()).await;

    for alert in session.list().await {
        info!(
            "[{}] {:?} {}: {}",
            if alert.is_read { "read" } else { "new" },
            alert.kind().severity(),
            alert.title,
            alert.message
        );
    }
    info!("{} unread alerts for group {}", session.unread_count().await, group);

    if let Some(e) = session.last_error().await {
        error!("Alert pass completed with errors: {}", e);
    }

    if args.mark_all_read {
        let changed = session.mark_all_read().await;
        info!("Marked {} alerts read", changed);
    }

    if !args.once {
        info!("Refreshing alerts until interrupted (Ctrl+C)");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        info!("Shutdown requested");
    }

    session.deactivate().await;
    Ok(())
}
