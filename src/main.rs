use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use domo_server::api::start_http_server;
use domo_server::config::Config;
use domo_server::storage::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "domo_server=info,tower_http=info,warn".into()),
        )
        .init();

    let matches = Command::new("Domo Server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Webhook analytics capture and conversation scoring for AI-agent product demos")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDR")
                .help("Bind address (overrides config)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Listen port (overrides config)"),
        )
        .arg(
            Arg::new("db-path")
                .short('d')
                .long("db-path")
                .value_name("FILE")
                .help("SQLite database file (overrides config)"),
        )
        .get_matches();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }
    if let Some(db_path) = matches.get_one::<String>("db-path") {
        config.database.path = PathBuf::from(db_path);
    }

    info!("🚀 Domo server starting...");
    info!("💾 Database: {}", config.database.path.display());
    if config.tavus.api_key.is_none() {
        warn!("No Tavus API key configured; conversation creation will be disabled");
    }

    let db = Database::new(config.database.path.clone())?;

    start_http_server(db, Arc::new(config)).await
}
