use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vigil_types::config::{DEFAULT_DB_FILENAME, DEFAULT_LISTEN};
use vigil_types::ServerConfig;

/// Vigil -- security-alert webhook monitor.
#[derive(Parser, Debug)]
#[command(name = "vigil-server", version, about)]
struct Cli {
    /// Address to bind the HTTP/WebSocket server to
    #[arg(long, env = "VIGIL_LISTEN", default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Path to the SQLite webhook database
    #[arg(long, env = "VIGIL_DB", default_value = DEFAULT_DB_FILENAME)]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        listen: cli.listen,
        db_path: cli.db,
        ..ServerConfig::default()
    };

    vigil_server::run(config).await?;
    Ok(())
}
