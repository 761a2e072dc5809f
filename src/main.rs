use clap::Parser;

use sql_emulator::config::{Args, ServerConfig};
use sql_emulator::logging::init_tracing;
use sql_emulator::server::serve;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = ServerConfig::from_args(args);
    if let Err(err) = init_tracing(&config) {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    }

    let config_json = serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string());
    tracing::info!("config: {}", config_json);

    if let Err(err) = serve(config).await {
        eprintln!("sql-emulator: {err}");
        std::process::exit(1);
    }
}
