use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relay_server::config::CliArgs;
use relay_server::server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = args.resolve();

    let json_logs = config.log_json || std::env::var("RELAY_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("relay_server={}", config.log_level).parse()?);
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(host = %config.host, port = config.port, room = %config.room, "starting relay-server");

    Server::new(config).run().await?;
    Ok(())
}
