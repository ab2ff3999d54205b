mod cli;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stubby::config::{Config, LogFormat};
use stubby::Registry;

use cli::Line;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration before tracing so the log format is known
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Full => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    info!("Loaded configuration");

    let registry = Registry::in_memory(config.registry.clone());
    let sweeper = registry.start_sweeper();
    info!(
        "⏱  Expiry sweeper running every {}s",
        config.registry.sweep_interval_secs
    );
    info!("🔗 Short URLs will be served under {}", config.registry.base_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                None
            }
        };

        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match Line::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // Help and usage errors go straight to the terminal
                let _ = e.print();
                continue;
            }
        };

        match cli::execute(&registry, command).await {
            Some(output) => println!("{}", serde_json::to_string_pretty(&output)?),
            None => break,
        }
    }

    info!("Shutting down");
    sweeper.shutdown().await;

    Ok(())
}
