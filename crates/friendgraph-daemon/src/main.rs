use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use fastrace::collector::{Config as FastraceConfig, ConsoleReporter};
use friendgraph_config::{get_log_dir, Config};
use friendgraph_store::UserGraphStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod handlers;
mod server;

#[derive(Parser)]
#[command(name = "friendgraph-daemon")]
#[command(about = "Serve an in-memory graph of users and their friendships over HTTP.")]
#[command(version)]
struct Cli {
    #[arg(long, env = "FRIENDGRAPH_CONFIG", help = "Path to config.toml")]
    config: Option<PathBuf>,

    #[arg(long, help = "Address to listen on (overrides daemon.listen_addr)")]
    listen: Option<String>,

    #[arg(long, help = "Log to stderr instead of the daemon log file")]
    foreground: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(listen) = cli.listen {
        config.daemon.listen_addr = listen;
    }

    init_logging(&config, cli.foreground)?;

    if config.daemon.trace_spans {
        fastrace::set_reporter(ConsoleReporter, FastraceConfig::default());
    }

    let daemon = server::DaemonServer::new(config, UserGraphStore::new());

    info!("Starting friendgraph daemon");
    daemon.run().await?;

    Ok(())
}

fn init_logging(config: &Config, foreground: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.daemon.log_level))?;

    if foreground {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let log_dir = get_log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("daemon.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
