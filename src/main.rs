use bakraload::{Config, Downloader, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bakraload")]
#[command(about = "Social media download proxy (REST API)", version)]
struct Cli {
    /// JSON configuration file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding HOST/PORT and the config file
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default = if debug {
        "bakraload=debug,tower_http=debug"
    } else {
        "bakraload=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(bind) = cli.bind {
        config.api.bind_address = bind;
    }

    let downloader = Downloader::from_config(config.clone())?;
    let caps = downloader.capabilities();
    if !caps.fetcher_available {
        warn!("yt-dlp was not found; every download will fail until it is installed");
    }
    if !caps.transcoder_available {
        warn!("ffmpeg was not found; mp3 and merged YouTube downloads will fail");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        fetcher = %caps.fetcher,
        workspace_root = ?downloader.workspaces().root(),
        "bakraload starting"
    );

    bakraload::api::start_api_server(Arc::new(downloader), Arc::new(config)).await
}
