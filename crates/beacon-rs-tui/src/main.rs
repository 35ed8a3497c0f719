//! Terminal client for a server-pushed event stream.

use anyhow::Context;
use beacon_rs_config::{BeaconConfig, LayeredConfigOptions};
use clap::Parser;
use directories::UserDirs;
use log::{debug, info};
use std::fs::OpenOptions;
use std::path::PathBuf;

const DEFAULT_LOG_FILE: &str = "beacon.log";
const DEFAULT_LOG_DIR: &str = ".beacon";

/// Command-line options for the Beacon client.
#[derive(Parser)]
#[command(name = "beacon", version)]
struct Cli {
    /// Additional beacon.json5 config file, applied over user and cwd layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Websocket endpoint, overrides `server.url`
    #[arg(long)]
    url: Option<String>,
    /// Connection attempt timeout in milliseconds, overrides `server.connect_timeout_ms`
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Log file path (defaults to ~/.beacon/beacon.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Entry point for the Beacon TUI client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone())?;
    info!(
        "starting beacon (config_set={}, url_set={}, timeout_set={})",
        cli.config.is_some(),
        cli.url.is_some(),
        cli.timeout_ms.is_some()
    );

    let cwd = std::env::current_dir().context("cwd")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    info!("loading layered config from cwd: {}", cwd.display());
    let layered = BeaconConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());

    let mut config = layered.config;
    if let Some(url) = cli.url {
        config.server.url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.server.connect_timeout_ms = timeout_ms;
    }
    config.validate().context("invalid configuration")?;

    beacon_rs_tui::run(config).await
}

/// Route `env_logger` output to a file; the terminal belongs to the UI.
fn init_logging(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}

fn default_log_path() -> PathBuf {
    UserDirs::new()
        .map(|dirs| dirs.home_dir().join(DEFAULT_LOG_DIR))
        .unwrap_or_default()
        .join(DEFAULT_LOG_FILE)
}
