//! scast sender: entry point.
//!
//! ```text
//! scast-sender                       Stream using ./scast-sender.toml
//! scast-sender --config <path>       Load a custom config TOML
//! scast-sender --server <host:port>  Override the receiver address
//! scast-sender --pattern             Stream a test pattern instead of the screen
//! scast-sender --gen-config          Write default config to stdout
//! ```

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scast_core::{Endpoint, StreamSender, TcpConnector};
use scast_sender::config::{CaptureSource, SenderConfig};
use scast_sender::source::build_pipeline;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "scast-sender", about = "Stream the screen to a scast receiver")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "scast-sender.toml")]
    config: PathBuf,

    /// Receiver address as host:port, overriding the config file.
    #[arg(short, long)]
    server: Option<String>,

    /// Send a synthetic test pattern instead of capturing the screen.
    #[arg(long)]
    pattern: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&SenderConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let (mut config, origin) = SenderConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    origin.report(&cli.config);

    if let Some(server) = &cli.server {
        let endpoint = Endpoint::parse(server)?;
        config.network.host = endpoint.host().to_string();
        config.network.port = endpoint.port();
    }
    if cli.pattern {
        config.capture.source = CaptureSource::Pattern;
    }

    info!("scast-sender v{}", env!("CARGO_PKG_VERSION"));
    info!("receiver: {}", config.endpoint());
    info!("frame interval: {} ms", config.stream.frame_interval_ms);
    info!("reconnect backoff: {} ms", config.stream.backoff_ms);

    let pipeline = match build_pipeline(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("capture unavailable: {e}");
            return Err(e.into());
        }
    };

    let connector = TcpConnector::new(config.endpoint(), config.connect_timeout());
    let mut sender = StreamSender::new(connector, pipeline, config.to_loop_config());

    // Ctrl-C handler.
    let stop = sender.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.store(false, Ordering::SeqCst);
    });

    sender.run().await?;

    let stats = sender.stats();
    info!(
        sessions = stats.sessions,
        frames = stats.frames_sent,
        bytes = stats.bytes_sent,
        "done"
    );
    Ok(())
}
