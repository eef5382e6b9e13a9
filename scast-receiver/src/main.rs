//! scast receiver: entry point.
//!
//! ```text
//! scast-receiver                       Listen using ./scast-receiver.toml
//! scast-receiver --config <path>       Use custom config TOML
//! scast-receiver --listen <host:port>  Override the listen address
//! scast-receiver --headless            Log statistics instead of opening a window
//! scast-receiver --gen-config          Dump default config and exit
//! ```

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scast_core::{
    DetectionPipeline, Endpoint, FrameProcessor, FrameReceiver, Passthrough, ReceiverExit,
    ZstdImageCodec,
};
use scast_receiver::config::{DisplayBackend, ReceiverConfig};
use scast_receiver::display;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "scast-receiver", about = "Receive, annotate and display a scast stream")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "scast-receiver.toml")]
    config: PathBuf,

    /// Listen address as host:port (overrides config). Example: 0.0.0.0:6666
    #[arg(short, long)]
    listen: Option<String>,

    /// Do not open a window.
    #[arg(long)]
    headless: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ReceiverConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let (mut config, origin) = ReceiverConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    origin.report(&cli.config);

    if let Some(addr) = &cli.listen {
        let endpoint = Endpoint::parse(addr)?;
        config.network.host = endpoint.host().to_string();
        config.network.port = endpoint.port();
    }
    if cli.headless {
        config.display.backend = DisplayBackend::Headless;
    }

    info!("scast-receiver v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Bind ─────────────────────────────────────────────────

    let mut receiver = match FrameReceiver::bind(config.to_loop_config()).await {
        Ok(r) => r,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };

    // ── 2. Build the frame pipeline ─────────────────────────────

    let processor: Box<dyn FrameProcessor> = match config.annotator() {
        Some(annotator) => {
            info!(
                block = config.analysis.block_size,
                threshold = config.analysis.threshold,
                "motion annotation enabled"
            );
            Box::new(annotator)
        }
        None => Box::new(Passthrough),
    };
    let mut pipeline = DetectionPipeline::new(
        ZstdImageCodec::default(),
        processor,
        display::open(&config.display),
    );

    // ── 3. Serve until stopped ──────────────────────────────────

    let stop = receiver.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.store(false, Ordering::SeqCst);
    });

    let exit = receiver.run(&mut pipeline).await?;
    match exit {
        ReceiverExit::ShutdownRequested => info!("display closed"),
        ReceiverExit::Stopped => info!("stopped"),
    }

    let stats = pipeline.stats();
    info!(
        frames = stats.total_frames,
        dropped = stats.dropped_frames,
        clients = receiver.stats().clients_served,
        "shutting down"
    );
    Ok(())
}
