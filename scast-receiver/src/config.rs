//! Receiver configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use scast_core::{
    ByteOrder, Endpoint, LinkConfig, MotionAnnotator, ReceiverConfig as LoopConfig,
};

/// Top-level configuration for the receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Listen address.
    pub network: NetworkConfig,
    /// Wire settings shared with the sender.
    pub link: WireConfig,
    /// Motion detection.
    pub analysis: AnalysisConfig,
    /// Display settings.
    pub display: DisplayConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind.
    pub host: String,
    pub port: u16,
    /// Pending-connection queue length.
    pub backlog: u32,
}

/// Wire settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// Length prefix byte order: "little", "big" or "native".
    pub byte_order: ByteOrder,
    /// Upper bound on bytes requested per socket read.
    pub read_chunk_size: usize,
    /// Largest accepted frame in MiB; 0 disables the check.
    pub max_frame_mb: u64,
}

/// Motion detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// When false frames are displayed unannotated.
    pub enabled: bool,
    /// Tile size in pixels.
    pub block_size: u32,
    /// Per-channel difference that counts as change.
    pub threshold: u8,
    /// Box colour as `[b, g, r]`.
    pub color: [u8; 3],
}

/// How frames are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    /// Native window (Windows only).
    #[default]
    Window,
    /// No window; statistics are logged.
    Headless,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub backend: DisplayBackend,
    /// Window title.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Keep the window above all others.
    pub topmost: bool,
    /// Log statistics every this many frames (headless backend).
    pub stats_interval: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6666,
            backlog: 1,
        }
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Little,
            read_chunk_size: 8192,
            max_frame_mb: 64,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_size: 16,
            threshold: 24,
            color: [0x00, 0xFF, 0x00],
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: DisplayBackend::Window,
            title: "Object Detection".into(),
            width: 800,
            height: 600,
            topmost: true,
            stats_interval: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from the file.
    File,
    /// No readable file; defaults used.
    Missing,
    /// The file did not parse; defaults used.
    Invalid(String),
}

impl ConfigOrigin {
    /// Log how the configuration at `path` was obtained.
    pub fn report(&self, path: &Path) {
        match self {
            Self::File => tracing::info!("config loaded from {}", path.display()),
            Self::Missing => tracing::info!("no config at {}; using defaults", path.display()),
            Self::Invalid(e) => {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display())
            }
        }
    }
}

impl ReceiverConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Returns where the values came from so the caller can report a
    /// fallback once logging is initialised.
    pub fn load(path: &Path) -> (Self, ConfigOrigin) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, ConfigOrigin::File),
                Err(e) => (Self::default(), ConfigOrigin::Invalid(e.to_string())),
            },
            Err(_) => (Self::default(), ConfigOrigin::Missing),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.network.host.clone(), self.network.port)
    }

    /// Settings for the core receiver loop.
    pub fn to_loop_config(&self) -> LoopConfig {
        let max_frame_len = match self.link.max_frame_mb {
            0 => None,
            mb => Some(mb.saturating_mul(1024 * 1024)),
        };
        LoopConfig {
            endpoint: self.endpoint(),
            backlog: self.network.backlog,
            link: LinkConfig {
                read_chunk_size: self.link.read_chunk_size.max(1),
                byte_order: self.link.byte_order,
                max_frame_len,
            },
        }
    }

    /// The configured detector, or `None` when analysis is disabled.
    pub fn annotator(&self) -> Option<MotionAnnotator> {
        let a = &self.analysis;
        a.enabled
            .then(|| MotionAnnotator::new(a.block_size, a.threshold).with_color(a.color))
    }
}

// ── Tests ────────────────────────────────────────────────────────
