//! Configuration for the sender.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use scast_core::{
    ByteOrder, CaptureRegion, Endpoint, LinkConfig, Normalizer, SenderConfig as LoopConfig,
};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Where to connect.
    pub network: NetworkConfig,
    /// Pacing and reconnect timing.
    pub stream: StreamConfig,
    /// Wire settings shared with the receiver.
    pub link: WireConfig,
    /// Screen capture settings.
    pub capture: CaptureConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Receiver host name or address.
    pub host: String,
    /// Receiver TCP port.
    pub port: u16,
    /// Per-attempt connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

/// Streaming cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Pause after each frame, in milliseconds.
    pub frame_interval_ms: u64,
    /// Wait before reconnecting after a failure, in milliseconds.
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// Length prefix byte order: "little", "big" or "native".
    pub byte_order: ByteOrder,
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// DXGI Desktop Duplication (Windows only).
    #[default]
    Screen,
    /// Synthetic moving pattern.
    Pattern,
}

/// Screen capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: CaptureSource,
    /// Monitor index to capture (0 = primary).
    pub monitor_index: u32,
    /// DXGI acquire timeout in milliseconds.
    pub capture_timeout_ms: u32,
    /// Crop to `region` before scaling. When false the full screen is used.
    pub crop: bool,
    pub region: CaptureRegion,
    /// Size of the transmitted image.
    pub output_width: u32,
    pub output_height: u32,
    /// zstd level, 1 (fast) to 19 (small).
    pub compression_level: i32,
    /// Size of the synthetic pattern, when `source = "pattern"`.
    pub pattern_width: u32,
    pub pattern_height: u32,
}

/// Logging settings.
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
            connect_timeout_ms: 3000,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 30,
            backoff_ms: 5000,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::Screen,
            monitor_index: 0,
            capture_timeout_ms: 100,
            crop: true,
            region: CaptureRegion::default(),
            output_width: 800,
            output_height: 600,
            compression_level: 3,
            pattern_width: 1920,
            pattern_height: 1080,
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

impl SenderConfig {
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

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms.max(1))
    }

    /// Settings for the core sender loop.
    pub fn to_loop_config(&self) -> LoopConfig {
        LoopConfig {
            frame_interval: Duration::from_millis(self.stream.frame_interval_ms),
            backoff: Duration::from_millis(self.stream.backoff_ms),
            link: LinkConfig {
                byte_order: self.link.byte_order,
                ..LinkConfig::default()
            },
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        let region = self.capture.crop.then_some(self.capture.region);
        Normalizer::new(
            region,
            Some((self.capture.output_width, self.capture.output_height)),
        )
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&SenderConfig::default()).unwrap();
        assert!(text.contains("frame_interval_ms"));
        assert!(text.contains("[capture.region]"));
    }

    #[test]
    fn roundtrip_config() {
        let text = toml::to_string_pretty(&SenderConfig::default()).unwrap();
        let parsed: SenderConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.port, 6666);
        assert_eq!(parsed.stream.backoff_ms, 5000);
        assert_eq!(parsed.capture.source, CaptureSource::Screen);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: SenderConfig = toml::from_str(
            r#"
            [network]
            host = "10.0.0.2"

            [capture]
            source = "pattern"

            [link]
            byte_order = "big"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.endpoint().to_string(), "10.0.0.2:6666");
        assert_eq!(parsed.capture.source, CaptureSource::Pattern);
        assert_eq!(parsed.capture.output_width, 800);

        let lc = parsed.to_loop_config();
        assert_eq!(lc.link.byte_order, ByteOrder::Big);
        assert_eq!(lc.frame_interval, Duration::from_millis(30));
        assert_eq!(lc.backoff, Duration::from_secs(5));
    }

    #[test]
    fn crop_can_be_disabled() {
        let mut cfg = SenderConfig::default();
        assert_eq!(
            cfg.normalizer(),
            Normalizer::new(Some(CaptureRegion::default()), Some((800, 600)))
        );
        cfg.capture.crop = false;
        assert_eq!(cfg.normalizer(), Normalizer::new(None, Some((800, 600))));
    }

    fn scratch_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("scast-sender-{}-{name}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("scast-sender-does-not-exist.toml");
        let (cfg, origin) = SenderConfig::load(&path);
        assert_eq!(origin, ConfigOrigin::Missing);
        assert_eq!(cfg.network.port, 6666);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let path = scratch_file("invalid", "[network]\nport = \"not a number\"\n");
        let (cfg, origin) = SenderConfig::load(&path);
        std::fs::remove_file(&path).ok();

        let ConfigOrigin::Invalid(message) = origin else {
            panic!("expected Invalid, got {origin:?}");
        };
        assert!(message.contains("port"), "{message}");
        assert_eq!(cfg.network.host, "localhost");
    }

    #[test]
    fn valid_file_is_used() {
        let path = scratch_file("valid", "[network]\nport = 7000\n");
        let (cfg, origin) = SenderConfig::load(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(origin, ConfigOrigin::File);
        assert_eq!(cfg.network.port, 7000);
    }
}
