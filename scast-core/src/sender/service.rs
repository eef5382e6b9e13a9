//! The reconnecting sender loop.
//!
//! [`StreamSender`] owns one [`Connector`], one [`FrameSource`] and one
//! [`BackoffPolicy`]. It runs as a single task: connect, stream frames at
//! a fixed cadence until the connection breaks, back off, and connect
//! again, until its stop handle is cleared.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ScastError;
use crate::sender::backoff::{BackoffPolicy, FixedBackoff};
use crate::sender::source::FrameSource;
use crate::stop::{sleep_or_stop, wait_for_stop};
use crate::transport::{Connector, LinkConfig, TransportLink};

// ── SenderConfig ─────────────────────────────────────────────────

/// Static sender settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// Pause after each frame before capturing the next one.
    pub frame_interval: Duration,
    /// Delay used by the default [`FixedBackoff`].
    pub backoff: Duration,
    pub link: LinkConfig,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(30),
            backoff: Duration::from_secs(5),
            link: LinkConfig::default(),
        }
    }
}

// ── SenderState ──────────────────────────────────────────────────

/// Where the sender loop currently is.
///
/// ```text
///  Disconnected ──► Connecting ──► Streaming
///       ▲               │              │
///       └───────────────┴──────────────┘
///  (any state) ──stop──► Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    #[default]
    Disconnected,
    Connecting,
    Streaming,
    Stopped,
}

impl std::fmt::Display for SenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

// ── SenderStats ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Connection attempts, successful or not.
    pub connect_attempts: u64,
    /// Connections that reached `Streaming`.
    pub sessions: u64,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    /// Iterations skipped because the source failed.
    pub capture_failures: u64,
    /// Sessions that ended with a send error.
    pub stream_failures: u64,
}

// ── StreamSender ─────────────────────────────────────────────────

/// Connect → stream → back off → reconnect, until stopped.
pub struct StreamSender<C, S, B = FixedBackoff> {
    connector: C,
    source: S,
    backoff: B,
    config: SenderConfig,
    running: Arc<AtomicBool>,
    state: watch::Sender<SenderState>,
    stats: SenderStats,
}

impl<C, S> StreamSender<C, S, FixedBackoff>
where
    C: Connector,
    S: FrameSource,
{
    /// Create a sender using a [`FixedBackoff`] of `config.backoff`.
    pub fn new(connector: C, source: S, config: SenderConfig) -> Self {
        let backoff = FixedBackoff::new(config.backoff);
        Self::with_backoff(connector, source, backoff, config)
    }
}

impl<C, S, B> StreamSender<C, S, B>
where
    C: Connector,
    S: FrameSource,
    B: BackoffPolicy,
{
    pub fn with_backoff(connector: C, source: S, backoff: B, config: SenderConfig) -> Self {
        let (state, _) = watch::channel(SenderState::Disconnected);
        Self {
            connector,
            source,
            backoff,
            config,
            running: Arc::new(AtomicBool::new(true)),
            state,
            stats: SenderStats::default(),
        }
    }

    /// Handle for stopping the loop from another task.
    ///
    /// Storing `false` stops the sender at its next suspension point. A
    /// frame write in progress is always completed first.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Subscribe to state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<SenderState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SenderState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run until stopped.
    ///
    /// Connection and stream failures never end the loop; they are logged
    /// and followed by a backoff wait. A stop requested before `run` makes
    /// it return at once, so a sender runs at most once.
    pub async fn run(&mut self) -> Result<(), ScastError> {
        let peer = self.connector.peer();
        let mut failures: u32 = 0;

        info!(%peer, "sender started");

        while self.is_running() {
            self.set_state(SenderState::Connecting);
            self.stats.connect_attempts += 1;

            let connected = tokio::select! {
                result = self.connector.connect() => result,
                _ = wait_for_stop(&self.running) => break,
            };

            match connected {
                Ok(stream) => {
                    failures = 0;
                    self.backoff.reset();
                    self.stats.sessions += 1;
                    self.set_state(SenderState::Streaming);
                    info!(%peer, "connected, streaming");

                    let mut link = TransportLink::new(stream, self.config.link.clone());
                    let outcome = self.stream(&mut link).await;
                    self.stats.bytes_sent += link.stats().bytes_sent;

                    match outcome {
                        Ok(()) => {
                            // Stopped while streaming.
                            if let Err(e) = link.shutdown().await {
                                debug!("shutdown after stop failed: {e}");
                            }
                            break;
                        }
                        Err(e) => {
                            self.stats.stream_failures += 1;
                            warn!(%peer, "stream failed: {e}");
                            failures = 1;
                        }
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(%peer, attempt = failures, "connect failed: {e}");
                }
            }

            self.set_state(SenderState::Disconnected);
            let delay = self.backoff.next_delay(failures);
            info!("reconnecting in {:.1}s", delay.as_secs_f64());
            if !sleep_or_stop(&self.running, delay).await {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.set_state(SenderState::Stopped);
        info!(
            sessions = self.stats.sessions,
            frames = self.stats.frames_sent,
            "sender stopped"
        );
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Stream frames until a send fails (`Err`) or the sender is stopped (`Ok`).
    async fn stream(&mut self, link: &mut TransportLink<C::Stream>) -> Result<(), ScastError> {
        while self.is_running() {
            match self.source.next_frame() {
                Ok(payload) => {
                    let len = payload.len();
                    link.send_frame(payload).await?;
                    self.stats.frames_sent += 1;
                    debug!(len, "frame sent");
                }
                Err(e) => {
                    self.stats.capture_failures += 1;
                    warn!("frame skipped: {e}");
                }
            }

            if !sleep_or_stop(&self.running, self.config.frame_interval).await {
                break;
            }
        }
        Ok(())
    }

    fn set_state(&self, next: SenderState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!("sender state {prev} → {next}");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
