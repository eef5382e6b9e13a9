//! The single-client receiver loop.
//!
//! [`FrameReceiver`] binds once, then serves one client at a time: frames
//! from the current client are handed to a [`FrameHandler`] in arrival
//! order, and when that client goes away the receiver goes back to
//! accepting. Only a handler [`Flow::Shutdown`] or the stop handle end it.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ScastError;
use crate::receiver::handler::{Flow, FrameHandler};
use crate::stop::wait_for_stop;
use crate::transport::{Endpoint, LinkConfig, Received, TransportLink};

// ── ReceiverConfig ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Address to listen on.
    pub endpoint: Endpoint,
    /// Pending-connection queue length.
    pub backlog: u32,
    pub link: LinkConfig,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new("localhost", 6666),
            backlog: 1,
            link: LinkConfig::default(),
        }
    }
}

// ── ReceiverState ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Bound, not yet accepting.
    Listening,
    Accepting,
    /// Serving the client at `peer`.
    PerClient { peer: SocketAddr },
    Stopped,
}

impl std::fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listening => write!(f, "Listening"),
            Self::Accepting => write!(f, "Accepting"),
            Self::PerClient { peer } => write!(f, "PerClient({peer})"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

// ── ReceiverStats ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub clients_served: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    /// Frames the handler rejected.
    pub frames_dropped: u64,
    /// Client sessions that ended in a truncated frame or a stream error.
    pub abnormal_disconnects: u64,
}

/// Why [`FrameReceiver::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverExit {
    /// The handler returned [`Flow::Shutdown`].
    ShutdownRequested,
    /// The stop handle was cleared.
    Stopped,
}

/// How one client session ended.
enum Session {
    Ended,
    Shutdown,
    Stopped,
}

// ── FrameReceiver ────────────────────────────────────────────────

/// Accept → receive → accept again, one client at a time.
pub struct FrameReceiver {
    listener: TcpListener,
    config: ReceiverConfig,
    running: Arc<AtomicBool>,
    state: watch::Sender<ReceiverState>,
    stats: ReceiverStats,
}

impl FrameReceiver {
    /// Bind and listen on `config.endpoint` with `SO_REUSEADDR`.
    ///
    /// Failure here is the one fatal receiver error.
    pub async fn bind(config: ReceiverConfig) -> Result<Self, ScastError> {
        let endpoint = config.endpoint.to_string();
        let bind_err = |source: io::Error| ScastError::Bind {
            endpoint: endpoint.clone(),
            source,
        };

        let addr = tokio::net::lookup_host(endpoint.as_str())
            .await
            .map_err(bind_err)?
            .next()
            .ok_or_else(|| {
                bind_err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "host resolved to no addresses",
                ))
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let listener = socket.listen(config.backlog.max(1)).map_err(bind_err)?;

        let local = listener.local_addr().map_err(bind_err)?;
        let (state, _) = watch::channel(ReceiverState::Listening);
        info!(%local, "receiver listening");

        Ok(Self {
            listener,
            config,
            running: Arc::new(AtomicBool::new(true)),
            state,
            stats: ReceiverStats::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ScastError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the loop from another task.
    ///
    /// Storing `false` ends the receiver; a partially received frame is
    /// discarded along with its connection.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn state_receiver(&self) -> watch::Receiver<ReceiverState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ReceiverState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Serve clients until the handler asks to shut down or the receiver
    /// is stopped. A stop requested before `run` makes it return
    /// [`ReceiverExit::Stopped`] without accepting.
    pub async fn run<H: FrameHandler>(&mut self, handler: &mut H) -> Result<ReceiverExit, ScastError> {
        let exit = loop {
            if !self.is_running() {
                break ReceiverExit::Stopped;
            }
            self.set_state(ReceiverState::Accepting);

            let accepted = tokio::select! {
                result = self.listener.accept() => result,
                _ = wait_for_stop(&self.running) => break ReceiverExit::Stopped,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("accept error: {e}");
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!("set_nodelay failed for {peer}: {e}");
            }

            self.stats.clients_served += 1;
            self.set_state(ReceiverState::PerClient { peer });
            info!(%peer, "client connected");

            match self.serve(stream, peer, handler).await {
                Session::Ended => continue,
                Session::Shutdown => break ReceiverExit::ShutdownRequested,
                Session::Stopped => break ReceiverExit::Stopped,
            }
        };

        self.running.store(false, Ordering::SeqCst);
        self.set_state(ReceiverState::Stopped);
        info!(
            clients = self.stats.clients_served,
            frames = self.stats.frames_received,
            ?exit,
            "receiver stopped"
        );
        Ok(exit)
    }

    // ── Internal ─────────────────────────────────────────────────

    async fn serve<H: FrameHandler>(
        &mut self,
        stream: TcpStream,
        peer: SocketAddr,
        handler: &mut H,
    ) -> Session {
        let mut link = TransportLink::new(stream, self.config.link.clone());

        let session = loop {
            let received = tokio::select! {
                result = link.receive_frame() => result,
                _ = wait_for_stop(&self.running) => break Session::Stopped,
            };

            let frame = match received {
                Ok(Received::Frame(frame)) => frame,
                Ok(Received::EndOfStream(reason)) => {
                    if reason.is_clean() {
                        info!(%peer, "client disconnected");
                    } else {
                        self.stats.abnormal_disconnects += 1;
                        warn!(%peer, "client disconnected: {reason}");
                    }
                    break Session::Ended;
                }
                Err(e) => {
                    self.stats.abnormal_disconnects += 1;
                    warn!(%peer, "stream error: {e}");
                    break Session::Ended;
                }
            };

            self.stats.frames_received += 1;
            debug!(len = frame.len(), "frame received");

            match handler.on_frame(frame) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Shutdown) => break Session::Shutdown,
                Err(e) => {
                    self.stats.frames_dropped += 1;
                    warn!("frame dropped: {e}");
                }
            }
        };

        self.stats.bytes_received += link.stats().bytes_received;
        session
    }

    fn set_state(&self, next: ReceiverState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!("receiver state {prev} → {next}");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
