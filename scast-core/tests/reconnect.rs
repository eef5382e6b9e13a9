//! Sender reconnect behaviour on a paused clock.
//!
//! The connector hands out in-memory duplex streams, so every timing
//! assertion is exact: the only source of elapsed time is tokio's timer.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use scast_core::{
    Connector, LinkConfig, ScastError, SenderConfig, SenderState, StreamSender, TransportLink,
};
use tokio::io::DuplexStream;
use tokio::sync::mpsc;
use tokio::time::Instant;

// ── Helpers ──────────────────────────────────────────────────────

type Attempts = Arc<Mutex<Vec<Instant>>>;

/// Fails a fixed number of times, then succeeds with a duplex stream whose
/// far end is handed to the test through a channel.
struct FlakyConnector {
    failures_left: u32,
    attempts: Attempts,
    servers: mpsc::UnboundedSender<DuplexStream>,
}

impl FlakyConnector {
    fn new(failures: u32) -> (Self, Attempts, mpsc::UnboundedReceiver<DuplexStream>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            failures_left: failures,
            attempts: Arc::clone(&attempts),
            servers: tx,
        };
        (connector, attempts, rx)
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    type Stream = DuplexStream;

    async fn connect(&mut self) -> Result<DuplexStream, ScastError> {
        self.attempts.lock().unwrap().push(Instant::now());
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(ScastError::Connect {
                endpoint: self.peer(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        let (client, server) = tokio::io::duplex(64 * 1024);
        let _ = self.servers.send(server);
        Ok(client)
    }

    fn peer(&self) -> String {
        "flaky:0".into()
    }
}

fn config(backoff: Duration) -> SenderConfig {
    SenderConfig {
        frame_interval: Duration::from_millis(30),
        backoff,
        ..SenderConfig::default()
    }
}

/// Numbered payloads: 0, 1, 2, ...
fn counter() -> impl FnMut() -> Result<Bytes, ScastError> {
    let mut n = 0u32;
    move || {
        n += 1;
        Ok(Bytes::copy_from_slice(&(n - 1).to_le_bytes()))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_n_failures_then_connect() {
    const FAILURES: u32 = 3;
    let backoff = Duration::from_secs(5);

    let (connector, attempts, mut servers) = FlakyConnector::new(FAILURES);
    let mut sender = StreamSender::new(connector, counter(), config(backoff));
    let stop = sender.stop_handle();

    let test = async {
        let server = servers.recv().await.unwrap();
        let mut link = TransportLink::new(server, LinkConfig::default());
        let frame = link.receive_frame().await.unwrap().into_frame().unwrap();
        stop.store(false, Ordering::SeqCst);
        frame
    };

    let (result, frame) = tokio::join!(sender.run(), test);
    result.unwrap();

    assert_eq!(frame.payload().as_ref(), &0u32.to_le_bytes());

    let attempts = attempts.lock().unwrap();
    assert_eq!(attempts.len(), FAILURES as usize + 1);
    for pair in attempts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= backoff, "gap {gap:?} shorter than backoff");
        assert!(gap < backoff + Duration::from_millis(100), "gap {gap:?} too long");
    }

    let stats = sender.stats();
    assert_eq!(stats.connect_attempts, FAILURES as u64 + 1);
    assert_eq!(stats.sessions, 1);
    assert_eq!(sender.state(), SenderState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stream_failure_reconnects() {
    let backoff = Duration::from_secs(2);
    let (connector, attempts, mut servers) = FlakyConnector::new(0);
    let mut sender = StreamSender::new(connector, counter(), config(backoff));
    let stop = sender.stop_handle();

    let test = async {
        // First session: take one frame, then hang up.
        let server = servers.recv().await.unwrap();
        let mut link = TransportLink::new(server, LinkConfig::default());
        link.receive_frame().await.unwrap().into_frame().unwrap();
        drop(link);

        // Second session after the backoff.
        let server = servers.recv().await.unwrap();
        let mut link = TransportLink::new(server, LinkConfig::default());
        let frame = link.receive_frame().await.unwrap().into_frame().unwrap();
        stop.store(false, Ordering::SeqCst);
        frame
    };

    let (result, frame) = tokio::join!(sender.run(), test);
    result.unwrap();

    // The numbering continues across sessions; the failed send consumed one.
    let n = u32::from_le_bytes(frame.payload().as_ref().try_into().unwrap());
    assert!(n >= 2, "frame {n} should follow the lost one");

    let stats = sender.stats();
    assert_eq!(stats.sessions, 2);
    assert_eq!(stats.stream_failures, 1);

    let attempts = attempts.lock().unwrap();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[1] - attempts[0] >= backoff);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_backoff() {
    let (connector, attempts, _servers) = FlakyConnector::new(u32::MAX);
    let mut sender = StreamSender::new(connector, counter(), config(Duration::from_secs(5)));
    let stop = sender.stop_handle();
    let mut states = sender.state_receiver();
    let start = Instant::now();

    let (result, ()) = tokio::join!(sender.run(), async {
        tokio::time::sleep(Duration::from_secs(12)).await;
        stop.store(false, Ordering::SeqCst);
    });
    result.unwrap();

    // Attempts at t = 0, 5 and 10; the stop lands in the third backoff.
    assert_eq!(attempts.lock().unwrap().len(), 3);
    assert!(start.elapsed() < Duration::from_secs(13));
    assert_eq!(*states.borrow_and_update(), SenderState::Stopped);
    assert_eq!(sender.stats().sessions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_skips_iteration() {
    let (connector, _attempts, mut servers) = FlakyConnector::new(0);

    let mut calls = 0u32;
    let source = move || {
        calls += 1;
        if calls % 2 == 0 {
            Err(ScastError::Capture("frame not ready".into()))
        } else {
            Ok(Bytes::copy_from_slice(&calls.to_le_bytes()))
        }
    };

    let mut sender = StreamSender::new(connector, source, config(Duration::from_secs(5)));
    let stop = sender.stop_handle();

    let test = async {
        let server = servers.recv().await.unwrap();
        let mut link = TransportLink::new(server, LinkConfig::default());
        let mut seen = Vec::new();
        for _ in 0..3 {
            let frame = link.receive_frame().await.unwrap().into_frame().unwrap();
            seen.push(u32::from_le_bytes(frame.payload().as_ref().try_into().unwrap()));
        }
        stop.store(false, Ordering::SeqCst);
        seen
    };

    let (result, seen) = tokio::join!(sender.run(), test);
    result.unwrap();

    assert_eq!(seen, vec![1, 3, 5]);
    let stats = sender.stats();
    assert_eq!(stats.sessions, 1);
    assert!(stats.capture_failures >= 2);
    assert_eq!(stats.stream_failures, 0);
}
