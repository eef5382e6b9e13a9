//! Integration tests: frame round-trips, ordering and receiver lifecycle
//! over a real TCP connection on localhost.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use scast_core::{
    ByteOrder, CapturePipeline, DetectionPipeline, Display, Endpoint, Flow, Frame, FrameCodec,
    FrameHandler, FrameReceiver, FrameStats, Image, LinkConfig, MotionAnnotator, Normalizer,
    PatternCapture, ReceiverConfig, ReceiverExit, Received, ScastError, SenderConfig, StreamSender,
    TcpConnector, TransportLink, ZstdImageCodec,
};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};

// ── Helpers ──────────────────────────────────────────────────────

/// Connected client/server stream pair on an OS-assigned port.
async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (client.unwrap(), accepted.unwrap().0)
}

async fn loopback_receiver() -> FrameReceiver {
    FrameReceiver::bind(ReceiverConfig {
        endpoint: Endpoint::new("127.0.0.1", 0),
        backlog: 4,
        ..ReceiverConfig::default()
    })
    .await
    .unwrap()
}

/// Records every payload; `b"bad"` is rejected, `b"bye"` shuts down.
#[derive(Default)]
struct RecordingHandler {
    payloads: Vec<Bytes>,
}

impl FrameHandler for RecordingHandler {
    fn on_frame(&mut self, frame: Frame) -> Result<Flow, ScastError> {
        let payload = frame.into_payload();
        if payload.as_ref() == b"bad" {
            return Err(ScastError::Decode("rejected".into()));
        }
        let done = payload.as_ref() == b"bye";
        self.payloads.push(payload);
        Ok(if done { Flow::Shutdown } else { Flow::Continue })
    }
}

async fn connect_link(addr: std::net::SocketAddr) -> TransportLink<TcpStream> {
    let stream = TcpStream::connect(addr).await.unwrap();
    TransportLink::new(stream, LinkConfig::default())
}

// ── Round trips ──────────────────────────────────────────────────

#[tokio::test]
async fn test_round_trip_sizes() {
    let sizes = [0usize, 1, 8191, 8192, 8193, 1 << 20];
    let (client, server) = tcp_pair().await;

    let writer = tokio::spawn(async move {
        let mut link = TransportLink::new(client, LinkConfig::default());
        for (i, &len) in sizes.iter().enumerate() {
            let payload: Vec<u8> = (0..len).map(|b| (b + i) as u8).collect();
            link.send_frame(payload).await.unwrap();
        }
        link.stats()
    });

    let mut link = TransportLink::new(server, LinkConfig::default());
    for (i, &len) in sizes.iter().enumerate() {
        let frame = link.receive_frame().await.unwrap().into_frame().unwrap();
        assert_eq!(frame.len(), len);
        assert!(frame.payload().iter().enumerate().all(|(b, &v)| v == (b + i) as u8));
    }

    let sent = writer.await.unwrap();
    assert_eq!(sent.frames_sent, sizes.len() as u64);
    assert_eq!(sent.bytes_sent, link.stats().bytes_received);

    // Writer dropped its stream: clean end on a frame boundary.
    assert!(matches!(
        link.receive_frame().await.unwrap(),
        Received::EndOfStream(eos) if eos.is_clean()
    ));
}

#[tokio::test]
async fn test_frames_arrive_in_order() {
    let (client, server) = tcp_pair().await;

    let writer = tokio::spawn(async move {
        let mut link = TransportLink::new(client, LinkConfig::default());
        for i in 0u32..200 {
            link.send_frame(i.to_le_bytes().to_vec()).await.unwrap();
        }
    });

    let mut link = TransportLink::new(server, LinkConfig::default());
    for i in 0u32..200 {
        let frame = link.receive_frame().await.unwrap().into_frame().unwrap();
        assert_eq!(frame.payload().as_ref(), &i.to_le_bytes());
    }
    writer.await.unwrap();
}

#[tokio::test]
async fn test_framed_codec_interoperates_with_link() {
    let (client, server) = tcp_pair().await;
    let (server_read, server_write) = server.into_split();

    // Link → FramedRead.
    let mut link = TransportLink::new(client, LinkConfig {
        byte_order: ByteOrder::Big,
        ..LinkConfig::default()
    });
    link.send_frame(&b"alpha"[..]).await.unwrap();
    link.send_frame(Bytes::new()).await.unwrap();

    let mut framed = FramedRead::new(server_read, FrameCodec::new(ByteOrder::Big));
    assert_eq!(framed.next().await.unwrap().unwrap().as_ref(), b"alpha");
    assert!(framed.next().await.unwrap().unwrap().is_empty());

    // FramedWrite → link.
    let mut sink = FramedWrite::new(server_write, FrameCodec::new(ByteOrder::Big));
    sink.send(Bytes::from_static(b"omega")).await.unwrap();
    let frame = link.receive_frame().await.unwrap().into_frame().unwrap();
    assert_eq!(frame.payload().as_ref(), b"omega");
}

// ── Receiver lifecycle ───────────────────────────────────────────

#[tokio::test]
async fn test_receiver_survives_mid_payload_disconnect() {
    let mut receiver = loopback_receiver().await;
    let addr = receiver.local_addr().unwrap();
    let mut handler = RecordingHandler::default();

    let clients = async move {
        // First client announces 100 bytes, sends 10, and vanishes.
        let mut raw = TcpStream::connect(addr).await.unwrap();
        raw.write_all(&100u64.to_le_bytes()).await.unwrap();
        raw.write_all(&[0xAA; 10]).await.unwrap();
        drop(raw);

        // Second client is served normally.
        let mut link = connect_link(addr).await;
        link.send_frame(&b"hello"[..]).await.unwrap();
        link.send_frame(&b"bye"[..]).await.unwrap();
        link
    };

    let (exit, _link) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(receiver.run(&mut handler), clients) },
    )
    .await
    .expect("timeout");

    assert_eq!(exit.unwrap(), ReceiverExit::ShutdownRequested);
    assert_eq!(handler.payloads, vec![Bytes::from("hello"), Bytes::from("bye")]);

    let stats = receiver.stats();
    assert_eq!(stats.clients_served, 2);
    assert_eq!(stats.abnormal_disconnects, 1);
    assert_eq!(stats.frames_received, 2);
}

#[tokio::test]
async fn test_handler_error_keeps_connection() {
    let mut receiver = loopback_receiver().await;
    let addr = receiver.local_addr().unwrap();
    let mut handler = RecordingHandler::default();

    let client = async move {
        let mut link = connect_link(addr).await;
        for payload in [&b"a"[..], b"bad", b"b", b"bye"] {
            link.send_frame(payload).await.unwrap();
        }
        link
    };

    let (exit, _link) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(receiver.run(&mut handler), client) },
    )
    .await
    .expect("timeout");

    assert_eq!(exit.unwrap(), ReceiverExit::ShutdownRequested);
    assert_eq!(
        handler.payloads,
        vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("bye")]
    );
    assert_eq!(receiver.stats().clients_served, 1);
    assert_eq!(receiver.stats().frames_dropped, 1);
}

#[tokio::test]
async fn test_clean_close_returns_to_accepting() {
    let mut receiver = loopback_receiver().await;
    let addr = receiver.local_addr().unwrap();
    let mut handler = RecordingHandler::default();

    let clients = async move {
        for _ in 0..3 {
            let mut link = connect_link(addr).await;
            link.send_frame(&b"one"[..]).await.unwrap();
            link.shutdown().await.unwrap();
        }
        let mut link = connect_link(addr).await;
        link.send_frame(&b"bye"[..]).await.unwrap();
        link
    };

    let (exit, _link) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(receiver.run(&mut handler), clients) },
    )
    .await
    .expect("timeout");

    assert_eq!(exit.unwrap(), ReceiverExit::ShutdownRequested);
    assert_eq!(handler.payloads.len(), 4);
    assert_eq!(receiver.stats().clients_served, 4);
    assert_eq!(receiver.stats().abnormal_disconnects, 0);
}

#[tokio::test]
async fn test_stop_discards_partial_frame() {
    let mut receiver = loopback_receiver().await;
    let addr = receiver.local_addr().unwrap();
    let stop = receiver.stop_handle();
    let mut handler = RecordingHandler::default();

    let client = async move {
        let mut raw = TcpStream::connect(addr).await.unwrap();
        raw.write_all(&64u64.to_le_bytes()).await.unwrap();
        raw.write_all(&[1; 32]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
        raw
    };

    let (exit, _raw) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(receiver.run(&mut handler), client) },
    )
    .await
    .expect("timeout");

    assert_eq!(exit.unwrap(), ReceiverExit::Stopped);
    assert!(handler.payloads.is_empty());
    assert_eq!(receiver.stats().frames_received, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_bind_fails_on_port_in_use() {
    let first = loopback_receiver().await;
    let port = first.local_addr().unwrap().port();

    let second = FrameReceiver::bind(ReceiverConfig {
        endpoint: Endpoint::new("127.0.0.1", port),
        ..ReceiverConfig::default()
    })
    .await;

    assert!(matches!(second, Err(ScastError::Bind { .. })));
}

// ── End to end ───────────────────────────────────────────────────

/// Display that asks to stop after `limit` frames.
struct CountingDisplay {
    shown: usize,
    limit: usize,
    last: FrameStats,
}

impl Display for CountingDisplay {
    fn show(&mut self, image: &Image) -> Result<(), ScastError> {
        assert_eq!((image.width(), image.height()), (160, 120));
        self.shown += 1;
        Ok(())
    }

    fn stop_requested(&mut self) -> bool {
        self.shown >= self.limit
    }

    fn update_stats(&mut self, stats: &FrameStats) {
        self.last = *stats;
    }
}

#[tokio::test]
async fn test_sender_to_receiver_pipeline() {
    let mut receiver = loopback_receiver().await;
    let addr = receiver.local_addr().unwrap();

    let mut pipeline = DetectionPipeline::new(
        ZstdImageCodec::default(),
        MotionAnnotator::new(16, 10),
        CountingDisplay {
            shown: 0,
            limit: 5,
            last: FrameStats::default(),
        },
    );

    let connector = TcpConnector::new(
        Endpoint::new("127.0.0.1", addr.port()),
        Duration::from_secs(1),
    );
    let source = CapturePipeline::new(
        PatternCapture::new(320, 240),
        Normalizer::new(None, Some((160, 120))),
        ZstdImageCodec::new(1),
    );
    let mut sender = StreamSender::new(
        connector,
        source,
        SenderConfig {
            frame_interval: Duration::from_millis(5),
            backoff: Duration::from_millis(50),
            ..SenderConfig::default()
        },
    );
    let sender_stop = sender.stop_handle();

    let receive = async {
        let exit = receiver.run(&mut pipeline).await;
        sender_stop.store(false, std::sync::atomic::Ordering::SeqCst);
        exit
    };

    let (exit, sent) = tokio::time::timeout(Duration::from_secs(20), async {
        tokio::join!(receive, sender.run())
    })
    .await
    .expect("timeout");

    assert_eq!(exit.unwrap(), ReceiverExit::ShutdownRequested);
    sent.unwrap();

    let stats = pipeline.stats();
    assert_eq!(stats.total_frames, 5);
    assert_eq!(stats.dropped_frames, 0);
    assert_eq!(pipeline.display().last.total_frames, 5);
    assert!(sender.stats().frames_sent >= 5);
}
