// MIT License - Copyright (c) 2026 Peter Wright
// End-to-end link tests over an in-memory stream

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};

use ademco_serial::codec::{build_body, encode_frame};
use ademco_serial::{Connector, EventReceiver, LinkState, Panel, PanelConfig, PanelEvent};

/// Hands the far end of every connection to the test.
struct MockConnector {
    peers: mpsc::UnboundedSender<DuplexStream>,
    connects: Arc<AtomicUsize>,
}

impl Connector for MockConnector {
    type Stream = DuplexStream;

    fn connect(
        &self,
        _device: &str,
        _baud: u32,
    ) -> impl Future<Output = io::Result<DuplexStream>> + Send {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let (ours, theirs) = tokio::io::duplex(4096);
        let handed_over = self.peers.send(theirs);
        async move {
            handed_over
                .map(|_| ours)
                .map_err(|_| io::Error::other("test harness gone"))
        }
    }
}

struct Harness {
    panel: Panel,
    events: EventReceiver,
    peers: mpsc::UnboundedReceiver<DuplexStream>,
    connects: Arc<AtomicUsize>,
}

impl Harness {
    fn start() -> Self {
        let (tx, peers) = mpsc::unbounded_channel();
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = MockConnector {
            peers: tx,
            connects: connects.clone(),
        };
        let config = PanelConfig::builder()
            .device("/dev/ttyTEST")
            .zones([1, 2, 3, 4])
            .outputs([1])
            .build();
        let panel = Panel::with_connector(config, connector).unwrap();
        let events = panel.subscribe();
        Self {
            panel,
            events,
            peers,
            connects,
        }
    }

    async fn next_peer(&mut self) -> DuplexStream {
        timeout(Duration::from_secs(60), self.peers.recv())
            .await
            .expect("no connection attempt")
            .expect("connector dropped")
    }

    /// Accept a connection and consume the priming bytes and the first
    /// zone status request.
    async fn connect(&mut self) -> DuplexStream {
        let mut peer = self.next_peer().await;
        expect_bytes(&mut peer, b"\r\n").await;
        expect_bytes(&mut peer, b"08zs004B\r\n").await;
        peer
    }

    async fn wait_for(&mut self, mut pred: impl FnMut(&PanelEvent) -> bool) -> PanelEvent {
        let events = &mut self.events;
        timeout(Duration::from_secs(60), async move {
            loop {
                let event = events.recv().await.unwrap();
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("event not seen")
    }
}

fn frame(message_type: &str, data: &str) -> Vec<u8> {
    encode_frame(&build_body(message_type, data).unwrap())
}

async fn expect_bytes(peer: &mut DuplexStream, expected: &[u8]) {
    let mut buf = vec![0u8; expected.len()];
    timeout(Duration::from_secs(60), peer.read_exact(&mut buf))
        .await
        .expect("nothing written")
        .unwrap();
    assert_eq!(
        String::from_utf8_lossy(&buf),
        String::from_utf8_lossy(expected)
    );
}

#[tokio::test(start_paused = true)]
async fn test_primes_then_requests_zone_status() {
    let mut h = Harness::start();
    let _peer = h.connect().await;
    assert!(matches!(
        h.wait_for(|e| matches!(e, PanelEvent::Connected)).await,
        PanelEvent::Connected
    ));
    assert_eq!(h.panel.link_state(), LinkState::Connected);
    assert!(!h.panel.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn test_zone_status_initializes() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    peer.write_all(b"0CZS10001F\r\n").await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::Initialized)).await;

    assert!(h.panel.zone(1).unwrap().opened());
    for id in 2..=4 {
        assert!(h.panel.zone(id).unwrap().closed());
    }
    assert!(h.panel.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn test_requests_outputs_and_partitions_once_initialized() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    peer.write_all(&frame("ZS", "0000")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::Initialized)).await;

    expect_bytes(&mut peer, &encode_frame("08cs00")).await;
    expect_bytes(&mut peer, &encode_frame("08zp00")).await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_peer_drops() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    peer.write_all(&frame("ZS", "1")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::Initialized)).await;

    drop(peer);
    h.wait_for(|e| matches!(e, PanelEvent::Disconnected)).await;
    assert!(!h.panel.is_initialized());

    let mut peer = h.connect().await;
    assert_eq!(h.connects.load(Ordering::SeqCst), 2);
    // model survives the reconnect
    assert!(h.panel.zone(1).unwrap().opened());

    peer.write_all(&frame("ZS", "0")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::Initialized)).await;
    assert!(h.panel.zone(1).unwrap().closed());
}

#[tokio::test(start_paused = true)]
async fn test_frames_applied_in_arrival_order() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    let mut burst = frame("ZS", "1");
    burst.extend(frame("NQ", "2C00"));
    peer.write_all(&burst).await.unwrap();

    h.wait_for(|e| matches!(e, PanelEvent::SystemEvent { .. })).await;
    assert!(h.panel.zone(1).unwrap().closed());
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_frame_is_dropped() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    // checksum of 0CZS1000 is 1F
    peer.write_all(b"0CZS100020\r\n").await.unwrap();
    peer.write_all(&frame("NQ", "1C00")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::SystemEvent { .. })).await;

    assert!(h.panel.zone(1).unwrap().closed());
    assert!(!h.panel.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn test_output_status_skips_unused() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    peer.write_all(&frame("CS", "10U0")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::OutputStatusChanged { output_id: 4, .. }))
        .await;

    assert!(h.panel.output(1).unwrap().is_on());
    assert!(h.panel.output(2).unwrap().is_off());
    assert!(h.panel.output(3).is_none());
    assert!(h.panel.output(4).unwrap().is_off());
}

#[tokio::test(start_paused = true)]
async fn test_identical_reports_notify_once() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    h.panel.zone(2).unwrap().register_callback(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    peer.write_all(&frame("ZS", "0100")).await.unwrap();
    peer.write_all(&frame("ZS", "0100")).await.unwrap();
    // unmapped event as a marker that both reports were routed
    peer.write_all(&frame("NQ", "1C00")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::SystemEvent { .. })).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_turn_on_writes_output_command() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    h.panel.set_output(1, true).unwrap();
    let output = h.panel.output(1).unwrap();
    assert!(output.is_on());

    expect_bytes(&mut peer, b"0Acn0100FD\r\n").await;

    output.turn_off().unwrap();
    assert!(output.is_off());
    expect_bytes(&mut peer, &encode_frame("0Acf0100")).await;
}

#[tokio::test(start_paused = true)]
async fn test_queued_while_down_is_sent_after_connect() {
    let mut h = Harness::start();
    h.panel.send_command("08as00").unwrap();

    let mut peer = h.next_peer().await;
    expect_bytes(&mut peer, b"\r\n").await;
    expect_bytes(&mut peer, &encode_frame("08as00")).await;
    expect_bytes(&mut peer, b"08zs004B\r\n").await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_resets_model_and_reconnects() {
    let mut h = Harness::start();
    let mut peer = h.connect().await;

    peer.write_all(&frame("ZS", "1")).await.unwrap();
    peer.write_all(&frame("AS", "A")).await.unwrap();
    peer.write_all(&frame("NQ", "1C00")).await.unwrap();
    h.wait_for(|e| matches!(e, PanelEvent::SystemEvent { .. })).await;
    assert!(h.panel.partition(1).unwrap().armed());

    let resets = Arc::new(AtomicUsize::new(0));
    let r = resets.clone();
    h.panel.zone(1).unwrap().register_callback(move || {
        r.fetch_add(1, Ordering::SeqCst);
    });

    h.panel.restart().await;

    assert_eq!(resets.load(Ordering::SeqCst), 1);
    assert!(h.panel.zone(1).unwrap().closed());
    assert!(h.panel.partition(1).is_none());
    assert!(!h.panel.is_initialized());

    // the old stream is gone
    let mut buf = Vec::new();
    peer.read_to_end(&mut buf).await.unwrap();

    let _peer = h.connect().await;
    assert_eq!(h.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_link() {
    let mut h = Harness::start();
    let _peer = h.connect().await;
    h.wait_for(|e| matches!(e, PanelEvent::Connected)).await;

    h.panel.shutdown().await;
    assert_eq!(h.panel.link_state(), LinkState::Disconnected);
    h.wait_for(|e| matches!(e, PanelEvent::Disconnected)).await;
}

/// Duplex stream whose writes start failing once `fail_writes` is set.
/// Reads keep flowing from the peer.
struct BrittleStream {
    inner: DuplexStream,
    fail_writes: Arc<AtomicBool>,
}

impl AsyncRead for BrittleStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for BrittleStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "line driver gone",
            )));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

struct BrittleConnector {
    peers: mpsc::UnboundedSender<(DuplexStream, Arc<AtomicBool>)>,
    connects: Arc<AtomicUsize>,
}

impl Connector for BrittleConnector {
    type Stream = BrittleStream;

    fn connect(
        &self,
        _device: &str,
        _baud: u32,
    ) -> impl Future<Output = io::Result<BrittleStream>> + Send {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let (inner, theirs) = tokio::io::duplex(4096);
        let fail_writes = Arc::new(AtomicBool::new(false));
        let handed_over = self.peers.send((theirs, fail_writes.clone()));
        async move {
            handed_over
                .map(|_| BrittleStream { inner, fail_writes })
                .map_err(|_| io::Error::other("test harness gone"))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_reconnects() {
    let (tx, mut peers) = mpsc::unbounded_channel();
    let connects = Arc::new(AtomicUsize::new(0));
    let config = PanelConfig::builder().device("/dev/ttyTEST").build();
    let restart_delay = config.restart_delay();
    let panel = Panel::with_connector(
        config,
        BrittleConnector {
            peers: tx,
            connects: connects.clone(),
        },
    )
    .unwrap();
    let mut events = panel.subscribe();

    let (mut peer, fail_writes) = peers.recv().await.unwrap();
    expect_bytes(&mut peer, b"\r\n").await;
    expect_bytes(&mut peer, b"08zs004B\r\n").await;

    peer.write_all(&frame("ZS", "1")).await.unwrap();
    loop {
        if let PanelEvent::Initialized = events.recv().await.unwrap() {
            break;
        }
    }
    assert!(panel.is_initialized());

    // The peer stays open, so only the failed write can end the link.
    fail_writes.store(true, Ordering::SeqCst);
    panel.request_output_status().unwrap();

    timeout(Duration::from_secs(60), async {
        loop {
            if let PanelEvent::Disconnected = events.recv().await.unwrap() {
                break;
            }
        }
    })
    .await
    .expect("link never dropped");
    let dropped_at = Instant::now();
    assert!(!panel.is_initialized());

    let (_peer, _) = timeout(Duration::from_secs(60), peers.recv())
        .await
        .expect("no reconnect")
        .unwrap();
    assert!(dropped_at.elapsed() <= restart_delay);
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert!(panel.zone(1).unwrap().opened());
    drop(peer);
}
