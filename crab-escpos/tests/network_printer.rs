// crab-escpos/tests/network_printer.rs
// Network printer tests against an in-process simulated device

use crab_escpos::{
    Generator, HrOptions, NetworkPrinter, PosCutMode, PrintError, PrinterConfig, TextOptions,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

const TIMEOUT: Duration = Duration::from_secs(2);

/// `ESC @` sent at the start of every session
const RESET: [u8; 2] = [0x1B, 0x40];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crab_escpos=debug")),
        )
        .with_test_writer()
        .try_init();
}

async fn device() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn read_n(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    stream.read_exact(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn test_commands_arrive_in_call_order() {
    init_tracing();
    let (listener, port) = device().await;
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        let _ = done_tx.send(received);
    });

    let printer = NetworkPrinter::default();
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();
    assert!(printer.is_connected());

    printer.text("Hello", &TextOptions::default()).unwrap();
    printer.hr(&HrOptions::default()).unwrap();
    printer.cut(PosCutMode::Full).unwrap();
    // Give the queue time to reach the device before the forced close
    printer.disconnect(Some(Duration::from_millis(200))).await;

    let mut g = Generator::default();
    let expected = [
        g.reset(),
        g.text("Hello", &TextOptions::default()),
        g.hr(&HrOptions::default()),
        g.cut(PosCutMode::Full),
    ]
    .concat();

    let received = done_rx.await.unwrap();
    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_ensure_connected_is_idempotent() {
    init_tracing();
    let (listener, port) = device().await;
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = accepts.clone();
    tokio::spawn(async move {
        let mut streams = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            streams.push(stream);
        }
    });

    let printer = NetworkPrinter::default();
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();
    printer.ensure_connected(TIMEOUT).await.unwrap();
    printer.ensure_connected(TIMEOUT).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(accepts.load(Ordering::SeqCst), 1);

    // Host and port survive a disconnect, so a reconnect needs no address
    printer.disconnect(None).await;
    assert!(!printer.is_connected());
    assert_eq!(printer.host().as_deref(), Some("127.0.0.1"));
    assert_eq!(printer.port(), Some(port));

    printer.ensure_connected(TIMEOUT).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connect_unreachable_reports_timeout() {
    init_tracing();
    let printer = NetworkPrinter::default();
    let timeout = Duration::from_millis(300);

    let started = Instant::now();
    // Non-routable address: either hangs until the timeout or fails fast
    let result = printer.connect("10.255.255.1", 9100, timeout).await;

    assert!(matches!(result, Err(PrintError::Timeout(_))));
    assert!(started.elapsed() < timeout + Duration::from_secs(1));
    assert!(!printer.is_connected());
}

#[tokio::test]
async fn test_concurrent_status_queries_share_one_reply() {
    init_tracing();
    let (listener, port) = device().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // Reset plus two DLE EOT 1 requests, then a single reply
        let received = read_n(&mut stream, 2 + 3 + 3).await;
        assert_eq!(&received[2..], &[0x10, 0x04, 0x01, 0x10, 0x04, 0x01]);
        stream.write_all(&[0x3F]).await.unwrap();
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
    });

    let printer = NetworkPrinter::default();
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    let (first, second) = tokio::time::timeout(TIMEOUT, async {
        tokio::join!(
            printer.transmission_of_status(1),
            printer.transmission_of_status(1)
        )
    })
    .await
    .unwrap();

    assert_eq!(first.unwrap(), Some(0x0F));
    assert_eq!(second.unwrap(), Some(0x0F));
    assert!(!printer.has_pending_status_query());
    assert_eq!(printer.buffered_input(), vec![0x3F]);

    printer.disconnect(None).await;
}

#[tokio::test]
async fn test_unanswered_status_query_stays_pending() {
    init_tracing();
    let (listener, port) = device().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // Swallow everything, never answer
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink).await;
    });

    let printer = NetworkPrinter::default();
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    let result =
        tokio::time::timeout(Duration::from_millis(500), printer.transmission_of_status(2)).await;
    assert!(result.is_err(), "caller deadline should fire");
    assert!(printer.has_pending_status_query());

    // Teardown releases the abandoned wait
    printer.disconnect(None).await;
    assert!(!printer.has_pending_status_query());
}

#[tokio::test]
async fn test_disconnect_releases_waiter_and_drops_stale_input() {
    init_tracing();
    let (listener, port) = device().await;
    let (first_done_tx, first_done_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        // First session: an unsolicited byte, then silence
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_n(&mut stream, 2).await, RESET);
        stream.write_all(&[0xA5]).await.unwrap();
        let _ = first_done_tx.send(());
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink).await;

        // Second session: answer the status query
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_n(&mut stream, 2 + 3).await, [0x1B, 0x40, 0x10, 0x04, 0x04]);
        stream.write_all(&[0x72]).await.unwrap();
        let _ = stream.read_to_end(&mut sink).await;
    });

    let printer = Arc::new(NetworkPrinter::new(PrinterConfig::default()));
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();
    first_done_rx.await.unwrap();

    // Wait for the unsolicited byte to land in the buffer
    tokio::time::timeout(TIMEOUT, async {
        while printer.buffered_input().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(printer.buffered_input(), vec![0xA5]);

    let query = tokio::spawn({
        let printer = printer.clone();
        async move { printer.transmission_of_status(1).await }
    });
    tokio::time::timeout(TIMEOUT, async {
        while !printer.has_pending_status_query() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    printer.disconnect(Some(Duration::from_millis(20))).await;
    let result = query.await.unwrap();
    assert!(matches!(result, Err(PrintError::ConnectionClosed)));
    assert!(printer.buffered_input().is_empty());

    // Commands fail while disconnected
    assert!(matches!(
        printer.cut(PosCutMode::Partial),
        Err(PrintError::ChannelClosed(_))
    ));

    // A fresh session starts from an empty buffer
    printer.ensure_connected(TIMEOUT).await.unwrap();
    let status = tokio::time::timeout(TIMEOUT, printer.transmission_of_status(4))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, Some(0x02));
    assert_eq!(printer.buffered_input(), vec![0x72]);

    printer.disconnect(None).await;
}

#[tokio::test]
async fn test_printer_hang_up_ends_session() {
    init_tracing();
    let (listener, port) = device().await;
    let (query_sent_tx, query_sent_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        // First session: hang up right after the reset
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_n(&mut stream, 2).await, RESET);
        drop(stream);

        // Second session: swallow a status query, then hang up without answering
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_n(&mut stream, 2 + 3).await, [0x1B, 0x40, 0x10, 0x04, 0x01]);
        query_sent_rx.await.unwrap();
        drop(stream);
    });

    let printer = NetworkPrinter::default();
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    tokio::time::timeout(TIMEOUT, async {
        while printer.is_connected() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // Nothing can answer on a dead session, so the query fails at once
    let result = tokio::time::timeout(TIMEOUT, printer.transmission_of_status(1))
        .await
        .unwrap();
    assert!(matches!(result, Err(PrintError::ChannelClosed(_))));
    assert!(!printer.has_pending_status_query());
    assert!(matches!(printer.feed(1), Err(PrintError::ChannelClosed(_))));

    // The dead session is replaced instead of kept
    printer.ensure_connected(TIMEOUT).await.unwrap();
    assert!(printer.is_connected());

    let (result, _) = tokio::time::timeout(TIMEOUT, async {
        tokio::join!(printer.transmission_of_status(1), async {
            while !printer.has_pending_status_query() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let _ = query_sent_tx.send(());
        })
    })
    .await
    .unwrap();
    assert!(matches!(result, Err(PrintError::ConnectionClosed)));
    assert!(!printer.has_pending_status_query());

    printer.disconnect(None).await;
}

#[tokio::test]
async fn test_disconnect_does_not_wait_for_stalled_printer() {
    init_tracing();
    let (listener, port) = device().await;
    let (release_tx, release_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        // Accept but never read, so socket buffers fill up
        let (stream, _) = listener.accept().await.unwrap();
        let _ = release_rx.await;
        drop(stream);
    });

    let printer = NetworkPrinter::default();
    printer.connect("127.0.0.1", port, TIMEOUT).await.unwrap();
    for _ in 0..64 {
        printer.raw_bytes(&[0u8; 64 * 1024], false).unwrap();
    }

    let started = Instant::now();
    printer.disconnect(None).await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!printer.is_connected());
    let _ = release_tx.send(());
}
