//! Duplex channel to a network printer
//!
//! The stream is split in two tasks:
//! - reader: appends every inbound chunk to the [`Inbox`]
//! - writer: drains an unbounded queue in FIFO order
//!
//! Queueing keeps command dispatch synchronous for callers while preserving
//! call order on the wire. Either task stopping marks the session dead.

use crate::error::{PrintError, PrintResult};
use crate::inbox::Inbox;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) struct Session {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    alive: Arc<AtomicBool>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl Session {
    /// Open a TCP connection and start the reader/writer tasks
    ///
    /// Any failure, including refusal or DNS errors, is reported as `Timeout`.
    pub(crate) async fn open(
        host: &str,
        port: u16,
        timeout: Duration,
        inbox: Arc<Inbox>,
        read_buffer_size: usize,
    ) -> PrintResult<Self> {
        let addr = format!("{}:{}", host, port);
        info!(addr = %addr, "Connecting to printer");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| PrintError::Timeout(format!("{}: {}", addr, e)))?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "set_nodelay failed");
        }

        Ok(Self::spawn(stream, inbox, read_buffer_size))
    }

    /// Start the reader and writer tasks over any duplex stream
    ///
    /// The reader is running before anything can be written, so early
    /// replies are never lost.
    pub(crate) fn spawn<S>(stream: S, inbox: Arc<Inbox>, read_buffer_size: usize) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut read_half, mut write_half) = tokio::io::split(stream);
        let alive = Arc::new(AtomicBool::new(true));

        let reader_alive = alive.clone();
        let reader = tokio::spawn(async move {
            let mut buf = vec![0u8; read_buffer_size.max(1)];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => {
                        debug!("Printer closed the connection");
                        break;
                    }
                    Ok(n) => inbox.push(&buf[..n]),
                    Err(e) => {
                        warn!(error = %e, "Printer read failed");
                        break;
                    }
                }
            }
            reader_alive.store(false, Ordering::SeqCst);
            // Nothing more will arrive for a pending status query
            inbox.close();
        });

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let writer_alive = alive.clone();
        let writer = tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                if let Err(e) = write_half.write_all(&bytes).await {
                    warn!(error = %e, len = bytes.len(), "Printer write failed");
                    break;
                }
                if let Err(e) = write_half.flush().await {
                    warn!(error = %e, "Printer flush failed");
                    break;
                }
            }
            writer_alive.store(false, Ordering::SeqCst);
            let _ = write_half.shutdown().await;
        });

        Self {
            tx,
            alive,
            writer,
            reader,
        }
    }

    /// Queue bytes for the writer task
    pub(crate) fn write(&self, bytes: Vec<u8>) -> PrintResult<()> {
        if !self.is_open() {
            return Err(PrintError::ChannelClosed("printer connection lost".to_string()));
        }
        self.tx
            .send(bytes)
            .map_err(|_| PrintError::ChannelClosed("printer connection lost".to_string()))
    }

    /// False once the printer hung up or a write failed
    pub(crate) fn is_open(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    /// Tear both tasks down now, dropping anything still queued
    ///
    /// Returns once neither task can touch the inbox again.
    pub(crate) async fn close(self) {
        let Self {
            tx,
            alive,
            writer,
            reader,
        } = self;
        alive.store(false, Ordering::SeqCst);
        drop(tx);

        writer.abort();
        reader.abort();
        // Cancelled tasks report a JoinError; only completion matters here
        let _ = writer.await;
        let _ = reader.await;
    }
}
