//! Network printer connection
//!
//! [`NetworkPrinter`] owns one duplex TCP connection (usually port 9100):
//! - connect / ensure-connected / disconnect lifecycle
//! - one dispatch method per printer operation, written in call order
//! - real-time status queries answered by a single status byte
//!
//! Each instance owns its channel, input buffer and pending wait, so any
//! number of printers can be driven from one process.

use crate::barcode::{Barcode, BarcodeOptions, QrOptions};
use crate::config::{DEFAULT_PORT, PrinterConfig};
use crate::error::{PrintError, PrintResult};
use crate::escpos::{Generator, HrOptions, TextOptions};
use crate::inbox::{Inbox, Wake};
use crate::session::Session;
use crate::styles::{
    CodeTable, PosBeepDuration, PosColumn, PosCutMode, PosDrawer, PosFontType, PosStyles,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "image")]
use crate::bitmap::ImageRasterOptions;
#[cfg(feature = "image")]
use crate::styles::PosAlign;

/// Status bits are the low nibble; the high nibble is reserved
const STATUS_MASK: u8 = 0x0F;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
}

/// ESC/POS printer reached over the network
pub struct NetworkPrinter {
    config: PrinterConfig,
    target: Mutex<Option<Target>>,
    session: Mutex<Option<Session>>,
    /// Serializes connect and disconnect
    lifecycle: tokio::sync::Mutex<()>,
    inbox: Arc<Inbox>,
    generator: Mutex<Generator>,
}

impl NetworkPrinter {
    pub fn new(config: PrinterConfig) -> Self {
        let generator = Generator::from_config(&config);
        Self {
            config,
            target: Mutex::new(None),
            session: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
            inbox: Arc::new(Inbox::new()),
            generator: Mutex::new(generator),
        }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Host recorded by the last `connect`, kept across disconnects
    pub fn host(&self) -> Option<String> {
        lock(&self.target).as_ref().map(|t| t.host.clone())
    }

    pub fn port(&self) -> Option<u16> {
        lock(&self.target).as_ref().map(|t| t.port)
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.session).as_ref().is_some_and(Session::is_open)
    }

    /// True while a status query is waiting for a reply
    ///
    /// A query abandoned by its caller (e.g. after an external deadline)
    /// keeps the slot occupied until a byte arrives or the connection is
    /// torn down.
    pub fn has_pending_status_query(&self) -> bool {
        self.inbox.is_waiting()
    }

    /// Bytes received from the printer since the last disconnect
    pub fn buffered_input(&self) -> Vec<u8> {
        self.inbox.snapshot()
    }

    // === Connection Lifecycle ===

    /// Record the printer address and connect
    ///
    /// Every failure is reported as [`PrintError::Timeout`]. If a connection
    /// is already open it is kept as is, even for a different address.
    #[instrument(skip(self))]
    pub async fn connect(&self, host: &str, port: u16, timeout: Duration) -> PrintResult<()> {
        *lock(&self.target) = Some(Target {
            host: host.to_string(),
            port,
        });
        self.ensure_connected(timeout).await
    }

    /// Connect on port 9100 with the configured timeout
    pub async fn connect_default(&self, host: &str) -> PrintResult<()> {
        self.connect(host, DEFAULT_PORT, self.config.connect_timeout()).await
    }

    /// Open the connection unless it is already open
    ///
    /// On a fresh connection the printer is initialized (`ESC @`) before
    /// anything else is sent.
    #[instrument(skip(self))]
    pub async fn ensure_connected(&self, timeout: Duration) -> PrintResult<()> {
        let _guard = self.lifecycle.lock().await;

        if self.is_connected() {
            return Ok(());
        }

        let target = lock(&self.target).clone().ok_or(PrintError::NotConfigured)?;

        // A session the printer hung up on is replaced
        let stale = lock(&self.session).take();
        if let Some(stale) = stale {
            warn!("Previous printer connection was lost, reconnecting");
            stale.close().await;
            // A query sent on the old connection will never be answered
            self.inbox.close();
        }
        self.inbox.reopen();

        let session = Session::open(
            &target.host,
            target.port,
            timeout,
            self.inbox.clone(),
            self.config.read_buffer_size,
        )
        .await?;

        let mut generator = lock(&self.generator);
        session.write(generator.reset())?;
        *lock(&self.session) = Some(session);
        drop(generator);

        info!(host = %target.host, port = target.port, "Printer connected");
        Ok(())
    }

    /// Close the connection after an optional grace period
    ///
    /// The socket is closed as soon as the delay elapses; commands still
    /// queued by then are dropped, so pass a delay long enough for the last
    /// job to reach the printer. Buffered input is dropped and a pending
    /// status query fails with [`PrintError::ConnectionClosed`]. Host and
    /// port are kept.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let _guard = self.lifecycle.lock().await;
        let session = lock(&self.session).take();
        if let Some(session) = session {
            session.close().await;
            info!("Printer disconnected");
        }
        self.inbox.clear();
    }

    // === Status ===

    /// Request real-time status `n` (1..=4) and wait for the reply byte
    ///
    /// Returns the low 4 bits of the last received byte, or `None` if the
    /// buffer is still empty when woken. There is no built-in timeout: wrap
    /// the call in `tokio::time::timeout` when the printer may not answer.
    /// If the printer hangs up first the query fails with
    /// [`PrintError::ConnectionClosed`].
    #[instrument(skip(self))]
    pub async fn transmission_of_status(&self, n: u8) -> PrintResult<Option<u8>> {
        let wait = {
            let generator = lock(&self.generator);
            let command = generator.transmission_of_status(n)?;
            let session = lock(&self.session);
            let session = Self::open_session(&session)?;

            // Registered before the request is queued so the reply cannot be missed
            let wait = self.inbox.wait();
            if let Err(e) = session.write(command) {
                self.inbox.cancel();
                return Err(e);
            }
            wait
        };

        match wait.await {
            Wake::Data => {
                let status = self.inbox.last_byte().map(|b| b & STATUS_MASK);
                debug!(?status, "Status reply");
                Ok(status)
            }
            Wake::Closed => Err(PrintError::ConnectionClosed),
        }
    }

    // === Commands ===

    fn open_session(session: &Option<Session>) -> PrintResult<&Session> {
        session
            .as_ref()
            .filter(|s| s.is_open())
            .ok_or_else(|| PrintError::ChannelClosed("printer not connected".to_string()))
    }

    /// Encode with the generator and queue the bytes on the open channel
    fn dispatch<F>(&self, encode: F) -> PrintResult<()>
    where
        F: FnOnce(&mut Generator) -> PrintResult<Vec<u8>>,
    {
        let mut generator = lock(&self.generator);
        let session = lock(&self.session);
        let session = Self::open_session(&session)?;
        let bytes = encode(&mut generator)?;
        session.write(bytes)
    }

    pub fn text(&self, text: &str, options: &TextOptions) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.text(text, options)))
    }

    pub fn set_global_code_table(&self, table: CodeTable) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.set_global_code_table(table)))
    }

    pub fn set_global_font(
        &self,
        font: PosFontType,
        max_chars_per_line: Option<usize>,
    ) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.set_global_font(font, max_chars_per_line)))
    }

    pub fn set_styles(&self, styles: &PosStyles, is_kanji: bool) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.set_styles(styles, is_kanji)))
    }

    pub fn raw_bytes(&self, cmd: &[u8], is_kanji: bool) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.raw_bytes(cmd, is_kanji)))
    }

    pub fn empty_lines(&self, n: usize) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.empty_lines(n)))
    }

    pub fn feed(&self, n: u8) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.feed(n)))
    }

    pub fn cut(&self, mode: PosCutMode) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.cut(mode)))
    }

    pub fn print_code_table(&self, table: CodeTable) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.print_code_table(table)))
    }

    /// Sound the buzzer `n` times; see [`DEFAULT_BEEP_COUNT`](crate::DEFAULT_BEEP_COUNT)
    pub fn beep(&self, n: u8, duration: PosBeepDuration) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.beep(n, duration)))
    }

    pub fn reverse_feed(&self, n: u8) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.reverse_feed(n)))
    }

    pub fn row(&self, columns: &[PosColumn]) -> PrintResult<()> {
        self.dispatch(|g| g.row(columns))
    }

    #[cfg(feature = "image")]
    pub fn image(&self, img: &image::DynamicImage, align: PosAlign) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.image(img, align)))
    }

    #[cfg(feature = "image")]
    pub fn image_raster(
        &self,
        img: &image::DynamicImage,
        options: &ImageRasterOptions,
    ) -> PrintResult<()> {
        self.dispatch(|g| g.image_raster(img, options))
    }

    pub fn barcode(&self, barcode: &Barcode, options: &BarcodeOptions) -> PrintResult<()> {
        self.dispatch(|g| g.barcode(barcode, options))
    }

    pub fn qrcode(&self, text: &str, options: &QrOptions) -> PrintResult<()> {
        self.dispatch(|g| g.qrcode(text, options))
    }

    pub fn drawer(&self, pin: PosDrawer) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.drawer(pin)))
    }

    pub fn hr(&self, options: &HrOptions) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.hr(options)))
    }

    pub fn text_encoded(&self, text: &[u8], options: &TextOptions) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.text_encoded(text, options)))
    }

    pub fn reset(&self) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.reset()))
    }

    pub fn end_job(&self) -> PrintResult<()> {
        self.dispatch(|g| Ok(g.end_job()))
    }
}

impl Default for NetworkPrinter {
    fn default() -> Self {
        Self::new(PrinterConfig::default())
    }
}
