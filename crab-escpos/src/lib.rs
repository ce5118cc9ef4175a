//! # crab-escpos
//!
//! ESC/POS thermal printer client over the network.
//!
//! ## Scope
//!
//! - Connection lifecycle to a raw TCP printer port (9100)
//! - One method per printer command, sent in call order
//! - Real-time status queries (`DLE EOT n`) answered by a single byte
//! - ESC/POS command generation (text styles, rows, images, barcodes, QR)
//!
//! ## Example
//!
//! ```ignore
//! use crab_escpos::{HrOptions, NetworkPrinter, PosCutMode, PrinterConfig, TextOptions};
//! use std::time::Duration;
//!
//! let printer = NetworkPrinter::new(PrinterConfig::default());
//! printer.connect("192.168.1.100", 9100, Duration::from_secs(5)).await?;
//!
//! printer.text("Hello", &TextOptions::default())?;
//! printer.hr(&HrOptions::default())?;
//! printer.cut(PosCutMode::Full)?;
//!
//! // The printer may never answer: bound the wait
//! let status =
//!     tokio::time::timeout(Duration::from_secs(2), printer.transmission_of_status(1)).await;
//!
//! printer.disconnect(Some(Duration::from_millis(100))).await;
//! ```

mod barcode;
mod config;
mod encoding;
mod error;
mod escpos;
#[cfg(feature = "image")]
mod bitmap;
mod inbox;
mod printer;
mod session;
mod styles;

// Re-exports
pub use barcode::{
    Barcode, BarcodeFont, BarcodeOptions, BarcodeText, BarcodeType, QrCorrection, QrOptions,
    QrSize,
};
pub use config::{DEFAULT_PORT, PaperSize, PrinterConfig};
pub use encoding::{encode_text, encode_with_label, encoded_width};
pub use error::{PrintError, PrintResult};
pub use escpos::{Generator, HrOptions, TextOptions};
pub use printer::NetworkPrinter;
pub use styles::{
    CodeTable, DEFAULT_BEEP_COUNT, PosAlign, PosBeepDuration, PosColumn, PosCutMode, PosDrawer,
    PosFontType, PosStyles, PosTextSize,
};

#[cfg(feature = "image")]
pub use bitmap::{ImageRasterOptions, PosImageFn};
#[cfg(feature = "image")]
pub use image::DynamicImage;
