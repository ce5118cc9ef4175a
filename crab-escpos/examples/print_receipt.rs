//! Receipt Printing Example
//!
//! Connects to a network printer, prints a short receipt, then asks for the
//! printer status with a 2 second deadline.
//!
//! Run: cargo run --example print_receipt -- 192.168.1.100 [config.json]

use crab_escpos::{
    Barcode, BarcodeOptions, DEFAULT_BEEP_COUNT, HrOptions, NetworkPrinter, PosAlign,
    PosBeepDuration, PosColumn, PosCutMode, PosStyles, PosTextSize, PrinterConfig, QrOptions,
    TextOptions,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "192.168.1.100".to_string());
    let config = match args.next() {
        Some(path) => PrinterConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => PrinterConfig::default(),
    };

    let printer = NetworkPrinter::new(config);
    printer.connect_default(&host).await?;

    let title = PosStyles::bold()
        .with_align(PosAlign::Center)
        .with_size(PosTextSize::Size2, PosTextSize::Size2);
    printer.text("CRAB CAFE", &TextOptions::styled(title))?;
    printer.hr(&HrOptions::default())?;

    let price = PosStyles::default().with_align(PosAlign::Right);
    for (item, amount) in [("Flat white", "3.20"), ("Croissant", "2.10")] {
        printer.row(&[
            PosColumn::new(item, 8),
            PosColumn::new(amount, 4).with_styles(price),
        ])?;
    }
    printer.hr(&HrOptions {
        ch: '=',
        ..HrOptions::default()
    })?;
    printer.row(&[
        PosColumn::new("TOTAL", 8).with_styles(PosStyles::bold()),
        PosColumn::new("5.30", 4).with_styles(PosStyles::bold().with_align(PosAlign::Right)),
    ])?;

    printer.barcode(&Barcode::code128("A-1042")?, &BarcodeOptions::default())?;
    printer.qrcode("https://example.com/r/1042", &QrOptions::default())?;
    printer.cut(PosCutMode::Full)?;
    printer.beep(DEFAULT_BEEP_COUNT, PosBeepDuration::default())?;

    match tokio::time::timeout(Duration::from_secs(2), printer.transmission_of_status(1)).await {
        Ok(Ok(Some(status))) => println!("Printer status: {:#04x}", status),
        Ok(Ok(None)) => println!("Printer woke us without data"),
        Ok(Err(e)) => println!("Status query failed: {}", e),
        Err(_) => println!("Printer did not answer the status query"),
    }

    // Let the cutter finish before closing
    printer.disconnect(Some(Duration::from_millis(300))).await;
    Ok(())
}
