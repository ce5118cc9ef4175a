//! Printer configuration

use crate::error::PrintResult;
use crate::styles::PosFontType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default raw printing port of network thermal printers
pub const DEFAULT_PORT: u16 = 9100;

/// Paper roll width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    /// 58mm paper
    Mm58,
    /// 80mm paper
    #[default]
    Mm80,
}

impl PaperSize {
    /// Characters per line for the given font
    ///
    /// - 58mm paper: 32 (font A) / 42 (font B)
    /// - 80mm paper: 48 (font A) / 64 (font B)
    pub fn max_chars(&self, font: PosFontType) -> usize {
        match (self, font) {
            (PaperSize::Mm58, PosFontType::FontA) => 32,
            (PaperSize::Mm58, PosFontType::FontB) => 42,
            (PaperSize::Mm80, PosFontType::FontA) => 48,
            (PaperSize::Mm80, PosFontType::FontB) => 64,
        }
    }
}

/// Network printer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Paper roll width
    pub paper_size: PaperSize,

    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Extra dots between rows printed by `row`
    pub space_between_rows: u8,

    /// Size of a single socket read
    pub read_buffer_size: usize,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::Mm80,
            connect_timeout_ms: 5_000,
            space_between_rows: 5,
            read_buffer_size: 1024,
        }
    }
}

impl PrinterConfig {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> PrintResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the default connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the spacing between rows
    pub fn with_space_between_rows(mut self, dots: u8) -> Self {
        self.space_between_rows = dots;
        self
    }

    /// Set the read buffer size (clamped to at least 1 byte)
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PrinterConfig::default();
        assert_eq!(config.paper_size, PaperSize::Mm80);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.space_between_rows, 5);
    }

    #[test]
    fn test_config_builder() {
        let config = PrinterConfig::new(PaperSize::Mm58)
            .with_connect_timeout(Duration::from_millis(1500))
            .with_read_buffer_size(0);

        assert_eq!(config.paper_size, PaperSize::Mm58);
        assert_eq!(config.connect_timeout_ms, 1500);
        assert_eq!(config.read_buffer_size, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config = PrinterConfig::from_json(r#"{"paper_size":"mm58","connect_timeout_ms":200}"#)
            .unwrap();
        assert_eq!(config.paper_size, PaperSize::Mm58);
        assert_eq!(config.connect_timeout(), Duration::from_millis(200));
        assert_eq!(config.read_buffer_size, 1024);

        assert!(PrinterConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_max_chars() {
        assert_eq!(PaperSize::Mm58.max_chars(PosFontType::FontA), 32);
        assert_eq!(PaperSize::Mm80.max_chars(PosFontType::FontB), 64);
    }
}
