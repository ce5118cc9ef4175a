//! Barcode and QR code parameters
//!
//! 1D barcodes are printed with `GS k m n d1..dn` (function B form), so the
//! symbology code is `65 + type` except Code128 which is 73.

use crate::error::{PrintError, PrintResult};
use crate::styles::PosAlign;
use serde::{Deserialize, Serialize};

/// 1D barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeType {
    UpcA,
    UpcE,
    Ean13,
    Ean8,
    Code39,
    Itf,
    Codabar,
    Code128,
}

impl BarcodeType {
    /// `m` argument of `GS k`
    pub(crate) fn value(&self) -> u8 {
        match self {
            BarcodeType::UpcA => 65,
            BarcodeType::UpcE => 66,
            BarcodeType::Ean13 => 67,
            BarcodeType::Ean8 => 68,
            BarcodeType::Code39 => 69,
            BarcodeType::Itf => 70,
            BarcodeType::Codabar => 71,
            BarcodeType::Code128 => 73,
        }
    }
}

/// Position of the human readable text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarcodeText {
    None,
    Above,
    #[default]
    Below,
    Both,
}

impl BarcodeText {
    pub(crate) fn value(&self) -> u8 {
        match self {
            BarcodeText::None => 0,
            BarcodeText::Above => 1,
            BarcodeText::Below => 2,
            BarcodeText::Both => 3,
        }
    }
}

/// Font of the human readable text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarcodeFont {
    #[default]
    FontA,
    FontB,
}

/// A validated 1D barcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barcode {
    kind: BarcodeType,
    data: Vec<u8>,
}

fn all_digits(data: &str) -> bool {
    data.bytes().all(|b| b.is_ascii_digit())
}

fn invalid(kind: BarcodeType, msg: &str) -> PrintError {
    PrintError::InvalidArgument(format!("{:?} barcode: {}", kind, msg))
}

impl Barcode {
    /// Validate `data` against the symbology's length and charset rules
    pub fn new(kind: BarcodeType, data: &str) -> PrintResult<Self> {
        let len = data.len();
        let mut bytes = data.as_bytes().to_vec();
        match kind {
            BarcodeType::UpcA => {
                if !(11..=12).contains(&len) || !all_digits(data) {
                    return Err(invalid(kind, "expects 11 or 12 digits"));
                }
            }
            BarcodeType::UpcE => {
                if !(6..=8).contains(&len) || !all_digits(data) {
                    return Err(invalid(kind, "expects 6 to 8 digits"));
                }
                if len >= 7 && !data.starts_with('0') {
                    return Err(invalid(kind, "7 or 8 digit data must start with 0"));
                }
            }
            BarcodeType::Ean13 => {
                if !(12..=13).contains(&len) || !all_digits(data) {
                    return Err(invalid(kind, "expects 12 or 13 digits"));
                }
            }
            BarcodeType::Ean8 => {
                if !(7..=8).contains(&len) || !all_digits(data) {
                    return Err(invalid(kind, "expects 7 or 8 digits"));
                }
            }
            BarcodeType::Code39 => {
                let ok = data.bytes().all(|b| {
                    b.is_ascii_digit() || b.is_ascii_uppercase() || b" $%*+-./".contains(&b)
                });
                if len == 0 || !ok {
                    return Err(invalid(kind, "expects 0-9 A-Z and $%*+-./ space"));
                }
            }
            BarcodeType::Itf => {
                if len < 2 || len % 2 != 0 || !all_digits(data) {
                    return Err(invalid(kind, "expects an even number of digits"));
                }
            }
            BarcodeType::Codabar => {
                let is_stop = |b: u8| b"ABCDabcd".contains(&b);
                let ok = data
                    .bytes()
                    .all(|b| b.is_ascii_digit() || is_stop(b) || b"$+-./:".contains(&b));
                if len < 2 || !ok || !is_stop(bytes[0]) || !is_stop(bytes[len - 1]) {
                    return Err(invalid(kind, "expects start/stop chars A-D around 0-9 $+-./:"));
                }
            }
            BarcodeType::Code128 => {
                if len < 2 || !data.is_ascii() {
                    return Err(invalid(kind, "expects at least 2 ASCII bytes"));
                }
                // Code set B unless the caller selected one
                if !data.starts_with('{') {
                    bytes = [b"{B".as_slice(), data.as_bytes()].concat();
                }
            }
        }

        if bytes.len() > 255 {
            return Err(invalid(kind, "data longer than 255 bytes"));
        }
        Ok(Self { kind, data: bytes })
    }

    pub fn upc_a(data: &str) -> PrintResult<Self> {
        Self::new(BarcodeType::UpcA, data)
    }

    pub fn ean13(data: &str) -> PrintResult<Self> {
        Self::new(BarcodeType::Ean13, data)
    }

    pub fn code39(data: &str) -> PrintResult<Self> {
        Self::new(BarcodeType::Code39, data)
    }

    pub fn code128(data: &str) -> PrintResult<Self> {
        Self::new(BarcodeType::Code128, data)
    }

    pub fn kind(&self) -> BarcodeType {
        self.kind
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Barcode print options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    /// Module width 2..=6, printer default when `None`
    pub width: Option<u8>,
    /// Height in dots 1..=255, printer default when `None`
    pub height: Option<u8>,
    pub font: Option<BarcodeFont>,
    pub text_pos: BarcodeText,
    pub align: PosAlign,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            font: None,
            text_pos: BarcodeText::Below,
            align: PosAlign::Center,
        }
    }
}

/// QR module size in dots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrSize {
    Size1,
    Size2,
    Size3,
    #[default]
    Size4,
    Size5,
    Size6,
    Size7,
    Size8,
}

impl QrSize {
    pub(crate) fn value(&self) -> u8 {
        *self as u8 + 1
    }
}

/// QR error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrCorrection {
    /// Recovers 7% of data
    #[default]
    L,
    /// 15%
    M,
    /// 25%
    Q,
    /// 30%
    H,
}

impl QrCorrection {
    pub(crate) fn value(&self) -> u8 {
        match self {
            QrCorrection::L => 0x30,
            QrCorrection::M => 0x31,
            QrCorrection::Q => 0x32,
            QrCorrection::H => 0x33,
        }
    }
}

/// QR code print options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    pub align: PosAlign,
    pub size: QrSize,
    pub correction: QrCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            align: PosAlign::Center,
            size: QrSize::Size4,
            correction: QrCorrection::L,
        }
    }
}
