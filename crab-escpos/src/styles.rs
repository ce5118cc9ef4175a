//! Text styles and layout types consumed by the generator

use serde::{Deserialize, Serialize};

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl PosAlign {
    pub(crate) fn value(&self) -> u8 {
        match self {
            PosAlign::Left => 0,
            PosAlign::Center => 1,
            PosAlign::Right => 2,
        }
    }
}

/// Paper cut mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosCutMode {
    #[default]
    Full,
    Partial,
}

/// Printer font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PosFontType {
    #[default]
    FontA,
    FontB,
}

impl PosFontType {
    pub(crate) fn value(&self) -> u8 {
        match self {
            PosFontType::FontA => 0,
            PosFontType::FontB => 1,
        }
    }
}

/// Cash drawer connector pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PosDrawer {
    #[default]
    Pin2,
    Pin5,
}

/// Beeps sounded by a receipt-end alert
pub const DEFAULT_BEEP_COUNT: u8 = 3;

/// Buzzer duration per beep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PosBeepDuration {
    Beep50ms,
    Beep100ms,
    Beep150ms,
    Beep200ms,
    Beep250ms,
    Beep300ms,
    Beep350ms,
    Beep400ms,
    #[default]
    Beep450ms,
}

impl PosBeepDuration {
    pub(crate) fn value(&self) -> u8 {
        *self as u8 + 1
    }
}

/// Character magnification (1x to 8x)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PosTextSize {
    #[default]
    Size1,
    Size2,
    Size3,
    Size4,
    Size5,
    Size6,
    Size7,
    Size8,
}

impl PosTextSize {
    pub fn value(&self) -> u8 {
        *self as u8 + 1
    }

    /// `GS !` argument for a width/height pair
    pub(crate) fn decsize(height: PosTextSize, width: PosTextSize) -> u8 {
        ((width.value() - 1) << 4) | (height.value() - 1)
    }
}

/// Character code table selected with `ESC t n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeTable(pub u8);

impl CodeTable {
    pub const PC437: CodeTable = CodeTable(0);
    pub const KATAKANA: CodeTable = CodeTable(1);
    pub const PC850: CodeTable = CodeTable(2);
    pub const PC860: CodeTable = CodeTable(3);
    pub const PC863: CodeTable = CodeTable(4);
    pub const PC865: CodeTable = CodeTable(5);
    pub const WPC1252: CodeTable = CodeTable(16);
    pub const PC866: CodeTable = CodeTable(17);
    pub const PC852: CodeTable = CodeTable(18);
    pub const PC858: CodeTable = CodeTable(19);

    /// Look up a code table by its common name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let table = match name.to_ascii_uppercase().as_str() {
            "CP437" | "PC437" => Self::PC437,
            "KATAKANA" => Self::KATAKANA,
            "CP850" | "PC850" => Self::PC850,
            "CP860" | "PC860" => Self::PC860,
            "CP863" | "PC863" => Self::PC863,
            "CP865" | "PC865" => Self::PC865,
            "CP1252" | "WPC1252" => Self::WPC1252,
            "CP866" | "PC866" => Self::PC866,
            "CP852" | "PC852" => Self::PC852,
            "CP858" | "PC858" => Self::PC858,
            _ => return None,
        };
        Some(table)
    }
}

/// Text style set
///
/// `font_type` and `code_table` left as `None` fall back to the generator's
/// global font / code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PosStyles {
    pub bold: bool,
    pub reverse: bool,
    pub underline: bool,
    pub turn_upside_down: bool,
    pub align: PosAlign,
    pub height: PosTextSize,
    pub width: PosTextSize,
    pub font_type: Option<PosFontType>,
    pub code_table: Option<CodeTable>,
}

impl PosStyles {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn with_align(mut self, align: PosAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_size(mut self, height: PosTextSize, width: PosTextSize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    pub fn with_font(mut self, font: PosFontType) -> Self {
        self.font_type = Some(font);
        self
    }

    pub fn with_code_table(mut self, table: CodeTable) -> Self {
        self.code_table = Some(table);
        self
    }
}

/// One cell of a `row`
///
/// Widths are in twelfths of the line; a row's widths must sum to 12.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosColumn {
    pub text: String,
    /// Pre-encoded bytes, used instead of `text` when set
    pub text_encoded: Option<Vec<u8>>,
    pub width: u8,
    pub contains_chinese: bool,
    pub styles: PosStyles,
}

impl PosColumn {
    pub fn new(text: impl Into<String>, width: u8) -> Self {
        Self {
            text: text.into(),
            text_encoded: None,
            width,
            contains_chinese: false,
            styles: PosStyles::default(),
        }
    }

    pub fn encoded(bytes: Vec<u8>, width: u8) -> Self {
        Self {
            text: String::new(),
            text_encoded: Some(bytes),
            width,
            contains_chinese: false,
            styles: PosStyles::default(),
        }
    }

    pub fn with_styles(mut self, styles: PosStyles) -> Self {
        self.styles = styles;
        self
    }

    pub fn chinese(mut self) -> Self {
        self.contains_chinese = true;
        self
    }
}
