//! ESC/POS command generator
//!
//! Maps each printer operation to its ESC/POS byte sequence. The generator
//! tracks the style state it last emitted so that `set_styles` only sends
//! the commands that actually change something.

use crate::barcode::{Barcode, BarcodeFont, BarcodeOptions, QrOptions};
use crate::config::{PaperSize, PrinterConfig};
use crate::encoding::{encode_text, pad, wrap_bytes, wrap_text};
use crate::error::{PrintError, PrintResult};
use crate::styles::{
    CodeTable, PosAlign, PosBeepDuration, PosColumn, PosCutMode, PosDrawer, PosFontType,
    PosStyles, PosTextSize,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "image")]
use crate::bitmap::{ImageRasterOptions, bit_image, raster};

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const FS: u8 = 0x1C;
const DLE: u8 = 0x10;
const EOT: u8 = 0x04;
const LF: u8 = 0x0A;

/// Options for `text` / `text_encoded`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub styles: PosStyles,
    /// Empty lines printed after the text
    pub lines_after: u8,
    /// Encode as GBK and switch the printer to kanji mode
    pub contains_chinese: bool,
    /// Wrap text longer than this many bytes onto further lines
    pub max_chars_per_line: Option<usize>,
}

impl TextOptions {
    pub fn styled(styles: PosStyles) -> Self {
        Self {
            styles,
            ..Self::default()
        }
    }
}

/// Options for `hr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrOptions {
    pub ch: char,
    /// Line length, defaults to the characters per line
    pub len: Option<usize>,
    pub lines_after: u8,
}

impl Default for HrOptions {
    fn default() -> Self {
        Self {
            ch: '-',
            len: None,
            lines_after: 0,
        }
    }
}

/// ESC/POS command generator
///
/// Produces one byte sequence per printer operation.
#[derive(Debug, Clone)]
pub struct Generator {
    paper_size: PaperSize,
    space_between_rows: u8,
    styles: PosStyles,
    code_table: Option<CodeTable>,
    font: Option<PosFontType>,
    max_chars_per_line: Option<usize>,
}

impl Generator {
    pub fn new(paper_size: PaperSize) -> Self {
        Self::from_config(&PrinterConfig::new(paper_size))
    }

    pub fn from_config(config: &PrinterConfig) -> Self {
        Self {
            paper_size: config.paper_size,
            space_between_rows: config.space_between_rows,
            styles: PosStyles::default(),
            code_table: None,
            font: None,
            max_chars_per_line: None,
        }
    }

    /// Characters per line for the current font
    pub fn max_chars_per_line(&self) -> usize {
        self.max_chars_per_line.unwrap_or_else(|| {
            let font = self.styles.font_type.or(self.font).unwrap_or_default();
            self.paper_size.max_chars(font)
        })
    }

    // === Printer State ===

    /// Initialize printer (ESC @) and forget emitted styles
    pub fn reset(&mut self) -> Vec<u8> {
        let mut bytes = vec![ESC, b'@'];
        self.styles = PosStyles::default();
        if let Some(table) = self.code_table {
            bytes.extend(self.set_global_code_table(table));
        }
        if let Some(font) = self.font {
            bytes.extend(self.set_global_font(font, self.max_chars_per_line));
        }
        bytes
    }

    /// Select the code table used when styles don't name one
    pub fn set_global_code_table(&mut self, table: CodeTable) -> Vec<u8> {
        self.code_table = Some(table);
        self.styles.code_table = Some(table);
        vec![ESC, b't', table.0]
    }

    /// Select the font used when styles don't name one
    pub fn set_global_font(
        &mut self,
        font: PosFontType,
        max_chars_per_line: Option<usize>,
    ) -> Vec<u8> {
        self.font = Some(font);
        self.max_chars_per_line = max_chars_per_line;
        self.styles.font_type = Some(font);
        vec![ESC, b'M', font.value()]
    }

    /// Emit the commands needed to move from the current styles to `styles`
    pub fn set_styles(&mut self, styles: &PosStyles, is_kanji: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        let current = self.styles;

        if styles.align != current.align {
            bytes.extend_from_slice(&[ESC, b'a', styles.align.value()]);
        }
        if styles.bold != current.bold {
            bytes.extend_from_slice(&[ESC, b'E', styles.bold as u8]);
        }
        if styles.turn_upside_down != current.turn_upside_down {
            bytes.extend_from_slice(&[ESC, b'{', styles.turn_upside_down as u8]);
        }
        if styles.reverse != current.reverse {
            bytes.extend_from_slice(&[GS, b'B', styles.reverse as u8]);
        }
        if styles.underline != current.underline {
            bytes.extend_from_slice(&[ESC, b'-', styles.underline as u8]);
        }

        let font = styles.font_type.or(self.font);
        if let Some(font) = font
            && Some(font) != current.font_type
        {
            bytes.extend_from_slice(&[ESC, b'M', font.value()]);
        }

        if styles.height != current.height || styles.width != current.width {
            bytes.extend_from_slice(&[GS, b'!', PosTextSize::decsize(styles.height, styles.width)]);
        }

        if is_kanji {
            bytes.extend_from_slice(&[FS, b'&']);
        } else {
            bytes.extend_from_slice(&[FS, b'.']);
        }

        let table = styles.code_table.or(self.code_table);
        if let Some(table) = table {
            bytes.extend_from_slice(&[ESC, b't', table.0]);
        }

        self.styles = PosStyles {
            font_type: font,
            code_table: table,
            ..*styles
        };
        bytes
    }

    // === Text Output ===

    /// Print styled text followed by `lines_after + 1` line feeds
    pub fn text(&mut self, text: &str, options: &TextOptions) -> Vec<u8> {
        let lines = match options.max_chars_per_line {
            Some(width) => wrap_text(text, width.max(1), options.contains_chinese),
            None => vec![encode_text(text, options.contains_chinese)],
        };
        self.text_lines(lines, options)
    }

    /// Print pre-encoded text followed by `lines_after + 1` line feeds
    pub fn text_encoded(&mut self, text: &[u8], options: &TextOptions) -> Vec<u8> {
        let lines = match options.max_chars_per_line {
            Some(width) => wrap_bytes(text, width.max(1)),
            None => vec![text.to_vec()],
        };
        self.text_lines(lines, options)
    }

    fn text_lines(&mut self, lines: Vec<Vec<u8>>, options: &TextOptions) -> Vec<u8> {
        let mut bytes = self.set_styles(&options.styles, options.contains_chinese);
        let count = lines.len();
        for (idx, line) in lines.into_iter().enumerate() {
            bytes.extend(line);
            if idx + 1 < count {
                bytes.push(LF);
            }
        }
        bytes.extend(self.empty_lines(options.lines_after as usize + 1));
        bytes
    }

    /// Send raw bytes, with kanji mode off unless `is_kanji`
    pub fn raw_bytes(&mut self, cmd: &[u8], is_kanji: bool) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(cmd.len() + 2);
        if !is_kanji {
            bytes.extend_from_slice(&[FS, b'.']);
        }
        bytes.extend_from_slice(cmd);
        bytes
    }

    /// Print a horizontal rule
    pub fn hr(&mut self, options: &HrOptions) -> Vec<u8> {
        let len = options.len.unwrap_or_else(|| self.max_chars_per_line());
        let line: String = std::iter::repeat_n(options.ch, len).collect();
        self.text(
            &line,
            &TextOptions {
                lines_after: options.lines_after,
                ..TextOptions::default()
            },
        )
    }

    /// Print a row of columns whose widths sum to 12
    ///
    /// Text that doesn't fit its column wraps onto further lines.
    pub fn row(&mut self, columns: &[PosColumn]) -> PrintResult<Vec<u8>> {
        let total: u32 = columns.iter().map(|c| c.width as u32).sum();
        if total != 12 || columns.iter().any(|c| c.width == 0) {
            return Err(PrintError::InvalidArgument(format!(
                "Column widths must be 1..=12 and sum to 12, got {}",
                total
            )));
        }

        let max_chars = self.max_chars_per_line();
        let mut acc = 0usize;
        let mut cells = Vec::with_capacity(columns.len());
        for col in columns {
            let start = max_chars * acc / 12;
            acc += col.width as usize;
            let width = max_chars * acc / 12 - start;

            let chunks = match &col.text_encoded {
                Some(encoded) => wrap_bytes(encoded, width),
                None => wrap_text(&col.text, width, col.contains_chinese),
            };
            cells.push((col, width, chunks));
        }

        let lines = cells.iter().map(|(_, _, c)| c.len()).max().unwrap_or(1);
        let mut bytes = Vec::new();
        for line in 0..lines {
            for (col, width, chunks) in &cells {
                let chunk = chunks.get(line).map(Vec::as_slice).unwrap_or_default();
                // Alignment is done with padding inside the column
                let styles = col.styles.with_align(PosAlign::Left);
                bytes.extend(self.set_styles(&styles, col.contains_chinese));
                bytes.extend(pad(chunk, *width, col.styles.align));
            }
            bytes.push(LF);
            if self.space_between_rows > 0 {
                bytes.extend_from_slice(&[ESC, b'J', self.space_between_rows]);
            }
        }
        Ok(bytes)
    }

    /// Print every character of a code table
    pub fn print_code_table(&mut self, table: CodeTable) -> Vec<u8> {
        let mut bytes = vec![FS, b'.', ESC, b't', table.0];
        bytes.extend(0x80..=0xFFu8);
        bytes.push(LF);
        let restore = self.code_table.unwrap_or(CodeTable::PC437);
        bytes.extend_from_slice(&[ESC, b't', restore.0]);
        bytes
    }

    // === Paper Control ===

    pub fn empty_lines(&self, n: usize) -> Vec<u8> {
        vec![LF; n]
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed(&self, n: u8) -> Vec<u8> {
        vec![ESC, b'd', n]
    }

    /// Print and reverse feed n lines (ESC e n)
    pub fn reverse_feed(&self, n: u8) -> Vec<u8> {
        vec![ESC, b'e', n]
    }

    /// Feed past the cutter, then cut
    pub fn cut(&self, mode: PosCutMode) -> Vec<u8> {
        let mut bytes = self.empty_lines(5);
        match mode {
            // GS V 0 - Full cut
            PosCutMode::Full => bytes.extend_from_slice(&[GS, b'V', 0x00]),
            // GS V 1 - Partial cut
            PosCutMode::Partial => bytes.extend_from_slice(&[GS, b'V', 0x01]),
        }
        bytes
    }

    /// Finish a job: feed 3 lines and full cut (GS V 66 n), then initialize
    pub fn end_job(&mut self) -> Vec<u8> {
        let mut bytes = vec![GS, b'V', 0x42, 3];
        bytes.extend(self.reset());
        bytes
    }

    // === Peripherals ===

    /// Sound the buzzer n times (ESC B sends at most 9 per command)
    pub fn beep(&self, n: u8, duration: PosBeepDuration) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut remaining = n;
        while remaining > 0 {
            let count = remaining.min(9);
            bytes.extend_from_slice(&[ESC, b'B', count, duration.value()]);
            remaining -= count;
        }
        bytes
    }

    /// Pulse the cash drawer pin (ESC p m t1 t2)
    pub fn drawer(&self, pin: PosDrawer) -> Vec<u8> {
        let m = match pin {
            PosDrawer::Pin2 => 0x00,
            PosDrawer::Pin5 => 0x01,
        };
        vec![ESC, b'p', m, 25, 250]
    }

    /// Real-time status request (DLE EOT n)
    ///
    /// n: 1 = printer, 2 = offline cause, 3 = error cause, 4 = paper sensor
    pub fn transmission_of_status(&self, n: u8) -> PrintResult<Vec<u8>> {
        if !(1..=4).contains(&n) {
            return Err(PrintError::InvalidArgument(format!(
                "Status function must be 1..=4, got {}",
                n
            )));
        }
        Ok(vec![DLE, EOT, n])
    }

    // === Images ===

    /// Print an image as 24-dot bit image bands
    #[cfg(feature = "image")]
    pub fn image(&mut self, img: &image::DynamicImage, align: PosAlign) -> Vec<u8> {
        let mut bytes = self.set_styles(&PosStyles::default().with_align(align), false);
        bytes.extend(bit_image(img));
        bytes
    }

    /// Print an image as a raster block
    #[cfg(feature = "image")]
    pub fn image_raster(
        &mut self,
        img: &image::DynamicImage,
        options: &ImageRasterOptions,
    ) -> PrintResult<Vec<u8>> {
        let raster = raster(img, options)?;
        let mut bytes = self.set_styles(&PosStyles::default().with_align(options.align), false);
        bytes.extend(raster);
        Ok(bytes)
    }

    // === Barcodes ===

    /// Print a 1D barcode
    pub fn barcode(&mut self, barcode: &Barcode, options: &BarcodeOptions) -> PrintResult<Vec<u8>> {
        if let Some(width) = options.width
            && !(2..=6).contains(&width)
        {
            return Err(PrintError::InvalidArgument(format!(
                "Barcode width must be 2..=6, got {}",
                width
            )));
        }
        if options.height == Some(0) {
            return Err(PrintError::InvalidArgument(
                "Barcode height must be 1..=255".to_string(),
            ));
        }

        let mut bytes = self.set_styles(&PosStyles::default().with_align(options.align), false);

        // GS H n - HRI position
        bytes.extend_from_slice(&[GS, b'H', options.text_pos.value()]);
        if let Some(font) = options.font {
            let f = match font {
                BarcodeFont::FontA => 0,
                BarcodeFont::FontB => 1,
            };
            bytes.extend_from_slice(&[GS, b'f', f]);
        }
        if let Some(width) = options.width {
            bytes.extend_from_slice(&[GS, b'w', width]);
        }
        if let Some(height) = options.height {
            bytes.extend_from_slice(&[GS, b'h', height]);
        }

        // GS k m n d1..dn
        let data = barcode.data();
        bytes.extend_from_slice(&[GS, b'k', barcode.kind().value(), data.len() as u8]);
        bytes.extend_from_slice(data);
        Ok(bytes)
    }

    /// Print a QR code (model 2)
    pub fn qrcode(&mut self, text: &str, options: &QrOptions) -> PrintResult<Vec<u8>> {
        let data = text.as_bytes();
        let len = data.len() + 3;
        if len > 0xFFFF {
            return Err(PrintError::InvalidArgument(format!(
                "QR data too long: {} bytes",
                data.len()
            )));
        }

        let mut bytes = self.set_styles(&PosStyles::default().with_align(options.align), false);

        // Function 165: Select model (Model 2)
        bytes.extend_from_slice(&[GS, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]);

        // Function 167: Set module size
        let size = options.size.value();
        bytes.extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, size]);

        // Function 169: Set error correction
        let level = options.correction.value();
        bytes.extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, level]);

        // Function 180: Store data
        let p_l = (len & 0xFF) as u8;
        let p_h = ((len >> 8) & 0xFF) as u8;
        bytes.extend_from_slice(&[GS, 0x28, 0x6B, p_l, p_h, 0x31, 0x50, 0x30]);
        bytes.extend_from_slice(data);

        // Function 181: Print
        bytes.extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);

        Ok(bytes)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(PaperSize::Mm80)
    }
}
