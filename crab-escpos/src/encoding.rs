//! Text encoding for thermal printers
//!
//! Printers expect single-byte code page text, or GBK while kanji (Chinese)
//! mode is on. This module provides utilities for:
//! - Encoding UTF-8 text for either mode
//! - Calculating encoded widths
//! - Wrapping and padding encoded text to a column width

use crate::error::{PrintError, PrintResult};
use crate::styles::PosAlign;
use encoding_rs::{Encoding, GBK, WINDOWS_1252};

fn encoding_for(contains_chinese: bool) -> &'static Encoding {
    if contains_chinese { GBK } else { WINDOWS_1252 }
}

/// Encode a single char; unmappable chars become `?`
fn encode_char(c: char, encoding: &'static Encoding) -> Vec<u8> {
    let mut tmp = [0u8; 4];
    let (cow, _, had_errors) = encoding.encode(c.encode_utf8(&mut tmp));
    if had_errors {
        vec![b'?']
    } else {
        cow.into_owned()
    }
}

/// Encode text for the printer
///
/// Chinese text is GBK encoded, everything else single-byte (Windows-1252).
pub fn encode_text(s: &str, contains_chinese: bool) -> Vec<u8> {
    let encoding = encoding_for(contains_chinese);
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        out.extend(encode_char(c, encoding));
    }
    out
}

/// Get the encoded byte width of a string
///
/// Chinese characters are 2 bytes in GBK, ASCII is 1 byte.
pub fn encoded_width(s: &str, contains_chinese: bool) -> usize {
    let encoding = encoding_for(contains_chinese);
    s.chars().map(|c| encode_char(c, encoding).len()).sum()
}

/// Encode text with any WHATWG encoding label (e.g. "shift_jis", "cp866")
///
/// Intended for callers preparing bytes for `text_encoded`.
pub fn encode_with_label(s: &str, label: &str) -> PrintResult<Vec<u8>> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| PrintError::InvalidArgument(format!("Unknown encoding: {}", label)))?;
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        out.extend(encode_char(c, encoding));
    }
    Ok(out)
}

/// Split text into encoded chunks of at most `max_width` bytes
///
/// Multi-byte characters are never split. Always returns at least one chunk.
pub fn wrap_text(s: &str, max_width: usize, contains_chinese: bool) -> Vec<Vec<u8>> {
    let encoding = encoding_for(contains_chinese);
    let mut chunks = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    for c in s.chars() {
        let bytes = encode_char(c, encoding);
        if !current.is_empty() && current.len() + bytes.len() > max_width {
            chunks.push(std::mem::take(&mut current));
        }
        current.extend(bytes);
    }
    chunks.push(current);
    chunks
}

/// Split pre-encoded bytes into chunks of at most `max_width` bytes
pub fn wrap_bytes(bytes: &[u8], max_width: usize) -> Vec<Vec<u8>> {
    if bytes.is_empty() || max_width == 0 {
        return vec![bytes.to_vec()];
    }
    bytes.chunks(max_width).map(<[u8]>::to_vec).collect()
}

/// Pad encoded text with spaces to a specific width
///
/// If the text is longer than the width, it is returned unchanged.
pub fn pad(bytes: &[u8], width: usize, align: PosAlign) -> Vec<u8> {
    if bytes.len() >= width {
        return bytes.to_vec();
    }
    let spaces = width - bytes.len();
    let (before, after) = match align {
        PosAlign::Left => (0, spaces),
        PosAlign::Right => (spaces, 0),
        PosAlign::Center => (spaces / 2, spaces - spaces / 2),
    };

    let mut out = Vec::with_capacity(width);
    out.resize(before, b' ');
    out.extend_from_slice(bytes);
    out.resize(out.len() + after, b' ');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_width() {
        assert_eq!(encoded_width("hello", false), 5);
        assert_eq!(encoded_width("你好", true), 4); // 2 Chinese chars = 4 bytes
        assert_eq!(encoded_width("AB中文CD", true), 8); // 4 ASCII + 2 Chinese
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("Hello", false), b"Hello".to_vec());
        assert_eq!(encode_text("é", false), vec![0xE9]);
        // Not representable in Windows-1252
        assert_eq!(encode_text("中", false), b"?".to_vec());
        assert_eq!(encode_text("中", true).len(), 2);
    }

    #[test]
    fn test_encode_with_label() {
        assert_eq!(encode_with_label("abc", "latin1").unwrap(), b"abc".to_vec());
        assert!(encode_with_label("abc", "no-such-encoding").is_err());
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(
            wrap_text("hello world", 5, false),
            vec![b"hello".to_vec(), b" worl".to_vec(), b"d".to_vec()]
        );
        // double-byte chars are never split
        let chunks = wrap_text("AB中文", 3, true);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], b"AB".to_vec());
        assert_eq!(chunks[1].len(), 2);
        assert_eq!(chunks[2].len(), 2);
        assert_eq!(wrap_text("", 4, false), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad(b"hi", 5, PosAlign::Left), b"hi   ".to_vec());
        assert_eq!(pad(b"hi", 5, PosAlign::Right), b"   hi".to_vec());
        assert_eq!(pad(b"hi", 5, PosAlign::Center), b" hi  ".to_vec());
        assert_eq!(pad(b"hello world", 5, PosAlign::Left), b"hello world".to_vec());
    }
}
