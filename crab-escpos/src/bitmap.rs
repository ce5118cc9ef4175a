//! Image encoding
//!
//! Images are reduced to 1-bit monochrome (dark opaque pixels print black)
//! and encoded as one of:
//! - `ESC *` 24-dot bit image bands
//! - `GS v 0` raster bit image
//! - `GS ( L` graphics (store, then print)

use crate::error::{PrintError, PrintResult};
use crate::styles::PosAlign;
use image::{DynamicImage, Rgba};
use serde::{Deserialize, Serialize};

/// Raster encoding command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PosImageFn {
    /// `GS v 0`
    #[default]
    BitImageRaster,
    /// `GS ( L`
    Graphics,
}

/// Options for `image_raster`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRasterOptions {
    pub align: PosAlign,
    pub high_density_horizontal: bool,
    pub high_density_vertical: bool,
    pub image_fn: PosImageFn,
}

impl Default for ImageRasterOptions {
    fn default() -> Self {
        Self {
            align: PosAlign::Center,
            high_density_horizontal: true,
            high_density_vertical: true,
            image_fn: PosImageFn::BitImageRaster,
        }
    }
}

fn is_dark(pixel: &Rgba<u8>) -> bool {
    // Transparent = white
    if pixel[3] < 128 {
        return false;
    }
    let luma = (0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32) as u8;
    luma < 128
}

/// 1-bit image, `true` = black dot
struct MonoBitmap {
    width: u32,
    height: u32,
    dots: Vec<bool>,
}

impl MonoBitmap {
    fn from_image(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let dots = rgba.pixels().map(is_dark).collect();
        Self {
            width,
            height,
            dots,
        }
    }

    fn dot(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.dots[(y * self.width + x) as usize]
    }

    /// Row-major packed bits, each row padded to whole bytes
    fn packed_rows(&self) -> Vec<u8> {
        let x_bytes = self.width.div_ceil(8);
        let mut data = Vec::with_capacity((x_bytes * self.height) as usize);
        for y in 0..self.height {
            for x_byte in 0..x_bytes {
                let mut byte = 0u8;
                for bit in 0..8 {
                    if self.dot(x_byte * 8 + bit, y) {
                        byte |= 1 << (7 - bit);
                    }
                }
                data.push(byte);
            }
        }
        data
    }
}

/// Encode as 24-dot double density `ESC *` bands
pub(crate) fn bit_image(img: &DynamicImage) -> Vec<u8> {
    let bitmap = MonoBitmap::from_image(img);
    let mut data = Vec::new();

    // Line spacing = band height so bands touch
    data.extend_from_slice(&[0x1B, 0x33, 24]);

    let mut top = 0;
    while top < bitmap.height {
        data.extend_from_slice(&[0x1B, 0x2A, 33]);
        data.push(bitmap.width as u8);
        data.push((bitmap.width >> 8) as u8);
        for x in 0..bitmap.width {
            for slice in 0..3 {
                let mut byte = 0u8;
                for bit in 0..8 {
                    if bitmap.dot(x, top + slice * 8 + bit) {
                        byte |= 1 << (7 - bit);
                    }
                }
                data.push(byte);
            }
        }
        data.push(0x0A);
        top += 24;
    }

    // Default line spacing
    data.extend_from_slice(&[0x1B, 0x32]);
    data
}

/// Encode as a `GS v 0` raster or `GS ( L` graphics block
pub(crate) fn raster(img: &DynamicImage, options: &ImageRasterOptions) -> PrintResult<Vec<u8>> {
    let bitmap = MonoBitmap::from_image(img);
    let x_bytes = bitmap.width.div_ceil(8);
    let height = bitmap.height;
    let pixels = bitmap.packed_rows();

    if x_bytes > 0xFFFF || height > 0xFFFF {
        return Err(PrintError::InvalidArgument(format!(
            "Image too large: {}x{}",
            bitmap.width, height
        )));
    }

    let mut data = Vec::with_capacity(pixels.len() + 16);
    match options.image_fn {
        PosImageFn::BitImageRaster => {
            let density = (if options.high_density_horizontal { 0 } else { 1 })
                + (if options.high_density_vertical { 0 } else { 2 });
            // GS v 0 m xL xH yL yH
            data.extend_from_slice(&[0x1D, 0x76, 0x30, density]);
            data.extend_from_slice(&[x_bytes as u8, (x_bytes >> 8) as u8]);
            data.extend_from_slice(&[height as u8, (height >> 8) as u8]);
            data.extend_from_slice(&pixels);
        }
        PosImageFn::Graphics => {
            let len = pixels.len() + 10;
            if len > 0xFFFF {
                return Err(PrintError::InvalidArgument(format!(
                    "Image too large for GS ( L: {} bytes",
                    pixels.len()
                )));
            }
            let bx = if options.high_density_horizontal { 1 } else { 2 };
            let by = if options.high_density_vertical { 1 } else { 2 };
            let width = bitmap.width;

            // GS ( L pL pH m fn a bx by c xL xH yL yH d1...dk
            data.extend_from_slice(&[0x1D, 0x28, 0x4C, len as u8, (len >> 8) as u8]);
            data.extend_from_slice(&[0x30, 0x70, 0x30, bx, by, 0x31]);
            data.extend_from_slice(&[width as u8, (width >> 8) as u8]);
            data.extend_from_slice(&[height as u8, (height >> 8) as u8]);
            data.extend_from_slice(&pixels);

            // GS ( L fn 50 - print stored graphics
            data.extend_from_slice(&[0x1D, 0x28, 0x4C, 0x02, 0x00, 0x30, 0x32]);
        }
    }
    Ok(data)
}
