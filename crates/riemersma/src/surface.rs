//! Pixel sources and sinks.
//!
//! The engine never quantizes colors itself. It hands a proposed color to a
//! [`PixelSink`], which stores whatever its color model can represent, and
//! then reads the stored value back to measure the error.

use crate::color::Rgba16;
use crate::palette::Palette;
use crate::{Result, RiemersmaError};

/// Something the engine can read colors from.
pub trait PixelSource {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (usize, usize);

    /// Color at `(x, y)`; only called for in-bounds coordinates.
    fn color_at(&self, x: usize, y: usize) -> Rgba16;
}

/// A destination with its own quantization policy.
pub trait PixelSink {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (usize, usize);

    /// Stores the representable approximation of `color` at `(x, y)`.
    fn propose(&mut self, x: usize, y: usize, color: Rgba16);

    /// Color actually stored at `(x, y)`.
    fn read_back(&self, x: usize, y: usize) -> Rgba16;
}

/// Byte length of an RGBA8 buffer, guarding against overflow.
pub(crate) fn rgba_len(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(RiemersmaError::InvalidDimensions { width, height })
}

/// Pixel count of an owned buffer.
///
/// # Panics
/// Panics if `width * height` overflows `usize`.
fn pixel_count(width: usize, height: usize) -> usize {
    match width.checked_mul(height) {
        Some(n) => n,
        None => panic!("buffer size {width}x{height} overflows usize"),
    }
}

/// Borrowed, row-major, non-premultiplied RGBA8 pixel data.
#[derive(Debug, Clone, Copy)]
pub struct RgbaImageRef<'a> {
    rgba: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> RgbaImageRef<'a> {
    /// Wraps `rgba`, which must hold exactly `width * height * 4` bytes.
    pub fn new(rgba: &'a [u8], width: usize, height: usize) -> Result<Self> {
        let expected = rgba_len(width, height)?;
        if rgba.len() != expected {
            return Err(RiemersmaError::BufferSizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            rgba,
            width,
            height,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.rgba
    }
}

impl PixelSource for RgbaImageRef<'_> {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    fn color_at(&self, x: usize, y: usize) -> Rgba16 {
        let i = (y * self.width + x) * 4;
        let p = &self.rgba[i..i + 4];
        Rgba16::from_rgba8(p[0], p[1], p[2], p[3])
    }
}

/// Full-precision 16-bit image. As a sink it stores proposals unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgba16Buffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba16>,
}

impl Rgba16Buffer {
    /// A `width x height` buffer filled with transparent black.
    ///
    /// # Panics
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba16::TRANSPARENT; pixel_count(width, height)],
        }
    }

    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> Rgba16,
    {
        let mut pixels = Vec::with_capacity(pixel_count(width, height));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgba16 {
        self.pixels[y * self.width + x]
    }
}

impl PixelSource for Rgba16Buffer {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn color_at(&self, x: usize, y: usize) -> Rgba16 {
        self.get(x, y)
    }
}

impl PixelSink for Rgba16Buffer {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn propose(&mut self, x: usize, y: usize, color: Rgba16) {
        self.pixels[y * self.width + x] = color;
    }

    fn read_back(&self, x: usize, y: usize) -> Rgba16 {
        self.get(x, y)
    }
}

/// 8-bit grayscale destination. Alpha is dropped; stored pixels are opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl GrayBuffer {
    /// # Panics
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; pixel_count(width, height)],
        }
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}

impl PixelSink for GrayBuffer {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn propose(&mut self, x: usize, y: usize, color: Rgba16) {
        self.pixels[y * self.width + x] = color.luma8();
    }

    fn read_back(&self, x: usize, y: usize) -> Rgba16 {
        Rgba16::gray8(self.pixels[y * self.width + x])
    }
}

/// Paletted destination storing one index per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBuffer {
    pub width: usize,
    pub height: usize,
    pub palette: Palette,
    pub indices: Vec<u8>,
}

impl IndexedBuffer {
    /// A buffer with every pixel set to palette entry 0.
    ///
    /// # Panics
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize, palette: Palette) -> Self {
        Self {
            width,
            height,
            palette,
            indices: vec![0; pixel_count(width, height)],
        }
    }

    /// Expands the indices into RGBA8 pixel data.
    pub fn to_rgba(&self) -> Vec<u8> {
        let colors = self.palette.colors();
        self.indices
            .iter()
            .flat_map(|&i| colors[i as usize])
            .collect()
    }

    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }
}

impl PixelSink for IndexedBuffer {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn propose(&mut self, x: usize, y: usize, color: Rgba16) {
        // palettes hold at most 256 entries, so the index always fits
        self.indices[y * self.width + x] = self.palette.index_of(color) as u8;
    }

    fn read_back(&self, x: usize, y: usize) -> Rgba16 {
        self.palette.color(self.indices[y * self.width + x] as usize)
    }
}
