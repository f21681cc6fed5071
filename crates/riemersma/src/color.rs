//! Color arithmetic shared by the engine and the pixel adapters.
//!
//! All diffusion happens on non-premultiplied 16-bit channels. The conversion
//! rules mirror the classic 8/16-bit RGBA model: 8-bit values widen by
//! `v * 0x101`, and premultiplied values are un-premultiplied with integer
//! division so that every adapter agrees on what a stored color reads back as.

use std::ops::{Index, IndexMut};

/// Number of channels carried through the diffusion (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Largest value of a 16-bit channel.
pub const CHANNEL_MAX: u16 = 0xffff;

/// A non-premultiplied color with 16 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba16 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Rgba16 {
    pub const TRANSPARENT: Rgba16 = Rgba16::new(0, 0, 0, 0);
    pub const BLACK: Rgba16 = Rgba16::new(0, 0, 0, CHANNEL_MAX);
    pub const WHITE: Rgba16 = Rgba16::new(CHANNEL_MAX, CHANNEL_MAX, CHANNEL_MAX, CHANNEL_MAX);

    #[inline]
    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque gray from a 16-bit intensity.
    #[inline]
    pub const fn gray(y: u16) -> Self {
        Self::new(y, y, y, CHANNEL_MAX)
    }

    /// Opaque gray from an 8-bit intensity.
    #[inline]
    pub const fn gray8(y: u8) -> Self {
        let y = y as u16 * 0x101;
        Self::gray(y)
    }

    #[inline]
    pub const fn from_channels(c: [u16; CHANNELS]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    #[inline]
    pub const fn channels(self) -> [u16; CHANNELS] {
        [self.r, self.g, self.b, self.a]
    }

    /// Widens a non-premultiplied 8-bit RGBA color.
    ///
    /// Goes through the premultiplied form, so translucent colors lose the
    /// same low bits they would in any premultiplying pipeline.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let a8 = a as u32;
        let premul = |v: u8| ((v as u32 * 0x101) * a8) / 0xff;
        Self::from_premultiplied([premul(r), premul(g), premul(b), a8 * 0x101])
    }

    /// Un-premultiplies 16-bit premultiplied channels (each `<= a`).
    pub fn from_premultiplied(c: [u32; CHANNELS]) -> Self {
        let [r, g, b, a] = c;
        match a {
            0xffff => Self::new(r as u16, g as u16, b as u16, CHANNEL_MAX),
            0 => Self::TRANSPARENT,
            _ => {
                let unpremul = |v: u32| ((v.min(a) * 0xffff) / a) as u16;
                Self::new(unpremul(r), unpremul(g), unpremul(b), a as u16)
            }
        }
    }

    /// Alpha-premultiplied 16-bit channels.
    pub fn premultiplied(self) -> [u32; CHANNELS] {
        let a = self.a as u32;
        let premul = |v: u16| (v as u32 * a) / 0xffff;
        [premul(self.r), premul(self.g), premul(self.b), a]
    }

    /// Truncates to 8 bits per channel.
    #[inline]
    pub fn to_rgba8(self) -> [u8; CHANNELS] {
        self.channels().map(|c| (c >> 8) as u8)
    }

    /// 8-bit luma (ITU-R 601 weights) of the premultiplied color.
    pub fn luma8(self) -> u8 {
        let [r, g, b, _] = self.premultiplied();
        ((19595 * r + 38470 * g + 7471 * b + (1 << 15)) >> 24) as u8
    }

    /// Adds the rounded accumulated error to every channel, clamping to
    /// `[0, 0xffff]`.
    ///
    /// Any error magnitude is accepted, infinities included. A NaN channel
    /// error yields 0.
    pub fn offset(self, acc: &ColorError) -> Self {
        let mut out = self.channels();
        for (c, e) in out.iter_mut().zip(acc.0.iter()) {
            *c = clamp_channel(*c as f64 + e.round());
        }
        Self::from_channels(out)
    }

    /// Per-channel signed difference `self - other`.
    pub fn error_to(self, other: Rgba16) -> ColorError {
        let a = self.channels();
        let b = other.channels();
        ColorError(std::array::from_fn(|i| a[i] as f64 - b[i] as f64))
    }
}

// Clamped in f64: the accumulated error can exceed any integer range.
#[inline]
fn clamp_channel(v: f64) -> u16 {
    v.clamp(0.0, CHANNEL_MAX as f64) as u16
}

/// Signed quantization residue of one pixel, one value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorError(pub [f64; CHANNELS]);

impl ColorError {
    /// "No error yet".
    pub const ZERO: ColorError = ColorError([0.0; CHANNELS]);

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&e| e == 0.0)
    }
}

impl Index<usize> for ColorError {
    type Output = f64;

    #[inline]
    fn index(&self, channel: usize) -> &f64 {
        &self.0[channel]
    }
}

impl IndexMut<usize> for ColorError {
    #[inline]
    fn index_mut(&mut self, channel: usize) -> &mut f64 {
        &mut self.0[channel]
    }
}
