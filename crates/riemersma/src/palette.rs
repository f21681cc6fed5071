//! Destination palettes: gray ramps and adaptive color palettes.

use crate::color::Rgba16;
use crate::{Result, RiemersmaError};
use quantette::{deps::palette::Srgb, ImageRef, PaletteSize, Pipeline, QuantizeMethod};

/// Maximum number of palette entries addressable by a `u8` index.
pub const PALETTE_MAX: usize = 256;

fn image_dimensions(width: usize, height: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(RiemersmaError::InvalidDimensions { width, height }),
    }
}

/// Grayscale output depth in bits per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorDepth {
    /// Black and white
    #[default]
    One,
    Two,
    Four,
    /// Full 8-bit grayscale, no palette
    Eight,
}

impl ColorDepth {
    /// Parses a bit count (1, 2, 4 or 8).
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            1 => Ok(ColorDepth::One),
            2 => Ok(ColorDepth::Two),
            4 => Ok(ColorDepth::Four),
            8 => Ok(ColorDepth::Eight),
            other => Err(RiemersmaError::UnsupportedDepth(other)),
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            ColorDepth::One => 1,
            ColorDepth::Two => 2,
            ColorDepth::Four => 4,
            ColorDepth::Eight => 8,
        }
    }

    /// Number of gray levels representable at this depth.
    #[inline]
    pub fn levels(self) -> usize {
        1 << self.bits()
    }
}

impl TryFrom<u8> for ColorDepth {
    type Error = RiemersmaError;

    fn try_from(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
    }
}

/// An ordered set of at most 256 opaque or translucent RGBA8 colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
}

impl Palette {
    pub fn new(colors: Vec<[u8; 4]>) -> Result<Self> {
        if colors.is_empty() || colors.len() > PALETTE_MAX {
            return Err(RiemersmaError::InvalidPalette(colors.len()));
        }
        Ok(Self { colors })
    }

    /// `2^bits` evenly spaced grays from black to white.
    pub fn grayscale(depth: ColorDepth) -> Self {
        let n = depth.levels();
        let step = 0xff / (n - 1);
        let colors = (0..n)
            .map(|i| {
                let y = (step * i) as u8;
                [y, y, y, 0xff]
            })
            .collect();
        Self { colors }
    }

    /// Derives an adaptive palette of up to `max_colors` entries (clamped to
    /// 2..=256) from RGBA pixel data using Wu's method. Alpha is ignored.
    pub fn from_rgba(rgba: &[u8], width: usize, height: usize, max_colors: u16) -> Result<Self> {
        let expected = crate::surface::rgba_len(width, height)?;
        if rgba.len() != expected {
            return Err(RiemersmaError::BufferSizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        if width == 0 || height == 0 {
            return Err(RiemersmaError::InvalidDimensions { width, height });
        }

        let rgb_pixels: Vec<Srgb<u8>> = rgba
            .chunks_exact(4)
            .map(|c| Srgb::new(c[0], c[1], c[2]))
            .collect();

        let max_colors = max_colors.clamp(2, PALETTE_MAX as u16);
        let palette_size = u8::try_from(max_colors)
            .ok()
            .and_then(|n| PaletteSize::try_from(n).ok())
            .unwrap_or(PaletteSize::MAX);

        let (w, h) = image_dimensions(width, height)?;
        let image = ImageRef::new(w, h, &rgb_pixels)
            .map_err(|e| RiemersmaError::Quantization(e.to_string()))?;

        let palette = Pipeline::new()
            .palette_size(palette_size)
            .quantize_method(QuantizeMethod::Wu)
            .input_image(image)
            .output_srgb8_palette()
            .ok_or(RiemersmaError::InvalidDimensions { width, height })?;

        let colors: Vec<[u8; 4]> = palette
            .iter()
            .map(|c| [c.red, c.green, c.blue, 0xff])
            .collect();
        Self::new(colors)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// Color of entry `index` in the common 16-bit representation.
    #[inline]
    pub fn color(&self, index: usize) -> Rgba16 {
        let [r, g, b, a] = self.colors[index];
        Rgba16::from_rgba8(r, g, b, a)
    }

    /// Index of the entry closest to `color`.
    ///
    /// Distance is the sum of quartered squared differences of the
    /// premultiplied 16-bit channels; the first entry wins ties.
    pub fn index_of(&self, color: Rgba16) -> usize {
        let c = color.premultiplied();
        let mut best = 0;
        let mut best_sum = u32::MAX;
        for (i, entry) in self.colors.iter().enumerate() {
            let [r, g, b, a] = *entry;
            let v = Rgba16::from_rgba8(r, g, b, a).premultiplied();
            let sum = (0..4).map(|ch| sq_diff(c[ch], v[ch])).sum::<u32>();
            if sum < best_sum {
                if sum == 0 {
                    return i;
                }
                best = i;
                best_sum = sum;
            }
        }
        best
    }
}

#[inline]
fn sq_diff(x: u32, y: u32) -> u32 {
    let d = x.abs_diff(y);
    (d * d) >> 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_from_bits() {
        assert_eq!(ColorDepth::from_bits(1).unwrap(), ColorDepth::One);
        assert_eq!(ColorDepth::try_from(4).unwrap(), ColorDepth::Four);
        assert_eq!(ColorDepth::from_bits(8).unwrap().levels(), 256);
        assert!(matches!(
            ColorDepth::from_bits(3),
            Err(RiemersmaError::UnsupportedDepth(3))
        ));
        assert!(ColorDepth::from_bits(16).is_err());
    }

    #[test]
    fn test_gray_ramps() {
        let bw = Palette::grayscale(ColorDepth::One);
        assert_eq!(bw.colors(), &[[0, 0, 0, 255], [255, 255, 255, 255]]);

        let four = Palette::grayscale(ColorDepth::Two);
        let levels: Vec<u8> = four.colors().iter().map(|c| c[0]).collect();
        assert_eq!(levels, vec![0, 85, 170, 255]);

        let sixteen = Palette::grayscale(ColorDepth::Four);
        assert_eq!(sixteen.len(), 16);
        assert_eq!(sixteen.colors()[15][0], 255);
        assert_eq!(sixteen.colors()[1][0], 17);
    }

    #[test]
    fn test_index_of_nearest() {
        let palette = Palette::grayscale(ColorDepth::Two);
        assert_eq!(palette.index_of(Rgba16::BLACK), 0);
        assert_eq!(palette.index_of(Rgba16::gray8(80)), 1);
        assert_eq!(palette.index_of(Rgba16::gray8(130)), 2);
        assert_eq!(palette.index_of(Rgba16::WHITE), 3);
    }

    #[test]
    fn test_index_of_tie_prefers_first() {
        let palette = Palette::new(vec![[0, 0, 0, 255], [0, 0, 0, 255]]).unwrap();
        assert_eq!(palette.index_of(Rgba16::gray(100)), 0);
        let palette = Palette::new(vec![[0, 0, 0, 255], [2, 2, 2, 255]]).unwrap();
        assert_eq!(palette.index_of(Rgba16::gray8(1)), 0);
    }

    #[test]
    fn test_color_readback() {
        let palette = Palette::grayscale(ColorDepth::Two);
        assert_eq!(palette.color(1), Rgba16::gray8(85));
    }

    #[test]
    fn test_invalid_palettes() {
        assert!(matches!(Palette::new(vec![]), Err(RiemersmaError::InvalidPalette(0))));
        assert!(Palette::new(vec![[0; 4]; 257]).is_err());
        assert!(Palette::new(vec![[0; 4]; 256]).is_ok());
    }

    #[test]
    fn test_adaptive_palette_size() {
        let rgba: Vec<u8> = (0..64u32)
            .flat_map(|i| [(i * 4) as u8, 255 - (i * 4) as u8, (i * 2) as u8, 255])
            .collect();
        let palette = Palette::from_rgba(&rgba, 8, 8, 8).unwrap();
        assert!(!palette.is_empty());
        assert!(palette.len() <= 8);
    }

    #[test]
    fn test_adaptive_palette_rejects_bad_buffer() {
        assert!(Palette::from_rgba(&[0u8; 12], 2, 2, 4).is_err());
        assert!(Palette::from_rgba(&[], 0, 0, 4).is_err());
    }

    #[test]
    fn test_adaptive_palette_separates_colors() {
        let mut rgba = [255u8, 0, 0, 255].repeat(32);
        rgba.extend([0u8, 0, 255, 255].repeat(32));
        let palette = Palette::from_rgba(&rgba, 8, 8, 2).unwrap();
        assert!(palette.len() <= 2);
        assert_ne!(
            palette.index_of(Rgba16::from_rgba8(255, 0, 0, 255)),
            palette.index_of(Rgba16::from_rgba8(0, 0, 255, 255))
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_image_dimensions_fit_u32() {
        assert_eq!(image_dimensions(640, 480).unwrap(), (640, 480));
        let wide = u32::MAX as usize + 1;
        assert!(matches!(
            image_dimensions(wide, 1),
            Err(RiemersmaError::InvalidDimensions { width, height: 1 }) if width == wide
        ));
        assert!(image_dimensions(1, wide).is_err());
    }
}
