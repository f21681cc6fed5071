//! One-call helpers for dithering raw RGBA8 buffers.

use crate::engine::{DitherOptions, Point, Rect, Riemersma};
use crate::palette::{ColorDepth, Palette};
use crate::surface::{GrayBuffer, IndexedBuffer, RgbaImageRef};
use crate::Result;

/// Dithers RGBA8 data to grayscale.
///
/// # Arguments
/// * `rgba` - Raw RGBA pixel data (4 bytes per pixel: R, G, B, A)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `depth` - Output depth; below 8 bits the image is dithered onto an
///   evenly spaced gray ramp
/// * `opts` - Engine options
///
/// # Returns
/// One 8-bit luma value per pixel, row-major. At depths below 8 every value
/// is one of the ramp's levels.
///
/// # Example
/// ```ignore
/// use riemersma::{dither_to_gray, ColorDepth, DitherOptions};
///
/// let rgba = vec![128u8, 128, 128, 255, 128, 128, 128, 255];
/// let luma = dither_to_gray(&rgba, 2, 1, ColorDepth::One, &DitherOptions::default())?;
/// assert!(luma.iter().all(|&v| v == 0 || v == 255));
/// ```
#[must_use = "this returns the dithered pixels"]
pub fn dither_to_gray(
    rgba: &[u8],
    width: usize,
    height: usize,
    depth: ColorDepth,
    opts: &DitherOptions,
) -> Result<Vec<u8>> {
    let engine = Riemersma::with_options(opts)?;
    let src = RgbaImageRef::new(rgba, width, height)?;
    let rect = Rect::from_size(width, height);

    if depth == ColorDepth::Eight {
        let mut dst = GrayBuffer::new(width, height);
        engine.draw(&mut dst, rect, &src, Point::ORIGIN);
        return Ok(dst.into_raw());
    }

    let mut dst = IndexedBuffer::new(width, height, Palette::grayscale(depth));
    engine.draw(&mut dst, rect, &src, Point::ORIGIN);
    let levels = dst.palette.colors();
    Ok(dst.indices.iter().map(|&i| levels[i as usize][0]).collect())
}

/// Dithers to grayscale with [`DitherOptions::default`].
#[inline]
#[must_use = "this returns the dithered pixels"]
pub fn dither_default_to_gray(
    rgba: &[u8],
    width: usize,
    height: usize,
    depth: ColorDepth,
) -> Result<Vec<u8>> {
    dither_to_gray(rgba, width, height, depth, &DitherOptions::default())
}

/// Dithers RGBA8 data onto `palette`, returning one palette index per pixel.
#[must_use = "this returns the palette indices"]
pub fn dither_to_palette(
    rgba: &[u8],
    width: usize,
    height: usize,
    palette: &Palette,
    opts: &DitherOptions,
) -> Result<Vec<u8>> {
    let engine = Riemersma::with_options(opts)?;
    let src = RgbaImageRef::new(rgba, width, height)?;
    let mut dst = IndexedBuffer::new(width, height, palette.clone());
    engine.draw(&mut dst, Rect::from_size(width, height), &src, Point::ORIGIN);
    Ok(dst.into_indices())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RiemersmaError;

    fn flat_gray(width: usize, height: usize, y: u8) -> Vec<u8> {
        [y, y, y, 255].repeat(width * height)
    }

    #[test]
    fn test_mid_gray_is_half_on() {
        let rgba = flat_gray(32, 32, 128);
        let luma = dither_default_to_gray(&rgba, 32, 32, ColorDepth::One).unwrap();
        assert!(luma.iter().all(|&v| v == 0 || v == 255));
        let white = luma.iter().filter(|&&v| v == 255).count();
        // 128/255 of 1024 pixels, give or take the diffusion tail
        assert!((480..=550).contains(&white), "white pixels: {white}");
    }

    #[test]
    fn test_depth_two_uses_ramp_levels() {
        let rgba: Vec<u8> = (0..256u32)
            .flat_map(|i| {
                let y = i as u8;
                [y, y, y, 255]
            })
            .collect();
        let luma = dither_default_to_gray(&rgba, 16, 16, ColorDepth::Two).unwrap();
        assert!(luma.iter().all(|v| [0, 85, 170, 255].contains(v)));
    }

    #[test]
    fn test_depth_eight_is_plain_luma() {
        let rgba = vec![10, 10, 10, 255, 200, 200, 200, 255];
        let luma = dither_default_to_gray(&rgba, 2, 1, ColorDepth::Eight).unwrap();
        assert_eq!(luma, vec![10, 200]);
    }

    #[test]
    fn test_palette_indices() {
        let palette = Palette::new(vec![[255, 0, 0, 255], [0, 0, 255, 255]]).unwrap();
        let rgba = [[250, 0, 5, 255], [0, 0, 250, 255]].concat();
        let indices = dither_to_palette(&rgba, 2, 1, &palette, &DitherOptions::default()).unwrap();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_zero_sized_image() {
        let luma = dither_default_to_gray(&[], 0, 0, ColorDepth::One).unwrap();
        assert!(luma.is_empty());
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            dither_default_to_gray(&[0; 7], 1, 2, ColorDepth::One),
            Err(RiemersmaError::BufferSizeMismatch { .. })
        ));
        let opts = DitherOptions {
            history_len: 16,
            ratio: 0.0,
        };
        assert!(matches!(
            dither_to_gray(&[0; 4], 1, 1, ColorDepth::One, &opts),
            Err(RiemersmaError::InvalidRatio(_))
        ));
    }
}
