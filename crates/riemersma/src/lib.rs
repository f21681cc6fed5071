//! # riemersma
//!
//! Riemersma dithering for Rust: error diffusion along a Hilbert curve.
//!
//! Instead of scanning rows like Floyd-Steinberg, the image is walked along a
//! space-filling Hilbert curve. The quantization errors of the most recently
//! visited pixels are kept in a short history and fed, with exponentially
//! growing weights, into the next pixel. Because the curve has no preferred
//! direction, the result is free of the diagonal "worm" artifacts typical of
//! raster error diffusion.
//!
//! ## Features
//!
//! - **Engine**: [`Riemersma`] drives any [`DitherTarget`]; quantization is done
//!   by the destination and read back, so any palette or gray model works.
//! - **Adapters**: RGBA8 sources, 8-bit grayscale and paletted sinks.
//! - **Palettes**: evenly spaced gray ramps or adaptive palettes computed with
//!   quantette.
//!
//! ## Quick Start
//!
//! ```ignore
//! use riemersma::{dither_to_gray, ColorDepth, DitherOptions};
//!
//! // RGBA image data (4 bytes per pixel)
//! let rgba = vec![200u8, 200, 200, 255, 30, 30, 30, 255];
//! let luma = dither_to_gray(&rgba, 2, 1, ColorDepth::One, &DitherOptions::default())?;
//! assert_eq!(luma.len(), 2);
//! ```
//!
//! ### Driving the engine directly
//!
//! ```ignore
//! use riemersma::{GrayBuffer, Point, Rect, Riemersma, RgbaImageRef};
//!
//! let src = RgbaImageRef::new(&rgba, width, height)?;
//! let mut dst = GrayBuffer::new(width, height);
//! Riemersma::new(32, 8.0)?.draw(&mut dst, Rect::from_size(width, height), &src, Point::ORIGIN);
//! ```

use thiserror::Error;

pub mod color;
pub mod engine;
pub mod hilbert;
pub mod history;
pub mod palette;
pub mod quantize;
pub mod surface;
pub mod weights;

pub use color::{ColorError, Rgba16, CHANNELS};
pub use engine::{
    DitherOptions, DitherTarget, Point, Rect, Region, Riemersma, DEFAULT_HISTORY_LEN,
    DEFAULT_RATIO,
};
pub use hilbert::{traverse, Direction, HilbertMoves, HilbertPoints};
pub use history::ErrorHistory;
pub use palette::{ColorDepth, Palette};
pub use quantize::{dither_default_to_gray, dither_to_gray, dither_to_palette};
pub use surface::{GrayBuffer, IndexedBuffer, PixelSink, PixelSource, Rgba16Buffer, RgbaImageRef};
pub use weights::WeightCurve;

/// Errors that can occur while configuring or running a dither.
#[derive(Debug, Error)]
pub enum RiemersmaError {
    /// The weight ratio must be a positive, finite number
    #[error("invalid weight ratio: {0} (must be positive)")]
    InvalidRatio(f64),

    /// The error history needs at least one slot
    #[error("invalid history length: {0} (must be at least 1)")]
    InvalidHistoryLength(usize),

    /// Buffer size doesn't match expected size for dimensions
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Image dimensions overflow the addressable buffer size
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Grayscale depth other than 1, 2, 4 or 8 bits
    #[error("unsupported color depth: {0} bits")]
    UnsupportedDepth(u8),

    /// A palette must hold between 1 and 256 colors
    #[error("invalid palette size: {0} colors")]
    InvalidPalette(usize),

    /// Adaptive palette generation failed
    #[error("quantization error: {0}")]
    Quantization(String),
}

/// Result type for dithering operations.
pub type Result<T> = core::result::Result<T, RiemersmaError>;
