//! The Riemersma dithering engine.
//!
//! A run walks the region along a Hilbert curve. For every in-bounds cell it
//! sums the remembered errors with their weights, offsets the source color by
//! that amount, lets the destination quantize the result, reads the stored
//! color back and pushes `source - stored` into the history.

use crate::color::{ColorError, Rgba16, CHANNELS};
use crate::hilbert::{self, HilbertPoints};
use crate::history::ErrorHistory;
use crate::surface::{PixelSink, PixelSource};
use crate::weights::WeightCurve;
use crate::Result;
use tracing::{debug, trace};

/// Number of recent errors remembered by the default configuration.
pub const DEFAULT_HISTORY_LEN: usize = 16;

/// Weight ratio between the newest and oldest error in the default configuration.
pub const DEFAULT_RATIO: f64 = 16.0;

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DitherOptions {
    /// How many of the most recent quantization errors feed into each pixel.
    pub history_len: usize,

    /// Weight ratio between the youngest and the oldest remembered error.
    /// Must be positive.
    pub ratio: f64,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            ratio: DEFAULT_RATIO,
        }
    }
}

/// Integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const ORIGIN: Point = Point::new(0, 0);

    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size anchored at the origin.
    #[inline]
    pub const fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// What the engine dithers.
///
/// Coordinates passed to [`DitherTarget::dither_pixel`] are always inside
/// [`DitherTarget::size`]. Implementations quantize the pixel after applying
/// `acc` and return the resulting error.
pub trait DitherTarget {
    fn size(&self) -> (usize, usize);

    fn dither_pixel(&mut self, x: usize, y: usize, acc: &ColorError) -> ColorError;
}

/// A source and a destination bound together for one run.
///
/// Pixel `(x, y)` of the region reads the source at `sp + (x, y)` and writes
/// the destination at `rect.origin() + (x, y)`. The region is the part of
/// `rect` covered by both images.
pub struct Region<'a, S: PixelSource + ?Sized, D: PixelSink + ?Sized> {
    dst: &'a mut D,
    dp: Point,
    src: &'a S,
    sp: Point,
    size: (usize, usize),
}

impl<'a, S: PixelSource + ?Sized, D: PixelSink + ?Sized> Region<'a, S, D> {
    pub fn new(dst: &'a mut D, rect: Rect, src: &'a S, sp: Point) -> Self {
        let (src_w, src_h) = src.dimensions();
        let (dst_w, dst_h) = dst.dimensions();
        let width = src_w
            .saturating_sub(sp.x)
            .min(rect.width)
            .min(dst_w.saturating_sub(rect.x));
        let height = src_h
            .saturating_sub(sp.y)
            .min(rect.height)
            .min(dst_h.saturating_sub(rect.y));
        Self {
            dst,
            dp: rect.origin(),
            src,
            sp,
            size: (width, height),
        }
    }
}

impl<S: PixelSource + ?Sized, D: PixelSink + ?Sized> DitherTarget for Region<'_, S, D> {
    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn dither_pixel(&mut self, x: usize, y: usize, acc: &ColorError) -> ColorError {
        let sc = self.src.color_at(self.sp.x + x, self.sp.y + y);
        let (dx, dy) = (self.dp.x + x, self.dp.y + y);

        self.dst.propose(dx, dy, sc.offset(acc));
        // The sink quantizes opaquely; measure against what it really stored.
        let dc: Rgba16 = self.dst.read_back(dx, dy);

        sc.error_to(dc)
    }
}

/// A validated Riemersma configuration with its precomputed weight curve.
///
/// The value itself is immutable and can be shared; every call to
/// [`Riemersma::dither`] or [`Riemersma::draw`] starts from an empty history.
#[derive(Debug, Clone)]
pub struct Riemersma {
    ratio: f64,
    weights: WeightCurve,
}

impl Default for Riemersma {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
            weights: default_weights(),
        }
    }
}

fn default_weights() -> WeightCurve {
    match WeightCurve::new(DEFAULT_HISTORY_LEN, DEFAULT_RATIO) {
        Ok(w) => w,
        Err(_) => unreachable!("default weight curve parameters are valid"),
    }
}

impl Riemersma {
    /// Remembers `history_len` errors weighted from 1 (oldest) to `ratio`
    /// (newest). Fails if `history_len == 0` or `ratio` is not positive.
    pub fn new(history_len: usize, ratio: f64) -> Result<Self> {
        let weights = WeightCurve::new(history_len, ratio)?;
        Ok(Self { ratio, weights })
    }

    pub fn with_options(opts: &DitherOptions) -> Result<Self> {
        Self::new(opts.history_len, opts.ratio)
    }

    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    #[inline]
    pub fn history_len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn weights(&self) -> &WeightCurve {
        &self.weights
    }

    /// An empty history sized for this engine.
    pub fn new_history(&self) -> ErrorHistory {
        ErrorHistory::new(self.history_len())
    }

    /// Weighted sum of the remembered errors, divided by the ratio.
    ///
    /// The oldest entry gets the smallest weight; entries are summed from
    /// oldest to newest.
    ///
    /// # Panics
    /// Panics if `history` was not built with this engine's history length,
    /// see [`Riemersma::new_history`].
    pub fn accumulated_error(&self, history: &ErrorHistory) -> ColorError {
        assert_eq!(
            history.capacity(),
            self.weights.len(),
            "error history does not match the weight curve"
        );
        let mut acc = ColorError::ZERO;
        for (err, &w) in history.iter_oldest_first().zip(self.weights.as_slice()) {
            if err.is_zero() {
                continue;
            }
            for j in 0..CHANNELS {
                acc[j] += err[j] * w;
            }
        }
        for j in 0..CHANNELS {
            acc[j] /= self.ratio;
        }
        acc
    }

    /// Dithers `src` (starting at `sp`) into the rectangle `rect` of `dst`.
    pub fn draw<S, D>(&self, dst: &mut D, rect: Rect, src: &S, sp: Point)
    where
        S: PixelSource + ?Sized,
        D: PixelSink + ?Sized,
    {
        let mut region = Region::new(dst, rect, src, sp);
        self.dither(&mut region);
    }

    /// Runs the Hilbert walk over `target`.
    pub fn dither<T: DitherTarget + ?Sized>(&self, target: &mut T) {
        let (width, height) = target.size();
        if width == 0 || height == 0 {
            trace!(width, height, "empty region, nothing to dither");
            return;
        }
        let level = hilbert::level_for(width.max(height));
        debug!(
            width,
            height,
            level,
            history_len = self.history_len(),
            ratio = self.ratio,
            "riemersma dither"
        );

        let mut history = self.new_history();
        for (x, y) in HilbertPoints::new(level) {
            if x < 0 || y < 0 {
                continue;
            }
            let (x, y) = (x as usize, y as usize);
            if x >= width || y >= height {
                continue;
            }
            let acc = self.accumulated_error(&history);
            let err = target.dither_pixel(x, y, &acc);
            history.rotate(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Rgba16Buffer;
    use crate::RiemersmaError;

    /// Records every call and forwards to an inner target.
    struct Recorder<T> {
        inner: T,
        calls: Vec<((usize, usize), ColorError)>,
    }

    impl<T: DitherTarget> DitherTarget for Recorder<T> {
        fn size(&self) -> (usize, usize) {
            self.inner.size()
        }

        fn dither_pixel(&mut self, x: usize, y: usize, acc: &ColorError) -> ColorError {
            self.calls.push(((x, y), *acc));
            self.inner.dither_pixel(x, y, acc)
        }
    }

    /// Target of a given size that reports a fixed error for every pixel.
    struct Constant {
        size: (usize, usize),
        error: ColorError,
    }

    impl DitherTarget for Constant {
        fn size(&self) -> (usize, usize) {
            self.size
        }

        fn dither_pixel(&mut self, _x: usize, _y: usize, _acc: &ColorError) -> ColorError {
            self.error
        }
    }

    fn recorder<T>(inner: T) -> Recorder<T> {
        Recorder {
            inner,
            calls: Vec::new(),
        }
    }

    #[test]
    fn test_rejects_bad_ratio() {
        assert!(matches!(Riemersma::new(16, 0.0), Err(RiemersmaError::InvalidRatio(_))));
        assert!(matches!(Riemersma::new(16, -1.0), Err(RiemersmaError::InvalidRatio(_))));
        assert!(matches!(
            Riemersma::new(0, 16.0),
            Err(RiemersmaError::InvalidHistoryLength(0))
        ));
        assert!(Riemersma::new(1, 16.0).is_ok());
        assert!(Riemersma::new(16, 1.0).is_ok());
    }

    #[test]
    fn test_default_matches_options() {
        let engine = Riemersma::default();
        let from_opts = Riemersma::with_options(&DitherOptions::default()).unwrap();
        assert_eq!(engine.history_len(), 16);
        assert_eq!(engine.ratio(), 16.0);
        assert_eq!(engine.weights(), from_opts.weights());
    }

    #[test]
    fn test_single_pixel() {
        let engine = Riemersma::default();
        let mut target = recorder(Constant {
            size: (1, 1),
            error: ColorError([5.0; 4]),
        });
        engine.dither(&mut target);
        assert_eq!(target.calls, vec![((0, 0), ColorError::ZERO)]);
    }

    #[test]
    fn test_empty_region() {
        let engine = Riemersma::default();
        for size in [(0, 0), (0, 7), (7, 0)] {
            let mut target = recorder(Constant {
                size,
                error: ColorError::ZERO,
            });
            engine.dither(&mut target);
            assert!(target.calls.is_empty());
        }
    }

    #[test]
    fn test_non_square_visits_each_pixel_once() {
        let engine = Riemersma::default();
        for (w, h) in [(3, 1), (1, 5), (7, 3), (10, 17)] {
            let mut target = recorder(Constant {
                size: (w, h),
                error: ColorError::ZERO,
            });
            engine.dither(&mut target);
            let mut seen: Vec<_> = target.calls.iter().map(|c| c.0).collect();
            assert_eq!(seen.len(), w * h);
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), w * h);
            assert!(seen.iter().all(|&(x, y)| x < w && y < h));
        }
    }

    #[test]
    fn test_accumulated_error_weights_newest_most() {
        let engine = Riemersma::new(2, 2.0).unwrap();
        let mut history = ErrorHistory::new(2);

        history.rotate(ColorError([10.0, 0.0, 0.0, 0.0]));
        // newest weight 2, divided by ratio 2
        assert_eq!(engine.accumulated_error(&history), ColorError([10.0, 0.0, 0.0, 0.0]));

        history.rotate(ColorError([0.0, 4.0, 0.0, 0.0]));
        assert_eq!(engine.accumulated_error(&history), ColorError([5.0, 4.0, 0.0, 0.0]));
    }

    #[test]
    #[should_panic(expected = "does not match the weight curve")]
    fn test_accumulated_error_rejects_foreign_history() {
        let engine = Riemersma::new(4, 2.0).unwrap();
        let _ = engine.accumulated_error(&ErrorHistory::new(3));
    }

    #[test]
    fn test_new_history_fits_engine() {
        let engine = Riemersma::new(7, 3.0).unwrap();
        let history = engine.new_history();
        assert_eq!(history.capacity(), 7);
        assert_eq!(engine.accumulated_error(&history), ColorError::ZERO);
    }

    #[test]
    fn test_unwritten_slots_contribute_nothing() {
        let engine = Riemersma::new(8, 4.0).unwrap();
        let mut history = ErrorHistory::new(8);
        assert_eq!(engine.accumulated_error(&history), ColorError::ZERO);
        history.rotate(ColorError([8.0, -8.0, 0.0, 4.0]));
        // only the newest slot is filled; no renormalization over filled slots
        assert_eq!(engine.accumulated_error(&history), ColorError([8.0, -8.0, 0.0, 4.0]));
    }

    #[test]
    fn test_constant_error_flows_along_curve() {
        let engine = Riemersma::new(2, 2.0).unwrap();
        let mut target = recorder(Constant {
            size: (2, 2),
            error: ColorError([2.0, 0.0, 0.0, 0.0]),
        });
        engine.dither(&mut target);
        let accs: Vec<f64> = target.calls.iter().map(|c| c.1[0]).collect();
        // (0) -> (2*2)/2 -> (1*2 + 2*2)/2 -> same
        assert_eq!(accs, vec![0.0, 2.0, 3.0, 3.0]);
        let order: Vec<_> = target.calls.iter().map(|c| c.0).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 1), (1, 0)]);
    }

    #[test]
    fn test_lossless_sink_has_no_error() {
        let src = Rgba16Buffer::from_fn(9, 6, |x, y| {
            Rgba16::new((x * 7000) as u16, (y * 9000) as u16, 12345, 0xffff)
        });
        let mut dst = Rgba16Buffer::new(9, 6);
        let engine = Riemersma::default();
        {
            let region = Region::new(&mut dst, Rect::from_size(9, 6), &src, Point::ORIGIN);
            let mut target = recorder(region);
            engine.dither(&mut target);
            assert_eq!(target.calls.len(), 54);
            assert!(target.calls.iter().all(|c| c.1.is_zero()));
        }
        assert_eq!(dst, src);
    }

    #[test]
    fn test_region_clips_to_both_images() {
        let src = Rgba16Buffer::new(10, 4);
        let mut dst = Rgba16Buffer::new(6, 6);
        let region = Region::new(&mut dst, Rect::new(2, 1, 100, 100), &src, Point::new(3, 0));
        assert_eq!(region.size(), (4, 4));

        let region = Region::new(&mut dst, Rect::new(0, 0, 6, 6), &src, Point::new(20, 20));
        assert_eq!(region.size(), (0, 0));
    }

    #[test]
    fn test_draw_with_offsets() {
        let src = Rgba16Buffer::from_fn(4, 4, |x, y| Rgba16::gray((x * 100 + y) as u16));
        let mut dst = Rgba16Buffer::new(5, 5);
        Riemersma::default().draw(&mut dst, Rect::new(2, 3, 2, 2), &src, Point::new(1, 2));
        assert_eq!(dst.get(2, 3), src.get(1, 2));
        assert_eq!(dst.get(3, 4), src.get(2, 3));
        assert_eq!(dst.get(0, 0), Rgba16::TRANSPARENT);
        assert_eq!(dst.get(4, 4), Rgba16::TRANSPARENT);
    }
}
