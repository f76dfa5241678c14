// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    edges::{self, blur, canny, edge_count, gaussian_kernel, MAX_BLUR_SIZE},
    error::{Error, Result},
    image::{checked_dims, gray_to_bgra, LumaView, PixelsMut},
};
use image::GrayImage;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span};

/// Ratio between the Canny high and low thresholds.
pub const DEFAULT_RATIO: i32 = 3;

/// Side of the square Gaussian kernel applied before edge detection.
pub const DEFAULT_BLUR_SIZE: u32 = 3;

/// Sobel aperture used for the Canny gradients.
pub const SOBEL_APERTURE: u32 = 3;

/// Output colour of a pixel on an edge (opaque white).
pub const EDGE_PIXEL: u32 = gray_to_bgra(edges::EDGE);

/// Output colour of a pixel off any edge (opaque black).
pub const NO_EDGE_PIXEL: u32 = gray_to_bgra(0);

/// Tunable parameters of the edge detection pipeline.
///
/// `EdgeParams::new` yields the defaults used by [`process_frame`]: a 3x3
/// Gaussian with sigma derived from the kernel size and a high threshold of
/// three times the low threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeParams {
    /// Canny low hysteresis threshold
    pub low_threshold: i32,
    /// High threshold is `low_threshold * ratio`
    pub ratio: i32,
    /// Gaussian kernel size (odd)
    pub blur_size: u32,
    /// Gaussian deviation, 0 derives it from `blur_size`
    pub blur_sigma: f32,
}

impl EdgeParams {
    pub fn new(low_threshold: i32) -> Self {
        Self {
            low_threshold,
            ratio: DEFAULT_RATIO,
            blur_size: DEFAULT_BLUR_SIZE,
            blur_sigma: 0.0,
        }
    }

    /// Canny high threshold, failing if it does not fit in an `i32`.
    pub fn high_threshold(&self) -> Result<i32> {
        self.low_threshold.checked_mul(self.ratio).ok_or_else(|| {
            Error::invalid(format!(
                "high threshold {} x {} overflows",
                self.low_threshold, self.ratio
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.low_threshold < 0 {
            return Err(Error::invalid(format!(
                "low threshold must not be negative, got {}",
                self.low_threshold
            )));
        }
        if self.ratio < 1 {
            return Err(Error::invalid(format!(
                "threshold ratio must be at least 1, got {}",
                self.ratio
            )));
        }
        if self.blur_size == 0 || self.blur_size % 2 == 0 || self.blur_size > MAX_BLUR_SIZE {
            return Err(Error::invalid(format!(
                "blur size must be odd and at most {MAX_BLUR_SIZE}, got {}",
                self.blur_size
            )));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(Error::invalid(format!(
                "blur sigma must be finite and not negative, got {}",
                self.blur_sigma
            )));
        }
        self.high_threshold()?;
        Ok(())
    }
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self::new(50)
    }
}

/// Summary of one processed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    pub width: u32,
    pub height: u32,
    /// Number of pixels marked as edges
    pub edge_pixels: usize,
    pub blur_time: Duration,
    pub canny_time: Duration,
}

/// Blur, Canny and colour conversion with a fixed set of parameters.
///
/// The detector only holds validated parameters and the blur kernel, so a
/// single instance can be shared between threads.
///
/// # Example
///
/// ```
/// use edgy::{
///     image::{LumaView, PixelsMut},
///     pipeline::{EdgeDetector, EdgeParams, NO_EDGE_PIXEL},
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let detector = EdgeDetector::new(EdgeParams::new(50))?;
/// let luma = vec![100u8; 16];
/// let mut pixels = vec![0u32; 16];
///
/// let src = LumaView::new(&luma, 4, 4)?;
/// let mut dst = PixelsMut::new(&mut pixels, 4, 4)?;
/// let stats = detector.process(&src, &mut dst)?;
///
/// assert_eq!(stats.edge_pixels, 0);
/// assert!(pixels.iter().all(|&p| p == NO_EDGE_PIXEL));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct EdgeDetector {
    params: EdgeParams,
    high_threshold: i32,
    kernel: Vec<f32>,
}

impl EdgeDetector {
    pub fn new(params: EdgeParams) -> Result<Self> {
        params.validate()?;
        let high_threshold = params.high_threshold()?;
        let kernel = gaussian_kernel(params.blur_size, params.blur_sigma)?;
        debug!(
            "edge detector low: {} high: {} blur: {}x{} sigma: {}",
            params.low_threshold,
            high_threshold,
            params.blur_size,
            params.blur_size,
            params.blur_sigma
        );
        Ok(Self {
            params,
            high_threshold,
            kernel,
        })
    }

    pub fn params(&self) -> &EdgeParams {
        &self.params
    }

    pub fn high_threshold(&self) -> i32 {
        self.high_threshold
    }

    /// Smooths the luma plane and returns its Canny edge map.
    pub fn detect(&self, src: &LumaView) -> Result<GrayImage> {
        self.detect_timed(src).map(|(edges, _, _)| edges)
    }

    fn detect_timed(&self, src: &LumaView) -> Result<(GrayImage, Duration, Duration)> {
        let now = Instant::now();
        let blurred = {
            let _span = debug_span!("blur", size = self.params.blur_size).entered();
            blur(src.as_image(), &self.kernel)?
        };
        let blur_time = now.elapsed();

        let now = Instant::now();
        let edges = {
            let _span = debug_span!(
                "canny",
                low = self.params.low_threshold,
                high = self.high_threshold
            )
            .entered();
            canny(&blurred, self.params.low_threshold, self.high_threshold)?
        };
        let canny_time = now.elapsed();

        Ok((edges, blur_time, canny_time))
    }

    /// Runs the full pipeline, writing opaque white edges on opaque black
    /// into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `src` and `dst` differ in size
    /// and [`Error::ResourceExhausted`] when an intermediate image cannot be
    /// allocated. `dst` is left untouched on error.
    pub fn process(&self, src: &LumaView, dst: &mut PixelsMut) -> Result<FrameStats> {
        if src.width() != dst.width() || src.height() != dst.height() {
            return Err(Error::invalid(format!(
                "input {} and output {} differ in size",
                src, dst
            )));
        }

        let _span = debug_span!("process", frame = %src).entered();
        let (edges, blur_time, canny_time) = self.detect_timed(src)?;
        dst.fill_from_gray(edges.as_raw())?;

        let stats = FrameStats {
            width: src.width(),
            height: src.height(),
            edge_pixels: edge_count(&edges),
            blur_time,
            canny_time,
        };
        debug!(
            "frame {} edges: {} blur: {:?} canny: {:?}",
            src, stats.edge_pixels, stats.blur_time, stats.canny_time
        );
        Ok(stats)
    }
}

/// Detects edges in a camera frame and writes them as BGRA pixels.
///
/// `input` is either the bare `width * height` luma plane or a complete NV21
/// frame, of which only the luma plane is read. `output` must hold exactly
/// `width * height` pixels. The blur is a 3x3 Gaussian, Canny uses a 3x3
/// Sobel aperture and a high threshold of `3 * low_threshold`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for non-positive dimensions, a negative
/// or overflowing threshold, or buffers whose lengths do not match the
/// dimensions, and [`Error::ResourceExhausted`] when intermediate images
/// cannot be allocated. `output` is left untouched on error.
pub fn process_frame(
    width: i32,
    height: i32,
    low_threshold: i32,
    input: &[u8],
    output: &mut [u32],
) -> Result<FrameStats> {
    let (width, height, _) = checked_dims(width, height)?;
    let detector = EdgeDetector::new(EdgeParams::new(low_threshold))?;
    let src = LumaView::from_frame(input, width, height)?;
    let mut dst = PixelsMut::new(output, width, height)?;
    detector.process(&src, &mut dst)
}
