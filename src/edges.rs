// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Gaussian smoothing and Canny edge detection on 8-bit luma images.
//!
//! Sobel derivatives come from `imageproc`. Smoothing and the Canny stages
//! built on top of the derivatives (non-maximum suppression and hysteresis)
//! live here so that the kernel, thresholds and border rules are exactly the
//! ones the pipeline asks for.

use crate::error::{Error, Result};
use image::{GenericImageView, GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Value of an edge pixel in the edge map.
pub const EDGE: u8 = u8::MAX;

/// Largest accepted blur kernel.
pub const MAX_BLUR_SIZE: u32 = 31;

/// tan(22.5°) in Q15 fixed point.
const TG22: i64 = 13573;
const TG_SHIFT: u32 = 15;

/// Allocates a zeroed intermediate buffer, reporting failure instead of
/// aborting.
pub(crate) fn try_buffer<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let bytes = len.saturating_mul(std::mem::size_of::<T>());
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::ResourceExhausted { bytes })?;
    buf.resize(len, T::default());
    Ok(buf)
}

/// Builds a normalised 1D Gaussian kernel.
///
/// A non-positive `sigma` derives the deviation from the kernel size. For
/// the small odd sizes fixed tables are used in that case, so a
/// 3-tap kernel is exactly `[0.25, 0.5, 0.25]`.
pub fn gaussian_kernel(size: u32, sigma: f32) -> Result<Vec<f32>> {
    if size == 0 || size % 2 == 0 || size > MAX_BLUR_SIZE {
        return Err(Error::invalid(format!(
            "blur kernel size must be odd and at most {MAX_BLUR_SIZE}, got {size}"
        )));
    }
    if !sigma.is_finite() {
        return Err(Error::invalid(format!("blur sigma must be finite, got {sigma}")));
    }

    if sigma <= 0.0 {
        let table: &[f32] = match size {
            1 => &[1.0],
            3 => &[0.25, 0.5, 0.25],
            5 => &[0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => &[
                0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
            ],
            _ => &[],
        };
        if !table.is_empty() {
            return Ok(table.to_vec());
        }
    }

    let sigma = if sigma > 0.0 {
        sigma as f64
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let centre = (size / 2) as f64;
    let scale = -0.5 / (sigma * sigma);
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - centre;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| (w / sum) as f32).collect())
}

/// Maps an out of range coordinate back into `0..n` using reflect-101
/// extrapolation (`gfedcb|abcdefgh|gfedcba`).
fn reflect101(mut i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let last = n as isize - 1;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Applies a separable blur with the given 1D kernel along both axes.
///
/// Accepts any single channel 8-bit image, including views over borrowed
/// memory, and returns a new owned image of the same size.
pub fn blur<I>(src: &I, kernel: &[f32]) -> Result<GrayImage>
where
    I: GenericImageView<Pixel = Luma<u8>>,
{
    let (width, height) = src.dimensions();
    let (w, h) = (width as usize, height as usize);
    let radius = (kernel.len() / 2) as isize;

    let mut tmp = try_buffer::<f32>(w * h)?;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = reflect101(x as isize + k as isize - radius, w);
                acc += weight * src.get_pixel(sx as u32, y as u32).0[0] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = try_buffer::<u8>(w * h)?;
    let mut taps = Vec::with_capacity(kernel.len());
    for y in 0..h {
        taps.clear();
        taps.extend(
            kernel
                .iter()
                .enumerate()
                .map(|(k, &weight)| (reflect101(y as isize + k as isize - radius, h), weight)),
        );
        let dst_row = &mut out[y * w..(y + 1) * w];
        for (x, dst) in dst_row.iter_mut().enumerate() {
            let acc: f32 = taps.iter().map(|&(sy, weight)| weight * tmp[sy * w + x]).sum();
            *dst = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    GrayImage::from_raw(width, height, out)
        .ok_or_else(|| Error::invalid("blurred image size mismatch"))
}

const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Runs Canny edge detection with 3x3 Sobel derivatives and L1 gradient
/// magnitude.
///
/// Non-maximum suppression quantises the gradient direction to 0, 45, 90 or
/// 135 degrees and treats pixels outside the frame as zero magnitude. Along
/// the scan axis a tie keeps the first pixel. Survivors above `low` are edge
/// candidates and those above `high` seed 8-connected hysteresis.
///
/// Returns a map holding [`EDGE`] on edges and 0 elsewhere.
pub fn canny(image: &GrayImage, low: i32, high: i32) -> Result<GrayImage> {
    if low < 0 || high < low {
        return Err(Error::invalid(format!(
            "canny thresholds must satisfy 0 <= low <= high, got {low}/{high}"
        )));
    }

    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);
    let (gx, gy) = (gx.as_raw(), gy.as_raw());

    let mut mag = try_buffer::<i32>(w * h)?;
    for ((m, &dx), &dy) in mag.iter_mut().zip(gx.iter()).zip(gy.iter()) {
        *m = (dx as i32).abs() + (dy as i32).abs();
    }

    let mag_at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            mag[y as usize * w + x as usize]
        }
    };

    let mut state = try_buffer::<u8>(w * h)?;
    let mut stack = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }

            let (dx, dy) = (gx[i] as i32, gy[i] as i32);
            let (x, y) = (x as isize, y as isize);
            let ax = dx.abs() as i64;
            let ay = (dy.abs() as i64) << TG_SHIFT;
            let tg22x = ax * TG22;

            let local_max = if ay < tg22x {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else {
                let tg67x = tg22x + (ax << (TG_SHIFT + 1));
                if ay > tg67x {
                    m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
                } else {
                    let s = if (dx ^ dy) < 0 { -1 } else { 1 };
                    m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
                }
            };
            if !local_max {
                continue;
            }

            if m > high {
                state[i] = STRONG;
                stack.push(i);
            } else {
                state[i] = WEAK;
            }
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if state[j] == WEAK {
                    state[j] = STRONG;
                    stack.push(j);
                }
            }
        }
    }

    let edges = state
        .into_iter()
        .map(|s| if s == STRONG { EDGE } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, edges).ok_or_else(|| Error::invalid("edge map size mismatch"))
}

/// Number of edge pixels in an edge map.
pub fn edge_count(edges: &GrayImage) -> usize {
    edges.as_raw().iter().filter(|&&v| v == EDGE).count()
}
