// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # Edgy Edge Detection Library
//!
//! This library turns camera preview frames into edge maps ready for
//! display. A frame's luma plane is smoothed with a 3x3 Gaussian, run
//! through Canny edge detection and expanded to opaque BGRA pixels written
//! straight into a caller-provided buffer.
//!
//! ## Features
//!
//! - **Borrowed Frames**: Input and output buffers are wrapped in views tied
//!   to the caller's lifetime, nothing is copied in or retained afterwards.
//! - **NV21 Input**: Complete NV21 preview frames are accepted as-is, only the
//!   luma plane is read.
//! - **Checked Geometry**: Dimensions, thresholds and buffer lengths are
//!   validated up front and reported as typed errors.
//! - **C ABI**: [`ffi::edgy_process_frame`] exposes the pipeline to native
//!   hosts.
//!
//! ## Example
//!
//! ```
//! use edgy::{process_frame, pipeline::NO_EDGE_PIXEL};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (640, 480);
//! let frame = vec![0u8; width * height * 3 / 2];
//! let mut pixels = vec![0u32; width * height];
//!
//! let stats = process_frame(width as i32, height as i32, 50, &frame, &mut pixels)?;
//! assert_eq!(stats.edge_pixels, 0);
//! assert!(pixels.iter().all(|&p| p == NO_EDGE_PIXEL));
//! # Ok(())
//! # }
//! ```

pub mod edges;
pub mod error;
pub mod ffi;
pub mod image;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{process_frame, EdgeDetector, EdgeParams, FrameStats};
