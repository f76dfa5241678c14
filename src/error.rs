// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use thiserror::Error;

/// Errors reported by the edge detection pipeline.
///
/// Every failure is detected before the output buffer is touched, so a
/// caller receiving an error can assume its output pixels are unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied geometry, thresholds or buffers that do not agree.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An intermediate image could not be allocated.
    #[error("unable to allocate {bytes} bytes for intermediate image")]
    ResourceExhausted { bytes: usize },

    /// JPEG compression of an output frame failed.
    #[error("jpeg encode failed: {0}")]
    Encode(#[from] turbojpeg::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
