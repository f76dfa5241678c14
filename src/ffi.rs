// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! C ABI entry point for hosts that hand over pinned camera buffers.

use crate::pipeline::process_frame;
use std::{
    panic::{self, AssertUnwindSafe},
    slice::{from_raw_parts, from_raw_parts_mut},
};
use tracing::{trace, warn};

/// Detects edges in a camera frame held in host memory.
///
/// `input` points to `input_len` bytes holding either the luma plane or a
/// complete NV21 frame, `output` to `output_len` packed BGRA pixels. The
/// host keeps both buffers pinned for the duration of the call and releases
/// them afterwards regardless of the result; no pointer is retained.
///
/// Returns `true` when the output was written and `false` on any failure,
/// in which case the reason is logged and the output is left untouched.
///
/// # Safety
///
/// The caller must ensure that:
/// - `input` is valid for reads of `input_len` bytes
/// - `output` is valid for reads and writes of `output_len` `u32` values and
///   is suitably aligned
/// - The two regions do not overlap and are not accessed by anyone else
///   until the call returns
#[no_mangle]
pub unsafe extern "C" fn edgy_process_frame(
    width: i32,
    height: i32,
    low_threshold: i32,
    input: *const u8,
    input_len: usize,
    output: *mut u32,
    output_len: usize,
) -> bool {
    if input.is_null() || output.is_null() {
        warn!("edgy_process_frame called with a null buffer");
        return false;
    }

    let input = unsafe { from_raw_parts(input, input_len) };
    let output = unsafe { from_raw_parts_mut(output, output_len) };

    match panic::catch_unwind(AssertUnwindSafe(|| {
        process_frame(width, height, low_threshold, input, output)
    })) {
        Ok(Ok(stats)) => {
            trace!("processed {}x{} edges: {}", stats.width, stats.height, stats.edge_pixels);
            true
        }
        Ok(Err(e)) => {
            warn!("process frame failed: {e}");
            false
        }
        Err(_) => {
            warn!("process frame panicked");
            false
        }
    }
}
