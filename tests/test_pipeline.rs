// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgy::{
    ffi::edgy_process_frame,
    image::{self, frame_size, rotate_pixels, LumaView, PixelsMut, Rotation},
    pipeline::{EDGE_PIXEL, NO_EDGE_PIXEL},
    process_frame, EdgeDetector, EdgeParams, Error,
};
use std::error::Error as StdError;

/// Vertical step edge: left half black, right half white.
fn step_frame(width: usize, height: usize) -> Vec<u8> {
    (0..width * height)
        .map(|i| if i % width < width / 2 { 0 } else { 255 })
        .collect()
}

/// Deterministic textured frame with edges of varying strength.
fn textured_frame(width: usize, height: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let noise = (state >> 24) as usize % 24;
            let blocks = if (x / 8 + y / 6) % 2 == 0 { 40 } else { 200 };
            let ramp = (x * 3 + y * 2) % 60;
            (blocks + ramp + noise).min(255) as u8
        })
        .collect()
}

fn edge_count(pixels: &[u32]) -> usize {
    pixels.iter().filter(|&&p| p == EDGE_PIXEL).count()
}

#[test]
fn test_flat_field() -> Result<(), Box<dyn StdError>> {
    let input = vec![100u8; 16];
    let mut output = vec![0u32; 16];

    let stats = process_frame(4, 4, 50, &input, &mut output)?;

    assert_eq!(stats.edge_pixels, 0);
    assert!(output.iter().all(|&p| p == NO_EDGE_PIXEL));
    assert_eq!(NO_EDGE_PIXEL.to_ne_bytes(), [0, 0, 0, 255]);
    Ok(())
}

#[test]
fn test_black_frame() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (64, 48);
    let input = vec![0u8; width * height];
    let mut output = vec![EDGE_PIXEL; width * height];

    for threshold in [0, 1, 50, 200] {
        let stats = process_frame(width as i32, height as i32, threshold, &input, &mut output)?;
        assert_eq!(stats.edge_pixels, 0);
        assert!(output.iter().all(|&p| p == NO_EDGE_PIXEL));
    }
    Ok(())
}

#[test]
fn test_step_edge() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (32, 24);
    let input = step_frame(width, height);

    for threshold in [0, 10, 50, 100, 200, 254] {
        let mut output = vec![0u32; width * height];
        let stats = process_frame(width as i32, height as i32, threshold, &input, &mut output)?;

        assert_eq!(stats.edge_pixels, height, "threshold {threshold}");
        let column = output[..width]
            .iter()
            .position(|&p| p == EDGE_PIXEL)
            .expect("edge in first row");
        assert!(
            column == width / 2 - 1 || column == width / 2,
            "edge at column {column}"
        );
        for (y, row) in output.chunks_exact(width).enumerate() {
            for (x, &p) in row.iter().enumerate() {
                let expected = if x == column { EDGE_PIXEL } else { NO_EDGE_PIXEL };
                assert_eq!(p, expected, "pixel {x},{y} threshold {threshold}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_deterministic() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (80, 60);
    let input = textured_frame(width, height);
    let mut first = vec![0u32; width * height];
    let mut second = vec![0u32; width * height];

    process_frame(width as i32, height as i32, 30, &input, &mut first)?;
    process_frame(width as i32, height as i32, 30, &input, &mut second)?;

    assert_eq!(first, second);
    assert!(edge_count(&first) > 0);
    Ok(())
}

#[test]
fn test_threshold_monotonic() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (80, 60);
    let input = textured_frame(width, height);
    let mut output = vec![0u32; width * height];

    let mut previous = usize::MAX;
    for threshold in (0..=120).step_by(5) {
        let stats = process_frame(width as i32, height as i32, threshold, &input, &mut output)?;
        assert_eq!(stats.edge_pixels, edge_count(&output));
        assert!(
            stats.edge_pixels <= previous,
            "threshold {threshold} found {} edges, previous {previous}",
            stats.edge_pixels
        );
        previous = stats.edge_pixels;
    }
    Ok(())
}

#[test]
fn test_only_edge_colours() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (40, 30);
    let input = textured_frame(width, height);
    let mut output = vec![0x1234_5678u32; width * height];

    let stats = process_frame(width as i32, height as i32, 20, &input, &mut output)?;

    assert_eq!(stats.width as usize, width);
    assert_eq!(stats.height as usize, height);
    assert_eq!(output.len(), width * height);
    assert!(output.iter().all(|&p| p == EDGE_PIXEL || p == NO_EDGE_PIXEL));
    Ok(())
}

#[test]
fn test_nv21_matches_luma() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (33, 17);
    let luma = textured_frame(width, height);
    let mut nv21 = luma.clone();
    nv21.resize(frame_size(width as u32, height as u32, image::NV21)?, 0x80);

    let mut from_luma = vec![0u32; width * height];
    let mut from_nv21 = vec![0u32; width * height];
    process_frame(width as i32, height as i32, 25, &luma, &mut from_luma)?;
    process_frame(width as i32, height as i32, 25, &nv21, &mut from_nv21)?;

    assert_eq!(from_luma, from_nv21);
    Ok(())
}

#[test]
fn test_invalid_arguments() {
    let input = vec![0u8; 16];
    let mut output = vec![7u32; 16];

    let cases: [(i32, i32, i32, usize, usize); 7] = [
        (0, 4, 50, 16, 16),
        (4, -4, 50, 16, 16),
        (4, 4, -1, 16, 16),
        (4, 4, i32::MAX, 16, 16),
        (4, 4, 50, 15, 16),
        (4, 4, 50, 16, 15),
        (8, 8, 50, 16, 16),
    ];
    for (width, height, threshold, in_len, out_len) in cases {
        let res = process_frame(
            width,
            height,
            threshold,
            &input[..in_len],
            &mut output[..out_len],
        );
        assert!(
            matches!(res, Err(Error::InvalidArgument(_))),
            "{width}x{height} t={threshold} in={in_len} out={out_len}: {res:?}"
        );
        assert!(output.iter().all(|&p| p == 7));
    }
}

#[test]
fn test_detector_params() -> Result<(), Box<dyn StdError>> {
    assert!(EdgeDetector::new(EdgeParams {
        blur_size: 4,
        ..EdgeParams::new(10)
    })
    .is_err());
    assert!(EdgeDetector::new(EdgeParams {
        ratio: 0,
        ..EdgeParams::new(10)
    })
    .is_err());

    let detector = EdgeDetector::new(EdgeParams::new(40))?;
    assert_eq!(detector.high_threshold(), 120);

    let (width, height) = (16u32, 8u32);
    let luma = step_frame(width as usize, height as usize);
    let src = LumaView::new(&luma, width, height)?;
    let edges = detector.detect(&src)?;
    assert_eq!(edges.dimensions(), (width, height));

    let mut pixels = vec![0u32; 8 * 8];
    let mut dst = PixelsMut::new(&mut pixels, 8, 8)?;
    assert!(matches!(
        detector.process(&src, &mut dst),
        Err(Error::InvalidArgument(_))
    ));
    Ok(())
}

#[test]
fn test_wider_blur() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (32u32, 24u32);
    let luma = step_frame(width as usize, height as usize);
    let src = LumaView::new(&luma, width, height)?;
    let mut pixels = vec![0u32; luma.len()];
    let mut dst = PixelsMut::new(&mut pixels, width, height)?;

    let detector = EdgeDetector::new(EdgeParams {
        blur_size: 7,
        ..EdgeParams::new(20)
    })?;
    let stats = detector.process(&src, &mut dst)?;

    assert_eq!(stats.edge_pixels, height as usize);
    Ok(())
}

#[test]
fn test_rotation() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (6u32, 4u32);
    let pixels: Vec<u32> = (0..width * height).collect();

    let (quarter, w, h) = rotate_pixels(&pixels, width, height, Rotation::Rotation90)?;
    assert_eq!((w, h), (height, width));
    let (half, w, h) = rotate_pixels(&quarter, w, h, Rotation::Rotation90)?;
    let (direct, dw, dh) = rotate_pixels(&pixels, width, height, Rotation::Rotation180)?;
    assert_eq!((w, h), (dw, dh));
    assert_eq!(half, direct);

    let (three, w, h) = rotate_pixels(&half, w, h, Rotation::Rotation90)?;
    let (full, w, h) = rotate_pixels(&three, w, h, Rotation::Rotation90)?;
    assert_eq!((w, h), (width, height));
    assert_eq!(full, pixels);

    let (ccw, w, h) = rotate_pixels(&pixels, width, height, Rotation::Rotation270)?;
    let (back, _, _) = rotate_pixels(&ccw, w, h, Rotation::Rotation90)?;
    assert_eq!(back, pixels);
    Ok(())
}

#[test]
fn test_ffi_boundary() {
    let (width, height) = (32usize, 24usize);
    let input = step_frame(width, height);
    let mut output = vec![0u32; width * height];

    let ok = unsafe {
        edgy_process_frame(
            width as i32,
            height as i32,
            50,
            input.as_ptr(),
            input.len(),
            output.as_mut_ptr(),
            output.len(),
        )
    };
    assert!(ok);
    assert_eq!(edge_count(&output), height);

    let short = unsafe {
        edgy_process_frame(
            width as i32,
            height as i32,
            50,
            input.as_ptr(),
            input.len() - 1,
            output.as_mut_ptr(),
            output.len(),
        )
    };
    assert!(!short);

    let null = unsafe {
        edgy_process_frame(
            width as i32,
            height as i32,
            50,
            std::ptr::null(),
            0,
            output.as_mut_ptr(),
            output.len(),
        )
    };
    assert!(!null);

    let mut untouched = vec![7u32; width * height];
    let negative = unsafe {
        edgy_process_frame(
            -1,
            height as i32,
            50,
            input.as_ptr(),
            input.len(),
            untouched.as_mut_ptr(),
            untouched.len(),
        )
    };
    assert!(!negative);
    assert!(untouched.iter().all(|&p| p == 7));
}

#[test]
fn test_empty_views() {
    let mut pixels: Vec<u32> = Vec::new();
    assert!(matches!(
        LumaView::new(&[], 0, 4),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        PixelsMut::new(&mut pixels, 4, 0),
        Err(Error::InvalidArgument(_))
    ));
}
