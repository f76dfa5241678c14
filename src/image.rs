// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, Result};
use core::fmt;
use image::{ImageBuffer, Luma};
use tracing::debug;
use turbojpeg::OwnedBuf;

/// Four character code identifying a pixel format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// 8-bit single channel luma plane
pub const GREY: FourCC = FourCC(*b"GREY");

/// NV21 4:2:0 YUV semi-planar format (Android camera preview default)
pub const NV21: FourCC = FourCC(*b"NV21");

/// BGRA 32-bit pixel format (8 bits per channel, with alpha)
pub const BGRA: FourCC = FourCC(*b"BGRA");

/// Validates caller supplied dimensions and returns them with the pixel
/// count.
///
/// Dimensions arrive as signed 32-bit integers at the call boundary, so both
/// zero and negative values are rejected here along with any geometry whose
/// pixel count does not fit in memory.
pub fn checked_dims(width: i32, height: i32) -> Result<(u32, u32, usize)> {
    if width <= 0 || height <= 0 {
        return Err(Error::invalid(format!(
            "dimensions must be positive, got {width}x{height}"
        )));
    }
    let (width, height) = (width as u32, height as u32);
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::invalid(format!("dimensions {width}x{height} overflow")))?;
    Ok((width, height, pixels))
}

/// Rejects an empty geometry before a view is built over it.
fn ensure_non_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!(
            "dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Returns the number of bytes a frame of the given geometry occupies.
///
/// NV21 stores a full resolution luma plane followed by one interleaved VU
/// pair for every 2x2 block of pixels, rounding odd dimensions up.
pub fn frame_size(width: u32, height: u32, format: FourCC) -> Result<usize> {
    let (w, h) = (width as usize, height as usize);
    let size = match format {
        GREY => w.checked_mul(h),
        NV21 => w.checked_mul(h).and_then(|luma| {
            let chroma = w.div_ceil(2).checked_mul(h.div_ceil(2))?.checked_mul(2)?;
            luma.checked_add(chroma)
        }),
        BGRA => w.checked_mul(h).and_then(|n| n.checked_mul(4)),
        _ => return Err(Error::invalid(format!("unsupported pixel format {format}"))),
    };
    size.ok_or_else(|| Error::invalid(format!("{width}x{height} {format} frame overflows")))
}

/// Packs one pixel so that its in-memory byte order is blue, green, red,
/// alpha.
pub const fn pack_bgra(b: u8, g: u8, r: u8, a: u8) -> u32 {
    u32::from_ne_bytes([b, g, r, a])
}

/// Replicates a grey level into the colour channels of an opaque BGRA pixel.
pub const fn gray_to_bgra(v: u8) -> u32 {
    pack_bgra(v, v, v, u8::MAX)
}

/// Borrowed, read-only view of an 8-bit luma plane.
///
/// The view wraps the caller's memory in an image header without copying
/// it. Its lifetime is tied to the borrowed buffer so the view cannot escape
/// the call that created it.
///
/// # Example
///
/// ```
/// use edgy::image::LumaView;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let frame = vec![0u8; 640 * 480 * 3 / 2];
/// let luma = LumaView::from_frame(&frame, 640, 480)?;
/// assert_eq!(luma.as_raw().len(), 640 * 480);
/// # Ok(())
/// # }
/// ```
pub struct LumaView<'a> {
    image: ImageBuffer<Luma<u8>, &'a [u8]>,
    format: FourCC,
}

impl<'a> LumaView<'a> {
    /// Wraps a bare luma plane of exactly `width * height` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        let expected = frame_size(width, height, GREY)?;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "luma plane for {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Self::wrap(data, width, height, GREY)
    }

    /// Wraps the luma plane of a complete NV21 frame, ignoring chroma.
    pub fn from_nv21(frame: &'a [u8], width: u32, height: u32) -> Result<Self> {
        let expected = frame_size(width, height, NV21)?;
        if frame.len() != expected {
            return Err(Error::invalid(format!(
                "NV21 frame for {width}x{height} needs {expected} bytes, got {}",
                frame.len()
            )));
        }
        let luma = frame_size(width, height, GREY)?;
        Self::wrap(&frame[..luma], width, height, NV21)
    }

    /// Wraps either a bare luma plane or a complete NV21 frame, chosen by
    /// the buffer length.
    pub fn from_frame(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        if data.len() == frame_size(width, height, GREY)? {
            Self::new(data, width, height)
        } else if data.len() == frame_size(width, height, NV21)? {
            Self::from_nv21(data, width, height)
        } else {
            Err(Error::invalid(format!(
                "{} bytes is neither a GREY nor an NV21 {width}x{height} frame",
                data.len()
            )))
        }
    }

    fn wrap(data: &'a [u8], width: u32, height: u32, format: FourCC) -> Result<Self> {
        ensure_non_empty(width, height)?;
        let image = ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
            Error::invalid(format!("buffer too small for {width}x{height} image"))
        })?;
        Ok(Self { image, format })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Row-major luma samples.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &ImageBuffer<Luma<u8>, &'a [u8]> {
        &self.image
    }
}

impl fmt::Display for LumaView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width(), self.height(), self.format)
    }
}

/// Borrowed, writable view of a packed BGRA pixel buffer.
pub struct PixelsMut<'a> {
    data: &'a mut [u32],
    width: u32,
    height: u32,
}

impl<'a> PixelsMut<'a> {
    /// Wraps `data`, which must hold exactly `width * height` pixels.
    pub fn new(data: &'a mut [u32], width: u32, height: u32) -> Result<Self> {
        ensure_non_empty(width, height)?;
        let expected = frame_size(width, height, GREY)?;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "output for {width}x{height} needs {expected} pixels, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Expands a single channel image into the buffer as opaque grey BGRA.
    pub fn fill_from_gray(&mut self, gray: &[u8]) -> Result<()> {
        if gray.len() != self.data.len() {
            return Err(Error::invalid(format!(
                "grey image has {} pixels, output has {}",
                gray.len(),
                self.data.len()
            )));
        }
        for (dst, &v) in self.data.iter_mut().zip(gray) {
            *dst = gray_to_bgra(v);
        }
        Ok(())
    }
}

impl fmt::Display for PixelsMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, BGRA)
    }
}

/// Clockwise rotation applied to an output frame before display.
///
/// Camera sensors are usually mounted in landscape, so portrait previews
/// need the edge map rotated by 90 degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation (0 degrees)
    #[default]
    Rotation0 = 0,
    /// Rotate 90 degrees clockwise
    Rotation90 = 90,
    /// Rotate 180 degrees
    Rotation180 = 180,
    /// Rotate 270 degrees clockwise (90 degrees counter-clockwise)
    Rotation270 = 270,
}

impl TryFrom<u32> for Rotation {
    type Error = Error;

    fn try_from(degrees: u32) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Rotation0),
            90 => Ok(Rotation::Rotation90),
            180 => Ok(Rotation::Rotation180),
            270 => Ok(Rotation::Rotation270),
            _ => Err(Error::invalid(format!(
                "rotation must be 0, 90, 180 or 270 degrees, got {degrees}"
            ))),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}°", *self as u32)
    }
}

/// Rotates a packed pixel buffer clockwise.
///
/// Returns the rotated pixels together with the new width and height, which
/// are swapped for quarter turns.
pub fn rotate_pixels(
    src: &[u32],
    width: u32,
    height: u32,
    rot: Rotation,
) -> Result<(Vec<u32>, u32, u32)> {
    let expected = frame_size(width, height, GREY)?;
    if src.len() != expected {
        return Err(Error::invalid(format!(
            "{width}x{height} frame needs {expected} pixels, got {}",
            src.len()
        )));
    }
    let (w, h) = (width as usize, height as usize);

    let (dst_w, dst_h) = match rot {
        Rotation::Rotation0 | Rotation::Rotation180 => (w, h),
        Rotation::Rotation90 | Rotation::Rotation270 => (h, w),
    };
    let mut dst = vec![0u32; src.len()];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for (x, &px) in row.iter().enumerate() {
            let (dx, dy) = match rot {
                Rotation::Rotation0 => (x, y),
                Rotation::Rotation90 => (h - 1 - y, x),
                Rotation::Rotation180 => (w - 1 - x, h - 1 - y),
                Rotation::Rotation270 => (y, w - 1 - x),
            };
            dst[dy * dst_w + dx] = px;
        }
    }
    debug!("rotated {}x{} frame by {}", width, height, rot);
    Ok((dst, dst_w as u32, dst_h as u32))
}

/// Encodes a packed BGRA frame to JPEG using turbojpeg.
///
/// # Errors
///
/// Returns an error if:
/// - The pixel count does not match `width * height`
/// - JPEG compression fails
///
/// # Example
///
/// ```no_run
/// use edgy::image::encode_jpeg;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pixels = vec![0u32; 640 * 480];
/// let jpeg = encode_jpeg(&pixels, 640, 480)?;
/// println!("Compressed to {} bytes", jpeg.len());
/// # Ok(())
/// # }
/// ```
pub fn encode_jpeg(pixels: &[u32], width: u32, height: u32) -> Result<OwnedBuf> {
    let expected = frame_size(width, height, GREY)?;
    if pixels.len() != expected {
        return Err(Error::invalid(format!(
            "{width}x{height} frame needs {expected} pixels, got {}",
            pixels.len()
        )));
    }

    let img = turbojpeg::Image {
        width: width as usize,
        height: height as usize,
        format: turbojpeg::PixelFormat::BGRA,
        pixels: bytemuck::cast_slice::<u32, u8>(pixels),
        pitch: width as usize * 4,
    };

    Ok(turbojpeg::compress(img, 100, turbojpeg::Subsamp::Sub2x2)?)
}
