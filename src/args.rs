// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgy::{
    image::{FourCC, Rotation, GREY, NV21},
    EdgeParams,
};
use std::path::PathBuf;

/// Layout of raw input frames.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum FrameFormat {
    /// NV21 4:2:0 semi-planar, as delivered by Android camera previews
    Nv21,
    /// Bare 8-bit luma plane
    Grey,
}

impl From<FrameFormat> for FourCC {
    fn from(format: FrameFormat) -> Self {
        match format {
            FrameFormat::Nv21 => NV21,
            FrameFormat::Grey => GREY,
        }
    }
}

/// Command-line arguments for the Edgy frame processor.
///
/// Raw inputs are treated as a sequence of back to back frames of the given
/// size and format; other files are decoded as images. Arguments can be
/// specified via command line or environment variables.
///
/// # Example
///
/// ```bash
/// # Replay a capture of 640x480 NV21 preview frames
/// edgy capture.nv21 --size "640 480" --threshold 40 -o edges.jpg
///
/// # Via environment variables
/// export THRESHOLD=80
/// edgy photo.png -o edges.png
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input frames (.nv21, .yuv, .gray, .grey, .raw) or an image file
    pub input: PathBuf,

    /// Output path: .jpg/.jpeg, .png, or anything else for raw BGRA frames
    #[arg(short, long, env = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Raw frame resolution in pixels (width height)
    #[arg(
        long,
        env = "FRAME_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub size: Vec<u32>,

    /// Raw frame pixel format
    #[arg(long, env = "FRAME_FORMAT", default_value = "nv21", value_enum)]
    pub format: FrameFormat,

    /// Canny low threshold
    #[arg(short, long, env = "THRESHOLD", default_value = "50")]
    pub threshold: i32,

    /// Ratio of the Canny high threshold to the low threshold
    #[arg(long, env = "RATIO", default_value = "3")]
    pub ratio: i32,

    /// Gaussian blur kernel size (odd)
    #[arg(long, env = "BLUR_SIZE", default_value = "3")]
    pub blur_size: u32,

    /// Clockwise rotation applied to the output (0, 90, 180 or 270)
    #[arg(long, env = "ROTATION", default_value = "0", value_parser = parse_rotation)]
    pub rotation: Rotation,

    /// Print a JSON report line for every frame
    #[arg(long)]
    pub json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn params(&self) -> EdgeParams {
        EdgeParams {
            ratio: self.ratio,
            blur_size: self.blur_size,
            ..EdgeParams::new(self.threshold)
        }
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.size[0], self.size[1])
    }
}

fn parse_rotation(s: &str) -> Result<Rotation, String> {
    let degrees: u32 = s.parse().map_err(|e| format!("{e}"))?;
    Rotation::try_from(degrees).map_err(|e| e.to_string())
}
