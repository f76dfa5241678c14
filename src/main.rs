// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use clap::Parser;
use edgy::{
    image::{encode_jpeg, frame_size, rotate_pixels, LumaView, PixelsMut},
    EdgeDetector, FrameStats,
};
use serde_json::json;
use std::{
    error::Error,
    ffi::OsStr,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_subscriber::{EnvFilter, Layer};

mod args;

const RAW_EXTENSIONS: [&str; 5] = ["nv21", "yuv", "gray", "grey", "raw"];

/// Frames read from the input file, either raw camera frames sharing one
/// geometry or a single decoded image.
enum Input {
    Raw {
        data: Vec<u8>,
        frame_len: usize,
        width: u32,
        height: u32,
    },
    Decoded(image::GrayImage),
}

impl Input {
    fn load(args: &Args) -> Result<Self, Box<dyn Error>> {
        if is_raw(&args.input) {
            let (width, height) = args.frame_size();
            let frame_len = frame_size(width, height, args.format.into())?;
            let data = fs::read(&args.input)?;
            if frame_len == 0 || data.is_empty() || data.len() % frame_len != 0 {
                return Err(Box::from(format!(
                    "{} holds {} bytes which is not a whole number of {}x{} {:?} frames",
                    args.input.display(),
                    data.len(),
                    width,
                    height,
                    args.format
                )));
            }
            Ok(Input::Raw {
                data,
                frame_len,
                width,
                height,
            })
        } else {
            let img = image::open(&args.input)?.to_luma8();
            Ok(Input::Decoded(img))
        }
    }

    fn frame_count(&self) -> usize {
        match self {
            Input::Raw {
                data, frame_len, ..
            } => data.len() / frame_len,
            Input::Decoded(_) => 1,
        }
    }

    fn frame(&self, index: usize) -> Result<LumaView<'_>, Box<dyn Error>> {
        let view = match self {
            Input::Raw {
                data,
                frame_len,
                width,
                height,
            } => {
                let start = index * frame_len;
                LumaView::from_frame(&data[start..start + frame_len], *width, *height)?
            }
            Input::Decoded(img) => LumaView::new(img.as_raw(), img.width(), img.height())?,
        };
        Ok(view)
    }
}

fn is_raw(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| RAW_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Where processed frames go.
enum Output {
    Discard,
    Raw(BufWriter<File>),
    Jpeg { path: PathBuf, numbered: bool },
    Png { path: PathBuf, numbered: bool },
}

impl Output {
    fn open(path: Option<&Path>, frames: usize) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Output::Discard);
        };
        let numbered = frames > 1;
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        Ok(match ext.as_deref() {
            Some("jpg") | Some("jpeg") => Output::Jpeg {
                path: path.to_path_buf(),
                numbered,
            },
            Some("png") => Output::Png {
                path: path.to_path_buf(),
                numbered,
            },
            _ => Output::Raw(BufWriter::new(File::create(path)?)),
        })
    }

    fn write(
        &mut self,
        index: usize,
        pixels: &[u32],
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn Error>> {
        match self {
            Output::Discard => {}
            Output::Raw(writer) => writer.write_all(bytemuck::cast_slice(pixels))?,
            Output::Jpeg { path, numbered } => {
                let jpeg = encode_jpeg(pixels, width, height)?;
                fs::write(numbered_path(path, index, *numbered), &jpeg[..])?;
            }
            Output::Png { path, numbered } => {
                let rgba = image::RgbaImage::from_fn(width, height, |x, y| {
                    let [b, g, r, a] = pixels[(y * width + x) as usize].to_ne_bytes();
                    image::Rgba([r, g, b, a])
                });
                rgba.save(numbered_path(path, index, *numbered))?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<(), Box<dyn Error>> {
        if let Output::Raw(mut writer) = self {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Appends a frame index to the file stem when writing several frames as
/// individual images.
fn numbered_path(path: &Path, index: usize, numbered: bool) -> PathBuf {
    if !numbered {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("frame");
    let name = match path.extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{stem}-{index:04}.{ext}"),
        None => format!("{stem}-{index:04}"),
    };
    path.with_file_name(name)
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default())
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(tracy)
        .init();
}

fn report(index: usize, stats: &FrameStats, total_ms: f64) {
    let line = json!({
        "frame": index,
        "width": stats.width,
        "height": stats.height,
        "edge_pixels": stats.edge_pixels,
        "blur_ms": stats.blur_time.as_secs_f64() * 1000.0,
        "canny_ms": stats.canny_time.as_secs_f64() * 1000.0,
        "total_ms": total_ms,
    });
    println!("{line}");
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args);

    let detector = EdgeDetector::new(args.params())?;
    let input = Input::load(&args)?;
    let frames = input.frame_count();
    info!(
        "processing {} frame(s) from {} low: {} high: {}",
        frames,
        args.input.display(),
        detector.params().low_threshold,
        detector.high_threshold()
    );

    let mut output = Output::open(args.output.as_deref(), frames)?;
    let mut total_edges = 0usize;

    for index in 0..frames {
        let _span = info_span!("frame", index).entered();
        let now = Instant::now();

        let src = input.frame(index)?;
        let (width, height) = (src.width(), src.height());
        let mut pixels = vec![0u32; width as usize * height as usize];
        let mut dst = PixelsMut::new(&mut pixels, width, height)?;
        let stats = detector.process(&src, &mut dst)?;
        total_edges += stats.edge_pixels;

        let (pixels, width, height) = rotate_pixels(&pixels, width, height, args.rotation)?;
        output.write(index, &pixels, width, height)?;

        let elapsed = now.elapsed();
        debug!("frame {} done in {:?}", index, elapsed);
        if args.json {
            report(index, &stats, elapsed.as_secs_f64() * 1000.0);
        }
        if stats.edge_pixels == 0 {
            warn!("frame {} has no edges, threshold may be too high", index);
        }

        if let Some(client) = tracy_client::Client::running() {
            client.frame_mark();
        }
    }

    output.finish()?;
    info!("done, {} edge pixels over {} frame(s)", total_edges, frames);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_size_is_an_error() -> Result<(), Box<dyn Error>> {
        let path = std::env::temp_dir().join(format!("edgy-empty-{}.nv21", std::process::id()));
        fs::write(&path, [0u8; 24])?;

        let mut args = Args::parse_from([OsStr::new("edgy"), path.as_os_str()]);
        args.size = vec![0, 480];
        let empty = Input::load(&args);

        args.size = vec![4, 4];
        let whole = Input::load(&args).map(|input| input.frame_count());
        fs::remove_file(&path)?;

        assert!(empty.is_err());
        assert_eq!(whole?, 1);
        Ok(())
    }

    #[test]
    fn numbered_paths() {
        let path = Path::new("out/edges.jpg");
        assert_eq!(numbered_path(path, 3, false), PathBuf::from("out/edges.jpg"));
        assert_eq!(numbered_path(path, 3, true), PathBuf::from("out/edges-0003.jpg"));
    }
}
