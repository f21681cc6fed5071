//! riemersma - Dither images along a Hilbert curve
//!
//! Reads an image (PNG, JPEG, GIF, WebP), reduces it to a gray ramp or an
//! adaptive color palette with Riemersma dithering, and writes PNG or JPEG.

use anyhow::{Context, Result};
use clap::Parser;
use riemersma::{
    dither_to_gray, dither_to_palette, ColorDepth, DitherOptions, Palette, DEFAULT_HISTORY_LEN,
    DEFAULT_RATIO,
};
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "riemersma")]
#[command(version)]
#[command(about = "Riemersma dithering of images", long_about = None)]
struct Cli {
    /// Input image file (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output image file (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Weight ratio between youngest pixel and oldest pixel
    #[arg(long, default_value_t = DEFAULT_RATIO)]
    ratio: f64,

    /// The number of most recent pixel quantization errors to remember
    #[arg(long, default_value_t = DEFAULT_HISTORY_LEN)]
    size: usize,

    /// Grayscale color depth in bits (1, 2, 4 or 8)
    #[arg(short, long, default_value = "1", value_parser = parse_depth)]
    depth: ColorDepth,

    /// Dither to an adaptive color palette of this many colors (2-256)
    /// instead of grayscale
    #[arg(short, long, conflicts_with = "depth")]
    colors: Option<u16>,
}

fn parse_depth(s: &str) -> std::result::Result<ColorDepth, String> {
    let bits: u8 = s.parse().map_err(|e| format!("{e}"))?;
    ColorDepth::from_bits(bits).map_err(|e| e.to_string())
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read image from stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))
    }
}

/// PNG in, PNG out; everything else becomes JPEG unless the output file
/// name says otherwise.
fn output_format(output: &Path, input_format: Option<image::ImageFormat>) -> image::ImageFormat {
    if !is_stdio(output) {
        if let Ok(format) = image::ImageFormat::from_path(output) {
            return format;
        }
    }
    match input_format {
        Some(image::ImageFormat::Png) => image::ImageFormat::Png,
        _ => image::ImageFormat::Jpeg,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riemersma=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let data = read_input(&cli.input)?;
    let input_format = image::guess_format(&data).ok();
    let img = image::load_from_memory(&data)
        .with_context(|| format!("Failed to decode '{}'", cli.input.display()))?;
    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();
    let pixels = rgba_img.into_raw();
    let (w, h) = (width as usize, height as usize);

    let opts = DitherOptions {
        history_len: cli.size,
        ratio: cli.ratio,
    };

    let dithered = match cli.colors {
        Some(colors) => {
            let colors = colors.clamp(2, 256);
            info!(
                "Dithering {}x{} to {} colors (size={}, ratio={})",
                width, height, colors, opts.history_len, opts.ratio
            );
            let palette = Palette::from_rgba(&pixels, w, h, colors)?;
            let indices = dither_to_palette(&pixels, w, h, &palette, &opts)?;
            let rgb: Vec<u8> = indices
                .iter()
                .flat_map(|&i| {
                    let [r, g, b, _] = palette.colors()[i as usize];
                    [r, g, b]
                })
                .collect();
            let out = image::RgbImage::from_raw(width, height, rgb)
                .context("Failed to create image from dithered data")?;
            image::DynamicImage::ImageRgb8(out)
        }
        None => {
            info!(
                "Dithering {}x{} to {}-bit gray (size={}, ratio={})",
                width,
                height,
                cli.depth.bits(),
                opts.history_len,
                opts.ratio
            );
            let luma = dither_to_gray(&pixels, w, h, cli.depth, &opts)?;
            let out = image::GrayImage::from_raw(width, height, luma)
                .context("Failed to create image from dithered data")?;
            image::DynamicImage::ImageLuma8(out)
        }
    };

    let format = output_format(&cli.output, input_format);
    let mut encoded = Vec::new();
    dithered
        .write_to(&mut Cursor::new(&mut encoded), format)
        .with_context(|| format!("Failed to encode {format:?}"))?;

    if is_stdio(&cli.output) {
        io::stdout().write_all(&encoded)?;
    } else {
        fs::write(&cli.output, &encoded)
            .with_context(|| format!("Failed to write '{}'", cli.output.display()))?;
        info!(
            "Written {} bytes to '{}'",
            encoded.len(),
            cli.output.display()
        );
    }

    Ok(())
}
