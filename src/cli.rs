use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter};

use crate::image_processing::binary::AddressMode;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum DitherMethod {
    /// Floyd-Steinberg error diffusion
    #[value(name = "fs")]
    #[strum(serialize = "Floyd-Steinberg")]
    #[serde(rename = "fs")]
    FloydSteinberg,
    /// Ordered dithering, 4x4 Bayer matrix
    #[value(name = "b4x4")]
    #[strum(serialize = "Bayer 4x4")]
    #[serde(rename = "b4x4")]
    Bayer4x4,
    /// Ordered dithering, 8x8 Bayer matrix
    #[value(name = "b8x8")]
    #[strum(serialize = "Bayer 8x8")]
    #[serde(rename = "b8x8")]
    Bayer8x8,
    /// Ordered dithering, 16x16 Bayer matrix
    #[value(name = "b16x16")]
    #[strum(serialize = "Bayer 16x16")]
    #[serde(rename = "b16x16")]
    Bayer16x16,
    /// Clustered-dot dithering, 6x6 matrix
    #[value(name = "c6x6")]
    #[strum(serialize = "Cluster 6x6")]
    #[serde(rename = "c6x6")]
    Cluster6x6,
    /// Clustered-dot dithering, 8x8 matrix
    #[value(name = "c8x8")]
    #[strum(serialize = "Cluster 8x8")]
    #[serde(rename = "c8x8")]
    Cluster8x8,
    /// Clustered-dot dithering, 16x16 matrix
    #[value(name = "c16x16")]
    #[strum(serialize = "Cluster 16x16")]
    #[serde(rename = "c16x16")]
    Cluster16x16,
}

/// Framebuffer layout of the target controller
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// SSD1306 horizontal addressing (8-row pages, column bytes)
    Horizontal,
    /// SSD1306 vertical addressing (column-major pages)
    Vertical,
    /// Row-major bitmap, MSB first
    Linear,
}

impl From<OutputMode> for AddressMode {
    fn from(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Horizontal => AddressMode::Horizontal,
            OutputMode::Vertical => AddressMode::Vertical,
            OutputMode::Linear => AddressMode::Linear,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "monoframe",
    version,
    about = "Image to SSD1306 framebuffer / animation converter",
    long_about = "
monoframe - Image to SSD1306 framebuffer converter

Converts one or more same-sized images into the packed 1-bit framebuffer format
used by SSD1306-class OLED controllers. The output format is picked from the
output file extension:

  .gif   animated GIF (frames are not packed)
  .anm   ANM animation: 16 byte header followed by packed frames
  other  raw packed frames, no header

Supported dithering algorithms:
  fs       Floyd-Steinberg
  b4x4     Bayer 4x4
  b8x8     Bayer 8x8
  b16x16   Bayer 16x16
  c6x6     Cluster 6x6
  c8x8     Cluster 8x8
  c16x16   Cluster 16x16

Example Usage:
  # Single image, thresholded, raw framebuffer
  monoframe logo.png logo.bin

  # Animation with Floyd-Steinberg dithering, 50ms per frame
  monoframe --dither -D 50 frame_*.png intro.anm

  # Preview the same animation as a GIF
  monoframe --dither=b8x8 -D 50 frame_*.png intro.gif"
)]
pub struct Args {
    /// Input images followed by the output file
    #[arg(required = true, num_args = 2.., value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Dither output instead of thresholding (optionally naming the algorithm)
    #[arg(
        short = 'd',
        long = "dither",
        value_name = "ALGORITHM",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "fs",
        ignore_case = true
    )]
    pub dither: Option<DitherMethod>,

    /// Threshold for non dithered output [0-255]
    #[arg(
        short = 't',
        long = "threshold",
        default_value_t = 128,
        value_name = "VALUE",
        conflicts_with = "dither"
    )]
    pub threshold: u8,

    /// Invert output
    #[arg(short = 'i', long = "invert")]
    pub invert: bool,

    /// Delay between frames in milliseconds
    #[arg(short = 'D', long = "delay", default_value_t = 100, value_name = "MS")]
    pub delay: u16,

    /// Framebuffer addressing mode
    #[arg(short = 'm', long = "mode", default_value = "horizontal", value_name = "MODE")]
    pub mode: OutputMode,

    /// Write an ANM header even if the output does not end in .anm
    #[arg(short = 'H', long = "header")]
    pub header: bool,

    /// Overwrite the output file without asking
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Emit progress as JSON lines on stdout instead of styled output
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Load default options from a JSON config file (command line wins)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Every positional path except the last
    pub fn input_paths(&self) -> &[PathBuf] {
        match self.files.split_last() {
            Some((_, inputs)) => inputs,
            None => &[],
        }
    }

    /// The last positional path
    pub fn output_path(&self) -> Option<&Path> {
        self.files.last().map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("monoframe").chain(args.iter().copied()))
    }

    #[test]
    fn test_positional_split() {
        let args = parse(&["a.png", "b.png", "out.anm"]).unwrap();
        assert_eq!(
            args.input_paths(),
            &[PathBuf::from("a.png"), PathBuf::from("b.png")]
        );
        assert_eq!(args.output_path(), Some(Path::new("out.anm")));
    }

    #[test]
    fn test_requires_input_and_output() {
        assert!(parse(&["only.png"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["in.png", "out.bin"]).unwrap();
        assert_eq!(args.dither, None);
        assert_eq!(args.threshold, 128);
        assert_eq!(args.delay, 100);
        assert_eq!(args.mode, OutputMode::Horizontal);
        assert!(!args.invert && !args.header && !args.force);
    }

    #[test]
    fn test_dither_flag() {
        // Bare flag does not swallow the following positional
        let args = parse(&["-d", "in.png", "out.bin"]).unwrap();
        assert_eq!(args.dither, Some(DitherMethod::FloydSteinberg));
        assert_eq!(args.input_paths(), &[PathBuf::from("in.png")]);

        let args = parse(&["--dither=C16X16", "in.png", "out.bin"]).unwrap();
        assert_eq!(args.dither, Some(DitherMethod::Cluster16x16));
        assert_eq!(args.dither.unwrap().to_string(), "Cluster 16x16");

        assert!(parse(&["--dither=nope", "in.png", "out.bin"]).is_err());
    }

    #[test]
    fn test_threshold_range_and_conflict() {
        assert_eq!(parse(&["-t", "0", "in.png", "out.bin"]).unwrap().threshold, 0);
        assert_eq!(parse(&["-t", "255", "in.png", "out.bin"]).unwrap().threshold, 255);
        assert!(parse(&["-t", "256", "in.png", "out.bin"]).is_err());
        assert!(parse(&["-t", "-1", "in.png", "out.bin"]).is_err());
        assert!(parse(&["-d", "-t", "10", "in.png", "out.bin"]).is_err());
    }

    #[test]
    fn test_mode_conversion() {
        let args = parse(&["--mode", "vertical", "in.png", "out.bin"]).unwrap();
        assert_eq!(AddressMode::from(args.mode), AddressMode::Vertical);
        assert_eq!(AddressMode::from(OutputMode::Linear), AddressMode::Linear);
    }
}
