use anyhow::Result;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

use super::dithering;
use crate::cli::DitherMethod;

const LIT: u8 = 255;
const UNLIT: u8 = 0;

/// A 1-bit-per-pixel image
///
/// Stored as an 8-bit grayscale buffer whose samples are only ever 0 (off) or
/// 255 (lit), so it can be handed straight back to the `image` crate.
#[derive(Debug, Clone, PartialEq)]
pub struct MonochromeBitmap {
    pixels: GrayImage,
}

impl MonochromeBitmap {
    pub fn from_fn(width: u32, height: u32, mut lit: impl FnMut(u32, u32) -> bool) -> Self {
        Self {
            pixels: GrayImage::from_fn(width, height, |x, y| {
                Luma([if lit(x, y) { LIT } else { UNLIT }])
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    #[inline]
    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y)[0] != UNLIT
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] != UNLIT).count()
    }

    /// Black and white RGBA copy, used for GIF frames
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            let v = self.pixels.get_pixel(x, y)[0];
            Rgba([v, v, v, 255])
        })
    }
}

/// How a decoded image gets reduced to one bit per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOptions {
    pub invert: bool,
    /// `Some` enables dithering with the given algorithm, `None` uses the threshold
    pub dither: Option<DitherMethod>,
    pub threshold: u8,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            invert: false,
            dither: None,
            threshold: 128,
        }
    }
}

/// Convert a decoded image into a monochrome bitmap
///
/// Inversion happens on the source itself. Images that are already bilevel
/// are copied through untouched; everything else is dithered or thresholded
/// depending on `options.dither`.
pub fn preprocess(img: &mut DynamicImage, options: &PreprocessOptions) -> Result<MonochromeBitmap> {
    if img.width() == 0 || img.height() == 0 {
        return Err(anyhow::anyhow!(
            "Image has no pixels ({}x{})",
            img.width(),
            img.height()
        ));
    }

    if options.invert {
        img.invert();
    }

    if let Some(bilevel) = as_bilevel(img) {
        return Ok(MonochromeBitmap { pixels: bilevel.clone() });
    }

    let grayscale = img.to_luma8();
    let pixels = match options.dither {
        Some(method) => dithering::apply_dithering(&grayscale, method),
        None => apply_threshold(&grayscale, options.threshold),
    };

    Ok(MonochromeBitmap { pixels })
}

/// Returns the grayscale buffer if the image only contains pure black and white
fn as_bilevel(img: &DynamicImage) -> Option<&GrayImage> {
    match img {
        DynamicImage::ImageLuma8(gray) if gray.pixels().all(|p| p[0] == UNLIT || p[0] == LIT) => {
            Some(gray)
        }
        _ => None,
    }
}

/// Binarize by luminance: samples at or above `threshold` are lit
fn apply_threshold(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = img.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = if pixel[0] >= threshold { LIT } else { UNLIT };
    }
    output
}
