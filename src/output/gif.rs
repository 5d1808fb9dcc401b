use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use std::fs::File;
use std::io::BufWriter;

use super::{OutputError, OutputSettings};
use crate::image_processing::convert::MonochromeBitmap;

/// Animated GIF, looping forever, every frame shown for the configured delay
pub(super) struct GifWriter {
    encoder: GifEncoder<BufWriter<File>>,
    width: u32,
    height: u32,
    delay: Delay,
}

impl GifWriter {
    pub(super) fn create(settings: &OutputSettings) -> Result<Self, OutputError> {
        if settings.width > u16::MAX as u32 || settings.height > u16::MAX as u32 {
            return Err(OutputError::Geometry {
                format: "GIF",
                width: settings.width,
                height: settings.height,
            });
        }

        let file = File::create(&settings.path).map_err(|source| OutputError::Open {
            path: settings.path.clone(),
            source,
        })?;

        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder.set_repeat(Repeat::Infinite)?;

        Ok(Self {
            encoder,
            width: settings.width,
            height: settings.height,
            delay: Delay::from_numer_denom_ms(settings.delay_ms as u32, 1),
        })
    }

    pub(super) fn write_frame(&mut self, bitmap: &MonochromeBitmap) -> Result<(), OutputError> {
        if bitmap.dimensions() != (self.width, self.height) {
            return Err(OutputError::FrameDimensions {
                width: self.width,
                height: self.height,
                actual_width: bitmap.width(),
                actual_height: bitmap.height(),
            });
        }

        let frame = Frame::from_parts(bitmap.to_rgba(), 0, 0, self.delay);
        self.encoder.encode_frame(frame)?;
        Ok(())
    }

    /// Dropping the encoder writes the GIF trailer and flushes the buffer
    pub(super) fn finish(self) -> Result<(), OutputError> {
        drop(self.encoder);
        Ok(())
    }
}
