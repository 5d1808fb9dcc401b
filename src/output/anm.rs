//! ANM animation container
//!
//! ```text
//! offset  size  field
//!      0     4  magic "ANM0"
//!      4     1  address mode (0 horizontal, 1 vertical, 2 linear)
//!      5     1  compression (always 0)
//!      6     2  frame count
//!      8     2  delay between frames, ms
//!     10     2  width
//!     12     2  height
//!     14     2  reserved
//! ```
//!
//! All multi-byte fields are little-endian. The frame count is only known once
//! every frame is written, so the header starts out as zeros and is patched on
//! close.

use super::raw::RawWriter;
use super::{OutputError, OutputSettings};

pub const ANM_MAGIC: &[u8; 4] = b"ANM0";
pub const ANM_HEADER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnmHeader {
    pub address_mode: u8,
    pub compression: u8,
    pub frame_count: u16,
    pub delay_ms: u16,
    pub width: u16,
    pub height: u16,
}

impl AnmHeader {
    /// Bytes reserved at the start of the file until the real header is known
    pub const PLACEHOLDER: [u8; ANM_HEADER_SIZE] = [0; ANM_HEADER_SIZE];

    /// Header for `settings` with no frames yet; fails when the geometry does
    /// not fit the 16-bit fields
    pub fn new(settings: &OutputSettings) -> Result<Self, OutputError> {
        let geometry_error = || OutputError::Geometry {
            format: "ANM",
            width: settings.width,
            height: settings.height,
        };

        Ok(Self {
            address_mode: settings.address_mode.header_id(),
            compression: 0,
            frame_count: 0,
            delay_ms: settings.delay_ms,
            width: u16::try_from(settings.width).map_err(|_| geometry_error())?,
            height: u16::try_from(settings.height).map_err(|_| geometry_error())?,
        })
    }

    pub fn finalized(self, frame_count: u16) -> Self {
        Self { frame_count, ..self }
    }

    pub fn to_bytes(&self) -> [u8; ANM_HEADER_SIZE] {
        let mut bytes = [0u8; ANM_HEADER_SIZE];
        bytes[0..4].copy_from_slice(ANM_MAGIC);
        bytes[4] = self.address_mode;
        bytes[5] = self.compression;
        bytes[6..8].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.delay_ms.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.width.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    /// Read a header back, `None` when the data is too short or the magic is wrong
    pub fn parse(data: &[u8]) -> Option<Self> {
        let header = data.get(..ANM_HEADER_SIZE)?;
        if &header[0..4] != ANM_MAGIC {
            return None;
        }

        let word = |at: usize| u16::from_le_bytes([header[at], header[at + 1]]);
        Some(Self {
            address_mode: header[4],
            compression: header[5],
            frame_count: word(6),
            delay_ms: word(8),
            width: word(10),
            height: word(12),
        })
    }
}

pub(super) struct AnmWriter {
    raw: RawWriter,
    header: AnmHeader,
}

impl AnmWriter {
    pub(super) fn create(settings: &OutputSettings) -> Result<Self, OutputError> {
        // Validate before the file is touched
        let header = AnmHeader::new(settings)?;

        let mut raw = RawWriter::create(&settings.path)?;
        raw.write_raw(&AnmHeader::PLACEHOLDER)?;
        Ok(Self { raw, header })
    }

    pub(super) fn write_frame(&mut self, bytes: &[u8], frame_size: usize) -> Result<(), OutputError> {
        self.raw.write_frame(bytes, frame_size)
    }

    pub(super) fn finish(mut self, frame_count: u16) -> Result<(), OutputError> {
        let header = self.header.finalized(frame_count);
        self.raw.write_at_start(&header.to_bytes())?;
        self.raw.finish()
    }
}
