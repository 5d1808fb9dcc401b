//! Frame containers
//!
//! A run writes all of its frames into exactly one [`Container`]. The concrete
//! backend is chosen from the output file name:
//!
//! - `.gif`: animated GIF, frames are bitmaps
//! - `.anm`: ANM animation, 16 byte header (back-patched on close) + packed frames
//! - anything else: raw packed frames, no header
//!
//! Lifecycle: [`Container::open`] → [`Container::add_frame`]* → [`Container::close`].
//! Closing is idempotent and also happens on drop.

mod anm;
mod gif;
mod raw;

pub use anm::{AnmHeader, ANM_HEADER_SIZE, ANM_MAGIC};

use console::Term;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::image_processing::binary::{packed_size, AddressMode};
use crate::image_processing::convert::MonochromeBitmap;

use self::anm::AnmWriter;
use self::gif::GifWriter;
use self::raw::RawWriter;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to open \"{}\" for write: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{width}x{height} cannot be stored in {format} output (max 65535x65535)")]
    Geometry {
        format: &'static str,
        width: u32,
        height: u32,
    },

    #[error("Frame is {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Frame is {actual_width}x{actual_height}, expected {width}x{height}")]
    FrameDimensions {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("{format} output does not accept {kind} frames")]
    FrameKind {
        format: &'static str,
        kind: &'static str,
    },

    #[error("ANM output is limited to {} frames", u16::MAX)]
    TooManyFrames,

    #[error("Output is already closed")]
    Closed,

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("GIF encoding failed: {0}")]
    Gif(#[from] image::ImageError),
}

/// Output backend, resolved from the output file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Raw,
    Anm,
    Gif,
}

impl ContainerFormat {
    /// Pick the backend from the last four characters of the path, ignoring case
    pub fn from_path(path: &Path) -> Self {
        if has_suffix(path, ".gif") {
            ContainerFormat::Gif
        } else if has_suffix(path, ".anm") {
            ContainerFormat::Anm
        } else {
            ContainerFormat::Raw
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ContainerFormat::Raw => "BIN",
            ContainerFormat::Anm => "ANM",
            ContainerFormat::Gif => "GIF",
        }
    }

    /// GIF frames are handed over as bitmaps, everything else gets packed bytes
    pub fn packs_frames(self) -> bool {
        !matches!(self, ContainerFormat::Gif)
    }

    pub fn has_header(self) -> bool {
        matches!(self, ContainerFormat::Anm)
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    let name = path.as_os_str().to_string_lossy();
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

pub fn is_output_gif(path: &Path) -> bool {
    ContainerFormat::from_path(path) == ContainerFormat::Gif
}

pub fn is_output_anm(path: &Path) -> bool {
    ContainerFormat::from_path(path) == ContainerFormat::Anm
}

/// Everything a backend needs to know when it is opened
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub path: PathBuf,
    pub format: ContainerFormat,
    pub address_mode: AddressMode,
    pub delay_ms: u16,
    pub width: u32,
    pub height: u32,
}

impl OutputSettings {
    /// Bytes per packed frame
    pub fn frame_size(&self) -> usize {
        packed_size(self.width, self.height)
    }
}

/// Asked before an existing output file is replaced
pub trait OverwritePrompt {
    fn confirm_overwrite(&mut self, path: &Path) -> bool;
}

/// Interactive Y/N question: asked on stderr, answered on stdin
///
/// Redirecting stdout does not affect it. When stdin is closed before an
/// answer arrives, that is said explicitly and the file is kept.
pub struct TerminalPrompt;

impl OverwritePrompt for TerminalPrompt {
    fn confirm_overwrite(&mut self, path: &Path) -> bool {
        let stdin = io::stdin();
        ask_overwrite(path, &mut stdin.lock(), &mut Term::stderr())
    }
}

/// Write the question to `output` and block on one line of `input`
fn ask_overwrite(path: &Path, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    let question = format!("File \"{}\" already exists. Overwrite? (Y/N) ", path.display());
    if output.write_all(question.as_bytes()).and_then(|_| output.flush()).is_err() {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) => {
            let _ = writeln!(output, "\nNo answer on stdin, keeping the existing file.");
            false
        }
        Ok(_) => answer.trim_start().starts_with(['y', 'Y']),
        Err(e) => {
            let _ = writeln!(output, "\nCould not read an answer ({}), keeping the existing file.", e);
            false
        }
    }
}

/// Used with `--force`: never asks
pub struct AlwaysOverwrite;

impl OverwritePrompt for AlwaysOverwrite {
    fn confirm_overwrite(&mut self, _path: &Path) -> bool {
        true
    }
}

/// One frame handed to [`Container::add_frame`]
#[derive(Debug, Clone, Copy)]
pub enum FrameData<'a> {
    /// Packed framebuffer bytes (Raw and ANM)
    Packed(&'a [u8]),
    /// Unpacked bitmap (GIF)
    Bitmap(&'a MonochromeBitmap),
}

impl FrameData<'_> {
    fn kind(&self) -> &'static str {
        match self {
            FrameData::Packed(_) => "packed",
            FrameData::Bitmap(_) => "bitmap",
        }
    }
}

pub enum OpenOutcome {
    Opened(Container),
    /// The output existed and the user chose not to overwrite it
    Cancelled,
}

enum Backend {
    Raw(RawWriter),
    Anm(AnmWriter),
    Gif(GifWriter),
}

enum ContainerState {
    Open(Backend),
    Closed,
}

/// The single output of a run
pub struct Container {
    settings: OutputSettings,
    state: ContainerState,
    frames_written: u32,
}

impl Container {
    pub fn open(
        settings: OutputSettings,
        prompt: &mut dyn OverwritePrompt,
    ) -> Result<OpenOutcome, OutputError> {
        if settings.path.exists() && !prompt.confirm_overwrite(&settings.path) {
            return Ok(OpenOutcome::Cancelled);
        }

        let backend = match settings.format {
            ContainerFormat::Raw => Backend::Raw(RawWriter::create(&settings.path)?),
            ContainerFormat::Anm => Backend::Anm(AnmWriter::create(&settings)?),
            ContainerFormat::Gif => Backend::Gif(GifWriter::create(&settings)?),
        };

        Ok(OpenOutcome::Opened(Container {
            settings,
            state: ContainerState::Open(backend),
            frames_written: 0,
        }))
    }

    /// Append one frame; the frame counter only moves when the write succeeded
    pub fn add_frame(&mut self, frame: FrameData<'_>) -> Result<(), OutputError> {
        let backend = match &mut self.state {
            ContainerState::Open(backend) => backend,
            ContainerState::Closed => return Err(OutputError::Closed),
        };

        match (backend, frame) {
            (Backend::Raw(writer), FrameData::Packed(bytes)) => {
                writer.write_frame(bytes, self.settings.frame_size())?
            }
            (Backend::Anm(writer), FrameData::Packed(bytes)) => {
                if self.frames_written >= u16::MAX as u32 {
                    return Err(OutputError::TooManyFrames);
                }
                writer.write_frame(bytes, self.settings.frame_size())?
            }
            (Backend::Gif(writer), FrameData::Bitmap(bitmap)) => writer.write_frame(bitmap)?,
            (_, frame) => {
                return Err(OutputError::FrameKind {
                    format: self.settings.format.description(),
                    kind: frame.kind(),
                })
            }
        }

        self.frames_written += 1;
        Ok(())
    }

    /// Finalize the output; calling it again is a no-op
    pub fn close(&mut self) -> Result<(), OutputError> {
        match std::mem::replace(&mut self.state, ContainerState::Closed) {
            ContainerState::Closed => Ok(()),
            ContainerState::Open(Backend::Raw(writer)) => writer.finish(),
            ContainerState::Open(Backend::Anm(writer)) => {
                // add_frame caps ANM output at u16::MAX frames
                writer.finish(self.frames_written as u16)
            }
            ContainerState::Open(Backend::Gif(writer)) => writer.finish(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ContainerState::Open(_))
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
