use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use super::OutputError;

/// Destination of packed frames
///
/// Every frame goes out in one `write_all` straight to the sink, so whatever
/// was accepted is on disk even if the process dies before close.
pub(super) trait FrameSink: Write + Seek {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl FrameSink for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Packed frames written back to back with no header
pub(super) struct RawWriter<S: FrameSink = File> {
    sink: S,
    /// Length of the data known to be complete
    committed: u64,
}

impl RawWriter<File> {
    pub(super) fn create(path: &Path) -> Result<Self, OutputError> {
        let file = File::create(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<S: FrameSink> RawWriter<S> {
    pub(super) fn new(sink: S) -> Self {
        Self { sink, committed: 0 }
    }

    /// Append one packed frame, rejecting it before any byte hits the file if
    /// its length is off
    pub(super) fn write_frame(&mut self, bytes: &[u8], frame_size: usize) -> Result<(), OutputError> {
        if bytes.len() != frame_size {
            return Err(OutputError::FrameSize {
                expected: frame_size,
                actual: bytes.len(),
            });
        }
        self.write_raw(bytes)
    }

    /// Append bytes; a partial write is cut off again so the data always ends
    /// on a frame boundary
    pub(super) fn write_raw(&mut self, bytes: &[u8]) -> Result<(), OutputError> {
        if let Err(e) = self.sink.write_all(bytes) {
            // A failed rollback is retried by finish()
            let _ = self.rollback();
            return Err(e.into());
        }
        self.committed += bytes.len() as u64;
        Ok(())
    }

    fn rollback(&mut self) -> io::Result<()> {
        self.sink.truncate(self.committed)?;
        self.sink.seek(SeekFrom::Start(self.committed))?;
        Ok(())
    }

    /// Overwrite the first bytes of the file, leaving the write position at the end
    pub(super) fn write_at_start(&mut self, bytes: &[u8]) -> Result<(), OutputError> {
        self.sink.seek(SeekFrom::Start(0))?;
        self.sink.write_all(bytes)?;
        self.sink.seek(SeekFrom::Start(self.committed))?;
        Ok(())
    }

    pub(super) fn finish(mut self) -> Result<(), OutputError> {
        self.sink.truncate(self.committed)?;
        self.sink.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn into_inner(self) -> S {
        self.sink
    }
}
