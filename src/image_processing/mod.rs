pub mod binary;
pub mod convert;
pub mod dithering;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::json_output::JsonMessage;
use crate::output::{
    Container, ContainerFormat, FrameData, OpenOutcome, OutputSettings, OverwritePrompt,
};
use crate::utils::{display_name, error_println, verbose_println};

use self::binary::{pack, AddressMode, Framebuffer};
use self::convert::{preprocess, MonochromeBitmap, PreprocessOptions};

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub preprocess: PreprocessOptions,
    pub address_mode: AddressMode,
    pub delay_ms: u16,
    /// Write an ANM header even when the output name does not ask for one
    pub force_header: bool,
    pub verbose: bool,
    pub json_progress: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessOptions::default(),
            address_mode: AddressMode::Horizontal,
            delay_ms: 100,
            force_header: false,
            verbose: false,
            json_progress: false,
        }
    }
}

/// An input that did not make it into the output, and why
#[derive(Debug, Clone, PartialEq)]
pub struct FileError {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub format: ContainerFormat,
    pub address_mode: AddressMode,
    pub width: u32,
    pub height: u32,
    pub files_seen: usize,
    pub frames_written: u32,
    /// Inputs skipped before reaching the container (decode, geometry, conversion)
    pub file_errors: Vec<FileError>,
    /// Frames the container refused
    pub write_errors: Vec<FileError>,
    /// Finalizing the output failed; not tied to any input
    pub close_error: Option<String>,
    pub output_size: Option<u64>,
    pub duration: Duration,
}

impl RunSummary {
    /// Inputs that did not end up as a frame
    pub fn failed(&self) -> usize {
        self.file_errors.len() + self.write_errors.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &FileError> {
        self.file_errors.iter().chain(self.write_errors.iter())
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// The output already existed and was kept
    Cancelled,
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Container format for `output`, taking `force_header` into account
    pub fn resolve_format(&self, output: &Path) -> ContainerFormat {
        match ContainerFormat::from_path(output) {
            ContainerFormat::Raw if self.config.force_header => ContainerFormat::Anm,
            format => format,
        }
    }

    /// Convert every input into one frame of `output`
    ///
    /// The first input decides the frame geometry. Failing to read it, or to
    /// open the output, aborts the run. Any later input that cannot be decoded
    /// or has a different size is reported and skipped.
    pub fn run(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        prompt: &mut dyn OverwritePrompt,
        progress: Option<&ProgressBar>,
    ) -> Result<RunOutcome> {
        let start = Instant::now();

        let first_path = inputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("No input files given"))?;
        let first_image = load_image(first_path)?;
        let (width, height) = (first_image.width(), first_image.height());

        if width == 0 || height == 0 || width % 8 != 0 || height % 8 != 0 {
            return Err(anyhow::anyhow!(
                "{}: image size {}x{} is not a multiple of 8",
                first_path.display(),
                width,
                height
            ));
        }

        let format = self.resolve_format(output);
        let settings = OutputSettings {
            path: output.to_path_buf(),
            format,
            address_mode: self.config.address_mode,
            delay_ms: self.config.delay_ms,
            width,
            height,
        };

        self.verbose_with(
            None,
            &format!(
                "Writing {}x{} {} output to {}",
                width,
                height,
                format.description(),
                output.display()
            ),
        );

        let mut container = match Container::open(settings, prompt)
            .with_context(|| format!("Failed to open output {}", output.display()))?
        {
            OpenOutcome::Opened(container) => container,
            OpenOutcome::Cancelled => return Ok(RunOutcome::Cancelled),
        };

        let mut framebuffer = format.packs_frames().then(|| Framebuffer::new(width, height));
        let mut first_image = Some(first_image);
        let mut file_errors = Vec::new();
        let mut write_errors = Vec::new();

        for (index, path) in inputs.iter().enumerate() {
            let name = display_name(path);
            if let Some(pb) = progress {
                pb.set_message(name.clone());
            }

            let loaded = match first_image.take() {
                Some(image) => Ok(image),
                None => load_image(path),
            };

            match loaded.and_then(|mut image| self.convert_frame(&mut image, width, height)) {
                Ok(bitmap) => {
                    let written = match framebuffer.as_mut() {
                        Some(fb) => {
                            pack(self.config.address_mode, &bitmap, fb);
                            container.add_frame(FrameData::Packed(fb.as_bytes()))
                        }
                        None => container.add_frame(FrameData::Bitmap(&bitmap)),
                    };

                    match written {
                        Ok(()) => {
                            if self.config.json_progress {
                                JsonMessage::frame_written(path, container.frames_written());
                            } else {
                                let message = format!(
                                    "Frame {} written from {}",
                                    container.frames_written(),
                                    name
                                );
                                self.verbose_with(progress, &message);
                            }
                        }
                        Err(e) => {
                            let error = FileError {
                                path: path.clone(),
                                reason: format!("Failed to write frame: {}", e),
                            };
                            self.report_failure(progress, &error);
                            write_errors.push(error);
                        }
                    }
                }
                Err(e) => {
                    let error = FileError {
                        path: path.clone(),
                        reason: format!("{:#}", e),
                    };
                    self.report_failure(progress, &error);
                    file_errors.push(error);
                }
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
            if self.config.json_progress {
                JsonMessage::progress(index + 1, inputs.len(), name);
            }
        }

        let close_error = container.close().err().map(|e| {
            let error = FileError {
                path: output.to_path_buf(),
                reason: format!("Failed to finalize output: {}", e),
            };
            self.report_failure(progress, &error);
            error.reason
        });

        Ok(RunOutcome::Completed(RunSummary {
            output_path: output.to_path_buf(),
            format,
            address_mode: self.config.address_mode,
            width,
            height,
            files_seen: inputs.len(),
            frames_written: container.frames_written(),
            file_errors,
            write_errors,
            close_error,
            output_size: fs::metadata(output).ok().map(|m| m.len()),
            duration: start.elapsed(),
        }))
    }

    /// Check the geometry of one decoded input and reduce it to a bitmap
    fn convert_frame(
        &self,
        image: &mut DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<MonochromeBitmap> {
        if image.dimensions() != (width, height) {
            return Err(anyhow::anyhow!(
                "Image is {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                width,
                height
            ));
        }

        preprocess(image, &self.config.preprocess)
    }

    fn report_failure(&self, progress: Option<&ProgressBar>, error: &FileError) {
        if self.config.json_progress {
            JsonMessage::file_failed(&error.path, error.reason.clone());
            return;
        }

        let message = format!("{}: {}", error.path.display(), error.reason);
        match progress {
            Some(pb) => pb.suspend(|| error_println(&message)),
            None => error_println(&message),
        }
    }

    fn verbose_with(&self, progress: Option<&ProgressBar>, message: &str) {
        if !self.config.verbose || self.config.json_progress {
            return;
        }
        match progress {
            Some(pb) => pb.suspend(|| verbose_println(true, message)),
            None => verbose_println(true, message),
        }
    }
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to load image {}", path.display()))
}
