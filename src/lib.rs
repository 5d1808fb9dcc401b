// Library exports for reuse by other front ends
pub mod cli;
pub mod config_file;
pub mod image_processing;
pub mod json_output;
pub mod output;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use cli::{Args, DitherMethod, OutputMode};
pub use image_processing::binary::{pack, AddressMode, Framebuffer};
pub use image_processing::convert::{preprocess, MonochromeBitmap, PreprocessOptions};
pub use image_processing::{ProcessingConfig, ProcessingEngine, RunOutcome, RunSummary};
pub use json_output::JsonMessage;
pub use output::{Container, ContainerFormat, OutputError, OverwritePrompt};
