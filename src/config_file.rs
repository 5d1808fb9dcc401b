use crate::cli::{Args, DitherMethod, OutputMode};
use anyhow::{Context, Result};
use clap::parser::ValueSource;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Defaults loaded with `--config`, every field optional
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub dither: Option<DitherMethod>,
    pub threshold: Option<u8>,
    pub invert: Option<bool>,
    pub delay: Option<u16>,
    pub mode: Option<OutputMode>,
    pub header: Option<bool>,
    pub force: Option<bool>,
    pub verbose: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self, matches: &ArgMatches) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let config = ConfigFile::load(&config_path)?;
            self.merge_from_config(config, matches);

            crate::utils::verbose_println(
                self.verbose && !self.json_progress,
                &format!("Loaded configuration from: {:?}", config_path),
            );
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: ConfigFile, matches: &ArgMatches) {
        // An explicit threshold on the command line also rules out a configured
        // dither method, the two are mutually exclusive
        if !from_command_line(matches, "dither") && !from_command_line(matches, "threshold") {
            if let Some(method) = config.dither {
                self.dither = Some(method);
            }
        }

        if !from_command_line(matches, "threshold") && !from_command_line(matches, "dither") {
            if let Some(threshold) = config.threshold {
                self.threshold = threshold;
            }
        }

        if !from_command_line(matches, "delay") {
            if let Some(delay) = config.delay {
                self.delay = delay;
            }
        }

        if !from_command_line(matches, "mode") {
            if let Some(mode) = config.mode {
                self.mode = mode;
            }
        }

        // Boolean flags - only apply if currently false (default)
        if !self.invert {
            self.invert = config.invert.unwrap_or(false);
        }

        if !self.header {
            self.header = config.header.unwrap_or(false);
        }

        if !self.force {
            self.force = config.force.unwrap_or(false);
        }

        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }
    }
}
