use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use console::style;
use std::path::Path;

use monoframe::cli::Args;
use monoframe::image_processing::convert::PreprocessOptions;
use monoframe::output::{AlwaysOverwrite, OverwritePrompt, TerminalPrompt};
use monoframe::report::{conversion_label, print_report};
use monoframe::utils::{create_progress_bar, validate_inputs, warn_println};
use monoframe::{JsonMessage, ProcessingConfig, ProcessingEngine, RunOutcome};

fn main() -> Result<()> {
    let matches = Args::command().get_matches();
    let mut args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    args.load_and_merge_config(&matches)?;

    if !args.json_progress {
        println!("{}", style("monoframe - SSD1306 framebuffer converter").bold().blue());
        println!();
    }

    validate_inputs(&args)?;

    let config = ProcessingConfig {
        preprocess: PreprocessOptions {
            invert: args.invert,
            dither: args.dither,
            threshold: args.threshold,
        },
        address_mode: args.mode.into(),
        delay_ms: args.delay,
        force_header: args.header,
        verbose: args.verbose,
        json_progress: args.json_progress,
    };

    let inputs = args.input_paths();
    let output = args
        .output_path()
        .ok_or_else(|| anyhow::anyhow!("No output file given"))?;

    if config.verbose && !config.json_progress {
        print_configuration(&config, inputs.len(), output);
    }

    let mut prompt: Box<dyn OverwritePrompt> = if args.force {
        Box::new(AlwaysOverwrite)
    } else if args.json_progress {
        // No terminal to ask on; keep the existing file
        Box::new(KeepExisting)
    } else {
        Box::new(TerminalPrompt)
    };

    let engine = ProcessingEngine::new(config);
    let progress = (!args.json_progress).then(|| create_progress_bar(inputs.len() as u64));

    let outcome = engine.run(inputs, output, prompt.as_mut(), progress.as_ref());

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    match outcome? {
        RunOutcome::Cancelled => {
            if args.json_progress {
                JsonMessage::cancelled(output);
            } else {
                println!("Cancelled.");
            }
        }
        RunOutcome::Completed(summary) => {
            if args.json_progress {
                JsonMessage::Summary {
                    output_path: summary.output_path.display().to_string(),
                    format: summary.format.description().to_string(),
                    files_seen: summary.files_seen,
                    frames_written: summary.frames_written,
                    failed: summary.failed(),
                    duration_secs: summary.duration.as_secs_f64(),
                }
                .emit();
            } else {
                print_report(&summary, engine.config());
                if summary.frames_written == 0 {
                    warn_println("No frames were written");
                }
            }
        }
    }

    Ok(())
}

struct KeepExisting;

impl OverwritePrompt for KeepExisting {
    fn confirm_overwrite(&mut self, _path: &Path) -> bool {
        false
    }
}

fn print_configuration(config: &ProcessingConfig, inputs: usize, output: &Path) {
    let (label, value) = conversion_label(&config.preprocess);

    println!("{}", style("Configuration:").bold());
    println!("  Inputs: {}", inputs);
    println!("  Output: {}", output.display());
    println!("  Addressing: {}", config.address_mode.description());
    println!("  {}: {}", label, value);
    println!("  Invert: {}", config.preprocess.invert);
    println!("  Frame delay: {}ms", config.delay_ms);
    println!("  Force header: {}", config.force_header);
    println!();
}
