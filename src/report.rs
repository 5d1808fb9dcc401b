/// End of run statistics
///
/// Builds the table printed after every completed run, followed by the list of
/// inputs that did not make it into the output.
use console::style;
use prettytable::{format, Cell, Row, Table};

use crate::image_processing::convert::PreprocessOptions;
use crate::image_processing::{ProcessingConfig, RunSummary};
use crate::utils::{format_duration, format_size};

/// "Dithering: <name>" or "Threshold: <n>"
pub fn conversion_label(options: &PreprocessOptions) -> (String, String) {
    match options.dither {
        Some(method) => ("Dithering".to_string(), method.to_string()),
        None => ("Threshold".to_string(), options.threshold.to_string()),
    }
}

fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}

/// Label/value rows shown in the statistics table
pub fn stats_rows(summary: &RunSummary, config: &ProcessingConfig) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Output".to_string(), summary.output_path.display().to_string()),
        ("Format".to_string(), summary.format.description().to_string()),
        ("Header".to_string(), yes_no(summary.format.has_header())),
        (
            "Size".to_string(),
            format!("{}x{}", summary.width, summary.height),
        ),
    ];

    if summary.format.packs_frames() {
        rows.push((
            "Addressing".to_string(),
            summary.address_mode.description().to_string(),
        ));
    }

    rows.push((
        "Frames written".to_string(),
        format!("{} / {}", summary.frames_written, summary.files_seen),
    ));
    rows.push(("Inverted".to_string(), yes_no(config.preprocess.invert)));
    rows.push(conversion_label(&config.preprocess));

    if summary.frames_written > 1 {
        rows.push(("Frame delay".to_string(), format!("{}ms", config.delay_ms)));
    }

    if let Some(bytes) = summary.output_size {
        rows.push(("File size".to_string(), format_size(bytes)));
    }
    rows.push(("Duration".to_string(), format_duration(summary.duration)));
    rows
}

pub fn print_report(summary: &RunSummary, config: &ProcessingConfig) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    for (label, value) in stats_rows(summary, config) {
        table.add_row(Row::new(vec![Cell::new(&label), Cell::new(&value)]));
    }

    println!();
    table.printstd();

    if let Some(reason) = &summary.close_error {
        println!(
            "{}",
            style(format!("✗ {}: {}", summary.output_path.display(), reason))
                .red()
                .bold()
        );
    }

    if summary.failed() == 0 {
        if summary.close_error.is_none() {
            println!("{}", style("✓ All frames written").green().bold());
        }
        return;
    }

    println!();
    let mut errors = Table::new();
    errors.set_format(*format::consts::FORMAT_BOX_CHARS);
    errors.add_row(Row::new(vec![Cell::new("File"), Cell::new("Reason")]));
    for error in summary.errors() {
        errors.add_row(Row::new(vec![
            Cell::new(&error.path.display().to_string()),
            Cell::new(&error.reason),
        ]));
    }
    errors.printstd();

    println!("{}", style(failure_notice(summary)).yellow().bold());
}

/// Tally line under the failed-file table
pub fn failure_notice(summary: &RunSummary) -> String {
    format!(
        "⚠ {} of {} files could not be written",
        summary.failed(),
        summary.files_seen
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DitherMethod;
    use crate::image_processing::binary::AddressMode;
    use crate::image_processing::FileError;
    use crate::output::ContainerFormat;
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary(format: ContainerFormat, frames: u32) -> RunSummary {
        RunSummary {
            output_path: PathBuf::from("out.anm"),
            format,
            address_mode: AddressMode::Horizontal,
            width: 128,
            height: 64,
            files_seen: 3,
            frames_written: frames,
            file_errors: vec![FileError {
                path: PathBuf::from("c.png"),
                reason: "Image is 32x32, expected 128x64".to_string(),
            }],
            write_errors: Vec::new(),
            close_error: None,
            output_size: Some(16 + 1024 * frames as u64),
            duration: Duration::from_millis(12),
        }
    }

    fn value<'a>(rows: &'a [(String, String)], label: &str) -> Option<&'a str> {
        rows.iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_stats_rows() {
        let config = ProcessingConfig {
            delay_ms: 40,
            ..Default::default()
        };
        let rows = stats_rows(&summary(ContainerFormat::Anm, 2), &config);

        assert_eq!(value(&rows, "Format"), Some("ANM"));
        assert_eq!(value(&rows, "Header"), Some("Yes"));
        assert_eq!(value(&rows, "Size"), Some("128x64"));
        assert_eq!(value(&rows, "Frames written"), Some("2 / 3"));
        assert_eq!(value(&rows, "Inverted"), Some("No"));
        assert_eq!(value(&rows, "Threshold"), Some("128"));
        assert_eq!(value(&rows, "Frame delay"), Some("40ms"));
        assert_eq!(value(&rows, "File size"), Some("2.0 KiB"));
    }

    #[test]
    fn test_single_frame_gif_rows() {
        let config = ProcessingConfig {
            preprocess: PreprocessOptions {
                dither: Some(DitherMethod::Cluster8x8),
                invert: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let rows = stats_rows(&summary(ContainerFormat::Gif, 1), &config);

        assert_eq!(value(&rows, "Header"), Some("No"));
        assert_eq!(value(&rows, "Dithering"), Some("Cluster 8x8"));
        assert_eq!(value(&rows, "Inverted"), Some("Yes"));
        assert_eq!(value(&rows, "Frame delay"), None);
        assert_eq!(value(&rows, "Addressing"), None);
    }

    #[test]
    fn test_close_failure_is_not_a_file_failure() {
        let mut summary = summary(ContainerFormat::Anm, 2);
        summary.close_error = Some("Failed to finalize output: disk full".to_string());

        assert_eq!(summary.failed(), 1);
        assert_eq!(failure_notice(&summary), "⚠ 1 of 3 files could not be written");
        assert!(summary.errors().all(|e| e.path != summary.output_path));
    }
}
