mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, Commands, Target};
use imgpress::batch::{
    collect_inputs, BatchConfig, BatchProcessor, BatchReport, ConflictPolicy, FileOutcome,
};
use imgpress::conflict::check_conflicts;
use imgpress::constants::{
    DEFAULT_QUALITY, ERROR_PREFIX, INFO_PREFIX, ORIGINAL_SIZE_PREFIX, OUTPUT_SIZE_PREFIX,
    PROGRESS_BAR_TEMPLATE, REDUCTION_PREFIX, SKIPPED_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX,
};
use imgpress::error::ProcessingError;
use imgpress::formats::{FormatCapabilities, OutputSelection};
use imgpress::info::{get_image_info, print_image_info};
use imgpress::logger;
use imgpress::metadata::{get_exif_info, strip_metadata};
use imgpress::processing::QualityPreset;
use imgpress::utils::{clamp_quality, format_file_size, format_modified_time};
use imgpress::validation::validate_input_path;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);
    let capabilities = FormatCapabilities::detect();

    match args.command {
        Commands::Process {
            target,
            quality,
            preset,
            strip_metadata,
            on_conflict,
            threads,
            json,
        } => {
            let quality = match (preset, quality) {
                (Some(preset), _) => QualityPreset::from(preset).quality(),
                (None, Some(q)) => clamp_quality(q),
                (None, None) => DEFAULT_QUALITY,
            };
            let files = resolve_inputs(&target, &capabilities)?;

            let mut config = BatchConfig::new(&target.output);
            config.selection = target.format.into();
            config.quality = quality;
            config.remove_metadata = strip_metadata;
            config.conflict_policy = ConflictPolicy::uniform(on_conflict.into());
            config.threads = threads.unwrap_or(0);

            run_batch(config, &capabilities, &files, json, args.quiet)?;
        }
        Commands::Conflicts { target, json } => {
            let files = resolve_inputs(&target, &capabilities)?;
            let conflicts = check_conflicts(&files, &target.output, target.format.into());

            if json {
                println!("{}", serde_json::to_string_pretty(&conflicts)?);
            } else if conflicts.is_empty() {
                println!("{} No conflicts in {:?}", SUCCESS_PREFIX, target.output);
            } else {
                println!(
                    "{}  {} of {} outputs already exist:",
                    WARNING_PREFIX,
                    conflicts.len(),
                    files.len()
                );
                for record in &conflicts {
                    let detail = if record.metadata_readable {
                        format!(
                            "{}, modified {}",
                            format_file_size(record.existing_size_bytes),
                            format_modified_time(record.existing_modified_time)
                        )
                    } else {
                        "size and date unreadable".to_string()
                    };
                    println!(
                        "  {} ← {:?} ({})",
                        record.output_filename, record.input_path, detail
                    );
                }
            }
        }
        Commands::Formats => {
            println!("{} Output formats:", INFO_PREFIX);
            for format in capabilities.supported_output_formats() {
                println!("  {}", format);
            }
            if !capabilities.is_avif_supported() {
                println!("{}  {}", WARNING_PREFIX, ProcessingError::AvifEncoderUnavailable);
            }
        }
        Commands::Exif { input, json } => {
            validate_input_path(&input)?;
            let tags = get_exif_info(&input);

            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else if tags.is_empty() {
                println!("{} No EXIF metadata in {:?}", INFO_PREFIX, input);
            } else {
                println!("{} EXIF metadata for {:?}:", INFO_PREFIX, input);
                for (tag, value) in &tags {
                    println!("  {}: {}", tag, value);
                }
            }
        }
        Commands::Strip { input, output } => {
            validate_input_path(&input)?;
            let (ok, message) = strip_metadata(&input, &output);
            if !ok {
                bail!(message);
            }
            println!("{} {}: {:?}", SUCCESS_PREFIX, message, output);
        }
        Commands::Info { input, json } => {
            validate_input_path(&input)?;
            let info = get_image_info(&input)
                .with_context(|| format!("Failed to read image info for {:?}", input))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_image_info(&info);
            }
        }
    }

    Ok(())
}

fn resolve_inputs(target: &Target, capabilities: &FormatCapabilities) -> Result<Vec<PathBuf>> {
    let selection: OutputSelection = target.format.into();
    if !capabilities.supports(selection) {
        bail!(ProcessingError::AvifEncoderUnavailable);
    }
    collect_inputs(&target.inputs, target.recursive).context("Failed to collect input files")
}

fn run_batch(
    config: BatchConfig,
    capabilities: &FormatCapabilities,
    files: &[PathBuf],
    json: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let output_dir = config.output_dir.clone();
    let selection = config.selection;

    let progress = if json || quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(ProgressStyle::with_template(PROGRESS_BAR_TEMPLATE)?.progress_chars("#>-"));
        bar
    };

    let processor = BatchProcessor::new(config, capabilities);
    let report = processor
        .run(files, |file| {
            progress.set_message(display_name(&file.input_path));
            progress.inc(1);
        })
        .with_context(|| format!("Cannot process into {:?}", output_dir))?;
    progress.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, selection, quiet);
        println!("  ⏱️  Total time: {:?}", start_time.elapsed());
    }

    if report.failed > 0 {
        bail!("{} of {} files failed", report.failed, report.files.len());
    }
    Ok(())
}

fn print_report(report: &BatchReport, selection: OutputSelection, quiet: bool) {
    for file in &report.files {
        let name = display_name(&file.input_path);
        match &file.outcome {
            FileOutcome::Processed(result) if result.success => {
                if !quiet {
                    println!("{} {} → {}", SUCCESS_PREFIX, name, result.message);
                }
            }
            FileOutcome::Processed(result) => {
                eprintln!("{} {} → {}", ERROR_PREFIX, name, result.message)
            }
            FileOutcome::Skipped { existing_path } => {
                if !quiet {
                    println!(
                        "{}  {} → skipped, {:?} exists",
                        SKIPPED_PREFIX, name, existing_path
                    );
                }
            }
            FileOutcome::Cancelled => println!("{}  {} → cancelled", WARNING_PREFIX, name),
        }
    }

    println!("\n📊 Batch Summary ({}):", selection);
    println!("  {} Succeeded: {}", SUCCESS_PREFIX, report.succeeded);
    println!("  {} Failed: {}", ERROR_PREFIX, report.failed);
    println!("  {}  Skipped: {}", SKIPPED_PREFIX, report.skipped);
    if report.cancelled > 0 {
        println!("  {}  Cancelled: {}", WARNING_PREFIX, report.cancelled);
    }
    println!(
        "  {} {}",
        ORIGINAL_SIZE_PREFIX,
        format_file_size(report.total_original_bytes)
    );
    println!(
        "  {} {}",
        OUTPUT_SIZE_PREFIX,
        format_file_size(report.total_output_bytes)
    );
    println!("  {} {:.1}%", REDUCTION_PREFIX, report.overall_reduction_pct);
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
