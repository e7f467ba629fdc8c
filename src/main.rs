use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::{Path, PathBuf};
use std::time::Instant;

mod cli;
mod config_file;
mod json_output;
mod layout;
mod metadata;
mod utils;

use cli::{Args, LayoutPolicyArg};
use json_output::{JsonMessage, LabelOutput, LayoutOutput};
use layout::{compute_layout, font_size_points, wrap_name, LayoutPolicy};
use metadata::{extract, report, ReconcileConfig, ReconcileEngine};
use utils::{create_progress_bar, format_duration, validate_inputs, verbose_println, warn_println};

impl From<LayoutPolicyArg> for LayoutPolicy {
    fn from(arg: LayoutPolicyArg) -> Self {
        match arg {
            LayoutPolicyArg::BottomClamp => LayoutPolicy::BottomClamp,
            LayoutPolicyArg::InflateForOverlap => LayoutPolicy::InflateForOverlap,
        }
    }
}

/// Find the sidecar for a layout target: JSON files are used directly,
/// image files look for "<file>.json" next to them, then "<stem>.json".
fn resolve_sidecar_path(target: &Path) -> Result<PathBuf> {
    if utils::get_file_extension(target).as_deref() == Some("json") {
        return Ok(target.to_path_buf());
    }

    let appended = PathBuf::from(format!("{}.json", target.display()));
    if appended.is_file() {
        return Ok(appended);
    }

    let replaced = target.with_extension("json");
    if replaced.is_file() {
        return Ok(replaced);
    }

    Err(anyhow::anyhow!(
        "No sidecar found for {}. Expected {} or {}",
        target.display(),
        appended.display(),
        replaced.display()
    ))
}

/// Handle layout mode - compute label placements for a single image
fn handle_layout(target: &Path, args: &Args) -> Result<()> {
    let sidecar = resolve_sidecar_path(target)?;
    verbose_println(
        args.verbose,
        &format!("Using sidecar: {}", sidecar.display()),
    );

    let metadata = extract::load_sidecar(&sidecar)?;

    let (width, height) = match (metadata.image_width, metadata.image_height) {
        (Some(w), Some(h)) => (w, h),
        _ => args
            .parse_image_size()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No pixel dimensions available for {}. Pass --image-size WIDTHxHEIGHT",
                    metadata.path.display()
                )
            })?,
    };

    if let (Some(ow), Some(oh)) = (metadata.original_width, metadata.original_height) {
        verbose_println(
            args.verbose,
            &format!(
                "Regions rebased from pre-crop frame {}x{} into current {}x{}",
                ow, oh, width, height
            ),
        );
    }

    let mut faces = extract::to_face_regions(&metadata, width as f64, height as f64);
    // Descending name order so later-placed labels stack on top when the
    // host renders them as separate layers.
    layout::sort_for_stacking(&mut faces);

    if faces.is_empty() {
        println!(
            "{}",
            style("No complete face regions to lay out").yellow()
        );
        return Ok(());
    }

    let solved = compute_layout(
        &faces,
        args.vertical_displacement,
        width as f64,
        height as f64,
        args.layout_policy.clone().into(),
    );

    let Some(solved) = solved else {
        println!(
            "{}",
            style("No layout: label rectangle degenerated, image skipped").yellow()
        );
        return Ok(());
    };

    if solved.residual_overlap && args.verbose {
        warn_println("Labels still overlap after deflation; placements kept as-is");
    }

    let output = LayoutOutput {
        image: metadata.path.display().to_string(),
        image_width: width,
        image_height: height,
        label_width: solved.rect.width,
        label_height: solved.rect.height,
        font_size_points: font_size_points(&solved.rect, args.pointsize as f64, args.chars_per_face),
        residual_overlap: solved.residual_overlap,
        labels: solved
            .placements
            .iter()
            .map(|p| LabelOutput {
                name: p.name.clone(),
                lines: wrap_name(&p.name, args.chars_per_face),
                left: p.left,
                top: p.top,
                right: p.right,
                bottom: p.bottom,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = Args::parse();
    args.load_and_merge_config()?;

    // Print banner (suppressed in JSON mode, where stdout is machine-read)
    if !args.json_progress {
        println!(
            "{}",
            style("Facetag Processor - Face Region Reconciler")
                .bold()
                .blue()
        );
        println!(
            "{}",
            style("MWG / Microsoft region and keyword consistency checks").dim()
        );
        println!();
    }

    validate_inputs(&args)?;

    // Handle layout mode (batch settings don't apply here)
    if let Some(target) = args.layout_target.clone() {
        return handle_layout(&target, &args);
    }

    // Create checking configuration
    let config = ReconcileConfig {
        extensions: args.extensions(),
        verbose: args.verbose && !args.json_progress,
        parallel_jobs: if args.jobs == 0 {
            num_cpus::get()
        } else {
            args.jobs
        },
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Parallel jobs: {}", config.parallel_jobs);
        println!("  Extensions: {:?}", config.extensions);
        println!("  Vertical displacement: {}", args.vertical_displacement);
        println!("  Font size setting: {}", args.pointsize);
        println!("  Chars per face: {}", args.chars_per_face);
        println!("  Report file: {}", args.report_name);
        println!("  Script file: {}", args.script_name);
        if args.dry_run {
            println!("  Dry run mode: enabled (no files will be written)");
        }
        println!();
    }

    // Create output directory (skip in dry-run mode)
    if !args.dry_run {
        std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;
    } else {
        verbose_println(
            config.verbose,
            "Dry run mode: skipping output directory creation",
        );
    }

    let dry_run_mode = args.dry_run;
    let json_mode = args.json_progress;

    // Initialize checking engine
    let engine = ReconcileEngine::new(config)?;

    // Discover all sidecars
    let sidecar_files = engine.discover_sidecars(&args.input_paths)?;
    if sidecar_files.is_empty() {
        if json_mode {
            JsonMessage::summary(0, 0, 0, 0, 0, start_time.elapsed().as_secs_f64());
        } else {
            println!(
                "{}",
                style("No sidecar files found with specified extensions").red()
            );
        }
        return Ok(());
    }

    let total = sidecar_files.len();
    let progress = if json_mode {
        None
    } else {
        let pb = create_progress_bar(total as u64);
        pb.set_message("Checking sidecars");
        Some(pb)
    };

    // Check all sidecars in parallel
    let results = engine.process_batch(&sidecar_files, |count| {
        if let Some(pb) = &progress {
            pb.set_position(count as u64);
        }
        if json_mode {
            JsonMessage::progress(count, total, "Checking sidecars");
        }
    });

    if let Some(pb) = &progress {
        pb.finish_with_message("✓ Checking complete");
        println!();
    }

    // Partition outcomes from per-file failures
    let mut outcomes = Vec::new();
    let mut failures: Vec<(PathBuf, String)> = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(outcome) => {
                if json_mode {
                    JsonMessage::file_checked(
                        &outcome.image,
                        outcome.reconciliation.report.len(),
                        outcome.reconciliation.error_count(),
                        outcome.reconciliation.warning_count(),
                        outcome.reconciliation.command_count(),
                    );
                }
                outcomes.push(outcome);
            }
            Err(e) => {
                let sidecar = sidecar_files
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from("unknown"));
                if json_mode {
                    JsonMessage::file_failed(&sidecar, e.to_string());
                }
                failures.push((sidecar, format!("{:#}", e)));
            }
        }
    }

    // Persist report and correction script
    let written = if dry_run_mode {
        None
    } else {
        Some(report::write_outputs(
            &args.output_dir,
            &args.report_name,
            &args.script_name,
            &outcomes,
        )?)
    };

    let totals = report::batch_totals(&outcomes);
    let total_time = start_time.elapsed();

    if json_mode {
        JsonMessage::summary(
            total,
            outcomes.len(),
            failures.len(),
            totals.findings,
            totals.commands,
            total_time.as_secs_f64(),
        );
        return Ok(());
    }

    report::print_summary_table(&outcomes);

    // Print results summary
    let clean = outcomes
        .iter()
        .filter(|o| o.reconciliation.is_clean())
        .count();
    let header = if dry_run_mode {
        style("Dry Run Results Summary:").bold().cyan()
    } else {
        style("Results Summary:").bold().green()
    };
    println!("{}", header);
    println!("  Sidecars checked: {}", style(outcomes.len()).bold().green());
    if !failures.is_empty() {
        println!("  Failed to load: {}", style(failures.len()).bold().red());
    }
    println!("  Clean files: {}", style(clean).bold().green());
    if totals.findings > 0 {
        println!("  Findings: {}", style(totals.findings).bold().yellow());
        println!("    Errors: {}", style(totals.errors).bold().red());
        println!("    Warnings: {}", style(totals.warnings).bold().yellow());
        println!(
            "  Corrective commands: {}",
            style(totals.commands).bold().cyan()
        );
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total checking time: {}",
        style(format_duration(total_time)).bold()
    );
    println!(
        "  Average time per file: {}",
        style(format_duration(total_time / total as u32)).dim()
    );

    println!();
    if let Some((report_path, script_path)) = written {
        println!("{}", style("Output files:").bold().green());
        println!("  Report: {}", report_path.display());
        println!("  Script: {}", script_path.display());
        if totals.commands > 0 {
            println!(
                "  Apply corrections with: sh {}",
                style(script_path.display()).bold()
            );
        }
    } else {
        println!("{}", style("Dry Run Mode:").bold().yellow());
        println!("  • No report or script files were written");
        println!("  • Remove --dry-run to persist the results");
    }

    if !failures.is_empty() {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        for (i, (sidecar, error)) in failures.iter().enumerate() {
            let filename = sidecar
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("unknown");
            println!(
                "  {}: {} - {}",
                style(format!("#{}", i + 1)).dim(),
                style(filename).bold().red(),
                error
            );
        }
        println!();
        println!(
            "{}",
            style(format!(
                "⚠ {} sidecar(s) could not be checked",
                failures.len()
            ))
            .bold()
            .yellow()
        );
        println!("  Check the files and try again with --verbose for more details");
    }

    Ok(())
}
