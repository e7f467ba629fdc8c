//! Report and correction-script assembly.
//!
//! The batch driver is the sole consumer of the reconciler's script output:
//! it persists an executable exiftool command file alongside a plain-text
//! report. Both renderings preserve the reconciler's finding order, so a
//! re-run over unchanged metadata produces byte-identical files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use prettytable::{format, Cell, Row, Table};

use super::FileOutcome;

/// Render the human-readable findings report for all checked files.
pub fn render_report(outcomes: &[FileOutcome]) -> String {
    let mut out = String::new();
    out.push_str("Face region reconciliation report\n");
    out.push_str("=================================\n");

    let mut clean = 0;
    for outcome in outcomes {
        if outcome.reconciliation.is_clean() {
            clean += 1;
            continue;
        }

        out.push('\n');
        out.push_str(&outcome.image.display().to_string());
        out.push('\n');
        for finding in &outcome.reconciliation.report {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                finding.severity.to_string().to_lowercase(),
                finding.rule,
                finding.message
            ));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "{} file(s) checked, {} clean, {} with findings\n",
        outcomes.len(),
        clean,
        outcomes.len() - clean
    ));
    out
}

/// Render the executable correction script. Commands appear in reconciler
/// order under a comment naming their target file; applying the script top
/// to bottom converges on the corrected state.
pub fn render_script(outcomes: &[FileOutcome]) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str("# Corrective exiftool commands generated by facetag-processor.\n");
    out.push_str("# Commands are idempotent; re-running this script is safe.\n");

    for outcome in outcomes {
        let commands: Vec<&str> = outcome
            .reconciliation
            .script
            .iter()
            .filter_map(|f| f.command.as_deref())
            .collect();
        if commands.is_empty() {
            continue;
        }

        out.push('\n');
        out.push_str(&format!("# {}\n", outcome.image.display()));
        for command in commands {
            out.push_str(command);
            out.push('\n');
        }
    }

    out
}

/// Persist report and script into the output directory. The script is made
/// executable so the correction file can be run directly.
pub fn write_outputs(
    output_dir: &Path,
    report_name: &str,
    script_name: &str,
    outcomes: &[FileOutcome],
) -> Result<(PathBuf, PathBuf)> {
    let report_path = output_dir.join(report_name);
    let script_path = output_dir.join(script_name);

    fs::write(&report_path, render_report(outcomes))
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
    fs::write(&script_path, render_script(outcomes))
        .with_context(|| format!("Failed to write script: {}", script_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&script_path)
            .with_context(|| format!("Failed to stat script: {}", script_path.display()))?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms)
            .with_context(|| format!("Failed to chmod script: {}", script_path.display()))?;
    }

    Ok((report_path, script_path))
}

/// Print the end-of-run findings table.
pub fn print_summary_table(outcomes: &[FileOutcome]) {
    let flagged: Vec<&FileOutcome> = outcomes
        .iter()
        .filter(|o| !o.reconciliation.is_clean())
        .collect();
    if flagged.is_empty() {
        return;
    }

    println!(
        "{}",
        style(format!("Files with findings ({} total)", flagged.len()))
            .bold()
            .blue()
    );
    println!();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("File"),
        Cell::new("Errors"),
        Cell::new("Warnings"),
        Cell::new("Commands"),
    ]));

    for outcome in flagged {
        let filename = outcome
            .image
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown");
        table.add_row(Row::new(vec![
            Cell::new(filename),
            Cell::new(&outcome.reconciliation.error_count().to_string()),
            Cell::new(&outcome.reconciliation.warning_count().to_string()),
            Cell::new(&outcome.reconciliation.command_count().to_string()),
        ]));
    }

    table.printstd();
    println!();
}

/// Aggregate counts for the styled summary and the JSON summary message.
pub struct BatchTotals {
    pub findings: usize,
    pub errors: usize,
    pub warnings: usize,
    pub commands: usize,
}

pub fn batch_totals(outcomes: &[FileOutcome]) -> BatchTotals {
    let mut totals = BatchTotals {
        findings: 0,
        errors: 0,
        warnings: 0,
        commands: 0,
    };
    for outcome in outcomes {
        totals.findings += outcome.reconciliation.report.len();
        totals.errors += outcome.reconciliation.error_count();
        totals.warnings += outcome.reconciliation.warning_count();
        totals.commands += outcome.reconciliation.command_count();
    }
    totals
}
