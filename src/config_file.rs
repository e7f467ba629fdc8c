use crate::cli::{Args, LayoutPolicyArg};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Represents the GUI config file format
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub name: Option<String>,
    pub file_path: Option<String>,
    pub last_modified: Option<String>,
    pub config: CheckConfigJson,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckConfigJson {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub vertical_displacement: Option<f64>,
    pub pointsize: Option<u32>,
    pub chars_per_face: Option<usize>,
    pub layout_policy: Option<String>,
    pub extensions: Option<String>,
    pub report_name: Option<String>,
    pub script_name: Option<String>,
    pub jobs: Option<usize>,
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: ConfigFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            self.merge_from_config(config.config);

            if self.verbose {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: CheckConfigJson) {
        // We check if arguments were explicitly provided on the command line
        let args_from_cli = std::env::args().collect::<Vec<_>>();

        // Input/output paths - only apply if not specified on CLI
        if !args_from_cli.iter().any(|a| a == "-i" || a == "--input") {
            if let Some(input) = config.input_path {
                self.input_paths = vec![PathBuf::from(input)];
            }
        }

        if !args_from_cli.iter().any(|a| a == "-o" || a == "--output") {
            if let Some(output) = config.output_path {
                self.output_dir = PathBuf::from(output);
            }
        }

        // Layout policy
        if !args_from_cli.iter().any(|a| a == "--layout-policy") {
            if let Some(policy) = config.layout_policy {
                self.layout_policy = match policy.as_str() {
                    "clamp" | "bottomClamp" => LayoutPolicyArg::BottomClamp,
                    "inflate" | "inflateForOverlap" => LayoutPolicyArg::InflateForOverlap,
                    _ => self.layout_policy.clone(),
                };
            }
        }

        // Numeric parameters - only apply if not specified on CLI
        if !args_from_cli.iter().any(|a| a == "--vertical-displacement") {
            if let Some(displacement) = config.vertical_displacement {
                self.vertical_displacement = displacement;
            }
        }

        if !args_from_cli.iter().any(|a| a == "--pointsize") {
            if let Some(size) = config.pointsize {
                self.pointsize = size;
            }
        }

        if !args_from_cli.iter().any(|a| a == "--chars-per-face") {
            if let Some(chars) = config.chars_per_face {
                self.chars_per_face = chars;
            }
        }

        if self.jobs == 0 {
            if let Some(jobs) = config.jobs {
                self.jobs = jobs;
            }
        }

        // String parameters - only apply if using defaults
        if self.extensions_str == "json" {
            if let Some(ext) = config.extensions {
                self.extensions_str = ext;
            }
        }

        if self.report_name == "facetag_report.txt" {
            if let Some(name) = config.report_name {
                self.report_name = name;
            }
        }

        if self.script_name == "fix_metadata.sh" {
            if let Some(name) = config.script_name {
                self.script_name = name;
            }
        }

        // Boolean flags - only apply if currently false (default)
        if !self.dry_run {
            self.dry_run = config.dry_run.unwrap_or(false);
        }

        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }
    }
}
