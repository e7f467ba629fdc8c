use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum, PartialEq, Eq)]
pub enum LayoutPolicyArg {
    /// Raise labels that overflow the bottom edge back into the image
    #[value(name = "clamp")]
    BottomClamp,
    /// Skip the clamp and grow the final label rectangle by 20% instead
    #[value(name = "inflate")]
    InflateForOverlap,
}

#[derive(Parser, Debug)]
#[command(
    name = "facetag-processor",
    about = "Face-region metadata reconciler for photo libraries",
    long_about = "
Facetag Processor - Face Region Metadata Reconciler

Photo managers store face annotations redundantly: an MWG (Adobe-style)
region list, a Microsoft-style region list, and a flat keyword/subject list.
The three drift apart as different tools write different subsets. This tool
cross-checks them from exiftool JSON sidecars, writes a findings report plus
an executable exiftool correction script, and computes collision-minimized
name label placements for a rendering host.

Key Features:
• Deterministic findings report and idempotent correction script
• Parallel batch checking with progress tracking
• Crop-aware coordinate rebasing for photos cropped after tagging
• Uniform label sizing with bounded collision deflation
• Greedy per-name word wrap and font size derivation

Example Usage:
  # Check every sidecar under a photo tree
  facetag-processor -i ~/Photos -o ~/checked

  # Check a single sidecar file
  facetag-processor -i ~/Photos/IMG_001.jpg.json -o ~/checked

  # Verbose batch run with four worker threads
  facetag-processor -i ~/Photos -o ~/checked -j 4 --verbose

  # Compute label placements for one image (JSON on stdout)
  facetag-processor --layout ~/Photos/IMG_001.jpg.json

  # Layout with roomier labels instead of the bottom clamp
  facetag-processor --layout ~/Photos/IMG_001.jpg.json --layout-policy inflate

  # Dry run mode: report findings without writing report or script files
  facetag-processor -i ~/Photos -o ~/checked --dry-run --verbose"
)]
pub struct Args {
    /// Input directories or single sidecar files (can be specified multiple
    /// times). May also come from the config file; presence is validated
    /// after the config merge.
    #[arg(short = 'i', long = "input", value_name = "DIR|FILE")]
    pub input_paths: Vec<PathBuf>,

    /// Output directory for the findings report and correction script
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Compute label placements for one sidecar instead of batch checking
    #[arg(long = "layout", value_name = "FILE")]
    pub layout_target: Option<PathBuf>,

    /// Comma-separated list of sidecar extensions to process
    #[arg(long = "extensions", default_value = "json")]
    pub extensions_str: String,

    /// Filename of the findings report inside the output directory
    #[arg(long = "report-name", default_value = "facetag_report.txt", value_name = "NAME")]
    pub report_name: String,

    /// Filename of the correction script inside the output directory
    #[arg(long = "script-name", default_value = "fix_metadata.sh", value_name = "NAME")]
    pub script_name: String,

    /// Vertical anchor displacement as a fraction of the face height.
    /// Negative values move label anchors below the chin.
    #[arg(
        long = "vertical-displacement",
        default_value = "-0.6",
        value_name = "FRACTION",
        allow_hyphen_values = true
    )]
    pub vertical_displacement: f64,

    /// Font size setting scaled into the derived label font size
    #[arg(long = "pointsize", default_value = "22", value_name = "SIZE")]
    pub pointsize: u32,

    /// Characters per face label line; controls both word wrap and font size
    #[arg(long = "chars-per-face", default_value = "10", value_name = "N")]
    pub chars_per_face: usize,

    /// Bottom-edge policy for label placement
    #[arg(long = "layout-policy", default_value = "clamp", value_name = "POLICY")]
    pub layout_policy: LayoutPolicyArg,

    /// Image size fallback when neither the sidecar nor the image file
    /// provides pixel dimensions (format: WIDTHxHEIGHT, e.g., 4000x3000)
    #[arg(long = "image-size", value_name = "WIDTHxHEIGHT")]
    pub image_size: Option<String>,

    /// Load settings from a JSON configuration file (CLI flags take precedence)
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Number of parallel checking jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Report findings without writing the report or script files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit progress and results as JSON lines for GUI integration
    #[arg(long = "json-progress")]
    pub json_progress: bool,
}

impl Args {
    /// Parse the image size override into width and height
    pub fn parse_image_size(&self) -> Result<Option<(u32, u32)>, String> {
        let Some(size) = &self.image_size else {
            return Ok(None);
        };

        let parts: Vec<&str> = size.split('x').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid size format '{}'. Use WIDTHxHEIGHT (e.g., 4000x3000)",
                size
            ));
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| format!("Invalid width: '{}'", parts[0]))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| format!("Invalid height: '{}'", parts[1]))?;

        if width == 0 || height == 0 {
            return Err("Width and height must be greater than 0".to_string());
        }

        Ok(Some((width, height)))
    }

    /// Parse the extensions string into a vector
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    // Getters that match the expected interface
    pub fn extensions(&self) -> Vec<String> {
        self.parse_extensions()
    }
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_paths: vec![PathBuf::from(".")],
            output_dir: PathBuf::from("."),
            layout_target: None,
            extensions_str: "json".to_string(),
            report_name: "facetag_report.txt".to_string(),
            script_name: "fix_metadata.sh".to_string(),
            vertical_displacement: -0.6,
            pointsize: 22,
            chars_per_face: 10,
            layout_policy: LayoutPolicyArg::BottomClamp,
            image_size: None,
            config_file: None,
            jobs: 0,
            verbose: false,
            dry_run: false,
            json_progress: false,
        }
    }
}
