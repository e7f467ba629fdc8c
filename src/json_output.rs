//! JSON output for GUI integration
//!
//! When --json-progress flag is enabled, all progress and status information
//! is emitted as JSON lines to stdout, suppressing all other output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// One sidecar checked
    FileChecked {
        input_path: String,
        findings: usize,
        errors: usize,
        warnings: usize,
        commands: usize,
    },
    /// One sidecar failed to load or parse
    FileFailed { input_path: String, error: String },
    /// Batch summary
    Summary {
        total_files: usize,
        checked: usize,
        failed: usize,
        findings: usize,
        commands: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit progress message (throttled to ~25 FPS for smooth GUI updates)
    ///
    /// Progress updates are throttled to emit at most every 40ms (25 FPS target).
    /// The final progress (current == total) is always emitted to ensure 100% completion.
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        // Get current time in milliseconds
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        // Emit if:
        // 1. At least 40ms have passed since last emission (25 FPS), OR
        // 2. This is the final progress update (current == total)
        if now_ms - last_ms >= 40 || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Create and emit file checked message
    pub fn file_checked(
        input_path: &Path,
        findings: usize,
        errors: usize,
        warnings: usize,
        commands: usize,
    ) {
        Self::FileChecked {
            input_path: input_path.display().to_string(),
            findings,
            errors,
            warnings,
            commands,
        }
        .emit();
    }

    /// Create and emit file failed message
    pub fn file_failed(input_path: &Path, error: impl Into<String>) {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
        .emit();
    }

    /// Create and emit summary message
    pub fn summary(
        total_files: usize,
        checked: usize,
        failed: usize,
        findings: usize,
        commands: usize,
        duration_secs: f64,
    ) {
        Self::Summary {
            total_files,
            checked,
            failed,
            findings,
            commands,
            duration_secs,
        }
        .emit();
    }
}

/// Layout result for a rendering host, emitted as a single JSON document.
#[derive(Debug, Serialize)]
pub struct LayoutOutput {
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub label_width: f64,
    pub label_height: f64,
    pub font_size_points: f64,
    pub residual_overlap: bool,
    pub labels: Vec<LabelOutput>,
}

/// One placed label: wrapped text lines plus pixel-space edges.
#[derive(Debug, Serialize)]
pub struct LabelOutput {
    pub name: String,
    pub lines: Vec<String>,
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}
