// Library exports for reuse by GUI and other applications
pub mod cli;
pub mod config_file;
pub mod json_output;
pub mod layout;
pub mod metadata;
pub mod utils;

// Re-export commonly used types
pub use cli::{Args, LayoutPolicyArg};
pub use json_output::JsonMessage;
pub use layout::{
    compute_layout, font_size_points, wrap_name, FaceRegion, Layout, LabelRect, LayoutPolicy,
    Placement,
};
pub use metadata::model::{FileMetadata, Region, RegionArea, RegionRect};
pub use metadata::reconcile::{reconcile, Finding, Reconciliation, RuleId, Severity};
pub use metadata::{FileOutcome, ReconcileConfig, ReconcileEngine};
