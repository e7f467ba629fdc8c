//! Cross-schema consistency rules for face-region metadata.
//!
//! The reconciler evaluates a fixed, ordered battery of rules over the MWG
//! (Adobe) region list, the Microsoft region list and the subject keywords of
//! one file. Every rule appends findings in a stable order (Adobe regions
//! last-to-first, then Microsoft regions in original order), so two runs over
//! unchanged metadata produce byte-identical report and script output.
//!
//! Corrective commands are rendered from working copies of both lists that
//! accumulate each rule's fix. Applying the emitted script top to bottom
//! therefore converges on the corrected state, and a second reconcile run
//! over that state has nothing left to correct.

use std::path::Path;

use strum_macros::Display;

use super::commands;
use super::model::{
    capitalize_words, names_equal, subjects_contain, FileMetadata, Region, RegionArea,
};

/// Identifies which consistency rule produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RuleId {
    IncompleteRegion,
    ImportMissingSchema,
    RegionWithoutRectangle,
    NameMissingFromKeywords,
    GeometryMismatch,
    NameMismatch,
    OrphanedMicrosoftRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Severity {
    Warning,
    Error,
}

/// One diagnostic unit: rule, severity, human-readable message, and the
/// corrective command when a safe one is knowable.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub rule: RuleId,
    pub severity: Severity,
    pub message: String,
    pub command: Option<String>,
}

/// The two parallel ordered sequences produced per file: every finding goes
/// into the report; findings carrying a command also go into the script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub report: Vec<Finding>,
    pub script: Vec<Finding>,
}

impl Reconciliation {
    fn push(&mut self, finding: Finding) {
        if finding.command.is_some() {
            self.script.push(finding.clone());
        }
        self.report.push(finding);
    }

    pub fn is_clean(&self) -> bool {
        self.report.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.report
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.report
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn command_count(&self) -> usize {
        self.script.len()
    }
}

/// Run the full rule battery for one file. Pure and deterministic: no I/O,
/// no clock, no hidden state.
pub fn reconcile(file: &FileMetadata) -> Reconciliation {
    let mut out = Reconciliation::default();
    let path = file.path.as_path();

    // Working copies accumulate each rule's fix so later commands are
    // rendered against the already-corrected state.
    let mut adobe = file.adobe_regions.clone();
    let mut microsoft = file.microsoft_regions.clone();
    let mut subjects = file.subjects.clone();

    scan_incomplete_regions(&adobe, &microsoft, &mut out);
    rule_import_missing_schema(path, &mut adobe, &mut microsoft, &mut out);
    rule_region_without_rectangle(path, &mut adobe, &microsoft, &mut out);
    rule_name_missing_from_keywords(path, &adobe, &mut subjects, &mut out);
    rule_geometry_mismatch(path, &adobe, &mut microsoft, &mut out);
    rule_name_mismatch(path, &adobe, &mut microsoft, &mut out);
    rule_orphaned_microsoft_entry(path, &mut adobe, &microsoft, &mut out);

    out
}

/// Report-only pre-scan: a region with neither name nor usable rectangle is
/// skipped by every later rule, so surface it once here instead.
fn scan_incomplete_regions(adobe: &[Region], microsoft: &[Region], out: &mut Reconciliation) {
    for (index, region) in adobe.iter().enumerate().rev() {
        if !region.is_usable() {
            out.push(Finding {
                rule: RuleId::IncompleteRegion,
                severity: Severity::Warning,
                message: format!(
                    "MWG region #{} has neither a name nor a usable rectangle",
                    index + 1
                ),
                command: None,
            });
        }
    }
    for (index, region) in microsoft.iter().enumerate() {
        if !region.is_usable() {
            out.push(Finding {
                rule: RuleId::IncompleteRegion,
                severity: Severity::Warning,
                message: format!(
                    "Microsoft region #{} has neither a name nor a usable rectangle",
                    index + 1
                ),
                command: None,
            });
        }
    }
}

/// Rule 1: one schema holds entries while the other is absent entirely.
fn rule_import_missing_schema(
    path: &Path,
    adobe: &mut Vec<Region>,
    microsoft: &mut Vec<Region>,
    out: &mut Reconciliation,
) {
    if !adobe.is_empty() && microsoft.is_empty() {
        out.push(Finding {
            rule: RuleId::ImportMissingSchema,
            severity: Severity::Warning,
            message: format!(
                "Microsoft region list is absent while {} MWG region(s) are present",
                adobe.len()
            ),
            command: Some(commands::import_adobe_into_microsoft(path)),
        });
        *microsoft = adobe.clone();
    } else if !microsoft.is_empty() && adobe.is_empty() {
        out.push(Finding {
            rule: RuleId::ImportMissingSchema,
            severity: Severity::Warning,
            message: format!(
                "MWG region list is absent while {} Microsoft region(s) are present",
                microsoft.len()
            ),
            command: Some(commands::import_microsoft_into_adobe(path)),
        });
        *adobe = microsoft.clone();
    }
}

/// Rule 2: a named MWG region lacks geometry that a same-named Microsoft
/// region can supply. Missing geometry is the more severe class.
fn rule_region_without_rectangle(
    path: &Path,
    adobe: &mut [Region],
    microsoft: &[Region],
    out: &mut Reconciliation,
) {
    for i in (0..adobe.len()).rev() {
        let name = match &adobe[i].name {
            Some(name) if !adobe[i].area.is_complete() => name.clone(),
            _ => continue,
        };

        let donor = microsoft
            .iter()
            .find(|m| m.area.is_complete() && m.name.as_deref().is_some_and(|n| names_equal(n, &name)))
            .and_then(|m| m.area.rect());

        if let Some(rect) = donor {
            adobe[i].area = RegionArea::from_rect(rect);
            out.push(Finding {
                rule: RuleId::RegionWithoutRectangle,
                severity: Severity::Error,
                message: format!(
                    "MWG region \"{}\" has no usable rectangle; the Microsoft entry provides one",
                    capitalize_words(&name)
                ),
                command: Some(commands::write_adobe_region_list(path, adobe)),
            });
        }
    }
}

/// Rule 3: a fully-specified MWG region whose person is missing from the
/// keyword/subject list.
fn rule_name_missing_from_keywords(
    path: &Path,
    adobe: &[Region],
    subjects: &mut Vec<String>,
    out: &mut Reconciliation,
) {
    for region in adobe.iter().rev() {
        let name = match &region.name {
            Some(name) if region.area.is_complete() => name,
            _ => continue,
        };
        if subjects_contain(subjects, name) {
            continue;
        }

        let display = capitalize_words(name);
        out.push(Finding {
            rule: RuleId::NameMissingFromKeywords,
            severity: Severity::Warning,
            message: format!("\"{}\" is not present in the keyword/subject list", display),
            command: Some(commands::add_name_to_keywords(path, &display)),
        });
        subjects.push(display);
    }
}

/// Rule 4: same person in both schemas, rectangles not tolerance-equal.
/// The MWG rectangle is authoritative.
fn rule_geometry_mismatch(
    path: &Path,
    adobe: &[Region],
    microsoft: &mut [Region],
    out: &mut Reconciliation,
) {
    for region in adobe.iter().rev() {
        let (name, rect) = match (&region.name, region.area.rect()) {
            (Some(name), Some(rect)) => (name, rect),
            _ => continue,
        };

        let mismatch = microsoft.iter().position(|m| {
            region.name_matches(m)
                && m.area
                    .rect()
                    .is_some_and(|ms_rect| !ms_rect.same_area(&rect))
        });

        if let Some(j) = mismatch {
            microsoft[j].area = RegionArea::from_rect(rect);
            out.push(Finding {
                rule: RuleId::GeometryMismatch,
                severity: Severity::Error,
                message: format!(
                    "\"{}\" has different rectangles in the MWG and Microsoft schemas",
                    capitalize_words(name)
                ),
                command: Some(commands::write_microsoft_region_list(path, microsoft)),
            });
        }
    }
}

/// Rule 5: tolerance-equal rectangles across schemas under different names.
/// The MWG name is transferred onto the Microsoft region.
fn rule_name_mismatch(
    path: &Path,
    adobe: &[Region],
    microsoft: &mut [Region],
    out: &mut Reconciliation,
) {
    for region in adobe.iter().rev() {
        let (name, rect) = match (&region.name, region.area.rect()) {
            (Some(name), Some(rect)) => (name, rect),
            _ => continue,
        };

        let disagreeing = microsoft.iter().position(|m| {
            m.area.rect().is_some_and(|ms_rect| ms_rect.same_area(&rect))
                && !region.name_matches(m)
        });

        if let Some(j) = disagreeing {
            let previous = microsoft[j]
                .name
                .clone()
                .unwrap_or_else(|| "<unnamed>".to_string());
            microsoft[j].name = Some(name.clone());
            out.push(Finding {
                rule: RuleId::NameMismatch,
                severity: Severity::Warning,
                message: format!(
                    "Microsoft region \"{}\" shares its rectangle with MWG region \"{}\"",
                    previous,
                    capitalize_words(name)
                ),
                command: Some(commands::write_microsoft_region_list(path, microsoft)),
            });
        }
    }
}

/// Rule 6: a Microsoft region with no MWG counterpart by name or geometry.
/// The person is known to one schema only.
fn rule_orphaned_microsoft_entry(
    path: &Path,
    adobe: &mut Vec<Region>,
    microsoft: &[Region],
    out: &mut Reconciliation,
) {
    for region in microsoft {
        if !region.is_usable() {
            continue;
        }

        let matched_by_name = adobe.iter().any(|a| region.name_matches(a));
        let matched_by_geometry = region.area.rect().is_some_and(|rect| {
            adobe
                .iter()
                .any(|a| a.area.rect().is_some_and(|a_rect| a_rect.same_area(&rect)))
        });

        if matched_by_name || matched_by_geometry {
            continue;
        }

        let label = region
            .name
            .clone()
            .unwrap_or_else(|| "<unnamed>".to_string());
        adobe.push(region.clone());
        out.push(Finding {
            rule: RuleId::OrphanedMicrosoftRegion,
            severity: Severity::Warning,
            message: format!(
                "\"{}\" exists only in the Microsoft schema; no MWG region matches by name or rectangle",
                label
            ),
            command: Some(commands::write_adobe_region_list(path, adobe)),
        });
    }
}
