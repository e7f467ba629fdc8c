use std::path::PathBuf;

/// Per-component tolerance for rectangle equality in normalized unit space.
///
/// The two schemas store the same rectangle with different serialization
/// precision, so exact float comparison would flag every region pair.
pub const RECT_TOLERANCE: f64 = 0.01;

/// A complete face rectangle in normalized unit space (0.0..=1.0 per axis).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RegionRect {
    /// Tolerance-based equality: all four components must be within
    /// [`RECT_TOLERANCE`] of each other.
    pub fn same_area(&self, other: &RegionRect) -> bool {
        (self.x - other.x).abs() <= RECT_TOLERANCE
            && (self.y - other.y).abs() <= RECT_TOLERANCE
            && (self.w - other.w).abs() <= RECT_TOLERANCE
            && (self.h - other.h).abs() <= RECT_TOLERANCE
    }
}

/// Raw rectangle components as extracted from metadata.
///
/// Each component is independently optional: a component that is missing from
/// the source metadata, or that failed numeric coercion during extraction, is
/// `None`. Geometry rules only ever see the [`RegionRect`] produced by
/// [`RegionArea::rect`], so a partial rectangle can never leak into a
/// comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionArea {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
}

impl RegionArea {
    pub fn from_rect(rect: RegionRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            w: Some(rect.w),
            h: Some(rect.h),
        }
    }

    /// The complete rectangle, or `None` while any component is missing.
    pub fn rect(&self) -> Option<RegionRect> {
        Some(RegionRect {
            x: self.x?,
            y: self.y?,
            w: self.w?,
            h: self.h?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.rect().is_some()
    }
}

/// One face/person annotation record from either metadata schema.
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Person name as recorded; `None` when absent or blank.
    pub name: Option<String>,
    pub area: RegionArea,
    /// Region kind as recorded (usually "Face").
    pub region_type: Option<String>,
    /// Coordinate unit as recorded (usually "normalized").
    pub unit: Option<String>,
    pub rotation: Option<String>,
}

impl Region {
    /// A region with neither a name nor a usable rectangle cannot take part
    /// in any reconciliation rule.
    pub fn is_usable(&self) -> bool {
        self.name.is_some() || self.area.is_complete()
    }

    /// Case-insensitive name match against another region.
    pub fn name_matches(&self, other: &Region) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => names_equal(a, b),
            _ => false,
        }
    }
}

/// Everything the reconciler needs for one file: both region schemas, the
/// subject list, and enough context to render corrective commands.
#[derive(Debug, Clone, Default)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub adobe_regions: Vec<Region>,
    pub microsoft_regions: Vec<Region>,
    pub subjects: Vec<String>,
    /// Current pixel dimensions, when the sidecar or image file provided them.
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    /// Pre-crop pixel dimensions recovered from crop fractions, when the
    /// photo was cropped after its regions were recorded.
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
}

/// Case-insensitive string equality used for every name comparison.
pub fn names_equal(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive membership test of a name in a subject list.
pub fn subjects_contain(subjects: &[String], name: &str) -> bool {
    subjects.iter().any(|s| names_equal(s, name))
}

/// Canonical display form of a person name.
///
/// The first alphabetic character of each alphabetic run is upper-cased, the
/// rest lower-cased. Non-alphabetic characters pass through unchanged and
/// reset the start-of-word state, so "anna-maria" becomes "Anna-Maria" and
/// "o'brien" becomes "O'Brien".
pub fn capitalize_words(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut start_of_word = true;

    for ch in name.chars() {
        if ch.is_alphabetic() {
            if start_of_word {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            start_of_word = false;
        } else {
            result.push(ch);
            start_of_word = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> RegionRect {
        RegionRect { x, y, w, h }
    }

    #[test]
    fn test_same_area_within_tolerance() {
        let base = rect(0.10, 0.10, 0.05, 0.05);
        let nudged = rect(0.109, 0.091, 0.059, 0.041);
        assert!(base.same_area(&nudged));
        assert!(nudged.same_area(&base));
    }

    #[test]
    fn test_same_area_single_component_out() {
        let base = rect(0.10, 0.10, 0.05, 0.05);
        for i in 0..4 {
            let mut off = base;
            match i {
                0 => off.x += 0.02,
                1 => off.y += 0.02,
                2 => off.w += 0.02,
                _ => off.h += 0.02,
            }
            assert!(!base.same_area(&off), "component {} should break equality", i);
        }
    }

    #[test]
    fn test_area_completeness() {
        let complete = RegionArea::from_rect(rect(0.1, 0.2, 0.3, 0.4));
        assert!(complete.is_complete());
        assert_eq!(complete.rect(), Some(rect(0.1, 0.2, 0.3, 0.4)));

        let partial = RegionArea {
            x: Some(0.1),
            y: Some(0.2),
            w: None,
            h: Some(0.4),
        };
        assert!(!partial.is_complete());
        assert_eq!(partial.rect(), None);
    }

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("anna maria garcia"), "Anna Maria Garcia");
        assert_eq!(capitalize_words("ANNA MARIA"), "Anna Maria");
        assert_eq!(capitalize_words("anna-maria"), "Anna-Maria");
        assert_eq!(capitalize_words("o'brien"), "O'Brien");
        assert_eq!(capitalize_words("jean paul 2nd"), "Jean Paul 2Nd");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn test_capitalize_words_idempotent() {
        for name in ["rick", "Anna Maria Garcia", "o'BRIEN", "x æ a-12", "日本語"] {
            let once = capitalize_words(name);
            assert_eq!(capitalize_words(&once), once);
        }
    }

    #[test]
    fn test_subjects_contain() {
        let subjects = vec!["Bob".to_string(), "anna maria".to_string()];
        assert!(subjects_contain(&subjects, "bob"));
        assert!(subjects_contain(&subjects, "Anna Maria"));
        assert!(!subjects_contain(&subjects, "Rick"));
        assert!(!subjects_contain(&[], "Rick"));
    }

    #[test]
    fn test_region_usability() {
        let named_only = Region {
            name: Some("Rick".to_string()),
            ..Default::default()
        };
        assert!(named_only.is_usable());

        let rect_only = Region {
            area: RegionArea::from_rect(rect(0.1, 0.1, 0.05, 0.05)),
            ..Default::default()
        };
        assert!(rect_only.is_usable());

        assert!(!Region::default().is_usable());
    }
}
