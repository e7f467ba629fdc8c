//! exiftool JSON sidecar extraction.
//!
//! The reconciler and layout solver never read raw metadata containers; they
//! consume normalized [`FileMetadata`] records produced here from exiftool
//! `-j -struct` sidecar output. All coordinate normalization lives in this
//! module: MWG center-anchored areas become top-left rectangles so the two
//! schemas compare componentwise, pixel-unit areas are divided down by their
//! applied dimensions, and regions recorded before a crop are rebased into
//! the cropped unit space.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::model::{capitalize_words, FileMetadata, Region, RegionArea};
use crate::layout::solver::FaceRegion;

/// Numeric sidecar field that may arrive as a JSON number or a string.
/// A value that fails coercion is treated as absent, never as an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

fn component(field: &Option<LenientNumber>) -> Option<f64> {
    field.as_ref().and_then(LenientNumber::value)
}

/// String-list field that exiftool collapses to a bare string when it holds
/// a single entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SidecarRecord {
    #[serde(rename = "SourceFile")]
    source_file: Option<String>,
    #[serde(rename = "ImageWidth")]
    image_width: Option<LenientNumber>,
    #[serde(rename = "ImageHeight")]
    image_height: Option<LenientNumber>,
    #[serde(rename = "RegionInfo")]
    region_info: Option<MwgRegionInfo>,
    #[serde(rename = "RegionInfoMP")]
    region_info_mp: Option<MpRegionInfo>,
    #[serde(rename = "Subject")]
    subject: Option<OneOrMany>,
    #[serde(rename = "Keywords")]
    keywords: Option<OneOrMany>,
    #[serde(rename = "CropLeft")]
    crop_left: Option<LenientNumber>,
    #[serde(rename = "CropTop")]
    crop_top: Option<LenientNumber>,
    #[serde(rename = "CropRight")]
    crop_right: Option<LenientNumber>,
    #[serde(rename = "CropBottom")]
    crop_bottom: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct MwgRegionInfo {
    #[serde(rename = "AppliedToDimensions")]
    applied_to_dimensions: Option<AppliedDimensions>,
    #[serde(rename = "RegionList", default)]
    region_list: Vec<MwgRegion>,
}

#[derive(Debug, Deserialize)]
struct AppliedDimensions {
    #[serde(rename = "W")]
    w: Option<LenientNumber>,
    #[serde(rename = "H")]
    h: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct MwgRegion {
    #[serde(rename = "Area")]
    area: Option<MwgArea>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Type")]
    region_type: Option<String>,
    #[serde(rename = "Rotation")]
    rotation: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct MwgArea {
    #[serde(rename = "X")]
    x: Option<LenientNumber>,
    #[serde(rename = "Y")]
    y: Option<LenientNumber>,
    #[serde(rename = "W")]
    w: Option<LenientNumber>,
    #[serde(rename = "H")]
    h: Option<LenientNumber>,
    #[serde(rename = "Unit")]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpRegionInfo {
    #[serde(rename = "Regions", default)]
    regions: Vec<MpRegion>,
}

#[derive(Debug, Deserialize)]
struct MpRegion {
    #[serde(rename = "PersonDisplayName")]
    person_display_name: Option<String>,
    #[serde(rename = "Rectangle")]
    rectangle: Option<LenientNumber>,
}

/// Crop fractions recorded when a photo was cropped after its regions were
/// written. Regions are normalized over the original frame, so they must be
/// rebased into the cropped unit space before any comparison or layout.
#[derive(Debug, Clone, Copy)]
struct CropFractions {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl CropFractions {
    fn from_record(record: &SidecarRecord) -> Option<Self> {
        let crop = Self {
            left: component(&record.crop_left)?,
            top: component(&record.crop_top)?,
            right: component(&record.crop_right)?,
            bottom: component(&record.crop_bottom)?,
        };
        let valid = crop.left >= 0.0
            && crop.top >= 0.0
            && crop.right <= 1.0
            && crop.bottom <= 1.0
            && crop.left < crop.right
            && crop.top < crop.bottom;
        // A full-frame crop record means nothing changed.
        let cropped = crop.left > 0.0 || crop.top > 0.0 || crop.right < 1.0 || crop.bottom < 1.0;
        (valid && cropped).then_some(crop)
    }

    fn width_fraction(&self) -> f64 {
        self.right - self.left
    }

    fn height_fraction(&self) -> f64 {
        self.bottom - self.top
    }

    fn rebase(&self, area: RegionArea) -> RegionArea {
        RegionArea {
            x: area.x.map(|x| (x - self.left) / self.width_fraction()),
            y: area.y.map(|y| (y - self.top) / self.height_fraction()),
            w: area.w.map(|w| w / self.width_fraction()),
            h: area.h.map(|h| h / self.height_fraction()),
        }
    }
}

/// Read and parse one sidecar file into a normalized [`FileMetadata`].
pub fn load_sidecar(sidecar_path: &Path) -> Result<FileMetadata> {
    let contents = fs::read_to_string(sidecar_path)
        .with_context(|| format!("Failed to read sidecar: {}", sidecar_path.display()))?;
    parse_sidecar(sidecar_path, &contents)
}

/// Parse sidecar contents. exiftool `-j` emits a one-element array; a bare
/// object is accepted as well.
pub fn parse_sidecar(sidecar_path: &Path, contents: &str) -> Result<FileMetadata> {
    let record: SidecarRecord = match serde_json::from_str::<Vec<SidecarRecord>>(contents) {
        Ok(mut records) if !records.is_empty() => records.remove(0),
        _ => serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse sidecar: {}", sidecar_path.display()))?,
    };

    Ok(convert(sidecar_path, record))
}

fn convert(sidecar_path: &Path, record: SidecarRecord) -> FileMetadata {
    let image_path = resolve_image_path(sidecar_path, record.source_file.as_deref());
    let crop = CropFractions::from_record(&record);

    let adobe_regions = record
        .region_info
        .as_ref()
        .map(|info| {
            let applied = applied_dimensions(info);
            info.region_list
                .iter()
                .map(|r| convert_mwg_region(r, applied, crop))
                .collect()
        })
        .unwrap_or_default();

    let microsoft_regions = record
        .region_info_mp
        .as_ref()
        .map(|info| {
            info.regions
                .iter()
                .map(|r| convert_mp_region(r, crop))
                .collect()
        })
        .unwrap_or_default();

    let mut subjects: Vec<String> = record
        .subject
        .map(OneOrMany::into_vec)
        .unwrap_or_default();
    subjects.extend(record.keywords.map(OneOrMany::into_vec).unwrap_or_default());

    let image_width = component(&record.image_width).map(|w| w as u32);
    let image_height = component(&record.image_height).map(|h| h as u32);
    let (image_width, image_height) = match (image_width, image_height) {
        (Some(w), Some(h)) => (Some(w), Some(h)),
        _ => probe_image_dimensions(&image_path)
            .map(|(w, h)| (Some(w), Some(h)))
            .unwrap_or((image_width, image_height)),
    };

    // Original-pixel dimensions recovered from the crop fractions.
    let (original_width, original_height) = match crop {
        Some(crop) => (
            image_width.map(|w| (w as f64 / crop.width_fraction()).round() as u32),
            image_height.map(|h| (h as f64 / crop.height_fraction()).round() as u32),
        ),
        None => (None, None),
    };

    FileMetadata {
        path: image_path,
        adobe_regions,
        microsoft_regions,
        subjects,
        image_width,
        image_height,
        original_width,
        original_height,
    }
}

fn applied_dimensions(info: &MwgRegionInfo) -> Option<(f64, f64)> {
    let dims = info.applied_to_dimensions.as_ref()?;
    let w = component(&dims.w)?;
    let h = component(&dims.h)?;
    (w > 0.0 && h > 0.0).then_some((w, h))
}

/// MWG `stArea` records are center-anchored and may be expressed in pixels;
/// normalize to a top-left rectangle in unit space so both schemas compare
/// componentwise.
fn convert_mwg_region(
    region: &MwgRegion,
    applied: Option<(f64, f64)>,
    crop: Option<CropFractions>,
) -> Region {
    let mut area = region
        .area
        .as_ref()
        .map(|a| RegionArea {
            x: component(&a.x),
            y: component(&a.y),
            w: component(&a.w),
            h: component(&a.h),
        })
        .unwrap_or_default();

    let pixel_unit = region
        .area
        .as_ref()
        .and_then(|a| a.unit.as_deref())
        .is_some_and(|u| u.eq_ignore_ascii_case("pixel"));
    if pixel_unit {
        if let Some((w, h)) = applied {
            area = RegionArea {
                x: area.x.map(|x| x / w),
                y: area.y.map(|y| y / h),
                w: area.w.map(|aw| aw / w),
                h: area.h.map(|ah| ah / h),
            };
        } else {
            // Pixel coordinates without applied dimensions cannot be
            // normalized; the rectangle is unusable.
            area = RegionArea::default();
        }
    }

    // Center anchor to top-left corner.
    if let Some(rect) = area.rect() {
        area = RegionArea {
            x: Some(rect.x - rect.w / 2.0),
            y: Some(rect.y - rect.h / 2.0),
            w: Some(rect.w),
            h: Some(rect.h),
        };
    }

    if let Some(crop) = crop {
        area = crop.rebase(area);
    }

    Region {
        name: clean_name(region.name.as_deref()),
        area,
        region_type: region.region_type.clone(),
        unit: Some("normalized".to_string()),
        rotation: region.rotation.as_ref().and_then(LenientNumber::value).map(|r| r.to_string()),
    }
}

/// Microsoft rectangles arrive as a single "x, y, w, h" string, already
/// top-left anchored in unit space.
fn convert_mp_region(region: &MpRegion, crop: Option<CropFractions>) -> Region {
    let mut area = region
        .rectangle
        .as_ref()
        .map(parse_mp_rectangle)
        .unwrap_or_default();

    if let Some(crop) = crop {
        area = crop.rebase(area);
    }

    Region {
        name: clean_name(region.person_display_name.as_deref()),
        area,
        ..Default::default()
    }
}

fn parse_mp_rectangle(raw: &LenientNumber) -> RegionArea {
    let text = match raw {
        LenientNumber::Text(s) => s.as_str(),
        // A bare number can never carry four components.
        LenientNumber::Number(_) => return RegionArea::default(),
    };

    let parts: Vec<Option<f64>> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>().ok().filter(|n| n.is_finite()))
        .collect();
    if parts.len() != 4 {
        return RegionArea::default();
    }

    RegionArea {
        x: parts[0],
        y: parts[1],
        w: parts[2],
        h: parts[3],
    }
}

fn clean_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// The image file the sidecar describes: its `SourceFile` when recorded
/// (resolved against the sidecar's directory), otherwise the sidecar path
/// with the `.json` extension stripped.
fn resolve_image_path(sidecar_path: &Path, source_file: Option<&str>) -> PathBuf {
    if let Some(source) = source_file {
        let source = Path::new(source);
        if source.is_absolute() {
            return source.to_path_buf();
        }
        if let Some(parent) = sidecar_path.parent() {
            return parent.join(source);
        }
        return source.to_path_buf();
    }
    sidecar_path.with_extension("")
}

/// Pixel dimensions of the actual image file, used when the sidecar omits
/// them. Header-only read via the image crate, EXIF tags as fallback.
pub fn probe_image_dimensions(image_path: &Path) -> Option<(u32, u32)> {
    if !image_path.is_file() {
        return None;
    }
    if let Ok(dims) = image::image_dimensions(image_path) {
        return Some(dims);
    }
    exif_dimensions(image_path)
}

fn exif_dimensions(image_path: &Path) -> Option<(u32, u32)> {
    let file = fs::File::open(image_path).ok()?;
    let mut reader = std::io::BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let width = exif_u32(&exif, exif::Tag::PixelXDimension)
        .or_else(|| exif_u32(&exif, exif::Tag::ImageWidth))?;
    let height = exif_u32(&exif, exif::Tag::PixelYDimension)
        .or_else(|| exif_u32(&exif, exif::Tag::ImageLength))?;
    Some((width, height))
}

fn exif_u32(exif: &exif::Exif, tag: exif::Tag) -> Option<u32> {
    exif.get_field(tag, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Layout input for the currently targeted image: every named, complete MWG
/// region converted to pixel space with a center anchor.
pub fn to_face_regions(file: &FileMetadata, image_width: f64, image_height: f64) -> Vec<FaceRegion> {
    file.adobe_regions
        .iter()
        .filter_map(|region| {
            let name = region.name.as_deref()?;
            let rect = region.area.rect()?;
            Some(FaceRegion {
                name: capitalize_words(name),
                anchor_x: (rect.x + rect.w / 2.0) * image_width,
                anchor_y: (rect.y + rect.h / 2.0) * image_height,
                width: rect.w * image_width,
                height: rect.h * image_height,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIDECAR: &str = r#"[{
        "SourceFile": "photo.jpg",
        "ImageWidth": 4000,
        "ImageHeight": 3000,
        "RegionInfo": {
            "AppliedToDimensions": {"W": 4000, "H": 3000, "Unit": "pixel"},
            "RegionList": [
                {"Area": {"X": 0.5, "Y": 0.4, "W": 0.1, "H": 0.2, "Unit": "normalized"},
                 "Name": "Rick", "Type": "Face"},
                {"Area": {"X": 0.2, "Y": 0.2, "W": "oops", "H": 0.1},
                 "Name": "  ", "Type": "Face"}
            ]
        },
        "RegionInfoMP": {
            "Regions": [
                {"PersonDisplayName": "Rick", "Rectangle": "0.45, 0.3, 0.1, 0.2"}
            ]
        },
        "Subject": ["Bob"],
        "Keywords": "Holiday"
    }]"#;

    #[test]
    fn test_parse_full_sidecar() {
        let file = parse_sidecar(Path::new("/photos/photo.jpg.json"), SIDECAR).unwrap();

        assert_eq!(file.path, PathBuf::from("/photos/photo.jpg"));
        assert_eq!(file.image_width, Some(4000));
        assert_eq!(file.image_height, Some(3000));
        assert_eq!(file.subjects, vec!["Bob".to_string(), "Holiday".to_string()]);

        // MWG center anchor converted to top-left.
        let rick = &file.adobe_regions[0];
        assert_eq!(rick.name.as_deref(), Some("Rick"));
        let rect = rick.area.rect().unwrap();
        assert!((rect.x - 0.45).abs() < 1e-9);
        assert!((rect.y - 0.3).abs() < 1e-9);

        // Blank name and malformed numeric component both collapse to absent.
        let broken = &file.adobe_regions[1];
        assert_eq!(broken.name, None);
        assert!(!broken.area.is_complete());

        // Microsoft rectangle string parsed componentwise; now both schemas
        // agree on Rick's rectangle.
        let mp = &file.microsoft_regions[0];
        let mp_rect = mp.area.rect().unwrap();
        assert!(mp_rect.same_area(&rect));
    }

    #[test]
    fn test_parse_bare_object_sidecar() {
        let contents = r#"{"SourceFile": "a.jpg", "Subject": "Bob"}"#;
        let file = parse_sidecar(Path::new("/photos/a.jpg.json"), contents).unwrap();
        assert_eq!(file.subjects, vec!["Bob".to_string()]);
        assert!(file.adobe_regions.is_empty());
        assert!(file.microsoft_regions.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_sidecar_json() {
        assert!(parse_sidecar(Path::new("x.json"), "[1, 2, 3]").is_err());
        assert!(parse_sidecar(Path::new("x.json"), "not json").is_err());
    }

    #[test]
    fn test_pixel_unit_area_is_normalized() {
        let contents = r#"[{
            "SourceFile": "b.jpg",
            "RegionInfo": {
                "AppliedToDimensions": {"W": 1000, "H": 500},
                "RegionList": [
                    {"Area": {"X": 500, "Y": 250, "W": 100, "H": 50, "Unit": "pixel"},
                     "Name": "Anna"}
                ]
            }
        }]"#;
        let file = parse_sidecar(Path::new("/photos/b.jpg.json"), contents).unwrap();
        let rect = file.adobe_regions[0].area.rect().unwrap();
        assert!((rect.x - 0.45).abs() < 1e-9);
        assert!((rect.y - 0.45).abs() < 1e-9);
        assert!((rect.w - 0.1).abs() < 1e-9);
        assert!((rect.h - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_crop_rebasing_and_dimension_recovery() {
        // Right half of the original frame: regions move left, widths double.
        let contents = r#"[{
            "SourceFile": "c.jpg",
            "ImageWidth": 2000,
            "ImageHeight": 3000,
            "CropLeft": 0.5, "CropTop": 0.0, "CropRight": 1.0, "CropBottom": 1.0,
            "RegionInfoMP": {
                "Regions": [
                    {"PersonDisplayName": "Rick", "Rectangle": "0.7, 0.4, 0.1, 0.2"}
                ]
            }
        }]"#;
        let file = parse_sidecar(Path::new("/photos/c.jpg.json"), contents).unwrap();

        let rect = file.microsoft_regions[0].area.rect().unwrap();
        assert!((rect.x - 0.4).abs() < 1e-9);
        assert!((rect.y - 0.4).abs() < 1e-9);
        assert!((rect.w - 0.2).abs() < 1e-9);
        assert!((rect.h - 0.2).abs() < 1e-9);

        assert_eq!(file.original_width, Some(4000));
        assert_eq!(file.original_height, Some(3000));
    }

    #[test]
    fn test_full_frame_crop_is_ignored() {
        let contents = r#"[{
            "SourceFile": "d.jpg",
            "CropLeft": 0.0, "CropTop": 0.0, "CropRight": 1.0, "CropBottom": 1.0,
            "RegionInfoMP": {
                "Regions": [{"PersonDisplayName": "Rick", "Rectangle": "0.1, 0.1, 0.2, 0.2"}]
            }
        }]"#;
        let file = parse_sidecar(Path::new("/photos/d.jpg.json"), contents).unwrap();
        let rect = file.microsoft_regions[0].area.rect().unwrap();
        assert!((rect.x - 0.1).abs() < 1e-9);
        assert_eq!(file.original_width, None);
    }

    #[test]
    fn test_malformed_mp_rectangle_is_incomplete() {
        for raw in ["0.1, 0.1, 0.2", "0.1, 0.1, 0.2, oops", ""] {
            let area = parse_mp_rectangle(&LenientNumber::Text(raw.to_string()));
            assert!(!area.is_complete(), "{:?} should be incomplete", raw);
        }
        let good = parse_mp_rectangle(&LenientNumber::Text("0.1, 0.2, 0.3, 0.4".to_string()));
        assert!(good.is_complete());
    }

    #[test]
    fn test_to_face_regions_converts_to_pixels() {
        let file = parse_sidecar(Path::new("/photos/photo.jpg.json"), SIDECAR).unwrap();
        let faces = to_face_regions(&file, 4000.0, 3000.0);

        // Only the complete, named region survives.
        assert_eq!(faces.len(), 1);
        let face = &faces[0];
        assert_eq!(face.name, "Rick");
        assert!((face.anchor_x - 0.5 * 4000.0).abs() < 1e-9);
        assert!((face.anchor_y - 0.4 * 3000.0).abs() < 1e-9);
        assert!((face.width - 400.0).abs() < 1e-9);
        assert!((face.height - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_image_path() {
        assert_eq!(
            resolve_image_path(Path::new("/p/a.jpg.json"), Some("a.jpg")),
            PathBuf::from("/p/a.jpg")
        );
        assert_eq!(
            resolve_image_path(Path::new("/p/a.jpg.json"), Some("/abs/a.jpg")),
            PathBuf::from("/abs/a.jpg")
        );
        assert_eq!(
            resolve_image_path(Path::new("/p/a.jpg.json"), None),
            PathBuf::from("/p/a.jpg")
        );
    }
}
