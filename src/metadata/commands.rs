//! Corrective exiftool command assembly.
//!
//! The reconciler never touches files itself; every fix is rendered as one
//! exiftool invocation the batch driver persists into an executable script.
//! Region-list rewrites serialize the full corrected list in exiftool struct
//! syntax, so each command is idempotent and the script can be re-run safely.

use std::path::Path;

use super::model::Region;

const EXIFTOOL: &str = "exiftool -overwrite_original";

/// Copy every MWG region into the absent Microsoft list.
pub fn import_adobe_into_microsoft(path: &Path) -> String {
    format!(
        "{} \"-RegionInfoMP<RegionInfo\" {}",
        EXIFTOOL,
        shell_quote(&path.display().to_string())
    )
}

/// Copy every Microsoft region into the absent MWG list.
pub fn import_microsoft_into_adobe(path: &Path) -> String {
    format!(
        "{} \"-RegionInfo<RegionInfoMP\" {}",
        EXIFTOOL,
        shell_quote(&path.display().to_string())
    )
}

/// Add a person name to both the keyword and subject fields.
pub fn add_name_to_keywords(path: &Path, name: &str) -> String {
    format!(
        "{} -Keywords+={} -Subject+={} {}",
        EXIFTOOL,
        shell_quote(name),
        shell_quote(name),
        shell_quote(&path.display().to_string())
    )
}

/// Rewrite the full MWG region list from the corrected working copy.
pub fn write_adobe_region_list(path: &Path, regions: &[Region]) -> String {
    let entries: Vec<String> = regions.iter().map(mwg_region_struct).collect();
    format!(
        "{} {} {}",
        EXIFTOOL,
        shell_quote(&format!(
            "-XMP-mwg-rs:RegionInfo={{RegionList=[{}]}}",
            entries.join(",")
        )),
        shell_quote(&path.display().to_string())
    )
}

/// Rewrite the full Microsoft region list from the corrected working copy.
pub fn write_microsoft_region_list(path: &Path, regions: &[Region]) -> String {
    let entries: Vec<String> = regions.iter().map(mp_region_struct).collect();
    format!(
        "{} {} {}",
        EXIFTOOL,
        shell_quote(&format!(
            "-XMP-MP:RegionInfoMP={{Regions=[{}]}}",
            entries.join(",")
        )),
        shell_quote(&path.display().to_string())
    )
}

fn mwg_region_struct(region: &Region) -> String {
    let mut fields = Vec::new();

    if let Some(rect) = region.area.rect() {
        let unit = region.unit.as_deref().unwrap_or("normalized");
        fields.push(format!(
            "Area={{H={},Unit={},W={},X={},Y={}}}",
            format_component(rect.h),
            struct_value(unit),
            format_component(rect.w),
            format_component(rect.x),
            format_component(rect.y)
        ));
    }
    if let Some(name) = &region.name {
        fields.push(format!("Name={}", struct_value(name)));
    }
    if let Some(rotation) = &region.rotation {
        fields.push(format!("Rotation={}", struct_value(rotation)));
    }
    let region_type = region.region_type.as_deref().unwrap_or("Face");
    fields.push(format!("Type={}", struct_value(region_type)));

    format!("{{{}}}", fields.join(","))
}

fn mp_region_struct(region: &Region) -> String {
    let mut fields = Vec::new();

    if let Some(name) = &region.name {
        fields.push(format!("PersonDisplayName={}", struct_value(name)));
    }
    if let Some(rect) = region.area.rect() {
        fields.push(format!(
            "Rectangle={}",
            struct_value(&format!(
                "{}, {}, {}, {}",
                format_component(rect.x),
                format_component(rect.y),
                format_component(rect.w),
                format_component(rect.h)
            ))
        ));
    }

    format!("{{{}}}", fields.join(","))
}

/// Shortest round-trip decimal form of a rectangle component. Deterministic
/// for a given input, so repeated runs emit byte-identical commands.
fn format_component(value: f64) -> String {
    format!("{}", value)
}

/// Quote a struct field value when it contains exiftool struct syntax
/// characters.
fn struct_value(value: &str) -> String {
    if value
        .chars()
        .any(|c| matches!(c, ',' | '{' | '}' | '[' | ']' | '|'))
    {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// POSIX single-quote wrapping; embedded single quotes are closed, escaped
/// and reopened.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::model::{RegionArea, RegionRect};
    use std::path::PathBuf;

    fn region(name: &str, rect: Option<RegionRect>) -> Region {
        Region {
            name: Some(name.to_string()),
            area: rect.map(RegionArea::from_rect).unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("photo.jpg"), "'photo.jpg'");
        assert_eq!(shell_quote("o'brien.jpg"), "'o'\\''brien.jpg'");
    }

    #[test]
    fn test_struct_value_quoting() {
        assert_eq!(struct_value("Rick"), "Rick");
        assert_eq!(struct_value("Anna Maria"), "Anna Maria");
        assert_eq!(struct_value("Garcia, Anna"), "\"Garcia, Anna\"");
    }

    #[test]
    fn test_add_name_to_keywords() {
        let cmd = add_name_to_keywords(&PathBuf::from("a.jpg"), "Rick");
        assert_eq!(
            cmd,
            "exiftool -overwrite_original -Keywords+='Rick' -Subject+='Rick' 'a.jpg'"
        );
    }

    #[test]
    fn test_import_commands_reference_both_schemas() {
        let path = PathBuf::from("a.jpg");
        assert!(import_adobe_into_microsoft(&path).contains("-RegionInfoMP<RegionInfo"));
        assert!(import_microsoft_into_adobe(&path).contains("-RegionInfo<RegionInfoMP"));
    }

    #[test]
    fn test_mwg_struct_serialization() {
        let r = region(
            "Rick",
            Some(RegionRect {
                x: 0.1,
                y: 0.2,
                w: 0.05,
                h: 0.06,
            }),
        );
        assert_eq!(
            mwg_region_struct(&r),
            "{Area={H=0.06,Unit=normalized,W=0.05,X=0.1,Y=0.2},Name=Rick,Type=Face}"
        );
    }

    #[test]
    fn test_mp_struct_serialization() {
        let r = region(
            "Rick",
            Some(RegionRect {
                x: 0.1,
                y: 0.2,
                w: 0.05,
                h: 0.06,
            }),
        );
        assert_eq!(
            mp_region_struct(&r),
            "{PersonDisplayName=Rick,Rectangle=\"0.1, 0.2, 0.05, 0.06\"}"
        );
    }

    #[test]
    fn test_region_list_rewrite_is_stable() {
        let path = PathBuf::from("a.jpg");
        let regions = vec![region(
            "Rick",
            Some(RegionRect {
                x: 0.1,
                y: 0.2,
                w: 0.05,
                h: 0.06,
            }),
        )];
        let first = write_microsoft_region_list(&path, &regions);
        let second = write_microsoft_region_list(&path, &regions);
        assert_eq!(first, second);
        assert!(first.starts_with("exiftool -overwrite_original '-XMP-MP:RegionInfoMP="));
    }
}
