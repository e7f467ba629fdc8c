pub mod label_text;
pub mod solver;

pub use label_text::{format_label, wrap_name};
pub use solver::{
    compute_layout, font_size_points, FaceRegion, Layout, LabelRect, LayoutPolicy, Placement,
};

/// Sort persons into descending case-insensitive name order before layout.
///
/// Placement order has no effect on geometry; it only controls visual
/// stacking when a host renders labels as separate overlapping layers, where
/// later-placed labels land on top. This ordering is the caller's job, not
/// the solver's.
pub fn sort_for_stacking(regions: &mut [FaceRegion]) {
    regions.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_for_stacking_is_descending_case_insensitive() {
        let mut regions = vec![
            FaceRegion {
                name: "anna".to_string(),
                anchor_x: 0.0,
                anchor_y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            FaceRegion {
                name: "Rick".to_string(),
                anchor_x: 0.0,
                anchor_y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            FaceRegion {
                name: "Bob".to_string(),
                anchor_x: 0.0,
                anchor_y: 0.0,
                width: 1.0,
                height: 1.0,
            },
        ];
        sort_for_stacking(&mut regions);
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Rick", "Bob", "anna"]);
    }
}
