//! Uniform label-rectangle sizing and per-person placement.
//!
//! Pure geometry over pixel-space face regions: no pixel operations, no I/O.
//! The solver produces one shared label size per image so every person's
//! label renders at the same scale, then resolves one placement per face.

/// Factor applied to each face box before averaging into the seed size.
const INFLATE_FACTOR: f64 = 4.0;

/// Per-iteration shrink applied while labels collide.
const DEFLATE_FACTOR: f64 = 0.9;

/// Hard bound on deflation iterations. Residual overlap after the last
/// shrink is accepted, not an error.
const MAX_DEFLATE_STEPS: usize = 5;

/// Final growth applied by [`LayoutPolicy::InflateForOverlap`].
const OVERLAP_ALLOWANCE: f64 = 1.2;

/// Fraction of the label height kept clear of the bottom image edge when the
/// clamp policy fires.
const BOTTOM_MARGIN_FACTOR: f64 = 0.2;

/// Labels may hang past the bottom edge by up to this fraction of their
/// height before the clamp policy intervenes.
const BOTTOM_OVERFLOW_FACTOR: f64 = 1.0 / 3.0;

/// Hard floor for the derived font size in points.
const MIN_FONT_POINTS: f64 = 3.0;

/// One face region in pixel space. The anchor is the face-box center before
/// vertical displacement is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRegion {
    pub name: String,
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub width: f64,
    pub height: f64,
}

/// The single label size shared by every face of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelRect {
    pub width: f64,
    pub height: f64,
}

/// Resolved position of one person's label rectangle in pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub name: String,
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// What to do about labels near the bottom image edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Raise anchors so overflowing labels end up inside the image, with a
    /// small margin above the bottom edge.
    #[default]
    BottomClamp,
    /// Skip the clamp and grow the final rectangle by 20% instead, accepting
    /// edge overflow in exchange for roomier labels.
    InflateForOverlap,
}

/// A solved layout: the shared label size plus one placement per face.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub rect: LabelRect,
    pub placements: Vec<Placement>,
    /// True when the deflation loop exhausted its iteration budget with
    /// collisions remaining. Accepted outcome, surfaced for observability.
    pub residual_overlap: bool,
}

/// Compute the shared label rectangle and per-person placements for one
/// image.
///
/// `vertical_displacement` moves each anchor by `-displacement * height`, so
/// a negative setting shifts the anchor from the face center down below the
/// chin. Returns `None` for an empty region set or a degenerate (non-positive)
/// candidate rectangle; callers skip labeling such images.
pub fn compute_layout(
    regions: &[FaceRegion],
    vertical_displacement: f64,
    image_width: f64,
    image_height: f64,
    policy: LayoutPolicy,
) -> Option<Layout> {
    if regions.is_empty() {
        return None;
    }

    // Step 1: displace anchors and inflate boxes, clamped to image bounds.
    let mut anchors: Vec<(f64, f64)> = regions
        .iter()
        .map(|r| (r.anchor_x, r.anchor_y - vertical_displacement * r.height))
        .collect();
    let inflated: Vec<(f64, f64)> = regions
        .iter()
        .map(|r| {
            (
                (r.width * INFLATE_FACTOR).min(image_width),
                (r.height * INFLATE_FACTOR).min(image_height),
            )
        })
        .collect();

    // Step 2: seed the candidate from the arithmetic mean of inflated sizes.
    let count = inflated.len() as f64;
    let mut rect = LabelRect {
        width: inflated.iter().map(|(w, _)| w).sum::<f64>() / count,
        height: inflated.iter().map(|(_, h)| h).sum::<f64>() / count,
    };

    // Step 3: deflate while any pair of labels collides.
    let mut residual_overlap = any_pair_intersects(&anchors, rect);
    let mut steps = 0;
    while residual_overlap && steps < MAX_DEFLATE_STEPS {
        rect.width *= DEFLATE_FACTOR;
        rect.height *= DEFLATE_FACTOR;
        steps += 1;
        residual_overlap = any_pair_intersects(&anchors, rect);
    }

    // Step 4: bottom-edge policy.
    match policy {
        LayoutPolicy::BottomClamp => {
            for (_, anchor_y) in anchors.iter_mut() {
                let overflow = (*anchor_y + rect.height) - image_height;
                if overflow > rect.height * BOTTOM_OVERFLOW_FACTOR {
                    // Label bottom lands BOTTOM_MARGIN_FACTOR heights above
                    // the image edge.
                    *anchor_y = image_height - rect.height * (1.0 + BOTTOM_MARGIN_FACTOR);
                }
            }
        }
        LayoutPolicy::InflateForOverlap => {
            rect.width *= OVERLAP_ALLOWANCE;
            rect.height *= OVERLAP_ALLOWANCE;
        }
    }

    // Step 5: emit, unless the candidate degenerated.
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }

    let placements = regions
        .iter()
        .zip(&anchors)
        .map(|(region, &(anchor_x, anchor_y))| Placement {
            name: region.name.clone(),
            left: anchor_x - rect.width / 2.0,
            top: anchor_y,
            right: anchor_x + rect.width / 2.0,
            bottom: anchor_y + rect.height,
        })
        .collect();

    Some(Layout {
        rect,
        placements,
        residual_overlap,
    })
}

/// Derived font size in points for the shared label rectangle: a
/// pixels-per-character heuristic with a hard floor to keep text legible.
pub fn font_size_points(rect: &LabelRect, font_size_setting: f64, chars_per_face: usize) -> f64 {
    (font_size_setting * rect.width / chars_per_face as f64).max(MIN_FONT_POINTS)
}

/// Inclusive AABB test over all unordered anchor pairs with the candidate
/// size applied: rectangles that touch count as intersecting.
fn any_pair_intersects(anchors: &[(f64, f64)], rect: LabelRect) -> bool {
    for i in 0..anchors.len() {
        for j in (i + 1)..anchors.len() {
            if boxes_intersect(anchors[i], anchors[j], rect) {
                return true;
            }
        }
    }
    false
}

fn boxes_intersect(a: (f64, f64), b: (f64, f64), rect: LabelRect) -> bool {
    let half = rect.width / 2.0;
    let (a_left, a_right) = (a.0 - half, a.0 + half);
    let (b_left, b_right) = (b.0 - half, b.0 + half);
    let (a_top, a_bottom) = (a.1, a.1 + rect.height);
    let (b_top, b_bottom) = (b.1, b.1 + rect.height);

    a_left <= b_right && b_left <= a_right && a_top <= b_bottom && b_top <= a_bottom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(name: &str, x: f64, y: f64, w: f64, h: f64) -> FaceRegion {
        FaceRegion {
            name: name.to_string(),
            anchor_x: x,
            anchor_y: y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_empty_region_set_has_no_layout() {
        assert!(compute_layout(&[], -0.6, 800.0, 600.0, LayoutPolicy::BottomClamp).is_none());
    }

    #[test]
    fn test_zero_size_faces_degenerate() {
        let regions = vec![face("A", 100.0, 100.0, 0.0, 0.0)];
        assert!(compute_layout(&regions, -0.6, 800.0, 600.0, LayoutPolicy::BottomClamp).is_none());
    }

    #[test]
    fn test_single_face_takes_seed_size() {
        let regions = vec![face("Rick", 400.0, 200.0, 50.0, 60.0)];
        let layout =
            compute_layout(&regions, 0.0, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();

        // 4x inflation, no collisions, no clamp needed.
        assert_eq!(layout.rect.width, 200.0);
        assert_eq!(layout.rect.height, 240.0);
        assert!(!layout.residual_overlap);

        let p = &layout.placements[0];
        assert_eq!(p.left, 300.0);
        assert_eq!(p.right, 500.0);
        assert_eq!(p.top, 200.0);
        assert_eq!(p.bottom, 440.0);
    }

    #[test]
    fn test_inflation_clamped_to_image_bounds() {
        let regions = vec![face("Big", 400.0, 100.0, 500.0, 400.0)];
        let layout =
            compute_layout(&regions, 0.0, 800.0, 600.0, LayoutPolicy::InflateForOverlap).unwrap();

        // 4x would be 2000x1600; clamped to 800x600, then the 20% allowance.
        assert!((layout.rect.width - 800.0 * OVERLAP_ALLOWANCE).abs() < 1e-9);
        assert!((layout.rect.height - 600.0 * OVERLAP_ALLOWANCE).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_displacement_moves_anchor() {
        let regions = vec![face("Rick", 400.0, 200.0, 50.0, 100.0)];
        let layout =
            compute_layout(&regions, -0.5, 2000.0, 2000.0, LayoutPolicy::BottomClamp).unwrap();
        // -(-0.5) * 100 = +50 pixels down.
        assert_eq!(layout.placements[0].top, 250.0);
    }

    #[test]
    fn test_deflation_runs_at_most_five_steps() {
        // Two faces stacked on the same anchor can never separate, so the
        // loop must stop at its bound with the flag set.
        let regions = vec![
            face("A", 400.0, 300.0, 100.0, 100.0),
            face("B", 400.0, 300.0, 100.0, 100.0),
        ];
        let layout =
            compute_layout(&regions, 0.0, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();

        let expected = 400.0 * DEFLATE_FACTOR.powi(MAX_DEFLATE_STEPS as i32);
        assert!((layout.rect.width - expected).abs() < 1e-9);
        assert!(layout.residual_overlap);
    }

    #[test]
    fn test_deflation_monotonic_and_stops_early() {
        // Far-apart faces collide at the seed size but separate after one or
        // two shrinks; the final size must stay above the 5-step floor.
        let regions = vec![
            face("A", 200.0, 300.0, 100.0, 50.0),
            face("B", 590.0, 300.0, 100.0, 50.0),
        ];
        let layout =
            compute_layout(&regions, 0.0, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();

        let seed = 400.0;
        let floor = seed * DEFLATE_FACTOR.powi(MAX_DEFLATE_STEPS as i32);
        assert!(layout.rect.width < seed);
        assert!(layout.rect.width > floor);
        assert!(!layout.residual_overlap);
    }

    #[test]
    fn test_touching_labels_count_as_intersecting() {
        let rect = LabelRect {
            width: 100.0,
            height: 40.0,
        };
        // Exactly adjacent horizontally: right edge of A == left edge of B.
        assert!(boxes_intersect((100.0, 0.0), (200.0, 0.0), rect));
        // One pixel apart: clear.
        assert!(!boxes_intersect((100.0, 0.0), (201.0, 0.0), rect));
    }

    #[test]
    fn test_bottom_clamp_raises_overflowing_label() {
        let image_h = 600.0;
        let regions = vec![face("Low", 400.0, 580.0, 50.0, 50.0)];
        let layout =
            compute_layout(&regions, 0.0, 800.0, image_h, LayoutPolicy::BottomClamp).unwrap();

        let h = layout.rect.height;
        let p = &layout.placements[0];
        // 580 + 200 overflows by 180 > 200/3, so the clamp fires and the
        // label bottom lands 0.2 heights above the image edge.
        assert!((p.bottom - (image_h - BOTTOM_MARGIN_FACTOR * h)).abs() < 1e-9);
        assert!((p.top - (image_h - (1.0 + BOTTOM_MARGIN_FACTOR) * h)).abs() < 1e-9);
    }

    #[test]
    fn test_bottom_clamp_tolerates_small_overflow() {
        let image_h = 600.0;
        // Seed height 200; anchor such that overflow = 50 < 200/3.
        let regions = vec![face("Edge", 400.0, 450.0, 50.0, 50.0)];
        let layout =
            compute_layout(&regions, 0.0, 800.0, image_h, LayoutPolicy::BottomClamp).unwrap();

        let p = &layout.placements[0];
        assert_eq!(p.top, 450.0);
        assert!(p.bottom > image_h);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let regions = vec![
            face("A", 120.0, 90.0, 40.0, 40.0),
            face("B", 300.0, 110.0, 50.0, 45.0),
            face("C", 520.0, 95.0, 42.0, 48.0),
        ];
        let first =
            compute_layout(&regions, -0.6, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();
        let second =
            compute_layout(&regions, -0.6, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_layout_geometry_is_order_invariant() {
        let forward = vec![
            face("A", 120.0, 90.0, 40.0, 40.0),
            face("B", 300.0, 110.0, 50.0, 45.0),
        ];
        let reversed: Vec<FaceRegion> = forward.iter().rev().cloned().collect();

        let a = compute_layout(&forward, -0.6, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();
        let b = compute_layout(&reversed, -0.6, 800.0, 600.0, LayoutPolicy::BottomClamp).unwrap();

        assert_eq!(a.rect, b.rect);
        for placement in &a.placements {
            assert!(b.placements.contains(placement));
        }
    }

    #[test]
    fn test_font_size_heuristic_and_floor() {
        let rect = LabelRect {
            width: 200.0,
            height: 60.0,
        };
        assert_eq!(font_size_points(&rect, 1.0, 10), 20.0);
        assert_eq!(font_size_points(&rect, 0.5, 10), 10.0);

        let tiny = LabelRect {
            width: 4.0,
            height: 2.0,
        };
        assert_eq!(font_size_points(&tiny, 1.0, 10), MIN_FONT_POINTS);
    }
}
