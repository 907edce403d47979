use super::types::{GradientMap, SignificantRegion};
use crate::config::SegmentationConfig;
use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::point::Point;

/// Turn a gradient map into the 8-bit edge image that contours are traced on
///
/// With `suppress_below_mean`, every value at or below the map mean becomes
/// zero, which removes most low-amplitude texture. Remaining values are
/// clamped to 255.
pub fn suppress_noise(map: &GradientMap, suppress_below_mean: bool) -> GrayImage {
    let _span = tracing::debug_span!("suppress_noise").entered();

    let mean = map.mean();
    tracing::debug!("Gradient mean {:.2}", mean);

    GrayImage::from_fn(map.width(), map.height(), |x, y| {
        let v = map.get(x, y);
        if suppress_below_mean && v <= mean {
            Luma([0])
        } else {
            Luma([v.clamp(0.0, 255.0) as u8])
        }
    })
}

/// Shoelace area of a closed polygon given by its vertices in order.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64
        })
        .sum();
    twice.abs() * 0.5
}

/// Top-level contours of `edges` enclosing more than `area_ratio` of the
/// image, in ascending order of area.
///
/// The contour tree comes back as a flat list where each entry holds the
/// index of its enclosing contour. Anything with a parent is detail inside a
/// region that is already covered, so only roots are considered.
pub fn find_significant_regions(edges: &GrayImage, area_ratio: f64) -> Vec<SignificantRegion> {
    let _span = tracing::debug_span!("find_significant_regions").entered();

    let (width, height) = edges.dimensions();
    let too_small = width as f64 * height as f64 * area_ratio;

    let contours = find_contours::<i32>(edges);
    let total = contours.len();

    let mut significant: Vec<SignificantRegion> = contours
        .into_iter()
        .filter(|c| c.parent.is_none())
        .filter_map(|c| {
            let area = polygon_area(&c.points);
            (area > too_small).then_some(SignificantRegion {
                points: c.points,
                area,
            })
        })
        .collect();

    significant.sort_by(|a, b| a.area.total_cmp(&b.area));

    tracing::debug!(
        "{} contours traced, {} significant (min area {:.0})",
        total,
        significant.len(),
        too_small
    );
    significant
}

/// Denoise a gradient map and pick out its significant regions.
pub fn detect_salient_regions(
    map: &GradientMap,
    config: &SegmentationConfig,
) -> Vec<SignificantRegion> {
    let edges = suppress_noise(map, config.suppress_below_mean);
    find_significant_regions(&edges, config.area_ratio)
}
