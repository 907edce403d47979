use super::types::SignificantRegion;
use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

const FOREGROUND: Luma<u8> = Luma([255]);

/// Vertex list acceptable to the polygon filler: no consecutive repeats and no
/// closing vertex equal to the first one.
fn fillable_polygon(points: &[Point<i32>]) -> Option<Vec<Point<i32>>> {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &p in points {
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    (poly.len() >= 3).then_some(poly)
}

/// Mask with every region interior set to 255, drawn in list order.
pub fn foreground_mask(width: u32, height: u32, regions: &[SignificantRegion]) -> GrayImage {
    let _span = tracing::debug_span!("foreground_mask").entered();

    let mut mask = GrayImage::new(width, height);
    for region in regions {
        if let Some(poly) = fillable_polygon(&region.points) {
            draw_polygon_mut(&mut mask, &poly, FOREGROUND);
        }
    }
    mask
}

/// Zero every pixel the mask does not mark as foreground.
pub fn suppress_background(image: &mut RgbImage, mask: &GrayImage) {
    let _span = tracing::debug_span!("suppress_background").entered();

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let is_background = mask.get_pixel(x, y)[0] == 0;
        if is_background {
            pixel.0 = [0, 0, 0];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn square(x0: i32, y0: i32, side: i32) -> SignificantRegion {
        let points = vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ];
        SignificantRegion {
            points,
            area: (side * side) as f64,
        }
    }

    #[test]
    fn empty_region_list_blacks_out_everything() {
        let mut image = RgbImage::from_pixel(20, 10, Rgb([9, 99, 199]));
        let mask = foreground_mask(20, 10, &[]);
        suppress_background(&mut image, &mask);
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn region_interior_survives_and_outside_is_zeroed() {
        let mut image = RgbImage::from_pixel(40, 40, Rgb([50, 60, 70]));
        let mask = foreground_mask(40, 40, &[square(10, 10, 20)]);
        suppress_background(&mut image, &mask);

        assert_eq!(image.get_pixel(20, 20).0, [50, 60, 70]);
        assert_eq!(image.get_pixel(11, 29).0, [50, 60, 70]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(35, 20).0, [0, 0, 0]);
    }

    #[test]
    fn overlapping_regions_union_in_mask() {
        let mask = foreground_mask(50, 50, &[square(5, 5, 20), square(15, 15, 30)]);
        assert_eq!(mask.get_pixel(8, 8)[0], 255);
        assert_eq!(mask.get_pixel(40, 40)[0], 255);
        assert_eq!(mask.get_pixel(40, 8)[0], 0);
    }

    #[test]
    fn degenerate_polygons_are_ignored() {
        let closed = vec![
            Point::new(1, 1),
            Point::new(1, 1),
            Point::new(8, 1),
            Point::new(8, 8),
            Point::new(1, 1),
        ];
        assert_eq!(
            fillable_polygon(&closed),
            Some(vec![Point::new(1, 1), Point::new(8, 1), Point::new(8, 8)])
        );
        assert_eq!(fillable_polygon(&[Point::new(3, 3), Point::new(4, 4)]), None);

        let line = SignificantRegion {
            points: vec![Point::new(2, 2), Point::new(2, 2)],
            area: 0.0,
        };
        let mask = foreground_mask(10, 10, &[line]);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
