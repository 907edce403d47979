use super::gradient::gradient_magnitude;
use super::mask::{foreground_mask, suppress_background};
use super::regions::detect_salient_regions;
use super::resize::normalize_resolution;
use super::types::{BackgroundSegmenter, Segmentation};
use crate::config::SegmentationConfig;
use image::RgbImage;

/// Background removal from classical primitives only
///
/// Pipeline per photo:
/// 1. Normalize resolution
/// 2. Colour gradient magnitude
/// 3. Mean-threshold denoise, top-level contours, area filter
/// 4. Fill the kept contours into a mask and black out the rest
///
/// Holds no per-image state, so one instance can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct EdgeContourSegmenter {
    config: SegmentationConfig,
}

impl EdgeContourSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }
}

impl BackgroundSegmenter for EdgeContourSegmenter {
    fn segment(&self, image: &RgbImage) -> Segmentation {
        let _span = tracing::debug_span!("edge_contour_segment").entered();

        let mut image =
            normalize_resolution(image, self.config.bounds, self.config.resize_mode).into_owned();
        let (width, height) = image.dimensions();

        let gradients = gradient_magnitude(&image, self.config.blur_kernel);
        let regions = detect_salient_regions(&gradients, &self.config);

        let mask = foreground_mask(width, height, &regions);
        suppress_background(&mut image, &mask);

        Segmentation { image, regions }
    }

    fn name(&self) -> &str {
        "edge-contour"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResizeBounds;
    use image::Rgb;

    #[test]
    fn oversized_input_is_normalized_before_segmenting() {
        let config = SegmentationConfig {
            bounds: ResizeBounds::new(64, 48),
            ..Default::default()
        };
        let segmenter = EdgeContourSegmenter::new(config);
        let image = RgbImage::from_pixel(90, 120, Rgb([100, 100, 100]));

        let result = segmenter.segment(&image);
        assert_eq!(result.image.dimensions(), (48, 64));
        assert!(result.is_degenerate());
    }
}
