mod classical;
pub mod gradient;
pub mod mask;
pub mod regions;
pub mod resize;
pub mod types;

pub use classical::EdgeContourSegmenter;
pub use gradient::gradient_magnitude;
pub use mask::{foreground_mask, suppress_background};
pub use regions::{detect_salient_regions, find_significant_regions, suppress_noise};
pub use resize::normalize_resolution;
pub use types::{BackgroundSegmenter, GradientMap, Segmentation, SignificantRegion};

use crate::config::SegmentationConfig;

/// Create the default segmenter (edge/contour based)
pub fn create_default_segmenter(config: SegmentationConfig) -> Box<dyn BackgroundSegmenter> {
    Box::new(EdgeContourSegmenter::new(config))
}
