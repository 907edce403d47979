use image::RgbImage;
use imageproc::point::Point;
use ndarray::Array2;

/// Per-pixel edge strength, rows x cols, same size as the (resized) image.
/// Values are non-negative and may exceed 255.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientMap {
    pub data: Array2<f32>,
}

impl GradientMap {
    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[[y as usize, x as usize]]
    }

    pub fn mean(&self) -> f32 {
        self.data.mean().unwrap_or(0.0)
    }
}

/// A top-level closed contour that encloses enough of the image to count as
/// part of the subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantRegion {
    pub points: Vec<Point<i32>>,
    pub area: f64,
}

/// Result of segmenting one photo
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Resized photo with every background pixel set to black
    pub image: RgbImage,
    /// Regions kept as foreground, ascending by area
    pub regions: Vec<SignificantRegion>,
}

impl Segmentation {
    /// No region passed the area filter, so the whole image is black.
    pub fn is_degenerate(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Trait for background segmentation backends
///
/// Implementations must be stateless across images so the batch driver can
/// run them from several worker threads at once.
pub trait BackgroundSegmenter: Send + Sync {
    /// Separate the subject from the background of one photo
    ///
    /// # Arguments
    /// * `image` - Input RGB photo at its original resolution
    ///
    /// # Returns
    /// * The normalized photo with its background zeroed, plus the regions kept
    fn segment(&self, image: &RgbImage) -> Segmentation;

    /// Short name used in logs
    fn name(&self) -> &str;
}
