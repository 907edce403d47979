use std::path::PathBuf;

/// Upper bounds for the normalized image, expressed per side rather than per
/// axis so that the same pair serves portrait and landscape photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeBounds {
    pub long_side: u32,
    pub short_side: u32,
}

impl ResizeBounds {
    /// ~2.5 Mpx, the compromise between edge-detection time and feature quality.
    pub const HIGH: ResizeBounds = ResizeBounds {
        long_side: 1920,
        short_side: 1440,
    };

    /// ~2 Mpx, faster but gives visibly worse reconstructions.
    pub const STANDARD: ResizeBounds = ResizeBounds {
        long_side: 1600,
        short_side: 1200,
    };

    pub fn new(long_side: u32, short_side: u32) -> Self {
        Self {
            long_side: long_side.max(short_side),
            short_side: long_side.min(short_side),
        }
    }
}

impl Default for ResizeBounds {
    fn default() -> Self {
        Self::HIGH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResizeMode {
    /// Independent width and height factors; the output lands exactly on the
    /// bound pair for the image's orientation.
    #[default]
    Reference,
    /// One factor for both axes, never upscaling.
    PreserveAspect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    pub bounds: ResizeBounds,
    pub resize_mode: ResizeMode,
    /// Side of the square Gaussian kernel. Must be odd.
    pub blur_kernel: u32,
    /// Minimum share of the image a top-level contour must enclose.
    pub area_ratio: f64,
    /// Zero every gradient value at or below the map mean.
    pub suppress_below_mean: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            bounds: ResizeBounds::HIGH,
            resize_mode: ResizeMode::Reference,
            blur_kernel: 9,
            area_ratio: 0.05,
            suppress_below_mean: true,
        }
    }
}

/// What the batch driver does with a photo that has a recognized extension
/// but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DecodeFailurePolicy {
    #[default]
    Skip,
    Abort,
}

pub const DEFAULT_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub segmentation: SegmentationConfig,
    /// Lowercase extensions without the dot.
    pub extensions: Vec<String>,
    pub on_decode_failure: DecodeFailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            on_decode_failure: DecodeFailurePolicy::Skip,
        }
    }
}

/// Mesh size measure used to stop the simplification search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MeshMetric {
    #[default]
    Vertices,
    Faces,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplificationConfig {
    pub metric: MeshMetric,
    /// The search continues only while the metric stays strictly above this.
    pub min_count: usize,
    pub start: f64,
    pub step: f64,
    /// The search continues only while the threshold stays strictly below this.
    pub upper_bound: f64,
}

impl Default for SimplificationConfig {
    fn default() -> Self {
        Self {
            metric: MeshMetric::Vertices,
            min_count: 1000,
            start: 1.0,
            step: 0.5,
            upper_bound: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    /// Directory holding the COLMAP executables.
    pub colmap_bin: PathBuf,
    /// Directory holding the OpenMVS executables.
    pub openmvs_bin: PathBuf,
    /// Optional executable that strips NaN points from a dense scene.
    pub remove_nan: Option<PathBuf>,
    /// Optional executable performing relative-threshold edge collapse on a PLY mesh.
    pub mesh_simplifier: Option<PathBuf>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            colmap_bin: PathBuf::from("/usr/local/bin"),
            openmvs_bin: PathBuf::from("/usr/local/bin/OpenMVS"),
            remove_nan: None,
            mesh_simplifier: None,
        }
    }
}

/// Feature matching flavour; each one gets its own reconstruction branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum MatchingStrategy {
    Sequential,
    Exhaustive,
}

impl MatchingStrategy {
    pub fn dir_name(self) -> &'static str {
        match self {
            MatchingStrategy::Sequential => "sequential_matching",
            MatchingStrategy::Exhaustive => "exhaustive_matching",
        }
    }

    pub fn matcher(self) -> &'static str {
        match self {
            MatchingStrategy::Sequential => "sequential_matcher",
            MatchingStrategy::Exhaustive => "exhaustive_matcher",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub tools: ToolPaths,
    pub batch: BatchConfig,
    pub simplification: SimplificationConfig,
    pub strategies: Vec<MatchingStrategy>,
    /// Run the matching branches as concurrent tasks instead of one after the other.
    pub concurrent_branches: bool,
    /// Skip background removal and reconstruct from the original photos.
    pub skip_segmentation: bool,
    /// Thread count handed to COLMAP.
    pub tool_threads: u32,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            tools: ToolPaths::default(),
            batch: BatchConfig::default(),
            simplification: SimplificationConfig::default(),
            strategies: vec![MatchingStrategy::Sequential, MatchingStrategy::Exhaustive],
            concurrent_branches: false,
            skip_segmentation: false,
            tool_threads: 8,
        }
    }
}
