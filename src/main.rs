use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recon_pipeline::batch::segment_directory;
use recon_pipeline::config::{
    BatchConfig, DecodeFailurePolicy, MatchingStrategy, MeshMetric, PipelineConfig, ResizeBounds,
    ResizeMode, SegmentationConfig, SimplificationConfig, ToolPaths,
};
use recon_pipeline::pipeline;
use recon_pipeline::segmentation::create_default_segmenter;
use recon_pipeline::tools::ProcessRunner;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove backgrounds, then reconstruct, texture and simplify
    Run(RunArgs),
    /// Only remove backgrounds from a directory of photos
    Segment(SegmentArgs),
}

#[derive(clap::Args, Debug)]
struct SegmentationArgs {
    /// Long side of the working resolution
    #[arg(long, default_value_t = 1920)]
    long_side: u32,

    /// Short side of the working resolution
    #[arg(long, default_value_t = 1440)]
    short_side: u32,

    /// How oversized photos are scaled down
    #[arg(long, value_enum, default_value_t = ResizeMode::Reference)]
    resize_mode: ResizeMode,

    /// Gaussian blur kernel size (odd)
    #[arg(long, default_value_t = 9)]
    blur_kernel: u32,

    /// Minimum share of the image a region must cover to count as subject
    #[arg(long, default_value_t = 0.05)]
    area_ratio: f64,

    /// Keep weak gradients instead of zeroing everything at or below the mean
    #[arg(long)]
    keep_weak_edges: bool,

    /// What to do with photos that cannot be decoded
    #[arg(long, value_enum, default_value_t = DecodeFailurePolicy::Skip)]
    on_decode_failure: DecodeFailurePolicy,
}

impl SegmentationArgs {
    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            segmentation: SegmentationConfig {
                bounds: ResizeBounds::new(self.long_side, self.short_side),
                resize_mode: self.resize_mode,
                blur_kernel: self.blur_kernel,
                area_ratio: self.area_ratio,
                suppress_below_mean: !self.keep_weak_edges,
            },
            on_decode_failure: self.on_decode_failure,
            ..Default::default()
        }
    }
}

#[derive(clap::Args, Debug)]
struct SegmentArgs {
    /// Directory with the input photos
    input: PathBuf,

    /// Directory receiving the segmented photos
    output: PathBuf,

    #[command(flatten)]
    segmentation: SegmentationArgs,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Directory with the photo set
    input: PathBuf,

    /// Directory with the COLMAP executables
    #[arg(long, default_value = "/usr/local/bin")]
    colmap_bin: PathBuf,

    /// Directory with the OpenMVS executables
    #[arg(long, default_value = "/usr/local/bin/OpenMVS")]
    openmvs_bin: PathBuf,

    /// Executable removing NaN points from the dense scene
    #[arg(long)]
    remove_nan: Option<PathBuf>,

    /// Edge-collapse executable; without it only the full-detail model is textured
    #[arg(long)]
    mesh_simplifier: Option<PathBuf>,

    /// Matching strategies to run, one reconstruction branch each
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [MatchingStrategy::Sequential, MatchingStrategy::Exhaustive]
    )]
    strategies: Vec<MatchingStrategy>,

    /// Run the matching branches concurrently
    #[arg(long)]
    concurrent_branches: bool,

    /// Reconstruct from the original photos without removing backgrounds
    #[arg(long)]
    skip_segmentation: bool,

    /// Threads handed to COLMAP
    #[arg(long, default_value_t = 8)]
    tool_threads: u32,

    /// Mesh size measure that ends the simplification search
    #[arg(long, value_enum, default_value_t = MeshMetric::Vertices)]
    metric: MeshMetric,

    /// Smallest mesh still worth texturing
    #[arg(long, default_value_t = 1000)]
    min_count: usize,

    /// First edge-collapse threshold
    #[arg(long, default_value_t = 1.0)]
    threshold_start: f64,

    /// Threshold increment per iteration
    #[arg(long, default_value_t = 0.5)]
    threshold_step: f64,

    /// Threshold at which the search stops
    #[arg(long, default_value_t = 4.0)]
    threshold_limit: f64,

    #[command(flatten)]
    segmentation: SegmentationArgs,
}

impl RunArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_dir: self.input.clone(),
            tools: ToolPaths {
                colmap_bin: self.colmap_bin.clone(),
                openmvs_bin: self.openmvs_bin.clone(),
                remove_nan: self.remove_nan.clone(),
                mesh_simplifier: self.mesh_simplifier.clone(),
            },
            batch: self.segmentation.batch_config(),
            simplification: SimplificationConfig {
                metric: self.metric,
                min_count: self.min_count,
                start: self.threshold_start,
                step: self.threshold_step,
                upper_bound: self.threshold_limit,
            },
            strategies: self.strategies.clone(),
            concurrent_branches: self.concurrent_branches,
            skip_segmentation: self.skip_segmentation,
            tool_threads: self.tool_threads,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match args.command {
        Command::Segment(segment) => {
            let config = segment.segmentation.batch_config();
            let segmenter = create_default_segmenter(config.segmentation.clone());
            let report = segment_directory(
                &segment.input,
                &segment.output,
                &config,
                segmenter.as_ref(),
            )
            .context("Failed to segment photos")?;
            tracing::info!(
                "{} written ({} black), {} skipped",
                report.written.len(),
                report.degenerate.len(),
                report.skipped.len()
            );
        }
        Command::Run(run) => {
            let config = run.pipeline_config();
            tracing::info!("Reconstructing {}", config.input_dir.display());
            let report =
                pipeline::run(&config, &ProcessRunner).context("3D reconstruction failed")?;
            for branch in &report.branches {
                tracing::info!(
                    "{:?}: full-detail model {}",
                    branch.strategy,
                    branch.baseline_texture.display()
                );
                if let Some(simplification) = &branch.simplification {
                    for trial in &simplification.trials {
                        tracing::info!(
                            "{:?}: threshold {:.1} -> {}",
                            branch.strategy,
                            trial.threshold,
                            trial.textured.display()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_mirror_library_defaults() {
        let args = Args::parse_from(["recon-pipeline", "run", "/photos"]);
        let Command::Run(run) = args.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(run.pipeline_config(), PipelineConfig::new("/photos"));
    }

    #[test]
    fn strategies_accept_a_comma_list() {
        let args = Args::parse_from([
            "recon-pipeline",
            "run",
            "/photos",
            "--strategies",
            "exhaustive",
            "--metric",
            "faces",
        ]);
        let Command::Run(run) = args.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(run.strategies, vec![MatchingStrategy::Exhaustive]);
        assert_eq!(run.metric, MeshMetric::Faces);
    }
}
