use crate::batch::{segment_directory, BatchReport};
use crate::config::{MatchingStrategy, PipelineConfig};
use crate::segmentation::create_default_segmenter;
use crate::simplify::{format_threshold, ProgressiveSimplifier, SimplificationReport};
use crate::tools::{Colmap, ExternalMeshToolkit, OpenMvs, PlyMesh, ToolRunner};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Directory layout under the photo directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub input_dir: PathBuf,
    /// `<input>/result`
    pub result_dir: PathBuf,
    /// `<input>/result/images`, destination of the segmented photos
    pub images_dir: PathBuf,
}

impl Workspace {
    pub fn create(input_dir: &Path, strategies: &[MatchingStrategy]) -> Result<Self> {
        if !input_dir.is_dir() {
            bail!(
                "Directory {} doesn't exist; pass the directory holding the photo set",
                input_dir.display()
            );
        }
        let result_dir = input_dir.join("result");
        let images_dir = result_dir.join("images");
        fs::create_dir_all(&images_dir)
            .with_context(|| format!("Failed to create {}", images_dir.display()))?;
        for strategy in strategies {
            fs::create_dir_all(result_dir.join(strategy.dir_name()))?;
        }
        Ok(Self {
            input_dir: input_dir.to_path_buf(),
            result_dir,
            images_dir,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchReport {
    pub strategy: MatchingStrategy,
    /// Textured full-detail model
    pub baseline_texture: PathBuf,
    /// `None` when no simplifier is configured
    pub simplification: Option<SimplificationReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub batch: Option<BatchReport>,
    pub branches: Vec<BranchReport>,
}

fn run_branch(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    colmap: &Colmap<'_>,
    strategy: MatchingStrategy,
) -> Result<BranchReport> {
    let _span = tracing::info_span!("branch", strategy = ?strategy).entered();
    let started = Instant::now();

    let reconstruction_dir = colmap
        .sfm(strategy)
        .with_context(|| format!("Structure from motion failed ({strategy:?})"))?;

    let mvs = OpenMvs::new(&config.tools.openmvs_bin, runner, config.tools.remove_nan.clone());
    let refined = mvs
        .build_mesh(&reconstruction_dir)
        .with_context(|| format!("Dense reconstruction failed ({strategy:?})"))?;

    let branch_dir = colmap.branch_dir(strategy);
    let baseline_texture = mvs
        .texture(&reconstruction_dir, &refined, &format_threshold(0.0), &branch_dir)
        .context("Texturing the full-detail mesh failed")?;

    let simplification = match &config.tools.mesh_simplifier {
        Some(program) => {
            let mut toolkit =
                ExternalMeshToolkit::new(program, runner, &mvs, &reconstruction_dir, &branch_dir);
            let baseline = PlyMesh { path: refined };
            let report = ProgressiveSimplifier::new(config.simplification.clone())
                .run(&mut toolkit, &baseline)
                .context("Progressive simplification failed")?;
            Some(report)
        }
        None => {
            tracing::info!("No mesh simplifier configured, keeping the full-detail model only");
            None
        }
    };

    tracing::info!(
        "Reconstruction ({:?}) took {:.2} s",
        strategy,
        started.elapsed().as_secs_f64()
    );
    Ok(BranchReport {
        strategy,
        baseline_texture,
        simplification,
    })
}

/// Run every configured matching branch, either one after the other or as
/// two concurrent tasks joined at the end.
fn run_branches(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    colmap: &Colmap<'_>,
) -> Result<Vec<BranchReport>> {
    let strategies = &config.strategies;
    if config.concurrent_branches && strategies.len() == 2 {
        let (first, second) = rayon::join(
            || run_branch(config, runner, colmap, strategies[0]),
            || run_branch(config, runner, colmap, strategies[1]),
        );
        for (strategy, result) in strategies.iter().zip([&first, &second]) {
            if let Err(err) = result {
                tracing::error!("Branch {:?} failed: {:#}", strategy, err);
            }
        }
        return Ok(vec![first?, second?]);
    }

    strategies
        .iter()
        .map(|&strategy| run_branch(config, runner, colmap, strategy))
        .collect()
}

/// Full pipeline for one photo directory
///
/// Any external tool failure aborts the run; segmentation problems with
/// individual photos follow the batch decode policy.
pub fn run(config: &PipelineConfig, runner: &dyn ToolRunner) -> Result<PipelineReport> {
    let started = Instant::now();
    if config.strategies.is_empty() {
        bail!("No matching strategy selected");
    }
    let workspace = Workspace::create(&config.input_dir, &config.strategies)?;

    let (batch, image_dir) = if config.skip_segmentation {
        tracing::info!("Background removal disabled, reconstructing from the original photos");
        (None, workspace.input_dir.clone())
    } else {
        let segmenter = create_default_segmenter(config.batch.segmentation.clone());
        let report = segment_directory(
            &workspace.input_dir,
            &workspace.images_dir,
            &config.batch,
            segmenter.as_ref(),
        )
        .context("Background removal failed")?;
        tracing::info!(
            "Background removal: {} written, {} black, {} skipped",
            report.written.len(),
            report.degenerate.len(),
            report.skipped.len()
        );
        if report.written.is_empty() {
            bail!("No photo could be segmented in {}", workspace.input_dir.display());
        }
        (Some(report), workspace.images_dir.clone())
    };

    let colmap = Colmap::new(
        &config.tools.colmap_bin,
        runner,
        &image_dir,
        &workspace.result_dir,
        config.tool_threads,
    );
    colmap
        .extract_features(&config.strategies)
        .context("Feature extraction failed")?;

    let branches = run_branches(config, runner, &colmap)?;

    tracing::info!("Pipeline finished in {:.2} s", started.elapsed().as_secs_f64());
    Ok(PipelineReport { batch, branches })
}
