use crate::config::{MeshMetric, SimplificationConfig};
use anyhow::Result;
use std::fmt;
use std::path::PathBuf;

/// External mesh operations the loop depends on
pub trait MeshToolkit {
    /// Opaque handle to a mesh owned by the toolkit
    type Mesh;

    /// Edge-collapse `baseline` with the given relative threshold
    fn simplify(&mut self, baseline: &Self::Mesh, threshold: f64) -> Result<Self::Mesh>;

    /// Vertex or face count of `mesh`
    fn count(&self, mesh: &Self::Mesh, metric: MeshMetric) -> Result<usize>;

    /// Keep the simplified mesh under a name unique to `threshold`
    fn persist(&mut self, mesh: Self::Mesh, threshold: f64) -> Result<Self::Mesh>;

    /// Drop a simplified mesh that was not worth texturing
    fn discard(&mut self, mesh: Self::Mesh) -> Result<()>;

    /// Texture `mesh`, tagging the artifact with `threshold`
    fn texture(&mut self, mesh: &Self::Mesh, threshold: f64) -> Result<PathBuf>;
}

/// Tag used in artifact names: one decimal, so 1.0 -> "1.0", 1.5 -> "1.5".
pub fn format_threshold(threshold: f64) -> String {
    format!("{threshold:.1}")
}

/// One accepted iteration
#[derive(Debug, Clone, PartialEq)]
pub struct SimplificationTrial {
    pub threshold: f64,
    pub count: usize,
    pub textured: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    /// The simplified mesh fell to or below the minimum viable count.
    BelowMinimum,
    /// The threshold reached its upper bound.
    ThresholdLimit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    Exhausted {
        threshold: f64,
        count: usize,
        reason: ExhaustionReason,
    },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted {
                threshold,
                count,
                reason,
            } => {
                let why = match reason {
                    ExhaustionReason::BelowMinimum => "mesh too small",
                    ExhaustionReason::ThresholdLimit => "threshold limit reached",
                };
                write!(
                    f,
                    "no further simplification possible at threshold {} ({}, count {})",
                    format_threshold(*threshold),
                    why,
                    count
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopState {
    /// Full-detail mesh, textured by the caller at threshold 0.
    Baseline,
    Simplifying(f64),
    Terminated(Termination),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplificationReport {
    pub trials: Vec<SimplificationTrial>,
    pub termination: Termination,
}

/// Simplify-and-retexture search over increasing edge-collapse thresholds
///
/// Every trial collapses the *baseline* mesh, so thresholds are absolute and
/// never compounded. Running out of viable meshes ends the search normally;
/// a toolkit failure aborts it.
pub struct ProgressiveSimplifier {
    config: SimplificationConfig,
}

impl ProgressiveSimplifier {
    pub fn new(config: SimplificationConfig) -> Self {
        Self { config }
    }

    fn exhaustion(&self, threshold: f64, count: usize) -> Option<Termination> {
        let reason = if count <= self.config.min_count {
            ExhaustionReason::BelowMinimum
        } else if threshold >= self.config.upper_bound {
            ExhaustionReason::ThresholdLimit
        } else {
            return None;
        };
        Some(Termination::Exhausted {
            threshold,
            count,
            reason,
        })
    }

    /// Drive the search until it is exhausted or a toolkit call fails
    pub fn run<T: MeshToolkit>(
        &self,
        toolkit: &mut T,
        baseline: &T::Mesh,
    ) -> Result<SimplificationReport> {
        let _span = tracing::info_span!("progressive_simplification").entered();

        let mut trials = Vec::new();
        let mut state = LoopState::Baseline;

        loop {
            let threshold = match state {
                LoopState::Baseline => self.config.start,
                LoopState::Simplifying(threshold) => threshold,
                LoopState::Terminated(termination) => {
                    tracing::warn!("{}", termination);
                    return Ok(SimplificationReport {
                        trials,
                        termination,
                    });
                }
            };

            tracing::info!(
                "Collapsing short edges with threshold {}",
                format_threshold(threshold)
            );
            let mesh = toolkit.simplify(baseline, threshold)?;
            let count = toolkit.count(&mesh, self.config.metric)?;
            tracing::debug!("{:?} count after collapse: {}", self.config.metric, count);

            if let Some(termination) = self.exhaustion(threshold, count) {
                if let Err(err) = toolkit.discard(mesh) {
                    tracing::warn!("Failed to discard rejected mesh: {:#}", err);
                }
                state = LoopState::Terminated(termination);
                continue;
            }

            let mesh = toolkit.persist(mesh, threshold)?;
            let textured = toolkit.texture(&mesh, threshold)?;
            tracing::info!("Textured {}", textured.display());
            trials.push(SimplificationTrial {
                threshold,
                count,
                textured,
            });
            state = LoopState::Simplifying(threshold + self.config.step);
        }
    }
}
