use super::{OpenMvs, ToolInvocation, ToolRunner};
use crate::config::MeshMetric;
use crate::error::{Error, Result};
use crate::simplify::{format_threshold, MeshToolkit};
use anyhow::Context;
use ply_rs::parser::Parser;
use ply_rs::ply::DefaultElement;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Element counts declared in a PLY header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshStats {
    pub vertices: usize,
    pub faces: usize,
}

impl MeshStats {
    pub fn count(&self, metric: MeshMetric) -> usize {
        match metric {
            MeshMetric::Vertices => self.vertices,
            MeshMetric::Faces => self.faces,
        }
    }
}

/// Read vertex and face counts without loading the payload.
pub fn read_mesh_stats(path: &Path) -> Result<MeshStats> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(&mut reader).map_err(|e| Error::MeshHeader {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let count = |name: &str| header.elements.get(name).map(|e| e.count).unwrap_or(0);
    Ok(MeshStats {
        vertices: count("vertex"),
        faces: count("face"),
    })
}

/// Mesh file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyMesh {
    pub path: PathBuf,
}

/// Simplification toolkit backed by an external edge-collapse program and
/// OpenMVS texturing
///
/// The collapse program is called as
/// `<program> --input <ply> --output <ply> --rel-threshold <t>`.
/// Collapsed meshes go to `collapse_<t>.ply`; accepted ones are renamed to
/// `remesh_<t>.ply` before texturing; rejected ones are deleted.
pub struct ExternalMeshToolkit<'a> {
    simplifier: PathBuf,
    runner: &'a dyn ToolRunner,
    mvs: &'a OpenMvs<'a>,
    reconstruction_dir: PathBuf,
    output_dir: PathBuf,
}

impl<'a> ExternalMeshToolkit<'a> {
    pub fn new(
        simplifier: impl Into<PathBuf>,
        runner: &'a dyn ToolRunner,
        mvs: &'a OpenMvs<'a>,
        reconstruction_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            simplifier: simplifier.into(),
            runner,
            mvs,
            reconstruction_dir: reconstruction_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    fn collapse_path(&self, threshold: f64) -> PathBuf {
        self.reconstruction_dir
            .join(format!("collapse_{}.ply", format_threshold(threshold)))
    }

    pub fn remesh_path(&self, threshold: f64) -> PathBuf {
        self.reconstruction_dir
            .join(format!("remesh_{}.ply", format_threshold(threshold)))
    }
}

impl MeshToolkit for ExternalMeshToolkit<'_> {
    type Mesh = PlyMesh;

    fn simplify(&mut self, baseline: &PlyMesh, threshold: f64) -> anyhow::Result<PlyMesh> {
        let output = self.collapse_path(threshold);
        let inv = ToolInvocation::new(
            format!("Collapse short edges ({})", format_threshold(threshold)),
            &self.simplifier,
        )
        .path_opt("--input", &baseline.path)
        .path_opt("--output", &output)
        .opt("--rel-threshold", threshold.to_string());
        self.runner.run(&inv)?;
        Ok(PlyMesh { path: output })
    }

    fn count(&self, mesh: &PlyMesh, metric: MeshMetric) -> anyhow::Result<usize> {
        let stats = read_mesh_stats(&mesh.path)?;
        Ok(stats.count(metric))
    }

    fn persist(&mut self, mesh: PlyMesh, threshold: f64) -> anyhow::Result<PlyMesh> {
        let target = self.remesh_path(threshold);
        fs::rename(&mesh.path, &target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                mesh.path.display(),
                target.display()
            )
        })?;
        Ok(PlyMesh { path: target })
    }

    fn discard(&mut self, mesh: PlyMesh) -> anyhow::Result<()> {
        fs::remove_file(&mesh.path)
            .with_context(|| format!("Failed to remove {}", mesh.path.display()))
    }

    fn texture(&mut self, mesh: &PlyMesh, threshold: f64) -> anyhow::Result<PathBuf> {
        let textured = self.mvs.texture(
            &self.reconstruction_dir,
            &mesh.path,
            &format_threshold(threshold),
            &self.output_dir,
        )?;
        Ok(textured)
    }
}
