use super::{ToolInvocation, ToolRunner};
use crate::error::Result;
use std::path::{Path, PathBuf};

pub struct OpenMvs<'a> {
    bin: PathBuf,
    runner: &'a dyn ToolRunner,
    remove_nan: Option<PathBuf>,
}

impl<'a> OpenMvs<'a> {
    pub fn new(
        bin: impl Into<PathBuf>,
        runner: &'a dyn ToolRunner,
        remove_nan: Option<PathBuf>,
    ) -> Self {
        Self {
            bin: bin.into(),
            runner,
            remove_nan,
        }
    }

    fn tool(&self, step: &str, name: &str) -> ToolInvocation {
        ToolInvocation::new(step, self.bin.join(name))
    }

    pub fn import_nvm(&self, dir: &Path) -> Result<()> {
        let inv = self
            .tool("6. Convert NVM to MVS", "InterfaceVisualSFM")
            .path_opt("-i", &dir.join("model.nvm"))
            .path_opt("-w", dir)
            .path_opt("-o", &dir.join("scene.mvs"));
        self.runner.run(&inv)
    }

    pub fn densify(&self, dir: &Path) -> Result<()> {
        let inv = self
            .tool("7. Densify point cloud", "DensifyPointCloud")
            .path_opt("-i", &dir.join("scene.mvs"))
            .path_opt("-w", dir)
            .path_opt("-o", &dir.join("scene_dense.mvs"))
            .opt("--process-priority", "1")
            .opt("--resolution-level", "1");
        self.runner.run(&inv)
    }

    /// No-op when no NaN filter is configured.
    pub fn remove_nan(&self, dir: &Path) -> Result<()> {
        let Some(program) = &self.remove_nan else {
            tracing::debug!("No NaN filter configured, keeping dense cloud as is");
            return Ok(());
        };
        let inv =
            ToolInvocation::new("8. Remove NaN points", program).arg(dir.join("scene_dense.mvs"));
        self.runner.run(&inv)
    }

    pub fn reconstruct_mesh(&self, dir: &Path) -> Result<()> {
        let inv = self
            .tool("9. Reconstruct the mesh", "ReconstructMesh")
            .path_opt("-i", &dir.join("scene_dense.mvs"))
            .path_opt("-w", dir)
            .opt("--process-priority", "1")
            .opt("-d", "7")
            .opt("--thickness-factor", "1.0")
            .opt("--quality-factor", "2.5")
            .opt("--close-holes", "30")
            .opt("--smooth", "3");
        self.runner.run(&inv)
    }

    pub fn refine_mesh(&self, dir: &Path) -> Result<()> {
        let inv = self
            .tool("10. Refine the mesh", "RefineMesh")
            .path_opt("-i", &dir.join("scene_dense_mesh.mvs"))
            .opt("--process-priority", "1")
            .opt("--resolution-level", "0")
            .opt("--ensure-edge-size", "2")
            .opt("--close-holes", "30")
            .path_opt("-w", dir);
        self.runner.run(&inv)
    }

    pub fn refined_mesh(dir: &Path) -> PathBuf {
        dir.join("scene_dense_mesh_refine.ply")
    }

    /// Densify through refinement; returns the refined mesh file.
    pub fn build_mesh(&self, dir: &Path) -> Result<PathBuf> {
        let _span = tracing::info_span!("mvs").entered();
        self.import_nvm(dir)?;
        self.densify(dir)?;
        self.remove_nan(dir)?;
        self.reconstruct_mesh(dir)?;
        self.refine_mesh(dir)?;
        Ok(Self::refined_mesh(dir))
    }

    /// Texture `mesh_file`; the scene is written as `scene_texture_<tag>.mvs`
    /// under `output_dir` and an OBJ export is produced next to it.
    pub fn texture(
        &self,
        dir: &Path,
        mesh_file: &Path,
        tag: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let output = output_dir.join(format!("scene_texture_{tag}.mvs"));
        let inv = self
            .tool(&format!("11. Texture the mesh ({tag})"), "TextureMesh")
            .path_opt("-i", &dir.join("scene_dense.mvs"))
            .path_opt("-o", &output)
            .path_opt("-w", dir)
            .opt("--process-priority", "1")
            .opt("--export-type", "obj")
            .path_opt("--mesh-file", mesh_file);
        self.runner.run(&inv)?;
        Ok(output)
    }
}
