use super::{ToolInvocation, ToolRunner};
use crate::config::MatchingStrategy;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

const DATABASE: &str = "database.db";

/// COLMAP stages; features are extracted once into a shared database that
/// each matching branch works on a copy of.
pub struct Colmap<'a> {
    bin: PathBuf,
    runner: &'a dyn ToolRunner,
    image_dir: PathBuf,
    result_dir: PathBuf,
    threads: u32,
}

impl<'a> Colmap<'a> {
    pub fn new(
        bin: impl Into<PathBuf>,
        runner: &'a dyn ToolRunner,
        image_dir: impl Into<PathBuf>,
        result_dir: impl Into<PathBuf>,
        threads: u32,
    ) -> Self {
        Self {
            bin: bin.into(),
            runner,
            image_dir: image_dir.into(),
            result_dir: result_dir.into(),
            threads,
        }
    }

    fn tool(&self, step: &str, name: &str) -> ToolInvocation {
        ToolInvocation::new(step, self.bin.join(name))
    }

    pub fn shared_database(&self) -> PathBuf {
        self.result_dir.join(DATABASE)
    }

    pub fn branch_dir(&self, strategy: MatchingStrategy) -> PathBuf {
        self.result_dir.join(strategy.dir_name())
    }

    /// Extract features once and give every branch its own database copy.
    pub fn extract_features(&self, strategies: &[MatchingStrategy]) -> Result<()> {
        let database = self.shared_database();
        let inv = self
            .tool("1. Extract features", "feature_extractor")
            .path_opt("--image_path", &self.image_dir)
            .path_opt("--database_path", &database)
            .opt("--ImageReader.single_camera", "1")
            .opt("--SiftExtraction.num_threads", self.threads.to_string())
            .opt("--use_gpu", "1");
        self.runner.run(&inv)?;

        for &strategy in strategies {
            let dir = self.branch_dir(strategy);
            fs::create_dir_all(&dir)?;
            fs::copy(&database, dir.join(DATABASE))?;
        }
        Ok(())
    }

    pub fn match_features(&self, strategy: MatchingStrategy) -> Result<()> {
        let dir = self.branch_dir(strategy);
        let inv = self
            .tool(&format!("2. Matching ({:?})", strategy), strategy.matcher())
            .path_opt("--database_path", &dir.join(DATABASE))
            .opt("--SiftMatching.num_threads", self.threads.to_string());
        self.runner.run(&inv)
    }

    pub fn map(&self, strategy: MatchingStrategy) -> Result<()> {
        let dir = self.branch_dir(strategy);
        let export = dir.join("sparse");
        fs::create_dir_all(&export)?;
        let inv = self
            .tool("3. Sparse reconstruction", "mapper")
            .path_opt("--database_path", &dir.join(DATABASE))
            .path_opt("--image_path", &self.image_dir)
            .path_opt("--export_path", &export)
            .opt("--Mapper.num_threads", self.threads.to_string());
        self.runner.run(&inv)
    }

    pub fn undistort(&self, strategy: MatchingStrategy) -> Result<()> {
        let dir = self.branch_dir(strategy);
        let output = dir.join("dense");
        fs::create_dir_all(&output)?;
        let inv = self
            .tool("4. Image undistortion", "image_undistorter")
            .path_opt("--image_path", &self.image_dir)
            .path_opt("--input_path", &sparse_model(&dir))
            .path_opt("--output_path", &output)
            .opt("--output_type", "COLMAP");
        self.runner.run(&inv)
    }

    /// Returns the directory holding `model.nvm` and the undistorted images.
    pub fn convert_to_nvm(&self, strategy: MatchingStrategy) -> Result<PathBuf> {
        let dir = self.branch_dir(strategy);
        let reconstruction_dir = dir.join("dense").join("images");
        let inv = self
            .tool("5. Model conversion", "model_converter")
            .path_opt("--input_path", &sparse_model(&dir))
            .path_opt("--output_path", &reconstruction_dir.join("model.nvm"))
            .opt("--output_type", "nvm");
        self.runner.run(&inv)?;
        Ok(reconstruction_dir)
    }

    /// Matching through NVM export for one branch.
    pub fn sfm(&self, strategy: MatchingStrategy) -> Result<PathBuf> {
        let _span = tracing::info_span!("sfm", branch = ?strategy).entered();
        self.match_features(strategy)?;
        self.map(strategy)?;
        self.undistort(strategy)?;
        self.convert_to_nvm(strategy)
    }
}

fn sparse_model(branch_dir: &Path) -> PathBuf {
    branch_dir.join("sparse").join("0")
}
