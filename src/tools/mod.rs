mod colmap;
mod mesh;
mod openmvs;
mod process;

pub use colmap::Colmap;
pub use mesh::{read_mesh_stats, ExternalMeshToolkit, MeshStats, PlyMesh};
pub use openmvs::OpenMvs;
pub use process::ProcessRunner;

use crate::error::Result;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// One external program call with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Human readable step name for logs and errors
    pub step: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(step: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            step: step.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Flag followed by its value
    pub fn opt(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn path_opt(self, flag: &str, value: &Path) -> Self {
        self.opt(flag, value.as_os_str())
    }

    /// Argument list as lossy strings, mostly for assertions and logs
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Trait for executing external tools
///
/// Calls are blocking. A non-zero exit is an error; nothing is retried.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records invocations instead of running them; optionally fails one step.
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<ToolInvocation>>,
        pub fail_step: Option<String>,
    }

    impl RecordingRunner {
        pub fn steps(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.step.clone())
                .collect()
        }

        pub fn find(&self, step: &str) -> ToolInvocation {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.step == step)
                .cloned()
                .unwrap_or_else(|| panic!("no invocation for step {step}"))
        }
    }

    impl ToolRunner for RecordingRunner {
        fn run(&self, invocation: &ToolInvocation) -> Result<()> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.fail_step.as_deref() == Some(invocation.step.as_str()) {
                return Err(std::io::Error::other(format!("{} failed", invocation.step)).into());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_builder_keeps_argument_order() {
        let inv = ToolInvocation::new("mapper", "/opt/colmap/mapper")
            .path_opt("--database_path", Path::new("/w/database.db"))
            .opt("--Mapper.num_threads", "8")
            .arg("--verbose");
        assert_eq!(
            inv.args_lossy(),
            vec![
                "--database_path",
                "/w/database.db",
                "--Mapper.num_threads",
                "8",
                "--verbose"
            ]
        );
        assert_eq!(
            inv.to_string(),
            "/opt/colmap/mapper --database_path /w/database.db --Mapper.num_threads 8 --verbose"
        );
    }
}
