use super::{ToolInvocation, ToolRunner};
use crate::error::{Error, Result};
use std::process::Command;

/// Runs tools as child processes, capturing their output for diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<()> {
        let _span = tracing::info_span!("tool", step = %invocation.step).entered();
        tracing::info!("{}", invocation.step);
        tracing::debug!("{}", invocation);

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|source| Error::ToolSpawn {
                step: invocation.step.clone(),
                program: invocation.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                step: invocation.step.clone(),
                program: invocation.program.clone(),
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        tracing::info!("{} succeeded", invocation.step);
        Ok(())
    }
}
