use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Input file could not be read as an image. Local to that one file.
    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start {step} ({})", program.display())]
    ToolSpawn {
        step: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool exited with a non-zero status. Fatal for the whole run.
    #[error(
        "{step} failed ({}, {status})\nstdout:\n{stdout}\nstderr:\n{stderr}",
        program.display()
    )]
    ToolFailed {
        step: String,
        program: PathBuf,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("cannot read mesh header {}: {message}", path.display())]
    MeshHeader { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
