//! Background removal and photogrammetry orchestration for photo sets.

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod segmentation;
pub mod simplify;
pub mod tools;

pub use error::{Error, Result};
