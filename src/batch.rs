use crate::config::{BatchConfig, DecodeFailurePolicy};
use crate::error::{Error, Result};
use crate::segmentation::BackgroundSegmenter;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchReport {
    /// Written outputs, in scan order.
    pub written: Vec<PathBuf>,
    /// Outputs that came out fully black because no region was significant.
    pub degenerate: Vec<PathBuf>,
    /// Inputs that could not be decoded, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

enum Outcome {
    Written { output: PathBuf, degenerate: bool },
    Skipped { input: PathBuf, reason: String },
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|known| *known == e)
        })
        .unwrap_or(false)
}

/// Regular files in `dir` with a recognized extension, sorted by file name.
pub fn scan_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_extension(&path, extensions) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

fn segment_file(
    input: &Path,
    destination: &Path,
    segmenter: &dyn BackgroundSegmenter,
    policy: DecodeFailurePolicy,
) -> Result<Outcome> {
    let _span = tracing::debug_span!("segment_file", file = %input.display()).entered();

    let decoded = image::open(input).map_err(|source| Error::Decode {
        path: input.to_path_buf(),
        source,
    });
    let photo = match (decoded, policy) {
        (Ok(photo), _) => photo.to_rgb8(),
        (Err(err), DecodeFailurePolicy::Skip) => {
            tracing::warn!("Can't open {} as image, skipping: {:#}", input.display(), err);
            return Ok(Outcome::Skipped {
                input: input.to_path_buf(),
                reason: err.to_string(),
            });
        }
        (Err(err), DecodeFailurePolicy::Abort) => return Err(err),
    };

    let segmentation = segmenter.segment(&photo);

    // scan_images only yields paths with a file name
    let output = destination.join(input.file_name().unwrap_or_default());
    segmentation
        .image
        .save(&output)
        .map_err(|source| Error::Encode {
            path: output.clone(),
            source,
        })?;

    let degenerate = segmentation.is_degenerate();
    if degenerate {
        tracing::warn!("No significant region in {}, output is black", input.display());
    } else {
        tracing::info!(
            "Segmented {} ({} regions)",
            input.display(),
            segmentation.regions.len()
        );
    }
    Ok(Outcome::Written { output, degenerate })
}

/// Segment every eligible photo in `source` into `destination`
///
/// Non-matching files are ignored. Decode failures follow
/// `config.on_decode_failure`; write failures always abort.
pub fn segment_directory(
    source: &Path,
    destination: &Path,
    config: &BatchConfig,
    segmenter: &dyn BackgroundSegmenter,
) -> Result<BatchReport> {
    let _span = tracing::info_span!("segment_directory").entered();

    fs::create_dir_all(destination)?;
    let images = scan_images(source, &config.extensions)?;
    tracing::info!(
        "Segmenting {} images from {} with {}",
        images.len(),
        source.display(),
        segmenter.name()
    );

    let outcomes: Vec<Outcome> = images
        .par_iter()
        .map(|input| segment_file(input, destination, segmenter, config.on_decode_failure))
        .collect::<Result<_>>()?;

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Written { output, degenerate } => {
                if degenerate {
                    report.degenerate.push(output.clone());
                }
                report.written.push(output);
            }
            Outcome::Skipped { input, reason } => report.skipped.push((input, reason)),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXTENSIONS;

    fn defaults() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let exts = defaults();
        assert!(has_extension(Path::new("a/IMG_001.JPG"), &exts));
        assert!(has_extension(Path::new("b.Png"), &exts));
        assert!(!has_extension(Path::new("notes.txt"), &exts));
        assert!(!has_extension(Path::new("jpg"), &exts));
    }

    #[test]
    fn scan_is_sorted_by_name_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "a.PNG", "b.jpeg", "readme.md", "z.tif"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("d.jpg")).unwrap();

        let found = scan_images(dir.path(), &defaults()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpeg", "c.jpg", "z.tif"]);
    }
}
