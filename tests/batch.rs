mod common;

use common::{isolated_subject, uniform};
use recon_pipeline::batch::segment_directory;
use recon_pipeline::config::{BatchConfig, DecodeFailurePolicy};
use recon_pipeline::segmentation::EdgeContourSegmenter;
use recon_pipeline::Error;
use std::fs;
use std::path::Path;

fn populate(dir: &Path) {
    isolated_subject().save(dir.join("b.png")).unwrap();
    uniform(64, 48).save(dir.join("a.png")).unwrap();
    fs::write(dir.join("c.jpg"), b"definitely not a jpeg").unwrap();
    fs::write(dir.join("notes.txt"), b"shot on a tripod").unwrap();
}

#[test]
fn batch_processes_in_name_order_and_skips_undecodable() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let out = dst.path().join("images");
    populate(src.path());

    let config = BatchConfig::default();
    let segmenter = EdgeContourSegmenter::new(config.segmentation.clone());
    let report = segment_directory(src.path(), &out, &config, &segmenter).unwrap();

    assert_eq!(report.written, vec![out.join("a.png"), out.join("b.png")]);
    assert_eq!(report.degenerate, vec![out.join("a.png")]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, src.path().join("c.jpg"));

    assert!(!out.join("notes.txt").exists());
    assert!(!out.join("c.jpg").exists());

    let black = image::open(out.join("a.png")).unwrap().to_rgb8();
    assert_eq!(black.dimensions(), (64, 48));
    assert!(black.pixels().all(|p| p.0 == [0, 0, 0]));

    let segmented = image::open(out.join("b.png")).unwrap().to_rgb8();
    assert_eq!(segmented.get_pixel(100, 80).0, [220, 200, 180]);
    assert_eq!(segmented.get_pixel(5, 5).0, [0, 0, 0]);
}

#[test]
fn abort_policy_surfaces_the_decode_error() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    populate(src.path());

    let config = BatchConfig {
        on_decode_failure: DecodeFailurePolicy::Abort,
        ..Default::default()
    };
    let segmenter = EdgeContourSegmenter::new(config.segmentation.clone());
    match segment_directory(src.path(), dst.path(), &config, &segmenter) {
        Err(Error::Decode { path, .. }) => assert_eq!(path, src.path().join("c.jpg")),
        other => panic!("expected a decode error, got {other:?}"),
    }
}

#[test]
fn empty_directory_gives_empty_report() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let config = BatchConfig::default();
    let segmenter = EdgeContourSegmenter::new(config.segmentation.clone());

    let report = segment_directory(src.path(), dst.path(), &config, &segmenter).unwrap();
    assert!(report.written.is_empty());
    assert!(report.skipped.is_empty());
}
