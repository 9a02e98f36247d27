mod common;

use common::*;
use image::GenericImageView;
use imgpress::{
    check_conflicts, compress, convert, get_exif_info, has_exif_data, strip_metadata, BatchConfig,
    BatchProcessor, ConflictPolicy, ConflictStrategy, FailureKind, FileOutcome,
    FormatCapabilities, OutputSelection, ProcessingRequest,
};
use std::fs;

#[test]
fn jpeg_compress_keeps_dimensions_and_reports_sizes() {
    let temp = create_temp_directory();
    let input = write_jpeg(temp.path(), "photo.jpg", 800, 600);
    let output = temp.path().join("out").join("photo.jpg");

    let result = compress(&ProcessingRequest::compress(&input, &output, 80, false));

    assert!(result.success, "{}", result.message);
    assert!(result.message.starts_with("Compressed: "));
    assert_eq!(result.original_size_bytes, fs::metadata(&input).unwrap().len());
    assert_eq!(result.output_size_bytes, fs::metadata(&output).unwrap().len());
    let expected = (result.original_size_bytes as f64 - result.output_size_bytes as f64)
        / result.original_size_bytes as f64
        * 100.0;
    assert!((result.reduction_pct - expected).abs() < 1e-9);
    assert_eq!(image::open(&output).unwrap().dimensions(), (800, 600));
}

#[test]
fn jpeg_compress_keeps_exif_unless_asked_to_strip() {
    let temp = create_temp_directory();
    let input = write_jpeg_with_exif(temp.path(), "camera.jpg", "Pinhole");
    let kept = temp.path().join("kept.jpg");
    let stripped = temp.path().join("stripped.jpg");

    assert!(compress(&ProcessingRequest::compress(&input, &kept, 80, false)).success);
    assert!(compress(&ProcessingRequest::compress(&input, &stripped, 80, true)).success);

    assert!(has_exif_data(&kept));
    assert!(!has_exif_data(&stripped));
}

#[cfg(feature = "avif")]
#[test]
fn transparent_png_to_avif_is_written_opaque() {
    let temp = create_temp_directory();
    let input = write_rgba_png(temp.path(), "logo.png", 32, 32, [0, 0, 0, 0]);
    let request =
        ProcessingRequest::convert(&input, temp.path().join("logo.png"), "AVIF", 60, false);

    let result = convert(&request, &FormatCapabilities::new(true));

    assert!(result.success, "{}", result.message);
    let written = temp.path().join("logo.avif");
    assert_eq!(result.output_path.as_deref(), Some(written.as_path()));
    let bytes = fs::read(&written).unwrap();
    assert_eq!(&bytes[4..8], b"ftyp");
}

#[test]
fn jpeg_to_webp_forwards_exif_unless_asked_to_strip() {
    let temp = create_temp_directory();
    let input = write_jpeg_with_exif(temp.path(), "camera.jpg", "Pinhole");
    let capabilities = FormatCapabilities::new(true);

    let kept = temp.path().join("kept").join("camera.jpg");
    let request = ProcessingRequest::convert(&input, &kept, "webp", 80, false);
    let result = convert(&request, &capabilities);
    assert!(result.success, "{}", result.message);
    let kept = temp.path().join("kept").join("camera.webp");
    assert!(has_exif_data(&kept));
    assert!(get_exif_info(&kept)["Make"].contains("Pinhole"));

    let stripped = temp.path().join("stripped").join("camera.jpg");
    let request = ProcessingRequest::convert(&input, &stripped, "webp", 80, true);
    assert!(convert(&request, &capabilities).success);
    assert!(!has_exif_data(&temp.path().join("stripped").join("camera.webp")));
}

#[cfg(feature = "avif")]
#[test]
fn avif_output_never_carries_exif() {
    let temp = create_temp_directory();
    let input = write_jpeg_with_exif(temp.path(), "camera.jpg", "Pinhole");
    let request =
        ProcessingRequest::convert(&input, temp.path().join("camera.jpg"), "avif", 60, false);

    let result = convert(&request, &FormatCapabilities::new(true));

    assert!(result.success, "{}", result.message);
    assert!(!has_exif_data(&temp.path().join("camera.avif")));
}

#[test]
fn avif_without_encoder_fails_with_capability_error() {
    let temp = create_temp_directory();
    let input = write_png(temp.path(), "a.png", 16, 16);
    let request = ProcessingRequest::convert(&input, temp.path().join("a.png"), "avif", 60, false);

    let result = convert(&request, &FormatCapabilities::new(false));

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::Capability));
    assert!(result.message.contains("AVIF encoder not installed"));
    assert!(!temp.path().join("a.avif").exists());
}

#[test]
fn skip_batch_leaves_existing_output_untouched() {
    let temp = create_temp_directory();
    let inputs_dir = temp.path().join("in");
    fs::create_dir(&inputs_dir).unwrap();
    let output_dir = create_test_output_directory(temp.path());
    let inputs = vec![
        write_jpeg(&inputs_dir, "a.jpg", 64, 64),
        write_jpeg(&inputs_dir, "b.jpg", 64, 64),
        write_png(&inputs_dir, "c.png", 64, 64),
    ];
    fs::write(output_dir.join("b.jpg"), b"keep me").unwrap();

    let mut config = BatchConfig::new(&output_dir);
    config.conflict_policy = ConflictPolicy::uniform(ConflictStrategy::Skip);
    config.threads = 2;
    let capabilities = FormatCapabilities::new(true);
    let report = BatchProcessor::new(config, &capabilities)
        .run(&inputs, |_| {})
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 1);
    assert!(matches!(report.files[1].outcome, FileOutcome::Skipped { .. }));
    assert_eq!(fs::read(output_dir.join("b.jpg")).unwrap(), b"keep me");
    assert!(output_dir.join("a.jpg").exists());
    assert!(output_dir.join("c.png").exists());
}

#[test]
fn auto_rename_batch_writes_next_free_name() {
    let temp = create_temp_directory();
    let inputs_dir = temp.path().join("in");
    fs::create_dir(&inputs_dir).unwrap();
    let output_dir = create_test_output_directory(temp.path());
    let input = write_jpeg(&inputs_dir, "photo.jpg", 32, 32);
    fs::write(output_dir.join("photo.jpg"), b"old").unwrap();
    fs::write(output_dir.join("photo_1.jpg"), b"older").unwrap();

    let mut config = BatchConfig::new(&output_dir);
    config.conflict_policy = ConflictPolicy::uniform(ConflictStrategy::AutoRename);
    let capabilities = FormatCapabilities::new(true);
    let report = BatchProcessor::new(config, &capabilities)
        .run(&[input], |_| {})
        .unwrap();

    assert_eq!(report.succeeded, 1);
    let written = output_dir.join("photo_2.jpg");
    assert_eq!(
        report.files[0].result().unwrap().output_path.as_deref(),
        Some(written.as_path())
    );
    assert!(image::open(&written).is_ok());
    assert_eq!(fs::read(output_dir.join("photo.jpg")).unwrap(), b"old");
}

#[test]
fn webp_batch_output_matches_predicted_conflict_path() {
    let temp = create_temp_directory();
    let inputs_dir = temp.path().join("in");
    fs::create_dir(&inputs_dir).unwrap();
    let output_dir = create_test_output_directory(temp.path());
    let inputs = vec![write_png(&inputs_dir, "shot.png", 32, 32)];

    let mut config = BatchConfig::new(&output_dir);
    config.selection = OutputSelection::WebP;
    let capabilities = FormatCapabilities::new(true);
    let report = BatchProcessor::new(config, &capabilities)
        .run(&inputs, |_| {})
        .unwrap();
    assert_eq!(report.succeeded, 1);

    let conflicts = check_conflicts(&inputs, &output_dir, OutputSelection::WebP);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        report.files[0].result().unwrap().output_path.as_deref(),
        Some(conflicts[0].predicted_output_path.as_path())
    );
}

#[test]
fn conflict_checks_are_idempotent() {
    let temp = create_temp_directory();
    let output_dir = create_test_output_directory(temp.path());
    fs::write(output_dir.join("a.webp"), vec![0u8; 100]).unwrap();
    let inputs = vec![temp.path().join("a.jpg"), temp.path().join("b.jpg")];

    let first = check_conflicts(&inputs, &output_dir, OutputSelection::WebP);
    let second = check_conflicts(&inputs, &output_dir, OutputSelection::WebP);

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
fn strip_then_has_exif_is_false() {
    let temp = create_temp_directory();
    let input = write_jpeg_with_exif(temp.path(), "camera.jpg", "Pinhole");
    let output = temp.path().join("clean.jpg");
    assert!(has_exif_data(&input));

    let (ok, message) = strip_metadata(&input, &output);

    assert!(ok, "{}", message);
    assert!(!has_exif_data(&output));
}
