// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the detection counter library

use std::collections::HashMap;
use std::path::Path;

use image::DynamicImage;

use detection_counter::cli::args::CountArgs;
use detection_counter::cli::count::run_count;
use detection_counter::{
    CounterConfig, CounterError, Detection, DetectionCount, DetectionSet, Detector, Prediction,
    Result, RunLog, YoloModel, counter, source,
};

/// Stand-in detector returning a fixed class-id list for every image.
struct ScriptedDetector {
    class_ids: Vec<usize>,
    calls: usize,
}

impl ScriptedDetector {
    fn new(class_ids: &[usize]) -> Self {
        Self {
            class_ids: class_ids.to_vec(),
            calls: 0,
        }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Prediction> {
        self.calls += 1;
        let detections = self
            .class_ids
            .iter()
            .map(|&c| Detection::new([1.0, 1.0, 5.0, 5.0], 0.8, c))
            .collect();
        let set = DetectionSet::new((image.height(), image.width()), detections);
        let names = HashMap::from([(0, "A".to_string()), (1, "B".to_string())]);
        Ok(Prediction::new(vec![set], names))
    }
}

fn count_args(dir: &Path, model: &str) -> CountArgs {
    CountArgs {
        model: dir.join(model).to_string_lossy().into_owned(),
        source: dir.join("field.jpg").to_string_lossy().into_owned(),
        log: dir.join("detections_log.txt").to_string_lossy().into_owned(),
        conf: 0.25,
        iou: 0.45,
        max_det: 1000,
        imgsz: None,
        threads: 0,
        half: false,
        verbose: false,
    }
}

#[test]
fn test_counter_config_defaults() {
    let config = CounterConfig::default();
    assert!((config.confidence_threshold - 0.25).abs() < f32::EPSILON);
    assert!((config.iou_threshold - 0.45).abs() < f32::EPSILON);
    assert_eq!(config.max_detections, 1000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_count_lines_for_mixed_classes() {
    let image = DynamicImage::new_rgb8(32, 24);
    let mut detector = ScriptedDetector::new(&[0, 1, 0, 0]);

    let counts = counter::run(&image, &mut detector).unwrap();
    let lines: Vec<String> = counts.iter().map(ToString::to_string).collect();

    assert_eq!(detector.calls, 1);
    assert_eq!(lines, vec!["3 A", "1 B"]);
}

#[test]
fn test_no_detections_prints_nothing() {
    let image = DynamicImage::new_rgb8(32, 24);
    let counts = counter::run(&image, &mut ScriptedDetector::new(&[])).unwrap();

    assert!(counts.is_empty());
    assert_eq!(counter::summarize(&counts), "(no detections)");
}

#[test]
fn test_counts_sum_to_detection_total() {
    let image = DynamicImage::new_rgb8(8, 8);
    let mut detector = ScriptedDetector::new(&[1, 1, 0, 1, 0]);

    let prediction = detector.detect(&image).unwrap();
    let counts = counter::count(&prediction);

    assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), prediction.len());
    assert!(counts.iter().all(|c| c.count >= 1));
}

#[test]
fn test_run_log_grows_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("detections_log.txt");

    for source in ["first.jpg", "second.jpg"] {
        let mut log = RunLog::open(&path).unwrap();
        log.record(source, &[DetectionCount::new("A", 3), DetectionCount::new("B", 1)])
            .unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("first.jpg: 3 A, 1 B"));
    assert!(lines[1].ends_with("second.jpg: 3 A, 1 B"));
}

#[test]
fn test_missing_model_leaves_no_log() {
    let dir = tempfile::tempdir().unwrap();
    let args = count_args(dir.path(), "strawberry.onnx");

    let result = run_count(&args);
    assert!(matches!(result, Err(CounterError::ModelLoadError(_))));
    assert!(!Path::new(&args.log).exists());
}

#[test]
fn test_pytorch_checkpoint_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strawberry.pt");
    std::fs::write(&path, b"not an onnx graph").unwrap();

    let err = YoloModel::load(&path).unwrap_err();
    assert!(matches!(err, CounterError::ModelLoadError(_)));
    assert!(err.to_string().contains("format=onnx"));
}

#[test]
fn test_undecodable_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"\x00\x01\x02 definitely not a jpeg").unwrap();

    assert!(matches!(
        source::load_image(&path),
        Err(CounterError::ImageDecodeError(_))
    ));
    assert!(matches!(
        source::load_image(dir.path().join("absent.jpg")),
        Err(CounterError::ImageDecodeError(_))
    ));
}
