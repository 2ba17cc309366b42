use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use ela_detect::{
    Classifier, DetectorConfig, FeatureTensor, ModelLoader, ModelStatus, TamperingDetector,
    Verdict,
    error::{ErrorClass, ForensicsError, Result},
    report::ErrorReport,
};
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

/// Says "real" when the ELA tensor is all dark, "fake" otherwise.
struct BrightnessClassifier;

impl Classifier for BrightnessClassifier {
    fn predict(&self, input: &FeatureTensor) -> Result<Vec<f32>> {
        let peak = input.view().iter().copied().fold(0.0f32, f32::max);
        if peak < 0.5 {
            Ok(vec![0.02, 0.98])
        } else {
            Ok(vec![0.9, 0.1])
        }
    }

    fn name(&self) -> &str {
        "brightness"
    }
}

struct StubLoader {
    loads: Arc<AtomicUsize>,
}

impl ModelLoader for StubLoader {
    fn load(&self) -> Result<Arc<dyn Classifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(BrightnessClassifier))
    }

    fn describe(&self) -> String {
        "stub".into()
    }
}

struct Fixture {
    root: TempDir,
    detector: TamperingDetector,
    loads: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = StubLoader { loads: Arc::clone(&loads) };

        let config = DetectorConfig {
            artifact_dir: root.path().join("static/ela"),
            temp_dir: Some(root.path().join("tmp")),
            ..DetectorConfig::default()
        };

        let detector = TamperingDetector::with_loader(config, loader).unwrap();

        Self { root, detector, loads }
    }

    fn tmp_dir(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    fn artifact_dir(&self) -> PathBuf {
        self.root.path().join("static/ela")
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

#[test]
fn solid_color_png_is_authentic() {
    let fixture = Fixture::new();
    let bytes = png_bytes(&RgbImage::from_pixel(256, 256, Rgb([0, 0, 0])));

    let result = fixture.detector.predict_tampering(&bytes, "image/png").unwrap();

    assert_eq!(result.prediction, Verdict::Authentic);
    assert!((result.confidence - 0.98).abs() < 1e-6);
    assert!(result.ela_image.starts_with("data:image/jpeg;base64,"));
    assert!(result.ela_path.starts_with("/static/ela/ela_"));
    assert!(result.processing_time_ms >= 0.0);

    let encoded = result.ela_image.trim_start_matches("data:image/jpeg;base64,");
    let ela = image::load_from_memory(&STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!((ela.width(), ela.height()), (256, 256));
}

#[test]
fn noisy_image_is_tampered() {
    let fixture = Fixture::new();
    let noisy = RgbImage::from_fn(96, 96, |x, y| {
        let v = ((x * 73 + y * 151) ^ (x * y)) % 256;
        Rgb([v as u8, (255 - v) as u8, (v * 3 % 256) as u8])
    });

    let result = fixture
        .detector
        .predict_tampering(&png_bytes(&noisy), "image/png")
        .unwrap();
    assert_eq!(result.prediction, Verdict::Tampered);
    assert!((result.confidence - 0.9).abs() < 1e-6);
}

#[test]
fn repeated_requests_are_deterministic_but_uniquely_stored() {
    let fixture = Fixture::new();
    let image = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
    let bytes = png_bytes(&image);

    let first = fixture.detector.predict_tampering(&bytes, "image/png").unwrap();
    let second = fixture.detector.predict_tampering(&bytes, "image/png").unwrap();

    assert_eq!(first.prediction, second.prediction);
    assert_eq!(first.confidence, second.confidence);
    assert_ne!(first.ela_path, second.ela_path);
    assert_eq!(count_files(&fixture.artifact_dir()), 2);
}

#[test]
fn text_upload_is_rejected_before_any_io() {
    let fixture = Fixture::new();

    let err = fixture
        .detector
        .predict_tampering(b"hello, world", "text/plain")
        .unwrap_err();

    assert!(matches!(err, ForensicsError::InvalidInput(_)));
    assert_eq!(err.class(), ErrorClass::Client);
    assert_eq!(count_files(&fixture.tmp_dir()), 0);
    assert_eq!(count_files(&fixture.artifact_dir()), 0);
    assert_eq!(fixture.loads.load(Ordering::SeqCst), 0);
}

#[test]
fn undecodable_image_is_client_error_and_cleaned_up() {
    let fixture = Fixture::new();

    let err = fixture
        .detector
        .predict_tampering(b"\x89PNG but not really", "image/png")
        .unwrap_err();

    assert!(matches!(err, ForensicsError::Decode(_)));
    assert_eq!(ErrorReport::from(&err).status, 400);
    assert_eq!(count_files(&fixture.tmp_dir()), 0);
    assert_eq!(count_files(&fixture.artifact_dir()), 0);
}

#[test]
fn temp_files_removed_after_success() {
    let fixture = Fixture::new();
    let bytes = png_bytes(&RgbImage::from_pixel(32, 32, Rgb([200, 10, 10])));

    fixture.detector.predict_tampering(&bytes, "image/png").unwrap();
    assert_eq!(count_files(&fixture.tmp_dir()), 0);
}

#[test]
fn health_reflects_model_state() {
    let fixture = Fixture::new();

    let before = fixture.detector.health();
    assert_eq!(before.status, "ok");
    assert!(!before.model_loaded);
    assert_eq!(before.model_status, ModelStatus::Unloaded);

    let bytes = png_bytes(&RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])));
    fixture.detector.predict_tampering(&bytes, "image/png").unwrap();

    assert!(fixture.detector.health().model_loaded);
}

#[test]
fn startup_load_marks_model_loaded() {
    let fixture = Fixture::new();

    let handle = fixture.detector.model_state().spawn_initial_load().unwrap();
    handle.join().unwrap();

    assert!(fixture.detector.health().model_loaded);
    assert_eq!(fixture.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_requests_share_one_model() {
    let fixture = Arc::new(Fixture::new());
    let image = RgbImage::from_fn(40, 40, |x, y| Rgb([x as u8, y as u8, 0]));
    let bytes = Arc::new(png_bytes(&image));

    let handles = (0..6)
        .map(|_| {
            let fixture = Arc::clone(&fixture);
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || {
                fixture.detector.predict_tampering(&bytes, "image/png").unwrap()
            })
        })
        .collect::<Vec<_>>();

    let results = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();

    let mut paths = results.iter().map(|r| r.ela_path.clone()).collect::<Vec<_>>();
    paths.sort();
    paths.dedup();

    assert_eq!(paths.len(), 6);
    assert_eq!(fixture.loads.load(Ordering::SeqCst), 1);
    assert_eq!(count_files(&fixture.tmp_dir()), 0);
    assert_eq!(count_files(&fixture.artifact_dir()), 6);
}

#[test]
fn artifact_persist_failure_fails_request() {
    let fixture = Fixture::new();
    fs::remove_dir_all(fixture.artifact_dir()).unwrap();
    fs::write(fixture.artifact_dir(), b"not a directory").unwrap();

    let bytes = png_bytes(&RgbImage::from_pixel(24, 24, Rgb([10, 20, 30])));
    let err = fixture.detector.predict_tampering(&bytes, "image/png").unwrap_err();

    assert!(matches!(err, ForensicsError::ArtifactPersist { .. }));
    assert_eq!(err.status_code(), 500);
    assert_eq!(count_files(&fixture.tmp_dir()), 0);
}

/// Removes every upload from the temp dir while the request is still running.
struct UploadSnatcher {
    tmp_dir: PathBuf,
}

impl Classifier for UploadSnatcher {
    fn predict(&self, _input: &FeatureTensor) -> Result<Vec<f32>> {
        for entry in fs::read_dir(&self.tmp_dir)? {
            fs::remove_file(entry?.path())?;
        }
        Ok(vec![0.3, 0.7])
    }

    fn name(&self) -> &str {
        "snatcher"
    }
}

struct SnatcherLoader {
    tmp_dir: PathBuf,
}

impl ModelLoader for SnatcherLoader {
    fn load(&self) -> Result<Arc<dyn Classifier>> {
        Ok(Arc::new(UploadSnatcher { tmp_dir: self.tmp_dir.clone() }))
    }

    fn describe(&self) -> String {
        "snatcher".into()
    }
}

#[test]
fn failed_upload_release_leaves_no_artifact() {
    let root = tempfile::tempdir().unwrap();
    let loader = SnatcherLoader { tmp_dir: root.path().join("tmp") };

    let config = DetectorConfig {
        artifact_dir: root.path().join("static/ela"),
        temp_dir: Some(root.path().join("tmp")),
        ..DetectorConfig::default()
    };
    let detector = TamperingDetector::with_loader(config, loader).unwrap();

    let bytes = png_bytes(&RgbImage::from_pixel(24, 24, Rgb([90, 90, 90])));
    let err = detector.predict_tampering(&bytes, "image/png").unwrap_err();

    assert!(matches!(err, ForensicsError::Io(_)));
    assert_eq!(count_files(&root.path().join("static/ela")), 0);
}
