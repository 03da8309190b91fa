use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gearscan::{Detector, LabelSet, ModelHandle, RawBox, RawResult, Result, TaskMode};
use image::{DynamicImage, ImageBuffer, Rgb};

pub const RED: Rgb<u8> = Rgb([220, 20, 20]);
pub const GREEN: Rgb<u8> = Rgb([20, 220, 20]);
pub const BLUE: Rgb<u8> = Rgb([20, 20, 220]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Writes a 64x64 single-color image; the format follows the file extension.
pub fn create_test_image(dir: &Path, name: &str, color: Rgb<u8>) -> PathBuf {
    create_sized_image(dir, name, color, 64, 64)
}

pub fn create_sized_image(dir: &Path, name: &str, color: Rgb<u8>, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = ImageBuffer::from_pixel(width, height, color);
    img.save(&path).expect("Failed to save test image");
    path
}

/// Writes a file with an image extension that no decoder accepts.
pub fn create_corrupt_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"definitely not an image").expect("Failed to write corrupt image");
    path
}

/// Classifier keyed on the dominant channel of the top-left pixel:
/// red -> pitting, green -> scuffing, blue -> spalling, otherwise indentation.
#[derive(Debug, Default)]
pub struct ColorKeyedModel;

impl ColorKeyedModel {
    fn class_for(image: &DynamicImage) -> usize {
        let Rgb([r, g, b]) = *image.to_rgb8().get_pixel(0, 0);
        if r > 150 && g < 100 && b < 100 {
            1
        } else if g > 150 && r < 100 && b < 100 {
            2
        } else if b > 150 && r < 100 && g < 100 {
            3
        } else {
            0
        }
    }
}

impl ModelHandle for ColorKeyedModel {
    fn task(&self) -> TaskMode {
        TaskMode::Classify
    }

    fn infer(&self, image: &DynamicImage) -> Result<RawResult> {
        let mut probs = vec![0.05; 4];
        probs[Self::class_for(image)] = 0.85;
        Ok(RawResult::Probabilities(probs))
    }
}

/// Color-keyed classifier that ships its own class names, in a different
/// order from the alphabetical default.
pub struct EmbeddedLabelsModel {
    labels: LabelSet,
}

impl EmbeddedLabelsModel {
    pub const ORDER: [&'static str; 4] = ["pitting", "indentation", "scuffing", "spalling"];

    pub fn new() -> Self {
        Self {
            labels: LabelSet::new(Self::ORDER),
        }
    }
}

impl ModelHandle for EmbeddedLabelsModel {
    fn task(&self) -> TaskMode {
        TaskMode::Classify
    }

    fn labels(&self) -> Option<&LabelSet> {
        Some(&self.labels)
    }

    fn infer(&self, image: &DynamicImage) -> Result<RawResult> {
        ColorKeyedModel.infer(image)
    }
}

/// Wraps another model and counts how often it is asked to infer.
pub struct CountingModel<M> {
    inner: M,
    calls: Arc<AtomicUsize>,
}

impl<M> CountingModel<M> {
    pub fn new(inner: M) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl<M: ModelHandle> ModelHandle for CountingModel<M> {
    fn task(&self) -> TaskMode {
        self.inner.task()
    }

    fn infer(&self, image: &DynamicImage) -> Result<RawResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.infer(image)
    }
}

/// Detector that always reports the same boxes.
pub struct FixedBoxesModel {
    pub boxes: Vec<RawBox>,
}

impl ModelHandle for FixedBoxesModel {
    fn task(&self) -> TaskMode {
        TaskMode::Detect
    }

    fn infer(&self, _image: &DynamicImage) -> Result<RawResult> {
        Ok(RawResult::Boxes(self.boxes.clone()))
    }
}

/// Model whose runtime fails on every call.
pub struct FailingModel;

impl ModelHandle for FailingModel {
    fn task(&self) -> TaskMode {
        TaskMode::Classify
    }

    fn infer(&self, _image: &DynamicImage) -> Result<RawResult> {
        Err(gearscan::DefectError::Inference("runtime exploded".into()))
    }
}

pub fn color_detector() -> Detector {
    Detector::new(Box::new(ColorKeyedModel), LabelSet::gear_defects())
}

/// The labeled sample directory used across tests:
/// `pitting_sample1.jpg` (red), `scuffing_01.png` (blue), `unlabeled.bmp` (green).
pub fn create_sample_dir() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    create_test_image(dir.path(), "pitting_sample1.jpg", RED);
    create_test_image(dir.path(), "scuffing_01.png", BLUE);
    create_test_image(dir.path(), "unlabeled.bmp", GREEN);
    dir
}
