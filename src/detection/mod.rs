pub mod normalize;
pub mod onnx;
pub mod postprocessing;
pub mod preprocessing;

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, ImageReader};
use log::{debug, info};

use crate::config::DetectorConfig;
use crate::error::{DefectError, Result};
use crate::labels::LabelSet;
use crate::models::{Prediction, RawResult, TaskMode};

pub use normalize::ResultNormalizer;
pub use onnx::OnnxModel;

/// A loaded model that can be asked about images.
///
/// Implementations keep no state beyond their weights, so `infer` can be
/// called any number of times without reloading.
pub trait ModelHandle: Send + Sync {
    fn task(&self) -> TaskMode;

    /// Class names embedded in the model, if it carries any
    fn labels(&self) -> Option<&LabelSet> {
        None
    }

    fn infer(&self, image: &DynamicImage) -> Result<RawResult>;

    /// Decode `path` and run inference on it
    fn infer_path(&self, path: &Path) -> Result<RawResult> {
        let image = decode_image(path)?;
        self.infer(&image)
    }
}

/// Open and decode an image file, reporting failures as [`DefectError::ImageDecode`]
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let decode_error = |reason: String| DefectError::ImageDecode {
        path: path.to_path_buf(),
        reason,
    };
    ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))
}

/// A model paired with the normalizer for its label set
pub struct Detector {
    model: Box<dyn ModelHandle>,
    normalizer: ResultNormalizer,
}

impl Detector {
    /// Wrap a model; class names embedded in the model take precedence over `labels`
    pub fn new(model: Box<dyn ModelHandle>, labels: LabelSet) -> Self {
        let labels = match model.labels() {
            Some(embedded) => {
                if embedded != &labels {
                    log::warn!(
                        "model class order {} differs from configured {}; using the model's",
                        embedded,
                        labels
                    );
                }
                embedded.clone()
            }
            None => labels,
        };
        let normalizer = ResultNormalizer::new(labels, model.task());
        Self { model, normalizer }
    }

    /// Load the configured ONNX model, falling back to the secondary model if needed
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        let model = OnnxModel::load_with_fallback(config)?;
        let detector = Self::new(Box::new(model), config.labels.clone());
        info!(
            "detector ready: task={} labels={}",
            detector.task(),
            detector.labels()
        );
        Ok(detector)
    }

    pub fn labels(&self) -> &LabelSet {
        self.normalizer.labels()
    }

    pub fn task(&self) -> TaskMode {
        self.normalizer.task()
    }

    /// Run the model on an image file. Never fails; errors come back as
    /// [`Prediction::Failure`].
    pub fn predict_path(&self, path: &Path) -> Prediction {
        let started = Instant::now();
        let prediction = self.normalizer.normalize(path, self.model.infer_path(path));
        debug!(
            "{}: {} in {:.2?}",
            path.display(),
            match &prediction {
                Prediction::Success(report) => report.label.as_str(),
                Prediction::Failure(_) => "failed",
            },
            started.elapsed()
        );
        prediction
    }

    /// Run the model on an already decoded image
    pub fn predict_image(&self, image: &DynamicImage, source: &Path) -> Prediction {
        self.normalizer.normalize(source, self.model.infer(image))
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("task", &self.task())
            .field("labels", self.labels())
            .finish()
    }
}
