use std::path::PathBuf;

use crate::labels::LabelSet;
use crate::models::TaskMode;

pub const DEFAULT_MODEL: &str = "best.onnx";
pub const DEFAULT_FALLBACK_MODEL: &str = "yolo11s-cls.onnx";

/// Settings for loading the model and decoding its output
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    /// Tried when `model_path` cannot be loaded
    pub fallback_model: Option<PathBuf>,
    /// Overrides the task stored in the model metadata
    pub task: Option<TaskMode>,
    /// Used when the model carries no class names of its own
    pub labels: LabelSet,
    /// Overrides the input size stored in the model metadata
    pub input_size: Option<u32>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// 0 lets the runtime decide
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL),
            fallback_model: Some(PathBuf::from(DEFAULT_FALLBACK_MODEL)),
            task: None,
            labels: LabelSet::gear_defects(),
            input_size: None,
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            intra_threads: 0,
        }
    }
}

impl DetectorConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, fallback: Option<PathBuf>) -> Self {
        self.fallback_model = fallback;
        self
    }

    pub fn with_task(mut self, task: Option<TaskMode>) -> Self {
        self.task = task;
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    /// A size of 0 counts as no override
    pub fn with_input_size(mut self, input_size: Option<u32>) -> Self {
        self.input_size = input_size.filter(|&size| size > 0);
        self
    }

    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence_threshold = confidence.clamp(0.0, 1.0);
        self.iou_threshold = iou.clamp(0.0, 1.0);
        self
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }
}
