use std::fmt;
use std::path::{Path, PathBuf};

/// Label reported by a detection model that found nothing
pub const NO_DEFECT: &str = "none";

/// Which head the loaded model carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    /// Whole-image probability vector
    Classify,
    /// Localized boxes
    Detect,
}

impl TaskMode {
    /// Parse the `task` value Ultralytics stores in exported metadata
    pub fn from_metadata(value: &str) -> Option<Self> {
        match value.trim().trim_matches('\'').to_lowercase().as_str() {
            "classify" | "classification" | "cls" => Some(TaskMode::Classify),
            "detect" | "detection" | "det" => Some(TaskMode::Detect),
            _ => None,
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskMode::Classify => write!(f, "classify"),
            TaskMode::Detect => write!(f, "detect"),
        }
    }
}

/// Box as emitted by the model, before labels are attached
#[derive(Debug, Clone, PartialEq)]
pub struct RawBox {
    pub class_index: usize,
    pub confidence: f32,
    /// Corner coordinates `(x1, y1, x2, y2)` in source image pixels
    pub xyxy: [f32; 4],
}

/// Width and height of an `(x1, y1, x2, y2)` box; inverted corners give 0
pub fn box_size(xyxy: &[f32; 4]) -> (f32, f32) {
    ((xyxy[2] - xyxy[0]).max(0.0), (xyxy[3] - xyxy[1]).max(0.0))
}

impl RawBox {
    pub fn width(&self) -> f32 {
        box_size(&self.xyxy).0
    }

    pub fn height(&self) -> f32 {
        box_size(&self.xyxy).1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &RawBox) -> f32 {
        let x1 = self.xyxy[0].max(other.xyxy[0]);
        let y1 = self.xyxy[1].max(other.xyxy[1]);
        let x2 = self.xyxy[2].min(other.xyxy[2]);
        let y2 = self.xyxy[3].min(other.xyxy[3]);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Model output before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// One probability per class index
    Probabilities(Vec<f32>),
    /// Zero or more boxes in the order the model produced them
    Boxes(Vec<RawBox>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefectBox {
    pub label: String,
    pub class_index: usize,
    pub confidence: f32,
    pub xyxy: [f32; 4],
}

impl DefectBox {
    pub fn width(&self) -> f32 {
        box_size(&self.xyxy).0
    }

    pub fn height(&self) -> f32 {
        box_size(&self.xyxy).1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionDetails {
    /// Full probability table, in label set order
    Classification { probabilities: Vec<ClassProbability> },
    Detection { boxes: Vec<DefectBox> },
}

/// Successful prediction for one image
#[derive(Debug, Clone, PartialEq)]
pub struct DefectReport {
    pub source_path: PathBuf,
    pub label: String,
    pub confidence: f32,
    pub details: PredictionDetails,
}

impl DefectReport {
    pub fn probability(&self, label: &str) -> Option<f32> {
        match &self.details {
            PredictionDetails::Classification { probabilities } => probabilities
                .iter()
                .find(|p| p.label == label)
                .map(|p| p.probability),
            PredictionDetails::Detection { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionFailure {
    pub source_path: PathBuf,
    pub error: String,
}

/// Outcome of running one image through the model
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Success(DefectReport),
    Failure(PredictionFailure),
}

impl Prediction {
    pub fn failure(source_path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        Prediction::Failure(PredictionFailure {
            source_path: source_path.into(),
            error: error.to_string(),
        })
    }

    pub fn source_path(&self) -> &Path {
        match self {
            Prediction::Success(report) => &report.source_path,
            Prediction::Failure(failure) => &failure.source_path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Prediction::Success(_))
    }

    pub fn report(&self) -> Option<&DefectReport> {
        match self {
            Prediction::Success(report) => Some(report),
            Prediction::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Prediction::Success(_) => None,
            Prediction::Failure(failure) => Some(&failure.error),
        }
    }

    /// File name of the source image, for display
    pub fn file_name(&self) -> String {
        self.source_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path().display().to_string())
    }
}

/// One processed file of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub prediction: Prediction,
    /// Label recovered from the file name, if any
    pub ground_truth: Option<String>,
    /// Set only for successful predictions with a ground truth
    pub correct: Option<bool>,
}

/// Result of running a whole directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub directory: PathBuf,
    pub items: Vec<BatchItem>,
    pub total_images: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub labeled_correct: usize,
    pub labeled_total: usize,
}

impl BatchOutcome {
    /// `labeled_correct / labeled_total`, or `None` when nothing was labeled
    pub fn accuracy(&self) -> Option<f64> {
        if self.labeled_total == 0 {
            None
        } else {
            Some(self.labeled_correct as f64 / self.labeled_total as f64)
        }
    }
}
