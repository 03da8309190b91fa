pub mod args;
pub mod batch;
pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod labels;
pub mod models;
pub mod report;
pub mod score;

pub use batch::{BatchRunner, collect_image_files};
pub use config::DetectorConfig;
pub use detection::{Detector, ModelHandle, OnnxModel, ResultNormalizer};
pub use error::{DefectError, Result};
pub use labels::LabelSet;
pub use models::{
    BatchItem, BatchOutcome, ClassProbability, DefectBox, DefectReport, Prediction,
    PredictionDetails, PredictionFailure, RawBox, RawResult, TaskMode,
};
pub use score::ScoreAggregator;

#[cfg(feature = "gui")]
pub mod gui;
