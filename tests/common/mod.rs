#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from gearscan for tests
pub use gearscan::{
    BatchOutcome, DefectError, Detector, LabelSet, ModelHandle, Prediction, PredictionDetails,
    RawBox, RawResult, TaskMode,
};
