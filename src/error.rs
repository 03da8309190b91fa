use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading the model, running inference or walking a test directory.
#[derive(Debug, Error)]
pub enum DefectError {
    /// The model file is missing or could not be turned into a session
    #[error("failed to load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// The runtime rejected the input or failed while executing the model
    #[error("inference failed: {0}")]
    Inference(String),

    /// Batch precondition: the test directory is not there
    #[error("test directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The file could not be read or decoded as an image
    #[error("could not read image {}: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },

    /// The raw model output could not be mapped onto a prediction
    #[error("unexpected model output: {0}")]
    Normalization(String),

    /// The result window could not be opened
    #[error("could not display image: {0}")]
    Display(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DefectError>;
