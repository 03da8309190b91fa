use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView};
use log::{info, warn};
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use crate::config::DetectorConfig;
use crate::detection::ModelHandle;
use crate::detection::postprocessing::{class_probabilities, decode_detections};
use crate::detection::preprocessing::{classification_tensor, letterbox_tensor};
use crate::error::{DefectError, Result};
use crate::labels::LabelSet;
use crate::models::{RawResult, TaskMode};

const DEFAULT_CLASSIFY_SIZE: u32 = 224;
const DEFAULT_DETECT_SIZE: u32 = 640;

/// Metadata keys written by the Ultralytics exporter that we care about
#[derive(Debug, Default)]
struct ExportMetadata {
    task: Option<TaskMode>,
    names: Option<LabelSet>,
    imgsz: Option<u32>,
}

/// YOLO classification or detection model exported to ONNX
pub struct OnnxModel {
    path: PathBuf,
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    task: TaskMode,
    labels: Option<LabelSet>,
    num_classes: usize,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl OnnxModel {
    /// Load the model at `path`. Fails with [`DefectError::ModelLoad`] if the file
    /// is missing or is not a usable ONNX graph.
    pub fn load(path: &Path, config: &DetectorConfig) -> Result<Self> {
        let load_error = |reason: String| DefectError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(load_error("file not found".into()));
        }

        let mut builder = Session::builder()
            .map_err(|e| load_error(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(format!("failed to set optimization level: {e}")))?;
        if config.intra_threads > 0 {
            builder = builder
                .with_intra_threads(config.intra_threads)
                .map_err(|e| load_error(format!("failed to set thread count: {e}")))?;
        }
        let session = builder
            .commit_from_file(path)
            .map_err(|e| load_error(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| load_error("model declares no outputs".into()))?;

        let metadata = read_metadata(&session);
        let task = match (config.task, metadata.task) {
            (Some(task), _) => task,
            (None, Some(task)) => task,
            (None, None) => {
                warn!(
                    "{} carries no task metadata; assuming classification",
                    path.display()
                );
                TaskMode::Classify
            }
        };
        let input_size = config
            .input_size
            .filter(|&size| size > 0)
            .or(metadata.imgsz)
            .unwrap_or(match task {
                TaskMode::Classify => DEFAULT_CLASSIFY_SIZE,
                TaskMode::Detect => DEFAULT_DETECT_SIZE,
            });

        info!(
            "loaded {} (task={}, imgsz={})",
            path.display(),
            task,
            input_size
        );

        let num_classes = metadata
            .names
            .as_ref()
            .map(LabelSet::len)
            .unwrap_or(config.labels.len());

        Ok(Self {
            path: path.to_path_buf(),
            session: Mutex::new(session),
            input_name,
            output_name,
            task,
            labels: metadata.names,
            num_classes,
            input_size,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
        })
    }

    /// Load `config.model_path`, or `config.fallback_model` when that fails.
    ///
    /// The primary error is returned if there is no fallback; if both fail the
    /// fallback's error is returned.
    pub fn load_with_fallback(config: &DetectorConfig) -> Result<Self> {
        match Self::load(&config.model_path, config) {
            Ok(model) => Ok(model),
            Err(primary) => match &config.fallback_model {
                Some(fallback) if fallback != &config.model_path => {
                    warn!("{primary}; trying fallback model {}", fallback.display());
                    Self::load(fallback, config)
                }
                _ => Err(primary),
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    fn run(&self, input: &Array4<f32>) -> Result<(Vec<usize>, Vec<f32>)> {
        let input = input.as_standard_layout();
        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| DefectError::Inference(format!("failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DefectError::Inference("model session is poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| DefectError::Inference(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            DefectError::Inference(format!("output '{}' not found", self.output_name))
        })?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| DefectError::Inference(format!("failed to read output: {e}")))?;

        let shape = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok((shape, data.to_vec()))
    }
}

impl ModelHandle for OnnxModel {
    fn task(&self) -> TaskMode {
        self.task
    }

    fn labels(&self) -> Option<&LabelSet> {
        self.labels.as_ref()
    }

    fn infer(&self, image: &DynamicImage) -> Result<RawResult> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(DefectError::Inference("image has no pixels".into()));
        }

        match self.task {
            TaskMode::Classify => {
                let tensor = classification_tensor(image, self.input_size);
                let (_, output) = self.run(&tensor)?;
                Ok(RawResult::Probabilities(class_probabilities(&output)))
            }
            TaskMode::Detect => {
                let (tensor, letterbox) = letterbox_tensor(image, self.input_size);
                let (shape, output) = self.run(&tensor)?;
                let boxes = decode_detections(
                    &output,
                    &shape,
                    self.num_classes,
                    &letterbox,
                    self.confidence_threshold,
                    self.iou_threshold,
                )?;
                Ok(RawResult::Boxes(boxes))
            }
        }
    }
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("path", &self.path)
            .field("task", &self.task)
            .field("input_size", &self.input_size)
            .finish()
    }
}

fn read_metadata(session: &Session) -> ExportMetadata {
    let Ok(metadata) = session.metadata() else {
        return ExportMetadata::default();
    };
    let custom = |key: &str| metadata.custom(key).ok().flatten();

    ExportMetadata {
        task: custom("task").as_deref().and_then(TaskMode::from_metadata),
        names: custom("names").as_deref().and_then(LabelSet::from_model_metadata),
        imgsz: custom("imgsz").as_deref().and_then(parse_imgsz),
    }
}

/// `imgsz` is stored as `[224, 224]`; the first side is enough for square inputs.
/// A zero side is treated as missing.
fn parse_imgsz(raw: &str) -> Option<u32> {
    raw.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
        .split(',')
        .next()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&size| size > 0)
}
