use std::path::Path;

use crate::error::{DefectError, Result};
use crate::labels::LabelSet;
use crate::models::{
    ClassProbability, DefectBox, DefectReport, NO_DEFECT, Prediction, PredictionDetails, RawBox,
    RawResult, TaskMode,
};

/// Maps raw model output onto typed predictions against a fixed label set.
///
/// Never fails: anything that cannot be turned into a report becomes a
/// [`Prediction::Failure`] carrying a readable message.
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    labels: LabelSet,
    task: TaskMode,
}

impl ResultNormalizer {
    pub fn new(labels: LabelSet, task: TaskMode) -> Self {
        Self { labels, task }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn task(&self) -> TaskMode {
        self.task
    }

    pub fn normalize(&self, source: &Path, raw: Result<RawResult>) -> Prediction {
        match raw.and_then(|raw| self.build_report(source, raw)) {
            Ok(report) => Prediction::Success(report),
            Err(e) => Prediction::failure(source, e),
        }
    }

    fn build_report(&self, source: &Path, raw: RawResult) -> Result<DefectReport> {
        let (label, confidence, details) = match (self.task, raw) {
            (TaskMode::Classify, RawResult::Probabilities(probs)) => self.classification(&probs)?,
            (TaskMode::Detect, RawResult::Boxes(boxes)) => self.detection(boxes)?,
            (TaskMode::Classify, RawResult::Boxes(_)) => {
                return Err(DefectError::Normalization(
                    "classification model returned boxes".into(),
                ));
            }
            (TaskMode::Detect, RawResult::Probabilities(_)) => {
                return Err(DefectError::Normalization(
                    "detection model returned a probability vector".into(),
                ));
            }
        };

        Ok(DefectReport {
            source_path: source.to_path_buf(),
            label,
            confidence: confidence.clamp(0.0, 1.0),
            details,
        })
    }

    fn classification(&self, probs: &[f32]) -> Result<(String, f32, PredictionDetails)> {
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(DefectError::Normalization(
                "probability vector contains non-finite values".into(),
            ));
        }
        let top = argmax(probs).ok_or_else(|| {
            DefectError::Normalization("model returned an empty probability vector".into())
        })?;

        let probabilities = probs
            .iter()
            .enumerate()
            .map(|(i, &p)| ClassProbability {
                label: self.labels.name(i),
                probability: p,
            })
            .collect();

        Ok((
            self.labels.name(top),
            probs[top],
            PredictionDetails::Classification { probabilities },
        ))
    }

    fn detection(&self, boxes: Vec<RawBox>) -> Result<(String, f32, PredictionDetails)> {
        if boxes
            .iter()
            .any(|b| !b.confidence.is_finite() || b.xyxy.iter().any(|v| !v.is_finite()))
        {
            return Err(DefectError::Normalization(
                "detection contains non-finite values".into(),
            ));
        }

        let boxes: Vec<DefectBox> = boxes
            .into_iter()
            .map(|b| DefectBox {
                label: self.labels.name(b.class_index),
                class_index: b.class_index,
                confidence: b.confidence.clamp(0.0, 1.0),
                xyxy: b.xyxy,
            })
            .collect();

        // Earliest box wins ties so the headline follows model order
        let headline = boxes.iter().fold(None::<&DefectBox>, |best, b| match best {
            Some(best) if best.confidence >= b.confidence => Some(best),
            _ => Some(b),
        });
        let (label, confidence) = headline
            .map(|b| (b.label.clone(), b.confidence))
            .unwrap_or_else(|| (NO_DEFECT.to_string(), 0.0));

        Ok((label, confidence, PredictionDetails::Detection { boxes }))
    }
}

/// Index of the largest value; the lowest index wins exact ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if values[b] >= v => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn classifier() -> ResultNormalizer {
        ResultNormalizer::new(LabelSet::gear_defects(), TaskMode::Classify)
    }

    fn detector() -> ResultNormalizer {
        ResultNormalizer::new(LabelSet::gear_defects(), TaskMode::Detect)
    }

    fn source() -> PathBuf {
        PathBuf::from("test/pitting_01.jpg")
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn classification_picks_top_class() {
        let raw = RawResult::Probabilities(vec![0.1, 0.7, 0.15, 0.05]);
        let prediction = classifier().normalize(&source(), Ok(raw));
        let report = prediction.report().unwrap();

        assert_eq!(report.label, "pitting");
        assert!((report.confidence - 0.7).abs() < 1e-6);
        assert_eq!(report.probability("spalling"), Some(0.05));
        let PredictionDetails::Classification { probabilities } = &report.details else {
            panic!("expected classification details");
        };
        let labels: Vec<_> = probabilities.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["indentation", "pitting", "scuffing", "spalling"]);
    }

    #[test]
    fn out_of_range_index_uses_placeholder() {
        let raw = RawResult::Probabilities(vec![0.1, 0.1, 0.1, 0.1, 0.6]);
        let prediction = classifier().normalize(&source(), Ok(raw));
        assert_eq!(prediction.report().unwrap().label, "Class_4");
    }

    #[test]
    fn empty_probabilities_become_failure() {
        let prediction = classifier().normalize(&source(), Ok(RawResult::Probabilities(vec![])));
        assert!(!prediction.is_success());
        assert!(prediction.error().unwrap().contains("empty"));
        assert_eq!(prediction.source_path(), source());
    }

    #[test]
    fn upstream_error_becomes_failure() {
        let prediction = classifier().normalize(
            &source(),
            Err(DefectError::Inference("session exploded".into())),
        );
        assert_eq!(prediction.error(), Some("inference failed: session exploded"));
    }

    #[test]
    fn mismatched_shape_becomes_failure() {
        let prediction = detector().normalize(&source(), Ok(RawResult::Probabilities(vec![1.0])));
        assert!(!prediction.is_success());
    }

    #[test]
    fn detection_keeps_model_order_and_coordinates() {
        let raw = RawResult::Boxes(vec![
            RawBox {
                class_index: 2,
                confidence: 0.4,
                xyxy: [1.0, 2.0, 3.0, 4.0],
            },
            RawBox {
                class_index: 9,
                confidence: 0.8,
                xyxy: [5.0, 6.0, 7.0, 8.0],
            },
            RawBox {
                class_index: 0,
                confidence: 0.8,
                xyxy: [0.0, 0.0, 1.0, 1.0],
            },
        ]);
        let prediction = detector().normalize(&source(), Ok(raw));
        let report = prediction.report().unwrap();

        assert_eq!(report.label, "Class_9");
        assert!((report.confidence - 0.8).abs() < 1e-6);
        let PredictionDetails::Detection { boxes } = &report.details else {
            panic!("expected detection details");
        };
        assert_eq!(boxes[0].label, "scuffing");
        assert_eq!(boxes[0].xyxy, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(boxes[2].label, "indentation");
    }

    #[test]
    fn empty_detection_reports_no_defect() {
        let prediction = detector().normalize(&source(), Ok(RawResult::Boxes(vec![])));
        let report = prediction.report().unwrap();
        assert_eq!(report.label, NO_DEFECT);
        assert_eq!(report.confidence, 0.0);
    }
}
