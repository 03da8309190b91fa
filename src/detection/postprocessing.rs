use crate::detection::preprocessing::Letterbox;
use crate::error::{DefectError, Result};
use crate::models::RawBox;

/// Tolerance for treating a vector as an already-normalized distribution
const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// Turn a classification head output into class probabilities.
///
/// Exported classifiers usually end in a softmax already; raw logits are
/// normalized here so the result always sums to one.
pub fn class_probabilities(output: &[f32]) -> Vec<f32> {
    let sum: f32 = output.iter().sum();
    let is_distribution = output.iter().all(|&p| (0.0..=1.0).contains(&p))
        && (sum - 1.0).abs() <= DISTRIBUTION_TOLERANCE;
    if is_distribution {
        return output.to_vec();
    }
    softmax(output)
}

pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return exps;
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Decode a YOLO detection head.
///
/// Accepts `[1, 4 + nc, anchors]` and its transpose `[1, anchors, 4 + nc]`.
/// Each anchor keeps its best class; anchors under `confidence_threshold` are
/// dropped, the rest are mapped back to source pixels and run through per-class NMS.
pub fn decode_detections(
    data: &[f32],
    shape: &[usize],
    num_classes: usize,
    letterbox: &Letterbox,
    confidence_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<RawBox>> {
    let (rows, cols) = match shape {
        [1, rows, cols] => (*rows, *cols),
        [rows, cols] => (*rows, *cols),
        _ => {
            return Err(DefectError::Normalization(format!(
                "detection output has shape {:?}, expected [1, 4 + classes, anchors]",
                shape
            )));
        }
    };
    if rows * cols != data.len() {
        return Err(DefectError::Normalization(format!(
            "detection output holds {} values but shape {:?} needs {}",
            data.len(),
            shape,
            rows * cols
        )));
    }

    // Channels-first unless only the transposed reading matches the class count
    let channels_first = rows == num_classes + 4 || cols != num_classes + 4;
    let (channels, anchors) = if channels_first { (rows, cols) } else { (cols, rows) };
    if channels <= 4 {
        return Err(DefectError::Normalization(format!(
            "detection output has {} channels, expected box coordinates plus class scores",
            channels
        )));
    }

    let value = |channel: usize, anchor: usize| -> f32 {
        if channels_first {
            data[channel * anchors + anchor]
        } else {
            data[anchor * channels + channel]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..channels - 4 {
            let score = value(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if !best_score.is_finite() || best_score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (
            value(0, anchor),
            value(1, anchor),
            value(2, anchor),
            value(3, anchor),
        );
        let xyxy = letterbox.restore([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]);
        candidates.push(RawBox {
            class_index: best_class,
            confidence: best_score,
            xyxy,
        });
    }

    Ok(non_max_suppression(candidates, iou_threshold))
}

/// Greedy per-class NMS; survivors are returned by descending confidence
pub fn non_max_suppression(mut boxes: Vec<RawBox>, iou_threshold: f32) -> Vec<RawBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept.iter().any(|k| {
            k.class_index == candidate.class_index && k.iou(&candidate) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
