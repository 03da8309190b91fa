//! Presentation of predictions: console text, UI summary text, annotated images.

pub mod display;
pub mod overlay;

use std::io::{self, Write};

use crate::models::{BatchItem, BatchOutcome, DefectReport, Prediction, PredictionDetails};

pub const SEPARATOR: &str = "----------------------------------------";

/// Label, confidence and the per-class table (or box list) for one prediction
pub fn write_prediction<W: Write>(out: &mut W, prediction: &Prediction) -> io::Result<()> {
    match prediction {
        Prediction::Success(report) => write_report(out, report, ""),
        Prediction::Failure(failure) => writeln!(out, "Error: {}", failure.error),
    }
}

fn write_report<W: Write>(out: &mut W, report: &DefectReport, indent: &str) -> io::Result<()> {
    writeln!(out, "{indent}Predicted class: {}", report.label)?;
    writeln!(out, "{indent}Confidence: {:.4}", report.confidence)?;

    match &report.details {
        PredictionDetails::Classification { probabilities } => {
            writeln!(out, "{indent}All class probabilities:")?;
            for p in probabilities {
                writeln!(out, "{indent}   {}: {:.4}", p.label, p.probability)?;
            }
        }
        PredictionDetails::Detection { boxes } => {
            writeln!(out, "{indent}Detected defects: {}", boxes.len())?;
            for b in boxes {
                writeln!(
                    out,
                    "{indent}   {} {:.4} at ({:.1}, {:.1}, {:.1}, {:.1})",
                    b.label, b.confidence, b.xyxy[0], b.xyxy[1], b.xyxy[2], b.xyxy[3]
                )?;
            }
        }
    }
    Ok(())
}

/// Per-image block of a batch run, with a verdict when the file name carried a label
pub fn write_batch_item<W: Write>(out: &mut W, item: &BatchItem) -> io::Result<()> {
    let name = item.prediction.file_name();
    match &item.prediction {
        Prediction::Failure(failure) => {
            writeln!(out, "[failed] {}: {}", name, failure.error)?;
        }
        Prediction::Success(report) => {
            writeln!(out, "[image] {}", name)?;
            write_report(out, report, "   ")?;
            match (&item.ground_truth, item.correct) {
                (Some(truth), Some(true)) => writeln!(out, "   Correct (ground truth: {truth})")?,
                (Some(truth), Some(false)) => writeln!(out, "   Wrong (ground truth: {truth})")?,
                _ => {}
            }
            writeln!(out, "{SEPARATOR}")?;
        }
    }
    Ok(())
}

/// Aggregate counters and accuracy for a batch
pub fn write_batch_summary<W: Write>(out: &mut W, outcome: &BatchOutcome) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Test statistics:")?;
    writeln!(out, "Total images: {}", outcome.total_images)?;
    writeln!(out, "Succeeded: {}", outcome.succeeded)?;
    writeln!(out, "Failed: {}", outcome.failed)?;
    match outcome.accuracy() {
        Some(accuracy) => writeln!(
            out,
            "Accuracy: {:.4} ({}/{})",
            accuracy, outcome.labeled_correct, outcome.labeled_total
        ),
        None => writeln!(out, "Accuracy: not computed (no labeled images)"),
    }
}

/// Whole batch: every item followed by the summary
pub fn write_batch<W: Write>(out: &mut W, outcome: &BatchOutcome) -> io::Result<()> {
    for item in &outcome.items {
        write_batch_item(out, item)?;
    }
    write_batch_summary(out, outcome)
}

/// Summary text for the desktop result panel
pub fn summary_text(prediction: &Prediction) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = writeln!(buf, "Image: {}", prediction.file_name());
    let _ = write_prediction(&mut buf, prediction);
    String::from_utf8_lossy(&buf).into_owned()
}
