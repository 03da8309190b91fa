use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::detection::Detector;
use crate::error::{DefectError, Result};
use crate::models::{BatchItem, BatchOutcome, Prediction};
use crate::score::ScoreAggregator;

/// Extensions picked up from a test directory, compared case-insensitively
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Check if a path has one of the supported image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Image files directly inside `dir` (no recursion), sorted by name
pub fn collect_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DefectError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }

    // read_dir order is platform dependent
    files.sort();
    files.dedup();
    Ok(files)
}

/// Runs every image of a directory through the detector, one at a time,
/// scoring predictions against labels found in the file names.
pub struct BatchRunner<'a> {
    detector: &'a Detector,
}

impl<'a> BatchRunner<'a> {
    pub fn new(detector: &'a Detector) -> Self {
        Self { detector }
    }

    /// Run the whole directory.
    ///
    /// Only a missing directory is an error; per-image failures are recorded
    /// in the outcome and the batch continues.
    pub fn run(&self, dir: &Path) -> Result<BatchOutcome> {
        self.run_with(dir, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_item` as soon as each image is done
    pub fn run_with<F>(&self, dir: &Path, on_item: F) -> Result<BatchOutcome>
    where
        F: FnMut(&BatchItem),
    {
        let files = collect_image_files(dir)?;
        Ok(self.run_files(dir, &files, on_item))
    }

    /// Run an already collected file list, e.g. from [`collect_image_files`]
    pub fn run_files<F>(&self, dir: &Path, files: &[PathBuf], mut on_item: F) -> BatchOutcome
    where
        F: FnMut(&BatchItem),
    {
        info!("found {} images in {}", files.len(), dir.display());

        let started = Instant::now();
        let mut score = ScoreAggregator::new(self.detector.labels().clone());
        let mut outcome = BatchOutcome {
            directory: dir.to_path_buf(),
            total_images: files.len(),
            ..Default::default()
        };

        for path in files {
            let prediction = self.detector.predict_path(path);
            let ground_truth = path
                .file_name()
                .and_then(|name| score.true_label(&name.to_string_lossy()));

            let correct = match (&prediction, &ground_truth) {
                (Prediction::Success(report), Some(truth)) => Some(score.record(&report.label, truth)),
                _ => None,
            };

            match &prediction {
                Prediction::Success(_) => outcome.succeeded += 1,
                Prediction::Failure(failure) => {
                    warn!("{}: {}", path.display(), failure.error);
                    outcome.failed += 1;
                }
            }

            let item = BatchItem {
                prediction,
                ground_truth,
                correct,
            };
            on_item(&item);
            outcome.items.push(item);
        }

        outcome.labeled_correct = score.correct();
        outcome.labeled_total = score.total();

        info!(
            "batch finished in {:.2?}: {} ok, {} failed, {}/{} labeled correct",
            started.elapsed(),
            outcome.succeeded,
            outcome.failed,
            outcome.labeled_correct,
            outcome.labeled_total
        );
        debug!("accuracy: {:?}", outcome.accuracy());

        outcome
    }
}
