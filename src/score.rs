use crate::labels::LabelSet;

/// Tracks how many labeled predictions matched the label hidden in their file name
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    labels: LabelSet,
    correct: usize,
    total: usize,
}

impl ScoreAggregator {
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            correct: 0,
            total: 0,
        }
    }

    /// Ground truth for a file name: the first label it contains, ignoring case
    pub fn true_label(&self, file_name: &str) -> Option<String> {
        self.labels.find_in(file_name).map(str::to_string)
    }

    /// Count one labeled prediction and report whether it matched
    pub fn record(&mut self, predicted: &str, truth: &str) -> bool {
        let correct = predicted.to_lowercase() == truth.to_lowercase();
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        correct
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// `None` until at least one labeled prediction has been recorded
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }
}
