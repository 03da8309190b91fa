use std::sync::Arc;

use crate::detection::Detector;

#[derive(Debug, Default)]
pub struct AppState {
    /// Set once the background model load finishes
    pub detector: Option<Arc<Detector>>,
}
