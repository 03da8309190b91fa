use std::sync::Arc;

use crate::detection::Detector;
use crate::gui::screens::{ScreenMessage, detect_page::DetectPageScreen};

#[derive(Debug, Clone)]
pub enum Message {
    DetectPage(ScreenMessage<DetectPageScreen>),
    ModelLoaded(Result<Arc<Detector>, String>),
}
