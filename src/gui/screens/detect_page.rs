use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use iced::{
    Element, Length, Task,
    widget::{button, column, container, image::Handle, scrollable, text},
};
use iced_widget::container::bordered_box;
use log::{debug, warn};
use rfd::AsyncFileDialog;

use crate::batch::IMAGE_EXTENSIONS;
use crate::detection::Detector;
use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
    widgets::{Stage, layout},
};
use crate::models::Prediction;
use crate::report::summary_text;

/// Open an image, run the model on it, read the result
#[derive(Debug, Clone, Default)]
pub struct DetectPageScreen {
    image_path: Option<PathBuf>,
    preview: Option<Handle>,
    result_text: String,
    stage: Stage,
}

#[derive(Debug, Clone)]
pub enum DetectPageMessage {
    OpenImage,
    ImageSelected(Option<PathBuf>),
    StartDetection,
    DetectionFinished(Prediction),
}

impl DetectPageScreen {
    fn busy(&self) -> bool {
        self.stage == Stage::Detecting
    }

    fn can_detect(&self) -> bool {
        self.image_path.is_some() && !self.busy()
    }

    fn status(&self) -> String {
        match (&self.stage, &self.image_path) {
            (Stage::Detecting, _) => "Detecting...".to_string(),
            (_, Some(path)) => format!("Current image: {}", path.display()),
            (_, None) => "No image selected".to_string(),
        }
    }
}

impl Screen for DetectPageScreen {
    type Message = DetectPageMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let sidebar = column![
            button("Open Image").on_press_maybe(
                (!self.busy()).then_some(ScreenMessage::ScreenMessage(
                    DetectPageMessage::OpenImage
                ))
            ),
            button("Start Detection").on_press_maybe(
                self.can_detect()
                    .then_some(ScreenMessage::ScreenMessage(DetectPageMessage::StartDetection))
            ),
            text(self.status()),
        ]
        .spacing(10)
        .padding(10);

        let preview: Element<'_, ScreenMessage<Self>> = match &self.preview {
            Some(handle) => iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => text("Open an image to start").into(),
        };

        let results = container(scrollable(text(self.result_text.as_str())).height(Length::Fill))
            .style(bordered_box)
            .padding(10)
            .width(Length::Fill)
            .height(Length::FillPortion(1));

        let main = column![
            container(preview)
                .center_x(Length::Fill)
                .height(Length::FillPortion(2)),
            results,
        ]
        .spacing(10);

        layout(sidebar, main, self.stage)
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match message {
            DetectPageMessage::OpenImage => Task::perform(
                AsyncFileDialog::new()
                    .set_title("Select a gear image")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file(),
                |handle| {
                    ScreenMessage::ScreenMessage(DetectPageMessage::ImageSelected(
                        handle.map(|h| h.path().to_path_buf()),
                    ))
                },
            ),
            DetectPageMessage::ImageSelected(None) => Task::none(),
            DetectPageMessage::ImageSelected(Some(path)) => {
                debug!("selected {}", path.display());
                self.preview = Some(Handle::from_path(&path));
                self.image_path = Some(path);
                self.result_text.clear();
                self.stage = Stage::ImageLoaded;
                Task::none()
            }
            DetectPageMessage::StartDetection => {
                let (Some(path), Some(detector)) = (&self.image_path, &state.detector) else {
                    warn!("detection requested without an image or a loaded model");
                    return Task::none();
                };
                if self.busy() {
                    return Task::none();
                }
                self.stage = Stage::Detecting;
                self.result_text = "Detecting...".to_string();
                Task::perform(
                    run_detection(Arc::clone(detector), path.clone()),
                    |prediction| {
                        ScreenMessage::ScreenMessage(DetectPageMessage::DetectionFinished(
                            prediction,
                        ))
                    },
                )
            }
            DetectPageMessage::DetectionFinished(prediction) => {
                self.result_text = summary_text(&prediction);
                self.stage = Stage::Reviewed;
                Task::none()
            }
        }
    }
}

/// Inference runs on the blocking pool so the window keeps repainting
async fn run_detection(detector: Arc<Detector>, path: PathBuf) -> Prediction {
    let source = path.clone();
    match tokio::task::spawn_blocking(move || detector.predict_path(&path)).await {
        Ok(prediction) => prediction,
        Err(e) => Prediction::failure(source, format!("detection task failed: {e}")),
    }
}
