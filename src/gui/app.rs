use std::sync::Arc;

use iced::{Element, Size, Task, Theme};
use log::{error, info};

use super::screens::{Screen, ScreenData, ScreenMessage, loading_page::LoadingPageScreen};
use super::{AppState, Message};
use crate::config::DetectorConfig;
use crate::detection::Detector;

pub const TITLE: &str = "Gear Defect Detection";

pub struct DefectApp {
    state: AppState,
    screen: ScreenData,
}

impl DefectApp {
    /// Starts on the loading page while the model loads off the UI thread
    pub fn new(config: DetectorConfig) -> (Self, Task<Message>) {
        info!("loading model {}", config.model_path.display());
        (
            Self {
                state: AppState::default(),
                screen: ScreenData::LoadingPage(LoadingPageScreen::new("Loading model...")),
            },
            Task::perform(load_detector(config), Message::ModelLoaded),
        )
    }

    pub fn title(&self) -> String {
        TITLE.to_string()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        if let Message::ModelLoaded(Err(e)) = &message {
            error!("model load failed: {e}");
        }
        self.screen
            .update(message, &mut self.state)
            .map(|message| match message {
                ScreenMessage::ScreenMessage(message) => message,
                ScreenMessage::ParentMessage(never) => match never {},
            })
    }

    pub fn view(&self) -> Element<'_, Message> {
        self.screen.view().map(|message| match message {
            ScreenMessage::ScreenMessage(message) => message,
            ScreenMessage::ParentMessage(never) => match never {},
        })
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}

async fn load_detector(config: DetectorConfig) -> Result<Arc<Detector>, String> {
    tokio::task::spawn_blocking(move || Detector::load(&config))
        .await
        .map_err(|e| e.to_string())?
        .map(Arc::new)
        .map_err(|e| e.to_string())
}

/// Open the desktop window and block until it is closed
pub fn run(config: DetectorConfig) -> iced::Result {
    iced::application(
        move || DefectApp::new(config.clone()),
        DefectApp::update,
        DefectApp::view,
    )
    .title(DefectApp::title)
    .theme(DefectApp::theme)
    .window_size(Size::new(1100.0, 760.0))
    .run()
}
