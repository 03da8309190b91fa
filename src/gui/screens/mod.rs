pub mod detect_page;
pub mod loading_page;

use std::fmt;

use iced::{Element, Task};

use crate::gui::{AppState, Message};

pub enum ScreenMessage<S: Screen> {
    ScreenMessage(S::Message),
    ParentMessage(S::ParentMessage),
}

impl<S: Screen> Clone for ScreenMessage<S> {
    fn clone(&self) -> Self {
        match self {
            Self::ScreenMessage(m) => Self::ScreenMessage(m.clone()),
            Self::ParentMessage(m) => Self::ParentMessage(m.clone()),
        }
    }
}

impl<S: Screen> fmt::Debug for ScreenMessage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScreenMessage(m) => f.debug_tuple("ScreenMessage").field(m).finish(),
            Self::ParentMessage(m) => f.debug_tuple("ParentMessage").field(m).finish(),
        }
    }
}

pub trait Screen: Sized {
    type Message: fmt::Debug + Clone;
    type ParentMessage: fmt::Debug + Clone;
    fn view(&self) -> Element<'_, ScreenMessage<Self>>;
    fn update(&mut self, message: Self::Message, state: &mut AppState)
    -> Task<ScreenMessage<Self>>;
}

#[derive(Debug, Clone)]
pub enum ScreenData {
    LoadingPage(loading_page::LoadingPageScreen),
    DetectPage(detect_page::DetectPageScreen),
}

impl Screen for ScreenData {
    type Message = Message;
    type ParentMessage = std::convert::Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        match self {
            ScreenData::LoadingPage(screen) => screen.view().map(|message| -> Message {
                match message {
                    ScreenMessage::ScreenMessage(never) | ScreenMessage::ParentMessage(never) => {
                        match never {}
                    }
                }
            }),
            ScreenData::DetectPage(screen) => screen.view().map(Message::DetectPage),
        }
        .map(ScreenMessage::ScreenMessage)
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match (self, message) {
            (screen, Message::ModelLoaded(Ok(detector))) => {
                state.detector = Some(detector);
                *screen = ScreenData::DetectPage(detect_page::DetectPageScreen::default());
                Task::none()
            }
            (ScreenData::LoadingPage(page), Message::ModelLoaded(Err(e))) => {
                page.set_status(format!("Failed to load model: {e}"));
                Task::none()
            }
            (ScreenData::DetectPage(page), Message::DetectPage(msg)) => match msg {
                ScreenMessage::ScreenMessage(msg) => page
                    .update(msg, state)
                    .map(Message::DetectPage)
                    .map(ScreenMessage::ScreenMessage),
                ScreenMessage::ParentMessage(never) => match never {},
            },
            _ => Task::none(),
        }
    }
}
