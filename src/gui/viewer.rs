use iced::{
    Element, Event, Length, Size, Subscription, Task, event, keyboard,
    widget::{container, image::Handle},
};
use image::{DynamicImage, RgbImage};
use log::debug;

use crate::error::{DefectError, Result};
use crate::report::display::{Acknowledgement, ImageViewer};

const MAX_WINDOW: (f32, f32) = (1280.0, 900.0);

/// Shows the annotated image in its own window until a key is pressed
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowViewer;

impl ImageViewer for WindowViewer {
    fn show(&self, image: &RgbImage, title: &str) -> Result<Acknowledgement> {
        let (width, height) = image.dimensions();
        let pixels = DynamicImage::ImageRgb8(image.clone()).to_rgba8().into_raw();
        let handle = Handle::from_rgba(width, height, pixels);
        let title = title.to_string();

        let scale = (MAX_WINDOW.0 / width.max(1) as f32)
            .min(MAX_WINDOW.1 / height.max(1) as f32)
            .min(1.0);
        let size = Size::new(width as f32 * scale, height as f32 * scale);

        iced::application(
            move || ImageWindow {
                handle: handle.clone(),
                title: title.clone(),
            },
            ImageWindow::update,
            ImageWindow::view,
        )
        .title(ImageWindow::title)
        .subscription(ImageWindow::subscription)
        .window_size(size)
        .run()
        .map_err(|e| DefectError::Display(e.to_string()))?;

        debug!("result window closed");
        Ok(Acknowledgement::KeyPressed)
    }
}

struct ImageWindow {
    handle: Handle,
    title: String,
}

#[derive(Debug, Clone)]
enum ViewerMessage {
    Dismiss,
}

impl ImageWindow {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn update(&mut self, message: ViewerMessage) -> Task<ViewerMessage> {
        match message {
            ViewerMessage::Dismiss => iced::exit(),
        }
    }

    fn view(&self) -> Element<'_, ViewerMessage> {
        container(
            iced::widget::image(self.handle.clone())
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
    }

    fn subscription(&self) -> Subscription<ViewerMessage> {
        event::listen_with(|event, _status, _window| match event {
            Event::Keyboard(keyboard::Event::KeyPressed { .. }) => Some(ViewerMessage::Dismiss),
            _ => None,
        })
    }
}
