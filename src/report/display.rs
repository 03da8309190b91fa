use image::RgbImage;
use log::debug;

use crate::error::Result;

/// How a viewer returned control to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The user dismissed the image with a key press
    KeyPressed,
    /// Nothing was shown interactively; the caller has to wait for the user itself
    Pending,
}

/// Shows an annotated image and blocks until the user acknowledges it
pub trait ImageViewer {
    fn show(&self, image: &RgbImage, title: &str) -> Result<Acknowledgement>;
}

/// Viewer for builds without a window system
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleViewer;

impl ImageViewer for ConsoleViewer {
    fn show(&self, image: &RgbImage, title: &str) -> Result<Acknowledgement> {
        debug!(
            "no window available to show '{}' ({}x{})",
            title,
            image.width(),
            image.height()
        );
        Ok(Acknowledgement::Pending)
    }
}
