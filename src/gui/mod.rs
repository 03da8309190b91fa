mod app;
mod message;
mod screens;
mod state;
mod viewer;
mod widgets;

pub use app::{DefectApp, run};
pub use message::Message;
pub use state::AppState;
pub use viewer::WindowViewer;
