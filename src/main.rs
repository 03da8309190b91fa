use std::io;

use clap::Parser;
use log::error;

use gearscan::Detector;
use gearscan::args::{ModelArgs, OverlayArgs, init_logging};
use gearscan::cli::Tester;
use gearscan::report::display::ImageViewer;

#[derive(Parser)]
#[command(name = "gearscan")]
#[command(about = "Classify gear surface defects from images")]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    overlay: OverlayArgs,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.model.log_level());

    let detector = match Detector::load(&args.model.detector_config()) {
        Ok(detector) => detector,
        Err(e) => {
            error!("{e}");
            println!("Failed to load model: {e}");
            return Ok(());
        }
    };
    println!("Model loaded ({} mode)", detector.task());
    println!("Classes: {}", detector.labels());

    let overlay = args.overlay.overlay_config();
    let viewer = viewer();
    let stdin = io::stdin();
    let mut tester = Tester::new(&detector, &overlay, viewer.as_ref(), stdin.lock(), io::stdout());

    if let Err(e) = tester.run() {
        error!("{e:#}");
        println!("Error: {e:#}");
    }
    Ok(())
}

#[cfg(feature = "gui")]
fn viewer() -> Box<dyn ImageViewer> {
    Box::new(gearscan::gui::WindowViewer)
}

#[cfg(not(feature = "gui"))]
fn viewer() -> Box<dyn ImageViewer> {
    Box::new(gearscan::report::display::ConsoleViewer)
}
