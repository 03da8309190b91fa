//! Interactive console tester: pick a mode from a numbered menu, then answer path prompts.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::batch::{BatchRunner, collect_image_files};
use crate::detection::{Detector, decode_image};
use crate::error::DefectError;
use crate::models::{BatchOutcome, Prediction};
use crate::report::display::{Acknowledgement, ImageViewer};
use crate::report::overlay::{OverlayConfig, OverlayStyle, annotate, save_annotated};
use crate::report::{write_batch_item, write_batch_summary, write_prediction};

pub const DEFAULT_TEST_DIR: &str = "test";
pub const WINDOW_TITLE: &str = "Gear Defect Classification";

/// Menu-driven tester reading answers from `input` and printing to `out`
pub struct Tester<'a, R, W> {
    detector: &'a Detector,
    overlay: &'a OverlayConfig,
    viewer: &'a dyn ImageViewer,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Tester<'a, R, W> {
    pub fn new(
        detector: &'a Detector,
        overlay: &'a OverlayConfig,
        viewer: &'a dyn ImageViewer,
        input: R,
        out: W,
    ) -> Self {
        Self {
            detector,
            overlay,
            viewer,
            input,
            out,
        }
    }

    /// Show the menu and run one test. End of input exits quietly.
    pub fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "Gear defect classification tester")?;
        writeln!(self.out, "{}", "=".repeat(50))?;
        writeln!(self.out, "\nSelect a test mode:")?;
        writeln!(self.out, "1. Test a single image")?;
        writeln!(self.out, "2. Test a whole directory")?;
        writeln!(self.out, "3. Test a single image (with visualization)")?;

        let Some(choice) = self.prompt("\nEnter choice (1-3): ")? else {
            return self.exit();
        };

        match choice.as_str() {
            "1" => {
                let Some(path) = self.prompt_existing_image()? else {
                    return Ok(());
                };
                let prediction = self.test_single_image(&path);
                writeln!(self.out, "\nTest result:")?;
                write_prediction(&mut self.out, &prediction)?;
            }
            "2" => {
                let Some(dir) = self.prompt(&format!(
                    "Enter test directory (default: {DEFAULT_TEST_DIR}): "
                ))?
                else {
                    return self.exit();
                };
                let dir = if dir.is_empty() {
                    PathBuf::from(DEFAULT_TEST_DIR)
                } else {
                    PathBuf::from(dir)
                };
                self.test_directory(&dir)?;
            }
            "3" => {
                let Some(path) = self.prompt_existing_image()? else {
                    return Ok(());
                };
                let Some(answer) = self.prompt("Save result image? (y/n): ")? else {
                    return self.exit();
                };
                let save = answer.eq_ignore_ascii_case("y");
                self.test_with_visualization(&path, save)?;
            }
            _ => writeln!(self.out, "Invalid choice")?,
        }

        Ok(())
    }

    pub fn test_single_image(&self, path: &Path) -> Prediction {
        self.detector.predict_path(path)
    }

    /// Run a directory, printing each image as it completes and a summary at the end.
    ///
    /// Returns `None` when the directory is missing or holds no images.
    pub fn test_directory(&mut self, dir: &Path) -> anyhow::Result<Option<BatchOutcome>> {
        let files = match collect_image_files(dir) {
            Ok(files) => files,
            Err(DefectError::DirectoryNotFound(dir)) => {
                writeln!(self.out, "Test directory does not exist: {}", dir.display())?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if files.is_empty() {
            writeln!(self.out, "No image files found in {}", dir.display())?;
            return Ok(None);
        }

        writeln!(self.out, "Found {} images, starting test...", files.len())?;
        writeln!(self.out, "{}", "=".repeat(80))?;

        let out = &mut self.out;
        let mut write_error: Option<io::Error> = None;
        let outcome = BatchRunner::new(self.detector).run_files(dir, &files, |item| {
            if write_error.is_none()
                && let Err(e) = write_batch_item(out, item)
            {
                write_error = Some(e);
            }
        });
        if let Some(e) = write_error {
            return Err(e.into());
        }

        write_batch_summary(&mut self.out, &outcome)?;
        Ok(Some(outcome))
    }

    /// Predict, draw the result onto the image, show it and optionally save it
    pub fn test_with_visualization(&mut self, path: &Path, save: bool) -> anyhow::Result<()> {
        let image = match decode_image(path) {
            Ok(image) => image,
            Err(e) => {
                writeln!(self.out, "Test failed: {e}")?;
                return Ok(());
            }
        };

        let prediction = self.detector.predict_image(&image, path);
        let report = match &prediction {
            Prediction::Success(report) => report,
            Prediction::Failure(failure) => {
                writeln!(self.out, "Test failed: {}", failure.error)?;
                return Ok(());
            }
        };

        let style = OverlayStyle::load(self.overlay);
        let annotated = annotate(&image, report, &style);

        writeln!(self.out, "Showing image: {}", prediction.file_name())?;
        writeln!(
            self.out,
            "   Prediction: {} (confidence: {:.4})",
            report.label, report.confidence
        )?;
        writeln!(self.out, "   Press any key to continue...")?;
        self.out.flush()?;

        match self.viewer.show(&annotated, WINDOW_TITLE) {
            Ok(Acknowledgement::KeyPressed) => debug!("result window dismissed"),
            Ok(Acknowledgement::Pending) => {
                // Blocks until Enter; end of input counts as acknowledgement
                let _ = self.read_line()?;
            }
            Err(e) => {
                warn!("{e}");
                writeln!(self.out, "   {e}; press Enter to continue...")?;
                self.out.flush()?;
                let _ = self.read_line()?;
            }
        }

        if save {
            let saved = save_annotated(&annotated, &self.overlay.output_dir, path)?;
            writeln!(self.out, "Result saved to: {}", saved.display())?;
        }
        Ok(())
    }

    fn prompt_existing_image(&mut self) -> anyhow::Result<Option<PathBuf>> {
        let Some(path) = self.prompt("Enter image path: ")? else {
            self.exit()?;
            return Ok(None);
        };
        let path = PathBuf::from(path);
        if !path.exists() {
            writeln!(self.out, "Image file does not exist")?;
            return Ok(None);
        }
        Ok(Some(path))
    }

    /// Print `message` and read one trimmed line; `None` at end of input
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.out, "{message}")?;
        self.out.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn exit(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "\n\nExiting.")?;
        Ok(())
    }
}
