use std::io;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use log::{debug, info, warn};

use crate::error::{DefectError, Result};
use crate::models::{DefectReport, PredictionDetails};

/// Confidences strictly above this are drawn in the high-confidence color
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.8;

pub const HIGH_CONFIDENCE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LOW_CONFIDENCE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const BACKGROUND_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Offset of the caption box from the image corner
const MARGIN: i32 = 10;
/// Space between the caption box edge and the text
const PADDING: i32 = 5;

const SYSTEM_FONTS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Where annotated images go and how captions are drawn
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Tried before the common system font locations
    pub font_path: Option<PathBuf>,
    pub font_scale: f32,
    pub output_dir: PathBuf,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_scale: 32.0,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Font and scale used to draw captions. Without a font only the caption box is drawn.
pub struct OverlayStyle {
    font: Option<FontVec>,
    scale: f32,
}

impl OverlayStyle {
    /// Load the configured font, then fall back to common system fonts
    pub fn load(config: &OverlayConfig) -> Self {
        let candidates = config
            .font_path
            .iter()
            .cloned()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            if let Ok(data) = std::fs::read(&path)
                && let Ok(font) = FontVec::try_from_vec(data)
            {
                info!("loaded font {}", path.display());
                return Self {
                    font: Some(font),
                    scale: config.font_scale,
                };
            }
        }

        warn!("no usable font found; result captions will be drawn without text");
        Self::without_font(config.font_scale)
    }

    pub fn without_font(scale: f32) -> Self {
        Self { font: None, scale }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height of `text` once drawn
    pub fn text_bounds(&self, text: &str) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(PxScale::from(self.scale), font, text),
            // Rough average glyph width for a sans font
            None => (
                (text.chars().count() as f32 * self.scale * 0.55).ceil() as u32,
                self.scale.ceil() as u32,
            ),
        }
    }
}

impl std::fmt::Debug for OverlayStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayStyle")
            .field("has_font", &self.has_font())
            .field("scale", &self.scale)
            .finish()
    }
}

pub fn confidence_color(confidence: f32) -> Rgb<u8> {
    if confidence > HIGH_CONFIDENCE_THRESHOLD {
        HIGH_CONFIDENCE_COLOR
    } else {
        LOW_CONFIDENCE_COLOR
    }
}

pub fn caption(report: &DefectReport) -> String {
    format!("{}: {:.3}", report.label, report.confidence)
}

/// Copy of `image` with the predicted label and confidence drawn in the top-left
/// corner over a black box sized to the text. Detection boxes are outlined.
pub fn annotate(image: &DynamicImage, report: &DefectReport, style: &OverlayStyle) -> RgbImage {
    let mut canvas = image.to_rgb8();

    if let PredictionDetails::Detection { boxes } = &report.details {
        for b in boxes {
            let color = confidence_color(b.confidence);
            let (w, h) = (b.width().max(1.0) as u32, b.height().max(1.0) as u32);
            for inset in 0..2 {
                let rect = Rect::at(b.xyxy[0] as i32 - inset, b.xyxy[1] as i32 - inset)
                    .of_size(w + 2 * inset as u32, h + 2 * inset as u32);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }
        }
    }

    let text = caption(report);
    let (text_w, text_h) = style.text_bounds(&text);
    let background = Rect::at(MARGIN, MARGIN).of_size(
        text_w + 2 * PADDING as u32,
        text_h + 2 * PADDING as u32,
    );
    draw_filled_rect_mut(&mut canvas, background, BACKGROUND_COLOR);

    match &style.font {
        Some(font) => draw_text_mut(
            &mut canvas,
            confidence_color(report.confidence),
            MARGIN + PADDING,
            MARGIN + PADDING,
            PxScale::from(style.scale),
            font,
            &text,
        ),
        None => debug!("skipping caption text for {}", report.source_path.display()),
    }

    canvas
}

/// `<output_dir>/result_<file name>`
pub fn result_path(output_dir: &Path, source: &Path) -> Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        DefectError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        ))
    })?;
    Ok(output_dir.join(format!("result_{}", name.to_string_lossy())))
}

/// Write the annotated image next to the others in `output_dir`; returns the path written
pub fn save_annotated(image: &RgbImage, output_dir: &Path, source: &Path) -> Result<PathBuf> {
    let path = result_path(output_dir, source)?;
    std::fs::create_dir_all(output_dir)?;
    image
        .save(&path)
        .map_err(|e| DefectError::Io(io::Error::other(format!("failed to save {}: {e}", path.display()))))?;
    info!("saved annotated image to {}", path.display());
    Ok(path)
}
