use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Gray used by the trainer to pad letterboxed images
const PAD_VALUE: u8 = 114;

/// Geometry of a letterboxed input, used to map boxes back onto the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    /// Map `(x1, y1, x2, y2)` from model input space to source pixels, clamped to the image
    pub fn restore(&self, xyxy: [f32; 4]) -> [f32; 4] {
        let w = self.source_width as f32;
        let h = self.source_height as f32;
        [
            ((xyxy[0] - self.pad_x) / self.scale).clamp(0.0, w),
            ((xyxy[1] - self.pad_y) / self.scale).clamp(0.0, h),
            ((xyxy[2] - self.pad_x) / self.scale).clamp(0.0, w),
            ((xyxy[3] - self.pad_y) / self.scale).clamp(0.0, h),
        ]
    }
}

/// Resize the shortest side to `size`, center-crop to a square and lay out as NCHW in `[0, 1]`
pub fn classification_tensor(img: &DynamicImage, size: u32) -> Array4<f32> {
    let size = size.max(1);
    let (w, h) = img.dimensions();
    let scale = size as f32 / w.min(h).max(1) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(size);
    let new_h = ((h as f32 * scale).round() as u32).max(size);

    let resized = img.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();
    let left = (new_w - size) / 2;
    let top = (new_h - size) / 2;
    let cropped = imageops::crop_imm(&resized, left, top, size, size).to_image();

    to_tensor(&cropped)
}

/// Scale to fit a `size` square keeping aspect ratio, pad the rest with gray
///
/// A `size` of 0 is treated as 1.
pub fn letterbox_tensor(img: &DynamicImage, size: u32) -> (Array4<f32>, Letterbox) {
    let size = size.max(1);
    let (w, h) = img.dimensions();
    let scale = (size as f32 / w.max(1) as f32).min(size as f32 / h.max(1) as f32);
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, size);

    let resized = img.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, pad_x.into(), pad_y.into());

    let letterbox = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        source_width: w,
        source_height: h,
    };
    (to_tensor(&canvas), letterbox)
}

fn to_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (w, h) = rgb.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}
