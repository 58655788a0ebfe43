//! Where the crop starts when a new image becomes ready.

use crate::geometry::{Crop, PercentCrop, PixelCrop, Size};

/// Centered square covering `percent` of the displayed width.
///
/// The square is shrunk to the shorter displayed side so it always fits, then
/// grown back to `min_size` (itself capped by the shorter side). Returns `None`
/// while the image has no displayed size yet.
pub fn initial_crop(display: Size, percent: f32, min_size: f32) -> Option<Crop> {
    if display.is_empty() {
        return None;
    }

    let shortest = display.width.min(display.height);
    let side = (display.width * percent / 100.0)
        .min(shortest)
        .max(min_size.min(shortest));

    let width = side / display.width * 100.0;
    let height = side / display.height * 100.0;
    let percent = PercentCrop {
        x: (100.0 - width) / 2.0,
        y: (100.0 - height) / 2.0,
        width,
        height,
    };

    let crop = Crop::from_percent(percent, display);
    log::debug!(
        "Initial crop for {}x{}: {:?}",
        display.width,
        display.height,
        crop.pixel
    );
    Some(crop)
}

/// Pixel form of [`initial_crop`], handy when only the pixel rectangle matters.
pub fn initial_pixel_crop(display: Size, percent: f32, min_size: f32) -> Option<PixelCrop> {
    initial_crop(display, percent, min_size).map(|crop| crop.pixel)
}
