//! Draws the committed crop of the full-resolution image into the square
//! output surface.

use image::{DynamicImage, RgbaImage};

use crate::config::CropperConfig;
use crate::geometry::{DisplayMetrics, PixelCrop, Size};

/// Region of the decoded image that feeds the output, in natural pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The rendered crop. `image` is what gets exported.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSurface {
    pub image: RgbaImage,
    /// Same content at the screen's pixel ratio, when high-DPI preview is on.
    pub preview: Option<RgbaImage>,
    pub source: SourceRect,
}

impl OutputSurface {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Buffer to show on screen: the high-DPI preview if there is one.
    pub fn display_image(&self) -> &RgbaImage {
        self.preview.as_ref().unwrap_or(&self.image)
    }
}

/// Maps a crop in displayed pixels onto the decoded image.
///
/// Scales by `natural / display` on each axis, clips to the image and rounds
/// the edges to whole pixels. `None` when either size is zero or the clipped
/// region is empty.
///
/// Rounding means each edge can sit up to half a source pixel away from the
/// exact fractional rectangle; sampling is done on whole pixels only.
pub fn source_rect(natural: (u32, u32), display: Size, crop: PixelCrop) -> Option<SourceRect> {
    let (natural_width, natural_height) = natural;
    if natural_width == 0 || natural_height == 0 || display.is_empty() {
        return None;
    }

    let scale_x = natural_width as f32 / display.width;
    let scale_y = natural_height as f32 / display.height;

    let left = (crop.x * scale_x).round().clamp(0.0, natural_width as f32);
    let top = (crop.y * scale_y).round().clamp(0.0, natural_height as f32);
    let right = (crop.right() * scale_x)
        .round()
        .clamp(0.0, natural_width as f32);
    let bottom = (crop.bottom() * scale_y)
        .round()
        .clamp(0.0, natural_height as f32);

    if right <= left || bottom <= top {
        return None;
    }

    Some(SourceRect {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Renders `crop` of `image` into a fresh `output_size` square.
///
/// Returns `None` instead of drawing when the displayed size is zero or the
/// crop misses the image.
pub fn rasterize(
    image: &DynamicImage,
    display: DisplayMetrics,
    crop: PixelCrop,
    config: &CropperConfig,
) -> Option<OutputSurface> {
    let Some(source) = source_rect((image.width(), image.height()), display.size, crop) else {
        log::warn!(
            "Skipping rasterization: display {:?}, crop {:?}",
            display.size,
            crop
        );
        return None;
    };

    let region = image.crop_imm(source.x, source.y, source.width, source.height);
    let size = config.output_size;
    let output = region.resize_exact(size, size, config.resize_filter).to_rgba8();

    let preview = if config.high_dpi_preview && display.pixel_ratio > 1.0 {
        let scaled = (size as f32 * display.pixel_ratio).round() as u32;
        Some(
            region
                .resize_exact(scaled, scaled, config.resize_filter)
                .to_rgba8(),
        )
    } else {
        None
    };

    log::debug!(
        "Rasterized source {:?} into {}x{}",
        source,
        output.width(),
        output.height()
    );
    Some(OutputSurface {
        image: output,
        preview,
        source,
    })
}
