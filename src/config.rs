use image::imageops::FilterType;

use crate::geometry::Size;

/// Edge length of the exported square, in pixels.
pub const OUTPUT_SIZE: u32 = 512;

/// File name offered when saving the crop.
pub const EXPORT_FILE_NAME: &str = "cropped-image.png";

/// Runtime settings for the cropper.
#[derive(Debug, Clone, PartialEq)]
pub struct CropperConfig {
    /// Edge length of the output surface in logical pixels.
    pub output_size: u32,
    /// Width of the initial crop as a percentage of the displayed width.
    pub initial_crop_percent: f32,
    /// Smallest crop edge the selector allows, in displayed pixels.
    pub min_crop_size: f32,
    /// Tallest the source image is drawn on screen.
    pub max_display_height: f32,
    /// Render an additional preview at the screen's pixel ratio.
    pub high_dpi_preview: bool,
    /// Resampling filter used when scaling the crop to the output size.
    pub resize_filter: FilterType,
    pub export_file_name: String,
    /// Extensions offered by the open dialog.
    pub accepted_extensions: Vec<String>,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            output_size: OUTPUT_SIZE,
            initial_crop_percent: 90.0,
            min_crop_size: 100.0,
            max_display_height: 400.0,
            high_dpi_preview: false,
            resize_filter: FilterType::CatmullRom,
            export_file_name: EXPORT_FILE_NAME.to_string(),
            accepted_extensions: ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl CropperConfig {
    /// Selector constraints for an image displayed at `display`.
    pub fn constraints(&self, display: Size) -> CropConstraints {
        CropConstraints {
            aspect: 1.0,
            min_size: self.min_crop_size.min(display.width).min(display.height),
        }
    }
}

/// Limits the selector enforces on the live crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropConstraints {
    /// Width / height; always 1.0 for this tool.
    pub aspect: f32,
    /// Minimum edge in displayed pixels, already clamped to the image.
    pub min_size: f32,
}
