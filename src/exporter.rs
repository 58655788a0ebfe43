//! PNG encoding and saving of the output surface.

use std::path::{Path, PathBuf};

use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use crate::config::CropperConfig;
use crate::error::CropError;
use crate::rasterizer::OutputSurface;
use crate::state::CropperState;

/// Encodes the logical surface (never the high-DPI preview) as PNG.
pub fn encode_png(surface: &OutputSurface) -> Result<Vec<u8>, CropError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            surface.image.as_raw(),
            surface.image.width(),
            surface.image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(CropError::Encode)?;
    Ok(bytes)
}

/// PNG bytes of the current crop, if there is one to export.
pub fn export_bytes(state: &CropperState) -> Result<Vec<u8>, CropError> {
    if state.committed_crop.is_none() {
        return Err(CropError::ExportUnavailable);
    }
    let surface = state.surface.as_ref().ok_or(CropError::SurfaceUnavailable)?;
    encode_png(surface)
}

/// Encodes the current crop and writes it to `path`.
pub fn save_to(state: &CropperState, path: &Path) -> Result<PathBuf, CropError> {
    let bytes = export_bytes(state)?;
    std::fs::write(path, &bytes).map_err(|source| CropError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path.to_path_buf())
}

/// `cropped-image.png` in the user's download directory, or the working
/// directory when there is none.
pub fn default_export_path(config: &CropperConfig) -> PathBuf {
    dirs::download_dir()
        .unwrap_or_default()
        .join(&config.export_file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Crop, PixelCrop, Size};
    use crate::rasterizer::SourceRect;
    use image::{Rgba, RgbaImage};

    fn surface() -> OutputSurface {
        OutputSurface {
            image: RgbaImage::from_pixel(512, 512, Rgba([9, 8, 7, 255])),
            preview: Some(RgbaImage::new(1024, 1024)),
            source: SourceRect {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
        }
    }

    #[test]
    fn encodes_the_logical_buffer() {
        let bytes = encode_png(&surface()).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 512));
        assert_eq!(decoded.to_rgba8().get_pixel(3, 3), &Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn export_is_rejected_before_a_commit() {
        let state = CropperState::new();
        assert!(matches!(
            export_bytes(&state),
            Err(CropError::ExportUnavailable)
        ));
    }

    #[test]
    fn export_without_surface_fails_loudly() {
        let state = CropperState {
            committed_crop: Some(Crop::from_pixels(
                PixelCrop::new(0.0, 0.0, 10.0, 10.0),
                Size::new(100.0, 100.0),
            )),
            ..CropperState::default()
        };
        assert!(matches!(
            export_bytes(&state),
            Err(CropError::SurfaceUnavailable)
        ));
    }

    #[test]
    fn failed_write_leaves_state_intact() {
        let state = CropperState {
            committed_crop: Some(Crop::from_pixels(
                PixelCrop::new(0.0, 0.0, 10.0, 10.0),
                Size::new(100.0, 100.0),
            )),
            surface: Some(surface()),
            ..CropperState::default()
        };
        let missing_dir = std::env::temp_dir()
            .join("square-cropper-no-such-dir")
            .join("out.png");
        let err = save_to(&state, &missing_dir).unwrap_err();
        assert!(matches!(err, CropError::Write { .. }));
        assert!(state.can_export());
    }

    #[test]
    fn default_path_uses_the_export_name() {
        let path = default_export_path(&CropperConfig::default());
        assert_eq!(path.file_name().unwrap(), "cropped-image.png");
    }
}
