//! The single state container behind the window.
//!
//! All transitions go through [`CropperState::reduce`]. A new selection wipes
//! the image, both crops and the surface before anything else can run against
//! them, and outcomes of superseded loads are dropped.

use std::path::PathBuf;

use image::DynamicImage;

use crate::config::CropperConfig;
use crate::error::CropError;
use crate::geometry::{Crop, DisplayMetrics, PixelCrop};
use crate::loader::{DataUrl, LoadTicket, LoadedImage};
use crate::policy::initial_crop;
use crate::rasterizer::{OutputSurface, rasterize};

/// The decoded image currently on screen.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub data_url: DataUrl,
    pub image: DynamicImage,
    /// Unknown until the first frame lays the image out.
    pub display: Option<DisplayMetrics>,
    /// Which load produced this image; the UI keys its texture on it.
    pub ticket: LoadTicket,
}

impl SourceImage {
    pub fn natural_size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

#[derive(Debug)]
pub enum Action {
    /// A file was picked and its load started.
    FileSelected { ticket: LoadTicket },
    /// A load finished, successfully or not.
    FileLoaded {
        ticket: LoadTicket,
        result: Result<LoadedImage, CropError>,
    },
    /// The image was laid out for the first time.
    ImageReady { display: DisplayMetrics },
    /// The displayed size or pixel ratio changed afterwards.
    DisplayResized { display: DisplayMetrics },
    /// The selector moved the live crop.
    CropChanged(Crop),
    /// The selector finished a gesture.
    CropCommitted(PixelCrop),
    /// Render the committed crop again, e.g. after a config change.
    Rerender,
}

#[derive(Debug, Default)]
pub struct CropperState {
    pub source: Option<SourceImage>,
    /// Crop drawn by the selector, updated continuously while dragging.
    pub live_crop: Option<Crop>,
    /// Crop as of the last finished gesture; the only one that is rendered.
    /// Its percent form keeps it valid across display resizes.
    pub committed_crop: Option<Crop>,
    pub surface: Option<OutputSurface>,
    /// Load whose outcome is still awaited.
    pub pending: Option<LoadTicket>,
    pub last_error: Option<String>,
}

impl CropperState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(mut self, action: Action, config: &CropperConfig) -> Self {
        match action {
            Action::FileSelected { ticket } => {
                self.clear_image();
                self.pending = Some(ticket);
                self.last_error = None;
            }
            Action::FileLoaded { ticket, result } => {
                if self.pending != Some(ticket) {
                    log::debug!("Ignoring stale load #{}", ticket.id());
                    return self;
                }
                self.pending = None;
                self.clear_image();
                match result {
                    Ok(loaded) => {
                        self.source = Some(SourceImage {
                            path: loaded.path,
                            data_url: loaded.data_url,
                            image: loaded.image,
                            display: None,
                            ticket,
                        });
                    }
                    Err(e) => {
                        log::error!("Error reading file: {}", e);
                        self.last_error = Some(e.to_string());
                    }
                }
            }
            Action::ImageReady { display } => {
                let Some(source) = self.source.as_mut() else {
                    return self;
                };
                log::info!(
                    "Image displayed at {}x{}",
                    display.size.width,
                    display.size.height
                );
                source.display = Some(display);
                self.live_crop = initial_crop(
                    display.size,
                    config.initial_crop_percent,
                    config.min_crop_size,
                );
                if let Some(crop) = &self.live_crop {
                    log::info!("Setting initial crop: {:?}", crop.pixel);
                }
            }
            Action::DisplayResized { display } => {
                let Some(source) = self.source.as_mut() else {
                    return self;
                };
                let previous = source.display.replace(display);
                self.live_crop = match self.live_crop {
                    Some(crop) => Some(Crop::from_percent(crop.percent, display.size)),
                    // First layout had no room for the image.
                    None => initial_crop(
                        display.size,
                        config.initial_crop_percent,
                        config.min_crop_size,
                    ),
                };
                if let Some(committed) = self.committed_crop.as_mut() {
                    *committed = Crop::from_percent(committed.percent, display.size);
                }
                let ratio_changed =
                    previous.is_none_or(|previous| previous.pixel_ratio != display.pixel_ratio);
                if config.high_dpi_preview && ratio_changed {
                    self.render_committed(config);
                }
            }
            Action::CropChanged(crop) => {
                if self.display().is_some() {
                    self.live_crop = Some(crop);
                }
            }
            Action::CropCommitted(crop) => {
                let Some(display) = self.display() else {
                    return self;
                };
                log::debug!("Crop committed: {:?}", crop);
                let crop = Crop::from_pixels(crop, display.size);
                if let Some(surface) = self.rasterize_crop(crop.pixel, config) {
                    self.committed_crop = Some(crop);
                    self.surface = Some(surface);
                }
            }
            Action::Rerender => self.render_committed(config),
        }
        self
    }

    fn rasterize_crop(&self, crop: PixelCrop, config: &CropperConfig) -> Option<OutputSurface> {
        let source = self.source.as_ref()?;
        rasterize(&source.image, source.display?, crop, config)
    }

    /// Redraws the surface from the committed crop at the current display.
    fn render_committed(&mut self, config: &CropperConfig) {
        let Some(committed) = self.committed_crop else {
            return;
        };
        if let Some(surface) = self.rasterize_crop(committed.pixel, config) {
            self.surface = Some(surface);
        }
    }

    pub fn display(&self) -> Option<DisplayMetrics> {
        self.source.as_ref().and_then(|source| source.display)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// True once a committed crop has produced a surface.
    pub fn can_export(&self) -> bool {
        self.committed_crop.is_some() && self.surface.is_some()
    }

    fn clear_image(&mut self) {
        self.source = None;
        self.live_crop = None;
        self.committed_crop = None;
        self.surface = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use image::{Rgba, RgbaImage};

    fn loaded(width: u32, height: u32) -> LoadedImage {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([1, 2, 3, 255]),
        ));
        LoadedImage {
            path: PathBuf::from("test.png"),
            data_url: DataUrl::from_bytes(&[]),
            image,
        }
    }

    fn metrics(width: f32, height: f32) -> DisplayMetrics {
        DisplayMetrics::new(Size::new(width, height), 1.0)
    }

    fn ready_state(config: &CropperConfig) -> CropperState {
        let ticket = LoadTicket::new(1);
        CropperState::new()
            .reduce(Action::FileSelected { ticket }, config)
            .reduce(
                Action::FileLoaded {
                    ticket,
                    result: Ok(loaded(1000, 1000)),
                },
                config,
            )
            .reduce(
                Action::ImageReady {
                    display: metrics(200.0, 200.0),
                },
                config,
            )
    }

    #[test]
    fn ready_sets_the_initial_crop_but_does_not_commit() {
        let config = CropperConfig::default();
        let state = ready_state(&config);
        let crop = state.live_crop.unwrap().pixel;
        assert_eq!(crop.width, 180.0);
        assert_eq!(crop.x, 10.0);
        assert!(state.committed_crop.is_none());
        assert!(!state.can_export());
    }

    #[test]
    fn commit_renders_the_surface() {
        let config = CropperConfig::default();
        let state = ready_state(&config).reduce(
            Action::CropCommitted(PixelCrop::new(10.0, 10.0, 100.0, 100.0)),
            &config,
        );
        assert!(state.can_export());
        let surface = state.surface.as_ref().unwrap();
        assert_eq!((surface.source.x, surface.source.width), (50, 500));
    }

    #[test]
    fn new_selection_clears_everything() {
        let config = CropperConfig::default();
        let state = ready_state(&config)
            .reduce(
                Action::CropCommitted(PixelCrop::new(0.0, 0.0, 100.0, 100.0)),
                &config,
            )
            .reduce(
                Action::FileSelected {
                    ticket: LoadTicket::new(2),
                },
                &config,
            );
        assert!(state.source.is_none());
        assert!(state.live_crop.is_none());
        assert!(state.committed_crop.is_none());
        assert!(state.surface.is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn stale_load_is_ignored() {
        let config = CropperConfig::default();
        let state = CropperState::new()
            .reduce(
                Action::FileSelected {
                    ticket: LoadTicket::new(1),
                },
                &config,
            )
            .reduce(
                Action::FileSelected {
                    ticket: LoadTicket::new(2),
                },
                &config,
            )
            .reduce(
                Action::FileLoaded {
                    ticket: LoadTicket::new(1),
                    result: Ok(loaded(10, 10)),
                },
                &config,
            );
        assert!(state.source.is_none());
        assert_eq!(state.pending, Some(LoadTicket::new(2)));

        let state = state.reduce(
            Action::FileLoaded {
                ticket: LoadTicket::new(2),
                result: Ok(loaded(20, 20)),
            },
            &config,
        );
        assert_eq!(state.source.unwrap().natural_size(), (20, 20));
        assert!(state.pending.is_none());
    }

    #[test]
    fn failed_load_records_the_error() {
        let config = CropperConfig::default();
        let ticket = LoadTicket::new(1);
        let state = CropperState::new()
            .reduce(Action::FileSelected { ticket }, &config)
            .reduce(
                Action::FileLoaded {
                    ticket,
                    result: Err(CropError::InvalidDataUrl("bad".to_string())),
                },
                &config,
            );
        assert!(state.source.is_none());
        assert!(!state.is_loading());
        assert!(state.last_error.unwrap().contains("bad"));
    }

    #[test]
    fn changes_before_ready_are_dropped() {
        let config = CropperConfig::default();
        let ticket = LoadTicket::new(1);
        let crop = Crop::from_pixels(PixelCrop::new(0.0, 0.0, 50.0, 50.0), Size::new(100.0, 100.0));
        let state = CropperState::new()
            .reduce(Action::FileSelected { ticket }, &config)
            .reduce(
                Action::FileLoaded {
                    ticket,
                    result: Ok(loaded(100, 100)),
                },
                &config,
            )
            .reduce(Action::CropChanged(crop), &config)
            .reduce(Action::CropCommitted(crop.pixel), &config);
        assert!(state.live_crop.is_none());
        assert!(state.committed_crop.is_none());
    }

    #[test]
    fn live_crop_follows_a_resize() {
        let config = CropperConfig::default();
        let state = ready_state(&config).reduce(
            Action::DisplayResized {
                display: metrics(100.0, 100.0),
            },
            &config,
        );
        let crop = state.live_crop.unwrap().pixel;
        assert!((crop.width - 90.0).abs() < 1e-3);
        assert!((crop.x - 5.0).abs() < 1e-3);
    }

    #[test]
    fn commit_missing_the_image_keeps_previous_surface() {
        let config = CropperConfig::default();
        let state = ready_state(&config)
            .reduce(
                Action::CropCommitted(PixelCrop::new(0.0, 0.0, 100.0, 100.0)),
                &config,
            )
            .reduce(
                Action::CropCommitted(PixelCrop::new(500.0, 500.0, 100.0, 100.0)),
                &config,
            );
        assert_eq!(
            state.committed_crop.map(|crop| crop.pixel),
            Some(PixelCrop::new(0.0, 0.0, 100.0, 100.0))
        );
        assert!(state.surface.is_some());
    }

    #[test]
    fn committed_crop_survives_a_resize() {
        let config = CropperConfig::default();
        let state = ready_state(&config).reduce(
            Action::CropCommitted(PixelCrop::new(10.0, 10.0, 100.0, 100.0)),
            &config,
        );
        let before = state.surface.as_ref().unwrap().source;

        let state = state.reduce(
            Action::DisplayResized {
                display: metrics(100.0, 100.0),
            },
            &config,
        );
        let committed = state.committed_crop.unwrap().pixel;
        assert_eq!(committed, PixelCrop::new(5.0, 5.0, 50.0, 50.0));

        let state = state.reduce(Action::CropCommitted(committed), &config);
        assert_eq!(state.surface.as_ref().unwrap().source, before);

        let state = state.reduce(Action::Rerender, &config);
        assert_eq!(state.surface.as_ref().unwrap().source, before);
    }

    #[test]
    fn rerender_applies_the_high_dpi_switch() {
        let config = CropperConfig::default();
        let state = ready_state(&config)
            .reduce(
                Action::DisplayResized {
                    display: DisplayMetrics::new(Size::new(200.0, 200.0), 2.0),
                },
                &config,
            )
            .reduce(
                Action::CropCommitted(PixelCrop::new(10.0, 10.0, 100.0, 100.0)),
                &config,
            );
        assert!(state.surface.as_ref().unwrap().preview.is_none());

        let high_dpi = CropperConfig {
            high_dpi_preview: true,
            ..CropperConfig::default()
        };
        let state = state.reduce(Action::Rerender, &high_dpi);
        let surface = state.surface.as_ref().unwrap();
        assert_eq!(surface.display_image().width(), 1024);
        assert_eq!((surface.source.x, surface.source.width), (50, 500));
    }

    #[test]
    fn pixel_ratio_change_redraws_the_preview() {
        let config = CropperConfig {
            high_dpi_preview: true,
            ..CropperConfig::default()
        };
        let state = ready_state(&config).reduce(
            Action::CropCommitted(PixelCrop::new(10.0, 10.0, 100.0, 100.0)),
            &config,
        );
        assert!(state.surface.as_ref().unwrap().preview.is_none());

        let state = state.reduce(
            Action::DisplayResized {
                display: DisplayMetrics::new(Size::new(200.0, 200.0), 2.0),
            },
            &config,
        );
        let surface = state.surface.as_ref().unwrap();
        assert_eq!(surface.display_image().width(), 1024);
        assert_eq!(surface.width(), 512);
    }
}
