//! Square image cropper: pick an image, position a square over it and save a
//! 512x512 PNG of that region rendered from the full-resolution pixels.

pub mod app;
pub mod config;
pub mod error;
pub mod exporter;
pub mod geometry;
pub mod loader;
pub mod policy;
pub mod rasterizer;
pub mod selector;
pub mod state;

pub use app::CropperApp;
pub use config::CropperConfig;
pub use error::CropError;
