#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use square_cropper::{CropperApp, CropperConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Owns the worker threads for file reads; must outlive the window.
    let runtime = tokio::runtime::Runtime::new()?;
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Square Cropper",
        options,
        Box::new(move |cc| Ok(Box::new(CropperApp::new(cc, CropperConfig::default(), handle)))),
    )?;
    Ok(())
}
