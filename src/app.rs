use std::path::PathBuf;

use eframe::egui;
use tokio::runtime::Handle;

use crate::config::CropperConfig;
use crate::exporter;
use crate::geometry::{DisplayMetrics, Size};
use crate::loader::{ImageLoader, LoadTicket};
use crate::selector::{CropOverlay, CropSelector, HANDLE_PADDING};
use crate::state::{Action, CropperState};

/// On-screen edge of the preview; the surface itself stays at full size.
const PREVIEW_SIZE: f32 = 256.0;

pub struct CropperApp {
    config: CropperConfig,
    state: CropperState,
    loader: ImageLoader,
    selector: Box<dyn CropSelector>,
    texture: Option<(LoadTicket, egui::TextureHandle)>,
    preview: Option<egui::TextureHandle>,
    status: Option<String>,
}

impl CropperApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: CropperConfig, runtime: Handle) -> Self {
        Self::with_selector(config, runtime, Box::new(CropOverlay::new()))
    }

    pub fn with_selector(
        config: CropperConfig,
        runtime: Handle,
        selector: Box<dyn CropSelector>,
    ) -> Self {
        Self {
            config,
            state: CropperState::new(),
            loader: ImageLoader::new(runtime),
            selector,
            texture: None,
            preview: None,
            status: None,
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, action: Action) {
        let surface_may_change = matches!(
            action,
            Action::FileSelected { .. }
                | Action::FileLoaded { .. }
                | Action::DisplayResized { .. }
                | Action::CropCommitted(_)
                | Action::Rerender
        );
        self.state = std::mem::take(&mut self.state).reduce(action, &self.config);
        self.sync_source_texture(ctx);
        if surface_may_change {
            self.sync_preview_texture(ctx);
        }
    }

    fn open_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        let repaint = ctx.clone();
        let ticket = self.loader.select(path, move || repaint.request_repaint());
        self.status = None;
        self.dispatch(ctx, Action::FileSelected { ticket });
    }

    fn sync_source_texture(&mut self, ctx: &egui::Context) {
        let Some(source) = &self.state.source else {
            self.texture = None;
            return;
        };
        if matches!(&self.texture, Some((ticket, _)) if *ticket == source.ticket) {
            return;
        }
        let size = [source.image.width() as _, source.image.height() as _];
        let image_buffer = source.image.to_rgba8();
        let pixels = image_buffer.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        let texture = ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR);
        self.texture = Some((source.ticket, texture));
    }

    fn sync_preview_texture(&mut self, ctx: &egui::Context) {
        self.preview = self.state.surface.as_ref().map(|surface| {
            let image = surface.display_image();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as _, image.height() as _],
                image.as_raw(),
            );
            ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR)
        });
    }

    fn pick_file(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", self.config.accepted_extensions.as_slice())
            .pick_file()
        {
            self.open_path(ctx, path);
        }
    }

    fn download(&mut self) {
        let default_path = exporter::default_export_path(&self.config);
        let mut dialog = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(self.config.export_file_name.as_str());
        if let Some(dir) = default_path.parent() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        match exporter::save_to(&self.state, &path) {
            Ok(saved) => self.status = Some(format!("Saved {}", saved.display())),
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                self.pick_file(ui.ctx());
            }
            ui.label("1024x1024 or larger works best");

            ui.separator();
            if ui
                .checkbox(&mut self.config.high_dpi_preview, "High-DPI preview")
                .changed()
            {
                self.dispatch(ui.ctx(), Action::Rerender);
            }

            ui.separator();
            let download = ui.add_enabled(
                self.state.can_export(),
                egui::Button::new("Download cropped image"),
            );
            if download.clicked() {
                self.download();
            }
        });
    }

    fn status_line(&self, ui: &mut egui::Ui) {
        if self.state.is_loading() {
            ui.label("Loading…");
        } else if self.state.source.is_some() {
            let crop = if self.state.live_crop.is_some() { "set" } else { "not set" };
            ui.label(format!("Image loaded, crop {}", crop));
        }
        let message = self.status.as_ref().or(self.state.last_error.as_ref());
        if let Some(message) = message {
            ui.colored_label(ui.visuals().warn_fg_color, message);
        }
    }

    fn workspace(&mut self, ui: &mut egui::Ui) {
        let Some(texture) = self.texture.as_ref().map(|(_, texture)| texture.clone()) else {
            return;
        };

        let available_size = ui.available_size();
        let max_size = egui::vec2(
            available_size.x - PREVIEW_SIZE - HANDLE_PADDING * 4.0,
            (available_size.y - HANDLE_PADDING * 2.0).min(self.config.max_display_height),
        );
        let image_size = texture.size_vec2();

        // Fit inside the crop area; never enlarge past the natural size.
        let scale = (max_size.x / image_size.x)
            .min(max_size.y / image_size.y)
            .min(1.0)
            .max(0.0);
        let display_size = image_size * scale;

        let display = DisplayMetrics::new(
            Size::new(display_size.x, display_size.y),
            ui.ctx().pixels_per_point(),
        );
        match self.state.display() {
            None => self.dispatch(ui.ctx(), Action::ImageReady { display }),
            Some(current) if current != display => {
                self.dispatch(ui.ctx(), Action::DisplayResized { display })
            }
            Some(_) => {}
        }

        ui.horizontal_top(|ui| {
            let image_rect = egui::Rect::from_min_size(
                ui.cursor().min + egui::vec2(HANDLE_PADDING, HANDLE_PADDING),
                display_size,
            );
            let constraints = self.config.constraints(display.size);
            let events = self.selector.show(
                ui,
                &texture,
                image_rect,
                self.state.live_crop,
                constraints,
            );
            for event in events {
                self.dispatch(ui.ctx(), event.into());
            }

            ui.add_space(HANDLE_PADDING);
            ui.vertical(|ui| {
                ui.heading(format!(
                    "Preview ({0}x{0})",
                    self.config.output_size
                ));
                let preview_size = egui::vec2(PREVIEW_SIZE, PREVIEW_SIZE);
                match &self.preview {
                    Some(preview) => {
                        ui.image((preview.id(), preview_size));
                    }
                    None => {
                        let (rect, _) = ui.allocate_exact_size(preview_size, egui::Sense::hover());
                        ui.painter().rect_stroke(
                            rect,
                            4.0,
                            egui::Stroke::new(1.0, egui::Color32::GRAY),
                        );
                    }
                }
            });
        });
    }
}

impl eframe::App for CropperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for outcome in self.loader.poll() {
            self.dispatch(
                ctx,
                Action::FileLoaded {
                    ticket: outcome.ticket,
                    result: outcome.result,
                },
            );
        }

        // Handle dropped files
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open_path(ctx, path);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.toolbar(ui);
            self.status_line(ui);
            ui.separator();
            self.workspace(ui);
        });
    }
}
