//! Interactive square crop selector drawn over the displayed image.
//!
//! The window talks to the selector only through [`CropSelector`]: it hands in
//! the live crop and gets back change and commit events. All coordinates in
//! this module are displayed pixels relative to the image's top-left corner.

use eframe::egui;

use crate::config::CropConstraints;
use crate::geometry::{Crop, PixelCrop, Size};
use crate::state::Action;

/// Room left around the image so edge handles stay grabbable.
pub const HANDLE_PADDING: f32 = 20.0;

const HIT_TOLERANCE: f32 = 10.0;
const HANDLE_RADIUS: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Center, // Moving
}

impl ResizeHandle {
    fn cursor(&self) -> egui::CursorIcon {
        match self {
            ResizeHandle::TopLeft | ResizeHandle::BottomRight => egui::CursorIcon::ResizeNwSe,
            ResizeHandle::TopRight | ResizeHandle::BottomLeft => egui::CursorIcon::ResizeNeSw,
            ResizeHandle::Top | ResizeHandle::Bottom => egui::CursorIcon::ResizeVertical,
            ResizeHandle::Left | ResizeHandle::Right => egui::CursorIcon::ResizeHorizontal,
            ResizeHandle::Center => egui::CursorIcon::Move,
        }
    }

    fn moves_right_edge(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopRight | ResizeHandle::BottomRight | ResizeHandle::Right
        )
    }

    fn moves_bottom_edge(&self) -> bool {
        matches!(
            self,
            ResizeHandle::BottomLeft | ResizeHandle::BottomRight | ResizeHandle::Bottom
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectorEvent {
    /// The crop moved during a gesture.
    Changed(Crop),
    /// A gesture ended on this crop.
    Committed(PixelCrop),
}

impl From<SelectorEvent> for Action {
    fn from(event: SelectorEvent) -> Self {
        match event {
            SelectorEvent::Changed(crop) => Action::CropChanged(crop),
            SelectorEvent::Committed(crop) => Action::CropCommitted(crop),
        }
    }
}

/// Draws the image with a crop overlay and reports what the user did to it.
pub trait CropSelector {
    fn show(
        &mut self,
        ui: &mut egui::Ui,
        texture: &egui::TextureHandle,
        image_rect: egui::Rect,
        crop: Option<Crop>,
        constraints: CropConstraints,
    ) -> Vec<SelectorEvent>;
}

pub fn hit_test(x: f32, y: f32, rect: PixelCrop) -> Option<ResizeHandle> {
    let near = |px: f32, py: f32| ((x - px).powi(2) + (y - py).powi(2)).sqrt() < HIT_TOLERANCE;
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

    if near(left, top) {
        return Some(ResizeHandle::TopLeft);
    }
    if near(right, top) {
        return Some(ResizeHandle::TopRight);
    }
    if near(left, bottom) {
        return Some(ResizeHandle::BottomLeft);
    }
    if near(right, bottom) {
        return Some(ResizeHandle::BottomRight);
    }

    let within_y = y > top && y < bottom;
    let within_x = x > left && x < right;
    if (x - left).abs() < HIT_TOLERANCE && within_y {
        return Some(ResizeHandle::Left);
    }
    if (x - right).abs() < HIT_TOLERANCE && within_y {
        return Some(ResizeHandle::Right);
    }
    if (y - top).abs() < HIT_TOLERANCE && within_x {
        return Some(ResizeHandle::Top);
    }
    if (y - bottom).abs() < HIT_TOLERANCE && within_x {
        return Some(ResizeHandle::Bottom);
    }

    if rect.contains(x, y) {
        return Some(ResizeHandle::Center);
    }

    None
}

/// Applies a drag of `(dx, dy)` on `handle` to the square `origin`.
///
/// The result stays square, inside `bounds`, and no smaller than `min_size`
/// unless the bounds leave less room than that.
pub fn drag_square(
    origin: PixelCrop,
    handle: ResizeHandle,
    dx: f32,
    dy: f32,
    bounds: Size,
    min_size: f32,
) -> PixelCrop {
    if handle == ResizeHandle::Center {
        let x = (origin.x + dx).clamp(0.0, (bounds.width - origin.width).max(0.0));
        let y = (origin.y + dy).clamp(0.0, (bounds.height - origin.height).max(0.0));
        return PixelCrop::new(x, y, origin.width, origin.height);
    }

    let right = handle.moves_right_edge();
    let bottom = handle.moves_bottom_edge();
    let grow_x = if right { dx } else { -dx };
    let grow_y = if bottom { dy } else { -dy };

    // Edge that stays put on each axis.
    let anchor_x = if right { origin.x } else { origin.right() };
    let anchor_y = if bottom { origin.y } else { origin.bottom() };
    let room_x = if right { bounds.width - anchor_x } else { anchor_x };
    let room_y = if bottom { bounds.height - anchor_y } else { anchor_y };
    let (center_x, center_y) = origin.center();

    let (wanted, room) = match handle {
        // Project onto the diagonal so both axes contribute.
        ResizeHandle::TopLeft
        | ResizeHandle::TopRight
        | ResizeHandle::BottomLeft
        | ResizeHandle::BottomRight
        | ResizeHandle::Center => (
            ((origin.width + grow_x) + (origin.height + grow_y)) / 2.0,
            room_x.min(room_y),
        ),
        ResizeHandle::Left | ResizeHandle::Right => (
            origin.width + grow_x,
            room_x.min(2.0 * center_y.min(bounds.height - center_y)),
        ),
        ResizeHandle::Top | ResizeHandle::Bottom => (
            origin.height + grow_y,
            room_y.min(2.0 * center_x.min(bounds.width - center_x)),
        ),
    };

    let room = room.max(0.0);
    let side = wanted.min(room).max(min_size.min(room));

    let x = match handle {
        ResizeHandle::Top | ResizeHandle::Bottom => center_x - side / 2.0,
        _ if right => anchor_x,
        _ => anchor_x - side,
    };
    let y = match handle {
        ResizeHandle::Left | ResizeHandle::Right => center_y - side / 2.0,
        _ if bottom => anchor_y,
        _ => anchor_y - side,
    };
    PixelCrop::new(x, y, side, side)
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    handle: ResizeHandle,
    origin: PixelCrop,
    start: (f32, f32),
}

/// Pointer sequencing for one selector: presses, drags, releases and clicks
/// in, [`SelectorEvent`]s out.
///
/// A gesture only starts on a press that hits the crop. `Changed` is reported
/// for every move that alters the crop and `Committed` once, on release.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gesture {
    drag: Option<DragState>,
}

impl Gesture {
    /// Starts a drag if `(x, y)` hits `current`. Returns whether one started.
    pub fn press(&mut self, x: f32, y: f32, current: PixelCrop) -> bool {
        self.drag = hit_test(x, y, current).map(|handle| DragState {
            handle,
            origin: current,
            start: (x, y),
        });
        self.drag.is_some()
    }

    /// Applies the total offset since the press.
    pub fn drag_to(
        &self,
        x: f32,
        y: f32,
        current: PixelCrop,
        bounds: Size,
        min_size: f32,
    ) -> Option<SelectorEvent> {
        let drag = self.drag?;
        let moved = drag_square(
            drag.origin,
            drag.handle,
            x - drag.start.0,
            y - drag.start.1,
            bounds,
            min_size,
        );
        (moved != current).then(|| SelectorEvent::Changed(Crop::from_pixels(moved, bounds)))
    }

    /// Ends the drag, committing `current` if one was running.
    pub fn release(&mut self, current: PixelCrop) -> Option<SelectorEvent> {
        self.drag.take().map(|_| SelectorEvent::Committed(current))
    }

    /// A click without movement commits the crop when it lands inside.
    pub fn click(&self, x: f32, y: f32, current: PixelCrop) -> Option<SelectorEvent> {
        current
            .contains(x, y)
            .then_some(SelectorEvent::Committed(current))
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

/// The egui selector: dimmed surroundings, a border and eight handles.
#[derive(Default)]
pub struct CropOverlay {
    gesture: Gesture,
}

impl CropOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    fn paint(painter: &egui::Painter, image_rect: egui::Rect, crop: PixelCrop) {
        let screen_crop_rect = egui::Rect::from_min_size(
            image_rect.min + egui::vec2(crop.x, crop.y),
            egui::vec2(crop.width, crop.height),
        );

        let overlay_color = egui::Color32::from_black_alpha(150);
        let shades = [
            // Top
            egui::Rect::from_min_max(
                image_rect.min,
                egui::pos2(image_rect.max.x, screen_crop_rect.min.y),
            ),
            // Bottom
            egui::Rect::from_min_max(
                egui::pos2(image_rect.min.x, screen_crop_rect.max.y),
                image_rect.max,
            ),
            // Left
            egui::Rect::from_min_max(
                egui::pos2(image_rect.min.x, screen_crop_rect.min.y),
                egui::pos2(screen_crop_rect.min.x, screen_crop_rect.max.y),
            ),
            // Right
            egui::Rect::from_min_max(
                egui::pos2(screen_crop_rect.max.x, screen_crop_rect.min.y),
                egui::pos2(image_rect.max.x, screen_crop_rect.max.y),
            ),
        ];
        for shade in shades {
            painter.rect_filled(shade, 0.0, overlay_color);
        }

        painter.rect_stroke(
            screen_crop_rect,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::WHITE),
        );

        let handle_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
        let handles = [
            screen_crop_rect.min,
            screen_crop_rect.max,
            egui::pos2(screen_crop_rect.min.x, screen_crop_rect.max.y),
            egui::pos2(screen_crop_rect.max.x, screen_crop_rect.min.y),
            screen_crop_rect.center_top(),
            screen_crop_rect.center_bottom(),
            screen_crop_rect.left_center(),
            screen_crop_rect.right_center(),
        ];
        for pos in handles {
            painter.circle(pos, HANDLE_RADIUS, egui::Color32::WHITE, handle_stroke);
        }
    }
}

impl CropSelector for CropOverlay {
    fn show(
        &mut self,
        ui: &mut egui::Ui,
        texture: &egui::TextureHandle,
        image_rect: egui::Rect,
        crop: Option<Crop>,
        constraints: CropConstraints,
    ) -> Vec<SelectorEvent> {
        let target_rect = image_rect.expand(HANDLE_PADDING);
        let response = ui.allocate_rect(target_rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(target_rect);

        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let Some(crop) = crop else {
            self.gesture.cancel();
            return Vec::new();
        };

        let display = Size::new(image_rect.width(), image_rect.height());
        let local = |pos: egui::Pos2| {
            let offset = pos - image_rect.min;
            (offset.x, offset.y)
        };
        let mut current = crop.pixel;
        let mut events = Vec::new();

        if let Some((x, y)) = response.hover_pos().map(local) {
            if let Some(handle) = hit_test(x, y, current) {
                ui.ctx().set_cursor_icon(handle.cursor());
            }
        }

        if response.drag_started() {
            let start = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            match start.map(local) {
                Some((x, y)) => {
                    self.gesture.press(x, y, current);
                }
                None => self.gesture.cancel(),
            }
        }

        if response.dragged() {
            if let Some((x, y)) = response.interact_pointer_pos().map(local) {
                let event = self.gesture.drag_to(x, y, current, display, constraints.min_size);
                if let Some(SelectorEvent::Changed(moved)) = event {
                    current = moved.pixel;
                    events.push(SelectorEvent::Changed(moved));
                }
            }
        }

        if response.drag_stopped() {
            events.extend(self.gesture.release(current));
        }

        if response.clicked() {
            if let Some((x, y)) = response.interact_pointer_pos().map(local) {
                events.extend(self.gesture.click(x, y, current));
            }
        }

        Self::paint(&painter, image_rect, current);
        events
    }
}
