//! Crop rectangles in the two coordinate spaces the selector speaks.
//!
//! Pixel crops are measured in *displayed* pixels, i.e. against the image as
//! drawn on screen, never against the decoded image. Percent crops are the
//! same rectangle relative to the displayed size and survive window resizes.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative or not a number.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Rectangle in displayed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelCrop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelCrop {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Same rectangle as a percentage of `display`.
    pub fn to_percent(&self, display: Size) -> PercentCrop {
        if display.is_empty() {
            return PercentCrop::default();
        }
        PercentCrop {
            x: self.x / display.width * 100.0,
            y: self.y / display.height * 100.0,
            width: self.width / display.width * 100.0,
            height: self.height / display.height * 100.0,
        }
    }

    /// Shrinks and shifts the rectangle until it lies inside `bounds`.
    pub fn clamp_to(&self, bounds: Size) -> PixelCrop {
        let width = self.width.clamp(0.0, bounds.width.max(0.0));
        let height = self.height.clamp(0.0, bounds.height.max(0.0));
        let x = self.x.clamp(0.0, (bounds.width - width).max(0.0));
        let y = self.y.clamp(0.0, (bounds.height - height).max(0.0));
        PixelCrop::new(x, y, width, height)
    }
}

/// Rectangle in percent (0-100) of the displayed size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PercentCrop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PercentCrop {
    pub fn to_pixels(&self, display: Size) -> PixelCrop {
        PixelCrop {
            x: self.x * display.width / 100.0,
            y: self.y * display.height / 100.0,
            width: self.width * display.width / 100.0,
            height: self.height * display.height / 100.0,
        }
    }
}

/// A crop carried in both spaces, as the selector reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crop {
    pub pixel: PixelCrop,
    pub percent: PercentCrop,
}

impl Crop {
    pub fn from_pixels(pixel: PixelCrop, display: Size) -> Self {
        Self {
            pixel,
            percent: pixel.to_percent(display),
        }
    }

    pub fn from_percent(percent: PercentCrop, display: Size) -> Self {
        Self {
            pixel: percent.to_pixels(display),
            percent,
        }
    }
}

/// Size of the image as laid out on screen, plus the screen's pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub size: Size,
    pub pixel_ratio: f32,
}

impl DisplayMetrics {
    pub fn new(size: Size, pixel_ratio: f32) -> Self {
        Self { size, pixel_ratio }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_and_pixels_agree() {
        let display = Size::new(400.0, 200.0);
        let pixel = PixelCrop::new(100.0, 0.0, 200.0, 200.0);
        let percent = pixel.to_percent(display);
        assert_eq!(percent.x, 25.0);
        assert_eq!(percent.width, 50.0);
        assert_eq!(percent.height, 100.0);
        assert_eq!(percent.to_pixels(display), pixel);
    }

    #[test]
    fn percent_of_empty_display_is_zero() {
        let pixel = PixelCrop::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(pixel.to_percent(Size::new(0.0, 10.0)), PercentCrop::default());
    }

    #[test]
    fn percent_crop_follows_a_resize() {
        let crop = Crop::from_pixels(PixelCrop::new(20.0, 20.0, 100.0, 100.0), Size::new(200.0, 200.0));
        let resized = crop.percent.to_pixels(Size::new(100.0, 100.0));
        assert_eq!(resized, PixelCrop::new(10.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn clamp_pulls_region_back_inside() {
        let bounds = Size::new(200.0, 100.0);
        let clamped = PixelCrop::new(150.0, -5.0, 80.0, 80.0).clamp_to(bounds);
        assert_eq!(clamped, PixelCrop::new(120.0, 0.0, 80.0, 80.0));

        let oversized = PixelCrop::new(0.0, 0.0, 300.0, 300.0).clamp_to(bounds);
        assert_eq!(oversized, PixelCrop::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::new(0.0, 10.0).is_empty());
        assert!(Size::new(f32::NAN, 10.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }
}
