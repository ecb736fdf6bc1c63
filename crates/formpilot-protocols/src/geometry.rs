//! Shared geometry types: viewport, bounding box, screen point.

use serde::{Deserialize, Serialize};

/// Viewport information for coordinate calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportInfo {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub device_pixel_ratio: f64,
    /// Scroll X offset.
    pub scroll_x: f64,
    /// Scroll Y offset.
    pub scroll_y: f64,
    /// Screen-origin X offset of the viewport (window chrome).
    pub screen_x: f64,
    /// Screen-origin Y offset of the viewport (window chrome).
    pub screen_y: f64,
}

impl Default for ViewportInfo {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
            screen_x: 0.0,
            screen_y: 0.0,
        }
    }
}

/// Bounding box for an element, in page-absolute CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Get the center point of this bounding box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this box intersects with another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Check if this box has zero area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if this box is within the currently scrolled viewport.
    pub fn is_visible_in_viewport(&self, viewport: &ViewportInfo) -> bool {
        let vp_box = BoundingBox {
            x: viewport.scroll_x,
            y: viewport.scroll_y,
            width: viewport.width as f64,
            height: viewport.height as f64,
        };
        self.intersects(&vp_box)
    }
}

/// Absolute pointing-device coordinate in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_center() {
        let rect = BoundingBox::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(rect.center(), (60.0, 40.0));
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BoundingBox::new(40.0, 40.0, 50.0, 50.0);
        let c = BoundingBox::new(100.0, 100.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_visible_in_scrolled_viewport() {
        let rect = BoundingBox::new(0.0, 1000.0, 100.0, 30.0);
        let mut vp = ViewportInfo::default();
        assert!(!rect.is_visible_in_viewport(&vp));
        vp.scroll_y = 900.0;
        assert!(rect.is_visible_in_viewport(&vp));
    }

    #[test]
    fn test_empty_box() {
        assert!(BoundingBox::default().is_empty());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
