//! Coordinate translation from in-page geometry to screen points.

use tracing::debug;

use formpilot_protocols::{Locator, ScreenPoint};

use crate::error::PageError;
use crate::session::PageSession;

/// Converts an element's page geometry into an absolute pointing-device
/// coordinate: viewport-relative center, plus the window's screen origin,
/// scaled by the device pixel ratio.
pub struct CoordinateTranslator<'a> {
    session: &'a dyn PageSession,
}

impl<'a> CoordinateTranslator<'a> {
    pub fn new(session: &'a dyn PageSession) -> Self {
        Self { session }
    }

    /// Translate a locator to a screen point, scrolling the element into
    /// view first if needed. Fails with [`PageError::OutOfViewport`] when
    /// the element cannot be brought into the visible viewport.
    pub fn to_screen_point(&self, locator: &Locator) -> Result<ScreenPoint, PageError> {
        let path = self.session.resolve(locator)?;
        let mut viewport = self.session.viewport();
        let mut rect = self.session.rect_of(&path)?;

        if !rect.is_visible_in_viewport(&viewport) {
            self.session.scroll_into_view(&path)?;
            viewport = self.session.viewport();
            rect = self.session.rect_of(&path)?;
            if !rect.is_visible_in_viewport(&viewport) {
                return Err(PageError::OutOfViewport(locator.to_string()));
            }
        }

        let (cx, cy) = rect.center();
        let x = (viewport.screen_x + cx - viewport.scroll_x) * viewport.device_pixel_ratio;
        let y = (viewport.screen_y + cy - viewport.scroll_y) * viewport.device_pixel_ratio;
        let point = ScreenPoint::new(x.round() as i32, y.round() as i32);
        debug!("translated {} -> ({}, {})", locator, point.x, point.y);
        Ok(point)
    }
}

#[cfg(test)]
#[path = "coords_tests.rs"]
mod tests;
