//! Screen geometry and unit conversion.
//!
//! The experiment ran on a single wall-sized display. Trial logs record
//! positions in display pixels; analysis output is in centimetres. All
//! conversions between the two spaces go through [`ScreenGeometry`] so that
//! every crate agrees on the pixel pitch.

use serde::{Deserialize, Serialize};

/// Physical and pixel dimensions of the trial display, plus the layout
/// constants used for workspace membership tests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Physical width in centimetres.
    pub width_cm: f64,
    /// Physical height in centimetres.
    pub height_cm: f64,
    /// Horizontal resolution in pixels.
    pub width_px: f64,
    /// Vertical resolution in pixels.
    pub height_px: f64,
    /// Width of the dead band around the centre seam in fixed-partition
    /// trials, in pixels.
    pub static_gutter_px: f64,
    /// Radius of a movable workspace, in pixels.
    pub movable_radius_px: f64,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width_cm: 413.0,
            height_cm: 117.0,
            width_px: 7680.0,
            height_px: 2160.0,
            static_gutter_px: 580.0,
            movable_radius_px: 512.0,
        }
    }
}

impl ScreenGeometry {
    /// Centimetres per pixel.
    pub fn px_to_cm_factor(&self) -> f64 {
        self.width_cm / self.width_px
    }

    /// Convert a pixel measure to centimetres.
    pub fn px_to_cm(&self, px: f64) -> f64 {
        px * self.px_to_cm_factor()
    }

    /// Movable workspace radius in centimetres.
    pub fn movable_radius_cm(&self) -> f64 {
        self.px_to_cm(self.movable_radius_px)
    }

    /// Horizontal screen centre in pixels.
    pub fn half_width_px(&self) -> f64 {
        self.width_px * 0.5
    }

    /// Horizontal screen centre in centimetres.
    pub fn half_width_cm(&self) -> f64 {
        self.width_cm * 0.5
    }

    /// Whether a centimetre x-coordinate falls on the left half of the screen.
    pub fn on_left_half_cm(&self, x_cm: f64) -> bool {
        x_cm < self.half_width_cm()
    }

    /// Whether a pixel x-coordinate falls on the left half of the screen.
    pub fn on_left_half_px(&self, x_px: f64) -> bool {
        x_px < self.half_width_px()
    }
}

/// Euclidean length of the vector `(dx, dy)`.
pub fn euclidean(dx: f64, dy: f64) -> f64 {
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_to_cm_uses_horizontal_pitch() {
        let screen = ScreenGeometry::default();
        let factor = 413.0 / 7680.0;
        assert!((screen.px_to_cm(1.0) - factor).abs() < 1e-12);
        assert!((screen.px_to_cm(7680.0) - 413.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_screen_tests_agree_across_units() {
        let screen = ScreenGeometry::default();
        assert!(screen.on_left_half_px(3839.0));
        assert!(!screen.on_left_half_px(3840.0));
        assert!(screen.on_left_half_cm(206.0));
        assert!(!screen.on_left_half_cm(207.0));
    }

    #[test]
    fn test_euclidean() {
        assert!((euclidean(3.0, 4.0) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean(0.0, 0.0), 0.0);
    }
}
