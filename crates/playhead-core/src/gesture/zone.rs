//! Screen zones used to route pointer input

use serde::{Deserialize, Serialize};

/// End of the left zone as a fraction of the width
pub const LEFT_ZONE_END: f64 = 0.4;
/// Start of the right zone as a fraction of the width
pub const RIGHT_ZONE_START: f64 = 0.6;

/// Horizontal band of the player view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureZone {
    Left,
    Center,
    Right,
}

/// Player view geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Top chrome (title bar) excluded from gestures
    pub top_margin: f64,
    /// Bottom chrome (seek bar, buttons) excluded from gestures
    pub bottom_margin: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            top_margin: 0.0,
            bottom_margin: 0.0,
        }
    }

    pub fn with_margins(mut self, top: f64, bottom: f64) -> Self {
        self.top_margin = top;
        self.bottom_margin = bottom;
        self
    }

    /// Zone under a point, `None` inside chrome margins or off-screen
    pub fn zone_at(&self, x: f64, y: f64) -> Option<GestureZone> {
        if self.width <= 0.0 || x < 0.0 || x > self.width {
            return None;
        }
        if y < self.top_margin || y > self.height - self.bottom_margin {
            return None;
        }

        let fraction = x / self.width;
        Some(if fraction < LEFT_ZONE_END {
            GestureZone::Left
        } else if fraction < RIGHT_ZONE_START {
            GestureZone::Center
        } else {
            GestureZone::Right
        })
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}
