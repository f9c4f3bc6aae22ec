//! Integer-zoom crossing detection for transition timing.

use crate::TimePoint;

/// Tracks zoom movement across recalculate passes. `current_zoom` is only
/// advanced through `update`, which the engine calls once per recalculate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomHistory {
    pub previous_zoom: f64,
    pub current_zoom: f64,
    pub last_integer_zoom: f64,
    pub last_integer_zoom_time: TimePoint,
    seeded: bool,
}

impl ZoomHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The zoom of the most recent sample, if any sample was recorded.
    pub fn zoom(&self) -> Option<f64> {
        self.seeded.then_some(self.current_zoom)
    }

    /// Record a new zoom sample. Returns true when the integer part of the
    /// zoom changed since the previous sample, so a crossing is reported at
    /// most once no matter how many sub-frames straddle it.
    pub fn update(&mut self, zoom: f64, now: TimePoint) -> bool {
        if !self.seeded {
            self.seeded = true;
            self.previous_zoom = zoom;
            self.current_zoom = zoom;
            self.last_integer_zoom = zoom.floor();
            self.last_integer_zoom_time = TimePoint::ZERO;
            return false;
        }

        self.previous_zoom = self.current_zoom;
        let crossed = zoom.floor() != self.current_zoom.floor();
        if crossed {
            // The integer level just crossed: the new floor when zooming in,
            // the old floor when zooming out.
            self.last_integer_zoom = if zoom >= self.current_zoom {
                zoom.floor()
            } else {
                self.current_zoom.floor()
            };
            self.last_integer_zoom_time = now;
        }
        self.current_zoom = zoom;
        crossed
    }
}
