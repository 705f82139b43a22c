use glam::Vec2;
use std::time::{Duration, Instant};

use crate::types::PlaneId;

/// Description overlay shown in navigation mode
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub plane: PlaneId,
    pub text: String,
    /// Top-left corner, in canvas coordinates
    pub anchor: Vec2,
}

/// Hover-to-show, tap-to-toggle description overlay
#[derive(Debug, Clone)]
pub struct TooltipPresenter {
    current: Option<Tooltip>,
    last_tap: Option<(PlaneId, Instant)>,
    double_tap_window: Duration,
    offset: f32,
}

impl TooltipPresenter {
    pub fn new(double_tap_window: Duration, offset: f32) -> Self {
        Self {
            current: None,
            last_tap: None,
            double_tap_window,
            offset,
        }
    }

    pub fn current(&self) -> Option<&Tooltip> {
        self.current.as_ref()
    }

    /// Show `text` for `plane` near `pointer`; blank text shows nothing
    ///
    /// Returns true when the visible state changed.
    pub fn show(&mut self, plane: &PlaneId, text: &str, pointer: Vec2) -> bool {
        let next = (!text.trim().is_empty()).then(|| Tooltip {
            plane: plane.clone(),
            text: text.to_string(),
            anchor: pointer + Vec2::splat(self.offset),
        });
        let changed = self.current != next;
        self.current = next;
        changed
    }

    /// Hide the tooltip; true if one was visible
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Hide only if it belongs to `plane`
    pub fn leave(&mut self, plane: &PlaneId) -> bool {
        match &self.current {
            Some(tooltip) if &tooltip.plane == plane => self.clear(),
            _ => false,
        }
    }

    /// Tap on a plane: show, or hide on a second tap inside the window
    pub fn tap(&mut self, plane: &PlaneId, text: &str, pointer: Vec2, now: Instant) -> bool {
        let double_tap = match &self.last_tap {
            Some((last, at)) => last == plane && now.saturating_duration_since(*at) < self.double_tap_window,
            None => false,
        };

        if double_tap {
            self.last_tap = None;
            return self.clear();
        }

        self.last_tap = Some((plane.clone(), now));
        self.show(plane, text, pointer)
    }

    /// Forget tooltip and tap history
    pub fn reset(&mut self) -> bool {
        self.last_tap = None;
        self.clear()
    }
}
