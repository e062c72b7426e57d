//! Pointer and touch tracking against the solved logo quad.
//!
//! Positions are normalized to the host box with a top-left origin. Hover is
//! decided on every move event and is either fully on or fully off.

use crate::layout::LogoLayout;

/// Host surface bounding box in the same coordinate space as pointer events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl HostRect {
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Maps a client position to `[0, 1]²` with the origin at the top-left.
    pub fn normalize(&self, client: [f64; 2]) -> Option<[f32; 2]> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        Some([
            ((client[0] - self.x) / self.width) as f32,
            ((client[1] - self.y) / self.height) as f32,
        ])
    }
}

/// Tracks the pointer in normalized coordinates and whether it hovers the logo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionTracker {
    position: [f32; 2],
    hover: bool,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn is_hovering(&self) -> bool {
        self.hover
    }

    pub fn hover_factor(&self) -> f32 {
        if self.hover {
            1.0
        } else {
            0.0
        }
    }

    pub fn on_pointer_move(&mut self, client: [f64; 2], host: HostRect, layout: &LogoLayout) -> [f32; 2] {
        if let Some(position) = host.normalize(client) {
            self.position = position;
            self.hover = layout.contains(position);
        }
        self.position
    }

    /// Touch moves follow the first active touch point; empty lists are ignored.
    pub fn on_touch_move(
        &mut self,
        touches: &[[f64; 2]],
        host: HostRect,
        layout: &LogoLayout,
    ) -> [f32; 2] {
        match touches.first() {
            Some(first) => self.on_pointer_move(*first, host, layout),
            None => self.position,
        }
    }
}

impl Default for InteractionTracker {
    fn default() -> Self {
        Self {
            position: [0.5, 0.5],
            hover: false,
        }
    }
}
