//! Definition popover placement.
//!
//! Pure geometry: given the clicked word's bounding box and the
//! viewport, compute where the popover and its pointer tip go. The
//! popover sits just below the anchor and shifts left as needed to
//! stay on screen; the tip slides the other way so it keeps pointing
//! at the anchor.

use serde::{Deserialize, Serialize};

/// Vertical clearance below the anchor, leaving room for the tip.
pub const TIP_GAP: f64 = 14.0;
/// How far left of the anchor the popover's edge prefers to sit.
pub const EDGE_GAP: f64 = 8.0;
/// Minimum space kept free at the right edge of the viewport.
pub const RIGHT_MARGIN: f64 = 16.0;
/// Responsive width cap as a fraction of the viewport.
pub const WIDTH_FRACTION: f64 = 0.4;
/// Absolute width cap in CSS pixels.
pub const MAX_WIDTH: f64 = 360.0;
/// The tip never slides off the popover's rounded corner.
pub const TIP_MIN: f64 = 8.0;

/// An element's bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

/// Computed placement in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopoverLayout {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    /// Horizontal offset of the pointer tip from the popover's left
    /// edge, aimed at the anchor's center.
    pub tip_offset: f64,
}

pub fn place(anchor: Rect, viewport: Viewport) -> PopoverLayout {
    let width = (viewport.width * WIDTH_FRACTION).min(MAX_WIDTH);
    let anchor_top = viewport.scroll_y + anchor.top;
    let anchor_left = viewport.scroll_x + anchor.left;
    let top = anchor_top + anchor.height + TIP_GAP;
    let preferred = anchor_left - EDGE_GAP;
    let rightmost = viewport.scroll_x + viewport.width - RIGHT_MARGIN - width;
    let left = preferred.min(rightmost);
    let tip_offset = (anchor_left + anchor.width / 2.0 - left).max(TIP_MIN);
    PopoverLayout {
        top,
        left,
        width,
        tip_offset,
    }
}
