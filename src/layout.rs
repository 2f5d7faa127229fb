//! Coordinate model tying together three spaces: the *logical* space of a
//! text layer (`[0,100]²` percentages of the template), the *native* render
//! space (template pixels), and the *display* space (the on-screen box the
//! preview occupies after responsive scaling).
//!
//! [`screen_to_logical`] is the single path by which pointer input writes
//! back into layer geometry; it clamps both axes so an out-of-range value can
//! never reach a [`TextLayer`](crate::model::TextLayer).

use crate::model::{HAlign, Template, TextLayer};

/// Fixed line-height multiplier: line `i` of a layer draws at
/// `anchor_y + i * font_size * LINE_HEIGHT_FACTOR`. Not configurable.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// A point in the surrounding UI's screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen bounding box of the preview canvas, in screen coordinates.
///
/// Captured fresh for every pointer-move event so a mid-drag resize keeps the
/// pointer-to-logical mapping correct.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Pointer offset inside the dragged element, captured once at drag start and
/// held constant for the whole gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragAnchor {
    pub dx: f64,
    pub dy: f64,
}

impl DragAnchor {
    /// Anchor from the pointer-down position and the dragged element's
    /// on-screen origin.
    pub fn capture(pointer: ScreenPoint, element_origin: ScreenPoint) -> Self {
        Self {
            dx: pointer.x - element_origin.x,
            dy: pointer.y - element_origin.y,
        }
    }
}

/// Overlay-side placement for one layer, expressed in percentages so the UI
/// can position its interactive handle without knowing the display scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    pub top_pct: f64,
    /// Horizontal anchor measured from the left edge, via
    /// [`resolved_anchor_pct`] — the same function the compositor consults.
    pub anchor_from_left_pct: f64,
    /// Centered layers additionally shift half their own width leftward.
    pub centered: bool,
}

/// Logical `(x, y)` percentages to a native-space point in template pixels.
pub fn to_native(x_pct: f64, y_pct: f64, template: &Template) -> kurbo::Point {
    kurbo::Point::new(
        x_pct / 100.0 * f64::from(template.width),
        y_pct / 100.0 * f64::from(template.height),
    )
}

/// Native pixels back to logical percentages. Inverse of [`to_native`].
pub fn to_logical(native: kurbo::Point, template: &Template) -> (f64, f64) {
    (
        native.x / f64::from(template.width) * 100.0,
        native.y / f64::from(template.height) * 100.0,
    )
}

/// Scale factor sizing the interactive overlay to the canvas's display
/// footprint. Never applied to native render math.
///
/// A container width of zero or less means layout has not happened yet; the
/// scale stays `1.0` rather than dividing by zero.
pub fn display_scale(container_width: f64, template: &Template) -> f64 {
    if container_width <= 0.0 || !container_width.is_finite() {
        return 1.0;
    }
    container_width / f64::from(template.width)
}

/// Map a pointer position in screen space into logical layer coordinates.
///
/// Position relative to the canvas box, minus the drag anchor, normalized by
/// the display size, scaled to percent, then clamped to `[0,100]` per axis.
pub fn screen_to_logical(
    pointer: ScreenPoint,
    canvas_rect: DisplayRect,
    anchor: DragAnchor,
) -> (f64, f64) {
    let x = if canvas_rect.width > 0.0 {
        (pointer.x - canvas_rect.left - anchor.dx) / canvas_rect.width * 100.0
    } else {
        0.0
    };
    let y = if canvas_rect.height > 0.0 {
        (pointer.y - canvas_rect.top - anchor.dy) / canvas_rect.height * 100.0
    } else {
        0.0
    };
    (clamp_pct(x), clamp_pct(y))
}

/// Horizontal anchor as a percentage from the left edge, shared by the
/// overlay and the compositor so preview and raster agree exactly.
///
/// `Left` and `Center` anchor at `x`; `Right` anchors at `100 - x`.
pub fn resolved_anchor_pct(align: HAlign, x_pct: f64) -> f64 {
    match align {
        HAlign::Left | HAlign::Center => x_pct,
        HAlign::Right => 100.0 - x_pct,
    }
}

/// Overlay placement for one layer, derived entirely from shared anchor math.
pub fn overlay_placement(layer: &TextLayer) -> OverlayPlacement {
    OverlayPlacement {
        top_pct: layer.y,
        anchor_from_left_pct: resolved_anchor_pct(layer.align, layer.x),
        centered: layer.align == HAlign::Center,
    }
}

fn clamp_pct(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}
