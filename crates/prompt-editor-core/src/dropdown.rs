//! Popover placement and open/close state for toolbar pickers.
//!
//! Positions are viewport coordinates. A panel opens below its trigger when
//! there is room (or at least as much room as above), otherwise above, and
//! is kept at least [`EDGE_MARGIN`] pixels inside every viewport edge.

use crate::types::{Rect, Size};

/// Minimum distance between a panel and the viewport edge.
pub const EDGE_MARGIN: f64 = 8.0;

/// Gap between trigger and panel.
pub const TRIGGER_GAP: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    Above,
}

/// Where to put a panel. The host scrolls the panel when its content is
/// larger than `max_height` or `max_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    pub max_height: f64,
    pub max_width: f64,
    /// Panels are at least as wide as their trigger, within `max_width`.
    pub min_width: f64,
    pub side: Side,
}

impl Placement {
    /// Height the panel actually occupies.
    pub fn height(&self, panel: Size) -> f64 {
        panel.height.min(self.max_height)
    }

    /// Width the panel actually occupies.
    pub fn width(&self, panel: Size) -> f64 {
        panel.width.max(self.min_width).min(self.max_width)
    }
}

fn max_width(viewport: Size) -> f64 {
    (viewport.width - 2.0 * EDGE_MARGIN).max(0.0)
}

/// Place a dropdown panel of size `panel` against `trigger`.
pub fn place_panel(trigger: Rect, panel: Size, viewport: Size) -> Placement {
    let space_below = viewport.height - trigger.bottom();
    let space_above = trigger.top;
    let side = if space_below >= panel.height || space_below >= space_above {
        Side::Below
    } else {
        Side::Above
    };
    let placement = vertical(trigger, panel, viewport, side);
    let placement = Placement {
        min_width: trigger.width.min(placement.max_width),
        ..placement
    };
    let placement = Placement {
        left: clamp_left(trigger.left, placement.width(panel), viewport),
        ..placement
    };
    tracing::trace!(?side, top = placement.top, left = placement.left, "dropdown placed");
    placement
}

/// Place a floating panel centered over `anchor`, preferring the space above
/// it and flipping below when it does not fit.
pub fn place_centered(anchor: Rect, panel: Size, viewport: Size) -> Placement {
    let needed = panel.height + TRIGGER_GAP + EDGE_MARGIN;
    let side = if anchor.top >= needed || anchor.top >= viewport.height - anchor.bottom() {
        Side::Above
    } else {
        Side::Below
    };
    let placement = vertical(anchor, panel, viewport, side);
    let width = placement.width(panel);
    Placement {
        left: clamp_left(anchor.center_x() - width / 2.0, width, viewport),
        ..placement
    }
}

fn vertical(trigger: Rect, panel: Size, viewport: Size, side: Side) -> Placement {
    let (top, max_height) = match side {
        Side::Below => {
            let top = trigger.bottom() + TRIGGER_GAP;
            (top, (viewport.height - top - EDGE_MARGIN).max(0.0))
        }
        Side::Above => {
            let max_height = (trigger.top - TRIGGER_GAP - EDGE_MARGIN).max(0.0);
            let height = panel.height.min(max_height);
            (trigger.top - TRIGGER_GAP - height, max_height)
        }
    };
    Placement {
        top,
        left: 0.0,
        max_height,
        max_width: max_width(viewport),
        min_width: 0.0,
        side,
    }
}

fn clamp_left(left: f64, width: f64, viewport: Size) -> f64 {
    let left = if left + width > viewport.width - EDGE_MARGIN {
        viewport.width - width - EDGE_MARGIN
    } else {
        left
    };
    left.max(EDGE_MARGIN)
}

/// Open/closed state of one picker, with the value it currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownState<T> {
    value: Option<T>,
    placement: Option<Placement>,
}

impl<T> Default for DropdownState<T> {
    fn default() -> Self {
        Self {
            value: None,
            placement: None,
        }
    }
}

impl<T> DropdownState<T> {
    pub fn new(value: Option<T>) -> Self {
        Self {
            value,
            placement: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.placement.is_some()
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Reflect the editor's current value (e.g. the font at the cursor).
    pub fn set_value(&mut self, value: Option<T>) {
        self.value = value;
    }

    /// Open with a freshly computed position, or close if open. The
    /// position is only computed on opening.
    pub fn toggle(&mut self, trigger: Rect, panel: Size, viewport: Size) {
        if self.is_open() {
            self.close();
        } else {
            self.open_with(place_panel(trigger, panel, viewport));
        }
    }

    pub fn open_with(&mut self, placement: Placement) {
        self.placement = Some(placement);
    }

    pub fn close(&mut self) {
        self.placement = None;
    }

    /// A pointer went down somewhere. Anything outside the trigger and the
    /// panel closes the dropdown; returns whether it closed.
    pub fn pointer_down(&mut self, inside: bool) -> bool {
        if inside || !self.is_open() {
            return false;
        }
        self.close();
        true
    }

    /// Pick an option: closes the dropdown and hands the value to
    /// `on_change` exactly once. Ignored while closed.
    pub fn select<R>(&mut self, value: T, on_change: impl FnOnce(T) -> R) -> Option<R>
    where
        T: Clone,
    {
        if !self.is_open() {
            return None;
        }
        self.close();
        self.value = Some(value.clone());
        Some(on_change(value))
    }
}
