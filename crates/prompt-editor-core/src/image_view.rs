//! Resizable image node view.
//!
//! An image renders at its stored width, or fills the available width when
//! none is set. While the image is the node selection it shows a drag handle;
//! dragging updates the width live, never below [`MIN_IMAGE_WIDTH`].

use crate::document::ImageNode;

/// Smallest width a resize can produce, in pixels.
pub const MIN_IMAGE_WIDTH: u32 = 50;

/// How one image leaf should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageView {
    pub leaf: usize,
    pub width: Option<u32>,
    pub selected: bool,
}

impl ImageView {
    pub fn new(leaf: usize, image: &ImageNode, selected: bool) -> Self {
        Self {
            leaf,
            width: image.width,
            selected,
        }
    }

    /// CSS width: stored pixels, else full width.
    pub fn css_width(&self) -> String {
        match self.width {
            Some(px) => format!("{px}px"),
            None => "100%".to_string(),
        }
    }

    pub fn show_handle(&self) -> bool {
        self.selected
    }

    pub fn class(&self) -> &'static str {
        if self.selected {
            "resizable-image-container selected"
        } else {
            "resizable-image-container"
        }
    }
}

/// A resize drag in progress.
///
/// The starting width is the image's rendered width when the handle was
/// pressed, which may differ from the stored attribute (fill-width images
/// have none).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeDrag {
    pub leaf: usize,
    start_width: f64,
    start_x: f64,
    current: u32,
}

impl ResizeDrag {
    pub fn begin(leaf: usize, rendered_width: f64, pointer_x: f64) -> Self {
        Self {
            leaf,
            start_width: rendered_width,
            start_x: pointer_x,
            current: clamp_width(rendered_width),
        }
    }

    /// Width for the pointer's current x coordinate.
    pub fn update(&mut self, pointer_x: f64) -> u32 {
        self.current = clamp_width(self.start_width + (pointer_x - self.start_x));
        tracing::trace!(leaf = self.leaf, width = self.current, "resize drag");
        self.current
    }

    pub fn width(&self) -> u32 {
        self.current
    }

    /// Finish the drag; the last live width stands.
    pub fn end(self) -> u32 {
        self.current
    }
}

fn clamp_width(width: f64) -> u32 {
    if !width.is_finite() {
        return MIN_IMAGE_WIDTH;
    }
    (width.round().max(MIN_IMAGE_WIDTH as f64)).min(u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_far_left_clamps_to_minimum() {
        let mut drag = ResizeDrag::begin(0, 200.0, 500.0);
        assert_eq!(drag.update(-500.0), 50);
        assert_eq!(drag.end(), 50);
    }

    #[test]
    fn drag_updates_live() {
        let mut drag = ResizeDrag::begin(3, 200.0, 100.0);
        assert_eq!(drag.update(130.0), 230);
        assert_eq!(drag.update(90.0), 190);
        assert_eq!(drag.width(), 190);
        // No upper bound.
        assert_eq!(drag.update(5100.0), 5200);
    }

    #[test]
    fn view_width_and_handle() {
        let mut image = ImageNode::new("a.png");
        let view = ImageView::new(1, &image, false);
        assert_eq!(view.css_width(), "100%");
        assert!(!view.show_handle());

        image.width = Some(320);
        let view = ImageView::new(1, &image, true);
        assert_eq!(view.css_width(), "320px");
        assert!(view.show_handle());
        assert_eq!(view.class(), "resizable-image-container selected");
    }
}
