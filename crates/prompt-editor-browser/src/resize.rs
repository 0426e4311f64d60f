//! Pointer tracking for image resize drags.
//!
//! Pressing a `data-resize-handle` element starts a session that follows
//! the pointer on the window until release, so the drag keeps working when
//! the pointer leaves the image.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Element, EventTarget, MouseEvent};

use crate::dom_sync::leaf_element;

const HANDLE_ATTR: &str = "data-resize-handle";

/// Leaf index of the resize handle at `target`, if it is one.
pub fn handle_leaf(target: &EventTarget) -> Option<usize> {
    target
        .dyn_ref::<Element>()?
        .get_attribute(HANDLE_ATTR)?
        .parse()
        .ok()
}

/// Rendered width of the image at `leaf`.
pub fn rendered_width(root: &Element, leaf: usize) -> Option<f64> {
    let image = leaf_element(root, leaf)?.query_selector("img").ok()??;
    Some(image.get_bounding_client_rect().width())
}

/// An active drag. Dropping it detaches the listeners.
pub struct ResizeSession {
    _listeners: [EventListener; 2],
}

impl ResizeSession {
    pub fn start(
        mut on_move: impl FnMut(f64) + 'static,
        on_end: impl FnOnce() + 'static,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        let on_end = Rc::new(RefCell::new(Some(on_end)));

        let moved = EventListener::new(&window, "pointermove", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                event.prevent_default();
                on_move(f64::from(event.client_x()));
            }
        });
        let released = EventListener::new(&window, "pointerup", move |_| {
            if let Some(end) = on_end.borrow_mut().take() {
                end();
            }
        });
        Some(Self {
            _listeners: [moved, released],
        })
    }
}
