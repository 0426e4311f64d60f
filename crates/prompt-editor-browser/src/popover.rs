//! Measuring and dismissing dropdown panels.
//!
//! Placement itself is computed by the core from measured rectangles; this
//! module measures, applies the result as inline styles, and watches for
//! pointer presses outside the trigger and panel.

use gloo_events::EventListener;
use prompt_editor_core::{DropdownState, Placement, Rect, Size};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, Node};

use crate::dom_sync::viewport;

/// Bounding rectangle of an element in viewport coordinates.
pub fn measure(element: &Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
}

/// Natural size of a panel, including content scrolled out of view.
pub fn panel_size(panel: &Element) -> Size {
    Size::new(
        f64::from(panel.scroll_width()),
        f64::from(panel.scroll_height()),
    )
}

/// Open or close `state`'s dropdown from its trigger and panel elements.
pub fn toggle_dropdown<T>(state: &mut DropdownState<T>, trigger: &Element, panel: &Element) {
    state.toggle(measure(trigger), panel_size(panel), viewport());
    if let (Some(placement), Some(panel)) = (state.placement(), panel.dyn_ref::<HtmlElement>()) {
        apply_placement(panel, placement);
    }
}

/// Position a panel with `position: fixed` inline styles.
pub fn apply_placement(panel: &HtmlElement, placement: &Placement) {
    let style = panel.style();
    let props = [
        ("position", "fixed".to_string()),
        ("top", format!("{}px", placement.top)),
        ("left", format!("{}px", placement.left)),
        ("max-height", format!("{}px", placement.max_height)),
        ("max-width", format!("{}px", placement.max_width)),
        ("min-width", format!("{}px", placement.min_width)),
        ("overflow", "auto".to_string()),
    ];
    for (name, value) in props {
        if let Err(err) = style.set_property(name, &value) {
            tracing::warn!(?err, name, "could not style dropdown panel");
        }
    }
}

/// Calls `on_outside` whenever a pointer goes down outside both elements.
/// The listener is removed when this is dropped.
pub struct OutsideClick {
    _listener: EventListener,
}

impl OutsideClick {
    pub fn new(trigger: Element, panel: Element, mut on_outside: impl FnMut() + 'static) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let listener = EventListener::new(&document, "pointerdown", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
                return;
            };
            let inside = trigger.contains(Some(&target)) || panel.contains(Some(&target));
            if !inside {
                on_outside();
            }
        });
        Some(Self {
            _listener: listener,
        })
    }
}
