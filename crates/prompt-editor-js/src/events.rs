//! DOM listeners on the editing surface.
//!
//! Every handler borrows the mounted editor through [`Host::with`], so the
//! surface is re-rendered and JS callbacks fire once the event is handled.

use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions};
use prompt_editor_browser::dom_sync::{is_atom, leaf_of};
use prompt_editor_browser::events::{
    get_data_from_event, get_input_type_from_event, get_target_range_from_event,
};
use prompt_editor_browser::files::{file_meta, files_from_data_transfer, pair_tickets, spawn_reads};
use prompt_editor_browser::resize::{handle_leaf, rendered_width};
use prompt_editor_browser::{
    BeforeInputContext, BeforeInputResult, ResizeSession, handle_beforeinput,
    handle_composition_end, handle_keydown, key_combo_from_event,
};
use prompt_editor_core::{CursorSync, EditorAction, Key, KeydownResult, Position};
use wasm_bindgen::JsCast;
use web_sys::{
    ClipboardEvent, CompositionEvent, DragEvent, File, HtmlElement, InputEvent, KeyboardEvent,
    MouseEvent, Node,
};

use crate::editor::Host;

/// Install the surface's listeners. Dropping them detaches them.
pub(crate) fn attach(host: &Rc<Host>, root: &HtmlElement) -> Vec<EventListener> {
    let mut listeners = Vec::new();
    let active = EventListenerOptions::enable_prevent_default();

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new_with_options(root, "beforeinput", active, move |event| {
        let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<InputEvent>()) else {
            return;
        };
        on_beforeinput(&host, event);
    }));

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new(root, "compositionend", move |event| {
        let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<CompositionEvent>())
        else {
            return;
        };
        host.with(|m| handle_composition_end(&mut m.shell, event.data()));
    }));

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new_with_options(root, "keydown", active, move |event| {
        let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<KeyboardEvent>()) else {
            return;
        };
        on_keydown(&host, event);
    }));

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new_with_options(root, "dragover", active, move |event| {
        if weak.upgrade().is_none() {
            return;
        }
        let carries_files = event
            .dyn_ref::<DragEvent>()
            .and_then(|e| e.data_transfer())
            .is_some_and(|dt| dt.types().includes(&"Files".into(), 0));
        if carries_files {
            event.prevent_default();
        }
    }));

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new_with_options(root, "drop", active, move |event| {
        let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<DragEvent>()) else {
            return;
        };
        on_drop(&host, event);
    }));

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new_with_options(root, "paste", active, move |event| {
        let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<ClipboardEvent>()) else {
            return;
        };
        let files = event
            .clipboard_data()
            .map(|dt| files_from_data_transfer(&dt))
            .unwrap_or_default();
        // Text pastes arrive as beforeinput.
        if files.iter().any(|f| file_meta(f).is_image()) {
            event.prevent_default();
            ingest(&host, files, None);
        }
    }));

    let weak = Rc::downgrade(host);
    listeners.push(EventListener::new_with_options(root, "pointerdown", active, move |event| {
        let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
            return;
        };
        on_pointerdown(&host, event);
    }));

    if let Some(document) = root.owner_document() {
        let weak = Rc::downgrade(host);
        listeners.push(EventListener::new(&document, "selectionchange", move |_| {
            if let Some(host) = weak.upgrade() {
                sync_selection(&host);
            }
        }));
    }

    listeners
}

fn on_beforeinput(host: &Host, event: &InputEvent) {
    let result = host.with(|m| {
        let root = m.surface.root().clone();
        let ctx = BeforeInputContext {
            input_type: get_input_type_from_event(event),
            data: get_data_from_event(event),
            target: get_target_range_from_event(event, &root),
            is_composing: event.is_composing(),
        };
        tracing::trace!(input_type = ?ctx.input_type, "beforeinput");
        handle_beforeinput(&mut m.shell, &ctx)
    });
    if result == Some(BeforeInputResult::Handled) {
        event.prevent_default();
    }
}

fn on_keydown(host: &Host, event: &KeyboardEvent) {
    let combo = key_combo_from_event(event);
    let result = host.with(|m| {
        if combo.key == Key::Escape && m.bubble.is_visible() {
            m.bubble.escape();
            return KeydownResult::Handled;
        }
        let platform = m.platform;
        handle_keydown(&mut m.shell, &combo, &platform)
    });
    if result == Some(KeydownResult::Handled) {
        event.prevent_default();
    }
}

fn on_drop(host: &Rc<Host>, event: &DragEvent) {
    let files = event
        .data_transfer()
        .map(|dt| files_from_data_transfer(&dt))
        .unwrap_or_default();
    if files.is_empty() {
        return;
    }
    event.prevent_default();
    let (x, y) = (f64::from(event.client_x()), f64::from(event.client_y()));
    let target = host
        .peek(|m| m.surface.position_at_point(x, y))
        .flatten();
    ingest(host, files, target);
}

/// Press on a resize handle starts a drag; a click on an image selects it.
fn on_pointerdown(host: &Rc<Host>, event: &MouseEvent) {
    let Some(target) = event.target() else {
        return;
    };
    let pointer_x = f64::from(event.client_x());

    if let Some(leaf) = handle_leaf(&target) {
        event.prevent_default();
        let started = host
            .with(|m| {
                let width = rendered_width(m.surface.root(), leaf)?;
                m.shell
                    .begin_resize(leaf, width, pointer_x)
                    .then_some(())
            })
            .flatten()
            .is_some();
        if started {
            start_resize(host);
        }
        return;
    }

    let Some(node) = target.dyn_ref::<Node>() else {
        return;
    };
    host.with(|m| {
        let root = m.surface.root().clone();
        if let Some((element, leaf)) = leaf_of(node, &root) {
            if is_atom(&element) {
                m.shell.run(&EditorAction::SelectNode(leaf));
            }
        }
    });
}

fn start_resize(host: &Rc<Host>) {
    let on_move: Weak<Host> = Rc::downgrade(host);
    let on_end: Weak<Host> = Rc::downgrade(host);
    let session = ResizeSession::start(
        move |x| {
            if let Some(host) = on_move.upgrade() {
                host.with(|m| m.shell.update_resize(x));
            }
        },
        move || {
            if let Some(host) = on_end.upgrade() {
                // The session stays attached until the next drag replaces it.
                host.with(|m| {
                    if let Some(width) = m.shell.end_resize() {
                        tracing::debug!(width, "image resized");
                    }
                });
            }
        },
    );
    host.with(|m| m.resize = session);
}

/// Mirror a browser-driven selection change into the editor.
fn sync_selection(host: &Host) {
    let read = host.peek(|m| (m.surface.read_selection(), m.shell.selection()));
    let Some((Some(dom), current)) = read else {
        return;
    };
    if dom != current {
        host.with(|m| m.shell.run(&EditorAction::SetSelection(dom)));
    }
}

/// Read image files into the document at `target` (the selection when
/// `None`). Returns how many files are being read.
pub(crate) fn ingest(host: &Rc<Host>, files: Vec<File>, target: Option<Position>) -> usize {
    let metas = files.iter().map(file_meta).collect();
    let Some(tickets) = host.with(|m| m.shell.ingest_begin(metas, target)) else {
        return 0;
    };
    let reads = pair_tickets(files, tickets);
    let count = reads.len();

    let weak = Rc::downgrade(host);
    spawn_reads(reads, move |ticket, result| {
        let Some(host) = weak.upgrade() else {
            return;
        };
        host.with(|m| m.shell.ingest_complete(&ticket, result));
    });
    count
}
