//! Platform abstraction traits for editor operations.
//!
//! These traits define the interface between the editor logic and
//! platform-specific implementations (browser DOM, test doubles). Leaves are
//! rendered with a `data-leaf` index, so a platform only has to map between
//! its own nodes and [`Position`]s.

use crate::error::PlatformError;
use crate::types::{Position, Rect, Selection, Size};

/// Platform-specific cursor and selection operations.
///
/// The browser implementation uses the DOM Selection API.
pub trait CursorPlatform {
    /// Put the platform selection where the editor's selection is, after the
    /// content was re-rendered.
    fn restore_selection(&self, selection: Selection) -> Result<(), PlatformError>;

    /// Bounding rectangle of a selection, in viewport coordinates.
    ///
    /// Returns None if the selection is not rendered.
    fn selection_rect(&self, selection: Selection) -> Option<Rect>;
}

/// Platform-specific cursor state synchronization.
///
/// Reads the current selection from the platform UI back into the editor
/// model. This is the inverse of `CursorPlatform`.
pub trait CursorSync {
    /// The platform selection as editor positions, or `None` when it lies
    /// outside the editing surface.
    fn read_selection(&self) -> Option<Selection>;

    /// Position under a viewport point, used for drop targets.
    fn position_at_point(&self, x: f64, y: f64) -> Option<Position>;
}

/// Focus and geometry of the editing surface and its popovers.
pub trait SurfacePlatform {
    /// Give the editing surface keyboard focus.
    fn focus(&self) -> Result<(), PlatformError>;

    fn viewport(&self) -> Size;
}

/// A platform that can do everything the editor needs.
pub trait EditorPlatform: CursorPlatform + CursorSync + SurfacePlatform {
    /// Honor a focus request from the shell, putting the cursor back.
    fn refocus(&self, selection: Selection) -> Result<(), PlatformError> {
        self.focus()?;
        self.restore_selection(selection)
    }
}

impl<T: CursorPlatform + CursorSync + SurfacePlatform> EditorPlatform for T {}
