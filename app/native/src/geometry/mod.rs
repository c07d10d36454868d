//! Viewport and display geometry tracking.
//!
//! Tracks the panel's viewport bounds and the known display set, resolves
//! which display currently owns the viewport, and computes the translation
//! that positions the display-sized backdrop image under the viewport.
//!
//! All coordinates use a top-left origin, matching what the panel bridge
//! reports.

pub mod debouncer;

// ============================================================================
// Types
// ============================================================================

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

/// A rectangle in screen coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of the origin (top-left corner).
    pub x: f64,
    /// Y coordinate of the origin (top-left corner).
    pub y: f64,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the origin point of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Point { Point { x: self.x, y: self.y } }

    /// Returns the center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Checks whether a point lies within the rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Checks whether both dimensions are strictly positive.
    #[must_use]
    pub fn has_area(&self) -> bool { self.width > 0.0 && self.height > 0.0 }
}

/// A connected display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Display {
    /// Display frame in screen points.
    pub bounds: Rect,
    /// Whether this is the primary display (the one with the menu bar).
    pub is_primary: bool,
    /// Whether this is a built-in display (laptop screen).
    pub is_builtin: bool,
    /// Backing scale factor (1.0 for non-Retina displays).
    pub scale_factor: f64,
}

impl Display {
    /// Creates a new display.
    #[must_use]
    pub const fn new(bounds: Rect, is_primary: bool, is_builtin: bool, scale_factor: f64) -> Self {
        Self { bounds, is_primary, is_builtin, scale_factor }
    }

    /// The synthesized display used when no display information is
    /// available at all. Assumes a 4K panel so downstream code never
    /// divides by zero or crops against an empty rectangle.
    #[must_use]
    pub const fn assumed_default() -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, 3840.0, 2160.0),
            is_primary: true,
            is_builtin: false,
            scale_factor: 1.0,
        }
    }

    /// Display size in physical pixels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 { self.scale_factor } else { 1.0 };
        (
            (self.bounds.width * scale).round().max(1.0) as u32,
            (self.bounds.height * scale).round().max(1.0) as u32,
        )
    }
}

/// An immutable snapshot of the current geometry, taken once per cycle and
/// replaced whole. Never patched field-by-field across suspension points.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySnapshot {
    /// Current viewport bounds of the panel window.
    pub viewport: Rect,
    /// All known displays.
    pub displays: Vec<Display>,
}

impl GeometrySnapshot {
    /// Resolves the display owning the viewport.
    ///
    /// Tests whether the viewport's center point falls within each known
    /// display. Falls back, in order, to the primary display, to the
    /// built-in display, to the first known display, then to
    /// [`Display::assumed_default`]. The result always has positive
    /// dimensions.
    #[must_use]
    pub fn active_display(&self) -> Display {
        let center = self.viewport.center();

        self.displays
            .iter()
            .find(|d| d.bounds.contains(center))
            .or_else(|| self.displays.iter().find(|d| d.is_primary))
            .or_else(|| self.displays.iter().find(|d| d.is_builtin))
            .or_else(|| self.displays.first())
            .copied()
            .unwrap_or_else(Display::assumed_default)
    }

    /// Computes the translation that positions the display-sized backdrop
    /// image under the viewport.
    ///
    /// The backdrop is a copy of the whole display, so shifting it by the
    /// negated viewport offset within the display (plus the panel insets)
    /// lines it up with the wallpaper behind the window.
    #[must_use]
    pub fn backdrop_offset(&self, margin: f64, titlebar_offset: f64) -> Point {
        let display = self.active_display();
        Point {
            x: -(self.viewport.x - display.bounds.x + margin),
            y: -(self.viewport.y - display.bounds.y + margin + titlebar_offset),
        }
    }
}

// ============================================================================
// GeometryTracker
// ============================================================================

/// Tracks the latest viewport and display geometry reported by the host.
#[derive(Debug, Default)]
pub struct GeometryTracker {
    viewport: Rect,
    displays: Vec<Display>,
}

impl GeometryTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Records new viewport bounds.
    pub fn update_viewport(&mut self, viewport: Rect) { self.viewport = viewport; }

    /// Records a new display enumeration, discarding degenerate entries.
    pub fn update_displays(&mut self, displays: Vec<Display>) {
        let (valid, dropped): (Vec<_>, Vec<_>) =
            displays.into_iter().partition(|d| d.bounds.has_area());

        if !dropped.is_empty() {
            tracing::warn!(count = dropped.len(), "ignoring displays with non-positive bounds");
        }

        self.displays = valid;
    }

    /// Returns the current viewport bounds.
    #[must_use]
    pub const fn viewport(&self) -> Rect { self.viewport }

    /// Takes an immutable snapshot of the current geometry.
    #[must_use]
    pub fn snapshot(&self) -> GeometrySnapshot {
        GeometrySnapshot {
            viewport: self.viewport,
            displays: self.displays.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
