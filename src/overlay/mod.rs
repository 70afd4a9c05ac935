//! The translucent input-intercepting layer above the embedded page.

pub mod input;
pub mod render;

use crate::backend::NativeWindowHandle;
use crate::geometry::{Point, Size};
use input::{HitAction, HitRegion, OverlayInputState, OverlayState, PointerInput, PointerOutcome};
use render::{render_overlay, OverlayStyle, RgbaBuffer};

#[derive(Debug)]
pub struct OverlaySurface {
    window: NativeWindowHandle,
    origin: Point,
    size: Size,
    input: OverlayInputState,
    style: OverlayStyle,
    dirty: bool,
}

impl OverlaySurface {
    /// `size` is fixed for the lifetime of the surface.
    pub fn new(
        window: NativeWindowHandle,
        origin: Point,
        size: Size,
        regions: Vec<HitRegion>,
        style: OverlayStyle,
    ) -> Self {
        Self {
            window,
            origin,
            size,
            input: OverlayInputState::new(regions),
            style,
            dirty: true,
        }
    }

    pub fn window(&self) -> NativeWindowHandle {
        self.window
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn state(&self) -> OverlayState {
        self.input.state()
    }

    pub fn hovered(&self) -> Option<HitAction> {
        self.input.hovered()
    }

    pub fn input(&self) -> &OverlayInputState {
        &self.input
    }

    pub(crate) fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn handle_pointer(&mut self, input: PointerInput, host_origin: Point) -> PointerOutcome {
        let outcome = self.input.handle(input, host_origin);
        if outcome.repaint {
            self.dirty = true;
        }
        outcome
    }

    pub fn render(&self) -> RgbaBuffer {
        render_overlay(self.size, self.input.regions(), self.input.hovered(), self.style)
    }

    /// Returns whether a repaint was pending and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
