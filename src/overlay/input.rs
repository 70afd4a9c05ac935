use crate::geometry::{offset, Point, Rect};

/// Pointer input as delivered to the overlay window.
///
/// `local` is relative to the overlay's top-left corner, `global` is in screen
/// coordinates. Both are sampled when the OS produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInput {
    Moved {
        local: Point,
        global: Point,
        left_held: bool,
    },
    LeftPressed {
        local: Point,
        global: Point,
    },
    LeftReleased {
        local: Point,
        global: Point,
    },
    /// The overlay lost mouse capture without seeing a release.
    CaptureLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAction {
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRegion {
    pub rect: Rect,
    pub action: HitAction,
}

impl HitRegion {
    pub const fn close(rect: Rect) -> Self {
        Self {
            rect,
            action: HitAction::Close,
        }
    }
}

/// Pointer offset from the host's top-left corner when the drag began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub anchor_offset: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    Hover,
    Dragging,
}

/// What the host has to do after a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerOutcome {
    pub move_host_to: Option<Point>,
    pub close: bool,
    pub repaint: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayInputState {
    regions: Vec<HitRegion>,
    hovered: Option<HitAction>,
    drag: Option<DragSession>,
    close_raised: bool,
}

impl OverlayInputState {
    pub fn new(regions: Vec<HitRegion>) -> Self {
        Self {
            regions,
            hovered: None,
            drag: None,
            close_raised: false,
        }
    }

    pub fn regions(&self) -> &[HitRegion] {
        &self.regions
    }

    pub fn state(&self) -> OverlayState {
        if self.drag.is_some() {
            OverlayState::Dragging
        } else if self.hovered.is_some() {
            OverlayState::Hover
        } else {
            OverlayState::Idle
        }
    }

    pub fn hovered(&self) -> Option<HitAction> {
        self.hovered
    }

    pub fn drag_session(&self) -> Option<DragSession> {
        self.drag
    }

    pub fn close_raised(&self) -> bool {
        self.close_raised
    }

    pub fn hit_test(&self, local: Point) -> Option<HitAction> {
        self.regions
            .iter()
            .find(|region| region.rect.contains(local))
            .map(|region| region.action)
    }

    pub fn handle(&mut self, input: PointerInput, host_origin: Point) -> PointerOutcome {
        let mut outcome = PointerOutcome::default();
        match input {
            PointerInput::Moved {
                local,
                global,
                left_held,
            } => {
                outcome.repaint = self.set_hovered(self.hit_test(local));
                // Only a release or capture loss ends the session.
                if let (Some(drag), true) = (self.drag, left_held) {
                    outcome.move_host_to = Some(offset(global, drag.anchor_offset));
                }
            }
            PointerInput::LeftPressed { local, global } => match self.hit_test(local) {
                Some(HitAction::Close) => {
                    self.drag = None;
                    outcome.repaint = self.set_hovered(None);
                    if self.close_raised {
                        tracing::debug!("close already raised; ignoring press");
                    } else {
                        self.close_raised = true;
                        outcome.close = true;
                    }
                }
                None => {
                    let anchor_offset = offset(global, host_origin);
                    tracing::debug!(?anchor_offset, "drag started");
                    self.drag = Some(DragSession { anchor_offset });
                    outcome.repaint = self.set_hovered(None);
                }
            },
            PointerInput::LeftReleased { local, .. } => {
                if self.drag.take().is_some() {
                    tracing::debug!("drag released");
                }
                outcome.repaint = self.set_hovered(self.hit_test(local));
            }
            PointerInput::CaptureLost => {
                self.drag = None;
            }
        }
        outcome
    }

    fn set_hovered(&mut self, hovered: Option<HitAction>) -> bool {
        let changed = self.hovered != hovered;
        self.hovered = hovered;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: Point = (100, 100);

    fn input_state() -> OverlayInputState {
        OverlayInputState::new(vec![HitRegion::close(Rect::new(249, 0, 45, 29))])
    }

    fn moved(local: Point, left_held: bool) -> PointerInput {
        PointerInput::Moved {
            local,
            global: (HOST.0 + local.0, HOST.1 + local.1),
            left_held,
        }
    }

    fn pressed(local: Point) -> PointerInput {
        PointerInput::LeftPressed {
            local,
            global: (HOST.0 + local.0, HOST.1 + local.1),
        }
    }

    fn released(local: Point) -> PointerInput {
        PointerInput::LeftReleased {
            local,
            global: (HOST.0 + local.0, HOST.1 + local.1),
        }
    }

    #[test]
    fn hover_follows_the_close_region() {
        let mut state = input_state();
        assert_eq!(state.state(), OverlayState::Idle);

        let outcome = state.handle(moved((260, 10), false), HOST);
        assert!(outcome.repaint);
        assert_eq!(state.state(), OverlayState::Hover);
        assert_eq!(state.hovered(), Some(HitAction::Close));

        let outcome = state.handle(moved((261, 11), false), HOST);
        assert!(!outcome.repaint, "no repaint while hover tag is unchanged");

        let outcome = state.handle(moved((10, 10), false), HOST);
        assert!(outcome.repaint);
        assert_eq!(state.state(), OverlayState::Idle);
    }

    #[test]
    fn press_inside_close_region_closes_without_dragging() {
        let mut state = input_state();
        state.handle(moved((260, 10), false), HOST);
        let outcome = state.handle(pressed((260, 10)), HOST);
        assert!(outcome.close);
        assert_eq!(outcome.move_host_to, None);
        assert_eq!(state.drag_session(), None);
        assert_eq!(state.hovered(), None);
    }

    #[test]
    fn close_is_raised_once() {
        let mut state = input_state();
        let closes = (0..3)
            .map(|_| {
                let outcome = state.handle(pressed((260, 10)), HOST);
                state.handle(released((260, 10)), HOST);
                outcome.close
            })
            .filter(|close| *close)
            .count();
        assert_eq!(closes, 1);
        assert!(state.close_raised());
    }

    #[test]
    fn drag_translates_host_by_pointer_delta() {
        let mut state = input_state();
        state.handle(pressed((10, 10)), HOST);
        assert_eq!(state.state(), OverlayState::Dragging);
        assert_eq!(
            state.drag_session(),
            Some(DragSession {
                anchor_offset: (10, 10)
            })
        );

        let outcome = state.handle(
            PointerInput::Moved {
                local: (10, 10),
                global: (120, 125),
                left_held: true,
            },
            HOST,
        );
        assert_eq!(outcome.move_host_to, Some((110, 115)));

        state.handle(released((10, 10)), (110, 115));
        assert_eq!(state.state(), OverlayState::Idle);
        assert_eq!(state.drag_session(), None);
    }

    #[test]
    fn moves_without_a_session_never_move_the_host() {
        let mut state = input_state();
        let outcome = state.handle(moved((50, 50), true), HOST);
        assert_eq!(outcome.move_host_to, None);
    }

    #[test]
    fn move_without_held_button_keeps_the_session() {
        let mut state = input_state();
        state.handle(pressed((10, 10)), HOST);
        let outcome = state.handle(moved((30, 30), false), HOST);
        assert_eq!(outcome.move_host_to, None);
        assert_eq!(
            state.drag_session(),
            Some(DragSession {
                anchor_offset: (10, 10)
            })
        );

        let outcome = state.handle(moved((40, 45), true), HOST);
        assert_eq!(outcome.move_host_to, Some((130, 135)));
    }

    #[test]
    fn capture_loss_ends_the_drag() {
        let mut state = input_state();
        state.handle(pressed((10, 10)), HOST);
        state.handle(PointerInput::CaptureLost, HOST);
        assert_eq!(state.state(), OverlayState::Idle);
    }
}
