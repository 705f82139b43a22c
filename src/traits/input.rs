use glam::Vec2;
use std::time::Instant;

use crate::types::PlaneId;

/// Pointer button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other,
}

/// Modifier keys held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self::new(false, false);
    pub const SHIFT: Self = Self::new(true, false);
    pub const ALT: Self = Self::new(false, true);

    pub const fn new(shift: bool, alt: bool) -> Self {
        Self { shift, alt }
    }
}

/// What a pointer event landed on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The scene canvas itself, not any plane
    Canvas,
    Plane(PlaneId),
}

/// Pointer-down with everything the classifier needs
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDown {
    pub target: Target,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    pub position: Vec2,
}

impl PointerDown {
    /// Primary-button press with no modifiers
    pub fn primary(target: Target, position: Vec2) -> Self {
        Self {
            target,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            position,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Raw pointer input, in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down(PointerDown),
    Move { position: Vec2 },
    Up { position: Vec2 },
    /// `delta_y < 0` scrolls up, `delta_y > 0` scrolls down
    Wheel { target: Target, delta_y: f32 },
    /// Pointer started hovering a target
    Enter { target: Target, position: Vec2 },
    Leave { target: Target },
    /// Press and release on the same target
    Click { target: Target, position: Vec2, at: Instant },
}

/// What handling one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    /// Visual state changed; the scene should be redrawn
    pub redraw: bool,
    /// A commit was issued to the scene store
    pub committed: bool,
}

impl Response {
    pub fn merge(self, other: Response) -> Response {
        Response {
            redraw: self.redraw || other.redraw,
            committed: self.committed || other.committed,
        }
    }
}

/// Anything that consumes pointer input
pub trait PointerSink {
    fn handle_pointer(&mut self, event: PointerEvent) -> Response;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_constants() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
        assert!(Modifiers::SHIFT.shift && !Modifiers::SHIFT.alt);
        assert!(Modifiers::ALT.alt && !Modifiers::ALT.shift);
    }

    #[test]
    fn response_merge_is_or() {
        let a = Response { redraw: true, committed: false };
        let b = Response { redraw: false, committed: true };
        assert_eq!(a.merge(b), Response { redraw: true, committed: true });
        assert_eq!(Response::default().merge(Response::default()), Response::default());
    }

    // Mock sink recording what it was given
    struct Recorder {
        events: Vec<PointerEvent>,
    }

    impl PointerSink for Recorder {
        fn handle_pointer(&mut self, event: PointerEvent) -> Response {
            self.events.push(event);
            Response { redraw: true, committed: false }
        }
    }

    #[test]
    fn sink_receives_events() {
        let mut sink = Recorder { events: Vec::new() };
        let down = PointerDown::primary(Target::Canvas, Vec2::new(1.0, 2.0))
            .with_modifiers(Modifiers::SHIFT);
        let response = sink.handle_pointer(PointerEvent::Down(down.clone()));
        assert!(response.redraw);
        assert_eq!(sink.events, vec![PointerEvent::Down(down)]);
    }
}
