use glam::Vec2;
use std::time::Instant;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::ModifiersState;

use crate::traits::{Modifiers, PointerButton, PointerDown, PointerEvent, Target};

/// Pixels per scroll line when the platform reports line deltas
const LINE_HEIGHT: f32 = 100.0;

/// Adapter that turns winit window events into editor pointer events
#[derive(Debug, Clone, Default)]
pub struct WinitPointer {
    /// Current cursor position (relative to window)
    cursor: Option<Vec2>,
    modifiers: Modifiers,
    /// Target under the cursor at the last move
    hovered: Option<Target>,
    /// Target the primary press started on, for click detection
    pressed: Option<(PointerButton, Target)>,
}

impl WinitPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Translate one window event; `hit_test` resolves canvas positions
    pub fn process_event(&mut self, event: &WindowEvent, hit_test: impl Fn(Vec2) -> Target) -> Vec<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32), hit_test)
            }
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = Self::map_modifiers(modifiers.state());
                Vec::new()
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.button(*state, Self::map_button(*button), hit_test)
            }
            WindowEvent::MouseWheel { delta, .. } => self.wheel(Self::dom_delta_y(*delta), hit_test),
            _ => Vec::new(),
        }
    }

    fn cursor_moved(&mut self, position: Vec2, hit_test: impl Fn(Vec2) -> Target) -> Vec<PointerEvent> {
        self.cursor = Some(position);
        let target = hit_test(position);
        let mut events = Vec::new();

        if self.hovered.as_ref() != Some(&target) {
            if let Some(previous) = self.hovered.take() {
                events.push(PointerEvent::Leave { target: previous });
            }
            events.push(PointerEvent::Enter {
                target: target.clone(),
                position,
            });
            self.hovered = Some(target);
        }

        events.push(PointerEvent::Move { position });
        events
    }

    fn cursor_left(&mut self) -> Vec<PointerEvent> {
        self.hovered
            .take()
            .map(|target| vec![PointerEvent::Leave { target }])
            .unwrap_or_default()
    }

    fn button(&mut self, state: ElementState, button: PointerButton, hit_test: impl Fn(Vec2) -> Target) -> Vec<PointerEvent> {
        // No cursor yet means no position to attach; drop the press
        let Some(position) = self.cursor else {
            return Vec::new();
        };
        let target = hit_test(position);

        match state {
            ElementState::Pressed => {
                self.pressed = Some((button, target.clone()));
                vec![PointerEvent::Down(PointerDown {
                    target,
                    button,
                    modifiers: self.modifiers,
                    position,
                })]
            }
            ElementState::Released => {
                let mut events = vec![PointerEvent::Up { position }];
                if let Some((pressed_button, pressed_target)) = self.pressed.take() {
                    if pressed_button == button && pressed_target == target {
                        events.push(PointerEvent::Click {
                            target,
                            position,
                            at: Instant::now(),
                        });
                    }
                }
                events
            }
        }
    }

    fn wheel(&mut self, delta_y: f32, hit_test: impl Fn(Vec2) -> Target) -> Vec<PointerEvent> {
        let target = self.cursor.map(hit_test).unwrap_or(Target::Canvas);
        vec![PointerEvent::Wheel { target, delta_y }]
    }

    /// Map winit mouse button to pointer button
    pub fn map_button(button: MouseButton) -> PointerButton {
        match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            MouseButton::Middle => PointerButton::Middle,
            _ => PointerButton::Other,
        }
    }

    pub fn map_modifiers(state: ModifiersState) -> Modifiers {
        Modifiers::new(state.shift_key(), state.alt_key())
    }

    /// winit scrolls positive away from the user; DOM-style deltaY is the opposite
    pub fn dom_delta_y(delta: MouseScrollDelta) -> f32 {
        match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
            MouseScrollDelta::PixelDelta(position) => -(position.y as f32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaneId;
    use winit::dpi::PhysicalPosition;

    // Plane occupies x in [0, 100), canvas elsewhere
    fn hit(position: Vec2) -> Target {
        if position.x >= 0.0 && position.x < 100.0 {
            Target::Plane(PlaneId::from("p"))
        } else {
            Target::Canvas
        }
    }

    #[test]
    fn button_mapping() {
        assert_eq!(WinitPointer::map_button(MouseButton::Left), PointerButton::Primary);
        assert_eq!(WinitPointer::map_button(MouseButton::Right), PointerButton::Secondary);
        assert_eq!(WinitPointer::map_button(MouseButton::Middle), PointerButton::Middle);
        assert_eq!(WinitPointer::map_button(MouseButton::Other(7)), PointerButton::Other);
    }

    #[test]
    fn modifier_mapping() {
        assert_eq!(WinitPointer::map_modifiers(ModifiersState::SHIFT), Modifiers::SHIFT);
        assert_eq!(WinitPointer::map_modifiers(ModifiersState::ALT), Modifiers::ALT);
        assert_eq!(WinitPointer::map_modifiers(ModifiersState::CONTROL), Modifiers::NONE);
    }

    #[test]
    fn scroll_up_is_negative_delta() {
        assert!(WinitPointer::dom_delta_y(MouseScrollDelta::LineDelta(0.0, 1.0)) < 0.0);
        assert!(WinitPointer::dom_delta_y(MouseScrollDelta::LineDelta(0.0, -1.0)) > 0.0);
        assert_eq!(
            WinitPointer::dom_delta_y(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -12.0))),
            12.0
        );
    }

    #[test]
    fn hover_transitions_emit_enter_and_leave() {
        let mut pointer = WinitPointer::new();
        let events = pointer.cursor_moved(Vec2::new(10.0, 10.0), hit);
        assert!(matches!(events[0], PointerEvent::Enter { target: Target::Plane(_), .. }));
        assert!(matches!(events[1], PointerEvent::Move { .. }));

        // Same target: only a move
        assert_eq!(pointer.cursor_moved(Vec2::new(20.0, 10.0), hit).len(), 1);

        let events = pointer.cursor_moved(Vec2::new(200.0, 10.0), hit);
        assert!(matches!(events[0], PointerEvent::Leave { target: Target::Plane(_) }));
        assert!(matches!(events[1], PointerEvent::Enter { target: Target::Canvas, .. }));
    }

    #[test]
    fn press_and_release_on_same_target_clicks() {
        let mut pointer = WinitPointer::new();
        pointer.cursor_moved(Vec2::new(10.0, 10.0), hit);
        pointer.modifiers = Modifiers::SHIFT;

        let down = pointer.button(ElementState::Pressed, PointerButton::Primary, hit);
        match &down[0] {
            PointerEvent::Down(d) => assert_eq!(d.modifiers, Modifiers::SHIFT),
            other => panic!("expected down, got {other:?}"),
        }

        let up = pointer.button(ElementState::Released, PointerButton::Primary, hit);
        assert_eq!(up.len(), 2);
        assert!(matches!(up[1], PointerEvent::Click { .. }));
    }

    #[test]
    fn release_elsewhere_does_not_click() {
        let mut pointer = WinitPointer::new();
        pointer.cursor_moved(Vec2::new(10.0, 10.0), hit);
        pointer.button(ElementState::Pressed, PointerButton::Primary, hit);
        pointer.cursor_moved(Vec2::new(300.0, 10.0), hit);
        let up = pointer.button(ElementState::Released, PointerButton::Primary, hit);
        assert_eq!(up, vec![PointerEvent::Up { position: Vec2::new(300.0, 10.0) }]);
    }

    #[test]
    fn press_before_any_cursor_is_dropped() {
        let mut pointer = WinitPointer::new();
        assert!(pointer.button(ElementState::Pressed, PointerButton::Primary, hit).is_empty());
        assert_eq!(
            pointer.wheel(-1.0, hit),
            vec![PointerEvent::Wheel { target: Target::Canvas, delta_y: -1.0 }]
        );
    }
}
