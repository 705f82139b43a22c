use crate::traits::{PointerButton, PointerDown, Target};
use crate::types::PlaneId;

/// Session-starting gesture picked on pointer-down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureMode {
    CameraPan,
    RotateY(PlaneId),
    TranslateZ(PlaneId),
    TranslateXY(PlaneId),
}

/// Instantaneous wheel gesture; never opens a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WheelAction {
    CameraZoom,
    ObjectScale(PlaneId),
}

/// Editor state the classifier needs to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureContext {
    /// Object editing disabled, tooltips shown instead
    pub navigation: bool,
    /// A pointer session is already open
    pub session_active: bool,
}

/// Decide which session a pointer-down starts, if any
///
/// Rules in priority order:
/// canvas + primary + no modifiers pans the camera;
/// plane + Shift rotates about Y; plane + Alt translates along Z;
/// plane + no modifiers translates in XY; plane + Shift + Alt is inert.
/// Navigation mode leaves only the canvas rule.
pub fn classify_pointer_down(down: &PointerDown, ctx: GestureContext) -> Option<GestureMode> {
    if ctx.session_active || down.button != PointerButton::Primary {
        return None;
    }

    let shift = down.modifiers.shift;
    let alt = down.modifiers.alt;

    match &down.target {
        Target::Canvas if !shift && !alt => Some(GestureMode::CameraPan),
        Target::Canvas => None,
        Target::Plane(_) if ctx.navigation => None,
        Target::Plane(id) => match (shift, alt) {
            (true, false) => Some(GestureMode::RotateY(id.clone())),
            (false, true) => Some(GestureMode::TranslateZ(id.clone())),
            (false, false) => Some(GestureMode::TranslateXY(id.clone())),
            (true, true) => None,
        },
    }
}

/// Decide what a wheel tick over `target` does
pub fn classify_wheel(target: &Target, ctx: GestureContext) -> Option<WheelAction> {
    if ctx.session_active {
        return None;
    }
    match target {
        Target::Canvas => Some(WheelAction::CameraZoom),
        Target::Plane(_) if ctx.navigation => None,
        Target::Plane(id) => Some(WheelAction::ObjectScale(id.clone())),
    }
}
