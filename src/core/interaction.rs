use glam::Vec2;

use super::gesture::{GestureMode, WheelAction};
use crate::types::{PlaneId, Scene};

/// The one pointer session that may be open at a time
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    Idle,
    PanningCamera {
        start_pointer: Vec2,
        start_pan: Vec2,
    },
    RotatingObject {
        target: PlaneId,
        start_x: f32,
        initial_rotation_y: f32,
    },
    TranslatingObjectZ {
        target: PlaneId,
        start_y: f32,
        initial_z: f32,
    },
    TranslatingObjectXY {
        target: PlaneId,
        /// Pointer minus plane XY at pointer-down
        grab_offset: Vec2,
    },
}

impl Session {
    pub fn is_idle(&self) -> bool {
        matches!(self, Session::Idle)
    }

    /// Plane being manipulated, if any
    pub fn target(&self) -> Option<&PlaneId> {
        match self {
            Session::RotatingObject { target, .. }
            | Session::TranslatingObjectZ { target, .. }
            | Session::TranslatingObjectXY { target, .. } => Some(target),
            Session::Idle | Session::PanningCamera { .. } => None,
        }
    }
}

/// Why the store is being asked to save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReason {
    SessionEnded,
    Wheel,
}

/// Result of feeding one event to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub redraw: bool,
    pub commit: Option<CommitReason>,
}

impl Outcome {
    const NOTHING: Outcome = Outcome {
        redraw: false,
        commit: None,
    };

    fn redraw() -> Self {
        Outcome {
            redraw: true,
            commit: None,
        }
    }
}

/// Owns the active session and applies pointer deltas to the scene
///
/// Every move writes the live value straight into the scene; pointer-up only
/// closes the session and asks for one commit.
#[derive(Debug, Clone)]
pub struct InteractionMachine {
    session: Session,
    /// The open session changed a plane position
    moved: bool,
    zoom_step: f32,
    scale_step: f32,
}

impl InteractionMachine {
    pub fn new(zoom_step: f32, scale_step: f32) -> Self {
        Self {
            session: Session::Idle,
            moved: false,
            zoom_step,
            scale_step,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        !self.session.is_idle()
    }

    /// Open a session; only possible from `Idle`
    ///
    /// Returns false without touching anything when a session is already open
    /// or the target plane is not in the scene.
    pub fn begin(&mut self, mode: GestureMode, pointer: Vec2, scene: &Scene) -> bool {
        if self.is_active() {
            log::debug!("pointer-down ignored, session already open: {:?}", self.session);
            return false;
        }

        let session = match mode {
            GestureMode::CameraPan => Session::PanningCamera {
                start_pointer: pointer,
                start_pan: scene.camera().pan(),
            },
            GestureMode::RotateY(target) => {
                let Some(plane) = resolve(scene, &target) else {
                    return false;
                };
                Session::RotatingObject {
                    start_x: pointer.x,
                    initial_rotation_y: plane.rotation().y,
                    target,
                }
            }
            GestureMode::TranslateZ(target) => {
                let Some(plane) = resolve(scene, &target) else {
                    return false;
                };
                Session::TranslatingObjectZ {
                    start_y: pointer.y,
                    initial_z: plane.position.z,
                    target,
                }
            }
            GestureMode::TranslateXY(target) => {
                let Some(plane) = resolve(scene, &target) else {
                    return false;
                };
                Session::TranslatingObjectXY {
                    grab_offset: pointer - plane.position.xy(),
                    target,
                }
            }
        };

        log::debug!("session started: {session:?}");
        self.session = session;
        self.moved = false;
        true
    }

    /// Apply the pointer position to the open session
    pub fn pointer_move(&mut self, pointer: Vec2, scene: &mut Scene) -> Outcome {
        let session = self.session.clone();
        match &session {
            Session::Idle => Outcome::NOTHING,
            Session::PanningCamera { start_pointer, start_pan } => {
                let pan = *start_pan - (pointer - *start_pointer);
                let camera = scene.camera_mut();
                if camera.pan() == pan {
                    return Outcome::NOTHING;
                }
                camera.set_pan(pan);
                Outcome::redraw()
            }
            Session::RotatingObject {
                target,
                start_x,
                initial_rotation_y,
            } => {
                let Some(plane) = scene.object_mut(target) else {
                    return self.abandon();
                };
                let before = plane.rotation().y;
                let after = plane.set_rotation_y(*initial_rotation_y + (pointer.x - *start_x));
                changed(before != after)
            }
            Session::TranslatingObjectZ {
                target,
                start_y,
                initial_z,
            } => {
                let Some(plane) = scene.object_mut(target) else {
                    return self.abandon();
                };
                let z = *initial_z + (pointer.y - *start_y);
                if plane.position.z == z {
                    return Outcome::NOTHING;
                }
                plane.position.z = z;
                self.moved = true;
                Outcome::redraw()
            }
            Session::TranslatingObjectXY { target, grab_offset } => {
                let Some(plane) = scene.object_mut(target) else {
                    return self.abandon();
                };
                let xy = pointer - *grab_offset;
                if plane.position.xy() == xy {
                    return Outcome::NOTHING;
                }
                plane.position.x = xy.x;
                plane.position.y = xy.y;
                self.moved = true;
                Outcome::redraw()
            }
        }
    }

    /// Close the session; the live values already sit in the scene
    pub fn pointer_up(&mut self, scene: &mut Scene) -> Outcome {
        self.finish(scene)
    }

    /// End whatever session is open and request its commit
    pub fn finish(&mut self, scene: &mut Scene) -> Outcome {
        let session = std::mem::take(&mut self.session);
        if session.is_idle() {
            return Outcome::NOTHING;
        }

        if self.moved {
            if let Some(plane) = session.target().and_then(|id| scene.object_mut(id)) {
                plane.mark_moved();
            }
        }
        self.moved = false;

        log::debug!("session ended: {session:?}");
        Outcome {
            redraw: false,
            commit: Some(CommitReason::SessionEnded),
        }
    }

    /// Apply one wheel tick; every applied tick commits, even one pinned at a limit
    ///
    /// `delta_y < 0` grows (zoom in, scale up), `delta_y > 0` shrinks.
    pub fn wheel(&mut self, action: WheelAction, delta_y: f32, scene: &mut Scene) -> Outcome {
        if self.is_active() || delta_y == 0.0 || delta_y.is_nan() {
            return Outcome::NOTHING;
        }
        let direction = if delta_y < 0.0 { 1.0 } else { -1.0 };

        let effective = match action {
            WheelAction::CameraZoom => {
                let camera = scene.camera_mut();
                let before = camera.zoom();
                before != camera.set_zoom(before + direction * self.zoom_step)
            }
            WheelAction::ObjectScale(target) => {
                let Some(plane) = resolve_mut(scene, &target) else {
                    return Outcome::NOTHING;
                };
                let before = plane.scale();
                before != plane.set_scale(before + direction * self.scale_step)
            }
        };

        Outcome {
            redraw: effective,
            commit: Some(CommitReason::Wheel),
        }
    }

    // Target disappeared mid-session; drop the session without a commit
    fn abandon(&mut self) -> Outcome {
        log::warn!("session target vanished, abandoning {:?}", self.session);
        self.session = Session::Idle;
        self.moved = false;
        Outcome::NOTHING
    }
}

fn changed(did_change: bool) -> Outcome {
    if did_change {
        Outcome::redraw()
    } else {
        Outcome::NOTHING
    }
}

fn resolve<'a>(scene: &'a Scene, id: &PlaneId) -> Option<&'a crate::types::ObjectPlane> {
    let plane = scene.object(id);
    if plane.is_none() {
        log::warn!("pointer target {id} is not a plane of scene {}", scene.id());
    }
    plane
}

fn resolve_mut<'a>(scene: &'a mut Scene, id: &PlaneId) -> Option<&'a mut crate::types::ObjectPlane> {
    if scene.object(id).is_none() {
        log::warn!("wheel target {id} is not a plane of scene {}", scene.id());
        return None;
    }
    scene.object_mut(id)
}
