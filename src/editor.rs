use futures::FutureExt;
use glam::Vec2;
use std::collections::VecDeque;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::config::EditorConfig;
use crate::core::{
    classify_pointer_down, classify_wheel, CommitReason, Debounce, GestureContext, InteractionMachine, Outcome,
    Session, Tooltip, TooltipPresenter,
};
use crate::describe::{apply_descriptions, describe_batch, BatchReport};
use crate::placement::place_new_plane;
use crate::renderer::{RenderFrame, SceneRenderer, ViewMode};
use crate::prompt::submit_query;
use crate::traits::{
    DescriptionService, PointerEvent, PointerSink, QueryError, QueryService, Response, SaveFuture, SceneStore,
    StoreResult, Target,
};
use crate::types::{ImagePayload, ObjectPlane, PlaneId, Scene, SceneId};

/// Something the user should be told about, queued for the front end
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A commit did not reach the store; the change is kept in memory
    PersistenceFailed { scene: SceneId, message: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::PersistenceFailed { scene, message } => {
                write!(f, "Could not save scene {scene}: {message}. Changes are kept until the next save.")
            }
        }
    }
}

/// One open scene plus everything needed to edit it
///
/// The editor is the only writer of its scene. Pointer input goes through
/// [`PointerSink::handle_pointer`]; every commit issues a whole-scene `save`
/// on the store without waiting for it. Issued saves queue up in order and
/// are driven by [`Editor::poll_saves`] or [`Editor::drain_saves`]; saves
/// still queued when the editor is dropped are lost.
pub struct Editor<S: SceneStore> {
    scene: Scene,
    store: S,
    config: EditorConfig,
    machine: InteractionMachine,
    renderer: SceneRenderer,
    tooltip: TooltipPresenter,
    navigation: bool,
    /// Present only when wheel commits are debounced
    wheel_debounce: Option<Debounce>,
    /// Wheel changes waiting for the debounce to fire
    wheel_pending: bool,
    /// Issued saves with their commit number, oldest first
    saves: VecDeque<(usize, SaveFuture)>,
    /// Commit number of the newest save the store accepted
    saved: usize,
    notices: Vec<Notice>,
    needs_redraw: bool,
    commits: usize,
}

impl<S: SceneStore> Editor<S> {
    pub fn new(scene: Scene, store: S, config: EditorConfig) -> Self {
        Self {
            machine: InteractionMachine::new(config.zoom_step, config.scale_step),
            renderer: SceneRenderer::new(Vec2::from_array(config.plane_extent)),
            tooltip: TooltipPresenter::new(config.double_tap_window(), config.tooltip_offset),
            wheel_debounce: config.wheel_delay().map(Debounce::new),
            scene,
            store,
            config,
            navigation: false,
            wheel_pending: false,
            saves: VecDeque::new(),
            saved: 0,
            notices: Vec::new(),
            needs_redraw: true,
            commits: 0,
        }
    }

    /// Load a stored scene for editing
    pub fn open(store: S, id: &SceneId, config: EditorConfig) -> StoreResult<Self> {
        let scene = store.load(id)?;
        log::info!("opened scene {} from {}", scene.id(), store.name());
        Ok(Self::new(scene, store, config))
    }

    /// Start a new empty scene and persist it right away
    pub fn create(name: impl Into<String>, store: S, config: EditorConfig) -> Self {
        let mut editor = Self::new(Scene::new(name), store, config);
        log::info!("created scene {} \"{}\"", editor.scene.id(), editor.scene.name);
        editor.commit();
        editor
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Scene, S) {
        (self.scene, self.store)
    }

    pub fn session(&self) -> &Session {
        self.machine.session()
    }

    pub fn is_navigation_mode(&self) -> bool {
        self.navigation
    }

    pub fn view_mode(&self) -> ViewMode {
        if self.navigation {
            ViewMode::Navigation
        } else {
            ViewMode::Edit
        }
    }

    pub fn toggle_navigation_mode(&mut self) -> Response {
        self.set_navigation_mode(!self.navigation)
    }

    /// Switch modes; an open session is ended and committed first
    pub fn set_navigation_mode(&mut self, on: bool) -> Response {
        if self.navigation == on {
            return Response::default();
        }
        let outcome = self.machine.finish(&mut self.scene);
        let response = self.apply(outcome);

        self.navigation = on;
        self.tooltip.reset();
        self.needs_redraw = true;
        log::debug!("navigation mode {}", if on { "on" } else { "off" });
        response.merge(Response {
            redraw: true,
            committed: false,
        })
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.current()
    }

    /// Full draw list for the current state
    pub fn frame(&self) -> RenderFrame {
        self.renderer.render(&self.scene, self.view_mode(), self.tooltip.current())
    }

    /// True once per batch of visual changes
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn hit_test(&self, point: Vec2) -> Target {
        self.renderer.hit_test(&self.scene, point)
    }

    /// Wrap imported bytes in a new plane, place it, and commit
    pub fn import_image(&mut self, payload: ImagePayload) -> PlaneId {
        let id = place_new_plane(&mut self.scene, ObjectPlane::new(payload), self.config.placement);
        log::info!("imported plane {id} into scene {}", self.scene.id());
        self.needs_redraw = true;
        self.commit();
        id
    }

    /// User edit of a description; trimmed, committed only when it changed
    pub fn set_description(&mut self, id: &PlaneId, text: &str) -> bool {
        let text = text.trim();
        let Some(plane) = self.scene.object_mut(id) else {
            log::warn!("set_description: plane {id} is not in scene {}", self.scene.id());
            return false;
        };
        if plane.description == text {
            return false;
        }
        plane.description = text.to_string();
        self.needs_redraw = true;
        self.commit();
        true
    }

    /// Run the description service over `ids` and commit the results
    pub async fn describe(&mut self, ids: &[PlaneId], service: &dyn DescriptionService) -> BatchReport {
        let results = describe_batch(&self.scene, ids, service).await;
        let report = apply_descriptions(&mut self.scene, ids, results);
        log::info!("describe batch on scene {}: {}", self.scene.id(), report.summary());
        self.needs_redraw = true;
        self.commit();
        report
    }

    pub async fn describe_all(&mut self, service: &dyn DescriptionService) -> BatchReport {
        let ids: Vec<PlaneId> = self.scene.objects().iter().map(|plane| plane.id().clone()).collect();
        self.describe(&ids, service).await
    }

    /// Ask the query service about the scene
    ///
    /// Read-only: the answer is returned, nothing is committed.
    pub async fn ask(&self, query: &str, service: &dyn QueryService) -> Result<String, QueryError> {
        submit_query(&self.scene, query, service).await
    }

    /// Fire a pending debounced commit whose delay has passed
    pub fn tick(&mut self, now: Instant) -> Response {
        let fired = self.wheel_debounce.as_mut().is_some_and(|debounce| debounce.fire(now));
        if fired && self.wheel_pending {
            self.commit();
            return Response {
                redraw: false,
                committed: true,
            };
        }
        Response::default()
    }

    /// Commit now if the store is behind and no save is in flight
    pub fn flush(&mut self) -> bool {
        if self.is_dirty() && self.saves.is_empty() {
            self.commit();
            true
        } else {
            false
        }
    }

    /// The scene holds changes the store has not accepted yet
    pub fn is_dirty(&self) -> bool {
        self.wheel_pending || self.saved < self.commits
    }

    /// Saves issued but not yet resolved
    pub fn pending_saves(&self) -> usize {
        self.saves.len()
    }

    /// Drive queued saves without blocking, in issue order
    ///
    /// Stops at the first save still in flight. Returns how many resolved.
    pub fn poll_saves(&mut self) -> usize {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut resolved = 0;
        loop {
            let Some((commit, save)) = self.saves.front_mut() else {
                break;
            };
            let commit = *commit;
            let Poll::Ready(result) = save.poll_unpin(&mut cx) else {
                break;
            };
            self.saves.pop_front();
            self.save_resolved(commit, result);
            resolved += 1;
        }
        resolved
    }

    /// Wait for every queued save, in issue order
    pub async fn drain_saves(&mut self) {
        while let Some((commit, save)) = self.saves.pop_front() {
            let result = save.await;
            self.save_resolved(commit, result);
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Commits issued so far, successful or not
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    fn context(&self) -> GestureContext {
        GestureContext {
            navigation: self.navigation,
            session_active: self.machine.is_active(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Response {
        if outcome.redraw {
            self.needs_redraw = true;
        }
        let committed = match outcome.commit {
            Some(CommitReason::Wheel) if self.wheel_debounce.is_some() => {
                if let Some(debounce) = self.wheel_debounce.as_mut() {
                    debounce.arm(Instant::now());
                }
                self.wheel_pending = true;
                false
            }
            Some(_) => {
                self.commit();
                true
            }
            None => false,
        };
        Response {
            redraw: outcome.redraw,
            committed,
        }
    }

    // Issue a save of the whole scene; never waits for the store
    fn commit(&mut self) {
        if let Some(debounce) = self.wheel_debounce.as_mut() {
            debounce.cancel();
        }
        self.wheel_pending = false;
        self.commits += 1;

        let save = self.store.save(&self.scene);
        self.saves.push_back((self.commits, save));
        log::debug!("issued commit {} of scene {} to {}", self.commits, self.scene.id(), self.store.name());
    }

    fn save_resolved(&mut self, commit: usize, result: StoreResult<()>) {
        match result {
            Ok(()) => {
                self.saved = self.saved.max(commit);
                log::info!("committed scene {} to {}", self.scene.id(), self.store.name());
            }
            Err(e) => {
                log::error!("failed to save scene {}: {e}", self.scene.id());
                self.notices.push(Notice::PersistenceFailed {
                    scene: self.scene.id().clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn show_tooltip(&mut self, id: &PlaneId, position: Vec2) -> bool {
        let text = self.scene.object(id).map(|plane| plane.description.clone()).unwrap_or_default();
        self.tooltip.show(id, &text, position)
    }

    fn tap_tooltip(&mut self, id: &PlaneId, position: Vec2, at: Instant) -> bool {
        let text = self.scene.object(id).map(|plane| plane.description.clone()).unwrap_or_default();
        self.tooltip.tap(id, &text, position, at)
    }
}

impl<S: SceneStore> PointerSink for Editor<S> {
    fn handle_pointer(&mut self, event: PointerEvent) -> Response {
        let ctx = self.context();
        let response = match event {
            PointerEvent::Down(down) => {
                if let Some(mode) = classify_pointer_down(&down, ctx) {
                    self.machine.begin(mode, down.position, &self.scene);
                }
                Response::default()
            }
            PointerEvent::Move { position } => {
                let outcome = self.machine.pointer_move(position, &mut self.scene);
                self.apply(outcome)
            }
            PointerEvent::Up { .. } => {
                let outcome = self.machine.pointer_up(&mut self.scene);
                self.apply(outcome)
            }
            PointerEvent::Wheel { target, delta_y } => match classify_wheel(&target, ctx) {
                Some(action) => {
                    let outcome = self.machine.wheel(action, delta_y, &mut self.scene);
                    self.apply(outcome)
                }
                None => Response::default(),
            },
            PointerEvent::Enter {
                target: Target::Plane(id),
                position,
            } if self.navigation => redraw_if(self.show_tooltip(&id, position)),
            PointerEvent::Leave { target: Target::Plane(id) } if self.navigation => {
                redraw_if(self.tooltip.leave(&id))
            }
            PointerEvent::Click {
                target: Target::Plane(id),
                position,
                at,
            } if self.navigation => redraw_if(self.tap_tooltip(&id, position, at)),
            PointerEvent::Enter { .. } | PointerEvent::Leave { .. } | PointerEvent::Click { .. } => Response::default(),
        };

        if response.redraw {
            self.needs_redraw = true;
        }
        response
    }
}

fn redraw_if(changed: bool) -> Response {
    Response {
        redraw: changed,
        committed: false,
    }
}
