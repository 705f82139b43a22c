use futures::future::LocalBoxFuture;

use crate::export::DocumentError;
use crate::types::{Scene, SceneId, SceneSummary};

/// Errors from a scene store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("scene {0} not found")]
    NotFound(SceneId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// An issued write; resolves once the store has accepted or rejected it
pub type SaveFuture = LocalBoxFuture<'static, StoreResult<()>>;

/// Durable home of scenes, keyed by scene id
///
/// `save` is an upsert: the stored scene is replaced whole, never patched.
/// It snapshots the scene when called and hands back the write in flight,
/// so callers never wait on the store. Writes for one scene id are applied
/// in the order their futures are driven (last write wins).
pub trait SceneStore {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Create or replace the scene
    fn save(&mut self, scene: &Scene) -> SaveFuture;

    fn load(&self, id: &SceneId) -> StoreResult<Scene>;

    /// Summaries of every stored scene, oldest first
    fn load_all(&self) -> StoreResult<Vec<SceneSummary>>;

    fn delete(&mut self, id: &SceneId) -> StoreResult<()>;
}
