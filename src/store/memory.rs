use std::collections::BTreeMap;

use futures::future::{self, FutureExt};

use crate::traits::{SaveFuture, SceneStore, StoreError, StoreResult};
use crate::types::{Scene, SceneId, SceneSummary};

/// In-memory scene store for tests and ephemeral sessions
///
/// Writes land when `save` is called; the returned future is already resolved.
#[derive(Debug, Default)]
pub struct MemorySceneStore {
    scenes: BTreeMap<SceneId, Scene>,
    save_count: usize,
    fail_writes: bool,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful saves since creation
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Make every following write fail, as an unavailable store would
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl SceneStore for MemorySceneStore {
    fn name(&self) -> &str {
        "MemorySceneStore"
    }

    fn save(&mut self, scene: &Scene) -> SaveFuture {
        let result = if self.fail_writes {
            Err(StoreError::Unavailable("writes disabled".to_string()))
        } else {
            self.scenes.insert(scene.id().clone(), scene.clone());
            self.save_count += 1;
            Ok(())
        };
        future::ready(result).boxed_local()
    }

    fn load(&self, id: &SceneId) -> StoreResult<Scene> {
        self.scenes
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn load_all(&self) -> StoreResult<Vec<SceneSummary>> {
        let mut summaries: Vec<SceneSummary> = self.scenes.values().map(Scene::summary).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    fn delete(&mut self, id: &SceneId) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.scenes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn save_is_upsert() {
        let mut store = MemorySceneStore::new();
        let mut scene = Scene::new("One");
        block_on(store.save(&scene)).unwrap();
        scene.name = "Renamed".to_string();
        block_on(store.save(&scene)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load(scene.id()).unwrap().name, "Renamed");
    }

    #[test]
    fn missing_scene_is_not_found() {
        let mut store = MemorySceneStore::new();
        let id = SceneId::from("nope");
        assert!(matches!(store.load(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn failing_writes_leave_store_untouched() {
        let mut store = MemorySceneStore::new();
        store.set_fail_writes(true);
        assert!(matches!(block_on(store.save(&Scene::new("x"))), Err(StoreError::Unavailable(_))));
        assert!(store.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
