mod common;

use pollster::block_on;
use std::fs;

use common::png_payload;
use prompt_world::export::{from_json, to_json};
use prompt_world::traits::StoreError;
use prompt_world::{FileSceneStore, ObjectPlane, Scene, SceneId, SceneStore, Vector3};

fn sample_scene(name: &str) -> Scene {
    let mut scene = Scene::new(name);
    let mut plane = ObjectPlane::new(png_payload());
    plane.description = "A window".to_string();
    plane.position = Vector3::new(12.0, -4.0, 30.0);
    plane.set_rotation_y(45.0);
    plane.set_scale(1.5);
    scene.push_object(plane);
    scene.camera_mut().set_zoom(2.0);
    scene
}

/// `scene` re-read under a chosen id
fn with_id(scene: &Scene, id: &str) -> Scene {
    let mut doc: serde_json::Value = serde_json::from_str(&to_json(scene).unwrap()).unwrap();
    doc["scene"]["id"] = serde_json::json!(id);
    from_json(&doc.to_string()).unwrap()
}

#[cfg(test)]
mod file_store_tests {
    use super::*;

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        let scene = sample_scene("Kitchen");

        block_on(store.save(&scene)).unwrap();
        let loaded = store.load(scene.id()).unwrap();

        assert_eq!(loaded, scene);
        assert_eq!(loaded.objects()[0].image().dimensions(), Some([200, 150]));
    }

    #[test]
    fn test_save_replaces_whole_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        let mut scene = sample_scene("Before");
        block_on(store.save(&scene)).unwrap();

        scene.name = "After".to_string();
        scene.camera_mut().set_zoom(0.5);
        block_on(store.save(&scene)).unwrap();

        let loaded = store.load(scene.id()).unwrap();
        assert_eq!(loaded.name, "After");
        assert_eq!(loaded.camera().zoom(), 0.5);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        block_on(store.save(&sample_scene("A"))).unwrap();
        block_on(store.save(&sample_scene("B"))).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.ends_with(".json")));
    }

    #[test]
    fn test_load_all_sorted_and_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        let first = sample_scene("First");
        let second = Scene::new("Second");
        block_on(store.save(&second)).unwrap();
        block_on(store.save(&first)).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let summaries = store.load_all().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "First");
        assert_eq!(summaries[0].object_count, 1);
        assert_eq!(summaries[1].name, "Second");
        assert!(summaries[0].created_at <= summaries[1].created_at);
    }

    #[test]
    fn test_similar_ids_keep_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        let dotted = with_id(&Scene::new("Dotted"), "x.y");
        let underscored = with_id(&Scene::new("Underscored"), "x_y");
        block_on(store.save(&dotted)).unwrap();
        block_on(store.save(&underscored)).unwrap();

        assert_eq!(store.load_all().unwrap().len(), 2);
        assert_eq!(store.load(&SceneId::from("x.y")).unwrap().name, "Dotted");
        assert_eq!(store.load(&SceneId::from("x_y")).unwrap().name, "Underscored");
    }

    #[test]
    fn test_missing_scene_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        let id = SceneId::from("missing");
        assert!(matches!(store.load(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSceneStore::open(dir.path()).unwrap();
        let scene = sample_scene("Gone");
        block_on(store.save(&scene)).unwrap();
        store.delete(scene.id()).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let store = FileSceneStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }
}
