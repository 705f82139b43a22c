use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::future::FutureExt;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::export;
use crate::traits::{SaveFuture, SceneStore, StoreError, StoreResult};
use crate::types::{Scene, SceneId, SceneSummary};

/// One JSON document per scene inside a directory
///
/// File names are the base64url form of the scene id, so every id maps to
/// its own file. Writes go to `<name>.json.tmp` first and are renamed over
/// `<name>.json`, so a crash mid-write never leaves a truncated scene behind.
#[derive(Debug, Clone)]
pub struct FileSceneStore {
    dir: PathBuf,
}

impl FileSceneStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SceneId) -> PathBuf {
        self.dir.join(format!("{}.json", URL_SAFE_NO_PAD.encode(id.as_str())))
    }

    fn read(path: &Path) -> StoreResult<Scene> {
        let text = fs::read_to_string(path)?;
        Ok(export::from_json(&text)?)
    }
}

/// Write `bytes` next to `path`, sync, then rename into place
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let written = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path));

    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("could not remove {}: {e}", tmp_path.display());
            }
        }
    }
    written
}

impl SceneStore for FileSceneStore {
    fn name(&self) -> &str {
        "FileSceneStore"
    }

    /// Serializes now; the disk write happens when the future is polled
    fn save(&mut self, scene: &Scene) -> SaveFuture {
        let path = self.path_for(scene.id());
        let id = scene.id().clone();
        let document = export::to_json(scene);

        async move {
            write_atomic(&path, document?.as_bytes())?;
            log::debug!("saved scene {id} to {}", path.display());
            Ok::<(), StoreError>(())
        }
        .boxed_local()
    }

    fn load(&self, id: &SceneId) -> StoreResult<Scene> {
        let path = self.path_for(id);
        let scene = match Self::read(&path) {
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id.clone())),
            other => other?,
        };
        if scene.id() != id {
            log::warn!("{} holds scene {}, not {id}", path.display(), scene.id());
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(scene)
    }

    fn load_all(&self) -> StoreResult<Vec<SceneSummary>> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(scene) => summaries.push(scene.summary()),
                Err(e) => log::warn!("skipping unreadable scene file {}: {e}", path.display()),
            }
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    fn delete(&mut self, id: &SceneId) -> StoreResult<()> {
        match fs::remove_file(self.path_for(id)) {
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.clone())),
            other => Ok(other?),
        }
    }
}
