//! Portable scene documents
//!
//! A document wraps one scene with a format tag and version:
//! `{ "format": "prompt-world/scene", "version": 1, "exportedAt": ..., "scene": {...} }`.
//! Image bytes travel as base64. Import also accepts the older browser export
//! (`images` / `imageDataUrl` / `cameraOffsetX` ...).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::placement::resolve_unplaced;
use crate::types::{CameraPose, ImagePayload, ObjectPlane, PlaneId, Scene, SceneId, Vector3};

pub const FORMAT: &str = "prompt-world/scene";
pub const VERSION: u32 = 1;

const FILE_SUFFIX: &str = ".promptworld.json";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid scene document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported document format `{0}`")]
    UnsupportedFormat(String),
    #[error("unsupported document version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("invalid image data URL")]
    InvalidDataUrl,
    #[error("not a scene document")]
    Unrecognized,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    format: &'a str,
    version: u32,
    exported_at: DateTime<Utc>,
    scene: &'a Scene,
}

/// Parsed native document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub format: String,
    pub version: u32,
    pub exported_at: Option<DateTime<Utc>>,
    pub scene: Scene,
}

/// Pretty JSON document for `scene`
pub fn to_json(scene: &Scene) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(&document(scene))?)
}

pub fn write_document<W: Write>(scene: &Scene, mut writer: W) -> Result<(), DocumentError> {
    serde_json::to_writer_pretty(&mut writer, &document(scene))?;
    writer.flush()?;
    Ok(())
}

fn document(scene: &Scene) -> DocumentRef<'_> {
    DocumentRef {
        format: FORMAT,
        version: VERSION,
        exported_at: Utc::now(),
        scene,
    }
}

/// Read a native or legacy document, keeping the stored scene id
pub fn from_json(text: &str) -> Result<Scene, DocumentError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if let Some(format) = value.get("format") {
        let format = format.as_str().unwrap_or_default();
        if format != FORMAT {
            return Err(DocumentError::UnsupportedFormat(format.to_string()));
        }
        let document: SceneDocument = serde_json::from_value(value)?;
        if document.version > VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: VERSION,
            });
        }
        let mut scene = document.scene;
        scene.normalize();
        return Ok(scene);
    }

    if value.get("images").is_some() {
        let legacy: LegacyProject = serde_json::from_value(value)?;
        return Ok(legacy.into_scene());
    }

    Err(DocumentError::Unrecognized)
}

/// Import as a new scene: same content, fresh scene id
pub fn import_scene(text: &str) -> Result<Scene, DocumentError> {
    let scene = from_json(text)?.with_fresh_identity();
    log::info!("imported scene {} ({} plane(s))", scene.id(), scene.objects().len());
    Ok(scene)
}

/// `<name>.promptworld.json`, lowercased, anything but `[a-z0-9]` as `_`
pub fn export_file_name(name: &str) -> String {
    let stem: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect();
    let stem = if name.trim().is_empty() { "untitled_project".to_string() } else { stem };
    format!("{stem}{FILE_SUFFIX}")
}

/// Decode `data:<mime>;base64,<payload>`
pub fn parse_data_url(url: &str) -> Result<ImagePayload, DocumentError> {
    let rest = url.strip_prefix("data:").ok_or(DocumentError::InvalidDataUrl)?;
    let (mime, encoded) = rest.split_once(";base64,").ok_or(DocumentError::InvalidDataUrl)?;
    if mime.is_empty() || encoded.is_empty() {
        return Err(DocumentError::InvalidDataUrl);
    }
    let data = STANDARD
        .decode(encoded.trim())
        .map_err(|_| DocumentError::InvalidDataUrl)?;
    Ok(ImagePayload::new(mime, data))
}

pub fn to_data_url(payload: &ImagePayload) -> String {
    format!("data:{};base64,{}", payload.mime_type(), STANDARD.encode(payload.bytes()))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyId {
    Text(String),
    Number(i64),
}

impl LegacyId {
    fn into_string(self) -> String {
        match self {
            LegacyId::Text(text) => text,
            LegacyId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyImage {
    id: Option<LegacyId>,
    #[serde(default)]
    image_data_url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    position: Vector3,
    #[serde(default)]
    rotation: Vector3,
    #[serde(default)]
    scale: f32,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProject {
    id: Option<LegacyId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    images: Vec<LegacyImage>,
    #[serde(default)]
    camera_offset_x: f32,
    #[serde(default)]
    camera_offset_y: f32,
    #[serde(default)]
    camera_zoom: f32,
    created_at: Option<DateTime<Utc>>,
}

// Zero means "never set" in the legacy format
fn or_one(value: f32) -> f32 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

impl LegacyProject {
    fn into_scene(self) -> Scene {
        let id = self
            .id
            .map(|id| SceneId::from(id.into_string()))
            .unwrap_or_else(SceneId::generate);
        let camera = CameraPose::new(self.camera_offset_x, self.camera_offset_y, or_one(self.camera_zoom));
        let mut scene = Scene::restore(id, self.name, Vec::new(), camera, self.created_at.unwrap_or_else(Utc::now));

        for image in self.images {
            let payload = parse_data_url(&image.image_data_url).unwrap_or_else(|_| {
                log::warn!("legacy image has a malformed data URL, keeping raw text");
                ImagePayload::new("", image.image_data_url.clone().into_bytes())
            });
            let plane = ObjectPlane::restore(
                image.id.map(|id| PlaneId::from(id.into_string())).unwrap_or_else(PlaneId::generate),
                payload,
                image.description,
                image.position,
                image.rotation,
                or_one(image.scale),
                image.created_at.unwrap_or_else(Utc::now),
            );
            scene.push_object(plane);
        }

        let placed = resolve_unplaced(&mut scene);
        if placed > 0 {
            log::debug!("placed {placed} legacy plane(s) left at the origin");
        }
        scene
    }
}
