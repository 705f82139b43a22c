use chrono::{DateTime, Utc};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;

/// Random hex suffix so ids minted in the same millisecond stay distinct
fn random_suffix() -> String {
    format!("{:08x}", rand::random::<u32>())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a new id from the current time plus a random suffix
            pub fn generate() -> Self {
                Self(format!("{}{}", Utc::now().timestamp_millis(), random_suffix()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Trailing five characters, used when showing the id to a person
            pub fn short(&self) -> &str {
                let start = self.0.char_indices().rev().nth(4).map_or(0, |(i, _)| i);
                &self.0[start..]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identity of a scene, unique across the store
    SceneId
);

string_id!(
    /// Identity of an object plane, unique within its scene
    PlaneId
);

/// Three floats in scene units (positions) or degrees (rotations)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec3> for Vector3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for Vec3 {
    fn from(v: Vector3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Encoded image bytes plus the MIME tag they arrived with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredPayload")]
pub struct ImagePayload {
    mime_type: String,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
    /// Pixel size read from the image header, if it could be decoded.
    /// Always derived from `data`, never read from a document.
    #[serde(skip)]
    dimensions: Option<[u32; 2]>,
}

/// Payload as stored; dimensions are read from the bytes on load
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPayload {
    mime_type: String,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

impl From<StoredPayload> for ImagePayload {
    fn from(stored: StoredPayload) -> Self {
        Self::new(stored.mime_type, stored.data)
    }
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        let dimensions = Self::probe_dimensions(&data).ok();
        Self {
            mime_type: mime_type.into(),
            data,
            dimensions,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn dimensions(&self) -> Option<[u32; 2]> {
        self.dimensions
    }

    /// Read width/height from the encoded header without decoding pixels
    pub fn probe_dimensions(data: &[u8]) -> image::ImageResult<[u32; 2]> {
        let (width, height) = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .into_dimensions()?;
        Ok([width, height])
    }

    /// MIME tag for a file extension, for importers that only know a path
    pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "bmp" => Some("image/bmp"),
            "svg" => Some("image/svg+xml"),
            _ => None,
        }
    }
}

/// Pan offset and zoom applied to the whole scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    #[serde(default)]
    pub pan_x: f32,
    #[serde(default)]
    pub pan_y: f32,
    #[serde(default = "default_zoom")]
    zoom: f32,
}

fn default_zoom() -> f32 {
    1.0
}

impl CameraPose {
    pub const MIN_ZOOM: f32 = 0.2;
    pub const MAX_ZOOM: f32 = 5.0;

    pub fn new(pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        Self {
            pan_x,
            pan_y,
            zoom: Self::clamp_zoom(zoom),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`; returns the stored value
    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = Self::clamp_zoom(zoom);
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        Vec2::new(self.pan_x, self.pan_y)
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan_x = pan.x;
        self.pan_y = pan.y;
    }

    fn clamp_zoom(zoom: f32) -> f32 {
        if zoom.is_nan() {
            return default_zoom();
        }
        zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM)
    }

    fn normalize(&mut self) {
        self.zoom = Self::clamp_zoom(self.zoom);
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Wrap an angle into (-360, 360), keeping its sign
pub fn wrap_degrees(degrees: f32) -> f32 {
    degrees % 360.0
}

/// One imported image placed in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPlane {
    id: PlaneId,
    image: ImagePayload,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: Vector3,
    #[serde(default)]
    rotation: Vector3,
    #[serde(default = "default_scale")]
    scale: f32,
    /// Position came from automatic placement and has not been moved by hand
    #[serde(default)]
    auto_placed: bool,
    created_at: DateTime<Utc>,
}

fn default_scale() -> f32 {
    1.0
}

impl ObjectPlane {
    pub const MIN_SCALE: f32 = 0.1;

    /// New plane at the default pose: origin, no rotation, unit scale
    pub fn new(image: ImagePayload) -> Self {
        Self::with_pose(image, Vector3::ZERO, Vector3::ZERO, 1.0)
    }

    pub fn with_pose(image: ImagePayload, position: Vector3, rotation: Vector3, scale: f32) -> Self {
        let mut plane = Self {
            id: PlaneId::generate(),
            image,
            description: String::new(),
            position,
            rotation,
            scale,
            auto_placed: false,
            created_at: Utc::now(),
        };
        plane.normalize();
        plane
    }

    /// Rebuild a plane whose identity was minted elsewhere
    pub(crate) fn restore(
        id: PlaneId,
        image: ImagePayload,
        description: String,
        position: Vector3,
        rotation: Vector3,
        scale: f32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut plane = Self {
            id,
            image,
            description,
            position,
            rotation,
            scale,
            auto_placed: false,
            created_at,
        };
        plane.normalize();
        plane
    }

    pub fn id(&self) -> &PlaneId {
        &self.id
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    pub fn rotation(&self) -> Vector3 {
        self.rotation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_auto_placed(&self) -> bool {
        self.auto_placed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Set the Y rotation, wrapped into (-360, 360); returns the stored value
    pub fn set_rotation_y(&mut self, degrees: f32) -> f32 {
        self.rotation.y = wrap_degrees(degrees);
        self.rotation.y
    }

    /// Set the scale, floor-clamped to `MIN_SCALE`; returns the stored value
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.scale = scale.max(Self::MIN_SCALE);
        self.scale
    }

    /// Store an automatically chosen position
    pub fn place_automatically(&mut self, position: Vector3) {
        self.position = position;
        self.auto_placed = true;
    }

    /// Record that the user moved the plane by hand
    pub fn mark_moved(&mut self) {
        self.auto_placed = false;
    }

    pub(crate) fn normalize(&mut self) {
        self.rotation.y = wrap_degrees(self.rotation.y);
        self.scale = self.scale.max(Self::MIN_SCALE);
    }
}

/// One editable document: ordered planes plus a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    id: SceneId,
    pub name: String,
    #[serde(default)]
    objects: Vec<ObjectPlane>,
    #[serde(default)]
    camera: CameraPose,
    created_at: DateTime<Utc>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::generate(),
            name: name.into(),
            objects: Vec::new(),
            camera: CameraPose::default(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn restore(
        id: SceneId,
        name: String,
        objects: Vec<ObjectPlane>,
        camera: CameraPose,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut scene = Self {
            id,
            name,
            objects,
            camera,
            created_at,
        };
        scene.normalize();
        scene
    }

    pub fn id(&self) -> &SceneId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Planes in insertion (stacking) order
    pub fn objects(&self) -> &[ObjectPlane] {
        &self.objects
    }

    pub fn object(&self, id: &PlaneId) -> Option<&ObjectPlane> {
        self.objects.iter().find(|plane| plane.id() == id)
    }

    pub fn object_mut(&mut self, id: &PlaneId) -> Option<&mut ObjectPlane> {
        self.objects.iter_mut().find(|plane| plane.id() == id)
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraPose {
        &mut self.camera
    }

    /// Append a plane at the top of the stacking order, returning its id
    pub fn push_object(&mut self, mut plane: ObjectPlane) -> PlaneId {
        while self.object(plane.id()).is_some() {
            log::warn!("plane id {} already in scene {}, minting another", plane.id, self.id);
            plane.id = PlaneId::generate();
        }
        let id = plane.id.clone();
        self.objects.push(plane);
        id
    }

    /// Give the scene a new identity, keeping all of its content
    pub fn with_fresh_identity(mut self) -> Self {
        self.id = SceneId::generate();
        self
    }

    /// Re-apply invariants to values that came from outside
    ///
    /// A plane whose id repeats an earlier one gets a new id.
    pub fn normalize(&mut self) {
        self.camera.normalize();
        let mut seen = HashSet::new();
        for plane in &mut self.objects {
            plane.normalize();
            while !seen.insert(plane.id.clone()) {
                log::warn!("duplicate plane id {} in scene {}, minting another", plane.id, self.id);
                plane.id = PlaneId::generate();
            }
        }
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            object_count: self.objects.len(),
        }
    }
}

/// What a store listing shows about a scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub id: SceneId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub object_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload::new("image/png", vec![1, 2, 3])
    }

    #[test]
    fn new_scene_has_default_camera() {
        let scene = Scene::new("Demo");
        assert_eq!(scene.name, "Demo");
        assert!(scene.objects().is_empty());
        assert_eq!(scene.camera().pan(), Vec2::ZERO);
        assert_eq!(scene.camera().zoom(), 1.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = CameraPose::default();
        assert_eq!(camera.set_zoom(9.0), CameraPose::MAX_ZOOM);
        assert_eq!(camera.set_zoom(0.01), CameraPose::MIN_ZOOM);
        assert_eq!(camera.set_zoom(f32::NAN), 1.0);
        assert_eq!(CameraPose::new(1.0, 2.0, 10.0).zoom(), 5.0);
    }

    #[test]
    fn scale_has_floor() {
        let mut plane = ObjectPlane::new(payload());
        assert_eq!(plane.set_scale(-3.0), ObjectPlane::MIN_SCALE);
        assert_eq!(plane.set_scale(0.0), ObjectPlane::MIN_SCALE);
        assert_eq!(plane.set_scale(2.5), 2.5);
    }

    #[test]
    fn rotation_y_wraps_keeping_sign() {
        let mut plane = ObjectPlane::new(payload());
        assert_eq!(plane.set_rotation_y(370.0), 10.0);
        assert_eq!(plane.set_rotation_y(-370.0), -10.0);
        assert_eq!(plane.set_rotation_y(359.0), 359.0);
    }

    #[test]
    fn ids_are_distinct() {
        let a = PlaneId::generate();
        let b = PlaneId::generate();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 5);
    }

    #[test]
    fn ids_end_in_random_hex() {
        let id = SceneId::generate();
        let suffix = &id.as_str()[id.as_str().len() - 8..];
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        let same_millis: HashSet<PlaneId> = (0..64).map(|_| PlaneId::generate()).collect();
        assert_eq!(same_millis.len(), 64);
    }

    #[test]
    fn normalize_remints_duplicate_plane_ids() {
        let plane = ObjectPlane::new(payload());
        let scene = Scene::restore(
            SceneId::from("dups"),
            "Dups".to_string(),
            vec![plane.clone(), plane.clone(), plane.clone()],
            CameraPose::default(),
            Utc::now(),
        );

        let ids: HashSet<&PlaneId> = scene.objects().iter().map(|plane| plane.id()).collect();
        assert_eq!(ids.len(), 3);
        // First occurrence keeps its id
        assert_eq!(scene.objects()[0].id(), plane.id());
    }

    #[test]
    fn stored_dimensions_are_not_trusted() {
        let json = r#"{"mimeType": "image/png", "data": "AQID", "dimensions": [10, 10]}"#;
        let payload: ImagePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.bytes(), &[1, 2, 3]);
        assert_eq!(payload.dimensions(), None);

        let serialized = serde_json::to_value(&payload).unwrap();
        assert!(serialized.get("dimensions").is_none());
    }

    #[test]
    fn push_object_keeps_ids_unique() {
        let mut scene = Scene::new("Dup");
        let plane = ObjectPlane::new(payload());
        let first = scene.push_object(plane.clone());
        let second = scene.push_object(plane);
        assert_ne!(first, second);
        assert_eq!(scene.objects().len(), 2);
    }

    #[test]
    fn fresh_identity_keeps_content() {
        let mut scene = Scene::new("Copy");
        scene.push_object(ObjectPlane::new(payload()));
        let original_id = scene.id().clone();
        let copy = scene.clone().with_fresh_identity();
        assert_ne!(copy.id(), &original_id);
        assert_eq!(copy.objects(), scene.objects());
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(ImagePayload::mime_for_extension("PNG"), Some("image/png"));
        assert_eq!(ImagePayload::mime_for_extension("jpeg"), Some("image/jpeg"));
        assert_eq!(ImagePayload::mime_for_extension("txt"), None);
    }

    #[test]
    fn undecodable_payload_has_no_dimensions() {
        assert_eq!(payload().dimensions(), None);
    }
}
