pub mod cli;
pub mod config;
pub mod core;
pub mod describe;
pub mod editor;
pub mod export;
pub mod math;
pub mod placement;
pub mod prompt;
pub mod renderer;
pub mod script;
pub mod store;
pub mod traits;
pub mod types;

pub use config::{EditorConfig, WheelCommit};
pub use editor::{Editor, Notice};
pub use placement::Placement;
pub use renderer::{DrawOp, RenderFrame, SceneRenderer, ViewMode};
pub use store::{FileSceneStore, MemorySceneStore};
pub use traits::{PointerEvent, PointerSink, SceneStore, Target};
pub use types::{CameraPose, ImagePayload, ObjectPlane, PlaneId, Scene, SceneId, SceneSummary, Vector3};
