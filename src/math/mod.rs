mod quad;
mod transform;

pub use quad::{quad_contains, signed_area};
pub use transform::{
    compose_camera_transform, compose_object_transform, compose_pose, ParseTransformError,
    TransformChain, TransformStep,
};
