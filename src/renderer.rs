use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::core::Tooltip;
use crate::math::{compose_camera_transform, compose_object_transform, quad_contains, TransformChain};
use crate::traits::Target;
use crate::types::{ObjectPlane, PlaneId, Scene};

/// Which listeners a rendered plane carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Gesture editing
    #[default]
    Edit,
    /// Read-only, tooltips on hover/tap
    Navigation,
}

/// Visual operations for one full redraw
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Drop every visual element before rebuilding
    Clear,

    /// Container transform applied to all planes
    Camera { transform: TransformChain },

    /// One plane, in stacking order
    Plane {
        id: PlaneId,
        index: usize,
        transform: TransformChain,
        extent: Vec2,
        listeners: ViewMode,
    },

    /// Description overlay, drawn above everything
    Tooltip { text: String, anchor: Vec2 },
}

/// Per-plane data ready for GPU upload
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PlaneInstance {
    /// Camera * object, column major
    pub model: [[f32; 4]; 4],
    pub extent: [f32; 2],
    _pad: [f32; 2],
}

impl PlaneInstance {
    pub fn new(model: Mat4, extent: Vec2) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            extent: extent.to_array(),
            _pad: [0.0; 2],
        }
    }
}

/// Ordered draw list for one redraw
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    operations: Vec<DrawOp>,
}

impl RenderFrame {
    pub fn new() -> Self {
        Self { operations: Vec::new() }
    }

    /// Add draw operation - functional style
    pub fn draw(mut self, op: DrawOp) -> Self {
        self.operations.push(op);
        self
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.operations
    }

    pub fn camera(&self) -> Option<&TransformChain> {
        self.operations.iter().find_map(|op| match op {
            DrawOp::Camera { transform } => Some(transform),
            _ => None,
        })
    }

    /// Transform drawn for `id`, if the plane is in the frame
    pub fn plane(&self, id: &PlaneId) -> Option<&TransformChain> {
        self.operations.iter().find_map(|op| match op {
            DrawOp::Plane { id: plane, transform, .. } if plane == id => Some(transform),
            _ => None,
        })
    }

    pub fn plane_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, DrawOp::Plane { .. }))
            .count()
    }

    pub fn tooltip(&self) -> Option<(&str, Vec2)> {
        self.operations.iter().find_map(|op| match op {
            DrawOp::Tooltip { text, anchor } => Some((text.as_str(), *anchor)),
            _ => None,
        })
    }

    /// Instance buffer contents, one entry per plane in stacking order
    pub fn instances(&self) -> Vec<PlaneInstance> {
        let camera = self.camera().map(TransformChain::to_matrix).unwrap_or(Mat4::IDENTITY);
        self.operations
            .iter()
            .filter_map(|op| match op {
                DrawOp::Plane { transform, extent, .. } => {
                    Some(PlaneInstance::new(camera * transform.to_matrix(), *extent))
                }
                _ => None,
            })
            .collect()
    }
}

/// Stateless projection of a scene into draw operations
#[derive(Debug, Clone, Copy)]
pub struct SceneRenderer {
    /// Plane size when the image dimensions are unknown
    fallback_extent: Vec2,
}

impl SceneRenderer {
    pub fn new(fallback_extent: Vec2) -> Self {
        Self { fallback_extent }
    }

    /// Full rebuild: clear, camera, every plane, then the tooltip
    pub fn render(&self, scene: &Scene, mode: ViewMode, tooltip: Option<&Tooltip>) -> RenderFrame {
        let mut frame = RenderFrame::new().draw(DrawOp::Clear).draw(DrawOp::Camera {
            transform: compose_camera_transform(scene.camera()),
        });

        for (index, plane) in scene.objects().iter().enumerate() {
            frame = frame.draw(DrawOp::Plane {
                id: plane.id().clone(),
                index,
                transform: compose_object_transform(plane),
                extent: self.plane_extent(plane),
                listeners: mode,
            });
        }

        if let Some(tooltip) = tooltip {
            frame = frame.draw(DrawOp::Tooltip {
                text: tooltip.text.clone(),
                anchor: tooltip.anchor,
            });
        }

        log::debug!("rendered scene {} with {} plane(s)", scene.id(), scene.objects().len());
        frame
    }

    /// Decoded image size, else the fallback
    pub fn plane_extent(&self, plane: &ObjectPlane) -> Vec2 {
        plane
            .image()
            .dimensions()
            .map(|[w, h]| Vec2::new(w as f32, h as f32))
            .unwrap_or(self.fallback_extent)
    }

    /// Projected corners of a plane, centred on its position
    pub fn plane_quad(&self, scene: &Scene, plane: &ObjectPlane) -> [Vec2; 4] {
        let model = compose_camera_transform(scene.camera()).to_matrix() * compose_object_transform(plane).to_matrix();
        let half = self.plane_extent(plane) * 0.5;
        [
            Vec3::new(-half.x, -half.y, 0.0),
            Vec3::new(half.x, -half.y, 0.0),
            Vec3::new(half.x, half.y, 0.0),
            Vec3::new(-half.x, half.y, 0.0),
        ]
        .map(|corner| model.transform_point3(corner).truncate())
    }

    /// Top-most plane under `point`, else the canvas
    pub fn hit_test(&self, scene: &Scene, point: Vec2) -> Target {
        scene
            .objects()
            .iter()
            .rev()
            .find(|plane| quad_contains(&self.plane_quad(scene, plane), point))
            .map(|plane| Target::Plane(plane.id().clone()))
            .unwrap_or(Target::Canvas)
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(Vec2::new(200.0, 150.0))
    }
}
