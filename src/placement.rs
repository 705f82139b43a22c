use serde::{Deserialize, Serialize};

use crate::types::{ObjectPlane, PlaneId, Scene, Vector3};

/// Where a freshly imported plane lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Staggered offsets so stacked imports stay distinguishable
    #[default]
    Cascade,
    /// Everything at the origin
    Origin,
}

impl Placement {
    /// Position for the plane at `index` in a scene holding `count` planes
    pub fn position(&self, index: usize, count: usize) -> Vector3 {
        match self {
            Placement::Cascade => cascade_position(index, count),
            Placement::Origin => Vector3::ZERO,
        }
    }
}

/// `x = i*20 - n*10`, `y = 0`, `z = -10*i`
pub fn cascade_position(index: usize, count: usize) -> Vector3 {
    let i = index as f32;
    let n = count as f32;
    Vector3::new(i * 20.0 - n * 10.0, 0.0, -10.0 * i)
}

/// Append a plane, resolving its position once from the placement policy
pub fn place_new_plane(scene: &mut Scene, mut plane: ObjectPlane, placement: Placement) -> PlaneId {
    let index = scene.objects().len();
    if placement == Placement::Cascade {
        plane.place_automatically(placement.position(index, index + 1));
    }
    scene.push_object(plane)
}

/// Resolve planes still at the all-zero default, as older documents leave them
pub fn resolve_unplaced(scene: &mut Scene) -> usize {
    let count = scene.objects().len();
    let unplaced: Vec<(usize, PlaneId)> = scene
        .objects()
        .iter()
        .enumerate()
        .filter(|(_, plane)| plane.position.is_zero())
        .map(|(index, plane)| (index, plane.id().clone()))
        .collect();

    for (index, id) in &unplaced {
        if let Some(plane) = scene.object_mut(id) {
            plane.place_automatically(cascade_position(*index, count));
        }
    }
    unplaced.len()
}
