//! Copy-on-read snapshots of live debris, grouped for instanced drawing.

use std::collections::BTreeMap;

use bevy::color::Color;
use bevy::math::{Quat, Rect, Vec3};

use crate::fragment::{Fragment, MaterialId};
use crate::orchestrator::DestructionSimulationState;

/// Draw calls are keyed by material and shard template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub material_id: MaterialId,
    pub template_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInstance {
    pub instance_id: u32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub fade: f32,
    pub color_tint: Option<Color>,
    pub uv_rect: Option<Rect>,
}

impl From<&Fragment> for FragmentInstance {
    fn from(fragment: &Fragment) -> Self {
        Self {
            instance_id: fragment.instance_id,
            position: fragment.position,
            rotation: fragment.rotation,
            scale: fragment.scale,
            fade: fragment.fade,
            color_tint: fragment.color_tint,
            uv_rect: fragment.uv_rect,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch {
    pub key: BatchKey,
    pub instances: Vec<FragmentInstance>,
}

/// Every live fragment of every active cube, grouped by [`BatchKey`] in key
/// order.  Fully faded fragments are skipped.
pub fn collect_render_batches(state: &DestructionSimulationState) -> Vec<RenderBatch> {
    let mut groups: BTreeMap<BatchKey, Vec<FragmentInstance>> = BTreeMap::new();
    for fragment in state
        .active_cubes
        .iter()
        .flat_map(|cube| cube.fragments.iter())
        .filter(|f| f.fade > 0.0)
    {
        let key = BatchKey {
            material_id: fragment.material_id,
            template_id: fragment.template_id,
        };
        groups.entry(key).or_default().push(fragment.into());
    }
    groups
        .into_iter()
        .map(|(key, instances)| RenderBatch { key, instances })
        .collect()
}
