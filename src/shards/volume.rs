//! Volume queries over a shard template set.
//!
//! [`ShardVolumeMap`] indexes templates by id and answers the questions the
//! fragment builder asks: where is this shard's 3D centre, is it a surface or
//! edge sliver, and which shards contain a given point.

use std::collections::HashMap;

use bevy::math::{Rect, Vec2, Vec3};

use super::geometry::{polygon_area, polygon_bounds, polygon_centroid};
use super::template_set::template_contains;
use super::ShardTemplate;
use crate::error::{DestructionError, DestructionResult};

/// Shards whose centroid is further than this from the face centre (on either
/// axis) are edge shards.
const EDGE_CENTROID_LIMIT: f32 = 0.3;

/// Shards whose mid-depth exceeds this reach into the cube's core.
const CORE_MID_DEPTH: f32 = 0.2;

/// Coarse placement of a shard inside the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceBias {
    /// Thin sliver near the middle of a face.
    Face,
    /// Sliver touching a cube edge.
    Edge,
    /// Deep chunk reaching toward the cube centre.
    Core,
}

/// Cube-local 3D centre of a template: polygon centroid at mid-depth.
pub fn shard_local_center(template: &ShardTemplate) -> Vec3 {
    let centroid = polygon_centroid(&template.polygon);
    let mid_depth = (template.depth_min + template.depth_max) * 0.5;
    template.face.unproject(centroid, mid_depth)
}

/// Approximate prism volume of a template (unit cube = 1.0).
pub fn shard_volume(template: &ShardTemplate) -> f32 {
    polygon_area(&template.polygon) * (template.depth_max - template.depth_min)
}

pub fn classify_surface_bias(template: &ShardTemplate) -> SurfaceBias {
    let centroid = polygon_centroid(&template.polygon);
    let mid_depth = (template.depth_min + template.depth_max) * 0.5;
    if centroid.x.abs() > EDGE_CENTROID_LIMIT || centroid.y.abs() > EDGE_CENTROID_LIMIT {
        SurfaceBias::Edge
    } else if mid_depth > CORE_MID_DEPTH {
        SurfaceBias::Core
    } else {
        SurfaceBias::Face
    }
}

/// Texture-space rectangle of a shard's outline, with the face square mapped
/// onto `[0, 1]²` (v up).
pub fn shard_uv_rect(template: &ShardTemplate) -> Rect {
    let (min, max) = polygon_bounds(&template.polygon);
    let offset = Vec2::splat(0.5);
    Rect::from_corners(min + offset, max + offset)
}

/// Id-indexed view over a set of templates.
#[derive(Debug, Clone)]
pub struct ShardVolumeMap<'a> {
    templates: &'a [ShardTemplate],
    by_id: HashMap<u32, usize>,
}

impl<'a> ShardVolumeMap<'a> {
    pub fn new(templates: &'a [ShardTemplate]) -> Self {
        let by_id = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id, i))
            .collect();
        Self { templates, by_id }
    }

    pub fn template(&self, template_id: u32) -> DestructionResult<&'a ShardTemplate> {
        self.by_id
            .get(&template_id)
            .map(|&i| &self.templates[i])
            .ok_or(DestructionError::ShardGeometryNotFound { template_id })
    }

    pub fn local_center(&self, template_id: u32) -> DestructionResult<Vec3> {
        self.template(template_id).map(shard_local_center)
    }

    pub fn surface_bias(&self, template_id: u32) -> DestructionResult<SurfaceBias> {
        self.template(template_id).map(classify_surface_bias)
    }

    /// Ids of every template whose prism contains the cube-local `point`.
    pub fn covering_templates(&self, point: Vec3) -> Vec<u32> {
        self.templates
            .iter()
            .filter(|t| template_contains(t, point))
            .map(|t| t.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shards::CubeFace;

    fn square(id: u32, face: CubeFace, half: f32, offset: Vec2, depth: (f32, f32)) -> ShardTemplate {
        ShardTemplate {
            id,
            face,
            polygon: vec![
                offset + Vec2::new(-half, -half),
                offset + Vec2::new(half, -half),
                offset + Vec2::new(half, half),
                offset + Vec2::new(-half, half),
            ],
            depth_min: depth.0,
            depth_max: depth.1,
        }
    }

    #[test]
    fn local_center_sits_inside_front_face_slab() {
        let t = square(0, CubeFace::Front, 0.1, Vec2::new(0.2, -0.1), (0.0, 0.2));
        let c = shard_local_center(&t);
        assert!((c - Vec3::new(0.2, -0.1, 0.4)).length() < 1e-5);
    }

    #[test]
    fn surface_bias_classification() {
        let face = square(0, CubeFace::Front, 0.1, Vec2::ZERO, (0.0, 0.2));
        let edge = square(1, CubeFace::Front, 0.1, Vec2::new(0.4, 0.0), (0.0, 0.2));
        let core = square(2, CubeFace::Left, 0.1, Vec2::ZERO, (0.1, 0.4));
        assert_eq!(classify_surface_bias(&face), SurfaceBias::Face);
        assert_eq!(classify_surface_bias(&edge), SurfaceBias::Edge);
        assert_eq!(classify_surface_bias(&core), SurfaceBias::Core);
    }

    #[test]
    fn unknown_template_id_is_an_error() {
        let templates = vec![square(4, CubeFace::Top, 0.2, Vec2::ZERO, (0.0, 0.3))];
        let map = ShardVolumeMap::new(&templates);
        assert!(map.template(4).is_ok());
        assert_eq!(
            map.template(9).unwrap_err(),
            DestructionError::ShardGeometryNotFound { template_id: 9 }
        );
    }

    #[test]
    fn covering_templates_finds_the_containing_prism() {
        let templates = vec![
            square(0, CubeFace::Front, 0.5, Vec2::ZERO, (0.0, 0.2)),
            square(1, CubeFace::Back, 0.5, Vec2::ZERO, (0.0, 0.2)),
        ];
        let map = ShardVolumeMap::new(&templates);
        assert_eq!(map.covering_templates(Vec3::new(0.0, 0.0, 0.4)), vec![0]);
        assert_eq!(map.covering_templates(Vec3::new(0.0, 0.0, -0.4)), vec![1]);
        assert!(map.covering_templates(Vec3::ZERO).is_empty());
    }

    #[test]
    fn uv_rect_maps_face_square_to_unit_square() {
        let t = square(0, CubeFace::Front, 0.5, Vec2::ZERO, (0.0, 0.1));
        let rect = shard_uv_rect(&t);
        assert_eq!(rect.min, Vec2::ZERO);
        assert_eq!(rect.max, Vec2::ONE);
    }

    #[test]
    fn volume_is_area_times_depth() {
        let t = square(0, CubeFace::Front, 0.25, Vec2::ZERO, (0.1, 0.3));
        assert!((shard_volume(&t) - 0.25 * 0.2).abs() < 1e-6);
    }
}
