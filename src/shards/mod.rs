//! Shard templates: reusable 2D polygon + depth-range slivers of a unit cube.
//!
//! ## Coordinate frame
//!
//! Templates live in a unit cube centred on the origin (`[-0.5, 0.5]³`).  Each
//! [`CubeFace`] has an outward normal plus a right-handed `(u, v)` basis on its
//! plane.  A template's polygon is expressed in face-local `(u, v)` and its
//! depth range is measured inward from the face plane, so `depth = 0` is the
//! surface and `depth = 0.5` the cube centre.
//!
//! | Face   | Normal | u axis | v axis |
//! |--------|--------|--------|--------|
//! | Front  | +Z     | +X     | +Y     |
//! | Back   | −Z     | −X     | +Y     |
//! | Right  | +X     | −Z     | +Y     |
//! | Left   | −X     | +Z     | +Y     |
//! | Top    | +Y     | +X     | −Z     |
//! | Bottom | −Y     | +X     | +Z     |
//!
//! On the tower, `Front` is the face pointing away from the tower axis.

pub mod generator;
pub mod geometry;
pub mod template_set;
pub mod volume;

use bevy::math::{Vec2, Vec3};

/// One of the six faces of a board cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CubeFace {
    Front,
    Back,
    Right,
    Left,
    Top,
    Bottom,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Back,
        CubeFace::Right,
        CubeFace::Left,
        CubeFace::Top,
        CubeFace::Bottom,
    ];

    /// Outward unit normal in cube-local space.
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::Z,
            CubeFace::Back => Vec3::NEG_Z,
            CubeFace::Right => Vec3::X,
            CubeFace::Left => Vec3::NEG_X,
            CubeFace::Top => Vec3::Y,
            CubeFace::Bottom => Vec3::NEG_Y,
        }
    }

    /// Face-plane basis `(u, v)` in cube-local space.
    pub fn basis(self) -> (Vec3, Vec3) {
        match self {
            CubeFace::Front => (Vec3::X, Vec3::Y),
            CubeFace::Back => (Vec3::NEG_X, Vec3::Y),
            CubeFace::Right => (Vec3::NEG_Z, Vec3::Y),
            CubeFace::Left => (Vec3::Z, Vec3::Y),
            CubeFace::Top => (Vec3::X, Vec3::NEG_Z),
            CubeFace::Bottom => (Vec3::X, Vec3::Z),
        }
    }

    /// Project a cube-local point onto this face: `(u, v)` and inward depth.
    pub fn project(self, point: Vec3) -> (Vec2, f32) {
        let (u, v) = self.basis();
        let uv = Vec2::new(point.dot(u), point.dot(v));
        let depth = 0.5 - point.dot(self.normal());
        (uv, depth)
    }

    /// Inverse of [`CubeFace::project`].
    pub fn unproject(self, uv: Vec2, depth: f32) -> Vec3 {
        let (u, v) = self.basis();
        self.normal() * (0.5 - depth) + u * uv.x + v * uv.y
    }
}

/// An immutable sliver of one cube face.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardTemplate {
    /// Unique across a [`template_set::ShardTemplateSet`].
    pub id: u32,
    pub face: CubeFace,
    /// Face-local outline, simple and inside `[-0.5, 0.5]²`.
    pub polygon: Vec<Vec2>,
    pub depth_min: f32,
    pub depth_max: f32,
}

impl ShardTemplate {
    /// Structural validity: at least a triangle, ordered non-negative depths,
    /// finite vertices inside the face square (with a small tolerance).
    pub fn is_valid(&self) -> bool {
        const TOLERANCE: f32 = 1e-4;
        self.polygon.len() >= 3
            && self.depth_min >= 0.0
            && self.depth_min <= self.depth_max
            && self.polygon.iter().all(|p| {
                p.is_finite() && p.x.abs() <= 0.5 + TOLERANCE && p.y.abs() <= 0.5 + TOLERANCE
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_basis_is_right_handed_with_normal() {
        for face in CubeFace::ALL {
            let (u, v) = face.basis();
            assert!((u.cross(v) - face.normal()).length() < 1e-6, "{face:?}");
        }
    }

    #[test]
    fn project_unproject_roundtrip() {
        let point = Vec3::new(0.1, -0.2, 0.3);
        for face in CubeFace::ALL {
            let (uv, depth) = face.project(point);
            assert!((face.unproject(uv, depth) - point).length() < 1e-6);
        }
    }

    #[test]
    fn face_centre_has_zero_depth() {
        for face in CubeFace::ALL {
            let (uv, depth) = face.project(face.normal() * 0.5);
            assert!(uv.length() < 1e-6);
            assert!(depth.abs() < 1e-6);
        }
    }

    #[test]
    fn template_validity_rejects_bad_depth_and_bounds() {
        let good = ShardTemplate {
            id: 0,
            face: CubeFace::Front,
            polygon: geometry::unit_face_square(),
            depth_min: 0.0,
            depth_max: 0.3,
        };
        assert!(good.is_valid());

        let inverted = ShardTemplate {
            depth_min: 0.4,
            depth_max: 0.1,
            ..good.clone()
        };
        assert!(!inverted.is_valid());

        let mut outside = good.clone();
        outside.polygon[0] = Vec2::new(-0.9, -0.5);
        assert!(!outside.is_valid());
    }
}
