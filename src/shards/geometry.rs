//! 2D polygon helpers for face-local shard outlines.
//!
//! Polygons are ordered vertex lists without a repeated closing vertex.  All
//! helpers accept either winding.

use bevy::math::Vec2;

/// Absolute polygon area (shoelace formula).
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
    signed_area(polygon).abs()
}

fn signed_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Area-weighted centroid.  Falls back to the vertex mean for degenerate
/// (near zero-area) polygons, and to the origin for an empty slice.
pub fn polygon_centroid(polygon: &[Vec2]) -> Vec2 {
    if polygon.is_empty() {
        return Vec2::ZERO;
    }
    let area = signed_area(polygon);
    if area.abs() < 1e-8 {
        return polygon.iter().copied().sum::<Vec2>() / polygon.len() as f32;
    }
    let mut c = Vec2::ZERO;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        c += (a + b) * a.perp_dot(b);
    }
    c / (6.0 * area)
}

/// Axis-aligned bounds as `(min, max)`.
pub fn polygon_bounds(polygon: &[Vec2]) -> (Vec2, Vec2) {
    if polygon.is_empty() {
        return (Vec2::ZERO, Vec2::ZERO);
    }
    let mut min = Vec2::splat(f32::MAX);
    let mut max = Vec2::splat(f32::MIN);
    for p in polygon {
        min = min.min(*p);
        max = max.max(*p);
    }
    (min, max)
}

/// Clip `polygon` against the half-plane `dot(p, normal) >= offset`
/// (Sutherland–Hodgman against a single directed line).
pub fn clip_polygon(polygon: &[Vec2], normal: Vec2, offset: f32) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    if polygon.is_empty() {
        return out;
    }
    for i in 0..polygon.len() {
        let current = polygon[i];
        let next = polygon[(i + 1) % polygon.len()];
        let dc = current.dot(normal) - offset;
        let dn = next.dot(normal) - offset;
        let current_inside = dc >= 0.0;
        let next_inside = dn >= 0.0;

        if current_inside {
            out.push(current);
        }
        if current_inside != next_inside {
            let t = dc / (dc - dn);
            out.push(current + (next - current) * t);
        }
    }
    dedup_vertices(out)
}

/// Split a polygon along the line `dot(p, normal) == offset`.
///
/// Returns `(front, back)` where `front` lies on the positive side of `normal`.
pub fn split_polygon(polygon: &[Vec2], normal: Vec2, offset: f32) -> (Vec<Vec2>, Vec<Vec2>) {
    let front = clip_polygon(polygon, normal, offset);
    let back = clip_polygon(polygon, -normal, -offset);
    (front, back)
}

/// Ray-casting point-in-polygon test.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Drop consecutive near-duplicate vertices produced by clipping through a vertex.
fn dedup_vertices(mut vertices: Vec<Vec2>) -> Vec<Vec2> {
    const EPS_SQ: f32 = 1e-12;
    vertices.dedup_by(|a, b| a.distance_squared(*b) < EPS_SQ);
    if vertices.len() > 1 {
        let first = vertices[0];
        if let Some(last) = vertices.last() {
            if last.distance_squared(first) < EPS_SQ {
                vertices.pop();
            }
        }
    }
    vertices
}

/// The full face square `[-0.5, 0.5]²` in counter-clockwise order.
pub fn unit_face_square() -> Vec<Vec2> {
    vec![
        Vec2::new(-0.5, -0.5),
        Vec2::new(0.5, -0.5),
        Vec2::new(0.5, 0.5),
        Vec2::new(-0.5, 0.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area_and_centroid() {
        let square = unit_face_square();
        assert!((polygon_area(&square) - 1.0).abs() < 1e-6);
        assert!(polygon_centroid(&square).length() < 1e-6);
    }

    #[test]
    fn area_ignores_winding() {
        let mut square = unit_face_square();
        square.reverse();
        assert!((polygon_area(&square) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn centroid_of_degenerate_polygon_is_vertex_mean() {
        let line = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        assert!((polygon_centroid(&line) - Vec2::new(1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn split_square_in_half_preserves_area() {
        let square = unit_face_square();
        let (front, back) = split_polygon(&square, Vec2::X, 0.0);
        assert!((polygon_area(&front) - 0.5).abs() < 1e-6);
        assert!((polygon_area(&back) - 0.5).abs() < 1e-6);
        assert!(front.iter().all(|p| p.x >= -1e-6));
        assert!(back.iter().all(|p| p.x <= 1e-6));
    }

    #[test]
    fn diagonal_split_preserves_total_area() {
        let square = unit_face_square();
        let normal = Vec2::new(1.0, 2.0).normalize();
        let (front, back) = split_polygon(&square, normal, 0.1);
        let total = polygon_area(&front) + polygon_area(&back);
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn clip_outside_line_is_empty() {
        let square = unit_face_square();
        assert!(clip_polygon(&square, Vec2::X, 0.75).is_empty());
    }

    #[test]
    fn point_in_polygon_inside_and_outside() {
        let square = unit_face_square();
        assert!(point_in_polygon(Vec2::ZERO, &square));
        assert!(point_in_polygon(Vec2::new(0.49, -0.49), &square));
        assert!(!point_in_polygon(Vec2::new(0.6, 0.0), &square));
        assert!(!point_in_polygon(Vec2::ZERO, &square[..2]));
    }

    #[test]
    fn bounds_of_square() {
        let (min, max) = polygon_bounds(&unit_face_square());
        assert_eq!(min, Vec2::splat(-0.5));
        assert_eq!(max, Vec2::splat(0.5));
    }
}
