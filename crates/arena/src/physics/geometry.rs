//! Convex polygon helpers used by the arcade backend.

use glam::Vec2;

const EPSILON: f32 = 1e-3;

/// Corners of a rectangle centred on `center`, rotated by `angle`, in
/// counter-clockwise order.
pub fn rect_corners(center: Vec2, half_extents: Vec2, angle: f32) -> [Vec2; 4] {
    let rot = Vec2::from_angle(angle);
    let (hx, hy) = (half_extents.x, half_extents.y);
    [
        center + rot.rotate(Vec2::new(-hx, -hy)),
        center + rot.rotate(Vec2::new(hx, -hy)),
        center + rot.rotate(Vec2::new(hx, hy)),
        center + rot.rotate(Vec2::new(-hx, hy)),
    ]
}

/// Convex hull (monotone chain), counter-clockwise, without collinear points.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| a.distance_squared(*b) < EPSILON * EPSILON);
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: Vec2, a: Vec2, b: Vec2| (a - o).perp_dot(b - o);
    let mut hull: Vec<Vec2> = Vec::with_capacity(pts.len() * 2);

    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Point-in-convex-polygon for a counter-clockwise polygon. Points on the
/// boundary count as inside.
pub fn convex_contains(polygon: &[Vec2], point: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    polygon.iter().enumerate().all(|(i, &a)| {
        let b = polygon[(i + 1) % polygon.len()];
        (b - a).perp_dot(point - a) >= -EPSILON
    })
}

/// Separating-axis test between two convex polygons. Touching edges do not
/// count as an overlap.
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    !has_separating_axis(a, b) && !has_separating_axis(b, a)
}

fn has_separating_axis(poly: &[Vec2], other: &[Vec2]) -> bool {
    (0..poly.len()).any(|i| {
        let edge = poly[(i + 1) % poly.len()] - poly[i];
        let axis = edge.perp();
        let (min_a, max_a) = project(poly, axis);
        let (min_b, max_b) = project(other, axis);
        max_a <= min_b + EPSILON || max_b <= min_a + EPSILON
    })
}

fn project(poly: &[Vec2], axis: Vec2) -> (f32, f32) {
    poly.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

/// Axis-aligned bounds of a point set as `(min, max)`.
pub fn bounds(points: &[Vec2]) -> (Vec2, Vec2) {
    points.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(lo, hi), &p| (lo.min(p), hi.max(p)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hull_of_two_by_two_grid() {
        let mut corners = Vec::new();
        for offset in [
            Vec2::new(-10.0, -10.0),
            Vec2::new(10.0, -10.0),
            Vec2::new(-10.0, 10.0),
            Vec2::new(10.0, 10.0),
        ] {
            corners.extend(rect_corners(offset, Vec2::splat(10.0), 0.0));
        }
        let hull = convex_hull(&corners);
        assert_eq!(hull.len(), 4);
        assert!(convex_contains(&hull, Vec2::ZERO));
        assert!(convex_contains(&hull, Vec2::new(20.0, 20.0)));
        assert!(!convex_contains(&hull, Vec2::new(20.5, 0.0)));
    }

    #[test]
    fn test_overlap_requires_penetration() {
        let a = rect_corners(Vec2::ZERO, Vec2::splat(10.0), 0.0);
        let touching = rect_corners(Vec2::new(20.0, 0.0), Vec2::splat(10.0), 0.0);
        let overlapping = rect_corners(Vec2::new(15.0, 5.0), Vec2::splat(10.0), 0.0);
        assert!(!polygons_overlap(&a, &touching));
        assert!(polygons_overlap(&a, &overlapping));
    }

    #[test]
    fn test_rotated_square_overlap() {
        let a = rect_corners(Vec2::ZERO, Vec2::splat(10.0), 0.0);
        // A diamond whose tip pokes into `a` even though its AABB centre is far.
        let b = rect_corners(Vec2::new(23.0, 0.0), Vec2::splat(10.0), std::f32::consts::FRAC_PI_4);
        assert!(polygons_overlap(&a, &b));
    }
}
