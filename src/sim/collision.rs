//! Proximity geometry shared by agent updates and the interaction resolver
//!
//! Most bodies are circles. Booms are thick line segments, so their
//! distance is measured to the closest point on the segment.

use glam::Vec2;

/// Closest point on segment `start..end` to `point`
pub fn closest_point_on_segment(point: Vec2, start: Vec2, end: Vec2) -> Vec2 {
    let line_vec = end - start;
    let line_len_sq = line_vec.length_squared();

    if line_len_sq < 0.0001 {
        return start; // Degenerate segment
    }

    let t = ((point - start).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    start + line_vec * t
}

/// Distance from `point` to segment `start..end`
#[inline]
pub fn segment_distance(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    point.distance(closest_point_on_segment(point, start, end))
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Index of the closest candidate within `radius` of `origin`
pub fn nearest_within<I>(origin: Vec2, radius: f32, candidates: I) -> Option<(usize, Vec2)>
where
    I: IntoIterator<Item = Vec2>,
{
    let mut best: Option<(usize, Vec2, f32)> = None;
    for (i, pos) in candidates.into_iter().enumerate() {
        let dist_sq = origin.distance_squared(pos);
        if dist_sq > radius * radius {
            continue;
        }
        if best.is_none_or(|(_, _, d)| dist_sq < d) {
            best = Some((i, pos, dist_sq));
        }
    }
    best.map(|(i, pos, _)| (i, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance_interior_and_endpoints() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(100.0, 0.0);

        assert!((segment_distance(Vec2::new(50.0, 10.0), start, end) - 10.0).abs() < 1e-4);
        // Past the end, measured to the endpoint
        assert!((segment_distance(Vec2::new(103.0, 4.0), start, end) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let p = Vec2::new(3.0, 4.0);
        assert!((segment_distance(p, Vec2::ZERO, Vec2::ZERO) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving right, hits vertical wall (normal pointing left)
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_nearest_within() {
        let points = [Vec2::new(50.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(500.0, 0.0)];
        assert_eq!(nearest_within(Vec2::ZERO, 100.0, points), Some((1, Vec2::new(10.0, 0.0))));
        assert_eq!(nearest_within(Vec2::ZERO, 5.0, points), None);
    }
}
