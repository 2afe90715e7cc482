//! Wall segment geometry
//!
//! A wall is an immutable line segment in map-local coordinates. Rays are cast
//! against segments to find how far a wave travels before it is blocked.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::ORIGIN_EPSILON;

/// An immutable wall segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub a: Vec2,
    pub b: Vec2,
}

impl WallSegment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }

    /// Distance along a ray to this segment, if the ray hits it.
    ///
    /// `dir` must be normalized. Hits closer than `ORIGIN_EPSILON` are ignored
    /// so that a ray starting on a wall is not blocked by that wall. Collinear
    /// overlap is treated as a miss.
    pub fn ray_hit(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        let edge = self.b - self.a;
        let denom = dir.perp_dot(edge);
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let to_a = self.a - origin;
        let t = to_a.perp_dot(edge) / denom;
        let u = to_a.perp_dot(dir) / denom;

        if t > ORIGIN_EPSILON && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }

    /// Shortest distance from `point` to this segment
    pub fn distance_to(&self, point: Vec2) -> f32 {
        distance_to_segment(point, self.a, self.b)
    }
}

/// Shortest distance from `point` to the segment `[a, b]`
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let edge = b - a;
    let len_sq = edge.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(edge) / len_sq).clamp(0.0, 1.0);
    point.distance(a + edge * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_wall() -> WallSegment {
        WallSegment::new(Vec2::new(10.0, -5.0), Vec2::new(10.0, 5.0))
    }

    #[test]
    fn test_ray_hits_wall_ahead() {
        let hit = vertical_wall().ray_hit(Vec2::ZERO, Vec2::X);
        assert!((hit.unwrap() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_misses_wall_behind_or_aside() {
        let wall = vertical_wall();
        assert!(wall.ray_hit(Vec2::ZERO, Vec2::NEG_X).is_none());
        assert!(wall.ray_hit(Vec2::ZERO, Vec2::Y).is_none());
        assert!(wall.ray_hit(Vec2::new(0.0, 20.0), Vec2::X).is_none());
    }

    #[test]
    fn test_ray_from_wall_is_not_blocked_by_it() {
        let wall = vertical_wall();
        assert!(wall.ray_hit(Vec2::new(10.0, 0.0), Vec2::X).is_none());
        assert!(wall.ray_hit(Vec2::new(10.0, 0.0), Vec2::NEG_X).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let wall = vertical_wall();
        assert!(wall.ray_hit(Vec2::new(10.0, -20.0), Vec2::Y).is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let wall = vertical_wall();
        assert!((wall.distance_to(Vec2::new(0.0, 0.0)) - 10.0).abs() < 1e-4);
        assert!((wall.distance_to(Vec2::new(10.0, 8.0)) - 3.0).abs() < 1e-4);
    }
}
