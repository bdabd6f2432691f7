//! Collision detection and movement on the torus
//!
//! Everything is axis-aligned: entities are rectangles anchored at their
//! top-left corner, and the world wraps on both axes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::SimRng;
use crate::consts::*;
use crate::world_center;

/// Axis-aligned rectangle (top-left anchored)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Square of side `2 * half_extent` centered on `center`
    pub fn around(center: Vec2, half_extent: f32) -> Self {
        Self {
            pos: center - Vec2::splat(half_extent),
            size: Vec2::splat(half_extent * 2.0),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    /// Strict AABB overlap (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }

    /// The four edges as segments (top, right, bottom, left)
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let tl = self.pos;
        let tr = Vec2::new(self.pos.x + self.size.x, self.pos.y);
        let br = self.max();
        let bl = Vec2::new(self.pos.x, self.pos.y + self.size.y);
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }
}

/// Anything with a position and a size
pub trait Body {
    fn pos(&self) -> Vec2;
    fn size(&self) -> Vec2;

    fn rect(&self) -> Rect {
        Rect::new(self.pos(), self.size())
    }

    fn center(&self) -> Vec2 {
        self.pos() + self.size() / 2.0
    }
}

impl Body for Rect {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }
}

/// Move along X then Y independently, reverting an axis that would collide
///
/// Decoupling the axes lets entities slide along walls.
pub fn sliding_move(rect: Rect, dir: Vec2, speed: f32, blockers: &[Rect]) -> Vec2 {
    let delta = dir * speed;
    let mut pos = rect.pos;

    let moved_x = Rect::new(Vec2::new(pos.x + delta.x, pos.y), rect.size);
    if !blockers.iter().any(|b| moved_x.intersects(b)) {
        pos.x = moved_x.pos.x;
    }

    let moved_y = Rect::new(Vec2::new(pos.x, pos.y + delta.y), rect.size);
    if !blockers.iter().any(|b| moved_y.intersects(b)) {
        pos.y = moved_y.pos.y;
    }

    pos
}

/// Teleport a position that is fully off one edge to the opposite edge
pub fn wrap_around(pos: Vec2, size: Vec2) -> Vec2 {
    let mut out = pos;
    if out.x > WORLD_WIDTH {
        out.x = -size.x;
    } else if out.x + size.x < 0.0 {
        out.x = WORLD_WIDTH;
    }
    if out.y > WORLD_HEIGHT {
        out.y = -size.y;
    } else if out.y + size.y < 0.0 {
        out.y = WORLD_HEIGHT;
    }
    out
}

/// Shortest displacement from `from` to `to` on the torus
pub fn toroidal_delta(from: Vec2, to: Vec2) -> Vec2 {
    let mut d = to - from;
    if d.x > WORLD_WIDTH / 2.0 {
        d.x -= WORLD_WIDTH;
    } else if d.x < -WORLD_WIDTH / 2.0 {
        d.x += WORLD_WIDTH;
    }
    if d.y > WORLD_HEIGHT / 2.0 {
        d.y -= WORLD_HEIGHT;
    } else if d.y < -WORLD_HEIGHT / 2.0 {
        d.y += WORLD_HEIGHT;
    }
    d
}

#[inline]
pub fn toroidal_distance(a: Vec2, b: Vec2) -> f32 {
    toroidal_delta(a, b).length()
}

/// Proper segment intersection (collinear overlaps are not treated as hits)
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.perp_dot(s);
    if denom.abs() < f32::EPSILON {
        return false;
    }
    let qp = q1 - p1;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// True when the segment `a -> b` crosses no obstacle edge
pub fn line_of_sight_clear(a: Vec2, b: Vec2, obstacles: &[Rect]) -> bool {
    !obstacles.iter().any(|rect| {
        rect.edges()
            .iter()
            .any(|&(e1, e2)| segments_intersect(a, b, e1, e2))
    })
}

/// Rejection-sample a collision-free slot for a body of `size`
///
/// Falls back to the world center when every sample collides.
pub fn find_safe_teleport_location(size: Vec2, obstacles: &[Rect], rng: &mut SimRng) -> Vec2 {
    for _ in 0..SAFE_TELEPORT_ATTEMPTS {
        let candidate = Vec2::new(
            rng.range(0.0, WORLD_WIDTH - size.x),
            rng.range(0.0, WORLD_HEIGHT - size.y),
        );
        let rect = Rect::new(candidate, size);
        if !obstacles.iter().any(|o| rect.intersects(o)) {
            return candidate;
        }
    }
    log::debug!("No safe location after {SAFE_TELEPORT_ATTEMPTS} samples, using world center");
    world_center() - size / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_aabb_touching_edges_do_not_overlap() {
        let a = wall(0.0, 0.0, 10.0, 10.0);
        let b = wall(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = wall(9.0, 9.0, 10.0, 10.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_sliding_move_slides_along_wall() {
        let body = wall(0.0, 0.0, 10.0, 10.0);
        // Wall directly to the right
        let blockers = [wall(12.0, -100.0, 10.0, 300.0)];
        let dir = Vec2::new(1.0, 1.0).normalize();
        let pos = sliding_move(body, dir, 5.0, &blockers);
        assert_eq!(pos.x, 0.0);
        assert!(pos.y > 3.0);
    }

    #[test]
    fn test_sliding_move_free() {
        let body = wall(0.0, 0.0, 10.0, 10.0);
        let pos = sliding_move(body, Vec2::X, 4.0, &[]);
        assert_eq!(pos, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_wrap_exact_edge() {
        let size = Vec2::new(20.0, 20.0);
        let pos = Vec2::new(WORLD_WIDTH + size.x, 100.0);
        let wrapped = wrap_around(pos, size);
        assert_eq!(wrapped.x, -size.x);
        // A second pass is a no-op
        assert_eq!(wrap_around(wrapped, size), wrapped);
    }

    #[test]
    fn test_wrap_inside_untouched() {
        let pos = Vec2::new(WORLD_WIDTH - 5.0, 0.0);
        assert_eq!(wrap_around(pos, Vec2::splat(10.0)), pos);
    }

    #[test]
    fn test_toroidal_delta_takes_short_way() {
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(WORLD_WIDTH - 10.0, 10.0);
        let d = toroidal_delta(a, b);
        assert!((d.x - (-20.0)).abs() < 0.001);
        assert_eq!(d.y, 0.0);
    }

    #[test]
    fn test_line_of_sight() {
        let obstacles = [wall(40.0, -10.0, 20.0, 20.0)];
        assert!(!line_of_sight_clear(Vec2::ZERO, Vec2::new(100.0, 0.0), &obstacles));
        assert!(line_of_sight_clear(
            Vec2::new(0.0, 50.0),
            Vec2::new(100.0, 50.0),
            &obstacles
        ));
    }

    #[test]
    fn test_safe_location_falls_back_to_center() {
        let mut rng = SimRng::new(3);
        let everything = [wall(-10.0, -10.0, WORLD_WIDTH + 20.0, WORLD_HEIGHT + 20.0)];
        let size = Vec2::splat(32.0);
        let pos = find_safe_teleport_location(size, &everything, &mut rng);
        assert_eq!(pos, world_center() - size / 2.0);
    }

    #[test]
    fn test_safe_location_avoids_obstacles() {
        let mut rng = SimRng::new(11);
        let obstacles = [wall(0.0, 0.0, WORLD_WIDTH / 2.0, WORLD_HEIGHT)];
        let size = Vec2::splat(32.0);
        let pos = find_safe_teleport_location(size, &obstacles, &mut rng);
        assert!(!Rect::new(pos, size).intersects(&obstacles[0]));
    }
}
