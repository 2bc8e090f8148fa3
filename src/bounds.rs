use bevy::prelude::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Corners of a parallelogram in the x-z plane, each stored as `(x, z)`.
///
/// `a` is the shared corner, `b` and `d` its neighbours. `c` completes the
/// shape but is not needed for the membership test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XzQuad {
    pub a: Vec2,
    pub b: Vec2,
    pub c: Vec2,
    pub d: Vec2,
}

impl XzQuad {
    /// Strictly inside: points on an edge are outside.
    pub fn contains(&self, m: Vec2) -> bool {
        let am = m - self.a;
        let ab = self.b - self.a;
        let ad = self.d - self.a;

        let am_dot_ab = am.dot(ab);
        let am_dot_ad = am.dot(ad);

        (0. < am_dot_ab && am_dot_ab < ab.dot(ab)) && (0. < am_dot_ad && am_dot_ad < ad.dot(ad))
    }
}

/// `true` when `v` lies on exactly one side of each bound: above the lower
/// one and not above the upper one, for `p1 <= p2`.
pub fn is_between(v: f32, p1: f32, p2: f32) -> bool {
    (v > p1) != (v > p2)
}

/// Region the camera may move in. Each check is off until configured, and
/// the default region admits every point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingRegion {
    pub xz_plane: Option<XzQuad>,
    pub y_bounds: Option<(f32, f32)>,
}

impl BoundingRegion {
    pub fn with_xz_plane(mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> Self {
        self.set_xz_plane(a, b, c, d);
        self
    }

    pub fn with_y_bounds(mut self, y_min: f32, y_max: f32) -> Self {
        self.set_y_bounds(y_min, y_max);
        self
    }

    pub fn set_xz_plane(&mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2) {
        self.xz_plane = Some(XzQuad { a, b, c, d });
    }

    pub fn set_y_bounds(&mut self, y_min: f32, y_max: f32) {
        self.y_bounds = Some((y_min, y_max));
    }

    pub fn is_configured(&self) -> bool {
        self.xz_plane.is_some() || self.y_bounds.is_some()
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let in_plane = self
            .xz_plane
            .map_or(true, |quad| quad.contains(Vec2::new(point.x, point.z)));
        let in_height = self
            .y_bounds
            .map_or(true, |(y_min, y_max)| is_between(point.y, y_min, y_max));

        in_plane && in_height
    }

    /// The proposed position if it stays inside, otherwise `current`.
    pub fn try_move(&self, current: Vec3, proposed: Vec3) -> Vec3 {
        if self.contains(proposed) {
            proposed
        } else {
            current
        }
    }
}
