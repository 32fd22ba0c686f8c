//! View frustum for chunk culling

use crate::core::types::{Mat4, Vec3, Vec4};
use super::aabb::Aabb;

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View frustum with 6 planes (Near, Far, Left, Right, Top, Bottom)
///
/// The renderer hands one of these to [`crate::streaming::ChunkStore::tick`]
/// each frame; chunks whose bounds fall entirely outside are dropped from the
/// render set.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    /// (Gribb/Hartmann row combinations, normalized).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let row = |i: usize| Vec4::new(m[0][i], m[1][i], m[2][i], m[3][i]);
        let w = row(3);

        let left = Self::normalize_plane(w + row(0));
        let right = Self::normalize_plane(w - row(0));
        let bottom = Self::normalize_plane(w + row(1));
        let top = Self::normalize_plane(w - row(1));
        let near = Self::normalize_plane(w + row(2));
        let far = Self::normalize_plane(w - row(2));

        Self {
            planes: [near, far, left, right, top, bottom],
        }
    }

    fn normalize_plane(plane: Vec4) -> Plane {
        let normal = Vec3::new(plane.x, plane.y, plane.z);
        let len = normal.length();
        Plane {
            normal: normal / len,
            distance: plane.w / len,
        }
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if AABB intersects frustum (conservative test)
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // p-vertex: the corner most aligned with the plane normal
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }
}
