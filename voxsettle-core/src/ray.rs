//! Ray casting against triangle meshes
//!
//! Voxelization only needs to know how many times a ray crosses a surface, not
//! where. [`RayIntersector`] is that seam; [`TriangleRayCounter`] is a
//! brute-force implementation that tests every face.

use crate::{mesh::TriangleMesh, point::*};
use serde::{Deserialize, Serialize};

/// A half-line starting at `origin` and extending along `dir`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3f,
    pub dir: Vector3f,
}

impl Ray {
    pub fn new(origin: Point3f, dir: Vector3f) -> Self {
        Self { origin, dir }
    }

    /// The point at parameter `toi` along the ray
    #[inline]
    pub fn point_at(&self, toi: f32) -> Point3f {
        self.origin + self.dir * toi
    }
}

/// Counts ray/surface crossings.
///
/// Implementations must be pure with respect to the mesh: the same ray always
/// yields the same count. `Sync` lets the voxelizer classify lattice points in
/// parallel.
pub trait RayIntersector: Sync {
    /// Number of mesh faces hit by `ray` strictly in front of its origin
    fn intersection_count(&self, ray: &Ray, mesh: &TriangleMesh) -> usize;
}

/// Tests a ray against every face of the mesh.
///
/// Hits exactly on a shared edge or vertex may be counted once per incident
/// face, which is the classic grazing failure of parity tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleRayCounter {
    /// Determinant tolerance for rays parallel to a face, and minimum time of impact
    pub epsilon: f32,
}

impl Default for TriangleRayCounter {
    fn default() -> Self {
        Self { epsilon: 1e-7 }
    }
}

impl TriangleRayCounter {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    /// Time of impact of `ray` with triangle `abc`, if any
    pub fn cast(&self, a: &Point3f, b: &Point3f, c: &Point3f, ray: &Ray) -> Option<f32> {
        let ab = *b - *a;
        let ac = *c - *a;

        let pvec = ray.dir.cross(&ac);
        let det = ab.dot(&pvec);

        // the ray lies in, or is parallel to, the triangle's plane
        if det.abs() <= self.epsilon {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin - *a;

        let u = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(&ab);
        let v = ray.dir.dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let toi = ac.dot(&qvec) * inv_det;
        (toi > self.epsilon).then_some(toi)
    }
}

impl RayIntersector for TriangleRayCounter {
    fn intersection_count(&self, ray: &Ray, mesh: &TriangleMesh) -> usize {
        mesh.triangles()
            .filter(|[a, b, c]| self.cast(a, b, c, ray).is_some())
            .count()
    }
}
