//! Core traits for voxsettle

use crate::{mesh::*, point::*};

/// Trait for objects with a spatial extent
pub trait Drawable {
    /// Get the axis-aligned bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.vertices).unwrap_or((Point3f::origin(), Point3f::origin()))
    }
}

impl Drawable for TriangleSoup {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(self.points()).unwrap_or((Point3f::origin(), Point3f::origin()))
    }
}
