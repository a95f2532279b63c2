//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A tightly packed vertex position, the layout render buffers expect
pub type Vertex = [f32; 3];

/// Convert a point into its packed vertex representation
#[inline]
pub fn to_vertex(point: &Point3f) -> Vertex {
    [point.x, point.y, point.z]
}

/// Component-wise minimum and maximum over a set of points.
///
/// Returns `None` for an empty iterator.
pub fn bounds_of<'a, I>(points: I) -> Option<(Point3f, Point3f)>
where
    I: IntoIterator<Item = &'a Point3f>,
{
    let mut iter = points.into_iter();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;

    for p in iter {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);

        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_points() {
        let points = vec![
            Point3f::new(1.0, -2.0, 0.5),
            Point3f::new(-1.0, 3.0, 0.0),
            Point3f::new(0.0, 0.0, 4.0),
        ];
        let (min, max) = bounds_of(&points).unwrap();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 3.0, 4.0));
    }

    #[test]
    fn test_bounds_of_empty() {
        let points: Vec<Point3f> = Vec::new();
        assert!(bounds_of(&points).is_none());
    }
}
