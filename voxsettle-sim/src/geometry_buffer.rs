//! Over-allocated vertex buffer handed to a renderer
//!
//! The backing storage is sized for a polygon budget up front and reused
//! across uploads. Only the first [`GeometryBuffer::draw_count`] vertices are
//! live; everything after the draw range is stale and must not be drawn.
//! Each live vertex carries the flat normal of its triangle.

use log::warn;
use voxsettle_core::{face_normal, to_vertex, TriangleSoup, Vertex};

/// Default polygon budget for a freshly created buffer
pub const DEFAULT_MAX_POLYGONS: usize = 30_000;

/// Flat position and normal buffers with an explicit draw range
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBuffer {
    vertices: Vec<Vertex>,
    normals: Vec<Vertex>,
    draw_count: usize,
    revision: u64,
}

impl Default for GeometryBuffer {
    fn default() -> Self {
        Self::with_max_polygons(DEFAULT_MAX_POLYGONS)
    }
}

impl GeometryBuffer {
    /// Allocate room for `max_polygons` triangles.
    ///
    /// A budget that cannot be allocated leaves the buffer empty; it then grows
    /// to fit the first upload instead.
    pub fn with_max_polygons(max_polygons: usize) -> Self {
        let slots = max_polygons.saturating_mul(3);
        let mut buffer = Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            draw_count: 0,
            revision: 0,
        };

        if buffer.vertices.try_reserve_exact(slots).is_err()
            || buffer.normals.try_reserve_exact(slots).is_err()
        {
            warn!("Cannot preallocate a render buffer for {} polygons", max_polygons);
            buffer.vertices = Vec::new();
            buffer.normals = Vec::new();
            return buffer;
        }

        buffer.vertices.resize(slots, [0.0; 3]);
        buffer.normals.resize(slots, [0.0; 3]);
        buffer
    }

    /// Copy a soup into the buffer and move the draw range to cover it.
    ///
    /// The allocation is reused when it is large enough and grown otherwise;
    /// it never shrinks.
    pub fn upload(&mut self, soup: &TriangleSoup) {
        let points = soup.points();
        if points.len() > self.vertices.len() {
            self.vertices.resize(points.len(), [0.0; 3]);
            self.normals.resize(points.len(), [0.0; 3]);
        }

        for (slot, point) in self.vertices.iter_mut().zip(points) {
            *slot = to_vertex(point);
        }
        for (slots, triangle) in self.normals.chunks_exact_mut(3).zip(soup.triangles()) {
            let n = face_normal(&triangle);
            slots.fill([n.x, n.y, n.z]);
        }

        self.draw_count = points.len();
        self.revision += 1;
    }

    /// Number of live vertices, always a multiple of 3
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    pub fn triangle_count(&self) -> usize {
        self.draw_count / 3
    }

    /// Allocated vertex slots, live or not
    pub fn capacity(&self) -> usize {
        self.vertices.len()
    }

    /// Number of uploads so far; a renderer re-sends the buffer when it changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The live vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.draw_count]
    }

    /// Per-vertex normals of the live vertices, flat across each triangle
    pub fn normals(&self) -> &[Vertex] {
        &self.normals[..self.draw_count]
    }

    /// The live vertices as `3 * draw_count` packed floats
    pub fn as_flat_slice(&self) -> &[f32] {
        bytemuck::cast_slice(self.vertices())
    }

    /// The live normals as `3 * draw_count` packed floats
    pub fn normals_as_flat_slice(&self) -> &[f32] {
        bytemuck::cast_slice(self.normals())
    }

    /// The live vertices as raw bytes, ready for a GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices())
    }

    /// Empty the draw range without releasing the allocation
    pub fn clear(&mut self) {
        self.draw_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxsettle_core::Point3f;

    fn soup_of(triangles: usize) -> TriangleSoup {
        let mut soup = TriangleSoup::new();
        for i in 0..triangles {
            let x = i as f32;
            soup.push_triangle(
                Point3f::new(x, 0.0, 0.0),
                Point3f::new(x + 1.0, 0.0, 0.0),
                Point3f::new(x, 1.0, 0.0),
            );
        }
        soup
    }

    #[test]
    fn test_buffer_is_preallocated() {
        let buffer = GeometryBuffer::with_max_polygons(10);
        assert_eq!(buffer.capacity(), 30);
        assert_eq!(buffer.draw_count(), 0);
        assert!(buffer.as_flat_slice().is_empty());
    }

    #[test]
    fn test_upload_sets_draw_range() {
        let mut buffer = GeometryBuffer::with_max_polygons(10);
        buffer.upload(&soup_of(2));

        assert_eq!(buffer.draw_count(), 6);
        assert_eq!(buffer.triangle_count(), 2);
        assert_eq!(buffer.capacity(), 30);

        let flat = buffer.as_flat_slice();
        assert_eq!(flat.len(), 18);
        assert_eq!(flat.len() % 9, 0);
        assert_eq!(&flat[9..12], &[1.0, 0.0, 0.0]);
        assert_eq!(buffer.as_bytes().len(), 18 * std::mem::size_of::<f32>());
    }

    #[test]
    fn test_smaller_upload_shrinks_range_not_allocation() {
        let mut buffer = GeometryBuffer::with_max_polygons(4);
        buffer.upload(&soup_of(4));
        buffer.upload(&soup_of(1));

        assert_eq!(buffer.draw_count(), 3);
        assert_eq!(buffer.capacity(), 12);
    }

    #[test]
    fn test_upload_grows_past_budget() {
        let mut buffer = GeometryBuffer::with_max_polygons(1);
        buffer.upload(&soup_of(5));

        assert_eq!(buffer.draw_count(), 15);
        assert!(buffer.capacity() >= 15);
    }

    #[test]
    fn test_normals_are_flat_per_triangle() {
        let mut buffer = GeometryBuffer::with_max_polygons(4);
        buffer.upload(&soup_of(2));

        assert_eq!(buffer.normals().len(), buffer.draw_count());
        assert!(buffer.normals().iter().all(|n| *n == [0.0, 0.0, 1.0]));
        assert_eq!(buffer.normals_as_flat_slice().len(), 18);
    }

    #[test]
    fn test_revision_counts_uploads() {
        let mut buffer = GeometryBuffer::with_max_polygons(4);
        assert_eq!(buffer.revision(), 0);
        buffer.upload(&soup_of(1));
        buffer.upload(&soup_of(1));
        assert_eq!(buffer.revision(), 2);
    }

    #[test]
    fn test_unallocatable_budget_does_not_panic() {
        let mut buffer = GeometryBuffer::with_max_polygons(usize::MAX);
        assert_eq!(buffer.capacity(), 0);

        buffer.upload(&soup_of(2));
        assert_eq!(buffer.draw_count(), 6);
    }

    #[test]
    fn test_clear() {
        let mut buffer = GeometryBuffer::default();
        buffer.upload(&soup_of(3));
        buffer.clear();
        assert_eq!(buffer.draw_count(), 0);
        assert_eq!(buffer.capacity(), DEFAULT_MAX_POLYGONS * 3);
    }
}
