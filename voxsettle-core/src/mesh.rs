//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An indexed triangle mesh, the input to voxelization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
}

/// An unindexed triangle list: every consecutive triple of points is one triangle.
///
/// This is the output of surface extraction. There is no shared-vertex structure,
/// so neighbouring triangles repeat their common corners.
/// Serialized as the flat point list; deserializing rejects lists whose length
/// is not a multiple of 3.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3f>", into = "Vec<Point3f>")]
pub struct TriangleSoup {
    points: Vec<Point3f>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from a flat, implicitly triangulated position list.
    ///
    /// This is the shape mesh loaders usually hand over: three positions per
    /// triangle and no index buffer.
    pub fn from_positions(positions: Vec<Point3f>) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "Position count {} is not a multiple of 3",
                positions.len()
            )));
        }

        let faces = (0..positions.len() / 3)
            .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
            .collect();

        Ok(Self {
            vertices: positions,
            faces,
        })
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Corner positions of a face, or `None` if the face references a missing vertex
    pub fn triangle(&self, face_index: usize) -> Option<[Point3f; 3]> {
        let face = self.faces.get(face_index)?;
        Some([
            *self.vertices.get(face[0])?,
            *self.vertices.get(face[1])?,
            *self.vertices.get(face[2])?,
        ])
    }

    /// Iterate over the corner positions of every well-formed face
    pub fn triangles(&self) -> impl Iterator<Item = [Point3f; 3]> + '_ {
        (0..self.faces.len()).filter_map(move |i| self.triangle(i))
    }

    /// Calculate face normals
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.triangles().map(|t| face_normal(&t)).collect()
    }

    /// Whether every undirected edge is shared by exactly two faces.
    ///
    /// Parity classification is only meaningful for closed meshes; callers that
    /// need that guarantee can check it here before voxelizing.
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }

        let mut edge_uses: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &self.faces {
            for k in 0..3 {
                let a = face[k];
                let b = face[(k + 1) % 3];
                let key = if a < b { (a, b) } else { (b, a) };
                *edge_uses.entry(key).or_insert(0) += 1;
            }
        }

        edge_uses.values().all(|&uses| uses == 2)
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }
}

impl TriangleSoup {
    /// Create a new empty soup
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty soup with room for `triangles` triangles
    pub fn with_triangle_capacity(triangles: usize) -> Self {
        Self {
            points: Vec::with_capacity(triangles * 3),
        }
    }

    /// Create a soup from a flat point list whose length is a multiple of 3
    pub fn from_points(points: Vec<Point3f>) -> Result<Self> {
        if points.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "Triangle soup needs a multiple of 3 points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Append one triangle, corners in the given order
    #[inline]
    pub fn push_triangle(&mut self, a: Point3f, b: Point3f, c: Point3f) {
        self.points.extend_from_slice(&[a, b, c]);
    }

    /// All points, three per triangle
    pub fn points(&self) -> &[Point3f] {
        &self.points
    }

    /// Number of points (three per triangle)
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.points.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over triangles as corner triples
    pub fn triangles(&self) -> impl Iterator<Item = [Point3f; 3]> + '_ {
        self.points.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Per-triangle normals following the stored winding
    pub fn face_normals(&self) -> Vec<Vector3f> {
        self.triangles().map(|t| face_normal(&t)).collect()
    }

    /// Convert into an indexed mesh without merging coincident corners
    pub fn to_indexed_mesh(&self) -> TriangleMesh {
        let faces = (0..self.triangle_count())
            .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
            .collect();
        TriangleMesh::from_vertices_and_faces(self.points.clone(), faces)
    }

    pub fn into_points(self) -> Vec<Point3f> {
        self.points
    }
}

impl TryFrom<Vec<Point3f>> for TriangleSoup {
    type Error = Error;

    fn try_from(points: Vec<Point3f>) -> Result<Self> {
        Self::from_points(points)
    }
}

impl From<TriangleSoup> for Vec<Point3f> {
    fn from(soup: TriangleSoup) -> Self {
        soup.points
    }
}

/// Normal of a triangle under counter-clockwise winding.
///
/// Degenerate triangles yield a zero vector rather than NaNs.
pub fn face_normal(triangle: &[Point3f; 3]) -> Vector3f {
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    edge1
        .cross(&edge2)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3f::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_soup_serde_enforces_whole_triangles() {
        let mut soup = TriangleSoup::new();
        soup.push_triangle(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        );

        let json = serde_json::to_string(&soup).unwrap();
        assert_eq!(json, "[[0.0,0.0,0.0],[1.0,0.0,0.0],[0.0,1.0,0.0]]");
        assert_eq!(serde_json::from_str::<TriangleSoup>(&json).unwrap(), soup);

        let partial = "[[0.0,0.0,0.0],[1.0,0.0,0.0]]";
        assert!(serde_json::from_str::<TriangleSoup>(partial).is_err());
    }

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn test_mesh_from_positions() {
        let positions = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let mesh = TriangleMesh::from_positions(positions).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.faces[0], [0, 1, 2]);

        let bad = TriangleMesh::from_positions(vec![Point3f::origin(); 4]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_closed_mesh_detection() {
        let mut mesh = tetrahedron();
        assert!(mesh.is_closed());

        mesh.faces.pop();
        assert!(!mesh.is_closed());
        assert!(!TriangleMesh::new().is_closed());
    }

    #[test]
    fn test_triangle_out_of_range_face() {
        let mut mesh = tetrahedron();
        mesh.add_face([0, 1, 42]);
        assert!(mesh.triangle(4).is_none());
        assert_eq!(mesh.triangles().count(), 4);
    }

    #[test]
    fn test_soup_counts_and_normals() {
        let mut soup = TriangleSoup::new();
        soup.push_triangle(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        );
        assert_eq!(soup.vertex_count(), 3);
        assert_eq!(soup.triangle_count(), 1);

        let normals = soup.face_normals();
        assert_relative_eq!(normals[0], Vector3f::new(0.0, 0.0, 1.0));

        let mesh = soup.to_indexed_mesh();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_soup_rejects_partial_triangles() {
        assert!(TriangleSoup::from_points(vec![Point3f::origin(); 5]).is_err());
        assert!(TriangleSoup::from_points(vec![Point3f::origin(); 6]).is_ok());
    }

    #[test]
    fn test_degenerate_face_normal() {
        let p = Point3f::new(1.0, 1.0, 1.0);
        assert_eq!(face_normal(&[p, p, p]), Vector3f::zeros());
    }
}
