//! Mesh voxelization by ray parity
//!
//! Every lattice point casts a ray along each configured direction and counts
//! surface crossings. An odd count means the point is inside the mesh. The
//! default is a single `+X` ray per point; a grazing hit (a ray tangent to the
//! surface or passing exactly through an edge or vertex) can flip the parity
//! and misclassify that point. Supplying several directions switches to a
//! strict-majority vote over their parities, which is opt-in because it changes
//! the classification near such features.

use log::{debug, warn};
use voxsettle_core::{Drawable, Point3f, Ray, RayIntersector, TriangleMesh, Vector3f};

use crate::lattice::{Lattice, UpAxis};
use crate::parallel::{parallel_map, ParallelConfig};
use crate::voxel_grid::{Voxel, VoxelCoordinate, VoxelGrid};

/// Default lattice resolution per axis
pub const DEFAULT_RESOLUTION: [usize; 3] = [32, 32, 32];

/// Default bounds expansion, as a fraction of the largest mesh extent
pub const DEFAULT_MARGIN: f32 = 0.05;

/// The six axis directions a caller may choose from
pub const BASIS_DIRECTIONS: [[f32; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

/// The lattice a mesh was sampled on and the voxels found inside it
#[derive(Debug, Clone)]
pub struct Voxelization {
    pub lattice: Lattice,
    pub grid: VoxelGrid,
}

/// Samples a lattice over a mesh and fills a [`VoxelGrid`]
#[derive(Debug, Clone)]
pub struct Voxelizer {
    resolution: [usize; 3],
    margin: f32,
    up_axis: UpAxis,
    cast_directions: Vec<Vector3f>,
    parallel: ParallelConfig,
}

impl Default for Voxelizer {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl Voxelizer {
    pub fn new(resolution: [usize; 3]) -> Self {
        Self {
            resolution,
            margin: DEFAULT_MARGIN,
            up_axis: UpAxis::default(),
            cast_directions: vec![Vector3f::x()],
            parallel: ParallelConfig::default(),
        }
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_up_axis(mut self, up_axis: UpAxis) -> Self {
        self.up_axis = up_axis;
        self
    }

    /// Replace the cast directions. Zero-length directions are dropped; an
    /// empty result falls back to `+X`.
    pub fn with_cast_directions(mut self, directions: Vec<Vector3f>) -> Self {
        let mut kept: Vec<Vector3f> = directions
            .into_iter()
            .filter(|d| {
                let usable = d.norm_squared() > f32::EPSILON;
                if !usable {
                    warn!("Ignoring degenerate cast direction {:?}", d);
                }
                usable
            })
            .collect();
        if kept.is_empty() {
            kept.push(Vector3f::x());
        }
        self.cast_directions = kept;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    pub fn cast_directions(&self) -> &[Vector3f] {
        &self.cast_directions
    }

    /// The lattice this voxelizer would sample `mesh` on: the mesh bounds grown
    /// by `margin` times the largest extent on every side.
    pub fn lattice_for(&self, mesh: &TriangleMesh) -> Lattice {
        let (min, max) = mesh.bounding_box();
        let extent = max - min;
        let pad = extent.x.max(extent.y).max(extent.z) * self.margin;
        let pad = Vector3f::new(pad, pad, pad);

        Lattice::from_bounds(min - pad, max + pad, self.resolution)
    }

    /// Classify every lattice point and populate a grid with the inside ones.
    ///
    /// Runs `resolution³ × directions` ray tests. Open or non-manifold meshes
    /// are not rejected; they just classify unreliably.
    pub fn voxelize<R: RayIntersector>(
        &self,
        mesh: &TriangleMesh,
        intersector: &R,
    ) -> Voxelization {
        let lattice = self.lattice_for(mesh);

        if mesh.is_empty() {
            warn!("Voxelizing an empty mesh; the grid will be empty");
            return Voxelization {
                lattice,
                grid: VoxelGrid::new(),
            };
        }

        let indices: Vec<[usize; 3]> = lattice.indices().collect();
        let inside = parallel_map(&self.parallel, &indices, |&[x, y, z]| {
            self.is_inside(&lattice.grid_to_world(x, y, z), mesh, intersector)
        });

        let mut grid = VoxelGrid::with_capacity(inside.iter().filter(|i| **i).count());
        for (&[x, y, z], _) in indices.iter().zip(&inside).filter(|(_, i)| **i) {
            let coord = VoxelCoordinate::new(x as i32, y as i32, z as i32);
            grid.insert(coord, Voxel::new(self.up_axis.layer_of(coord)));
        }

        debug!(
            "voxelized {} of {} lattice points: ({}, {}, {}) -> ({}, {}, {})",
            grid.len(),
            lattice.point_count(),
            lattice.origin.x,
            lattice.origin.y,
            lattice.origin.z,
            lattice.max_corner().x,
            lattice.max_corner().y,
            lattice.max_corner().z,
        );

        Voxelization { lattice, grid }
    }

    /// Parity test for a single point
    pub fn is_inside<R: RayIntersector>(
        &self,
        point: &Point3f,
        mesh: &TriangleMesh,
        intersector: &R,
    ) -> bool {
        let odd_votes = self
            .cast_directions
            .iter()
            .filter(|dir| intersector.intersection_count(&Ray::new(*point, **dir), mesh) % 2 == 1)
            .count();

        odd_votes * 2 > self.cast_directions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxsettle_core::TriangleRayCounter;

    /// Axis-aligned box, two triangles per face
    fn cuboid(min: Point3f, max: Point3f) -> TriangleMesh {
        let v = |x: f32, y: f32, z: f32| Point3f::new(x, y, z);
        let vertices = vec![
            v(min.x, min.y, min.z),
            v(max.x, min.y, min.z),
            v(max.x, max.y, min.z),
            v(min.x, max.y, min.z),
            v(min.x, min.y, max.z),
            v(max.x, min.y, max.z),
            v(max.x, max.y, max.z),
            v(min.x, max.y, max.z),
        ];
        let faces = vec![
            [0, 2, 1], [0, 3, 2],
            [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4],
            [3, 7, 6], [3, 6, 2],
            [0, 4, 7], [0, 7, 3],
            [1, 2, 6], [1, 6, 5],
        ];
        TriangleMesh::from_vertices_and_faces(vertices, faces)
    }

    #[test]
    fn test_lattice_for_adds_margin() {
        let mesh = cuboid(Point3f::new(0.0, 0.0, 0.0), Point3f::new(2.0, 1.0, 1.0));
        let lattice = Voxelizer::new([5, 5, 5]).with_margin(0.5).lattice_for(&mesh);
        assert_eq!(lattice.origin, Point3f::new(-1.0, -1.0, -1.0));
        assert_eq!(lattice.max_corner(), Point3f::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn test_point_inside_and_outside_cuboid() {
        let mesh = cuboid(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let voxelizer = Voxelizer::default();
        let counter = TriangleRayCounter::default();

        assert!(voxelizer.is_inside(&Point3f::new(0.1, 0.23, -0.37), &mesh, &counter));
        assert!(!voxelizer.is_inside(&Point3f::new(-1.5, 0.23, -0.37), &mesh, &counter));
        assert!(!voxelizer.is_inside(&Point3f::new(1.5, 0.23, -0.37), &mesh, &counter));
        assert!(!voxelizer.is_inside(&Point3f::new(0.1, 1.5, -0.37), &mesh, &counter));
    }

    #[test]
    fn test_majority_vote_over_directions() {
        let mesh = cuboid(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let directions = BASIS_DIRECTIONS
            .iter()
            .map(|d| Vector3f::new(d[0] + 0.013, d[1] + 0.027, d[2] + 0.031))
            .collect();
        let voxelizer = Voxelizer::default().with_cast_directions(directions);
        let counter = TriangleRayCounter::default();

        assert_eq!(voxelizer.cast_directions().len(), 6);
        assert!(voxelizer.is_inside(&Point3f::new(0.1, 0.23, -0.37), &mesh, &counter));
        assert!(!voxelizer.is_inside(&Point3f::new(3.0, 0.23, -0.37), &mesh, &counter));
    }

    #[test]
    fn test_degenerate_directions_fall_back_to_x() {
        let voxelizer = Voxelizer::default().with_cast_directions(vec![Vector3f::zeros()]);
        assert_eq!(voxelizer.cast_directions(), &[Vector3f::x()]);
    }

    #[test]
    fn test_empty_mesh_yields_empty_grid() {
        let result =
            Voxelizer::new([4, 4, 4]).voxelize(&TriangleMesh::new(), &TriangleRayCounter::default());
        assert!(result.grid.is_empty());
    }

    #[test]
    fn test_voxel_layers_follow_up_axis() {
        let mesh = cuboid(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let counter = TriangleRayCounter::default();
        let result = Voxelizer::new([6, 6, 6])
            .with_up_axis(UpAxis::Z)
            .with_cast_directions(vec![Vector3f::new(1.0, 0.0137, 0.0291)])
            .voxelize(&mesh, &counter);

        assert!(!result.grid.is_empty());
        for (coord, voxel) in result.grid.iter() {
            assert_eq!(voxel.layer, coord.z);
        }
    }
}
