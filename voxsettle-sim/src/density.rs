//! Scalar sample fields consumed by the extractor

use voxsettle_core::{Error, Point3f, Result};

use crate::lattice::Lattice;
use crate::voxel_grid::{VoxelCoordinate, VoxelGrid};

/// Density of an occupied lattice point.
///
/// Occupancy is inverted relative to the textbook convention: solid cells sit
/// below the isolevel, so the extracted surface encloses the voxels.
pub const OCCUPIED_DENSITY: f32 = 0.0;

/// Density of an empty lattice point
pub const EMPTY_DENSITY: f32 = 1.0;

/// Sample positions and values over a `sizex × sizey × sizez` lattice, stored
/// at index `x + sizex * y + sizex * sizey * z`.
///
/// A field is an immutable snapshot; each extraction builds a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    dimensions: [usize; 3],
    positions: Vec<Point3f>,
    values: Vec<f32>,
}

impl DensityField {
    /// Build a field from parallel position and value sequences
    pub fn new(dimensions: [usize; 3], positions: Vec<Point3f>, values: Vec<f32>) -> Result<Self> {
        let expected: usize = dimensions.iter().product();
        if positions.len() != expected || values.len() != expected {
            return Err(Error::InvalidData(format!(
                "Density field {:?} needs {} samples, got {} positions and {} values",
                dimensions,
                expected,
                positions.len(),
                values.len()
            )));
        }

        Ok(Self {
            dimensions,
            positions,
            values,
        })
    }

    /// Sample `f` at every lattice point
    pub fn from_fn<F>(lattice: &Lattice, f: F) -> Self
    where
        F: Fn(&Point3f) -> f32,
    {
        let positions: Vec<Point3f> = lattice
            .indices()
            .map(|[x, y, z]| lattice.grid_to_world(x, y, z))
            .collect();
        let values = positions.iter().map(f).collect();

        Self {
            dimensions: lattice.dimensions,
            positions,
            values,
        }
    }

    /// Binary field from grid occupancy: [`OCCUPIED_DENSITY`] where a voxel
    /// sits, [`EMPTY_DENSITY`] elsewhere
    pub fn from_occupancy(grid: &VoxelGrid, lattice: &Lattice) -> Self {
        let mut positions = Vec::with_capacity(lattice.point_count());
        let mut values = Vec::with_capacity(lattice.point_count());

        for [x, y, z] in lattice.indices() {
            positions.push(lattice.grid_to_world(x, y, z));
            let coord = VoxelCoordinate::new(x as i32, y as i32, z as i32);
            values.push(if grid.contains(coord) {
                OCCUPIED_DENSITY
            } else {
                EMPTY_DENSITY
            });
        }

        Self {
            dimensions: lattice.dimensions,
            positions,
            values,
        }
    }

    /// Signed distance to a sphere: negative inside, zero on the surface
    pub fn sphere(lattice: &Lattice, center: Point3f, radius: f32) -> Self {
        Self::from_fn(lattice, |p| (p - center).magnitude() - radius)
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn positions(&self) -> &[Point3f] {
        &self.positions
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dimensions[0] * (y + self.dimensions[1] * z)
    }

    /// Value at lattice indices, `None` when out of range
    pub fn value(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.in_range(x, y, z).then(|| self.values[self.index(x, y, z)])
    }

    /// Position at lattice indices, `None` when out of range
    pub fn position(&self, x: usize, y: usize, z: usize) -> Option<Point3f> {
        self.in_range(x, y, z).then(|| self.positions[self.index(x, y, z)])
    }

    fn in_range(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.dimensions[0] && y < self.dimensions[1] && z < self.dimensions[2]
    }
}
