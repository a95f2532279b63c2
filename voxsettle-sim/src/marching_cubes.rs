//! Marching Cubes isosurface extraction
//!
//! This module turns a [`DensityField`] (or a voxel grid, via its occupancy
//! field) into a triangle soup. Samples below the isolevel count as inside.
//! Triangles keep the corner order of the triangle table; that order is the
//! front face.

use log::debug;
use serde::{Deserialize, Serialize};
use voxsettle_core::{Drawable, Point3f, TriangleSoup};

use crate::density::DensityField;
use crate::lattice::Lattice;
use crate::lookup_tables::{triangle_edges, CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE};
use crate::voxel_grid::VoxelGrid;

/// Default isolevel, halfway between occupied and empty densities
pub const DEFAULT_ISO_LEVEL: f32 = 0.5;

/// Where on a crossed edge the surface vertex is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Halfway between the two corners. Suited to binary occupancy fields,
    /// where the density ratio carries no information.
    #[default]
    Midpoint,
    /// Weighted by `(iso - a) / (b - a)`, for continuous fields
    Linear,
}

/// Configuration for Marching Cubes algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarchingCubesConfig {
    /// Isosurface level (scalar value to extract)
    pub iso_level: f32,
    /// Vertex placement along crossed edges, fixed for a whole extraction
    pub interpolation: Interpolation,
}

impl Default for MarchingCubesConfig {
    fn default() -> Self {
        Self {
            iso_level: DEFAULT_ISO_LEVEL,
            interpolation: Interpolation::default(),
        }
    }
}

/// Marching Cubes implementation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarchingCubes {
    config: MarchingCubesConfig,
}

impl MarchingCubes {
    /// Create a new Marching Cubes instance
    pub fn new(config: MarchingCubesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarchingCubesConfig {
        &self.config
    }

    /// Extract the surface enclosing the voxels of `grid` over `lattice`
    pub fn extract_occupancy(&self, grid: &VoxelGrid, lattice: &Lattice) -> TriangleSoup {
        self.extract(&DensityField::from_occupancy(grid, lattice))
    }

    /// Extract the isosurface of a density field.
    ///
    /// A field with fewer than two samples along any axis has no cubes and
    /// yields an empty soup.
    pub fn extract(&self, field: &DensityField) -> TriangleSoup {
        let [sx, sy, sz] = field.dimensions();
        let mut soup = TriangleSoup::new();

        for z in 0..sz.saturating_sub(1) {
            for y in 0..sy.saturating_sub(1) {
                for x in 0..sx.saturating_sub(1) {
                    self.process_cube(field, x, y, z, &mut soup);
                }
            }
        }

        if !soup.is_empty() {
            let (min, max) = soup.bounding_box();
            debug!(
                "generated cubes mesh with {} triangles: ({}, {}, {}) -> ({}, {}, {})",
                soup.triangle_count(),
                min.x,
                min.y,
                min.z,
                max.x,
                max.y,
                max.z
            );
        }

        soup
    }

    /// Process a single cube. All per-cube state lives on this stack frame, so
    /// nothing leaks into the next cube.
    fn process_cube(&self, field: &DensityField, x: usize, y: usize, z: usize, soup: &mut TriangleSoup) {
        let mut values = [0.0f32; 8];
        let mut positions = [Point3f::origin(); 8];
        for (corner, [dx, dy, dz]) in CORNER_OFFSETS.iter().enumerate() {
            let index = field.index(x + dx, y + dy, z + dz);
            values[corner] = field.values()[index];
            positions[corner] = field.positions()[index];
        }

        let mask = cube_index(&values, self.config.iso_level);
        let edges = EDGE_TABLE[mask as usize];
        if edges == 0 {
            return;
        }

        let mut edge_points: [Option<Point3f>; 12] = [None; 12];
        for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
            if edges & (1 << edge) != 0 {
                edge_points[edge] =
                    Some(self.edge_point(&positions[a], &positions[b], values[a], values[b]));
            }
        }

        for [e0, e1, e2] in triangle_edges(mask) {
            if let (Some(p0), Some(p1), Some(p2)) = (edge_points[e0], edge_points[e1], edge_points[e2]) {
                soup.push_triangle(p0, p1, p2);
            }
        }
    }

    /// Surface vertex on the edge between two corners
    fn edge_point(&self, pos1: &Point3f, pos2: &Point3f, val1: f32, val2: f32) -> Point3f {
        let t = match self.config.interpolation {
            Interpolation::Midpoint => 0.5,
            Interpolation::Linear if (val2 - val1).abs() < 1e-6 => 0.5,
            Interpolation::Linear => (self.config.iso_level - val1) / (val2 - val1),
        };

        pos1 + (pos2 - pos1) * t
    }
}

/// Corner mask of a cube: bit `i` is set when corner `i` lies below `iso_level`
pub fn cube_index(values: &[f32; 8], iso_level: f32) -> u8 {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < iso_level)
        .fold(0u8, |mask, (corner, _)| mask | (1 << corner))
}

/// Convenience function for basic marching cubes
pub fn marching_cubes(field: &DensityField, iso_level: f32, interpolation: Interpolation) -> TriangleSoup {
    MarchingCubes::new(MarchingCubesConfig {
        iso_level,
        interpolation,
    })
    .extract(field)
}
