//! Regular sampling lattice over a bounding box

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use voxsettle_core::Point3f;

use crate::voxel_grid::VoxelCoordinate;

/// Which lattice axis points "up".
///
/// Gravity pulls along the negative up axis and voxel layers are counted along
/// it. Meshes loaded in a Z-up convention (as STL files usually are) can either
/// be rotated upstream or voxelized with [`UpAxis::Z`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// Index of the up axis within `[x, y, z]`
    pub fn index(self) -> usize {
        match self {
            UpAxis::Y => 1,
            UpAxis::Z => 2,
        }
    }

    /// The layer (up-axis coordinate) of a voxel coordinate
    pub fn layer_of(self, coord: VoxelCoordinate) -> i32 {
        match self {
            UpAxis::Y => coord.y,
            UpAxis::Z => coord.z,
        }
    }

    /// Build a coordinate from gravity-frame components.
    ///
    /// `inner` is always x; `depth` is the remaining horizontal axis.
    pub fn compose(self, inner: i32, up: i32, depth: i32) -> VoxelCoordinate {
        match self {
            UpAxis::Y => VoxelCoordinate::new(inner, up, depth),
            UpAxis::Z => VoxelCoordinate::new(inner, depth, up),
        }
    }

    /// Lattice dimensions reordered as `[inner, up, depth]`
    pub fn frame_extent(self, dimensions: [usize; 3]) -> [usize; 3] {
        match self {
            UpAxis::Y => [dimensions[0], dimensions[1], dimensions[2]],
            UpAxis::Z => [dimensions[0], dimensions[2], dimensions[1]],
        }
    }
}

/// A regular lattice of sample points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// Number of sample points per axis
    pub dimensions: [usize; 3],
    /// World position of lattice point (0, 0, 0)
    pub origin: Point3f,
    /// Distance between neighbouring samples per axis
    pub step: [f32; 3],
}

impl Lattice {
    pub fn new(dimensions: [usize; 3], origin: Point3f, step: [f32; 3]) -> Self {
        Self {
            dimensions,
            origin,
            step,
        }
    }

    /// Span `[min, max]` with `dimensions` samples per axis, first and last
    /// sample on the bounds. Axes with fewer than two samples get a zero step.
    pub fn from_bounds(min: Point3f, max: Point3f, dimensions: [usize; 3]) -> Self {
        let extents = [max.x - min.x, max.y - min.y, max.z - min.z];
        let step = std::array::from_fn(|axis| {
            if dimensions[axis] < 2 {
                0.0
            } else {
                extents[axis] / (dimensions[axis] - 1) as f32
            }
        });

        Self::new(dimensions, min, step)
    }

    /// Convert lattice indices to world coordinates
    pub fn grid_to_world(&self, x: usize, y: usize, z: usize) -> Point3f {
        Point3f::new(
            self.origin.x + x as f32 * self.step[0],
            self.origin.y + y as f32 * self.step[1],
            self.origin.z + z as f32 * self.step[2],
        )
    }

    /// Whether a voxel coordinate falls on a lattice point
    pub fn contains(&self, coord: VoxelCoordinate) -> bool {
        self.to_indices(coord).is_some()
    }

    /// Lattice indices of a voxel coordinate, if it lies inside the lattice
    pub fn to_indices(&self, coord: VoxelCoordinate) -> Option<[usize; 3]> {
        let [sx, sy, sz] = self.dimensions;
        let x = usize::try_from(coord.x).ok().filter(|&x| x < sx)?;
        let y = usize::try_from(coord.y).ok().filter(|&y| y < sy)?;
        let z = usize::try_from(coord.z).ok().filter(|&z| z < sz)?;
        Some([x, y, z])
    }

    /// Linear sample index, `x + sizex * y + sizex * sizey * z`
    #[inline]
    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dimensions[0] * (y + self.dimensions[1] * z)
    }

    /// Total number of lattice points
    pub fn point_count(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Number of unit cubes between lattice points
    pub fn cube_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.saturating_sub(1)).product()
    }

    /// All lattice indices in linear-index order (x fastest, z slowest)
    pub fn indices(&self) -> impl Iterator<Item = [usize; 3]> {
        let [sx, sy, sz] = self.dimensions;
        iproduct!(0..sz, 0..sy, 0..sx).map(|(z, y, x)| [x, y, z])
    }

    /// World position of the far corner of the lattice
    pub fn max_corner(&self) -> Point3f {
        let [sx, sy, sz] = self.dimensions;
        self.grid_to_world(sx.saturating_sub(1), sy.saturating_sub(1), sz.saturating_sub(1))
    }
}
