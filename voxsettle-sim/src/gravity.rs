//! Discrete settling of loosely supported voxels
//!
//! A step is one in-place pass over the lattice: depth ascending, up axis
//! descending, x ascending. A voxel with nothing directly beneath it and fewer
//! occupied neighbours than the tension threshold drops one layer. Because the
//! pass runs top to bottom and mutates as it goes, a voxel that drops is met
//! again one layer lower and can keep falling in the same step.

use log::trace;

use crate::lattice::UpAxis;
use crate::voxel_grid::VoxelGrid;

/// Default tension threshold
pub const DEFAULT_TENSION_THRESHOLD: u8 = 4;

/// Neighbour offsets counted for tension, as `[inner, up, depth]`.
///
/// The x/up von Neumann cross, both depth neighbours, the two forward
/// horizontal diagonals and the forward cell one layer up. Not a full
/// 26-neighbourhood.
pub const TENSION_OFFSETS: [[i32; 3]; 9] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
    [1, 0, 1],
    [-1, 0, 1],
    [0, 1, 1],
];

/// Runs gravity passes over a [`VoxelGrid`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityStepper {
    tension_threshold: u8,
    up_axis: UpAxis,
}

impl Default for GravityStepper {
    fn default() -> Self {
        Self::new(DEFAULT_TENSION_THRESHOLD, UpAxis::default())
    }
}

impl GravityStepper {
    pub fn new(tension_threshold: u8, up_axis: UpAxis) -> Self {
        Self {
            tension_threshold,
            up_axis,
        }
    }

    pub fn tension_threshold(&self) -> u8 {
        self.tension_threshold
    }

    pub fn up_axis(&self) -> UpAxis {
        self.up_axis
    }

    /// Occupied neighbours of the cell at `[inner, up, depth]`
    pub fn tension(&self, grid: &VoxelGrid, inner: i32, up: i32, depth: i32) -> u8 {
        TENSION_OFFSETS
            .iter()
            .filter(|[di, du, dd]| {
                grid.contains(self.up_axis.compose(inner + di, up + du, depth + dd))
            })
            .count() as u8
    }

    /// One settling pass over the lattice of size `dimensions`.
    ///
    /// Returns how many single-layer moves were made; a voxel cascading three
    /// layers counts three times. Coordinates outside the lattice are never
    /// visited. Layer 0 is the floor, so voxels there never move.
    pub fn step(&self, grid: &mut VoxelGrid, dimensions: [usize; 3]) -> usize {
        let [n_inner, n_up, n_depth] = self.up_axis.frame_extent(dimensions);
        let mut moved = 0;

        for depth in 0..n_depth as i32 {
            for up in (1..n_up as i32).rev() {
                for inner in 0..n_inner as i32 {
                    let here = self.up_axis.compose(inner, up, depth);
                    if !grid.contains(here) {
                        continue;
                    }

                    let below = self.up_axis.compose(inner, up - 1, depth);
                    let free_hanging = !grid.contains(below);
                    if !free_hanging {
                        continue;
                    }

                    if self.tension(grid, inner, up, depth) < self.tension_threshold
                        && grid.move_voxel(here, below)
                    {
                        moved += 1;
                    }
                }
            }
        }

        self.diffuse_temperature(grid);

        trace!("gravity step moved {} voxels", moved);
        moved
    }

    /// Step until nothing moves or `max_steps` passes have run.
    ///
    /// Returns the total number of moves.
    pub fn settle(&self, grid: &mut VoxelGrid, dimensions: [usize; 3], max_steps: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_steps {
            let moved = self.step(grid, dimensions);
            if moved == 0 {
                break;
            }
            total += moved;
        }
        total
    }

    /// Heat exchange between neighbouring voxels. Currently does nothing;
    /// temperatures stay at their initial value.
    pub fn diffuse_temperature(&self, _grid: &mut VoxelGrid) {}
}
