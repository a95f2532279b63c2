//! # voxsettle-sim
//!
//! Mesh voxelization, discrete voxel settling and surface extraction.
//!
//! A closed triangle mesh is sampled on a lattice by ray parity, the occupied
//! lattice points settle downward one gravity step at a time, and the current
//! occupancy is turned back into triangles with Marching Cubes. [`Simulator`]
//! ties the three stages together.

pub mod lookup_tables;
pub mod lattice;
pub mod voxel_grid;
pub mod voxelizer;
pub mod gravity;
pub mod density;
pub mod marching_cubes;
pub mod geometry_buffer;
pub mod parallel;
pub mod config;
pub mod simulator;

// Re-export commonly used items
pub use lattice::*;
pub use voxel_grid::*;
pub use voxelizer::*;
pub use gravity::*;
pub use density::*;
pub use marching_cubes::*;
pub use geometry_buffer::*;
pub use parallel::*;
pub use config::*;
pub use simulator::*;

pub use voxsettle_core::{Error, Result};
