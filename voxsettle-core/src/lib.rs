//! Core data structures and traits for voxsettle
//!
//! This crate provides the geometric vocabulary shared by the voxel pipeline:
//! points, input triangle meshes, output triangle soups, the ray-parity
//! primitive used for inside/outside classification, and the error type.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod ray;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use ray::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
