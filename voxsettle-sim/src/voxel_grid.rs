//! Sparse voxel storage keyed by integer lattice coordinates

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::lattice::UpAxis;

/// Temperature every voxel starts with
pub const DEFAULT_TEMPERATURE: f32 = 25.0;

/// Integer lattice coordinate; identity is structural equality of the triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The coordinate shifted by `(dx, dy, dz)`
    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl From<[i32; 3]> for VoxelCoordinate {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// One occupied lattice cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    /// Layer index at creation time; never changes when the voxel moves
    pub layer: i32,
    pub temperature: f32,
}

impl Voxel {
    pub fn new(layer: i32) -> Self {
        Self {
            layer,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Mapping from coordinate to voxel.
///
/// Any coordinate is a legal key, including ones outside the nominal lattice;
/// the extractor and the gravity pass simply never visit those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelGrid {
    voxels: HashMap<VoxelCoordinate, Voxel>,
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            voxels: HashMap::with_capacity(capacity),
        }
    }

    /// Whether a voxel occupies `coord`
    #[inline]
    pub fn contains(&self, coord: VoxelCoordinate) -> bool {
        self.voxels.contains_key(&coord)
    }

    /// The voxel at `coord`; absent for unpopulated or out-of-range coordinates
    #[inline]
    pub fn get(&self, coord: VoxelCoordinate) -> Option<&Voxel> {
        self.voxels.get(&coord)
    }

    pub fn get_mut(&mut self, coord: VoxelCoordinate) -> Option<&mut Voxel> {
        self.voxels.get_mut(&coord)
    }

    /// Insert a voxel, returning whatever previously occupied the coordinate
    pub fn insert(&mut self, coord: VoxelCoordinate, voxel: Voxel) -> Option<Voxel> {
        self.voxels.insert(coord, voxel)
    }

    pub fn remove(&mut self, coord: VoxelCoordinate) -> Option<Voxel> {
        self.voxels.remove(&coord)
    }

    /// Relocate the voxel at `from` to `to`, record unchanged.
    ///
    /// Returns `false` and leaves the grid untouched when `from` is empty or
    /// `to` is already occupied.
    pub fn move_voxel(&mut self, from: VoxelCoordinate, to: VoxelCoordinate) -> bool {
        if from == to || self.contains(to) {
            return false;
        }
        match self.voxels.remove(&from) {
            Some(voxel) => {
                self.voxels.insert(to, voxel);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Iterate over occupied coordinates and their voxels, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&VoxelCoordinate, &Voxel)> {
        self.voxels.iter()
    }

    /// Occupied coordinates, sorted for deterministic inspection
    pub fn sorted_coordinates(&self) -> Vec<VoxelCoordinate> {
        let mut coords: Vec<_> = self.voxels.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Number of voxels currently sitting in `layer` along `up_axis`
    pub fn occupied_in_layer(&self, up_axis: UpAxis, layer: i32) -> usize {
        self.voxels
            .keys()
            .filter(|c| up_axis.layer_of(**c) == layer)
            .count()
    }

    pub fn clear(&mut self) {
        self.voxels.clear();
    }
}

impl FromIterator<(VoxelCoordinate, Voxel)> for VoxelGrid {
    fn from_iter<I: IntoIterator<Item = (VoxelCoordinate, Voxel)>>(iter: I) -> Self {
        Self {
            voxels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut grid = VoxelGrid::new();
        let c = VoxelCoordinate::new(1, 2, 3);
        assert!(grid.get(c).is_none());

        assert!(grid.insert(c, Voxel::new(2)).is_none());
        assert!(grid.contains(c));
        assert_eq!(grid.get(c).map(|v| v.layer), Some(2));
        assert_eq!(grid.get(c).map(|v| v.temperature), Some(DEFAULT_TEMPERATURE));

        assert_eq!(grid.remove(c).map(|v| v.layer), Some(2));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_out_of_range_lookup_is_absent() {
        let grid = VoxelGrid::new();
        assert!(grid.get(VoxelCoordinate::new(-5, i32::MAX, 0)).is_none());
        assert!(!grid.contains(VoxelCoordinate::new(i32::MIN, 0, 0)));
    }

    #[test]
    fn test_move_carries_record() {
        let mut grid = VoxelGrid::new();
        let from = VoxelCoordinate::new(0, 3, 0);
        let to = from.offset(0, -1, 0);
        grid.insert(from, Voxel::new(3));

        assert!(grid.move_voxel(from, to));
        assert!(!grid.contains(from));
        assert_eq!(grid.get(to).map(|v| v.layer), Some(3));
    }

    #[test]
    fn test_move_refuses_occupied_target_or_missing_source() {
        let mut grid = VoxelGrid::new();
        let a = VoxelCoordinate::new(0, 1, 0);
        let b = VoxelCoordinate::new(0, 0, 0);
        grid.insert(a, Voxel::new(1));
        grid.insert(b, Voxel::new(0));

        let before = grid.clone();
        assert!(!grid.move_voxel(a, b));
        assert!(!grid.move_voxel(VoxelCoordinate::new(9, 9, 9), VoxelCoordinate::new(8, 8, 8)));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_occupied_in_layer() {
        let grid: VoxelGrid = [
            (VoxelCoordinate::new(0, 0, 0), Voxel::new(0)),
            (VoxelCoordinate::new(1, 0, 0), Voxel::new(0)),
            (VoxelCoordinate::new(1, 1, 0), Voxel::new(1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(grid.occupied_in_layer(UpAxis::Y, 0), 2);
        assert_eq!(grid.occupied_in_layer(UpAxis::Z, 0), 3);
        assert_eq!(grid.sorted_coordinates()[0], VoxelCoordinate::new(0, 0, 0));
    }
}
