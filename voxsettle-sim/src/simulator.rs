//! Voxelize → settle → extract orchestration
//!
//! A [`Simulator`] owns one grid built from one mesh. `update` runs a single
//! gravity step; `geometry` re-extracts the surface only when the grid has
//! changed since the last extraction and otherwise hands back the same
//! shared soup.

use std::sync::Arc;

use log::debug;
use voxsettle_core::{Result, RayIntersector, TriangleMesh, TriangleRayCounter, TriangleSoup};

use crate::config::SimulationConfig;
use crate::geometry_buffer::GeometryBuffer;
use crate::gravity::GravityStepper;
use crate::lattice::Lattice;
use crate::marching_cubes::MarchingCubes;
use crate::voxel_grid::VoxelGrid;

/// Per-mesh simulation state
#[derive(Debug)]
pub struct Simulator<R: RayIntersector = TriangleRayCounter> {
    mesh: TriangleMesh,
    config: SimulationConfig,
    intersector: R,
    lattice: Lattice,
    initial_grid: VoxelGrid,
    grid: VoxelGrid,
    stepper: GravityStepper,
    extractor: MarchingCubes,
    /// `None` whenever the grid changed after the last extraction
    geometry: Option<Arc<TriangleSoup>>,
    buffer: GeometryBuffer,
    /// The soup currently held by `buffer`
    uploaded: Option<Arc<TriangleSoup>>,
    tick_count: u64,
}

impl Simulator<TriangleRayCounter> {
    /// Voxelize `mesh` with the brute-force ray counter
    pub fn new(mesh: TriangleMesh, config: SimulationConfig) -> Result<Self> {
        Self::with_intersector(mesh, config, TriangleRayCounter::default())
    }
}

impl<R: RayIntersector> Simulator<R> {
    /// Voxelize `mesh` using a caller-supplied ray primitive
    pub fn with_intersector(mesh: TriangleMesh, config: SimulationConfig, intersector: R) -> Result<Self> {
        config.validate()?;

        let voxelization = config.voxelizer().voxelize(&mesh, &intersector);

        Ok(Self {
            stepper: config.gravity_stepper(),
            extractor: config.marching_cubes(),
            buffer: GeometryBuffer::with_max_polygons(config.max_polygons),
            lattice: voxelization.lattice,
            initial_grid: voxelization.grid.clone(),
            grid: voxelization.grid,
            geometry: None,
            uploaded: None,
            tick_count: 0,
            mesh,
            config,
            intersector,
        })
    }

    /// Restore the grid to its freshly voxelized state
    pub fn reset(&mut self) {
        self.grid = self.initial_grid.clone();
        self.geometry = None;
        self.tick_count = 0;
    }

    /// Run one gravity step and return how many moves it made.
    ///
    /// `_dt` is accepted for the caller's frame loop but ignored: every call is
    /// exactly one discrete step. Geometry is not regenerated here.
    pub fn update(&mut self, _dt: f32) -> usize {
        let moved = self.stepper.step(&mut self.grid, self.lattice.dimensions);
        if moved > 0 {
            self.geometry = None;
        }
        self.tick_count += 1;
        moved
    }

    /// Step until the grid comes to rest or `max_steps` ticks have run
    pub fn settle(&mut self, max_steps: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_steps {
            let moved = self.update(0.0);
            if moved == 0 {
                break;
            }
            total += moved;
        }
        total
    }

    /// The surface of the current grid, extracted at most once per grid state
    pub fn geometry(&mut self) -> Arc<TriangleSoup> {
        if let Some(soup) = &self.geometry {
            return Arc::clone(soup);
        }

        let soup = Arc::new(self.extractor.extract_occupancy(&self.grid, &self.lattice));
        self.geometry = Some(Arc::clone(&soup));
        soup
    }

    /// The owned render buffer, holding the current geometry.
    ///
    /// The soup is copied in only when it differs from the one uploaded last.
    pub fn render_buffer(&mut self) -> &GeometryBuffer {
        let soup = self.geometry();
        let current = self
            .uploaded
            .as_ref()
            .is_some_and(|uploaded| Arc::ptr_eq(uploaded, &soup));
        if !current {
            self.buffer.upload(&soup);
            self.uploaded = Some(soup);
        }
        &self.buffer
    }

    /// Replace the configuration and recompute whatever it invalidates.
    ///
    /// Lattice-shaping changes re-voxelize the mesh and restart the run;
    /// threshold changes keep the current grid. Invalid configurations are
    /// rejected and leave the simulator untouched.
    pub fn apply_config(&mut self, config: SimulationConfig) -> Result<()> {
        config.validate()?;

        if self.config.needs_revoxelize(&config) {
            let voxelization = config.voxelizer().voxelize(&self.mesh, &self.intersector);
            debug!(
                "re-voxelized at resolution {:?}: {} voxels",
                config.resolution,
                voxelization.grid.len()
            );
            self.lattice = voxelization.lattice;
            self.initial_grid = voxelization.grid.clone();
            self.grid = voxelization.grid;
            self.tick_count = 0;
            self.geometry = None;
        }

        let extractor = config.marching_cubes();
        if extractor != self.extractor {
            self.extractor = extractor;
            self.geometry = None;
        }

        if config.max_polygons != self.config.max_polygons {
            self.buffer = GeometryBuffer::with_max_polygons(config.max_polygons);
            self.uploaded = None;
        }

        self.stepper = config.gravity_stepper();
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxsettle_core::{Point3f, Vector3f};

    fn tetrahedron() -> TriangleMesh {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
        TriangleMesh::from_vertices_and_faces(vertices, faces)
    }

    fn config() -> SimulationConfig {
        SimulationConfig::default()
            .with_resolution([10, 10, 10])
            .with_margin(0.1)
            .with_cast_directions(vec![Vector3f::new(1.0, 0.0123, 0.0317)])
            .with_max_polygons(64)
    }

    #[test]
    fn test_new_voxelizes_once() {
        let sim = Simulator::new(tetrahedron(), config()).unwrap();
        assert!(!sim.grid().is_empty());
        assert_eq!(sim.lattice().dimensions, [10, 10, 10]);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let bad = config().with_cast_directions(vec![Vector3f::zeros()]);
        assert!(Simulator::new(tetrahedron(), bad).is_err());
    }

    #[test]
    fn test_geometry_is_memoized() {
        let mut sim = Simulator::new(tetrahedron(), config()).unwrap();
        let first = sim.geometry();
        let second = sim.geometry();
        assert!(!first.is_empty());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_quiet_update_keeps_geometry() {
        let mut sim = Simulator::new(tetrahedron(), config().with_tension_threshold(0)).unwrap();
        let before = sim.geometry();
        assert_eq!(sim.update(0.016), 0);
        assert!(Arc::ptr_eq(&before, &sim.geometry()));
        assert_eq!(sim.tick_count(), 1);
    }

    #[test]
    fn test_moving_update_invalidates_geometry() {
        let mut sim = Simulator::new(tetrahedron(), config().with_tension_threshold(10)).unwrap();
        let before = sim.geometry();
        assert!(sim.update(0.016) > 0);
        assert!(!Arc::ptr_eq(&before, &sim.geometry()));
    }

    #[test]
    fn test_update_matches_single_step() {
        let cfg = config();
        let mut sim = Simulator::new(tetrahedron(), cfg.clone()).unwrap();
        let mut expected = sim.grid().clone();
        let moved = cfg.gravity_stepper().step(&mut expected, sim.lattice().dimensions);

        assert_eq!(sim.update(1.0), moved);
        assert_eq!(sim.grid(), &expected);
    }

    #[test]
    fn test_reset_restores_voxelized_grid() {
        let mut sim = Simulator::new(tetrahedron(), config().with_tension_threshold(10)).unwrap();
        let initial = sim.grid().clone();
        sim.settle(20);
        assert_ne!(sim.grid(), &initial);

        sim.reset();
        assert_eq!(sim.grid(), &initial);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn test_settle_reaches_rest() {
        let mut sim = Simulator::new(tetrahedron(), config().with_tension_threshold(10)).unwrap();
        sim.settle(100);
        let rested = sim.grid().clone();
        assert_eq!(sim.update(0.0), 0);
        assert_eq!(sim.grid(), &rested);
    }

    #[test]
    fn test_render_buffer_tracks_geometry() {
        let mut sim = Simulator::new(tetrahedron(), config()).unwrap();
        let triangles = sim.geometry().triangle_count();
        let buffer = sim.render_buffer();
        assert_eq!(buffer.triangle_count(), triangles);
        assert_eq!(buffer.as_flat_slice().len(), triangles * 9);
    }

    #[test]
    fn test_render_buffer_skips_unchanged_geometry() {
        let mut sim = Simulator::new(tetrahedron(), config().with_tension_threshold(10)).unwrap();
        let first = sim.render_buffer().revision();
        assert_eq!(sim.render_buffer().revision(), first);

        assert!(sim.update(0.0) > 0);
        let (revision, triangles) = {
            let buffer = sim.render_buffer();
            (buffer.revision(), buffer.triangle_count())
        };
        assert_eq!(revision, first + 1);
        assert_eq!(triangles, sim.geometry().triangle_count());
    }

    #[test]
    fn test_new_rejects_unaddressable_budget() {
        let huge = config().with_max_polygons(usize::MAX);
        assert!(Simulator::new(tetrahedron(), huge).is_err());
    }

    #[test]
    fn test_apply_threshold_keeps_grid() {
        let mut sim = Simulator::new(tetrahedron(), config().with_tension_threshold(10)).unwrap();
        sim.update(0.0);
        let stepped = sim.grid().clone();
        let geometry = sim.geometry();

        sim.apply_config(sim.config().clone().with_tension_threshold(2)).unwrap();
        assert_eq!(sim.grid(), &stepped);
        assert_eq!(sim.tick_count(), 1);
        assert!(Arc::ptr_eq(&geometry, &sim.geometry()));
    }

    #[test]
    fn test_apply_resolution_revoxelizes() {
        let mut sim = Simulator::new(tetrahedron(), config()).unwrap();
        sim.update(0.0);

        sim.apply_config(config().with_resolution([6, 6, 6])).unwrap();
        assert_eq!(sim.lattice().dimensions, [6, 6, 6]);
        assert_eq!(sim.tick_count(), 0);
        assert!(sim.grid().iter().all(|(c, _)| sim.lattice().contains(*c)));
    }

    #[test]
    fn test_apply_iso_level_invalidates_geometry() {
        let mut sim = Simulator::new(tetrahedron(), config()).unwrap();
        let before = sim.geometry();
        sim.apply_config(config().with_iso_level(0.25)).unwrap();
        assert!(!Arc::ptr_eq(&before, &sim.geometry()));
    }

    #[test]
    fn test_apply_invalid_config_is_rejected() {
        let mut sim = Simulator::new(tetrahedron(), config()).unwrap();
        let bad = config().with_iso_level(f32::INFINITY);
        assert!(sim.apply_config(bad).is_err());
        assert_eq!(sim.config(), &config());
    }
}
