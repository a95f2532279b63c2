//! Simulation configuration
//!
//! One serde-backed struct covers every recognised option. Configurations are
//! applied explicitly (see [`crate::Simulator::apply_config`]); nothing here
//! observes changes.

use std::fs;
use std::mem;
use std::path::Path;

use serde::{Deserialize, Serialize};
use voxsettle_core::{Error, Point3f, Result, Vector3f, Vertex};

use crate::geometry_buffer::DEFAULT_MAX_POLYGONS;
use crate::gravity::{GravityStepper, DEFAULT_TENSION_THRESHOLD};
use crate::lattice::UpAxis;
use crate::marching_cubes::{Interpolation, MarchingCubes, MarchingCubesConfig, DEFAULT_ISO_LEVEL};
use crate::parallel::ParallelConfig;
use crate::voxelizer::{Voxelizer, DEFAULT_MARGIN, DEFAULT_RESOLUTION};

/// Everything the simulator can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Lattice points per axis
    pub resolution: [usize; 3],
    /// Bounds expansion as a fraction of the largest mesh extent
    pub margin: f32,
    pub up_axis: UpAxis,
    /// Parity ray directions; more than one switches to majority voting
    pub cast_directions: Vec<Vector3f>,
    /// Voxels with fewer occupied neighbours than this may fall
    pub tension_threshold: u8,
    pub iso_level: f32,
    pub interpolation: Interpolation,
    /// Classify lattice points on the rayon pool
    pub parallel_voxelization: bool,
    /// Initial triangle capacity of the render buffer
    pub max_polygons: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            margin: DEFAULT_MARGIN,
            up_axis: UpAxis::default(),
            cast_directions: vec![Vector3f::x()],
            tension_threshold: DEFAULT_TENSION_THRESHOLD,
            iso_level: DEFAULT_ISO_LEVEL,
            interpolation: Interpolation::default(),
            parallel_voxelization: false,
            max_polygons: DEFAULT_MAX_POLYGONS,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values no stage can run with.
    ///
    /// A resolution below 2 is allowed: it yields an empty surface. Lattice
    /// and buffer sizes must be addressable: every axis fits an `i32`
    /// coordinate and the per-point sample storage fits in memory.
    pub fn validate(&self) -> Result<()> {
        if self.resolution.iter().any(|&n| n > i32::MAX as usize) {
            return Err(Error::InvalidConfig(format!(
                "resolution {:?} exceeds the coordinate range",
                self.resolution
            )));
        }
        let points = self
            .resolution
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n));
        let fits = points
            .and_then(|n| n.checked_mul(mem::size_of::<Point3f>()))
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(Error::InvalidConfig(format!(
                "resolution {:?} has too many lattice points",
                self.resolution
            )));
        }
        let fits = self
            .max_polygons
            .checked_mul(3 * mem::size_of::<Vertex>())
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(Error::InvalidConfig(format!(
                "max_polygons {} is too large for a render buffer",
                self.max_polygons
            )));
        }
        if !self.iso_level.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "iso_level must be finite, got {}",
                self.iso_level
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "margin must be a non-negative number, got {}",
                self.margin
            )));
        }
        if self.cast_directions.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one cast direction is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .cast_directions
            .iter()
            .find(|d| !d.iter().all(|c| c.is_finite()) || d.norm_squared() <= f32::EPSILON)
        {
            return Err(Error::InvalidConfig(format!(
                "cast direction {:?} is degenerate",
                bad
            )));
        }
        Ok(())
    }

    /// Whether moving from `self` to `other` invalidates a voxelization
    pub fn needs_revoxelize(&self, other: &SimulationConfig) -> bool {
        self.resolution != other.resolution
            || self.margin != other.margin
            || self.up_axis != other.up_axis
            || self.cast_directions != other.cast_directions
    }

    pub fn with_resolution(mut self, resolution: [usize; 3]) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_up_axis(mut self, up_axis: UpAxis) -> Self {
        self.up_axis = up_axis;
        self
    }

    pub fn with_cast_directions(mut self, cast_directions: Vec<Vector3f>) -> Self {
        self.cast_directions = cast_directions;
        self
    }

    pub fn with_tension_threshold(mut self, tension_threshold: u8) -> Self {
        self.tension_threshold = tension_threshold;
        self
    }

    pub fn with_iso_level(mut self, iso_level: f32) -> Self {
        self.iso_level = iso_level;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_parallel_voxelization(mut self, enabled: bool) -> Self {
        self.parallel_voxelization = enabled;
        self
    }

    pub fn with_max_polygons(mut self, max_polygons: usize) -> Self {
        self.max_polygons = max_polygons;
        self
    }

    pub fn voxelizer(&self) -> Voxelizer {
        Voxelizer::new(self.resolution)
            .with_margin(self.margin)
            .with_up_axis(self.up_axis)
            .with_cast_directions(self.cast_directions.clone())
            .with_parallel(ParallelConfig::default().with_enabled(self.parallel_voxelization))
    }

    pub fn gravity_stepper(&self) -> GravityStepper {
        GravityStepper::new(self.tension_threshold, self.up_axis)
    }

    pub fn marching_cubes(&self) -> MarchingCubes {
        MarchingCubes::new(MarchingCubesConfig {
            iso_level: self.iso_level,
            interpolation: self.interpolation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.resolution, [32, 32, 32]);
        assert_eq!(config.cast_directions, vec![Vector3f::x()]);
        assert_eq!(config.tension_threshold, 4);
        assert_eq!(config.iso_level, 0.5);
        assert_eq!(config.interpolation, Interpolation::Midpoint);
        assert!(!config.parallel_voxelization);
        assert_eq!(config.max_polygons, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SimulationConfig::from_json_str(
            r#"{ "resolution": [16, 20, 24], "tension_threshold": 6, "up_axis": "Z" }"#,
        )
        .unwrap();

        assert_eq!(config.resolution, [16, 20, 24]);
        assert_eq!(config.tension_threshold, 6);
        assert_eq!(config.up_axis, UpAxis::Z);
        assert_eq!(config.margin, DEFAULT_MARGIN);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimulationConfig::default()
            .with_cast_directions(vec![Vector3f::x(), Vector3f::y(), Vector3f::z()])
            .with_interpolation(Interpolation::Linear);
        let json = config.to_json_string().unwrap();
        assert_eq!(SimulationConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = SimulationConfig::from_json_str("{ resolution: ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimulationConfig::from_json_file("does/not/exist.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let zero_dir = SimulationConfig::default().with_cast_directions(vec![Vector3f::zeros()]);
        assert!(matches!(zero_dir.validate(), Err(Error::InvalidConfig(_))));

        let no_dirs = SimulationConfig::default().with_cast_directions(Vec::new());
        assert!(matches!(no_dirs.validate(), Err(Error::InvalidConfig(_))));

        let nan_iso = SimulationConfig::default().with_iso_level(f32::NAN);
        assert!(matches!(nan_iso.validate(), Err(Error::InvalidConfig(_))));

        let negative_margin = SimulationConfig::default().with_margin(-0.1);
        assert!(negative_margin.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unaddressable_sizes() {
        let huge_budget = SimulationConfig::from_json_str(
            r#"{ "resolution": [4, 4, 4], "max_polygons": 18446744073709551615 }"#,
        );
        assert!(matches!(huge_budget, Err(Error::InvalidConfig(_))));

        let wide_axis = SimulationConfig::default().with_resolution([i32::MAX as usize + 1, 2, 2]);
        assert!(matches!(wide_axis.validate(), Err(Error::InvalidConfig(_))));

        let overflowing = SimulationConfig::default().with_resolution([1 << 30, 1 << 30, 1 << 30]);
        assert!(matches!(overflowing.validate(), Err(Error::InvalidConfig(_))));

        let large_ok = SimulationConfig::default().with_max_polygons(1_000_000);
        assert!(large_ok.validate().is_ok());
    }

    #[test]
    fn test_small_resolution_is_valid() {
        let config = SimulationConfig::default().with_resolution([1, 1, 1]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_needs_revoxelize() {
        let base = SimulationConfig::default();
        assert!(!base.needs_revoxelize(&base.clone().with_tension_threshold(6)));
        assert!(!base.needs_revoxelize(&base.clone().with_iso_level(0.25)));
        assert!(base.needs_revoxelize(&base.clone().with_resolution([8, 8, 8])));
        assert!(base.needs_revoxelize(&base.clone().with_up_axis(UpAxis::Z)));
    }

    #[test]
    fn test_factories_carry_settings() {
        let config = SimulationConfig::default()
            .with_resolution([8, 9, 10])
            .with_tension_threshold(6)
            .with_iso_level(0.25);

        assert_eq!(config.voxelizer().resolution(), [8, 9, 10]);
        assert_eq!(config.gravity_stepper().tension_threshold(), 6);
        assert_eq!(config.marching_cubes().config().iso_level, 0.25);
    }
}
