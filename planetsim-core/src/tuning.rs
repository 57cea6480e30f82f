//! Named constants that shape generation and the climate model.
//!
//! The compiled-in table lives in `data/tuning.json`. Any key missing from a
//! loaded file falls back to the built-in default, so callers never have to
//! handle a lookup miss.

use std::collections::BTreeMap;
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::world::GlobalParameterKind;

pub const BUILTIN_TUNING: &str = include_str!("data/tuning.json");

/// Ratio window for one global parameter. A missing bound means that side is
/// never deadly (or never leaves the perfect band).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HabitabilityBounds {
    pub perfect_lower: Option<f64>,
    pub perfect_upper: Option<f64>,
    pub deadly_lower: Option<f64>,
    pub deadly_upper: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default = "Tuning::fallback")]
pub struct Tuning {
    // temperature scale
    pub freezing_point: f64,
    pub boiling_point: f64,
    pub fahrenheit_at_zero: f64,
    pub fahrenheit_per_unit: f64,
    pub absolute_zero_f: f64,

    // Earth reference
    pub earth_base_temp_f: f64,
    pub earth_albedo: f64,
    pub earth_water_vapor: f64,
    pub earth_cloud_frequency: f64,
    pub earth_reference_dimensions: usize,
    pub earth_pressure: f64,
    pub earth_inert_fraction: f64,
    pub earth_oxygen_fraction: f64,
    pub earth_ghg_fraction: f64,
    pub earth_toxic_fraction: f64,
    pub earth_gravity: f64,

    // energy balance
    pub cloud_albedo: f64,
    pub albedo_blend_weight: f64,
    pub toxic_cloud_scale: f64,
    pub haze_pressure_span: f64,
    pub max_haze_alpha: f64,

    // temperature generation and equilibrium
    pub initial_temperature_variation: f64,
    pub final_temperature_variation: i32,
    pub temperature_tolerance: f64,
    pub equilibrium_max_iterations: usize,
    pub equilibrium_epsilon: f64,
    pub warm_ceiling_average: f64,
    pub cool_floor_average: f64,
    pub vapor_estimate_passes: usize,

    // worms
    pub worm_length_reference_area: f64,
    pub altitude_worm_count: usize,
    pub altitude_worm_min_length: usize,
    pub altitude_worm_max_length: usize,
    pub altitude_worm_bound: i32,
    pub altitude_raise_chance: f64,
    pub roughness_worm_count: usize,
    pub roughness_worm_min_length: usize,
    pub roughness_worm_max_length: usize,
    pub temperature_worm_count: usize,
    pub temperature_worm_min_length: usize,
    pub temperature_worm_max_length: usize,
    pub soil_worm_count: usize,
    pub soil_worm_min_length: usize,
    pub soil_worm_max_length: usize,
    pub soil_worm_bound: i32,
    pub smoothing_max_sweeps: usize,

    // water
    pub water_sample_reference_area: f64,
    pub water_candidate_samples: usize,
    pub water_placement_max_attempts: usize,
    pub water_target_max_placements: usize,
    pub ice_weight_origin: f64,
    pub liquid_weight_origin: f64,
    pub gas_weight: f64,
    pub flow_min_water: i32,
    pub flow_min_difference: i32,
    pub deadly_water_level: i32,
    pub low_pressure_water_loss_ratio: f64,

    // habitability
    pub temperature_perfect_lower: i32,
    pub temperature_perfect_upper: i32,
    pub habitability_bounds: BTreeMap<GlobalParameterKind, HabitabilityBounds>,

    // sky colours
    pub default_sky_color: [u8; 3],
    pub inert_gas_color: [u8; 3],
    pub oxygen_color: [u8; 3],
    pub ghg_color: [u8; 3],
    pub toxic_gas_color: [u8; 3],
}

impl Default for Tuning {
    /// The compiled-in table.
    fn default() -> Self {
        Self::builtin()
    }
}

impl Tuning {
    /// Code copy of `data/tuning.json`, used for keys a table leaves out.
    fn fallback() -> Self {
        let mut habitability_bounds = BTreeMap::new();
        habitability_bounds.insert(
            GlobalParameterKind::Pressure,
            bounds(Some(0.8), Some(1.25), Some(0.3), Some(6.0)),
        );
        habitability_bounds.insert(
            GlobalParameterKind::Oxygen,
            bounds(Some(0.75), Some(1.5), Some(0.3), Some(3.0)),
        );
        habitability_bounds.insert(
            GlobalParameterKind::Ghg,
            bounds(None, Some(25.0), None, Some(125.0)),
        );
        habitability_bounds.insert(
            GlobalParameterKind::ToxicGases,
            bounds(None, Some(0.001), None, Some(0.05)),
        );
        habitability_bounds.insert(
            GlobalParameterKind::Radiation,
            bounds(None, Some(1.0), None, Some(5.0)),
        );
        habitability_bounds.insert(
            GlobalParameterKind::Gravity,
            bounds(Some(0.5), Some(1.5), None, Some(4.0)),
        );

        Self {
            freezing_point: 2.0,
            boiling_point: 10.0,
            fahrenheit_at_zero: -13.0,
            fahrenheit_per_unit: 22.5,
            absolute_zero_f: -459.67,

            earth_base_temp_f: 1.0,
            earth_albedo: 0.3,
            earth_water_vapor: 1.78,
            earth_cloud_frequency: 0.2,
            earth_reference_dimensions: 15,
            earth_pressure: 1000.0,
            earth_inert_fraction: 0.7896,
            earth_oxygen_fraction: 0.21,
            earth_ghg_fraction: 0.0004,
            earth_toxic_fraction: 0.0,
            earth_gravity: 1.0,

            cloud_albedo: 0.75,
            albedo_blend_weight: 0.6,
            toxic_cloud_scale: 0.5,
            haze_pressure_span: 24.0,
            max_haze_alpha: 0.8,

            initial_temperature_variation: 1.0,
            final_temperature_variation: 4,
            temperature_tolerance: 0.03,
            equilibrium_max_iterations: 10,
            equilibrium_epsilon: 0.01,
            warm_ceiling_average: 10.5,
            cool_floor_average: -5.5,
            vapor_estimate_passes: 4,

            worm_length_reference_area: 625.0,
            altitude_worm_count: 24,
            altitude_worm_min_length: 12,
            altitude_worm_max_length: 30,
            altitude_worm_bound: 2,
            altitude_raise_chance: 0.75,
            roughness_worm_count: 16,
            roughness_worm_min_length: 8,
            roughness_worm_max_length: 20,
            temperature_worm_count: 6,
            temperature_worm_min_length: 4,
            temperature_worm_max_length: 12,
            soil_worm_count: 12,
            soil_worm_min_length: 6,
            soil_worm_max_length: 16,
            soil_worm_bound: 2,
            smoothing_max_sweeps: 500,

            water_sample_reference_area: 400.0,
            water_candidate_samples: 6,
            water_placement_max_attempts: 32,
            water_target_max_placements: 10_000,
            ice_weight_origin: 1.0,
            liquid_weight_origin: 16.0,
            gas_weight: 13.5,
            flow_min_water: 4,
            flow_min_difference: 2,
            deadly_water_level: 4,
            low_pressure_water_loss_ratio: 0.05,

            temperature_perfect_lower: 2,
            temperature_perfect_upper: 5,
            habitability_bounds,

            default_sky_color: [18, 18, 28],
            inert_gas_color: [150, 185, 235],
            oxygen_color: [105, 160, 240],
            ghg_color: [225, 170, 95],
            toxic_gas_color: [170, 190, 60],
        }
    }
}

fn bounds(
    perfect_lower: Option<f64>,
    perfect_upper: Option<f64>,
    deadly_lower: Option<f64>,
    deadly_upper: Option<f64>,
) -> HabitabilityBounds {
    HabitabilityBounds {
        perfect_lower,
        perfect_upper,
        deadly_lower,
        deadly_upper,
    }
}

impl Tuning {
    /// The compiled-in table. Falls back to the code copy if it ever fails to
    /// parse.
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_TUNING) {
            Ok(tuning) => tuning,
            Err(err) => {
                tracing::error!(
                    target: "planetsim::tuning",
                    error = %err,
                    "tuning.builtin.parse_failed"
                );
                Self::fallback()
            }
        }
    }

    pub fn from_json(data: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| TuningError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_json(&contents)?;
        tracing::info!(
            target: "planetsim::tuning",
            source = "file",
            path = %path.display(),
            "tuning.loaded"
        );
        Ok(tuning)
    }

    /// Key/value view over the scalar constants, for integration code that
    /// addresses tuning by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = serde_json::to_value(self).ok()?;
        value.get(name)?.as_f64()
    }

    /// Earth-equivalent total pressure for a grid of `dimensions` per side.
    /// Atmosphere scales with surface area.
    pub fn ideal_pressure(&self, dimensions: usize) -> f64 {
        let reference = self.earth_reference_dimensions.max(1) as f64;
        let side = dimensions.max(1) as f64;
        self.earth_pressure * (side * side) / (reference * reference)
    }

    pub fn earth_fraction(&self, kind: GlobalParameterKind) -> f64 {
        match kind {
            GlobalParameterKind::InertGases => self.earth_inert_fraction,
            GlobalParameterKind::Oxygen => self.earth_oxygen_fraction,
            GlobalParameterKind::Ghg => self.earth_ghg_fraction,
            GlobalParameterKind::ToxicGases => self.earth_toxic_fraction,
            _ => 0.0,
        }
    }

    pub fn to_fahrenheit(&self, internal: f64) -> f64 {
        internal * self.fahrenheit_per_unit + self.fahrenheit_at_zero
    }

    pub fn from_fahrenheit(&self, fahrenheit: f64) -> f64 {
        (fahrenheit - self.fahrenheit_at_zero) / self.fahrenheit_per_unit
    }

    /// Multiplier the Earth albedo produces, used to normalise the sun effect.
    pub fn earth_albedo_multiplier(&self) -> f64 {
        (1.0 - self.earth_albedo).max(0.0).powf(0.25)
    }
}
