//! Energy balance and the greedy relaxation that moves cell temperatures
//! toward the planet's target average.

use serde::{Deserialize, Serialize};

use crate::location::ParameterKind;
use crate::systems::smoothing;
use crate::tuning::Tuning;
use crate::world::{GlobalParameterKind, World};

const LOG_TARGET: &str = "planetsim::climate";

/// Outcome of one `simulate_climate_equilibrium` call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct EquilibriumReport {
    pub iterations: usize,
    /// The target stopped moving before the round cap.
    pub converged: bool,
    pub target: f64,
}

/// Thin atmospheres mute greenhouse and vapour effects; thick ones amplify
/// them up to a cap.
pub fn pressure_effect(pressure_ratio: f64) -> f64 {
    if pressure_ratio <= 0.0 {
        0.0
    } else if pressure_ratio <= 1.0 {
        pressure_ratio
    } else if pressure_ratio < 25.0 {
        1.0 + (pressure_ratio - 1.0) / 24.0 * 1.45
    } else {
        2.45
    }
}

pub fn ghg_multiplier(ghg_ratio: f64, pressure_ratio: f64) -> f64 {
    let weight = pressure_effect(pressure_ratio);
    let atm = ghg_ratio.max(0.0);
    let mut multiplier = if atm < 0.0002 {
        1.0 + weight * 0.05 * (atm / 0.0002)
    } else {
        1.0 + weight * (0.06 + 0.01 * (atm / 0.0004).log2())
    };
    multiplier += (weight * atm).min(0.43);
    multiplier += (weight * atm * 0.1).min(0.3);
    multiplier += (weight * atm * 0.01).min(0.25);
    if pressure_ratio < 0.5 {
        multiplier -= 0.1 * (0.5 - pressure_ratio);
    }
    multiplier
}

pub fn water_vapor_multiplier(water_vapor: f64, pressure_ratio: f64, tuning: &Tuning) -> f64 {
    let weight = pressure_effect(pressure_ratio);
    1.0 + weight * 0.5 * 0.124 * (water_vapor / tuning.earth_water_vapor)
}

/// Vapour a cell (or an estimated planet) contributes at `temperature`.
pub fn water_vapor_contribution(temperature: f64, water: f64, tuning: &Tuning) -> f64 {
    let ratio = (temperature - tuning.freezing_point + 2.0)
        / (tuning.boiling_point - tuning.freezing_point + 2.0);
    if ratio > 0.0 {
        (0.4 + 0.6 * ratio) * water * 1.5
    } else {
        0.0
    }
}

pub fn albedo_multiplier(cloud_cover: f64, terrain_albedo: f64, tuning: &Tuning) -> f64 {
    let cover = cloud_cover.clamp(0.0, 1.0);
    let raw = cover * tuning.cloud_albedo + (1.0 - cover) * terrain_albedo;
    let blended =
        tuning.albedo_blend_weight * raw + (1.0 - tuning.albedo_blend_weight) * tuning.earth_albedo;
    (1.0 - blended).max(0.0).powf(0.25)
}

pub fn sun_effect(star_distance: f64, tuning: &Tuning) -> f64 {
    let insolation = 1.0 / (star_distance * star_distance);
    (tuning.earth_base_temp_f - tuning.absolute_zero_f) * insolation.powf(0.25)
        / tuning.earth_albedo_multiplier()
}

impl World {
    /// Mean surface brightness as reported by the brightness sampler.
    pub fn terrain_albedo(&self) -> f64 {
        let cells = self.locations.as_slice();
        if cells.is_empty() {
            return self.tuning.earth_albedo;
        }
        let sampler = &self.collaborators.brightness;
        let sum: f64 = cells
            .iter()
            .map(|loc| sampler.brightness(loc, &self.tuning))
            .sum();
        sum / cells.len() as f64
    }

    /// Vapour from the water actually on the map.
    pub fn water_vapor(&self) -> f64 {
        if self.is_earth() {
            return self.tuning.earth_water_vapor;
        }
        let cells = self.locations.as_slice();
        let sum: f64 = cells
            .iter()
            .map(|loc| {
                water_vapor_contribution(
                    f64::from(loc.get(ParameterKind::Temperature)),
                    f64::from(loc.get(ParameterKind::Water)),
                    &self.tuning,
                )
            })
            .sum();
        sum / cells.len().max(1) as f64
    }

    /// Vapour before any water exists, driven by the water target.
    pub fn estimated_water_vapor(&self, estimated_temperature: f64) -> f64 {
        if self.is_earth() {
            return self.tuning.earth_water_vapor;
        }
        water_vapor_contribution(
            estimated_temperature,
            self.climate.average_water_target,
            &self.tuning,
        )
    }

    /// Refreshes clouds and the three multipliers for `water_vapor`, and
    /// returns the target average in internal units.
    pub(crate) fn compute_target(&mut self, water_vapor: f64) -> f64 {
        self.refresh_clouds(water_vapor);
        let pressure_ratio = self.pressure_ratio(None);
        let ghg_ratio = self.pressure_ratio(Some(GlobalParameterKind::Ghg));

        self.climate.ghg_multiplier = ghg_multiplier(ghg_ratio, pressure_ratio);
        self.climate.water_vapor_multiplier =
            water_vapor_multiplier(water_vapor, pressure_ratio, &self.tuning);
        self.climate.albedo_multiplier =
            albedo_multiplier(self.cloud_cover(), self.terrain_albedo(), &self.tuning);

        let fahrenheit = self.climate.ghg_multiplier
            * self.climate.water_vapor_multiplier
            * self.climate.albedo_multiplier
            * sun_effect(self.climate.star_distance, &self.tuning)
            + self.tuning.absolute_zero_f;
        self.tuning.from_fahrenheit(fahrenheit)
    }

    /// Target average before water exists: the vapour estimate and the
    /// target feed each other for a fixed number of passes.
    pub fn estimate_target_temperature(&mut self) -> f64 {
        let mut estimate = self.compute_target(0.0);
        for _ in 0..self.tuning.vapor_estimate_passes {
            let vapor = self.estimated_water_vapor(estimate);
            estimate = self.compute_target(vapor);
        }
        self.climate.average_temperature_target = estimate;
        tracing::debug!(target: LOG_TARGET, estimate, "climate.target.estimated");
        estimate
    }

    /// Warms the coldest cell relative to its expectation. Cells at `ceiling`
    /// are skipped; returns false when none qualify.
    pub fn warm(&mut self, ceiling: i32) -> bool {
        self.refresh_expected_offsets();
        let mut pick: Option<(usize, f64)> = None;
        for (idx, loc) in self.locations.as_slice().iter().enumerate() {
            if loc.get(ParameterKind::Temperature) >= ceiling {
                continue;
            }
            let key = loc.outlier_key();
            if pick.map_or(true, |(_, best)| key < best) {
                pick = Some((idx, key));
            }
        }
        match pick {
            Some((idx, _)) => {
                let notify = !self.setup_in_progress;
                self.change_at(idx, ParameterKind::Temperature, 1, notify);
                true
            }
            None => false,
        }
    }

    /// Mirror of [`World::warm`].
    pub fn cool(&mut self, floor: i32) -> bool {
        self.refresh_expected_offsets();
        let mut pick: Option<(usize, f64)> = None;
        for (idx, loc) in self.locations.as_slice().iter().enumerate() {
            if loc.get(ParameterKind::Temperature) <= floor {
                continue;
            }
            let key = loc.outlier_key();
            if pick.map_or(true, |(_, best)| key > best) {
                pick = Some((idx, key));
            }
        }
        match pick {
            Some((idx, _)) => {
                let notify = !self.setup_in_progress;
                self.change_at(idx, ParameterKind::Temperature, -1, notify);
                true
            }
            None => false,
        }
    }

    fn drive_toward(&mut self, target: f64, floor: i32, ceiling: i32) {
        let tolerance = self.tuning.temperature_tolerance;
        while target - self.climate.average_temperature > tolerance
            && self.climate.average_temperature < self.tuning.warm_ceiling_average
        {
            if !self.warm(ceiling) {
                break;
            }
        }
        while self.climate.average_temperature - target > tolerance
            && self.climate.average_temperature > self.tuning.cool_floor_average
        {
            if !self.cool(floor) {
                break;
            }
        }
    }

    /// Inclusive band every cell is held in once the average has settled.
    pub fn temperature_band(&self, target: f64) -> (i32, i32) {
        let (min, max) = ParameterKind::Temperature.bounds();
        let center = (target.round() as i32).clamp(min, max);
        let spread = self.tuning.final_temperature_variation;
        ((center - spread).max(min), (center + spread).min(max))
    }

    pub fn change_to_temperature_target(&mut self, target: f64) {
        self.climate.average_temperature_target = target;
        let (min, max) = ParameterKind::Temperature.bounds();
        self.drive_toward(target, min, max);

        let (low, high) = self.temperature_band(target);
        let notify = !self.setup_in_progress;
        for idx in 0..self.area() {
            let t = self.value_at(idx, ParameterKind::Temperature);
            if t < low {
                self.set_at(idx, ParameterKind::Temperature, low, notify);
            } else if t > high {
                self.set_at(idx, ParameterKind::Temperature, high, notify);
            }
        }
        smoothing::sweep(self, ParameterKind::Temperature);
        self.drive_toward(target, low, high);
        self.refresh_expected_offsets();
    }

    /// Recomputes clouds, albedo and the target until the target stops
    /// moving, relaxing the cells after every move.
    pub fn simulate_climate_equilibrium(&mut self) -> EquilibriumReport {
        let mut last = self.climate.average_temperature_target;
        let mut report = EquilibriumReport {
            iterations: 0,
            converged: false,
            target: last,
        };

        for round in 0..self.tuning.equilibrium_max_iterations {
            let vapor = self.water_vapor();
            let target = self.compute_target(vapor);
            report.iterations = round + 1;
            report.target = target;
            tracing::debug!(
                target: LOG_TARGET,
                round,
                target,
                average = self.climate.average_temperature,
                albedo = self.climate.albedo_multiplier,
                "climate.equilibrium.round"
            );

            if (target - last).abs() < self.tuning.equilibrium_epsilon {
                self.climate.average_temperature_target = target;
                let (low, high) = self.temperature_band(target);
                self.drive_toward(target, low, high);
                self.refresh_expected_offsets();
                report.converged = true;
                break;
            }
            self.change_to_temperature_target(target);
            last = target;
        }

        if !report.converged {
            tracing::warn!(
                target: LOG_TARGET,
                iterations = report.iterations,
                target = report.target,
                "climate.equilibrium.cap_reached"
            );
        }
        report
    }
}
