use std::collections::VecDeque;

use crate::error::WorldError;
use crate::grid::Coord;
use crate::location::ParameterKind;
use crate::world::World;

const LOG_TARGET: &str = "planetsim::worldgen";

/// Places the preset (or customised) share of water, then re-rolls the
/// per-cell weather jitter against the settled temperatures.
pub fn run(world: &mut World) {
    let target = world.params().water_target();
    world.climate.average_water_target = target;
    let units = (target * world.area() as f64).round() as usize;

    let mut placed = 0usize;
    for _ in 0..units {
        if world.place_water().is_none() {
            tracing::warn!(target: LOG_TARGET, placed, wanted = units, "worldgen.water.saturated");
            break;
        }
        placed += 1;
    }

    if let Some(exact) = world.params().exact_water_target() {
        settle_exact_target(world, exact);
    }
    reroll_weather_offsets(world);
    tracing::info!(
        target: LOG_TARGET,
        placed,
        average = world.average_water(),
        "worldgen.water.placed"
    );
}

fn settle_exact_target(world: &mut World, exact: f64) {
    let wanted = (exact * world.area() as f64).round() as i64;
    for _ in 0..world.tuning().water_target_max_placements {
        let total = world.parameter_total(ParameterKind::Water);
        let moved = if total < wanted {
            world.place_water()
        } else if total > wanted {
            world.remove_water()
        } else {
            return;
        };
        if moved.is_none() {
            break;
        }
    }
    tracing::warn!(
        target: LOG_TARGET,
        wanted,
        total = world.parameter_total(ParameterKind::Water),
        "worldgen.water.exact_target_missed"
    );
}

fn reroll_weather_offsets(world: &mut World) {
    world.refresh_expected_offsets();
    for idx in 0..world.area() {
        let jitter = world.rng.uniform_f64(-0.1, 0.1);
        let location = &mut world.locations.as_mut_slice()[idx];
        location.local_weather_offset =
            (0.1 * location.expected_temperature_offset + jitter).clamp(-0.2, 0.2);
    }
}

impl World {
    fn water_sample_count(&self) -> usize {
        let tuning = &self.tuning;
        let scaled = tuning.water_candidate_samples as f64 * self.area() as f64
            / tuning.water_sample_reference_area.max(1.0);
        (scaled.round() as usize).max(1)
    }

    /// Adds one unit of water to a sampled ice, liquid or gas candidate.
    /// Returns `None` once the resample budget is spent without a candidate.
    pub fn place_water(&mut self) -> Option<Coord> {
        let freezing = self.tuning.freezing_point;
        let boiling = self.tuning.boiling_point;
        let (_, max_water) = ParameterKind::Water.bounds();
        let samples = self.water_sample_count();
        let attempts = self.tuning.water_placement_max_attempts;

        for _ in 0..attempts {
            let mut liquid: Option<(usize, i32)> = None;
            let mut gas: Option<usize> = None;
            for _ in 0..samples {
                let idx = self.random_index();
                let location = self.loc(idx);
                if location.get(ParameterKind::Water) >= max_water {
                    continue;
                }
                let temperature = f64::from(location.get(ParameterKind::Temperature));
                if temperature >= boiling {
                    gas.get_or_insert(idx);
                } else if temperature >= freezing {
                    let altitude = location.get(ParameterKind::Altitude);
                    if liquid.map_or(true, |(_, best)| altitude < best) {
                        liquid = Some((idx, altitude));
                    }
                }
            }

            let mut ice: Option<(usize, i32)> = None;
            for _ in 0..samples {
                let idx = self.random_index();
                let location = self.loc(idx);
                if location.get(ParameterKind::Water) >= max_water {
                    continue;
                }
                let temperature = location.get(ParameterKind::Temperature);
                if f64::from(temperature) < freezing
                    && ice.map_or(true, |(_, best)| temperature < best)
                {
                    ice = Some((idx, temperature));
                }
            }

            let mut choices: Vec<(usize, f64)> = Vec::with_capacity(3);
            if let Some((idx, temperature)) = ice {
                let weight = (self.tuning.ice_weight_origin - f64::from(temperature)).abs();
                choices.push((idx, weight));
            }
            if let Some((idx, altitude)) = liquid {
                let weight = (self.tuning.liquid_weight_origin - f64::from(altitude)).abs();
                choices.push((idx, weight));
            }
            if let Some(idx) = gas {
                choices.push((idx, self.tuning.gas_weight));
            }
            if choices.is_empty() {
                continue;
            }

            let weights: Vec<f64> = choices.iter().map(|(_, w)| *w).collect();
            let pick = match self.rng.weighted_index(&weights) {
                Some(i) => i,
                None => self.rng.index(choices.len()),
            };
            let idx = choices[pick].0;
            let notify = !self.setup_in_progress;
            self.change_at(idx, ParameterKind::Water, 1, notify);
            if self.setup_in_progress {
                self.flow_from(idx);
            }
            return Some(self.loc(idx).coord());
        }

        tracing::warn!(target: LOG_TARGET, attempts, "worldgen.water.no_candidate");
        None
    }

    /// Takes one unit from the warmest of a few sampled wet cells.
    pub fn remove_water(&mut self) -> Option<Coord> {
        let wet: Vec<usize> = (0..self.area())
            .filter(|idx| self.value_at(*idx, ParameterKind::Water) > 0)
            .collect();
        if wet.is_empty() {
            return None;
        }
        let mut warmest: Option<(usize, i32)> = None;
        for _ in 0..self.water_sample_count() {
            let idx = wet[self.rng.index(wet.len())];
            let temperature = self.value_at(idx, ParameterKind::Temperature);
            if warmest.map_or(true, |(_, best)| temperature > best) {
                warmest = Some((idx, temperature));
            }
        }
        let (idx, _) = warmest?;
        let notify = !self.setup_in_progress;
        self.change_at(idx, ParameterKind::Water, -1, notify);
        Some(self.loc(idx).coord())
    }

    /// Lets deep liquid water spill one unit into each lower, drier
    /// neighbour, following only the cells that received water. Returns the
    /// number of units moved.
    pub fn flow(&mut self, coord: Coord) -> Result<usize, WorldError> {
        let idx = self.index_of(coord)?;
        Ok(self.flow_from(idx))
    }

    pub(crate) fn flow_from(&mut self, start: usize) -> usize {
        let min_water = self.tuning.flow_min_water;
        let min_difference = self.tuning.flow_min_difference;
        let freezing = self.tuning.freezing_point;
        let boiling = self.tuning.boiling_point;
        let notify = !self.setup_in_progress;

        let mut visited = vec![false; self.area()];
        let mut queue = VecDeque::from([start]);
        let mut moved = 0usize;

        while let Some(idx) = queue.pop_front() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            let altitude = self.value_at(idx, ParameterKind::Altitude);

            for neighbor in self.neighbor_indices(idx) {
                let water = self.value_at(idx, ParameterKind::Water);
                let temperature = f64::from(self.value_at(idx, ParameterKind::Temperature));
                if water < min_water || temperature <= freezing - 1.0 {
                    break;
                }
                if neighbor == idx {
                    continue;
                }
                let target = self.loc(neighbor);
                let accepts = target.get(ParameterKind::Altitude) <= altitude
                    && f64::from(target.get(ParameterKind::Temperature)) < boiling
                    && target.get(ParameterKind::Water) <= water - min_difference;
                if accepts {
                    self.change_at(idx, ParameterKind::Water, -1, notify);
                    self.change_at(neighbor, ParameterKind::Water, 1, notify);
                    moved += 1;
                    queue.push_back(neighbor);
                }
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;
    use crate::tuning::Tuning;

    fn liquid_world() -> World {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        for idx in 0..w.area() {
            w.set_at(idx, ParameterKind::Temperature, 4, false);
        }
        w
    }

    #[test]
    fn flow_spills_until_source_is_shallow() {
        let mut w = liquid_world();
        let source = Coord::new(5, 5);
        w.set_location_parameter(source, ParameterKind::Water, 5, false)
            .expect("set");
        let moved = w.flow(source).expect("flow");
        assert_eq!(moved, 2);
        assert_eq!(w.location(source).expect("loc").get(ParameterKind::Water), 3);
        assert_eq!(w.parameter_total(ParameterKind::Water), 5);
    }

    #[test]
    fn flow_never_climbs() {
        let mut w = liquid_world();
        let source = Coord::new(2, 2);
        for c in w.location(source).expect("loc").adjacency() {
            w.set_location_parameter(c, ParameterKind::Altitude, 3, false)
                .expect("set");
        }
        w.set_location_parameter(source, ParameterKind::Water, 5, false)
            .expect("set");
        assert_eq!(w.flow(source).expect("flow"), 0);
    }

    #[test]
    fn frozen_water_stays_put() {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        let source = Coord::new(1, 1);
        w.set_location_parameter(source, ParameterKind::Water, 5, false)
            .expect("set");
        assert_eq!(w.flow(source).expect("flow"), 0);
    }

    #[test]
    fn place_then_remove_round_trips_total() {
        let mut w = liquid_world();
        assert!(w.place_water().is_some());
        assert!(w.place_water().is_some());
        assert_eq!(w.parameter_total(ParameterKind::Water), 2);
        assert!(w.remove_water().is_some());
        assert_eq!(w.parameter_total(ParameterKind::Water), 1);
    }

    #[test]
    fn frozen_world_collects_ice() {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        for idx in 0..w.area() {
            w.set_at(idx, ParameterKind::Temperature, -3, false);
        }
        let c = w.place_water().expect("ice candidate");
        let loc = w.location(c).expect("loc");
        assert_eq!(loc.get(ParameterKind::Water), 1);
        assert!(loc.is_frozen(w.tuning()));
    }

    #[test]
    fn saturated_world_gives_up() {
        let mut w = liquid_world();
        for idx in 0..w.area() {
            w.set_at(idx, ParameterKind::Water, 5, false);
        }
        assert_eq!(w.place_water(), None);
    }

    #[test]
    fn dry_world_has_nothing_to_remove() {
        let mut w = liquid_world();
        assert_eq!(w.remove_water(), None);
    }

    #[test]
    fn stage_places_the_target_share() {
        let mut w = liquid_world();
        w.setup_in_progress = true;
        run(&mut w);
        assert_eq!(w.parameter_total(ParameterKind::Water), 450);
        for loc in w.locations().as_slice() {
            assert!(loc.local_weather_offset().abs() <= 0.2);
        }
    }
}
