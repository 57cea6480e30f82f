use crate::grid::{Coord, Direction};
use crate::location::{ParameterKind, PoleWeights};
use crate::world::World;

/// Attribute a weighted worm uses to pick among its four neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WormWeight {
    PoleDistance,
    InversePoleDistance,
    NorthPoleDistance,
    SouthPoleDistance,
}

impl WormWeight {
    fn of(self, weights: PoleWeights) -> f64 {
        match self {
            Self::PoleDistance => weights.pole_distance,
            Self::InversePoleDistance => weights.inverse_pole_distance,
            Self::NorthPoleDistance => weights.north_pole_distance,
            Self::SouthPoleDistance => weights.south_pole_distance,
        }
    }
}

/// A bounded random walk that perturbs one parameter along its path.
#[derive(Clone, Debug)]
pub struct Worm {
    pub min_length: usize,
    pub max_length: usize,
    pub parameter: ParameterKind,
    pub delta: i32,
    /// Allowed drift from the start cell's value; 0 means unbounded.
    pub bound: i32,
    /// Write `start_value + delta` instead of adding `delta`.
    pub set_mode: bool,
    pub start: Option<Coord>,
    pub weight: Option<WormWeight>,
}

impl Worm {
    pub fn additive(parameter: ParameterKind, delta: i32, bound: i32) -> Self {
        Self {
            min_length: 1,
            max_length: 1,
            parameter,
            delta,
            bound,
            set_mode: false,
            start: None,
            weight: None,
        }
    }

    pub fn with_length(mut self, min_length: usize, max_length: usize) -> Self {
        self.min_length = min_length;
        self.max_length = max_length.max(min_length);
        self
    }

    pub fn starting_at(mut self, start: Coord) -> Self {
        self.start = Some(start);
        self
    }

    pub fn weighted_by(mut self, weight: WormWeight) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Where a worm went and what it started from.
#[derive(Clone, Debug)]
pub struct WormTrace {
    pub start: Coord,
    pub start_value: i32,
    pub path: Vec<Coord>,
}

/// Scales a tuned walk length by the world's area.
pub(crate) fn scaled_length(world: &World, length: usize) -> usize {
    let reference = world.tuning().worm_length_reference_area.max(1.0);
    let scaled = length as f64 * world.area() as f64 / reference;
    (scaled.round() as usize).max(1)
}

pub fn run_worm(world: &mut World, worm: &Worm) -> WormTrace {
    let start_idx = match worm.start {
        Some(c) => world.locations.idx(c.x % world.dimensions(), c.y % world.dimensions()),
        None => world.random_index(),
    };
    let start_value = world.value_at(start_idx, worm.parameter);
    let length = world.rng.uniform_usize(worm.min_length, worm.max_length);
    let notify = !world.setup_in_progress;

    let mut path = Vec::with_capacity(length);
    let mut current = start_idx;
    for _ in 0..length {
        path.push(world.loc(current).coord());
        let value = world.value_at(current, worm.parameter);
        let candidate = if worm.set_mode {
            start_value + worm.delta
        } else {
            value + worm.delta
        };
        let within = worm.bound == 0
            || (candidate >= start_value - worm.bound && candidate <= start_value + worm.bound);
        if within {
            world.set_at(current, worm.parameter, candidate, notify);
        }
        current = next_cell(world, current, worm.weight);
    }

    WormTrace {
        start: world.loc(start_idx).coord(),
        start_value,
        path,
    }
}

fn next_cell(world: &mut World, idx: usize, weight: Option<WormWeight>) -> usize {
    let neighbors = world.neighbor_indices(idx);
    match weight {
        Some(attr) => {
            let weights = neighbors.map(|n| attr.of(world.loc(n).pole_weights()));
            match world.rng.weighted_index(&weights) {
                Some(i) => neighbors[i],
                None => neighbors[world.rng.index(neighbors.len())],
            }
        }
        None => {
            let direction = Direction::ALL[world.rng.index(Direction::ALL.len())];
            let coord = world.loc(idx).coord();
            let next = world.locations.step(coord, direction);
            world.locations.idx(next.x, next.y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(GenerationParams::default(), Tuning::default()).expect("world")
    }

    #[test]
    fn bounded_worms_never_leave_the_band() {
        let mut w = world();
        let start = Coord::new(4, 4);
        w.set_location_parameter(start, ParameterKind::Altitude, 2, false)
            .expect("set");
        let worm = Worm::additive(ParameterKind::Altitude, 1, 1)
            .with_length(400, 400)
            .starting_at(start);
        let trace = run_worm(&mut w, &worm);
        assert_eq!(trace.start_value, 2);
        assert_eq!(trace.path.len(), 400);
        for c in &trace.path {
            let v = w.location(*c).expect("loc").get(ParameterKind::Altitude);
            assert!((1..=3).contains(&v), "{c:?} = {v}");
        }
    }

    #[test]
    fn unbounded_worm_piles_up_to_the_clamp() {
        let mut w = world();
        let worm = Worm::additive(ParameterKind::Roughness, 1, 0).with_length(2000, 2000);
        run_worm(&mut w, &worm);
        let max = w
            .locations()
            .as_slice()
            .iter()
            .map(|l| l.get(ParameterKind::Roughness))
            .max();
        assert_eq!(max, Some(5));
    }

    #[test]
    fn set_mode_writes_start_plus_delta() {
        let mut w = world();
        let worm = Worm {
            set_mode: true,
            ..Worm::additive(ParameterKind::Soil, 3, 0).with_length(50, 50)
        };
        let trace = run_worm(&mut w, &worm);
        for c in &trace.path {
            assert_eq!(w.location(*c).expect("loc").get(ParameterKind::Soil), 3);
        }
    }

    #[test]
    fn weighted_walk_steps_to_neighbours() {
        let mut w = world();
        let worm = Worm::additive(ParameterKind::Temperature, -1, 1)
            .with_length(30, 30)
            .starting_at(Coord::new(0, 0))
            .weighted_by(WormWeight::InversePoleDistance);
        let trace = run_worm(&mut w, &worm);
        for pair in trace.path.windows(2) {
            let adjacent = w.location(pair[0]).expect("loc").adjacency();
            assert!(adjacent.contains(&pair[1]));
        }
    }

    #[test]
    fn lengths_scale_with_area() {
        let w = world();
        // 225 / 625 of 25
        assert_eq!(scaled_length(&w, 25), 9);
        assert_eq!(scaled_length(&w, 1), 1);
    }
}
